//! Async client core for the game-backend web API.
//!
//! # Overview
//! Every operation is a typed request struct bound to a fixed `POST` path,
//! a typed result, and the credential it needs. One generic dispatch routine
//! resolves the credential, serializes the request, calls the transport, and
//! decodes the `{"data": ...}` envelope into an `ApiResult`.
//!
//! # Design
//! - `ApiClient` replaces process-wide globals: it owns settings, the
//!   credential cache, and the injected serializer and transport.
//! - `build_request` / `parse_response` keep the I/O boundary explicit; the
//!   `Transport` trait is the only code that touches the network.
//! - Missing configuration is `Err(ConfigError)` before any I/O. Failures
//!   after dispatch are returned as data inside `ApiResult`.
//! - API families (`api::ClientApi`, `api::ServerApi`, ...) are thin typed
//!   facades over `ApiClient::execute_scoped`.

pub mod api;
pub mod auth;
pub mod client;
pub mod error;
pub mod http;
pub mod request;
pub mod result;
pub mod serializer;
pub mod settings;
pub mod transport;
pub mod types;

pub use auth::{AuthContext, AuthPolicy, Credential, CredentialKind, CredentialStore, CredentialUpdate, EntityKey};
pub use client::{ApiClient, ApiClientBuilder, ErrorHandler, PreparedCall, Scope};
pub use error::{ApiError, ConfigError};
pub use http::{HttpRequest, HttpResponse};
pub use request::{ApiRequest, CallOptions};
pub use result::ApiResult;
pub use serializer::{JsonSerializer, Serializer, SerializerError};
pub use settings::Settings;
pub use transport::{ReqwestTransport, Transport, TransportError};
pub use tokio_util::sync::CancellationToken;
