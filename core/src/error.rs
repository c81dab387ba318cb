//! Error types for the API client.
//!
//! # Design
//! Two classes of failure are kept apart. `ConfigError` means the call could
//! not be attempted at all (no credential, no title id, unserializable
//! request); it is returned as `Err` before any network I/O. `ApiError` is
//! anything that went wrong once the request left the process; it never
//! escapes as `Err` but travels inside `ApiResult` so callers branch on data.

use std::collections::BTreeMap;
use std::fmt::Write as _;

use serde::Deserialize;
use thiserror::Error;

use crate::auth::AuthPolicy;
use crate::transport::TransportError;

/// The call could not be dispatched because the client is misconfigured.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// The endpoint needs a credential that no layer provides.
    #[error("{path} requires {policy}, but none is configured")]
    MissingCredential {
        path: &'static str,
        policy: AuthPolicy,
    },

    /// Neither an endpoint override, a vertical, nor a title id is set.
    #[error("no title id configured; set a title id or an explicit endpoint")]
    MissingTitleId,

    #[error("no serializer registered with the client builder")]
    MissingSerializer,

    #[error("no transport registered with the client builder")]
    MissingTransport,

    /// The default transport could not be constructed.
    #[error("failed to build transport: {0}")]
    Transport(String),

    /// The request object could not be turned into a JSON body.
    #[error("failed to serialize request for {path}: {message}")]
    Serialization { path: &'static str, message: String },
}

/// Structured failure returned inside every unsuccessful `ApiResult`.
///
/// Server-side failures carry the backend's own `error` name and numeric
/// `error_code`. Failures produced on this side of the wire use the
/// associated constants below.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{api_endpoint}: {error} ({error_code}): {error_message}")]
pub struct ApiError {
    pub api_endpoint: String,
    pub http_code: u16,
    pub http_status: String,
    pub error: String,
    pub error_code: i32,
    pub error_message: String,
    pub error_details: Option<BTreeMap<String, Vec<String>>>,
    pub retry_after_seconds: Option<u32>,
}

impl ApiError {
    pub const UNKNOWN: i32 = 1;
    pub const CONNECTION_ERROR: i32 = 2;
    pub const JSON_PARSE_ERROR: i32 = 3;
    pub const SERVICE_UNAVAILABLE: i32 = 1123;

    fn local(api_endpoint: &str, http_code: u16, error: &str, error_code: i32, message: String) -> Self {
        Self {
            api_endpoint: api_endpoint.to_string(),
            http_code,
            http_status: String::new(),
            error: error.to_string(),
            error_code,
            error_message: message,
            error_details: None,
            retry_after_seconds: None,
        }
    }

    /// The request never produced an HTTP response. A request the transport
    /// refused to send is `Unknown`; every other failure is a connection error.
    pub fn from_transport(api_endpoint: &str, err: &TransportError) -> Self {
        match err {
            TransportError::InvalidRequest(_) => {
                Self::local(api_endpoint, 0, "Unknown", Self::UNKNOWN, err.to_string())
            }
            _ => Self::local(api_endpoint, 0, "ConnectionError", Self::CONNECTION_ERROR, err.to_string()),
        }
    }

    /// A 2xx response whose body did not match the expected envelope.
    pub fn json_parse(api_endpoint: &str, http_code: u16, message: impl Into<String>) -> Self {
        Self::local(api_endpoint, http_code, "JsonParseError", Self::JSON_PARSE_ERROR, message.into())
    }

    /// A non-2xx response whose body is not a recognizable error envelope.
    pub fn service_unavailable(api_endpoint: &str, http_code: u16, body: impl Into<String>) -> Self {
        Self::local(
            api_endpoint,
            http_code,
            "ServiceUnavailable",
            Self::SERVICE_UNAVAILABLE,
            body.into(),
        )
    }

    /// Whether repeating the same call could plausibly succeed.
    ///
    /// Connection failures, throttling, and 5xx responses are retryable;
    /// validation and authorization errors are not.
    pub fn is_retryable(&self) -> bool {
        match self.error_code {
            Self::CONNECTION_ERROR | Self::SERVICE_UNAVAILABLE => true,
            _ => self.http_code == 429 || self.http_code >= 500 || self.retry_after_seconds.is_some(),
        }
    }

    /// Human-readable report: the message followed by one line per detail.
    pub fn error_report(&self) -> String {
        let mut report = format!("{} {}", self.api_endpoint, self.error_message);
        if let Some(details) = &self.error_details {
            for (field, messages) in details {
                for message in messages {
                    let _ = write!(report, "\n{field}: {message}");
                }
            }
        }
        report
    }
}

/// Error body as the backend sends it on non-2xx responses.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ErrorEnvelope {
    pub code: u16,
    #[serde(default)]
    pub status: String,
    pub error: String,
    pub error_code: i32,
    #[serde(default)]
    pub error_message: String,
    #[serde(default)]
    pub error_details: Option<BTreeMap<String, Vec<String>>>,
    #[serde(default)]
    pub retry_after_seconds: Option<u32>,
}

impl ErrorEnvelope {
    pub(crate) fn into_api_error(self, api_endpoint: &str) -> ApiError {
        ApiError {
            api_endpoint: api_endpoint.to_string(),
            http_code: self.code,
            http_status: self.status,
            error: self.error,
            error_code: self.error_code,
            error_message: self.error_message,
            error_details: self.error_details,
            retry_after_seconds: self.retry_after_seconds,
        }
    }
}
