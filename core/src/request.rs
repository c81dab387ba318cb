//! The contract every endpoint request type implements.
//!
//! # Design
//! An endpoint is fully described by four constants: its path, its request
//! type, its response type, and its `AuthPolicy`. `ApiRequest` carries them
//! so one generic dispatch routine in `client` serves every endpoint, and
//! the `endpoint!` macro writes the binding for each request type.
//!
//! Per-call knobs live in `CallOptions`, embedded in every request under
//! `#[serde(skip)]` so they never reach the wire.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::auth::{AuthContext, AuthPolicy, CredentialUpdate};
use crate::settings::Settings;

#[derive(Debug, Clone, Default)]
pub struct CallOptions {
    /// Replaces the instance and process credentials for this call only.
    pub auth_context: Option<AuthContext>,
    /// Replaces the instance and process settings for this call only.
    pub settings: Option<Settings>,
    /// Echoed back in `ApiResult::custom_data`; never sent.
    pub custom_data: Option<Value>,
    /// Merged after the settings' request headers. Auth headers are ignored.
    pub extra_headers: Vec<(String, String)>,
}

pub trait ApiRequest: Serialize + Send + Sync {
    type Response: DeserializeOwned + Send;

    const PATH: &'static str;
    const AUTH: AuthPolicy;

    fn options(&self) -> &CallOptions;

    fn options_mut(&mut self) -> &mut CallOptions;

    /// Requests that carry the title id in their body (logins) expose the
    /// field here; the client fills it from settings when it is empty.
    fn title_id_slot(&mut self) -> Option<&mut Option<String>> {
        None
    }

    /// Credentials to cache after a successful response.
    fn credential_update(_response: &Self::Response) -> Option<CredentialUpdate> {
        None
    }

    fn with_custom_data(mut self, data: Value) -> Self
    where
        Self: Sized,
    {
        self.options_mut().custom_data = Some(data);
        self
    }

    fn with_auth_context(mut self, context: AuthContext) -> Self
    where
        Self: Sized,
    {
        self.options_mut().auth_context = Some(context);
        self
    }

    fn with_settings(mut self, settings: Settings) -> Self
    where
        Self: Sized,
    {
        self.options_mut().settings = Some(settings);
        self
    }

    fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self
    where
        Self: Sized,
    {
        self.options_mut().extra_headers.push((name.into(), value.into()));
        self
    }
}

/// Bind a request type to its response type, path and auth policy.
///
/// The request struct must have an `options: CallOptions` field. Extra trait
/// items (`title_id_slot`, `credential_update`) go in a trailing block.
macro_rules! endpoint {
    ($request:ty => $response:ty, $path:literal, $auth:ident $(, { $($extra:tt)* })?) => {
        impl $crate::request::ApiRequest for $request {
            type Response = $response;

            const PATH: &'static str = $path;
            const AUTH: $crate::auth::AuthPolicy = $crate::auth::AuthPolicy::$auth;

            fn options(&self) -> &$crate::request::CallOptions {
                &self.options
            }

            fn options_mut(&mut self) -> &mut $crate::request::CallOptions {
                &mut self.options
            }

            $($($extra)*)?
        }
    };
}

pub(crate) use endpoint;
