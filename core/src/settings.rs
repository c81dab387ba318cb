//! Title-level configuration.
//!
//! # Design
//! `Settings` is plain data: which title the calls belong to, where the API
//! lives, and the developer secret key used by server-scoped endpoints. An
//! `ApiClient` owns one process-level copy; API-family instances and single
//! calls may substitute a whole `Settings` value of their own. Overrides
//! replace the record as a unit so a secret key is never paired with a
//! different title's endpoint.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

pub const SDK_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Value of the `X-PlayFabSDK` header sent with every call.
pub const SDK_HEADER_VALUE: &str = concat!("RustSdk-", env!("CARGO_PKG_VERSION"));

const API_DOMAIN: &str = "playfabapi.com";

#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub title_id: Option<String>,
    pub developer_secret_key: Option<String>,
    /// Full base URL, e.g. a private cloud or a local mock. Wins over
    /// `vertical_name` and `title_id` when building URLs.
    pub endpoint: Option<String>,
    pub vertical_name: Option<String>,
    /// Extra headers attached to every call made with these settings.
    pub request_headers: Vec<(String, String)>,
}

impl Settings {
    pub fn new(title_id: impl Into<String>) -> Self {
        Self {
            title_id: Some(title_id.into()),
            ..Self::default()
        }
    }

    /// Read `PLAYFAB_TITLE_ID`, `PLAYFAB_DEVELOPER_SECRET_KEY`,
    /// `PLAYFAB_ENDPOINT` and `PLAYFAB_VERTICAL_NAME`. Unset or empty
    /// variables leave the field as `None`.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        Self {
            title_id: get("PLAYFAB_TITLE_ID"),
            developer_secret_key: get("PLAYFAB_DEVELOPER_SECRET_KEY"),
            endpoint: get("PLAYFAB_ENDPOINT"),
            vertical_name: get("PLAYFAB_VERTICAL_NAME"),
            request_headers: Vec::new(),
        }
    }

    pub fn with_developer_secret_key(mut self, key: impl Into<String>) -> Self {
        self.developer_secret_key = Some(key.into());
        self
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    pub fn with_vertical_name(mut self, vertical: impl Into<String>) -> Self {
        self.vertical_name = Some(vertical.into());
        self
    }

    pub fn with_request_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.request_headers.push((name.into(), value.into()));
        self
    }

    /// The title id, unless unset or blank.
    pub fn configured_title_id(&self) -> Option<&str> {
        non_blank(&self.title_id)
    }

    /// Base URL for every call, without a trailing slash. Blank values
    /// count as unset.
    pub fn base_url(&self) -> Result<String, ConfigError> {
        if let Some(endpoint) = non_blank(&self.endpoint) {
            return Ok(endpoint.trim_end_matches('/').to_string());
        }
        if let Some(vertical) = non_blank(&self.vertical_name) {
            return Ok(format!("https://{vertical}.{API_DOMAIN}"));
        }
        match self.configured_title_id() {
            Some(title_id) => Ok(format!("https://{}.{API_DOMAIN}", title_id.to_lowercase())),
            None => Err(ConfigError::MissingTitleId),
        }
    }

    pub fn url_for(&self, path: &str) -> Result<String, ConfigError> {
        Ok(format!("{}{path}", self.base_url()?))
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("title_id", &self.title_id)
            .field(
                "developer_secret_key",
                &self.developer_secret_key.as_ref().map(|_| "<redacted>"),
            )
            .field("endpoint", &self.endpoint)
            .field("vertical_name", &self.vertical_name)
            .field("request_headers", &self.request_headers)
            .finish()
    }
}
