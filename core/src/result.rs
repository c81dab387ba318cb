//! Uniform envelope returned by every endpoint method.

use serde_json::Value;

use crate::error::ApiError;

/// Outcome of one call plus the caller's passthrough data.
///
/// `outcome` holds exactly one of the parsed result or the error.
/// `custom_data` is whatever the caller attached to the request's
/// `CallOptions`, handed back untouched on both paths.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResult<T> {
    pub outcome: Result<T, ApiError>,
    pub custom_data: Option<Value>,
}

impl<T> ApiResult<T> {
    pub fn success(result: T, custom_data: Option<Value>) -> Self {
        Self {
            outcome: Ok(result),
            custom_data,
        }
    }

    pub fn failure(error: ApiError, custom_data: Option<Value>) -> Self {
        Self {
            outcome: Err(error),
            custom_data,
        }
    }

    pub fn is_success(&self) -> bool {
        self.outcome.is_ok()
    }

    pub fn result(&self) -> Option<&T> {
        self.outcome.as_ref().ok()
    }

    pub fn error(&self) -> Option<&ApiError> {
        self.outcome.as_ref().err()
    }

    pub fn into_result(self) -> Result<T, ApiError> {
        self.outcome
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> ApiResult<U> {
        ApiResult {
            outcome: self.outcome.map(f),
            custom_data: self.custom_data,
        }
    }
}
