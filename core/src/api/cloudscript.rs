//! Hosted function execution (`/CloudScript/*`).

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::family;
use crate::auth::EntityKey;
use crate::error::ConfigError;
use crate::request::{endpoint, CallOptions};
use crate::result::ApiResult;
use crate::types::CustomTags;

family! {
    CloudScriptApi
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ExecuteFunctionRequest {
    pub function_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub function_parameter: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity: Option<EntityKey>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generate_play_stream_event: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_tags: Option<CustomTags>,
    #[serde(skip)]
    pub options: CallOptions,
}

/// An exception raised inside the hosted function. The call itself still
/// succeeds; this is part of the result, not an `ApiError`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct FunctionExecutionError {
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub stack_trace: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ExecuteFunctionResult {
    #[serde(default)]
    pub function_name: Option<String>,
    #[serde(default)]
    pub function_result: Option<Value>,
    #[serde(default)]
    pub function_result_too_large: Option<bool>,
    #[serde(default)]
    pub execution_time_milliseconds: i32,
    #[serde(default)]
    pub error: Option<FunctionExecutionError>,
}

endpoint!(ExecuteFunctionRequest => ExecuteFunctionResult, "/CloudScript/ExecuteFunction", EntityToken);

impl CloudScriptApi {
    pub async fn execute_function(
        &self,
        request: ExecuteFunctionRequest,
    ) -> Result<ApiResult<ExecuteFunctionResult>, ConfigError> {
        self.call(request, None).await
    }
}
