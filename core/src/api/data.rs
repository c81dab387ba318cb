//! Entity objects (`/Object/*`): small JSON documents stored per entity.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::family;
use crate::auth::EntityKey;
use crate::error::ConfigError;
use crate::request::{endpoint, CallOptions};
use crate::result::ApiResult;
use crate::types::CustomTags;

family! {
    /// Read and write entity objects.
    DataApi
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct GetObjectsRequest {
    pub entity: EntityKey,
    /// Return objects as escaped JSON strings instead of nested JSON.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub escape_object: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_tags: Option<CustomTags>,
    #[serde(skip)]
    pub options: CallOptions,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ObjectResult {
    pub object_name: String,
    #[serde(default)]
    pub data_object: Option<Value>,
    #[serde(default)]
    pub escaped_data_object: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct GetObjectsResponse {
    #[serde(default)]
    pub entity: Option<EntityKey>,
    #[serde(default)]
    pub profile_version: i32,
    #[serde(default)]
    pub objects: BTreeMap<String, ObjectResult>,
}

endpoint!(GetObjectsRequest => GetObjectsResponse, "/Object/GetObjects", EntityToken);

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct SetObject {
    pub object_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_object: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delete_object: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub escaped_data_object: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct SetObjectsRequest {
    pub entity: EntityKey,
    /// Optimistic concurrency guard; the write is rejected if the profile
    /// moved past this version.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected_profile_version: Option<i32>,
    pub objects: Vec<SetObject>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_tags: Option<CustomTags>,
    #[serde(skip)]
    pub options: CallOptions,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SetObjectInfo {
    #[serde(default)]
    pub object_name: Option<String>,
    #[serde(default)]
    pub operation_reason: Option<String>,
    /// `Created`, `Updated`, `Deleted` or `None`.
    #[serde(default)]
    pub set_result: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SetObjectsResponse {
    #[serde(default)]
    pub profile_version: i32,
    #[serde(default)]
    pub set_results: Vec<SetObjectInfo>,
}

endpoint!(SetObjectsRequest => SetObjectsResponse, "/Object/SetObjects", EntityToken);

impl DataApi {
    pub async fn get_objects(&self, request: GetObjectsRequest) -> Result<ApiResult<GetObjectsResponse>, ConfigError> {
        self.call(request, None).await
    }

    pub async fn set_objects(&self, request: SetObjectsRequest) -> Result<ApiResult<SetObjectsResponse>, ConfigError> {
        self.call(request, None).await
    }
}
