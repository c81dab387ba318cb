//! Trusted game-server endpoints (`/Server/*`), authenticated by the
//! developer secret key.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::family;
use crate::error::ConfigError;
use crate::request::{endpoint, CallOptions};
use crate::result::ApiResult;
use crate::types::{CustomTags, UserDataPermission, UserDataRecord};

family! {
    /// Calls that act on any player with title-wide authority.
    ServerApi
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct GetUserDataRequest {
    pub play_fab_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keys: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub if_changed_from_data_version: Option<u32>,
    #[serde(skip)]
    pub options: CallOptions,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct GetUserDataResult {
    #[serde(default)]
    pub play_fab_id: Option<String>,
    #[serde(default)]
    pub data_version: u32,
    #[serde(default)]
    pub data: BTreeMap<String, UserDataRecord>,
}

endpoint!(GetUserDataRequest => GetUserDataResult, "/Server/GetUserData", SecretKey);

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct UpdateUserDataRequest {
    pub play_fab_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<BTreeMap<String, String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keys_to_remove: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub permission: Option<UserDataPermission>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_tags: Option<CustomTags>,
    #[serde(skip)]
    pub options: CallOptions,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct UpdateUserDataResult {
    #[serde(default)]
    pub data_version: u32,
}

endpoint!(UpdateUserDataRequest => UpdateUserDataResult, "/Server/UpdateUserData", SecretKey);

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct GetTitleDataRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keys: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub override_label: Option<String>,
    #[serde(skip)]
    pub options: CallOptions,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct GetTitleDataResult {
    #[serde(default)]
    pub data: BTreeMap<String, String>,
}

endpoint!(GetTitleDataRequest => GetTitleDataResult, "/Server/GetTitleData", SecretKey);

/// Writes one title data key. A `None` value removes the key.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct SetTitleDataRequest {
    pub key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(skip)]
    pub options: CallOptions,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct SetTitleDataResult {}

endpoint!(SetTitleDataRequest => SetTitleDataResult, "/Server/SetTitleData", SecretKey);

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct AuthenticateSessionTicketRequest {
    pub session_ticket: String,
    #[serde(skip)]
    pub options: CallOptions,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct UserAccountInfo {
    #[serde(default)]
    pub play_fab_id: Option<String>,
    #[serde(default)]
    pub created: Option<DateTime<Utc>>,
    #[serde(default)]
    pub title_info: Option<UserTitleInfo>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct UserTitleInfo {
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub is_banned: Option<bool>,
    #[serde(default)]
    pub last_login: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AuthenticateSessionTicketResult {
    #[serde(default)]
    pub user_info: Option<UserAccountInfo>,
    #[serde(default)]
    pub is_session_ticket_expired: Option<bool>,
}

endpoint!(
    AuthenticateSessionTicketRequest => AuthenticateSessionTicketResult,
    "/Server/AuthenticateSessionTicket",
    SecretKey
);

impl ServerApi {
    pub async fn get_user_data(&self, request: GetUserDataRequest) -> Result<ApiResult<GetUserDataResult>, ConfigError> {
        self.call(request, None).await
    }

    pub async fn update_user_data(
        &self,
        request: UpdateUserDataRequest,
    ) -> Result<ApiResult<UpdateUserDataResult>, ConfigError> {
        self.call(request, None).await
    }

    pub async fn get_title_data(
        &self,
        request: GetTitleDataRequest,
    ) -> Result<ApiResult<GetTitleDataResult>, ConfigError> {
        self.call(request, None).await
    }

    pub async fn set_title_data(
        &self,
        request: SetTitleDataRequest,
    ) -> Result<ApiResult<SetTitleDataResult>, ConfigError> {
        self.call(request, None).await
    }

    /// Check that a ticket a client presented belongs to a live session.
    pub async fn authenticate_session_ticket(
        &self,
        request: AuthenticateSessionTicketRequest,
    ) -> Result<ApiResult<AuthenticateSessionTicketResult>, ConfigError> {
        self.call(request, None).await
    }
}
