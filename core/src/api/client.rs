//! Player-facing endpoints (`/Client/*`), authenticated by session ticket.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::family;
use crate::auth::CredentialUpdate;
use crate::error::ConfigError;
use crate::request::{endpoint, CallOptions};
use crate::result::ApiResult;
use crate::types::{CustomTags, EntityTokenResponse, UserDataPermission, UserDataRecord};

family! {
    /// Calls made on behalf of a signed-in player.
    ClientApi
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct LoginWithCustomIdRequest {
    pub custom_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub create_account: Option<bool>,
    /// Filled from settings when left empty.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_tags: Option<CustomTags>,
    #[serde(skip)]
    pub options: CallOptions,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct LoginResult {
    #[serde(default)]
    pub play_fab_id: Option<String>,
    #[serde(default)]
    pub session_ticket: Option<String>,
    #[serde(default)]
    pub newly_created: bool,
    #[serde(default)]
    pub last_login_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub entity_token: Option<EntityTokenResponse>,
}

impl LoginResult {
    fn credential_update(&self) -> CredentialUpdate {
        let mut update = self
            .entity_token
            .as_ref()
            .map(EntityTokenResponse::credential_update)
            .unwrap_or_default();
        update.player_id = self.play_fab_id.clone();
        update.session_ticket = self.session_ticket.clone();
        update
    }
}

endpoint!(LoginWithCustomIdRequest => LoginResult, "/Client/LoginWithCustomID", None, {
    fn title_id_slot(&mut self) -> Option<&mut Option<String>> {
        Some(&mut self.title_id)
    }

    fn credential_update(response: &LoginResult) -> Option<CredentialUpdate> {
        Some(response.credential_update())
    }
});

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct GetUserDataRequest {
    /// Another player's id; omitted means the signed-in player.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub play_fab_id: Option<String>,
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

endpoint!(GetUserDataRequest => GetUserDataResult, "/Client/GetUserData", SessionTicket);

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct UpdateUserDataRequest {
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

endpoint!(UpdateUserDataRequest => UpdateUserDataResult, "/Client/UpdateUserData", SessionTicket);

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

endpoint!(GetTitleDataRequest => GetTitleDataResult, "/Client/GetTitleData", SessionTicket);

impl ClientApi {
    /// Sign in (optionally creating the account) with a title-defined id.
    /// On success the session ticket and entity token are cached.
    pub async fn login_with_custom_id(
        &self,
        request: LoginWithCustomIdRequest,
    ) -> Result<ApiResult<LoginResult>, ConfigError> {
        self.call(request, None).await
    }

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

    pub fn is_client_logged_in(&self) -> bool {
        self.credentials().snapshot().is_client_logged_in()
    }
}
