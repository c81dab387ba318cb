//! Entity token exchange and validation (`/Authentication/*`).

use serde::{Deserialize, Serialize};

use super::family;
use crate::auth::{CredentialUpdate, EntityKey};
use crate::error::ConfigError;
use crate::request::{endpoint, CallOptions};
use crate::result::ApiResult;
use crate::types::{CustomTags, EntityTokenResponse};

family! {
    /// Obtain and check entity tokens.
    AuthenticationApi
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct GetEntityTokenRequest {
    /// Entity to mint a token for; omitted means the caller's own entity
    /// (the title itself when exchanging a secret key).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity: Option<EntityKey>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_tags: Option<CustomTags>,
    #[serde(skip)]
    pub options: CallOptions,
}

pub type GetEntityTokenResponse = EntityTokenResponse;

endpoint!(GetEntityTokenRequest => GetEntityTokenResponse, "/Authentication/GetEntityToken", EntityExchange, {
    fn credential_update(response: &GetEntityTokenResponse) -> Option<CredentialUpdate> {
        Some(response.credential_update())
    }
});

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ValidateEntityTokenRequest {
    pub entity_token: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_tags: Option<CustomTags>,
    #[serde(skip)]
    pub options: CallOptions,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct EntityLineage {
    #[serde(default)]
    pub master_player_account_id: Option<String>,
    #[serde(default)]
    pub namespace_id: Option<String>,
    #[serde(default)]
    pub title_id: Option<String>,
    #[serde(default)]
    pub title_player_account_id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ValidateEntityTokenResponse {
    #[serde(default)]
    pub entity: Option<EntityKey>,
    #[serde(default)]
    pub identity_provider: Option<String>,
    #[serde(default)]
    pub lineage: Option<EntityLineage>,
}

endpoint!(
    ValidateEntityTokenRequest => ValidateEntityTokenResponse,
    "/Authentication/ValidateEntityToken",
    EntityToken
);

impl AuthenticationApi {
    /// Exchange the best available credential for an entity token.
    ///
    /// Sends the entity token if one is cached, else the session ticket,
    /// else the developer secret key. The returned token is cached for
    /// later entity-scoped calls.
    pub async fn get_entity_token(
        &self,
        request: GetEntityTokenRequest,
    ) -> Result<ApiResult<GetEntityTokenResponse>, ConfigError> {
        self.call(request, None).await
    }

    pub async fn validate_entity_token(
        &self,
        request: ValidateEntityTokenRequest,
    ) -> Result<ApiResult<ValidateEntityTokenResponse>, ConfigError> {
        self.call(request, None).await
    }

    pub fn is_entity_logged_in(&self) -> bool {
        self.credentials().snapshot().is_entity_logged_in()
    }
}
