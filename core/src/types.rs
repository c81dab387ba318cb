//! Wire types shared by more than one API family.
//!
//! # Design
//! Field names follow the backend's PascalCase JSON. Per-endpoint request
//! and result types live next to the family that owns them in `api::*`;
//! only records that appear in several of them are defined here.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::auth::{CredentialUpdate, EntityKey};

/// Free-form tags forwarded to the backend for its own analytics.
pub type CustomTags = BTreeMap<String, String>;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum UserDataPermission {
    #[default]
    Private,
    Public,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct UserDataRecord {
    pub value: Option<String>,
    pub last_updated: DateTime<Utc>,
    #[serde(default)]
    pub permission: Option<UserDataPermission>,
}

/// Entity credentials as returned by logins and the token exchange.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct EntityTokenResponse {
    #[serde(default)]
    pub entity: Option<EntityKey>,
    #[serde(default)]
    pub entity_token: Option<String>,
    #[serde(default)]
    pub token_expiration: Option<DateTime<Utc>>,
}

impl EntityTokenResponse {
    pub(crate) fn credential_update(&self) -> CredentialUpdate {
        CredentialUpdate {
            entity_token: self.entity_token.clone(),
            entity: self.entity.clone(),
            token_expiration: self.token_expiration,
            ..CredentialUpdate::default()
        }
    }
}
