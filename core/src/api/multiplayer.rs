//! Matchmaking tickets (`/Match/*`), authenticated by entity token.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::family;
use crate::auth::EntityKey;
use crate::error::ConfigError;
use crate::request::{endpoint, CallOptions};
use crate::result::ApiResult;
use crate::types::CustomTags;

family! {
    MultiplayerApi
}

/// Player attributes the queue rules match on.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct MatchmakingPlayerAttributes {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_object: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub escaped_data_object: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct MatchmakingPlayer {
    pub entity: EntityKey,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attributes: Option<MatchmakingPlayerAttributes>,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct CreateMatchmakingTicketRequest {
    pub creator: MatchmakingPlayer,
    pub give_up_after_seconds: u32,
    pub queue_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub members_to_match_with: Option<Vec<EntityKey>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_tags: Option<CustomTags>,
    #[serde(skip)]
    pub options: CallOptions,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CreateMatchmakingTicketResult {
    pub ticket_id: String,
}

endpoint!(
    CreateMatchmakingTicketRequest => CreateMatchmakingTicketResult,
    "/Match/CreateMatchmakingTicket",
    EntityToken
);

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct GetMatchmakingTicketRequest {
    pub ticket_id: String,
    pub queue_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub escape_object: Option<bool>,
    #[serde(skip)]
    pub options: CallOptions,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct GetMatchmakingTicketResult {
    pub ticket_id: String,
    pub queue_name: String,
    /// `WaitingForPlayers`, `WaitingForMatch`, `WaitingForServer`,
    /// `Canceled` or `Matched`.
    pub status: String,
    #[serde(default)]
    pub creator: Option<EntityKey>,
    #[serde(default)]
    pub members: Vec<MatchmakingPlayer>,
    #[serde(default)]
    pub match_id: Option<String>,
    #[serde(default)]
    pub cancellation_reason_string: Option<String>,
    #[serde(default)]
    pub created: Option<DateTime<Utc>>,
    #[serde(default)]
    pub give_up_after_seconds: u32,
}

endpoint!(
    GetMatchmakingTicketRequest => GetMatchmakingTicketResult,
    "/Match/GetMatchmakingTicket",
    EntityToken
);

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct CancelMatchmakingTicketRequest {
    pub ticket_id: String,
    pub queue_name: String,
    #[serde(skip)]
    pub options: CallOptions,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct CancelMatchmakingTicketResult {}

endpoint!(
    CancelMatchmakingTicketRequest => CancelMatchmakingTicketResult,
    "/Match/CancelMatchmakingTicket",
    EntityToken
);

impl MultiplayerApi {
    pub async fn create_matchmaking_ticket(
        &self,
        request: CreateMatchmakingTicketRequest,
    ) -> Result<ApiResult<CreateMatchmakingTicketResult>, ConfigError> {
        self.call(request, None).await
    }

    pub async fn get_matchmaking_ticket(
        &self,
        request: GetMatchmakingTicketRequest,
    ) -> Result<ApiResult<GetMatchmakingTicketResult>, ConfigError> {
        self.call(request, None).await
    }

    pub async fn cancel_matchmaking_ticket(
        &self,
        request: CancelMatchmakingTicketRequest,
    ) -> Result<ApiResult<CancelMatchmakingTicketResult>, ConfigError> {
        self.call(request, None).await
    }
}
