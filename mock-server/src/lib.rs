//! In-memory stand-in for the game backend, used by end-to-end tests.
//!
//! Speaks the same wire format as the real service: PascalCase JSON bodies,
//! `{"code","status","data"}` on success and
//! `{"code","status","error","errorCode","errorMessage"}` on failure, with
//! the three credential headers checked per path.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::{net::TcpListener, sync::RwLock};
use uuid::Uuid;

pub const INVALID_PARAMS: i32 = 1000;
pub const ACCOUNT_NOT_FOUND: i32 = 1001;
pub const NOT_AUTHENTICATED: i32 = 1074;
pub const INVALID_SESSION_TICKET: i32 = 1100;
pub const INVALID_TITLE_ID: i32 = 1004;
pub const MATCHMAKING_TICKET_NOT_FOUND: i32 = 2016;

const ENTITY_TOKEN_LIFETIME_HOURS: i64 = 24;

#[derive(Debug, Clone)]
pub struct MockConfig {
    pub title_id: String,
    pub secret_key: String,
}

impl Default for MockConfig {
    fn default() -> Self {
        Self {
            title_id: "MOCK".to_string(),
            secret_key: "mock-secret-key".to_string(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct EntityKey {
    pub id: String,
    #[serde(rename = "Type")]
    pub entity_type: String,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct DataRecord {
    pub value: String,
    pub last_updated: DateTime<Utc>,
    pub permission: String,
}

#[derive(Debug)]
struct Player {
    id: String,
    entity: EntityKey,
    created: DateTime<Utc>,
    data: BTreeMap<String, DataRecord>,
    data_version: u32,
}

#[derive(Debug, Clone)]
struct MatchTicket {
    id: String,
    queue_name: String,
    creator: EntityKey,
    status: String,
    cancellation_reason: Option<String>,
    created: DateTime<Utc>,
    give_up_after_seconds: u32,
}

#[derive(Debug)]
pub struct Backend {
    config: MockConfig,
    players: HashMap<String, Player>,
    custom_ids: HashMap<String, String>,
    sessions: HashMap<String, String>,
    entity_tokens: HashMap<String, EntityKey>,
    title_data: BTreeMap<String, String>,
    tickets: HashMap<String, MatchTicket>,
}

impl Backend {
    fn new(config: MockConfig) -> Self {
        Self {
            config,
            players: HashMap::new(),
            custom_ids: HashMap::new(),
            sessions: HashMap::new(),
            entity_tokens: HashMap::new(),
            title_data: BTreeMap::new(),
            tickets: HashMap::new(),
        }
    }

    fn mint_entity_token(&mut self, entity: EntityKey) -> serde_json::Value {
        let token = Uuid::new_v4().simple().to_string();
        self.entity_tokens.insert(token.clone(), entity.clone());
        json!({
            "Entity": entity,
            "EntityToken": token,
            "TokenExpiration": Utc::now() + Duration::hours(ENTITY_TOKEN_LIFETIME_HOURS),
        })
    }
}

pub type Db = Arc<RwLock<Backend>>;

/// Error response in the backend's envelope format.
#[derive(Debug)]
pub struct ApiFailure {
    status: StatusCode,
    error: &'static str,
    error_code: i32,
    message: String,
}

impl ApiFailure {
    fn new(status: StatusCode, error: &'static str, error_code: i32, message: impl Into<String>) -> Self {
        Self {
            status,
            error,
            error_code,
            message: message.into(),
        }
    }

    fn not_authenticated(message: &str) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "NotAuthenticated", NOT_AUTHENTICATED, message)
    }

    fn account_not_found() -> Self {
        Self::new(StatusCode::BAD_REQUEST, "AccountNotFound", ACCOUNT_NOT_FOUND, "User not found")
    }
}

impl IntoResponse for ApiFailure {
    fn into_response(self) -> Response {
        let status_text: String = self
            .status
            .canonical_reason()
            .unwrap_or("Error")
            .split_whitespace()
            .collect();
        let body = json!({
            "code": self.status.as_u16(),
            "status": status_text,
            "error": self.error,
            "errorCode": self.error_code,
            "errorMessage": self.message,
        });
        (self.status, Json(body)).into_response()
    }
}

fn ok<T: Serialize>(data: T) -> Response {
    Json(json!({"code": 200, "status": "OK", "data": data})).into_response()
}

fn header<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

fn require_secret_key(headers: &HeaderMap, backend: &Backend) -> Result<(), ApiFailure> {
    match header(headers, "X-SecretKey") {
        Some(key) if key == backend.config.secret_key => Ok(()),
        _ => Err(ApiFailure::not_authenticated("Invalid or missing X-SecretKey")),
    }
}

fn require_session(headers: &HeaderMap, backend: &Backend) -> Result<String, ApiFailure> {
    header(headers, "X-Authorization")
        .and_then(|ticket| backend.sessions.get(ticket))
        .cloned()
        .ok_or_else(|| ApiFailure::not_authenticated("Invalid or missing X-Authorization"))
}

fn require_entity(headers: &HeaderMap, backend: &Backend) -> Result<EntityKey, ApiFailure> {
    header(headers, "X-EntityToken")
        .and_then(|token| backend.entity_tokens.get(token))
        .cloned()
        .ok_or_else(|| ApiFailure::not_authenticated("Invalid or missing X-EntityToken"))
}

pub fn app(config: MockConfig) -> Router {
    let db: Db = Arc::new(RwLock::new(Backend::new(config)));
    Router::new()
        .route("/Client/LoginWithCustomID", post(login_with_custom_id))
        .route("/Client/GetUserData", post(client_get_user_data))
        .route("/Client/UpdateUserData", post(client_update_user_data))
        .route("/Client/GetTitleData", post(client_get_title_data))
        .route("/Server/GetUserData", post(server_get_user_data))
        .route("/Server/UpdateUserData", post(server_update_user_data))
        .route("/Server/GetTitleData", post(server_get_title_data))
        .route("/Server/SetTitleData", post(server_set_title_data))
        .route("/Server/AuthenticateSessionTicket", post(authenticate_session_ticket))
        .route("/Authentication/GetEntityToken", post(get_entity_token))
        .route("/Authentication/ValidateEntityToken", post(validate_entity_token))
        .route("/Match/CreateMatchmakingTicket", post(create_matchmaking_ticket))
        .route("/Match/GetMatchmakingTicket", post(get_matchmaking_ticket))
        .route("/Match/CancelMatchmakingTicket", post(cancel_matchmaking_ticket))
        .with_state(db)
}

pub async fn run(listener: TcpListener, config: MockConfig) -> Result<(), std::io::Error> {
    axum::serve(listener, app(config)).await
}

// ---------------------------------------------------------------------------
// Login
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct LoginWithCustomId {
    pub custom_id: String,
    #[serde(default)]
    pub create_account: Option<bool>,
    #[serde(default)]
    pub title_id: Option<String>,
}

async fn login_with_custom_id(State(db): State<Db>, Json(input): Json<LoginWithCustomId>) -> Result<Response, ApiFailure> {
    let mut backend = db.write().await;
    if input.title_id.as_deref() != Some(backend.config.title_id.as_str()) {
        return Err(ApiFailure::new(
            StatusCode::BAD_REQUEST,
            "InvalidTitleId",
            INVALID_TITLE_ID,
            "Invalid title id",
        ));
    }

    let existing = backend.custom_ids.get(&input.custom_id).cloned();
    let newly_created = existing.is_none();
    let player_id = match existing {
        Some(id) => id,
        None if input.create_account == Some(true) => {
            let id = Uuid::new_v4().simple().to_string()[..16].to_uppercase();
            let player = Player {
                id: id.clone(),
                entity: EntityKey {
                    id: Uuid::new_v4().simple().to_string()[..16].to_uppercase(),
                    entity_type: "title_player_account".to_string(),
                },
                created: Utc::now(),
                data: BTreeMap::new(),
                data_version: 0,
            };
            backend.players.insert(id.clone(), player);
            backend.custom_ids.insert(input.custom_id.clone(), id.clone());
            tracing::info!(player_id = %id, "created account");
            id
        }
        None => return Err(ApiFailure::account_not_found()),
    };

    let ticket = format!("{player_id}-{}", Uuid::new_v4().simple());
    backend.sessions.insert(ticket.clone(), player_id.clone());
    let entity = backend.players[&player_id].entity.clone();
    let entity_token = backend.mint_entity_token(entity);

    Ok(ok(json!({
        "PlayFabId": player_id,
        "SessionTicket": ticket,
        "NewlyCreated": newly_created,
        "LastLoginTime": Utc::now(),
        "EntityToken": entity_token,
    })))
}

// ---------------------------------------------------------------------------
// User data
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct GetUserData {
    #[serde(default)]
    pub play_fab_id: Option<String>,
    #[serde(default)]
    pub keys: Option<Vec<String>>,
    #[serde(default)]
    pub if_changed_from_data_version: Option<u32>,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct UpdateUserData {
    #[serde(default)]
    pub play_fab_id: Option<String>,
    #[serde(default)]
    pub data: Option<BTreeMap<String, String>>,
    #[serde(default)]
    pub keys_to_remove: Option<Vec<String>>,
    #[serde(default)]
    pub permission: Option<String>,
}

fn user_data_response(backend: &Backend, player_id: &str, input: &GetUserData) -> Result<Response, ApiFailure> {
    let player = backend.players.get(player_id).ok_or_else(ApiFailure::account_not_found)?;
    let unchanged = input
        .if_changed_from_data_version
        .is_some_and(|v| v >= player.data_version);
    let data: BTreeMap<&String, &DataRecord> = if unchanged {
        BTreeMap::new()
    } else {
        player
            .data
            .iter()
            .filter(|(k, _)| input.keys.as_ref().map_or(true, |keys| keys.contains(k)))
            .collect()
    };
    Ok(ok(json!({
        "PlayFabId": player.id,
        "DataVersion": player.data_version,
        "Data": data,
    })))
}

fn apply_user_data(backend: &mut Backend, player_id: &str, input: UpdateUserData) -> Result<Response, ApiFailure> {
    let player = backend
        .players
        .get_mut(player_id)
        .ok_or_else(ApiFailure::account_not_found)?;
    let now = Utc::now();
    let permission = input.permission.unwrap_or_else(|| "Private".to_string());
    for (key, value) in input.data.unwrap_or_default() {
        player.data.insert(
            key,
            DataRecord {
                value,
                last_updated: now,
                permission: permission.clone(),
            },
        );
    }
    for key in input.keys_to_remove.unwrap_or_default() {
        player.data.remove(&key);
    }
    player.data_version += 1;
    Ok(ok(json!({"DataVersion": player.data_version})))
}

async fn client_get_user_data(
    State(db): State<Db>,
    headers: HeaderMap,
    Json(input): Json<GetUserData>,
) -> Result<Response, ApiFailure> {
    let backend = db.read().await;
    let caller = require_session(&headers, &backend)?;
    let player_id = input.play_fab_id.clone().unwrap_or(caller);
    user_data_response(&backend, &player_id, &input)
}

async fn client_update_user_data(
    State(db): State<Db>,
    headers: HeaderMap,
    Json(input): Json<UpdateUserData>,
) -> Result<Response, ApiFailure> {
    let mut backend = db.write().await;
    let caller = require_session(&headers, &backend)?;
    apply_user_data(&mut backend, &caller, input)
}

async fn server_get_user_data(
    State(db): State<Db>,
    headers: HeaderMap,
    Json(input): Json<GetUserData>,
) -> Result<Response, ApiFailure> {
    let backend = db.read().await;
    require_secret_key(&headers, &backend)?;
    let player_id = input.play_fab_id.clone().ok_or_else(|| {
        ApiFailure::new(StatusCode::BAD_REQUEST, "InvalidParams", INVALID_PARAMS, "PlayFabId is required")
    })?;
    user_data_response(&backend, &player_id, &input)
}

async fn server_update_user_data(
    State(db): State<Db>,
    headers: HeaderMap,
    Json(input): Json<UpdateUserData>,
) -> Result<Response, ApiFailure> {
    let mut backend = db.write().await;
    require_secret_key(&headers, &backend)?;
    let player_id = input.play_fab_id.clone().ok_or_else(|| {
        ApiFailure::new(StatusCode::BAD_REQUEST, "InvalidParams", INVALID_PARAMS, "PlayFabId is required")
    })?;
    apply_user_data(&mut backend, &player_id, input)
}

// ---------------------------------------------------------------------------
// Title data
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct GetTitleData {
    #[serde(default)]
    pub keys: Option<Vec<String>>,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SetTitleData {
    pub key: String,
    #[serde(default)]
    pub value: Option<String>,
}

fn title_data_response(backend: &Backend, input: &GetTitleData) -> Response {
    let data: BTreeMap<&String, &String> = backend
        .title_data
        .iter()
        .filter(|(k, _)| input.keys.as_ref().map_or(true, |keys| keys.contains(k)))
        .collect();
    ok(json!({ "Data": data }))
}

async fn client_get_title_data(
    State(db): State<Db>,
    headers: HeaderMap,
    Json(input): Json<GetTitleData>,
) -> Result<Response, ApiFailure> {
    let backend = db.read().await;
    require_session(&headers, &backend)?;
    Ok(title_data_response(&backend, &input))
}

async fn server_get_title_data(
    State(db): State<Db>,
    headers: HeaderMap,
    Json(input): Json<GetTitleData>,
) -> Result<Response, ApiFailure> {
    let backend = db.read().await;
    require_secret_key(&headers, &backend)?;
    Ok(title_data_response(&backend, &input))
}

/// Seeds title data; a missing value deletes the key.
async fn server_set_title_data(
    State(db): State<Db>,
    headers: HeaderMap,
    Json(input): Json<SetTitleData>,
) -> Result<Response, ApiFailure> {
    let mut backend = db.write().await;
    require_secret_key(&headers, &backend)?;
    match input.value {
        Some(value) => backend.title_data.insert(input.key, value),
        None => backend.title_data.remove(&input.key),
    };
    Ok(ok(json!({})))
}

// ---------------------------------------------------------------------------
// Session tickets and entity tokens
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AuthenticateSessionTicket {
    pub session_ticket: String,
}

async fn authenticate_session_ticket(
    State(db): State<Db>,
    headers: HeaderMap,
    Json(input): Json<AuthenticateSessionTicket>,
) -> Result<Response, ApiFailure> {
    let backend = db.read().await;
    require_secret_key(&headers, &backend)?;
    let player = backend
        .sessions
        .get(&input.session_ticket)
        .and_then(|id| backend.players.get(id))
        .ok_or_else(|| {
            ApiFailure::new(
                StatusCode::BAD_REQUEST,
                "InvalidSessionTicket",
                INVALID_SESSION_TICKET,
                "Session ticket is not valid",
            )
        })?;
    Ok(ok(json!({
        "UserInfo": {
            "PlayFabId": player.id,
            "Created": player.created,
        },
        "IsSessionTicketExpired": false,
    })))
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct GetEntityToken {
    #[serde(default)]
    pub entity: Option<EntityKey>,
}

/// Exchange whichever credential header is present, most specific first.
async fn get_entity_token(
    State(db): State<Db>,
    headers: HeaderMap,
    Json(input): Json<GetEntityToken>,
) -> Result<Response, ApiFailure> {
    let mut backend = db.write().await;
    let entity = if header(&headers, "X-EntityToken").is_some() {
        require_entity(&headers, &backend)?
    } else if header(&headers, "X-Authorization").is_some() {
        let player_id = require_session(&headers, &backend)?;
        backend.players[&player_id].entity.clone()
    } else {
        require_secret_key(&headers, &backend)?;
        input.entity.unwrap_or_else(|| EntityKey {
            id: backend.config.title_id.clone(),
            entity_type: "title".to_string(),
        })
    };
    Ok(ok(backend.mint_entity_token(entity)))
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ValidateEntityToken {
    pub entity_token: String,
}

async fn validate_entity_token(
    State(db): State<Db>,
    headers: HeaderMap,
    Json(input): Json<ValidateEntityToken>,
) -> Result<Response, ApiFailure> {
    let backend = db.read().await;
    require_entity(&headers, &backend)?;
    let entity = backend.entity_tokens.get(&input.entity_token).ok_or_else(|| {
        ApiFailure::new(StatusCode::BAD_REQUEST, "InvalidParams", INVALID_PARAMS, "Entity token is not valid")
    })?;
    Ok(ok(json!({
        "Entity": entity,
        "IdentityProvider": "CustomId",
        "Lineage": { "TitleId": backend.config.title_id },
    })))
}

// ---------------------------------------------------------------------------
// Matchmaking
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct MatchmakingPlayer {
    pub entity: EntityKey,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CreateMatchmakingTicket {
    pub creator: MatchmakingPlayer,
    pub give_up_after_seconds: u32,
    pub queue_name: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TicketRef {
    pub ticket_id: String,
    pub queue_name: String,
}

fn ticket_not_found() -> ApiFailure {
    ApiFailure::new(
        StatusCode::NOT_FOUND,
        "MatchmakingTicketNotFound",
        MATCHMAKING_TICKET_NOT_FOUND,
        "Ticket not found",
    )
}

async fn create_matchmaking_ticket(
    State(db): State<Db>,
    headers: HeaderMap,
    Json(input): Json<CreateMatchmakingTicket>,
) -> Result<Response, ApiFailure> {
    let mut backend = db.write().await;
    require_entity(&headers, &backend)?;
    if input.queue_name.is_empty() {
        return Err(ApiFailure::new(
            StatusCode::BAD_REQUEST,
            "InvalidParams",
            INVALID_PARAMS,
            "QueueName is required",
        ));
    }
    let ticket = MatchTicket {
        id: Uuid::new_v4().to_string(),
        queue_name: input.queue_name,
        creator: input.creator.entity,
        status: "WaitingForMatch".to_string(),
        cancellation_reason: None,
        created: Utc::now(),
        give_up_after_seconds: input.give_up_after_seconds,
    };
    let id = ticket.id.clone();
    backend.tickets.insert(id.clone(), ticket);
    Ok(ok(json!({ "TicketId": id })))
}

async fn get_matchmaking_ticket(
    State(db): State<Db>,
    headers: HeaderMap,
    Json(input): Json<TicketRef>,
) -> Result<Response, ApiFailure> {
    let backend = db.read().await;
    require_entity(&headers, &backend)?;
    let ticket = backend
        .tickets
        .get(&input.ticket_id)
        .filter(|t| t.queue_name == input.queue_name)
        .ok_or_else(ticket_not_found)?;
    Ok(ok(json!({
        "TicketId": ticket.id,
        "QueueName": ticket.queue_name,
        "Status": ticket.status,
        "Creator": ticket.creator,
        "Members": [{ "Entity": ticket.creator }],
        "CancellationReasonString": ticket.cancellation_reason,
        "Created": ticket.created,
        "GiveUpAfterSeconds": ticket.give_up_after_seconds,
    })))
}

async fn cancel_matchmaking_ticket(
    State(db): State<Db>,
    headers: HeaderMap,
    Json(input): Json<TicketRef>,
) -> Result<Response, ApiFailure> {
    let mut backend = db.write().await;
    require_entity(&headers, &backend)?;
    let ticket = backend
        .tickets
        .get_mut(&input.ticket_id)
        .filter(|t| t.queue_name == input.queue_name)
        .ok_or_else(ticket_not_found)?;
    ticket.status = "Canceled".to_string();
    ticket.cancellation_reason = Some("Requested".to_string());
    Ok(ok(json!({})))
}
