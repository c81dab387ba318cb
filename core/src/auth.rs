//! Credentials, per-endpoint auth policies, and the credential cache.
//!
//! # Design
//! Three credentials exist and each maps to one header: a player session
//! ticket (`X-Authorization`), the developer secret key (`X-SecretKey`), and
//! an entity token (`X-EntityToken`). Every endpoint declares an
//! `AuthPolicy`; `resolve` turns that policy plus the effective context and
//! settings into at most one `Credential`.
//!
//! Overrides are layered per call > per instance > process. The first layer
//! that is present wins as a whole (`layered`); fields are never mixed
//! between contexts belonging to different players.
//!
//! `CredentialStore` is the only shared mutable state. It is an `ArcSwap`
//! snapshot: readers take an `Arc` without locking, writers publish a new
//! context through a read-copy-update loop, so two concurrent logins that
//! write different fields both land and writers of the same field resolve
//! last-writer-wins.

use std::fmt;
use std::sync::Arc;

use arc_swap::ArcSwap;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::settings::Settings;

pub const SESSION_TICKET_HEADER: &str = "X-Authorization";
pub const SECRET_KEY_HEADER: &str = "X-SecretKey";
pub const ENTITY_TOKEN_HEADER: &str = "X-EntityToken";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CredentialKind {
    SessionTicket,
    SecretKey,
    EntityToken,
}

impl CredentialKind {
    pub const ALL: [CredentialKind; 3] = [
        CredentialKind::SessionTicket,
        CredentialKind::SecretKey,
        CredentialKind::EntityToken,
    ];

    pub const fn header_name(self) -> &'static str {
        match self {
            CredentialKind::SessionTicket => SESSION_TICKET_HEADER,
            CredentialKind::SecretKey => SECRET_KEY_HEADER,
            CredentialKind::EntityToken => ENTITY_TOKEN_HEADER,
        }
    }

    /// True if `name` is one of the three auth headers.
    pub fn is_auth_header(name: &str) -> bool {
        Self::ALL
            .iter()
            .any(|kind| kind.header_name().eq_ignore_ascii_case(name))
    }
}

/// Which credential an endpoint sends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthPolicy {
    /// Login calls: no credential, the title id travels in the body.
    None,
    SessionTicket,
    SecretKey,
    EntityToken,
    /// Token exchange: entity token, else session ticket, else secret key.
    EntityExchange,
}

impl fmt::Display for AuthPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthPolicy::None => write!(f, "no credential"),
            AuthPolicy::SessionTicket => write!(f, "a session ticket ({SESSION_TICKET_HEADER})"),
            AuthPolicy::SecretKey => write!(f, "a developer secret key ({SECRET_KEY_HEADER})"),
            AuthPolicy::EntityToken => write!(f, "an entity token ({ENTITY_TOKEN_HEADER})"),
            AuthPolicy::EntityExchange => {
                write!(f, "an entity token, session ticket or developer secret key")
            }
        }
    }
}

/// The single credential attached to one outbound call.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    pub kind: CredentialKind,
    pub value: String,
}

impl Credential {
    pub fn header_name(&self) -> &'static str {
        self.kind.header_name()
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("kind", &self.kind)
            .field("value", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct EntityKey {
    pub id: String,
    #[serde(rename = "Type", default)]
    pub entity_type: String,
}

impl EntityKey {
    pub fn new(id: impl Into<String>, entity_type: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            entity_type: entity_type.into(),
        }
    }
}

/// Credentials belonging to one player or one server identity.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct AuthContext {
    pub player_id: Option<String>,
    pub session_ticket: Option<String>,
    pub entity_token: Option<String>,
    pub entity: Option<EntityKey>,
    pub token_expiration: Option<DateTime<Utc>>,
}

impl AuthContext {
    pub fn with_session_ticket(mut self, ticket: impl Into<String>) -> Self {
        self.session_ticket = Some(ticket.into());
        self
    }

    pub fn with_entity_token(mut self, token: impl Into<String>) -> Self {
        self.entity_token = Some(token.into());
        self
    }

    pub fn is_client_logged_in(&self) -> bool {
        self.session_ticket.as_deref().is_some_and(|t| !t.is_empty())
    }

    pub fn is_entity_logged_in(&self) -> bool {
        self.entity_token.as_deref().is_some_and(|t| !t.is_empty())
    }

    pub fn forget_all_credentials(&mut self) {
        *self = Self::default();
    }

    /// Overwrite the fields `update` carries; leave the rest untouched.
    pub fn apply(&mut self, update: &CredentialUpdate) {
        if let Some(player_id) = &update.player_id {
            self.player_id = Some(player_id.clone());
        }
        if let Some(ticket) = &update.session_ticket {
            self.session_ticket = Some(ticket.clone());
        }
        if let Some(token) = &update.entity_token {
            self.entity_token = Some(token.clone());
        }
        if let Some(entity) = &update.entity {
            self.entity = Some(entity.clone());
        }
        if let Some(expiration) = update.token_expiration {
            self.token_expiration = Some(expiration);
        }
    }
}

impl fmt::Debug for AuthContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let redact = |v: &Option<String>| v.as_ref().map(|_| "<redacted>");
        f.debug_struct("AuthContext")
            .field("player_id", &self.player_id)
            .field("session_ticket", &redact(&self.session_ticket))
            .field("entity_token", &redact(&self.entity_token))
            .field("entity", &self.entity)
            .field("token_expiration", &self.token_expiration)
            .finish()
    }
}

/// Partial write produced by a login or token exchange.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CredentialUpdate {
    pub player_id: Option<String>,
    pub session_ticket: Option<String>,
    pub entity_token: Option<String>,
    pub entity: Option<EntityKey>,
    pub token_expiration: Option<DateTime<Utc>>,
}

impl CredentialUpdate {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Shared, lock-free credential cache.
pub struct CredentialStore {
    current: ArcSwap<AuthContext>,
}

impl CredentialStore {
    pub fn new() -> Self {
        Self::with_context(AuthContext::default())
    }

    pub fn with_context(context: AuthContext) -> Self {
        Self {
            current: ArcSwap::from_pointee(context),
        }
    }

    pub fn snapshot(&self) -> Arc<AuthContext> {
        self.current.load_full()
    }

    pub fn apply(&self, update: &CredentialUpdate) {
        self.current.rcu(|current| {
            let mut next = AuthContext::clone(current);
            next.apply(update);
            next
        });
    }

    pub fn replace(&self, context: AuthContext) {
        self.current.store(Arc::new(context));
    }

    pub fn forget_all_credentials(&self) {
        self.replace(AuthContext::default());
    }
}

impl Default for CredentialStore {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for CredentialStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("CredentialStore").field(&*self.snapshot()).finish()
    }
}

/// Pick the most specific layer present: per call, then per instance, then
/// the process default.
pub fn layered<'a, T: ?Sized>(call: Option<&'a T>, instance: Option<&'a T>, process: &'a T) -> &'a T {
    call.or(instance).unwrap_or(process)
}

/// Resolve the credential `policy` demands.
///
/// Returns `Ok(None)` only for `AuthPolicy::None`. Any other policy with no
/// usable credential is a `ConfigError`, so no unauthenticated request is
/// ever sent.
pub fn resolve(
    path: &'static str,
    policy: AuthPolicy,
    context: &AuthContext,
    settings: &Settings,
) -> Result<Option<Credential>, ConfigError> {
    let present = |value: &Option<String>| value.clone().filter(|v| !v.is_empty());
    let pick = |kind: CredentialKind| {
        let value = match kind {
            CredentialKind::SessionTicket => present(&context.session_ticket),
            CredentialKind::SecretKey => present(&settings.developer_secret_key),
            CredentialKind::EntityToken => present(&context.entity_token),
        };
        value.map(|value| Credential { kind, value })
    };

    let credential = match policy {
        AuthPolicy::None => return Ok(None),
        AuthPolicy::SessionTicket => pick(CredentialKind::SessionTicket),
        AuthPolicy::SecretKey => pick(CredentialKind::SecretKey),
        AuthPolicy::EntityToken => pick(CredentialKind::EntityToken),
        AuthPolicy::EntityExchange => pick(CredentialKind::EntityToken)
            .or_else(|| pick(CredentialKind::SessionTicket))
            .or_else(|| pick(CredentialKind::SecretKey)),
    };

    credential
        .map(Some)
        .ok_or(ConfigError::MissingCredential { path, policy })
}
