//! Request dispatch shared by every endpoint.
//!
//! # Design
//! `ApiClient` owns the process-level pieces: default `Settings`, the shared
//! `CredentialStore`, the injected `Serializer` and `Transport`, and an
//! optional error observer. It is cheap to clone and is the only handle API
//! families need.
//!
//! One call goes through three steps, each usable on its own:
//! - `build_request` resolves settings and credentials and produces a plain
//!   `HttpRequest`. Configuration problems stop here as `ConfigError`.
//! - the transport executes it (the single await point).
//! - `parse_response` turns the `HttpResponse` into the typed payload or an
//!   `ApiError`.
//!
//! `execute_scoped` strings them together, notifies the error observer,
//! applies credential cache-fills, and wraps everything in `ApiResult`.

use std::fmt;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Deserialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument, warn, Span};
use uuid::Uuid;

use crate::auth::{self, AuthContext, CredentialKind, CredentialStore};
use crate::error::{ApiError, ConfigError, ErrorEnvelope};
use crate::http::{HttpRequest, HttpResponse};
use crate::request::ApiRequest;
use crate::result::ApiResult;
use crate::serializer::{JsonSerializer, Serializer};
use crate::settings::{Settings, SDK_HEADER_VALUE};
use crate::transport::{ReqwestTransport, Transport, TransportError};

/// Observer invoked with every `ApiError` the client produces.
pub type ErrorHandler = Arc<dyn Fn(&ApiError) + Send + Sync>;

/// Per-instance overrides held by an API family object.
#[derive(Debug, Clone, Default)]
pub struct Scope {
    pub settings: Option<Settings>,
    /// Instance credential store; cache-fills land here instead of the
    /// process store when set.
    pub credentials: Option<Arc<CredentialStore>>,
}

impl Scope {
    pub fn with_auth_context(context: AuthContext) -> Self {
        Self {
            settings: None,
            credentials: Some(Arc::new(CredentialStore::with_context(context))),
        }
    }
}

/// Output of `build_request`: the wire request plus what is needed to
/// finish the call.
#[derive(Debug, Clone)]
pub struct PreparedCall {
    pub request: HttpRequest,
    /// Which credential header was attached, if any.
    pub credential: Option<CredentialKind>,
}

#[derive(Deserialize)]
struct DataEnvelope<T> {
    data: T,
}

struct Inner {
    settings: Settings,
    credentials: Arc<CredentialStore>,
    serializer: Arc<dyn Serializer>,
    transport: Arc<dyn Transport>,
    error_handler: Option<ErrorHandler>,
}

#[derive(Default)]
pub struct ApiClientBuilder {
    settings: Settings,
    auth_context: AuthContext,
    serializer: Option<Arc<dyn Serializer>>,
    transport: Option<Arc<dyn Transport>>,
    error_handler: Option<ErrorHandler>,
}

impl ApiClientBuilder {
    pub fn serializer(mut self, serializer: impl Serializer + 'static) -> Self {
        self.serializer = Some(Arc::new(serializer));
        self
    }

    pub fn transport(mut self, transport: impl Transport + 'static) -> Self {
        self.transport = Some(Arc::new(transport));
        self
    }

    pub fn shared_transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Initial contents of the process credential store.
    pub fn auth_context(mut self, context: AuthContext) -> Self {
        self.auth_context = context;
        self
    }

    pub fn error_handler(mut self, handler: impl Fn(&ApiError) + Send + Sync + 'static) -> Self {
        self.error_handler = Some(Arc::new(handler));
        self
    }

    pub fn build(self) -> Result<ApiClient, ConfigError> {
        let serializer = self.serializer.ok_or(ConfigError::MissingSerializer)?;
        let transport = self.transport.ok_or(ConfigError::MissingTransport)?;
        Ok(ApiClient {
            inner: Arc::new(Inner {
                settings: self.settings,
                credentials: Arc::new(CredentialStore::with_context(self.auth_context)),
                serializer,
                transport,
                error_handler: self.error_handler,
            }),
        })
    }
}

#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<Inner>,
}

impl ApiClient {
    pub fn builder(settings: Settings) -> ApiClientBuilder {
        ApiClientBuilder {
            settings,
            ..ApiClientBuilder::default()
        }
    }

    /// Client with `JsonSerializer` and a default `ReqwestTransport`.
    pub fn new(settings: Settings) -> Result<Self, ConfigError> {
        let transport = ReqwestTransport::new().map_err(|e| ConfigError::Transport(e.to_string()))?;
        Self::builder(settings)
            .serializer(JsonSerializer)
            .transport(transport)
            .build()
    }

    pub fn settings(&self) -> &Settings {
        &self.inner.settings
    }

    /// The process-level credential store.
    pub fn credentials(&self) -> &Arc<CredentialStore> {
        &self.inner.credentials
    }

    pub fn forget_all_credentials(&self) {
        self.inner.credentials.forget_all_credentials();
    }

    /// Resolve settings and credentials and build the wire request.
    ///
    /// Fills an empty title id slot from the effective settings. Fails with
    /// `ConfigError` when the endpoint's credential, the base URL, or the
    /// title id cannot be resolved, or the request does not serialize.
    pub fn build_request<R: ApiRequest>(&self, request: &mut R, scope: &Scope) -> Result<PreparedCall, ConfigError> {
        let settings = auth::layered(
            request.options().settings.as_ref(),
            scope.settings.as_ref(),
            &self.inner.settings,
        )
        .clone();

        let instance = scope.credentials.as_ref().map(|store| store.snapshot());
        let process = self.inner.credentials.snapshot();
        let context = auth::layered(request.options().auth_context.as_ref(), instance.as_deref(), &*process);
        let credential = auth::resolve(R::PATH, R::AUTH, context, &settings)?;

        let url = settings.url_for(R::PATH)?;

        if let Some(slot) = request.title_id_slot() {
            if slot.is_none() {
                let title_id = settings.configured_title_id().ok_or(ConfigError::MissingTitleId)?;
                *slot = Some(title_id.to_string());
            }
        }

        let body = self
            .inner
            .serializer
            .serialize(&*request)
            .map_err(|e| ConfigError::Serialization {
                path: R::PATH,
                message: e.0,
            })?;

        let mut headers = vec![
            ("Content-Type".to_string(), "application/json".to_string()),
            ("X-PlayFabSDK".to_string(), SDK_HEADER_VALUE.to_string()),
        ];
        if let Some(credential) = &credential {
            headers.push((credential.header_name().to_string(), credential.value.clone()));
        }
        let extras = settings
            .request_headers
            .iter()
            .chain(request.options().extra_headers.iter());
        for (name, value) in extras {
            if CredentialKind::is_auth_header(name) {
                warn!(path = R::PATH, header = %name, "ignoring auth header supplied as extra header");
                continue;
            }
            // Later layers replace earlier ones with the same name.
            headers.retain(|(existing, _)| !existing.eq_ignore_ascii_case(name));
            headers.push((name.clone(), value.clone()));
        }

        Ok(PreparedCall {
            request: HttpRequest { url, headers, body },
            credential: credential.map(|c| c.kind),
        })
    }

    /// Decode a response for `path`.
    ///
    /// 2xx bodies must be a `{"data": ...}` envelope; anything else is a
    /// `JsonParseError`. Non-2xx bodies are read as the backend's error
    /// envelope, falling back to `ServiceUnavailable` with the raw body.
    pub fn parse_response<T: DeserializeOwned>(&self, path: &str, response: HttpResponse) -> Result<T, ApiError> {
        let serializer = &self.inner.serializer;
        if !response.is_success() {
            return Err(match serializer.deserialize::<ErrorEnvelope>(&response.body) {
                Ok(envelope) => envelope.into_api_error(path),
                Err(_) => ApiError::service_unavailable(path, response.status, response.body),
            });
        }
        serializer
            .deserialize::<DataEnvelope<T>>(&response.body)
            .map(|envelope| envelope.data)
            .map_err(|e| ApiError::json_parse(path, response.status, e.0))
    }

    pub async fn execute<R: ApiRequest>(&self, request: R) -> Result<ApiResult<R::Response>, ConfigError> {
        self.execute_scoped(request, &Scope::default(), None).await
    }

    /// Like `execute`, but abandons the transport call once `cancel` fires.
    /// A cancelled call yields a connection error in the envelope.
    pub async fn execute_with_cancel<R: ApiRequest>(
        &self,
        request: R,
        cancel: &CancellationToken,
    ) -> Result<ApiResult<R::Response>, ConfigError> {
        self.execute_scoped(request, &Scope::default(), Some(cancel)).await
    }

    #[instrument(
        name = "api_request",
        skip_all,
        fields(
            http.path = R::PATH,
            request_id = %Uuid::new_v4(),
            http.status_code = tracing::field::Empty,
            otel.kind = "client",
            otel.status_code = tracing::field::Empty,
        )
    )]
    pub async fn execute_scoped<R: ApiRequest>(
        &self,
        mut request: R,
        scope: &Scope,
        cancel: Option<&CancellationToken>,
    ) -> Result<ApiResult<R::Response>, ConfigError> {
        let prepared = self.build_request(&mut request, scope).map_err(|err| {
            warn!(error = %err, "call rejected before dispatch");
            err
        })?;
        debug!(credential = ?prepared.credential, "dispatching");

        let custom_data = request.options_mut().custom_data.take();
        let call_context = request.options().auth_context.is_some();

        let transport = &self.inner.transport;
        let sent = match cancel {
            Some(token) => {
                tokio::select! {
                    biased;
                    _ = token.cancelled() => Err(TransportError::Cancelled),
                    res = transport.post(prepared.request) => res,
                }
            }
            None => transport.post(prepared.request).await,
        };

        let outcome = match sent {
            Ok(response) => {
                Span::current().record("http.status_code", response.status);
                self.parse_response::<R::Response>(R::PATH, response)
            }
            Err(err) => Err(ApiError::from_transport(R::PATH, &err)),
        };

        match outcome {
            Ok(result) => {
                Span::current().record("otel.status_code", "OK");
                if !call_context {
                    let cache = scope.credentials.as_ref().unwrap_or(&self.inner.credentials);
                    self.cache_credentials::<R>(&result, cache);
                }
                Ok(ApiResult::success(result, custom_data))
            }
            Err(error) => {
                Span::current().record("otel.status_code", "ERROR");
                warn!(error = %error, http_code = error.http_code, "call failed");
                self.notify(&error);
                Ok(ApiResult::failure(error, custom_data))
            }
        }
    }

    fn cache_credentials<R: ApiRequest>(&self, result: &R::Response, cache: &CredentialStore) {
        if let Some(update) = R::credential_update(result) {
            if !update.is_empty() {
                cache.apply(&update);
                debug!(
                    session_ticket = update.session_ticket.is_some(),
                    entity_token = update.entity_token.is_some(),
                    "cached credentials"
                );
            }
        }
    }

    fn notify(&self, error: &ApiError) {
        if let Some(handler) = &self.inner.error_handler {
            handler(error);
        }
    }
}

impl fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiClient")
            .field("settings", &self.inner.settings)
            .field("credentials", &self.inner.credentials)
            .field("error_handler", &self.inner.error_handler.is_some())
            .finish_non_exhaustive()
    }
}
