//! Dispatch behavior checked against a scripted in-memory transport.
//!
//! # Design
//! `Scripted` answers every call with the same canned reply and records the
//! `HttpRequest`s it saw, so each test can assert both on what reached the
//! wire (or that nothing did) and on the `ApiResult` that came back.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use pretty_assertions::assert_eq;
use serde_json::json;

use playfab_core::api::{authentication, client as client_api, server, AuthenticationApi, ClientApi, MultiplayerApi, ServerApi};
use playfab_core::{
    ApiClient, ApiError, ApiRequest, AuthContext, AuthPolicy, CancellationToken, ConfigError, HttpRequest,
    HttpResponse, JsonSerializer, Settings, Transport, TransportError,
};

const AUTH_HEADERS: [&str; 3] = ["X-Authorization", "X-SecretKey", "X-EntityToken"];

type Sent = Arc<Mutex<Vec<HttpRequest>>>;

struct Scripted {
    reply: Result<HttpResponse, TransportError>,
    sent: Sent,
}

#[async_trait]
impl Transport for Scripted {
    async fn post(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        self.sent.lock().unwrap().push(request);
        self.reply.clone()
    }
}

/// Never answers; only cancellation gets a call out of it.
struct Stalled;

#[async_trait]
impl Transport for Stalled {
    async fn post(&self, _request: HttpRequest) -> Result<HttpResponse, TransportError> {
        std::future::pending().await
    }
}

fn reply(status: u16, body: serde_json::Value) -> Result<HttpResponse, TransportError> {
    Ok(HttpResponse {
        status,
        headers: Vec::new(),
        body: body.to_string(),
    })
}

fn ok_reply(data: serde_json::Value) -> Result<HttpResponse, TransportError> {
    reply(200, json!({"code": 200, "status": "OK", "data": data}))
}

fn error_reply() -> Result<HttpResponse, TransportError> {
    reply(
        400,
        json!({
            "code": 400,
            "status": "BadRequest",
            "error": "AccountNotFound",
            "errorCode": 1001,
            "errorMessage": "User not found",
        }),
    )
}

fn settings() -> Settings {
    Settings::new("T1").with_endpoint("http://backend.test")
}

fn client_with(settings: Settings, reply: Result<HttpResponse, TransportError>) -> (ApiClient, Sent) {
    let sent = Sent::default();
    let client = ApiClient::builder(settings)
        .serializer(JsonSerializer)
        .transport(Scripted {
            reply,
            sent: sent.clone(),
        })
        .build()
        .unwrap();
    (client, sent)
}

fn auth_headers_of(request: &HttpRequest) -> Vec<(&str, &str)> {
    request
        .headers
        .iter()
        .filter(|(name, _)| AUTH_HEADERS.contains(&name.as_str()))
        .map(|(name, value)| (name.as_str(), value.as_str()))
        .collect()
}

// ---------------------------------------------------------------------------
// Missing configuration
// ---------------------------------------------------------------------------

#[tokio::test]
async fn server_call_without_secret_key_never_reaches_transport() {
    let (client, sent) = client_with(settings(), ok_reply(json!({})));
    let err = ServerApi::new(&client)
        .get_user_data(server::GetUserDataRequest {
            play_fab_id: "P1".to_string(),
            ..Default::default()
        })
        .await
        .unwrap_err();

    assert_eq!(
        err,
        ConfigError::MissingCredential {
            path: "/Server/GetUserData",
            policy: AuthPolicy::SecretKey,
        }
    );
    assert_eq!(sent.lock().unwrap().len(), 0);
}

#[tokio::test]
async fn every_policy_without_credential_is_rejected_before_io() {
    let (client, sent) = client_with(settings(), ok_reply(json!({})));

    let err = ClientApi::new(&client)
        .get_title_data(client_api::GetTitleDataRequest::default())
        .await
        .unwrap_err();
    assert!(matches!(err, ConfigError::MissingCredential { policy: AuthPolicy::SessionTicket, .. }));

    let err = MultiplayerApi::new(&client)
        .cancel_matchmaking_ticket(Default::default())
        .await
        .unwrap_err();
    assert!(matches!(err, ConfigError::MissingCredential { policy: AuthPolicy::EntityToken, .. }));

    let err = AuthenticationApi::new(&client)
        .get_entity_token(authentication::GetEntityTokenRequest::default())
        .await
        .unwrap_err();
    assert!(matches!(err, ConfigError::MissingCredential { policy: AuthPolicy::EntityExchange, .. }));

    assert_eq!(sent.lock().unwrap().len(), 0);
}

#[tokio::test]
async fn empty_credential_counts_as_missing() {
    let (client, sent) = client_with(settings().with_developer_secret_key(""), ok_reply(json!({})));
    let result = ServerApi::new(&client)
        .get_title_data(server::GetTitleDataRequest::default())
        .await;
    assert!(result.is_err());
    assert_eq!(sent.lock().unwrap().len(), 0);
}

#[tokio::test]
async fn login_without_title_id_is_rejected() {
    let (client, sent) = client_with(Settings::default().with_endpoint("http://backend.test"), ok_reply(json!({})));
    let err = ClientApi::new(&client)
        .login_with_custom_id(client_api::LoginWithCustomIdRequest {
            custom_id: "c1".to_string(),
            ..Default::default()
        })
        .await
        .unwrap_err();
    assert_eq!(err, ConfigError::MissingTitleId);
    assert_eq!(sent.lock().unwrap().len(), 0);
}

#[tokio::test]
async fn blank_title_id_is_rejected_before_io() {
    let (client, sent) = client_with(Settings::new("").with_developer_secret_key("key"), ok_reply(json!({})));
    let err = ServerApi::new(&client)
        .get_title_data(server::GetTitleDataRequest::default())
        .await
        .unwrap_err();
    assert_eq!(err, ConfigError::MissingTitleId);

    let err = ClientApi::new(&client)
        .login_with_custom_id(client_api::LoginWithCustomIdRequest {
            custom_id: "c1".to_string(),
            ..Default::default()
        })
        .await
        .unwrap_err();
    assert_eq!(err, ConfigError::MissingTitleId);
    assert_eq!(sent.lock().unwrap().len(), 0);
}

#[tokio::test]
async fn blank_title_id_is_not_filled_into_login_body() {
    let (client, sent) = client_with(Settings::new(" ").with_endpoint("http://backend.test"), ok_reply(json!({})));
    let err = ClientApi::new(&client)
        .login_with_custom_id(client_api::LoginWithCustomIdRequest {
            custom_id: "c1".to_string(),
            ..Default::default()
        })
        .await
        .unwrap_err();
    assert_eq!(err, ConfigError::MissingTitleId);
    assert_eq!(sent.lock().unwrap().len(), 0);
}

// ---------------------------------------------------------------------------
// Envelopes
// ---------------------------------------------------------------------------

#[tokio::test]
async fn success_result_is_the_data_payload() {
    let (client, _) = client_with(
        settings().with_developer_secret_key("key"),
        ok_reply(json!({"Data": {"motd": "hello"}})),
    );
    let result = ServerApi::new(&client)
        .get_title_data(server::GetTitleDataRequest::default())
        .await
        .unwrap();

    assert!(result.is_success());
    assert!(result.error().is_none());
    let expected = BTreeMap::from([("motd".to_string(), "hello".to_string())]);
    assert_eq!(result.result().unwrap().data, expected);
}

#[tokio::test]
async fn failure_result_is_the_error_envelope() {
    let (client, _) = client_with(settings().with_developer_secret_key("key"), error_reply());
    let result = ServerApi::new(&client)
        .get_user_data(server::GetUserDataRequest {
            play_fab_id: "P1".to_string(),
            ..Default::default()
        })
        .await
        .unwrap();

    assert!(result.result().is_none());
    let error = result.error().unwrap();
    assert_eq!(error.api_endpoint, "/Server/GetUserData");
    assert_eq!(error.http_code, 400);
    assert_eq!(error.http_status, "BadRequest");
    assert_eq!(error.error, "AccountNotFound");
    assert_eq!(error.error_code, 1001);
    assert_eq!(error.error_message, "User not found");
}

#[tokio::test]
async fn malformed_success_body_is_json_parse_error() {
    let (client, _) = client_with(
        settings().with_developer_secret_key("key"),
        reply(200, json!({"unexpected": true})),
    );
    let result = ServerApi::new(&client)
        .get_title_data(server::GetTitleDataRequest::default())
        .await
        .unwrap();
    let error = result.error().unwrap();
    assert_eq!(error.error_code, ApiError::JSON_PARSE_ERROR);
    assert_eq!(error.http_code, 200);
}

#[tokio::test]
async fn unstructured_failure_is_service_unavailable() {
    let (client, _) = client_with(
        settings().with_developer_secret_key("key"),
        Ok(HttpResponse {
            status: 503,
            headers: Vec::new(),
            body: "upstream down".to_string(),
        }),
    );
    let result = ServerApi::new(&client)
        .get_title_data(server::GetTitleDataRequest::default())
        .await
        .unwrap();
    let error = result.error().unwrap();
    assert_eq!(error.error_code, ApiError::SERVICE_UNAVAILABLE);
    assert_eq!(error.http_code, 503);
    assert_eq!(error.error_message, "upstream down");
    assert!(error.is_retryable());
}

#[tokio::test]
async fn transport_failure_is_connection_error() {
    let (client, _) = client_with(
        settings().with_developer_secret_key("key"),
        Err(TransportError::Connection("refused".to_string())),
    );
    let result = ServerApi::new(&client)
        .get_title_data(server::GetTitleDataRequest::default())
        .await
        .unwrap();
    let error = result.error().unwrap();
    assert_eq!(error.error_code, ApiError::CONNECTION_ERROR);
    assert_eq!(error.http_code, 0);
}

#[tokio::test]
async fn custom_data_passes_through_both_paths() {
    let marker = json!({"attempt": 3, "tag": ["a", "b"]});

    let (client, sent) = client_with(settings().with_developer_secret_key("key"), ok_reply(json!({"Data": {}})));
    let request = server::GetTitleDataRequest::default().with_custom_data(marker.clone());
    let result = ServerApi::new(&client).get_title_data(request).await.unwrap();
    assert!(result.is_success());
    assert_eq!(result.custom_data, Some(marker.clone()));
    let body: serde_json::Value = serde_json::from_str(&sent.lock().unwrap()[0].body).unwrap();
    assert_eq!(body, json!({}));

    let (client, _) = client_with(settings().with_developer_secret_key("key"), error_reply());
    let request = server::GetTitleDataRequest::default().with_custom_data(marker.clone());
    let result = ServerApi::new(&client).get_title_data(request).await.unwrap();
    assert!(!result.is_success());
    assert_eq!(result.custom_data, Some(marker));
}

#[tokio::test]
async fn same_request_twice_gives_equal_results() {
    let (client, sent) = client_with(
        settings().with_developer_secret_key("key"),
        ok_reply(json!({"Data": {"motd": "hello"}})),
    );
    let api = ServerApi::new(&client);
    let request = server::GetTitleDataRequest {
        keys: Some(vec!["motd".to_string()]),
        ..Default::default()
    }
    .with_custom_data(json!("same"));

    let first = api.get_title_data(request.clone()).await.unwrap();
    let second = api.get_title_data(request).await.unwrap();
    assert_eq!(first, second);

    let sent = sent.lock().unwrap();
    assert_eq!(sent.len(), 2);
    assert_eq!(sent[0], sent[1]);
}

// ---------------------------------------------------------------------------
// Headers
// ---------------------------------------------------------------------------

#[tokio::test]
async fn exactly_one_auth_header_per_policy() {
    let context = AuthContext::default()
        .with_session_ticket("ticket")
        .with_entity_token("entity");
    let sent = Sent::default();
    let client = ApiClient::builder(settings().with_developer_secret_key("key"))
        .serializer(JsonSerializer)
        .transport(Scripted {
            reply: ok_reply(json!({})),
            sent: sent.clone(),
        })
        .auth_context(context)
        .build()
        .unwrap();

    let _ = ClientApi::new(&client).get_title_data(Default::default()).await.unwrap();
    let _ = ServerApi::new(&client).get_title_data(Default::default()).await.unwrap();
    let _ = MultiplayerApi::new(&client).cancel_matchmaking_ticket(Default::default()).await.unwrap();
    let _ = AuthenticationApi::new(&client).get_entity_token(Default::default()).await.unwrap();
    let _ = ClientApi::new(&client)
        .login_with_custom_id(client_api::LoginWithCustomIdRequest {
            custom_id: "c1".to_string(),
            ..Default::default()
        })
        .await
        .unwrap();

    let sent = sent.lock().unwrap();
    let seen: Vec<Vec<(&str, &str)>> = sent.iter().map(auth_headers_of).collect();
    assert_eq!(
        seen,
        vec![
            vec![("X-Authorization", "ticket")],
            vec![("X-SecretKey", "key")],
            vec![("X-EntityToken", "entity")],
            vec![("X-EntityToken", "entity")],
            vec![],
        ]
    );
}

#[tokio::test]
async fn standard_headers_and_extras_are_sent() {
    let (client, sent) = client_with(
        settings()
            .with_developer_secret_key("key")
            .with_request_header("X-Region", "eu"),
        ok_reply(json!({})),
    );
    let request = server::GetTitleDataRequest::default()
        .with_header("X-Trace", "t-1")
        .with_header("X-SecretKey", "smuggled");
    let _ = ServerApi::new(&client).get_title_data(request).await.unwrap();

    let sent = sent.lock().unwrap();
    let request = &sent[0];
    assert_eq!(request.url, "http://backend.test/Server/GetTitleData");
    assert_eq!(request.header("content-type"), Some("application/json"));
    assert!(request.header("X-PlayFabSDK").unwrap().starts_with("RustSdk-"));
    assert_eq!(request.header("X-Region"), Some("eu"));
    assert_eq!(request.header("X-Trace"), Some("t-1"));
    assert_eq!(auth_headers_of(request), vec![("X-SecretKey", "key")]);
}

#[tokio::test]
async fn call_header_replaces_settings_header_of_same_name() {
    let (client, sent) = client_with(
        settings()
            .with_developer_secret_key("key")
            .with_request_header("X-Region", "settings"),
        ok_reply(json!({})),
    );
    let request = server::GetTitleDataRequest::default().with_header("x-region", "call");
    let _ = ServerApi::new(&client).get_title_data(request).await.unwrap();

    let sent = sent.lock().unwrap();
    let regions: Vec<(&str, &str)> = sent[0]
        .headers
        .iter()
        .filter(|(name, _)| name.eq_ignore_ascii_case("X-Region"))
        .map(|(name, value)| (name.as_str(), value.as_str()))
        .collect();
    assert_eq!(regions, vec![("x-region", "call")]);
    assert_eq!(sent[0].header("X-Region"), Some("call"));
}

#[tokio::test]
async fn clients_can_share_one_transport() {
    let sent = Sent::default();
    let transport: Arc<dyn Transport> = Arc::new(Scripted {
        reply: ok_reply(json!({})),
        sent: sent.clone(),
    });
    let build = |title: &str| {
        ApiClient::builder(Settings::new(title).with_developer_secret_key("key"))
            .serializer(JsonSerializer)
            .shared_transport(transport.clone())
            .build()
            .unwrap()
    };
    let (first, second) = (build("A1"), build("B2"));

    let _ = ServerApi::new(&first).get_title_data(Default::default()).await.unwrap();
    let _ = ServerApi::new(&second).get_title_data(Default::default()).await.unwrap();

    let urls: Vec<String> = sent.lock().unwrap().iter().map(|r| r.url.clone()).collect();
    assert_eq!(
        urls,
        vec![
            "https://a1.playfabapi.com/Server/GetTitleData".to_string(),
            "https://b2.playfabapi.com/Server/GetTitleData".to_string(),
        ]
    );
}

// ---------------------------------------------------------------------------
// Credential cache-fill
// ---------------------------------------------------------------------------

#[tokio::test]
async fn secret_key_exchange_fills_process_entity_token() {
    let (client, sent) = client_with(
        settings().with_developer_secret_key("key"),
        ok_reply(json!({"EntityToken": "abc123"})),
    );
    assert!(client.credentials().snapshot().entity_token.is_none());

    let result = AuthenticationApi::new(&client)
        .get_entity_token(authentication::GetEntityTokenRequest::default())
        .await
        .unwrap();

    assert_eq!(auth_headers_of(&sent.lock().unwrap()[0]), vec![("X-SecretKey", "key")]);
    assert_eq!(result.result().unwrap().entity_token.as_deref(), Some("abc123"));
    assert_eq!(client.credentials().snapshot().entity_token.as_deref(), Some("abc123"));
}

#[tokio::test]
async fn failed_exchange_leaves_cache_untouched() {
    let (client, _) = client_with(settings().with_developer_secret_key("key"), error_reply());
    let result = AuthenticationApi::new(&client)
        .get_entity_token(Default::default())
        .await
        .unwrap();
    assert!(!result.is_success());
    assert!(client.credentials().snapshot().entity_token.is_none());
}

#[tokio::test]
async fn login_fills_title_id_and_caches_session() {
    let (client, sent) = client_with(
        settings(),
        ok_reply(json!({
            "PlayFabId": "P1",
            "SessionTicket": "ticket-1",
            "NewlyCreated": true,
            "EntityToken": {
                "Entity": {"Id": "E1", "Type": "title_player_account"},
                "EntityToken": "entity-1",
            },
        })),
    );
    let api = ClientApi::new(&client);
    assert!(!api.is_client_logged_in());

    let result = api
        .login_with_custom_id(client_api::LoginWithCustomIdRequest {
            custom_id: "c1".to_string(),
            create_account: Some(true),
            ..Default::default()
        })
        .await
        .unwrap();
    assert!(result.result().unwrap().newly_created);

    let body: serde_json::Value = serde_json::from_str(&sent.lock().unwrap()[0].body).unwrap();
    assert_eq!(body, json!({"CustomId": "c1", "CreateAccount": true, "TitleId": "T1"}));

    let cached = client.credentials().snapshot();
    assert_eq!(cached.player_id.as_deref(), Some("P1"));
    assert_eq!(cached.session_ticket.as_deref(), Some("ticket-1"));
    assert_eq!(cached.entity_token.as_deref(), Some("entity-1"));
    assert!(api.is_client_logged_in());
    assert!(AuthenticationApi::new(&client).is_entity_logged_in());

    client.forget_all_credentials();
    assert!(!api.is_client_logged_in());
}

#[tokio::test]
async fn call_context_overrides_and_is_not_cached() {
    let (client, sent) = client_with(
        settings().with_developer_secret_key("key"),
        ok_reply(json!({"EntityToken": "fresh"})),
    );
    let request = authentication::GetEntityTokenRequest::default()
        .with_auth_context(AuthContext::default().with_session_ticket("per-call"));
    let result = AuthenticationApi::new(&client).get_entity_token(request).await.unwrap();

    assert!(result.is_success());
    assert_eq!(
        auth_headers_of(&sent.lock().unwrap()[0]),
        vec![("X-Authorization", "per-call")]
    );
    assert!(client.credentials().snapshot().entity_token.is_none());
}

#[tokio::test]
async fn instance_context_is_filled_instead_of_process() {
    let (client, sent) = client_with(settings(), ok_reply(json!({"EntityToken": "instance-token"})));
    let api = AuthenticationApi::new(&client).with_auth_context(AuthContext::default().with_session_ticket("mine"));

    let _ = api.get_entity_token(Default::default()).await.unwrap();

    assert_eq!(auth_headers_of(&sent.lock().unwrap()[0]), vec![("X-Authorization", "mine")]);
    assert_eq!(api.credentials().snapshot().entity_token.as_deref(), Some("instance-token"));
    assert!(api.is_entity_logged_in());
    assert!(client.credentials().snapshot().entity_token.is_none());
}

// ---------------------------------------------------------------------------
// Settings layers
// ---------------------------------------------------------------------------

#[tokio::test]
async fn instance_settings_replace_process_settings() {
    let (client, sent) = client_with(Settings::default(), ok_reply(json!({"Data": {}})));
    let api = ServerApi::new(&client).with_settings(
        Settings::new("T2")
            .with_developer_secret_key("instance-key")
            .with_endpoint("http://instance.test/"),
    );
    let _ = api.get_title_data(Default::default()).await.unwrap();

    let sent = sent.lock().unwrap();
    assert_eq!(sent[0].url, "http://instance.test/Server/GetTitleData");
    assert_eq!(sent[0].header("X-SecretKey"), Some("instance-key"));
}

#[tokio::test]
async fn call_settings_replace_instance_settings() {
    let (client, sent) = client_with(settings().with_developer_secret_key("process-key"), ok_reply(json!({"Data": {}})));
    let api = ServerApi::new(&client).with_settings(settings().with_developer_secret_key("instance-key"));
    let request = server::GetTitleDataRequest::default()
        .with_settings(Settings::new("T3").with_developer_secret_key("call-key"));
    let _ = api.get_title_data(request).await.unwrap();

    let sent = sent.lock().unwrap();
    assert_eq!(sent[0].url, "https://t3.playfabapi.com/Server/GetTitleData");
    assert_eq!(sent[0].header("X-SecretKey"), Some("call-key"));
}

// ---------------------------------------------------------------------------
// Error handler and cancellation
// ---------------------------------------------------------------------------

#[tokio::test]
async fn error_handler_sees_each_failure_once() {
    let seen: Arc<Mutex<Vec<ApiError>>> = Arc::default();
    let sink = seen.clone();
    let client = ApiClient::builder(settings().with_developer_secret_key("key"))
        .serializer(JsonSerializer)
        .transport(Scripted {
            reply: error_reply(),
            sent: Sent::default(),
        })
        .error_handler(move |err| sink.lock().unwrap().push(err.clone()))
        .build()
        .unwrap();

    let result = ServerApi::new(&client)
        .get_title_data(Default::default())
        .await
        .unwrap();

    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 1);
    assert_eq!(result.error(), Some(&seen[0]));
}

#[tokio::test]
async fn error_handler_is_silent_on_success_and_config_errors() {
    let calls = Arc::new(Mutex::new(0usize));
    let counter = calls.clone();
    let client = ApiClient::builder(settings())
        .serializer(JsonSerializer)
        .transport(Scripted {
            reply: ok_reply(json!({"Data": {}})),
            sent: Sent::default(),
        })
        .error_handler(move |_| *counter.lock().unwrap() += 1)
        .build()
        .unwrap();

    assert!(ServerApi::new(&client).get_title_data(Default::default()).await.is_err());
    let ok = ServerApi::new(&client)
        .with_settings(settings().with_developer_secret_key("key"))
        .get_title_data(Default::default())
        .await
        .unwrap();
    assert!(ok.is_success());
    assert_eq!(*calls.lock().unwrap(), 0);
}

#[tokio::test]
async fn cancelled_call_returns_connection_error() {
    let client = ApiClient::builder(settings().with_developer_secret_key("key"))
        .serializer(JsonSerializer)
        .transport(Stalled)
        .build()
        .unwrap();
    let token = CancellationToken::new();
    token.cancel();

    let result = client
        .execute_with_cancel(server::GetTitleDataRequest::default(), &token)
        .await
        .unwrap();
    let error = result.error().unwrap();
    assert_eq!(error.error_code, ApiError::CONNECTION_ERROR);
    assert_eq!(error.error_message, "request cancelled");
}

#[tokio::test]
async fn concurrent_exchanges_leave_one_complete_token() {
    let (client, sent) = client_with(
        settings().with_developer_secret_key("key"),
        ok_reply(json!({"EntityToken": "t", "Entity": {"Id": "E", "Type": "title"}})),
    );
    let api = AuthenticationApi::new(&client);
    let (a, b) = tokio::join!(
        api.get_entity_token(Default::default()),
        api.get_entity_token(Default::default()),
    );
    assert!(a.unwrap().is_success() && b.unwrap().is_success());
    assert_eq!(sent.lock().unwrap().len(), 2);

    let cached = client.credentials().snapshot();
    assert_eq!(cached.entity_token.as_deref(), Some("t"));
    assert_eq!(cached.entity.as_ref().map(|e| e.id.as_str()), Some("E"));
}
