//! Provider Proxy Tests
//!
//! Exercises the protected API routes against a mocked provider REST API.

use std::net::SocketAddr;

use axum::{
    Router,
    body::{Body, to_bytes},
    Extension,
    extract::ConnectInfo,
    http::{Request, StatusCode},
};
use serde_json::{Value, json};
use tower::util::ServiceExt;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use callroute_gateway::{
    AccessTokenClaims, ServerConfig,
    config::AuthApiSecret,
    routes,
    state::AppState,
};

fn create_test_config(base_url: &str) -> ServerConfig {
    let mut config = ServerConfig::default();
    config.host = "127.0.0.1".to_string();
    config.twilio.account_sid = Some("AC123".to_string());
    config.twilio.auth_token = Some("auth-token".to_string());
    config.twilio.api_key = Some("SK123".to_string());
    config.twilio.api_secret = Some("api-secret".to_string());
    config.twilio.phone_number = Some("+15550001111".to_string());
    config.twilio.twiml_app_sid = Some("AP123".to_string());
    config.twilio.api_base_url = base_url.to_string();
    config
}

/// Router with a fixed peer address, as `into_make_service_with_connect_info` provides
async fn app_for(config: ServerConfig) -> Router {
    routes::create_router(AppState::new(config).await)
        .layer(Extension(ConnectInfo(SocketAddr::from(([127, 0, 0, 1], 40000)))))
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

fn json_post(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

// =============================================================================
// Outbound calls
// =============================================================================

#[tokio::test]
async fn test_place_call_success() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/2010-04-01/Accounts/AC123/Calls.json"))
        .and(body_string_contains("To=%2B15551234567"))
        .and(body_string_contains("From=%2B15550001111"))
        .and(body_string_contains("callerId"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"sid": "CA42"})))
        .expect(1)
        .mount(&server)
        .await;

    let app = app_for(create_test_config(&server.uri())).await;
    let (status, body) = send(
        app,
        json_post("/api/voice", json!({"phoneNumber": "+15551234567"})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"success": true, "callSid": "CA42"}));
}

#[tokio::test]
async fn test_place_call_provider_error_message_is_returned() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/2010-04-01/Accounts/AC123/Calls.json"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "code": 21211,
            "message": "The 'To' number is not a valid phone number.",
        })))
        .mount(&server)
        .await;

    let app = app_for(create_test_config(&server.uri())).await;
    let (status, body) = send(app, json_post("/api/voice", json!({"phoneNumber": "12"}))).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        body,
        json!({"success": false, "error": "The 'To' number is not a valid phone number."})
    );
}

#[tokio::test]
async fn test_place_call_requires_phone_number() {
    let server = MockServer::start().await;
    let app = app_for(create_test_config(&server.uri())).await;

    let (status, body) = send(app, json_post("/api/voice", json!({"phoneNumber": " "}))).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_place_call_without_credentials_fails() {
    let mut config = ServerConfig::default();
    config.twilio.phone_number = Some("+15550001111".to_string());
    let app = app_for(config).await;

    let (status, body) = send(
        app,
        json_post("/api/voice", json!({"phoneNumber": "+15551234567"})),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({"success": false, "error": "Failed to make call"}));
}

// =============================================================================
// Messages
// =============================================================================

#[tokio::test]
async fn test_send_message_success() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/2010-04-01/Accounts/AC123/Messages.json"))
        .and(body_string_contains("Body=hello+there"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"sid": "SM7"})))
        .expect(1)
        .mount(&server)
        .await;

    let app = app_for(create_test_config(&server.uri())).await;
    let (status, body) = send(
        app,
        json_post(
            "/api/message",
            json!({"to": "+15551234567", "message": "hello there"}),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"success": true, "messageSid": "SM7"}));
}

#[tokio::test]
async fn test_send_message_failure_is_opaque() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/2010-04-01/Accounts/AC123/Messages.json"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "message": "Attempt to send to unsubscribed recipient",
        })))
        .mount(&server)
        .await;

    let app = app_for(create_test_config(&server.uri())).await;
    let (status, body) = send(
        app,
        json_post("/api/message", json!({"to": "+15551234567", "message": "hi"})),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({"success": false, "error": "Failed to send message"}));
}

#[tokio::test]
async fn test_send_message_requires_fields() {
    let server = MockServer::start().await;
    let app = app_for(create_test_config(&server.uri())).await;

    let (status, _) = send(app, json_post("/api/message", json!({"to": "+1555"}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

// =============================================================================
// Access tokens
// =============================================================================

#[tokio::test]
async fn test_token_endpoint_issues_signed_token() {
    let app = app_for(create_test_config("http://127.0.0.1:9")).await;

    let request = Request::builder()
        .uri("/api/token")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(app, request).await;

    assert_eq!(status, StatusCode::OK);
    let token = body["token"].as_str().unwrap();

    let decoded = jsonwebtoken::decode::<AccessTokenClaims>(
        token,
        &jsonwebtoken::DecodingKey::from_secret(b"api-secret"),
        &jsonwebtoken::Validation::new(jsonwebtoken::Algorithm::HS256),
    )
    .unwrap();
    assert_eq!(decoded.claims.iss, "SK123");
    assert_eq!(decoded.claims.sub, "AC123");
    assert_eq!(decoded.claims.grants.identity, "user");
    assert_eq!(
        decoded
            .claims
            .grants
            .voice
            .outgoing
            .map(|grant| grant.application_sid),
        Some("AP123".to_string())
    );
}

#[tokio::test]
async fn test_token_endpoint_without_credentials() {
    let app = app_for(ServerConfig::default()).await;

    let request = Request::builder()
        .uri("/api/token")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(app, request).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({"error": "Failed to generate token"}));
}

// =============================================================================
// Authentication
// =============================================================================

fn with_auth(mut config: ServerConfig) -> ServerConfig {
    config.auth_required = true;
    config.auth_api_secrets = vec![AuthApiSecret {
        id: "client-a".to_string(),
        secret: "secret-a".to_string(),
    }];
    config
}

#[tokio::test]
async fn test_protected_routes_reject_missing_token() {
    let app = app_for(with_auth(create_test_config("http://127.0.0.1:9"))).await;

    let request = Request::builder()
        .uri("/api/token")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(app, request).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "missing_auth_header");
}

#[tokio::test]
async fn test_protected_routes_reject_wrong_token() {
    let app = app_for(with_auth(create_test_config("http://127.0.0.1:9"))).await;

    let request = Request::builder()
        .uri("/api/token")
        .header("authorization", "Bearer wrong")
        .body(Body::empty())
        .unwrap();
    let (status, _) = send(app, request).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_protected_routes_accept_valid_token() {
    let app = app_for(with_auth(create_test_config("http://127.0.0.1:9"))).await;

    let request = Request::builder()
        .uri("/api/token")
        .header("authorization", "Bearer secret-a")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(app, request).await;

    assert_eq!(status, StatusCode::OK);
    assert!(body["token"].is_string());
}

#[tokio::test]
async fn test_greeting_stays_public_when_auth_required() {
    let app = app_for(with_auth(create_test_config("http://127.0.0.1:9"))).await;

    let request = Request::builder()
        .uri("/api/voice")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

/// The protected API is rate limited per client IP
#[tokio::test]
async fn test_api_rate_limit_rejects_excess_requests() {
    let mut config = ServerConfig::default();
    config.rate_limit_requests_per_second = 1;
    config.rate_limit_burst_size = 1;
    let app = app_for(config).await;

    let token_request = || {
        Request::builder()
            .uri("/api/token")
            .header("x-forwarded-for", "203.0.113.7")
            .body(Body::empty())
            .unwrap()
    };

    let first = app.clone().oneshot(token_request()).await.unwrap();
    assert_ne!(first.status(), StatusCode::TOO_MANY_REQUESTS);

    let second = app.clone().oneshot(token_request()).await.unwrap();
    assert_eq!(second.status(), StatusCode::TOO_MANY_REQUESTS);

    // Another client still has its own quota
    let other = Request::builder()
        .uri("/api/token")
        .header("x-forwarded-for", "198.51.100.9")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(other).await.unwrap();
    assert_ne!(response.status(), StatusCode::TOO_MANY_REQUESTS);
}
