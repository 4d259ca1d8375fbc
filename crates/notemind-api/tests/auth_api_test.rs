//! Google sign-in and session endpoints, with Google stubbed by wiremock.

mod common;

use reqwest::StatusCode;
use serde_json::{json, Value};
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use common::{test_config, TestServer};
use notemind_api::ServerConfig;
use notemind_inference::MockGenerationBackend;

async fn google_stub() -> MockServer {
    let google = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/token"))
        .and(body_string_contains("code=auth-code-1"))
        .and(body_string_contains("grant_type=authorization_code"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "google-access",
            "token_type": "Bearer",
            "expires_in": 3599
        })))
        .mount(&google)
        .await;
    Mock::given(method("GET"))
        .and(path("/userinfo"))
        .and(header("authorization", "Bearer google-access"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "sub": "google-42",
            "name": "Ada Lovelace",
            "email": "ada@example.com"
        })))
        .mount(&google)
        .await;
    google
}

fn oauth_config(google: &MockServer, frontend_url: &str) -> ServerConfig {
    let mut config = test_config();
    config.frontend_url = frontend_url.to_string();
    config.google.client_id = Some("client-123".to_string());
    config.google.client_secret = Some("secret".to_string());
    config.google.auth_url = format!("{}/auth", google.uri());
    config.google.token_url = format!("{}/token", google.uri());
    config.google.userinfo_url = format!("{}/userinfo", google.uri());
    config
}

/// Start the sign-in flow and return the `state` from the consent redirect.
async fn begin_sign_in(server: &TestServer) -> String {
    let resp = server
        .client
        .get(server.url("/auth/google"))
        .send()
        .await
        .unwrap();
    assert!(resp.status().is_redirection());
    let location = resp.headers()["location"].to_str().unwrap().to_string();
    assert!(location.contains("client_id=client-123"));
    location
        .split('&')
        .find_map(|kv| kv.strip_prefix("state="))
        .unwrap()
        .to_string()
}

#[tokio::test]
async fn test_sign_in_unavailable_without_client_credentials() {
    let server = TestServer::start(MockGenerationBackend::new()).await;

    let resp = server
        .client
        .get(server.url("/auth/google"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_callback_redirects_to_frontend_with_token() {
    let google = google_stub().await;
    let server = TestServer::start_with(
        MockGenerationBackend::new(),
        oauth_config(&google, "http://app.test"),
    )
    .await;

    let state = begin_sign_in(&server).await;
    let resp = server
        .client
        .get(server.url(&format!(
            "/auth/google/callback?code=auth-code-1&state={}",
            state
        )))
        .send()
        .await
        .unwrap();
    assert!(resp.status().is_redirection());
    let location = resp.headers()["location"].to_str().unwrap();
    let token = location
        .strip_prefix("http://app.test/auth/callback?token=")
        .unwrap()
        .to_string();

    let me: Value = server
        .client
        .get(server.url("/auth/me"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(me["user"]["displayName"], "Ada Lovelace");
    assert_eq!(me["user"]["email"], "ada@example.com");
}

#[tokio::test]
async fn test_callback_answers_json_without_frontend() {
    let google = google_stub().await;
    let server =
        TestServer::start_with(MockGenerationBackend::new(), oauth_config(&google, "")).await;

    let state = begin_sign_in(&server).await;
    let resp = server
        .client
        .get(server.url(&format!(
            "/auth/google/callback?code=auth-code-1&state={}",
            state
        )))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["user"]["googleId"], "google-42");
    assert!(body["token"].as_str().unwrap().len() > 10);
}

#[tokio::test]
async fn test_callback_rejects_unknown_state() {
    let google = google_stub().await;
    let server = TestServer::start_with(
        MockGenerationBackend::new(),
        oauth_config(&google, "http://app.test"),
    )
    .await;

    let resp = server
        .client
        .get(server.url("/auth/google/callback?code=auth-code-1&state=forged"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert!(google
        .received_requests()
        .await
        .unwrap()
        .iter()
        .all(|r| r.url.path() != "/token"));
}

#[tokio::test]
async fn test_rejected_code_is_unauthorized() {
    let google = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({"error": "invalid_grant"})))
        .mount(&google)
        .await;
    let server = TestServer::start_with(
        MockGenerationBackend::new(),
        oauth_config(&google, "http://app.test"),
    )
    .await;

    let state = begin_sign_in(&server).await;
    let resp = server
        .client
        .get(server.url(&format!(
            "/auth/google/callback?code=stale&state={}",
            state
        )))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_logout_revokes_session() {
    let server = TestServer::start(MockGenerationBackend::new()).await;
    let (_, token) = server.sign_in("alice").await;

    let resp = server
        .client
        .post(server.url("/auth/logout"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = server
        .client
        .get(server.url("/auth/me"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}
