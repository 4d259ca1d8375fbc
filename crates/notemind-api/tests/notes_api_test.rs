//! Notes REST API over HTTP.

mod common;

use reqwest::StatusCode;
use serde_json::{json, Value};

use common::TestServer;
use notemind_core::NoteStore;
use notemind_inference::MockGenerationBackend;

#[tokio::test]
async fn test_health_is_public() {
    let server = TestServer::start(MockGenerationBackend::new()).await;

    let resp = server.client.get(server.url("/health")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(resp.headers().contains_key("x-request-id"));
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["status"], "healthy");
    assert!(body["version"].is_string());
}

#[tokio::test]
async fn test_notes_require_session() {
    let server = TestServer::start(MockGenerationBackend::new()).await;

    let missing = server.client.get(server.url("/api/notes")).send().await.unwrap();
    assert_eq!(missing.status(), StatusCode::UNAUTHORIZED);

    let bogus = server
        .client
        .get(server.url("/api/notes"))
        .bearer_auth("nm_st_not-a-session")
        .send()
        .await
        .unwrap();
    assert_eq!(bogus.status(), StatusCode::UNAUTHORIZED);
    let body: Value = bogus.json().await.unwrap();
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_expired_session_is_rejected() {
    let server = TestServer::start(MockGenerationBackend::new()).await;
    let (user_id, _) = server.sign_in("alice").await;
    server
        .accounts
        .insert_session(
            "nm_st_expired",
            user_id,
            chrono::Utc::now() - chrono::Duration::minutes(1),
        )
        .await;

    let resp = server
        .client
        .get(server.url("/api/notes"))
        .bearer_auth("nm_st_expired")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_note_lifecycle() {
    let server = TestServer::start(MockGenerationBackend::new()).await;
    let (_, token) = server.sign_in("alice").await;

    let resp = server
        .client
        .post(server.url("/api/notes"))
        .bearer_auth(&token)
        .json(&json!({
            "title": "  Groceries ",
            "content": "<p>milk</p>",
            "tags": ["home", " home", "", "errands"]
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    let created: Value = resp.json().await.unwrap();
    let id = created["id"].as_i64().unwrap();
    assert_eq!(created["title"], "Groceries");
    assert_eq!(created["tags"], json!(["errands", "home"]));
    assert_eq!(created["pinned"], false);

    let resp = server
        .client
        .put(server.url(&format!("/api/notes/{}", id)))
        .bearer_auth(&token)
        .json(&json!({"content": "<p>milk, eggs</p>"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let updated: Value = resp.json().await.unwrap();
    assert_eq!(updated["title"], "Groceries");
    assert_eq!(updated["content"], "<p>milk, eggs</p>");

    let resp = server
        .client
        .patch(server.url(&format!("/api/notes/{}/pin", id)))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    let pinned: Value = resp.json().await.unwrap();
    assert_eq!(pinned["pinned"], true);

    let tags: Value = server
        .client
        .get(server.url("/api/notes/tags"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(tags.as_array().unwrap().len(), 2);

    let resp = server
        .client
        .delete(server.url(&format!("/api/notes/{}", id)))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let deleted: Value = resp.json().await.unwrap();
    assert_eq!(deleted["note"]["id"], id);
    assert!(deleted["message"].is_string());

    let list: Value = server
        .client
        .get(server.url("/api/notes"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(list, json!([]));
}

#[tokio::test]
async fn test_create_without_title_is_bad_request() {
    let server = TestServer::start(MockGenerationBackend::new()).await;
    let (user_id, token) = server.sign_in("alice").await;

    for body in [json!({"content": "no title"}), json!({"title": "   "})] {
        let resp = server
            .client
            .post(server.url("/api/notes"))
            .bearer_auth(&token)
            .json(&body)
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }
    assert!(server.notes.list_notes(user_id).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_other_users_notes_are_not_found() {
    let server = TestServer::start(MockGenerationBackend::new()).await;
    let (bob_id, _) = server.sign_in("bob").await;
    let (_, alice_token) = server.sign_in("alice").await;
    let bobs = server
        .notes
        .seed(bob_id, "Bob's diary", &[], false, chrono::Utc::now())
        .await;

    let update = server
        .client
        .put(server.url(&format!("/api/notes/{}", bobs.id)))
        .bearer_auth(&alice_token)
        .json(&json!({"title": "mine now"}))
        .send()
        .await
        .unwrap();
    assert_eq!(update.status(), StatusCode::NOT_FOUND);

    let pin = server
        .client
        .patch(server.url(&format!("/api/notes/{}/pin", bobs.id)))
        .bearer_auth(&alice_token)
        .send()
        .await
        .unwrap();
    assert_eq!(pin.status(), StatusCode::NOT_FOUND);

    let delete = server
        .client
        .delete(server.url(&format!("/api/notes/{}", bobs.id)))
        .bearer_auth(&alice_token)
        .send()
        .await
        .unwrap();
    assert_eq!(delete.status(), StatusCode::NOT_FOUND);

    let list: Value = server
        .client
        .get(server.url("/api/notes"))
        .bearer_auth(&alice_token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(list, json!([]));
    assert_eq!(server.notes.delete_count(), 0);
}

#[tokio::test]
async fn test_rate_limit_rejects_excess_requests() {
    let mut config = common::test_config();
    config.rate_limit.enabled = true;
    config.rate_limit.requests = 2;
    config.rate_limit.period_secs = 3600;
    let server = TestServer::start_with(MockGenerationBackend::new(), config).await;

    for _ in 0..2 {
        let resp = server.client.get(server.url("/health")).send().await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }
    let resp = server.client.get(server.url("/health")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::TOO_MANY_REQUESTS);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"], "rate_limit_exceeded");
}
