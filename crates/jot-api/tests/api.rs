//! End-to-end tests over the real router and an in-memory SQLite database.

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

use jot_api::token::TokenService;
use jot_api::{AppState, AppStateInner};
use jot_db::Database;

const TEST_SECRET: &str = "integration-test-secret";

fn test_app() -> (Router, AppState) {
    let state: AppState = Arc::new(AppStateInner {
        db: Database::open_in_memory().expect("in-memory db"),
        tokens: TokenService::new(TEST_SECRET),
    });
    (jot_api::router(state.clone()), state)
}

async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }

    let request = match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, value)
}

async fn signup(app: &Router, username: &str, email: &str, password: &str) -> (StatusCode, Value) {
    send(
        app,
        "POST",
        "/api/auth/signup",
        None,
        Some(json!({ "username": username, "email": email, "password": password })),
    )
    .await
}

async fn signup_token(app: &Router, username: &str, email: &str) -> String {
    let (status, body) = signup(app, username, email, "hunter2hunter2").await;
    assert_eq!(status, StatusCode::CREATED);
    body["token"].as_str().unwrap().to_string()
}

// -- Auth --

#[tokio::test]
async fn signup_then_login_yields_matching_identity() {
    let (app, _) = test_app();

    let (status, body) = signup(&app, "ada", "ada@example.com", "correcthorse").await;
    assert_eq!(status, StatusCode::CREATED);
    let registered_id = body["user_id"].as_str().unwrap().to_string();

    let (status, body) = send(
        &app,
        "POST",
        "/api/auth/login",
        None,
        Some(json!({ "email": "ada@example.com", "password": "correcthorse" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user_id"].as_str().unwrap(), registered_id);

    // The token encodes exactly the registered identity
    let verifier = TokenService::new(TEST_SECRET);
    let token_user = verifier.verify(body["token"].as_str().unwrap()).unwrap();
    assert_eq!(token_user.to_string(), registered_id);
}

#[tokio::test]
async fn wrong_password_and_unknown_email_are_indistinguishable() {
    let (app, _) = test_app();
    signup(&app, "ada", "ada@example.com", "correcthorse").await;

    let wrong_password = send(
        &app,
        "POST",
        "/api/auth/login",
        None,
        Some(json!({ "email": "ada@example.com", "password": "wrong-password" })),
    )
    .await;
    let unknown_email = send(
        &app,
        "POST",
        "/api/auth/login",
        None,
        Some(json!({ "email": "nobody@example.com", "password": "correcthorse" })),
    )
    .await;

    assert_eq!(wrong_password.0, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong_password, unknown_email);
}

#[tokio::test]
async fn duplicate_email_is_rejected() {
    let (app, _) = test_app();
    let (status, _) = signup(&app, "ada", "ada@example.com", "correcthorse").await;
    assert_eq!(status, StatusCode::CREATED);

    // Different username and password, same email
    let (status, body) = signup(&app, "someone-else", "ada@example.com", "otherpassword").await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["message"], "User already exists");
}

#[tokio::test]
async fn email_match_is_case_sensitive() {
    let (app, _) = test_app();
    signup(&app, "ada", "Ada@example.com", "correcthorse").await;

    // A different casing is a different email: signup succeeds, and logging
    // in with the original casing still works.
    let (status, _) = signup(&app, "ada2", "ada@example.com", "correcthorse").await;
    assert_eq!(status, StatusCode::CREATED);
}

#[tokio::test]
async fn short_password_is_rejected_before_storage() {
    let (app, _) = test_app();
    let (status, _) = signup(&app, "ada", "ada@example.com", "short").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

// -- Auth gate --

#[tokio::test]
async fn note_routes_reject_missing_and_malformed_tokens_alike() {
    let (app, _) = test_app();

    let missing = send(&app, "GET", "/api/notes", None, None).await;
    let garbage = send(&app, "GET", "/api/notes", Some("not.a.jwt"), None).await;

    assert_eq!(missing.0, StatusCode::UNAUTHORIZED);
    // Same status, same body — the reason is not disclosed
    assert_eq!(missing, garbage);
    assert_eq!(missing.1["message"], "Authorization denied");
}

#[tokio::test]
async fn expired_token_is_denied_like_any_other_bad_token() {
    use jot_types::api::Claims;

    let (app, _) = test_app();

    let now = chrono::Utc::now().timestamp();
    let claims = Claims {
        sub: uuid::Uuid::new_v4(),
        iat: (now - 7200) as usize,
        exp: (now - 3600) as usize,
    };
    let stale = jsonwebtoken::encode(
        &jsonwebtoken::Header::default(),
        &claims,
        &jsonwebtoken::EncodingKey::from_secret(TEST_SECRET.as_bytes()),
    )
    .unwrap();

    let (status, body) = send(&app, "GET", "/api/notes", Some(&stale), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Authorization denied");
}

#[tokio::test]
async fn token_signed_with_another_secret_is_denied() {
    let (app, _) = test_app();

    let forged = TokenService::new("attacker-secret")
        .issue(uuid::Uuid::new_v4())
        .unwrap();

    let (status, _) = send(&app, "POST", "/api/notes", Some(&forged), Some(json!({ "content": "x" }))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

// -- Notes --

#[tokio::test]
async fn create_derives_title_from_content() {
    let (app, _) = test_app();
    let token = signup_token(&app, "ada", "ada@example.com").await;

    let (status, note) = send(
        &app,
        "POST",
        "/api/notes",
        Some(&token),
        Some(json!({ "content": "Hello world" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(note["title"], "Hello world");
    assert_eq!(note["favorite"], false);

    let (_, note) = send(
        &app,
        "POST",
        "/api/notes",
        Some(&token),
        Some(json!({ "content": "" })),
    )
    .await;
    assert_eq!(note["title"], "Untitled");

    let (_, note) = send(
        &app,
        "POST",
        "/api/notes",
        Some(&token),
        Some(json!({ "content": "some dictated text", "title": "Groceries" })),
    )
    .await;
    assert_eq!(note["title"], "Groceries");
}

#[tokio::test]
async fn list_is_empty_then_ordered_oldest_first() {
    let (app, _) = test_app();
    let token = signup_token(&app, "ada", "ada@example.com").await;

    let (status, body) = send(&app, "GET", "/api/notes", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));

    let (_, first) = send(
        &app,
        "POST",
        "/api/notes",
        Some(&token),
        Some(json!({ "content": "first note" })),
    )
    .await;
    let (_, second) = send(
        &app,
        "POST",
        "/api/notes",
        Some(&token),
        Some(json!({ "content": "second note" })),
    )
    .await;

    let (_, listed) = send(&app, "GET", "/api/notes", Some(&token), None).await;
    let ids: Vec<&str> = listed
        .as_array()
        .unwrap()
        .iter()
        .map(|n| n["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec![first["id"].as_str().unwrap(), second["id"].as_str().unwrap()]);
}

#[tokio::test]
async fn update_changes_only_supplied_fields() {
    let (app, _) = test_app();
    let token = signup_token(&app, "ada", "ada@example.com").await;

    let (_, note) = send(
        &app,
        "POST",
        "/api/notes",
        Some(&token),
        Some(json!({ "content": "original content", "title": "Original" })),
    )
    .await;
    let id = note["id"].as_str().unwrap();

    let (status, updated) = send(
        &app,
        "PUT",
        &format!("/api/notes/{}", id),
        Some(&token),
        Some(json!({ "favorite": true })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["favorite"], true);
    assert_eq!(updated["title"], "Original");
    assert_eq!(updated["content"], "original content");

    let (_, renamed) = send(
        &app,
        "PUT",
        &format!("/api/notes/{}", id),
        Some(&token),
        Some(json!({ "title": "Renamed" })),
    )
    .await;
    assert_eq!(renamed["title"], "Renamed");
    assert_eq!(renamed["favorite"], true);
}

#[tokio::test]
async fn foreign_notes_are_not_found_for_other_users() {
    let (app, _) = test_app();
    let token_a = signup_token(&app, "ada", "ada@example.com").await;
    let token_b = signup_token(&app, "bob", "bob@example.com").await;

    let (_, note) = send(
        &app,
        "POST",
        "/api/notes",
        Some(&token_a),
        Some(json!({ "content": "ada's note" })),
    )
    .await;
    let id = note["id"].as_str().unwrap();

    // B probing A's note gets the same answer as probing a random id
    let (status, body) = send(
        &app,
        "PUT",
        &format!("/api/notes/{}", id),
        Some(&token_b),
        Some(json!({ "title": "hijacked" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Note not found");

    let (status, _) = send(
        &app,
        "DELETE",
        &format!("/api/notes/{}", id),
        Some(&token_b),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // The owner still succeeds
    let (status, _) = send(
        &app,
        "DELETE",
        &format!("/api/notes/{}", id),
        Some(&token_a),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn full_lifecycle_with_owner_scoping() {
    let (app, _) = test_app();
    let token_a = signup_token(&app, "ada", "ada@example.com").await;
    let token_b = signup_token(&app, "bob", "bob@example.com").await;

    let (_, keep) = send(
        &app,
        "POST",
        "/api/notes",
        Some(&token_a),
        Some(json!({ "content": "keep me" })),
    )
    .await;
    let (_, doomed) = send(
        &app,
        "POST",
        "/api/notes",
        Some(&token_a),
        Some(json!({ "content": "delete me" })),
    )
    .await;

    let (status, confirmation) = send(
        &app,
        "DELETE",
        &format!("/api/notes/{}", doomed["id"].as_str().unwrap()),
        Some(&token_a),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(confirmation["message"], "Note deleted");

    let (_, remaining) = send(&app, "GET", "/api/notes", Some(&token_a), None).await;
    let remaining = remaining.as_array().unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0]["id"], keep["id"]);

    // A's notes are invisible to B
    let (_, b_notes) = send(&app, "GET", "/api/notes", Some(&token_b), None).await;
    assert_eq!(b_notes, json!([]));
}
