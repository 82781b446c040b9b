//! End-to-end flows through the full router over in-memory backends.

mod support;

use axum::http::{Method, StatusCode};
use reetro_core::Role;
use reetro_storage::AuthoritativeStore;
use serde_json::json;
use support::{request, TestApp, TEST_PASSWORD};

// ============================================================================
// BASIC ROUTES
// ============================================================================

#[tokio::test]
async fn test_home_and_about_are_public() {
    let app = TestApp::new();

    let (status, body) = app.send(request(Method::GET, "/", None, None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["detail"], "Reetro Application Home Page");

    let (status, body) = app.send(request(Method::GET, "/about/", None, None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "reetro");
}

#[tokio::test]
async fn test_unknown_route_is_404_json() {
    let app = TestApp::new();
    let (status, body) = app.send(request(Method::GET, "/nope/", None, None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["detail"], "Not found");
}

// ============================================================================
// SIGNUP AND LOGIN
// ============================================================================

#[tokio::test]
async fn test_signup_creates_guest_and_caches_profile() {
    let app = TestApp::new();
    let (status, body) = app
        .send(request(
            Method::POST,
            "/signup/",
            None,
            Some(json!({
                "first_name": "Ada",
                "last_name": "Lovelace",
                "username": "ada",
                "email": "ada@example.com",
                "password": "engines",
                "user_type": "super_admin"
            })),
        ))
        .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["username"], "ada");
    assert_eq!(body["user_type"], "guest_user");
    assert!(body.get("password_hash").is_none());

    let id = body["id"].as_str().unwrap();
    assert!(app.cache.contains_key(id));
}

#[tokio::test]
async fn test_signup_validation_lists_fields() {
    let app = TestApp::new();
    let (status, body) = app
        .send(request(
            Method::POST,
            "/users/",
            None,
            Some(json!({ "username": "x", "email": "bad", "password": "123" })),
        ))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let fields: Vec<&str> = body["errors"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["field"].as_str().unwrap())
        .collect();
    assert!(fields.contains(&"email"));
    assert!(fields.contains(&"password"));
    assert!(fields.contains(&"first_name"));
}

#[tokio::test]
async fn test_duplicate_username_is_conflict() {
    let app = TestApp::new();
    app.seed_user("dup", Role::Guest).await;
    let (status, _) = app
        .send(request(
            Method::POST,
            "/signup/",
            None,
            Some(json!({
                "first_name": "D",
                "last_name": "Up",
                "username": "dup",
                "email": "other@example.com",
                "password": "secret1"
            })),
        ))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_login() {
    let app = TestApp::new();
    app.seed_user("kim", Role::Member).await;

    let (status, body) = app
        .send(request(
            Method::POST,
            "/login/",
            None,
            Some(json!({ "username": "nobody", "password": TEST_PASSWORD })),
        ))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["detail"], "Invalid Username");

    let (status, body) = app
        .send(request(
            Method::POST,
            "/login/",
            None,
            Some(json!({ "username": "kim", "password": "wrong-one" })),
        ))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["detail"], "Invalid Password");

    let (status, body) = app
        .send(request(
            Method::POST,
            "/login/",
            None,
            Some(json!({ "username": "kim", "password": TEST_PASSWORD })),
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
    let token = body["token"].as_str().unwrap();
    let claims = app.tokens.validate(token).unwrap();
    assert_eq!(claims.email, "kim@example.com");
}

#[tokio::test]
async fn test_malformed_login_body_is_400() {
    let app = TestApp::new();
    let req = axum::http::Request::builder()
        .method(Method::POST)
        .uri("/login/")
        .header("content-type", "application/json")
        .body(axum::body::Body::from("{oops"))
        .unwrap();
    let (status, body) = app.send(req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["detail"], "Invalid request body");
}

// ============================================================================
// USERS
// ============================================================================

#[tokio::test]
async fn test_user_list_is_admin_only() {
    let app = TestApp::new();
    let guest = app.seed_user("guest", Role::Guest).await;
    let admin = app.seed_user("root", Role::Admin).await;

    let (status, body) = app
        .send(request(Method::GET, "/users/", Some(&app.token_for(&guest)), None))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["detail"], "Unauthorized Access");

    let (status, body) = app
        .send(request(Method::GET, "/users/?limit=1", Some(&app.token_for(&admin)), None))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 1);
}

#[tokio::test]
async fn test_protected_route_without_token() {
    let app = TestApp::new();
    let (status, body) = app.send(request(Method::GET, "/users/", None, None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["detail"], "Empty Token");
}

#[tokio::test]
async fn test_get_user_reads_through_cache() {
    let app = TestApp::new();
    let user = app.seed_user("reader", Role::Member).await;
    let token = app.token_for(&user);
    let uri = format!("/users/{}/", user.id);

    let (status, body) = app.send(request(Method::GET, &uri, Some(&token), None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["username"], "reader");
    assert!(app.cache.contains_key(&user.id.to_string()));

    let (status, _) = app
        .send(request(Method::GET, "/users/not-a-uuid/", Some(&token), None))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_user_delete_self_or_admin() {
    let app = TestApp::new();
    let alice = app.seed_user("alice", Role::Member).await;
    let bob = app.seed_user("bob", Role::Member).await;

    let (status, _) = app
        .send(request(
            Method::DELETE,
            &format!("/users/{}/", bob.id),
            Some(&app.token_for(&alice)),
            None,
        ))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = app
        .send(request(
            Method::DELETE,
            &format!("/users/{}/", alice.id),
            Some(&app.token_for(&alice)),
            None,
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["detail"], "User deleted successfully");
    assert!(app.store.user_get(alice.id).await.unwrap().is_none());
}

// ============================================================================
// BOARDS
// ============================================================================

async fn create_board(app: &TestApp, token: &str, name: &str) -> serde_json::Value {
    let (status, body) = app
        .send(request(
            Method::POST,
            "/boards/",
            Some(token),
            Some(json!({ "name": name, "columns": ["went_well", "to_improve"] })),
        ))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    body
}

#[tokio::test]
async fn test_board_lifecycle() {
    let app = TestApp::new();
    let admin = app.seed_user("root", Role::Admin).await;
    let token = app.token_for(&admin);

    let board = create_board(&app, &token, "Sprint 1").await;
    assert_eq!(board["template"], "agile");
    assert_eq!(board["created_by"], "root");
    let uri = format!("/boards/{}/", board["id"].as_str().unwrap());

    let (status, body) = app
        .send(request(Method::PATCH, &uri, Some(&token), Some(json!({ "name": "Sprint 1b" }))))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "Sprint 1b");
    assert_eq!(body["columns"], json!(["went_well", "to_improve"]));

    let (status, body) = app.send(request(Method::GET, &uri, Some(&token), None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "Sprint 1b");

    let (status, _) = app.send(request(Method::DELETE, &uri, Some(&token), None)).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = app.send(request(Method::GET, &uri, Some(&token), None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["detail"], "Board not found");
}

#[tokio::test]
async fn test_board_writes_are_admin_only() {
    let app = TestApp::new();
    let member = app.seed_user("mem", Role::Member).await;
    let (status, body) = app
        .send(request(
            Method::POST,
            "/boards/",
            Some(&app.token_for(&member)),
            Some(json!({ "name": "Nope", "columns": ["action"] })),
        ))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["detail"], "Unauthorized to create board");
    assert_eq!(app.store.board_count(), 0);
}

#[tokio::test]
async fn test_board_patch_rejects_empty_columns() {
    let app = TestApp::new();
    let admin = app.seed_user("root", Role::Admin).await;
    let token = app.token_for(&admin);
    let board = create_board(&app, &token, "Cols").await;
    let uri = format!("/boards/{}/", board["id"].as_str().unwrap());

    let (status, body) = app
        .send(request(Method::PATCH, &uri, Some(&token), Some(json!({ "columns": [] }))))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["errors"][0]["field"], "columns");
}

#[tokio::test]
async fn test_store_side_edit_leaves_cached_board_stale() {
    let app = TestApp::new();
    let admin = app.seed_user("root", Role::Admin).await;
    let token = app.token_for(&admin);
    let created = create_board(&app, &token, "Original").await;
    let id: uuid::Uuid = created["id"].as_str().unwrap().parse().unwrap();

    let mut edited = app.store.board_get(id).await.unwrap().unwrap();
    edited.name = "Edited behind the cache".to_string();
    app.store.overwrite_board(edited).unwrap();

    let (_, body) = app
        .send(request(Method::GET, &format!("/boards/{}/", id), Some(&token), None))
        .await;
    assert_eq!(body["name"], "Original");
}

#[tokio::test]
async fn test_cache_outage_does_not_fail_requests() {
    let app = TestApp::new();
    let admin = app.seed_user("root", Role::Admin).await;
    let token = app.token_for(&admin);
    app.cache.set_failing(true);

    let board = create_board(&app, &token, "Offline cache").await;
    let uri = format!("/boards/{}/", board["id"].as_str().unwrap());
    let (status, body) = app.send(request(Method::GET, &uri, Some(&token), None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "Offline cache");

    let (status, _) = app.send(request(Method::DELETE, &uri, Some(&token), None)).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_board_list_paginates() {
    let app = TestApp::new();
    let admin = app.seed_user("root", Role::Admin).await;
    let token = app.token_for(&admin);
    for i in 0..3 {
        create_board(&app, &token, &format!("B{}", i)).await;
    }

    let (status, body) = app
        .send(request(Method::GET, "/boards/?page=2&limit=2", Some(&token), None))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 1);
    assert_eq!(body["result"].as_array().unwrap().len(), 1);
}

// ============================================================================
// FEEDBACK
// ============================================================================

#[tokio::test]
async fn test_feedback_flow() {
    let app = TestApp::new();
    let admin = app.seed_user("root", Role::Admin).await;
    let author = app.seed_user("author", Role::Member).await;
    let other = app.seed_user("other", Role::Member).await;
    let board = create_board(&app, &app.token_for(&admin), "Retro").await;
    let author_token = app.token_for(&author);

    let (status, _) = app
        .send(request(
            Method::POST,
            "/feedbacks/",
            Some(&author_token),
            Some(json!({ "message": "lost", "board_id": uuid::Uuid::new_v4() })),
        ))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = app
        .send(request(
            Method::POST,
            "/feedbacks/",
            Some(&author_token),
            Some(json!({ "message": "missing board" })),
        ))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["errors"][0]["field"], "board_id");

    let (status, feedback) = app
        .send(request(
            Method::POST,
            "/feedbacks/",
            Some(&author_token),
            Some(json!({ "message": "ship it", "board_id": board["id"] })),
        ))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(feedback["created_by"], "author");
    let uri = format!("/feedbacks/{}/", feedback["id"].as_str().unwrap());

    let (status, body) = app
        .send(request(
            Method::PATCH,
            &uri,
            Some(&author_token),
            Some(json!({ "message": "ship it now" })),
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "ship it now");
    assert_eq!(body["board_id"], board["id"]);

    let (status, body) = app
        .send(request(Method::DELETE, &uri, Some(&app.token_for(&other)), None))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["detail"], "Unauthorized to delete feedback");

    let (status, _) = app
        .send(request(Method::DELETE, &uri, Some(&author_token), None))
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app.send(request(Method::GET, &uri, Some(&author_token), None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_board_delete_evicts_cached_feedback() {
    let app = TestApp::new();
    let admin = app.seed_user("root", Role::Admin).await;
    let token = app.token_for(&admin);
    let board = create_board(&app, &token, "Doomed").await;

    let (status, feedback) = app
        .send(request(
            Method::POST,
            "/feedbacks/",
            Some(&token),
            Some(json!({ "message": "cached", "board_id": board["id"] })),
        ))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let feedback_id = feedback["id"].as_str().unwrap();
    let uri = format!("/feedbacks/{}/", feedback_id);

    let (status, _) = app.send(request(Method::GET, &uri, Some(&token), None)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(app.cache.contains_key(feedback_id));

    let board_uri = format!("/boards/{}/", board["id"].as_str().unwrap());
    let (status, _) = app
        .send(request(Method::DELETE, &board_uri, Some(&token), None))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(!app.cache.contains_key(feedback_id));

    let (status, body) = app.send(request(Method::GET, &uri, Some(&token), None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["detail"], "Feedback not found");
}

// ============================================================================
// PASSWORDS AND CACHE MAINTENANCE
// ============================================================================

#[tokio::test]
async fn test_forgot_password_replaces_password() {
    let app = TestApp::new();
    app.seed_user("forgetful", Role::Member).await;

    let (status, body) = app
        .send(request(
            Method::POST,
            "/forgot_password/",
            None,
            Some(json!({ "email": "nobody@example.com" })),
        ))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["detail"], "User not found");

    let (status, _) = app
        .send(request(
            Method::POST,
            "/forgot_password/",
            None,
            Some(json!({ "email": "forgetful@example.com" })),
        ))
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app
        .send(request(
            Method::POST,
            "/login/",
            None,
            Some(json!({ "username": "forgetful", "password": TEST_PASSWORD })),
        ))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_reset_password() {
    let app = TestApp::new();
    app.seed_user("resetter", Role::Member).await;

    let (status, _) = app
        .send(request(
            Method::POST,
            "/reset_password/",
            None,
            Some(json!({
                "username": "resetter",
                "old_password": "not-it",
                "new_password": "brand-new"
            })),
        ))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = app
        .send(request(
            Method::POST,
            "/reset_password/",
            None,
            Some(json!({
                "username": "resetter",
                "old_password": TEST_PASSWORD,
                "new_password": "brand-new"
            })),
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["detail"], "Password Reset Successfully");

    let (status, _) = app
        .send(request(
            Method::POST,
            "/login/",
            None,
            Some(json!({ "username": "resetter", "password": "brand-new" })),
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_clear_cache_is_admin_only() {
    let app = TestApp::new();
    let member = app.seed_user("mem", Role::Member).await;
    let admin = app.seed_user("root", Role::Admin).await;

    let (status, body) = app
        .send(request(Method::POST, "/clear_cache/", Some(&app.token_for(&member)), None))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["detail"], "Unauthorized to clear cache");
    assert_eq!(app.cache.flushes(), 0);

    create_board(&app, &app.token_for(&admin), "Cached").await;
    assert!(!app.cache.is_empty());

    let (status, _) = app
        .send(request(Method::POST, "/clear_cache/", Some(&app.token_for(&admin)), None))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(app.cache.flushes(), 1);
    assert!(app.cache.is_empty());
}
