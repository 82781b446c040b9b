//! Shared helpers for reetro-api integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use reetro_api::{
    auth::{AuthConfig, JwtSecret, TokenService},
    create_router,
    email::LogMailer,
    password::hash_password,
    AppState,
};
use reetro_api::config::EmailConfig;
use reetro_core::{NewUser, Role, User};
use reetro_storage::{AuthoritativeStore, InMemoryStore};
use reetro_test_utils::RecordingCache;
use serde_json::Value;
use tower::ServiceExt;

pub const TEST_SECRET: &str = "integration-test-secret-0123456789abcdef";
pub const TEST_PASSWORD: &str = "correct-horse";

pub fn test_auth_config() -> AuthConfig {
    AuthConfig::new(JwtSecret::new(TEST_SECRET).expect("secret"))
}

pub fn test_email_config() -> EmailConfig {
    EmailConfig {
        from: "no-reply@reetro.test".to_string(),
        host: "localhost".to_string(),
        port: 587,
    }
}

/// A router over an in-memory store and a recording cache.
pub struct TestApp {
    pub router: Router,
    pub store: InMemoryStore,
    pub cache: RecordingCache,
    pub tokens: Arc<TokenService>,
}

impl TestApp {
    pub fn new() -> Self {
        let store = InMemoryStore::new();
        let cache = RecordingCache::new();
        let state = AppState::new(
            Arc::new(store.clone()),
            Arc::new(cache.clone()),
            TokenService::new(test_auth_config()),
            Arc::new(LogMailer::new(test_email_config())),
        );
        let tokens = Arc::clone(&state.tokens);
        Self {
            router: create_router(state),
            store,
            cache,
            tokens,
        }
    }

    /// Insert a user with [`TEST_PASSWORD`] directly into the store.
    pub async fn seed_user(&self, username: &str, role: Role) -> User {
        let user = User::from_draft(
            NewUser {
                first_name: "Test".to_string(),
                last_name: "User".to_string(),
                username: username.to_string(),
                email: format!("{}@example.com", username),
                role,
                password: TEST_PASSWORD.to_string(),
            },
            hash_password(TEST_PASSWORD).expect("hash"),
            chrono::Utc::now(),
        );
        self.store.user_insert(&user).await.expect("seed user")
    }

    pub fn token_for(&self, user: &User) -> String {
        self.tokens.issue(user.id, &user.email).expect("issue token")
    }

    pub async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible");
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("read body");
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, body)
    }
}

pub fn request(method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .expect("request"),
        None => builder.body(Body::empty()).expect("request"),
    }
}
