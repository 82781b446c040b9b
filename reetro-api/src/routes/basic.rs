//! Basic Routes
//!
//! Landing pages, credential exchange and cache maintenance:
//! - `GET /`, `GET /about/`
//! - `POST /login/`, `POST /signup/`
//! - `POST /forgot_password/`, `POST /reset_password/`
//! - `POST /clear_cache/` (admin)

use std::sync::Arc;

use axum::{extract::State, routing::{get, post}, Json, Router};
use reetro_core::validation::{validate_email, validate_password, ValidateNonEmpty};

use super::{require_admin, user, Chains};
use crate::{
    auth::TokenService,
    cached_store::CachedStore,
    email::{Mailer, PASSWORD_RESET_SUBJECT},
    error::{ApiError, ApiResult},
    extractors::ApiJson,
    middleware::CurrentPrincipal,
    password::{generate_password, hash_password, verify_password},
    types::{
        AboutResponse, ForgotPasswordRequest, LoginRequest, MessageResponse,
        ResetPasswordRequest, TokenResponse,
    },
};

pub const HOME_DETAIL: &str = "Reetro Application Home Page";

// ============================================================================
// ROUTE HANDLERS
// ============================================================================

/// GET / - Home banner
pub async fn home() -> Json<MessageResponse> {
    Json(MessageResponse::new(HOME_DETAIL))
}

/// GET /about/ - Service name and version
pub async fn about() -> Json<AboutResponse> {
    Json(AboutResponse {
        name: "reetro".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// POST /clear_cache/ - Drop every cache entry
pub async fn clear_cache(
    State(cached): State<CachedStore>,
    CurrentPrincipal(principal): CurrentPrincipal,
) -> ApiResult<Json<MessageResponse>> {
    require_admin(&principal, "clear cache")?;
    cached.flush_cache().await?;
    tracing::info!(user = %principal.username, "cache flushed");
    Ok(Json(MessageResponse::new("Cache cleared successfully")))
}

/// POST /login/ - Exchange username and password for a token
pub async fn login(
    State(cached): State<CachedStore>,
    State(tokens): State<Arc<TokenService>>,
    ApiJson(req): ApiJson<LoginRequest>,
) -> ApiResult<Json<TokenResponse>> {
    ApiError::check(
        [
            req.username.validate_non_empty("username"),
            req.password.validate_non_empty("password"),
        ]
        .into_iter()
        .filter_map(Result::err)
        .collect(),
    )?;

    let user = cached
        .user_by_username(&req.username)
        .await?
        .ok_or_else(|| ApiError::unauthorized("Invalid Username"))?;

    if !verify_password(&req.password, &user.password_hash) {
        tracing::debug!(user = %user.username, "login with wrong password");
        return Err(ApiError::unauthorized("Invalid Password"));
    }

    let token = tokens.issue(user.id, &user.email)?;
    Ok(Json(TokenResponse { token }))
}

/// POST /forgot_password/ - Replace the password with a generated one and mail it
pub async fn forgot_password(
    State(cached): State<CachedStore>,
    State(mailer): State<Arc<dyn Mailer>>,
    ApiJson(req): ApiJson<ForgotPasswordRequest>,
) -> ApiResult<Json<MessageResponse>> {
    ApiError::check(validate_email(&req.email).err().into_iter().collect())?;

    let user = cached
        .user_by_email(&req.email)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    let password = generate_password();
    let hash = hash_password(&password)?;
    cached.user_set_password(user.id, &hash).await?;

    mailer
        .send_password_reset(&user.email, PASSWORD_RESET_SUBJECT, &password)
        .await?;

    Ok(Json(MessageResponse::new(
        "Your Password is Successfully Updated, Please check your email",
    )))
}

/// POST /reset_password/ - Change a password given the current one
pub async fn reset_password(
    State(cached): State<CachedStore>,
    ApiJson(req): ApiJson<ResetPasswordRequest>,
) -> ApiResult<Json<MessageResponse>> {
    ApiError::check(
        [
            req.username.validate_non_empty("username"),
            req.old_password.validate_non_empty("old_password"),
            validate_password("new_password", &req.new_password),
        ]
        .into_iter()
        .filter_map(Result::err)
        .collect(),
    )?;

    let user = cached
        .user_by_username(&req.username)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    if !verify_password(&req.old_password, &user.password_hash) {
        return Err(ApiError::unauthorized("Invalid Password"));
    }

    let hash = hash_password(&req.new_password)?;
    cached.user_set_password(user.id, &hash).await?;

    Ok(Json(MessageResponse::new("Password Reset Successfully")))
}

// ============================================================================
// ROUTER SETUP
// ============================================================================

pub fn create_router(chains: &Chains) -> Router {
    Router::new()
        .route("/", get(chains.public(home)))
        .route("/about/", get(chains.public(about)))
        .route("/clear_cache/", post(chains.protected(clear_cache)))
        .route("/login/", post(chains.public(login)))
        .route("/signup/", post(chains.public(user::create_user)))
        .route("/forgot_password/", post(chains.public(forgot_password)))
        .route("/reset_password/", post(chains.public(reset_password)))
}
