//! User REST API Routes

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post},
    Json, Router,
};
use chrono::Utc;
use reetro_core::{validation::validate_new_user, Page, User, UserProfile};

use super::Chains;
use crate::{
    cached_store::CachedStore,
    error::{ApiError, ApiResult},
    extractors::{ApiJson, PathId},
    middleware::CurrentPrincipal,
    password::hash_password,
    types::{CreateUserRequest, ListParams, MessageResponse},
};

// ============================================================================
// ROUTE HANDLERS
// ============================================================================

/// POST /users/ and POST /signup/ - Register a guest user
pub async fn create_user(
    State(cached): State<CachedStore>,
    ApiJson(req): ApiJson<CreateUserRequest>,
) -> ApiResult<impl IntoResponse> {
    let draft = req.into_draft();
    ApiError::check(validate_new_user(&draft))?;

    let hash = hash_password(&draft.password)?;
    let user = User::from_draft(draft, hash, Utc::now());
    let profile = cached.user_create(user).await?;

    tracing::info!(user_id = %profile.id, username = %profile.username, "user created");
    Ok((StatusCode::CREATED, Json(profile)))
}

/// GET /users/ - List users (admin)
pub async fn list_users(
    State(cached): State<CachedStore>,
    CurrentPrincipal(principal): CurrentPrincipal,
    Query(params): Query<ListParams>,
) -> ApiResult<Json<Page<UserProfile>>> {
    if !principal.is_admin() {
        return Err(ApiError::unauthorized("Unauthorized Access"));
    }
    let page = cached.user_list(params.pagination()).await?;
    Ok(Json(page))
}

/// GET /users/:id/ - Fetch one user
pub async fn get_user(
    State(cached): State<CachedStore>,
    PathId(id): PathId,
) -> ApiResult<Json<UserProfile>> {
    let user = cached.user_get(id).await?;
    Ok(Json(user))
}

/// DELETE /users/:id/ - Delete a user (admin or the user themselves)
pub async fn delete_user(
    State(cached): State<CachedStore>,
    CurrentPrincipal(principal): CurrentPrincipal,
    PathId(id): PathId,
) -> ApiResult<Json<MessageResponse>> {
    if !principal.is_admin() && principal.id != id {
        return Err(ApiError::unauthorized("Unauthorized to delete user"));
    }
    cached.user_delete(id).await?;
    Ok(Json(MessageResponse::new("User deleted successfully")))
}

// ============================================================================
// ROUTER SETUP
// ============================================================================

pub fn create_router(chains: &Chains) -> Router {
    Router::new()
        .route("/users/", post(chains.public(create_user)))
        .route("/users/", get(chains.protected(list_users)))
        .route("/users/:id/", get(chains.protected(get_user)))
        .route("/users/:id/", delete(chains.protected(delete_user)))
}
