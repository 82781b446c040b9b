//! Feedback REST API Routes

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, patch, post},
    Json, Router,
};
use chrono::Utc;
use reetro_core::{
    validation::{validate_new_feedback, ValidateNonEmpty},
    Feedback, Page, ValidationError,
};

use super::Chains;
use crate::{
    cached_store::CachedStore,
    error::{ApiError, ApiResult},
    extractors::{ApiJson, PathId},
    middleware::CurrentPrincipal,
    types::{CreateFeedbackRequest, ListParams, MessageResponse, UpdateFeedbackRequest},
};

// ============================================================================
// ROUTE HANDLERS
// ============================================================================

/// GET /feedbacks/ - List feedback
pub async fn list_feedbacks(
    State(cached): State<CachedStore>,
    Query(params): Query<ListParams>,
) -> ApiResult<Json<Page<Feedback>>> {
    let page = cached.feedback_list(params.pagination()).await?;
    Ok(Json(page))
}

/// GET /feedbacks/:id/ - Fetch one feedback
pub async fn get_feedback(
    State(cached): State<CachedStore>,
    PathId(id): PathId,
) -> ApiResult<Json<Feedback>> {
    let feedback = cached.feedback_get(id).await?;
    Ok(Json(feedback))
}

/// POST /feedbacks/ - Post feedback on an existing board
pub async fn create_feedback(
    State(cached): State<CachedStore>,
    CurrentPrincipal(principal): CurrentPrincipal,
    ApiJson(req): ApiJson<CreateFeedbackRequest>,
) -> ApiResult<impl IntoResponse> {
    let draft = req.into_draft().ok_or_else(|| {
        ApiError::validation(vec![ValidationError::RequiredFieldMissing {
            field: "board_id".to_string(),
        }])
    })?;
    ApiError::check(validate_new_feedback(&draft))?;

    // Board must exist.
    cached.board_get(draft.board_id).await?;

    let feedback = Feedback::from_draft(draft, &principal.actor(), Utc::now());
    let feedback = cached.feedback_create(feedback).await?;
    Ok((StatusCode::CREATED, Json(feedback)))
}

/// PATCH /feedbacks/:id/ - Edit the message
pub async fn update_feedback(
    State(cached): State<CachedStore>,
    CurrentPrincipal(_principal): CurrentPrincipal,
    PathId(id): PathId,
    ApiJson(req): ApiJson<UpdateFeedbackRequest>,
) -> ApiResult<Json<Feedback>> {
    ApiError::check(req.message.validate_non_empty("message").err().into_iter().collect())?;
    let feedback = cached.feedback_update_message(id, &req.message).await?;
    Ok(Json(feedback))
}

/// DELETE /feedbacks/:id/ - Delete feedback (author or admin)
pub async fn delete_feedback(
    State(cached): State<CachedStore>,
    CurrentPrincipal(principal): CurrentPrincipal,
    PathId(id): PathId,
) -> ApiResult<Json<MessageResponse>> {
    if !principal.is_admin() {
        let feedback = cached.feedback_get(id).await?;
        if feedback.created_by_id != principal.id {
            return Err(ApiError::unauthorized("Unauthorized to delete feedback"));
        }
    }
    cached.feedback_delete(id).await?;
    Ok(Json(MessageResponse::new("Feedback deleted successfully")))
}

// ============================================================================
// ROUTER SETUP
// ============================================================================

pub fn create_router(chains: &Chains) -> Router {
    Router::new()
        .route("/feedbacks/", get(chains.protected(list_feedbacks)))
        .route("/feedbacks/", post(chains.protected(create_feedback)))
        .route("/feedbacks/:id/", get(chains.protected(get_feedback)))
        .route("/feedbacks/:id/", patch(chains.protected(update_feedback)))
        .route("/feedbacks/:id/", delete(chains.protected(delete_feedback)))
}
