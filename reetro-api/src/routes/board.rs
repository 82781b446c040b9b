//! Board REST API Routes
//!
//! Reads are open to any authenticated user; writes are admin-only.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, patch, post},
    Json, Router,
};
use chrono::Utc;
use reetro_core::{
    validation::{validate_columns, validate_new_board, ValidateNonEmpty},
    Board, BoardPatch, NewBoard, Page,
};

use super::{require_admin, Chains};
use crate::{
    cached_store::CachedStore,
    error::{ApiError, ApiResult},
    extractors::{ApiJson, PathId},
    middleware::CurrentPrincipal,
    types::{CreateBoardRequest, ListParams, MessageResponse, UpdateBoardRequest},
};

// ============================================================================
// ROUTE HANDLERS
// ============================================================================

/// GET /boards/ - List boards
pub async fn list_boards(
    State(cached): State<CachedStore>,
    Query(params): Query<ListParams>,
) -> ApiResult<Json<Page<Board>>> {
    let page = cached.board_list(params.pagination()).await?;
    Ok(Json(page))
}

/// GET /boards/:id/ - Fetch one board
pub async fn get_board(
    State(cached): State<CachedStore>,
    PathId(id): PathId,
) -> ApiResult<Json<Board>> {
    let board = cached.board_get(id).await?;
    Ok(Json(board))
}

/// POST /boards/ - Create a board
pub async fn create_board(
    State(cached): State<CachedStore>,
    CurrentPrincipal(principal): CurrentPrincipal,
    ApiJson(req): ApiJson<CreateBoardRequest>,
) -> ApiResult<impl IntoResponse> {
    require_admin(&principal, "create board")?;

    let draft = NewBoard::from(req);
    ApiError::check(validate_new_board(&draft))?;

    let board = Board::from_draft(draft, &principal.actor(), Utc::now());
    let board = cached.board_create(board).await?;

    tracing::info!(board_id = %board.id, created_by = %principal.username, "board created");
    Ok((StatusCode::CREATED, Json(board)))
}

/// PATCH /boards/:id/ - Update name, template or columns
pub async fn update_board(
    State(cached): State<CachedStore>,
    CurrentPrincipal(principal): CurrentPrincipal,
    PathId(id): PathId,
    ApiJson(req): ApiJson<UpdateBoardRequest>,
) -> ApiResult<Json<Board>> {
    require_admin(&principal, "update board")?;

    let patch = BoardPatch::from(req);
    let mut errors = Vec::new();
    if let Some(name) = &patch.name {
        errors.extend(name.validate_non_empty("name").err());
    }
    if let Some(columns) = &patch.columns {
        errors.extend(validate_columns(columns).err());
    }
    ApiError::check(errors)?;

    let board = cached.board_update(id, patch, &principal.actor()).await?;
    Ok(Json(board))
}

/// DELETE /boards/:id/ - Delete a board and its feedback
pub async fn delete_board(
    State(cached): State<CachedStore>,
    CurrentPrincipal(principal): CurrentPrincipal,
    PathId(id): PathId,
) -> ApiResult<Json<MessageResponse>> {
    require_admin(&principal, "delete board")?;
    cached.board_delete(id).await?;
    Ok(Json(MessageResponse::new("Board deleted successfully")))
}

// ============================================================================
// ROUTER SETUP
// ============================================================================

pub fn create_router(chains: &Chains) -> Router {
    Router::new()
        .route("/boards/", get(chains.protected(list_boards)))
        .route("/boards/", post(chains.protected(create_board)))
        .route("/boards/:id/", get(chains.protected(get_board)))
        .route("/boards/:id/", patch(chains.protected(update_board)))
        .route("/boards/:id/", delete(chains.protected(delete_board)))
}
