//! Request extractors that reject with the API's `{"detail"}` error shape.

use axum::{
    async_trait,
    extract::{rejection::JsonRejection, FromRequest, FromRequestParts, Path, Request},
    http::request::Parts,
    Json,
};
use reetro_core::EntityId;
use serde::de::DeserializeOwned;

use crate::error::ApiError;

/// JSON body extractor. Malformed bodies become 400 instead of axum's
/// plain-text 415/422 rejections.
#[derive(Debug, Clone)]
pub struct ApiJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(ApiJson(value)),
            Err(rejection) => Err(json_rejection(rejection)),
        }
    }
}

fn json_rejection(rejection: JsonRejection) -> ApiError {
    tracing::debug!(error = %rejection.body_text(), "request body rejected");
    match rejection {
        JsonRejection::MissingJsonContentType(_) => {
            ApiError::invalid_input("Expected a JSON request body")
        }
        _ => ApiError::invalid_input("Invalid request body"),
    }
}

/// Entity id from the single path parameter.
#[derive(Debug, Clone, Copy)]
pub struct PathId(pub EntityId);

#[async_trait]
impl<S> FromRequestParts<S> for PathId
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match Path::<EntityId>::from_request_parts(parts, state).await {
            Ok(Path(id)) => Ok(PathId(id)),
            Err(_) => Err(ApiError::invalid_input("Invalid id")),
        }
    }
}
