//! Bearer-token authentication middleware.
//!
//! Per request:
//! 1. Read `Authorization`. Missing or empty: reject with "Empty Token".
//! 2. Split on a single space into exactly two parts, else "Invalid token".
//! 3. The first part must be `Bearer`, else "Bearer token is required".
//! 4. Validate the second part with the [`TokenService`], else "Invalid token".
//! 5. Resolve the subject through [`IdentityLookup`], else "Unauthorized".
//! 6. Attach the [`Principal`] to the request and call the next endpoint.
//!
//! Every rejection is a 401 and the rest of the chain never runs.

use crate::auth::{IdentityLookup, Principal, TokenService};
use crate::error::ApiError;
use crate::middleware::chain::{Endpoint, Middleware};
use async_trait::async_trait;
use axum::{
    extract::{FromRequestParts, Request},
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
    response::{IntoResponse, Response},
};
use std::sync::Arc;

pub const BEARER_SCHEME: &str = "Bearer";

// ============================================================================
// REJECTIONS
// ============================================================================

/// Why the middleware refused a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthRejection {
    EmptyToken,
    InvalidFormat,
    SchemeRequired,
    InvalidToken,
    Unauthorized,
}

impl AuthRejection {
    pub fn detail(&self) -> &'static str {
        match self {
            AuthRejection::EmptyToken => "Empty Token",
            AuthRejection::InvalidFormat => "Invalid token",
            AuthRejection::SchemeRequired => "Bearer token is required",
            AuthRejection::InvalidToken => "Invalid token",
            AuthRejection::Unauthorized => "Unauthorized",
        }
    }
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        let err = match self {
            AuthRejection::InvalidToken => ApiError::invalid_token(self.detail()),
            _ => ApiError::unauthorized(self.detail()),
        };
        err.into_response()
    }
}

// ============================================================================
// MIDDLEWARE
// ============================================================================

#[derive(Clone)]
pub struct AuthMiddleware {
    tokens: Arc<TokenService>,
    identity: Arc<dyn IdentityLookup>,
}

impl AuthMiddleware {
    pub fn new(tokens: Arc<TokenService>, identity: Arc<dyn IdentityLookup>) -> Self {
        Self { tokens, identity }
    }

    /// Run the header checks and the identity lookup for one request.
    pub async fn authenticate(&self, headers: &HeaderMap) -> Result<Principal, AuthRejection> {
        let header = match headers.get(AUTHORIZATION) {
            None => return Err(AuthRejection::EmptyToken),
            Some(value) if value.is_empty() => return Err(AuthRejection::EmptyToken),
            Some(value) => value.to_str().map_err(|_| AuthRejection::InvalidFormat)?,
        };

        let parts: Vec<&str> = header.split(' ').collect();
        let [scheme, token] = parts.as_slice() else {
            return Err(AuthRejection::InvalidFormat);
        };
        if *scheme != BEARER_SCHEME {
            return Err(AuthRejection::SchemeRequired);
        }

        let claims = self.tokens.validate(token).map_err(|e| {
            tracing::debug!(error = %e, "token rejected");
            AuthRejection::InvalidToken
        })?;

        self.identity
            .principal_by_id(claims.id)
            .await
            .map_err(|e| {
                tracing::debug!(subject = %claims.id, error = %e, "token subject not resolvable");
                AuthRejection::Unauthorized
            })
    }
}

#[async_trait]
impl Middleware for AuthMiddleware {
    async fn handle(&self, mut req: Request, next: Endpoint) -> Response {
        let outcome = self.authenticate(req.headers()).await;
        match outcome {
            Ok(principal) => {
                req.extensions_mut().insert(principal);
                next.call(req).await
            }
            Err(rejection) => {
                tracing::debug!(
                    path = %req.uri().path(),
                    reason = rejection.detail(),
                    "request rejected by auth middleware"
                );
                rejection.into_response()
            }
        }
    }

    fn name(&self) -> &'static str {
        "auth"
    }
}

// ============================================================================
// TYPED EXTRACTOR
// ============================================================================

/// Extractor for the principal the auth middleware attached.
///
/// Only usable on routes behind [`AuthMiddleware`]; elsewhere it rejects
/// with 401.
#[derive(Debug, Clone)]
pub struct CurrentPrincipal(pub Principal);

#[axum::async_trait]
impl<S> FromRequestParts<S> for CurrentPrincipal
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Principal>()
            .cloned()
            .map(CurrentPrincipal)
            .ok_or_else(|| ApiError::unauthorized("Unauthorized"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_rejection_details() {
        assert_eq!(AuthRejection::EmptyToken.detail(), "Empty Token");
        assert_eq!(AuthRejection::InvalidFormat.detail(), "Invalid token");
        assert_eq!(
            AuthRejection::InvalidFormat.detail(),
            AuthRejection::InvalidToken.detail()
        );
        assert_eq!(
            AuthRejection::SchemeRequired.detail(),
            "Bearer token is required"
        );
    }

    #[test]
    fn test_every_rejection_is_401() {
        for rejection in [
            AuthRejection::EmptyToken,
            AuthRejection::InvalidFormat,
            AuthRejection::SchemeRequired,
            AuthRejection::InvalidToken,
            AuthRejection::Unauthorized,
        ] {
            assert_eq!(
                rejection.into_response().status(),
                axum::http::StatusCode::UNAUTHORIZED
            );
        }
    }

    #[tokio::test]
    async fn test_extractor_without_principal_rejects() {
        let (mut parts, _) = Request::new(axum::body::Body::empty()).into_parts();
        parts
            .headers
            .insert(AUTHORIZATION, HeaderValue::from_static("Bearer x"));
        let result = CurrentPrincipal::from_request_parts(&mut parts, &()).await;
        assert_eq!(result.unwrap_err().detail, "Unauthorized");
    }
}
