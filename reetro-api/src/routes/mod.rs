//! REST API Routes Module
//!
//! Route handlers grouped by entity:
//! - `basic`: home, about, login, password reset, cache flush
//! - `user`: user CRUD
//! - `board`: board CRUD
//! - `feedback`: feedback CRUD
//!
//! Every route is an axum handler wrapped in a [`MiddlewareChain`]: public
//! routes in `[RequestLog]`, protected routes in `[RequestLog, AuthMiddleware]`.

pub mod basic;
pub mod board;
pub mod feedback;
pub mod user;

use axum::{extract::Request, handler::Handler, Router};
use tower_http::cors::CorsLayer;

use crate::auth::Principal;
use crate::error::{ApiError, ApiResult};
use crate::middleware::{
    AuthMiddleware, BoxResponseFuture, Endpoint, MiddlewareChain, RequestLog,
};
use crate::state::AppState;

// ============================================================================
// CHAINS
// ============================================================================

/// The two middleware chains routes are wrapped in.
#[derive(Debug, Clone)]
pub struct Chains {
    pub public: MiddlewareChain,
    pub protected: MiddlewareChain,
    state: AppState,
}

impl Chains {
    pub fn new(state: &AppState) -> Self {
        let public = MiddlewareChain::new().with(RequestLog);
        let protected = public.clone().with(AuthMiddleware::new(
            state.tokens.clone(),
            state.identity.clone(),
        ));
        Self {
            public,
            protected,
            state: state.clone(),
        }
    }

    /// Wrap `handler` in the public chain.
    pub fn public<H, T>(
        &self,
        handler: H,
    ) -> impl Fn(Request) -> BoxResponseFuture + Clone + Send + Sync + 'static
    where
        H: Handler<T, AppState> + Sync,
        T: 'static,
    {
        Self::wrap(&self.public, handler, &self.state)
    }

    /// Wrap `handler` in the authenticated chain.
    pub fn protected<H, T>(
        &self,
        handler: H,
    ) -> impl Fn(Request) -> BoxResponseFuture + Clone + Send + Sync + 'static
    where
        H: Handler<T, AppState> + Sync,
        T: 'static,
    {
        Self::wrap(&self.protected, handler, &self.state)
    }

    fn wrap<H, T>(
        chain: &MiddlewareChain,
        handler: H,
        state: &AppState,
    ) -> impl Fn(Request) -> BoxResponseFuture + Clone + Send + Sync + 'static
    where
        H: Handler<T, AppState> + Sync,
        T: 'static,
    {
        chain
            .then(Endpoint::from_axum(handler, state.clone()))
            .into_axum()
    }
}

// ============================================================================
// ROUTER
// ============================================================================

/// Build the full application router.
pub fn create_router(state: AppState) -> Router {
    let chains = Chains::new(&state);

    Router::new()
        .merge(basic::create_router(&chains))
        .merge(user::create_router(&chains))
        .merge(board::create_router(&chains))
        .merge(feedback::create_router(&chains))
        .fallback(not_found)
        .layer(CorsLayer::permissive())
}

async fn not_found() -> ApiError {
    ApiError::not_found("Not found")
}

// ============================================================================
// AUTHORIZATION HELPERS
// ============================================================================

/// Admin-only guard. Non-admins get 401 `Unauthorized to <action>`.
pub(crate) fn require_admin(principal: &Principal, action: &str) -> ApiResult<()> {
    if principal.is_admin() {
        Ok(())
    } else {
        tracing::debug!(user = %principal.username, action, "admin role required");
        Err(ApiError::unauthorized(format!("Unauthorized to {}", action)))
    }
}
