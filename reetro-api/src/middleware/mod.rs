//! Middleware for the reetro API
//!
//! - `chain`: the composition mechanism ([`MiddlewareChain`], [`Endpoint`])
//! - `auth`: bearer-token authentication and the [`CurrentPrincipal`] extractor
//! - `request_log`: access logging
//!
//! # Middleware Order
//!
//! Chains run first-listed first. Public routes use `[RequestLog]`; protected
//! routes use `[RequestLog, AuthMiddleware]`, so rejected requests are still
//! logged.

mod auth;
mod chain;
mod request_log;

pub use auth::{AuthMiddleware, AuthRejection, CurrentPrincipal, BEARER_SCHEME};
pub use chain::{BoxResponseFuture, Endpoint, Middleware, MiddlewareChain};
pub use request_log::RequestLog;
