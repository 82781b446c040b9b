//! Reetro API - Authenticated, Cache-Backed REST Layer
//!
//! HTTP surface for the reetro retro-board service. Every route runs through
//! a [`MiddlewareChain`]; protected routes authenticate a bearer JWT and
//! resolve the caller to a [`Principal`] before the handler runs.
//!
//! Entity reads and writes go through [`CachedStore`], which keeps the
//! authoritative store and the cache consistent with the cache-aside
//! protocol from `reetro-storage`.

mod macros;

pub mod auth;
pub mod cached_store;
pub mod config;
pub mod db;
pub mod email;
pub mod error;
pub mod extractors;
pub mod middleware;
pub mod password;
pub mod routes;
pub mod state;
pub mod telemetry;
pub mod types;

// Re-export commonly used types
pub use auth::{
    AuthConfig, Claims, IdentityLookup, JwtClock, JwtSecret, Principal, StoreIdentityLookup,
    SystemClock, TokenError, TokenService,
};
pub use cached_store::CachedStore;
pub use config::{AppConfig, CacheBackend, EnvSource, StoreBackend};
pub use db::{DbConfig, PostgresStore};
pub use email::{LogMailer, Mailer};
pub use error::{ApiError, ApiResult, ErrorCode};
pub use middleware::{AuthMiddleware, AuthRejection, Middleware, MiddlewareChain};
pub use routes::create_router;
pub use state::AppState;
pub use types::*;
