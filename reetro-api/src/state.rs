//! Shared application state for Axum routers.

use std::sync::Arc;

use reetro_storage::{AuthoritativeStore, CacheStore};

use crate::auth::{IdentityLookup, StoreIdentityLookup, TokenService};
use crate::cached_store::CachedStore;
use crate::email::Mailer;

/// Application-wide state shared across all routes.
#[derive(Clone)]
pub struct AppState {
    /// Cache-aside access to every entity.
    pub cached: CachedStore,
    pub tokens: Arc<TokenService>,
    /// Principal resolution for the auth middleware. Always reads the store.
    pub identity: Arc<dyn IdentityLookup>,
    pub mailer: Arc<dyn Mailer>,
}

impl AppState {
    pub fn new(
        store: Arc<dyn AuthoritativeStore>,
        cache: Arc<dyn CacheStore>,
        tokens: TokenService,
        mailer: Arc<dyn Mailer>,
    ) -> Self {
        Self {
            identity: Arc::new(StoreIdentityLookup::new(Arc::clone(&store))),
            cached: CachedStore::new(store, cache),
            tokens: Arc::new(tokens),
            mailer,
        }
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("cached", &self.cached)
            .field("tokens", &self.tokens)
            .finish_non_exhaustive()
    }
}

crate::impl_from_ref!(CachedStore, cached);
crate::impl_from_ref!(Arc<TokenService>, tokens);
crate::impl_from_ref!(Arc<dyn Mailer>, mailer);
