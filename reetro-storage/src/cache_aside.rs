//! Cache-aside coordination between a [`CacheStore`] and the authoritative store.
//!
//! Reads try the cache first and fall back to the store, repopulating the
//! cache. Writes go to the store first and then refresh or invalidate the
//! cache entry. Cache failures are reported in the returned
//! [`CacheRead`]/[`CacheWrite`] and logged, never propagated.

use std::future::Future;
use std::sync::Arc;

use reetro_core::{CacheError, EntityId, ReetroResult, StorageError};

use crate::cache::{
    cache_key, CacheEffect, CacheLookup, CacheRead, CacheStore, CacheStoreExt, CacheWrite,
    CacheableEntity,
};
use crate::store::StorageFetcher;

/// Cache-aside coordinator.
///
/// Holds no locks of its own. Two concurrent writes to the same id may leave
/// the cache holding either value; the store decides the durable one.
#[derive(Clone)]
pub struct CacheAside {
    cache: Arc<dyn CacheStore>,
}

impl std::fmt::Debug for CacheAside {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheAside")
            .field("backend", &self.cache.backend_name())
            .finish()
    }
}

impl CacheAside {
    pub fn new(cache: Arc<dyn CacheStore>) -> Self {
        Self { cache }
    }

    pub fn cache(&self) -> &Arc<dyn CacheStore> {
        &self.cache
    }

    /// Read an entity by id.
    ///
    /// A hit is returned without consulting the store, so a stale entry is
    /// served until it is invalidated. On a miss or a cache error the store is
    /// read; an absent row fails with `StorageError::NotFound` and leaves the
    /// cache untouched.
    pub async fn fetch_by_id<T, S>(&self, id: EntityId, store: &S) -> ReetroResult<CacheRead<T>>
    where
        T: CacheableEntity,
        S: StorageFetcher<T> + ?Sized,
    {
        let key = cache_key(id);

        let lookup = match self.cache.get_json::<T>(&key).await {
            Ok(Some(value)) => {
                tracing::debug!(entity = %T::entity_type(), key = %key, "cache hit");
                return Ok(CacheRead::hit(value));
            }
            Ok(None) => {
                tracing::debug!(entity = %T::entity_type(), key = %key, "cache miss");
                CacheLookup::Miss
            }
            Err(e) => {
                tracing::warn!(
                    entity = %T::entity_type(),
                    key = %key,
                    backend = self.cache.backend_name(),
                    error = %e,
                    "cache read failed, falling back to store"
                );
                CacheLookup::Failed(e)
            }
        };

        let value = store
            .fetch(id)
            .await?
            .ok_or(StorageError::NotFound {
                entity_type: T::entity_type(),
                id,
            })?;

        let effect = self.store_best_effort(&value).await;
        Ok(CacheRead::loaded(value, lookup, effect))
    }

    /// Persist through `write`, then cache the persisted value.
    ///
    /// Used for both creates and updates. Input must already be validated. If
    /// `write` fails its error is returned as-is and the cache is not touched.
    pub async fn write<T, F>(&self, write: F) -> ReetroResult<CacheWrite<T>>
    where
        T: CacheableEntity,
        F: Future<Output = ReetroResult<T>> + Send,
    {
        let value = write.await?;
        let effect = self.store_best_effort(&value).await;
        Ok(CacheWrite::new(value, effect))
    }

    /// Persist a deletion through `delete`, then drop the cache entry.
    ///
    /// A missing cache entry does not fail the delete.
    pub async fn delete<T, F>(&self, id: EntityId, delete: F) -> ReetroResult<CacheWrite<()>>
    where
        T: CacheableEntity,
        F: Future<Output = ReetroResult<()>> + Send,
    {
        delete.await?;
        let effect = self.invalidate::<T>(id).await;
        Ok(CacheWrite::new((), effect))
    }

    /// Drop the cache entry for `id` without touching the store.
    ///
    /// For rows the store removed on its own, such as a cascade.
    pub async fn invalidate<T: CacheableEntity>(&self, id: EntityId) -> CacheEffect {
        let key = cache_key(id);
        match self.cache.delete(&key).await {
            Ok(()) => CacheEffect::Invalidated,
            Err(e @ CacheError::KeyNotFound { .. }) => {
                tracing::debug!(entity = %T::entity_type(), key = %key, "no cache entry to invalidate");
                CacheEffect::Failed(e)
            }
            Err(e) => {
                tracing::warn!(
                    entity = %T::entity_type(),
                    key = %key,
                    backend = self.cache.backend_name(),
                    error = %e,
                    "cache invalidation failed"
                );
                CacheEffect::Failed(e)
            }
        }
    }

    /// Drop every cache entry. The store is not affected.
    pub async fn flush(&self) -> Result<(), CacheError> {
        self.cache.flush_all().await?;
        tracing::info!(backend = self.cache.backend_name(), "cache flushed");
        Ok(())
    }

    async fn store_best_effort<T: CacheableEntity>(&self, value: &T) -> CacheEffect {
        let key = cache_key(value.entity_id());
        match self.cache.set_json(&key, value).await {
            Ok(()) => CacheEffect::Stored,
            Err(e) => {
                tracing::warn!(
                    entity = %T::entity_type(),
                    key = %key,
                    backend = self.cache.backend_name(),
                    error = %e,
                    "cache population failed"
                );
                CacheEffect::Failed(e)
            }
        }
    }
}
