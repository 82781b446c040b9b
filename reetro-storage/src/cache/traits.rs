//! Cache store traits and cacheable entity marker.

use async_trait::async_trait;
use reetro_core::{Board, CacheError, EntityId, EntityType, Feedback, UserProfile};
use serde::{de::DeserializeOwned, Serialize};

pub type CacheResult<T> = Result<T, CacheError>;

/// Marker trait for types that can be cached.
///
/// `entity_id()` is the cache key source; all entity kinds share one key
/// space because ids are unique across tables.
pub trait CacheableEntity: Clone + Serialize + DeserializeOwned + Send + Sync + 'static {
    fn entity_type() -> EntityType;

    fn entity_id(&self) -> EntityId;
}

/// The key an entity is cached under: its id as a string.
pub fn cache_key(id: EntityId) -> String {
    id.to_string()
}

/// Key-value cache capability.
///
/// Values are JSON text. `get_raw` has three outcomes: `Ok(Some)` on a hit,
/// `Ok(None)` on a miss, `Err` on a transport failure.
#[async_trait]
pub trait CacheStore: Send + Sync {
    async fn set_raw(&self, key: &str, value: String) -> CacheResult<()>;

    async fn get_raw(&self, key: &str) -> CacheResult<Option<String>>;

    /// Fails with `CacheError::KeyNotFound` if nothing was stored under `key`.
    async fn delete(&self, key: &str) -> CacheResult<()>;

    async fn flush_all(&self) -> CacheResult<()>;

    /// Short backend name for logs.
    fn backend_name(&self) -> &'static str;
}

/// Typed access on top of [`CacheStore`].
///
/// The type parameter of `get_json` is the shape the caller expects. A stored
/// value that does not decode into it is reported as
/// `CacheError::Deserialization`, which callers treat like a miss.
#[async_trait]
pub trait CacheStoreExt: CacheStore {
    async fn set_json<T>(&self, key: &str, value: &T) -> CacheResult<()>
    where
        T: Serialize + Sync,
    {
        let encoded = serde_json::to_string(value).map_err(|e| CacheError::Serialization {
            key: key.to_string(),
            reason: e.to_string(),
        })?;
        self.set_raw(key, encoded).await
    }

    async fn get_json<T>(&self, key: &str) -> CacheResult<Option<T>>
    where
        T: DeserializeOwned + Send,
    {
        match self.get_raw(key).await? {
            Some(raw) => serde_json::from_str(&raw)
                .map(Some)
                .map_err(|e| CacheError::Deserialization {
                    key: key.to_string(),
                    reason: e.to_string(),
                }),
            None => Ok(None),
        }
    }
}

impl<C: CacheStore + ?Sized> CacheStoreExt for C {}

// ============================================================================
// IMPLEMENTATIONS FOR REETRO ENTITIES
// ============================================================================

impl CacheableEntity for UserProfile {
    fn entity_type() -> EntityType {
        EntityType::User
    }

    fn entity_id(&self) -> EntityId {
        self.id
    }
}

impl CacheableEntity for Board {
    fn entity_type() -> EntityType {
        EntityType::Board
    }

    fn entity_id(&self) -> EntityId {
        self.id
    }
}

impl CacheableEntity for Feedback {
    fn entity_type() -> EntityType {
        EntityType::Feedback
    }

    fn entity_id(&self) -> EntityId {
        self.id
    }
}
