//! In-process cache backed by a `DashMap`.

use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use reetro_core::CacheError;

use super::traits::{CacheResult, CacheStore};

/// Local cache for single-instance deployments and tests.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCache {
    entries: Arc<DashMap<String, String>>,
}

impl InMemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }
}

#[async_trait]
impl CacheStore for InMemoryCache {
    async fn set_raw(&self, key: &str, value: String) -> CacheResult<()> {
        self.entries.insert(key.to_string(), value);
        Ok(())
    }

    async fn get_raw(&self, key: &str) -> CacheResult<Option<String>> {
        Ok(self.entries.get(key).map(|entry| entry.value().clone()))
    }

    async fn delete(&self, key: &str) -> CacheResult<()> {
        match self.entries.remove(key) {
            Some(_) => Ok(()),
            None => Err(CacheError::KeyNotFound {
                key: key.to_string(),
            }),
        }
    }

    async fn flush_all(&self) -> CacheResult<()> {
        self.entries.clear();
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::CacheStoreExt;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Sample {
        name: String,
        size: u32,
    }

    #[tokio::test]
    async fn test_get_distinguishes_hit_and_miss() {
        let cache = InMemoryCache::new();
        let sample = Sample {
            name: "a".to_string(),
            size: 3,
        };
        cache.set_json("k", &sample).await.unwrap();

        assert_eq!(cache.get_json::<Sample>("k").await.unwrap(), Some(sample));
        assert_eq!(cache.get_json::<Sample>("missing").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_shape_mismatch_is_an_error_not_a_miss() {
        let cache = InMemoryCache::new();
        cache.set_raw("k", "[1,2,3]".to_string()).await.unwrap();
        let err = cache.get_json::<Sample>("k").await.unwrap_err();
        assert!(matches!(err, CacheError::Deserialization { .. }));
    }

    #[tokio::test]
    async fn test_delete_missing_key_fails() {
        let cache = InMemoryCache::new();
        let err = cache.delete("nope").await.unwrap_err();
        assert_eq!(
            err,
            CacheError::KeyNotFound {
                key: "nope".to_string()
            }
        );

        cache.set_raw("yes", "1".to_string()).await.unwrap();
        cache.delete("yes").await.unwrap();
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn test_flush_all_empties_everything() {
        let cache = InMemoryCache::new();
        for i in 0..4 {
            cache.set_raw(&i.to_string(), "{}".to_string()).await.unwrap();
        }
        assert_eq!(cache.len(), 4);
        cache.flush_all().await.unwrap();
        assert!(cache.is_empty());
    }
}
