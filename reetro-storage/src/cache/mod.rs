//! Cache stores keyed by entity id.
//!
//! The cache is a derived projection of the authoritative store. Entries carry
//! no expiry; they live until deleted through the coordinator or until the
//! whole cache is flushed. A row changed behind the coordinator's back stays
//! stale in the cache indefinitely.

pub mod memory;
pub mod outcome;
pub mod redis_backend;
pub mod traits;

pub use memory::InMemoryCache;
pub use outcome::{CacheEffect, CacheLookup, CacheRead, CacheWrite, ReadSource};
pub use redis_backend::{RedisCache, RedisConfig};
pub use traits::{cache_key, CacheResult, CacheStore, CacheStoreExt, CacheableEntity};
