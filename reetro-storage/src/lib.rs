//! Reetro Storage
//!
//! Two capability traits and the protocol that keeps them consistent:
//!
//! - [`AuthoritativeStore`]: the relational source of truth. The Postgres
//!   variant lives in `reetro-api`; [`InMemoryStore`] is used by tests and the
//!   `memory` backend.
//! - [`CacheStore`]: a disposable key-value projection keyed by entity id.
//!   [`InMemoryCache`] and [`RedisCache`] are the two variants.
//! - [`CacheAside`]: read-through, write-through and invalidate-on-delete
//!   between the two, with every cache side effect reported back to the caller.

pub mod cache;
mod cache_aside;
mod memory;
mod store;

pub use cache::{
    cache_key, CacheEffect, CacheLookup, CacheRead, CacheResult, CacheStore, CacheStoreExt, CacheWrite,
    CacheableEntity, InMemoryCache, ReadSource, RedisCache, RedisConfig,
};
pub use cache_aside::CacheAside;
pub use memory::InMemoryStore;
pub use store::{AuthoritativeStore, StorageFetcher};
