//! Results of coordinated operations, with the cache side effects made visible.
//!
//! Cache failures never fail the primary operation. Instead of discarding
//! them, the coordinator reports what happened on the cache side next to the
//! value the caller asked for.

use reetro_core::CacheError;

/// Where a read was answered from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadSource {
    Cache,
    Store,
}

/// What the cache lookup at the start of a read returned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheLookup {
    Hit,
    Miss,
    /// Transport or deserialization failure; handled like a miss.
    Failed(CacheError),
}

/// What the best-effort cache mutation after a store operation did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheEffect {
    /// No cache mutation was attempted.
    Untouched,
    /// The entry was written.
    Stored,
    /// The entry was removed.
    Invalidated,
    /// The mutation failed. The primary operation still succeeded.
    Failed(CacheError),
}

impl CacheEffect {
    pub fn is_failure(&self) -> bool {
        matches!(self, CacheEffect::Failed(_))
    }
}

/// A coordinated read.
#[derive(Debug, Clone)]
pub struct CacheRead<T> {
    value: T,
    lookup: CacheLookup,
    effect: CacheEffect,
}

impl<T> CacheRead<T> {
    pub fn hit(value: T) -> Self {
        Self {
            value,
            lookup: CacheLookup::Hit,
            effect: CacheEffect::Untouched,
        }
    }

    pub fn loaded(value: T, lookup: CacheLookup, effect: CacheEffect) -> Self {
        Self {
            value,
            lookup,
            effect,
        }
    }

    pub fn source(&self) -> ReadSource {
        match self.lookup {
            CacheLookup::Hit => ReadSource::Cache,
            _ => ReadSource::Store,
        }
    }

    pub fn was_cache_hit(&self) -> bool {
        self.source() == ReadSource::Cache
    }

    pub fn lookup(&self) -> &CacheLookup {
        &self.lookup
    }

    /// Outcome of repopulating the cache after a store read.
    pub fn effect(&self) -> &CacheEffect {
        &self.effect
    }

    pub fn value(&self) -> &T {
        &self.value
    }

    pub fn into_value(self) -> T {
        self.value
    }

    pub fn map<U, F>(self, f: F) -> CacheRead<U>
    where
        F: FnOnce(T) -> U,
    {
        CacheRead {
            value: f(self.value),
            lookup: self.lookup,
            effect: self.effect,
        }
    }
}

/// A coordinated create, update or delete.
#[derive(Debug, Clone)]
pub struct CacheWrite<T> {
    value: T,
    effect: CacheEffect,
}

impl<T> CacheWrite<T> {
    pub fn new(value: T, effect: CacheEffect) -> Self {
        Self { value, effect }
    }

    pub fn effect(&self) -> &CacheEffect {
        &self.effect
    }

    pub fn value(&self) -> &T {
        &self.value
    }

    pub fn into_value(self) -> T {
        self.value
    }
}
