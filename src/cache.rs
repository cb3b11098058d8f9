use std::sync::Arc;

use serde_json::Value;

pub mod inmemory;
pub mod nocache;

use crate::Result;
pub use inmemory::InMemoryCache;
pub use nocache::NoCache;

/// Store for decoded JSON bodies of successful reads, keyed by the request
/// cache key (URL, body and method).
pub trait Cache: Send + Sync {
    fn get(&self, key: &str) -> Result<CacheState>;
    fn set(&self, key: &str, value: &Value) -> Result<()>;
    /// Removes every entry whose key contains `pattern` and returns how many
    /// were removed.
    fn invalidate(&self, pattern: &str) -> Result<usize>;
    /// Removes the entry stored under exactly `key`.
    fn remove(&self, key: &str) -> Result<bool>;
}

#[derive(Clone, Debug, PartialEq)]
pub enum CacheState {
    Fresh(Value),
    Expired,
    None,
}

/// Lets several clients share one store.
impl<C: Cache + ?Sized> Cache for Arc<C> {
    fn get(&self, key: &str) -> Result<CacheState> {
        self.as_ref().get(key)
    }

    fn set(&self, key: &str, value: &Value) -> Result<()> {
        self.as_ref().set(key, value)
    }

    fn invalidate(&self, pattern: &str) -> Result<usize> {
        self.as_ref().invalidate(pattern)
    }

    fn remove(&self, key: &str) -> Result<bool> {
        self.as_ref().remove(key)
    }
}
