use std::{
    collections::HashMap,
    sync::{Mutex, MutexGuard},
    time::Duration,
};

use serde_json::Value;
use tokio::time::Instant;

use crate::{
    cache::{Cache, CacheState},
    error::ApiError,
    time::Milliseconds,
};

use crate::Result;

#[derive(Clone, Debug)]
pub struct CacheEntry {
    stored_at: Instant,
    payload: Value,
}

/// Process local cache with a fixed time to live. Entries are only checked
/// for expiry when read; an expired entry is dropped at that point. There is
/// no size bound and no background sweep.
pub struct InMemoryCache {
    cache: Mutex<HashMap<String, CacheEntry>>,
    ttl: Duration,
}

impl InMemoryCache {
    pub fn new(ttl: Milliseconds) -> Self {
        Self {
            cache: Mutex::new(HashMap::new()),
            ttl: ttl.into(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries().map(|cache| cache.len()).unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn entries(&self) -> Result<MutexGuard<'_, HashMap<String, CacheEntry>>> {
        self.cache.lock().map_err(|_| {
            ApiError::CacheError("in-memory cache lock is poisoned".to_string()).into()
        })
    }
}

impl Cache for InMemoryCache {
    fn get(&self, key: &str) -> Result<CacheState> {
        let mut cache = self.entries()?;
        let Some(entry) = cache.get(key) else {
            return Ok(CacheState::None);
        };
        if entry.stored_at.elapsed() >= self.ttl {
            cache.remove(key);
            return Ok(CacheState::Expired);
        }
        Ok(CacheState::Fresh(entry.payload.clone()))
    }

    fn set(&self, key: &str, value: &Value) -> Result<()> {
        self.entries()?.insert(
            key.to_string(),
            CacheEntry {
                stored_at: Instant::now(),
                payload: value.clone(),
            },
        );
        Ok(())
    }

    fn invalidate(&self, pattern: &str) -> Result<usize> {
        let mut cache = self.entries()?;
        let before = cache.len();
        cache.retain(|key, _| !key.contains(pattern));
        Ok(before - cache.len())
    }

    fn remove(&self, key: &str) -> Result<bool> {
        Ok(self.entries()?.remove(key).is_some())
    }
}
