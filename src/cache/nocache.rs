use serde_json::Value;

use crate::cache::{Cache, CacheState};

use crate::Result;

/// Cache that never stores anything. Every read goes to the network.
pub struct NoCache;

impl Cache for NoCache {
    fn get(&self, _key: &str) -> Result<CacheState> {
        Ok(CacheState::None)
    }
    fn set(&self, _key: &str, _value: &Value) -> Result<()> {
        Ok(())
    }
    fn invalidate(&self, _pattern: &str) -> Result<usize> {
        Ok(0)
    }
    fn remove(&self, _key: &str) -> Result<bool> {
        Ok(false)
    }
}
