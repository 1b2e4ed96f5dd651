use crate::Cache;
use rowmap_core::{stmt::Value, CacheKey, Result};

use std::sync::{
    atomic::{AtomicU64, Ordering::Relaxed},
    Arc,
};

/// Counts lookups and hits and logs the hit ratio at debug level.
#[derive(Debug)]
pub struct LoggingCache {
    delegate: Arc<dyn Cache>,
    requests: AtomicU64,
    hits: AtomicU64,
}

impl LoggingCache {
    pub fn new(delegate: Arc<dyn Cache>) -> LoggingCache {
        LoggingCache {
            delegate,
            requests: AtomicU64::new(0),
            hits: AtomicU64::new(0),
        }
    }

    pub fn requests(&self) -> u64 {
        self.requests.load(Relaxed)
    }

    pub fn hits(&self) -> u64 {
        self.hits.load(Relaxed)
    }

    /// Share of lookups that hit, `0.0` before the first lookup.
    pub fn hit_ratio(&self) -> f64 {
        let requests = self.requests();
        if requests == 0 {
            return 0.0;
        }
        self.hits() as f64 / requests as f64
    }
}

impl Cache for LoggingCache {
    fn id(&self) -> &str {
        self.delegate.id()
    }

    fn put(&self, key: CacheKey, value: Value) -> Result<()> {
        self.delegate.put(key, value)
    }

    fn get(&self, key: &CacheKey) -> Result<Value> {
        self.requests.fetch_add(1, Relaxed);
        let value = self.delegate.get(key)?;
        if !value.is_null() {
            self.hits.fetch_add(1, Relaxed);
        }

        tracing::debug!(cache = %self.id(), hit_ratio = self.hit_ratio(), "cache hit ratio");
        Ok(value)
    }

    fn remove(&self, key: &CacheKey) -> Result<Value> {
        self.delegate.remove(key)
    }

    fn clear(&self) -> Result<()> {
        self.delegate.clear()
    }

    fn size(&self) -> usize {
        self.delegate.size()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::PerpetualCache;

    #[test]
    fn counts_hits() {
        let cache = LoggingCache::new(Arc::new(PerpetualCache::new("users")));
        let key = CacheKey::from_values(["user.find", "1"]);

        assert_eq!(cache.hit_ratio(), 0.0);

        cache.get(&key).unwrap();
        cache.put(key.clone(), Value::from("alice")).unwrap();
        cache.get(&key).unwrap();

        assert_eq!(cache.requests(), 2);
        assert_eq!(cache.hits(), 1);
        assert_eq!(cache.hit_ratio(), 0.5);
    }
}
