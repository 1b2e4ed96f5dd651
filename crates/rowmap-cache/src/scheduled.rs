use crate::Cache;
use rowmap_core::{stmt::Value, CacheKey, Result};

use parking_lot::Mutex;
use std::{
    sync::Arc,
    time::{Duration, Instant},
};

/// Empties the whole cache once the flush interval has elapsed since the
/// last clear. The check runs on every operation.
#[derive(Debug)]
pub struct ScheduledCache {
    delegate: Arc<dyn Cache>,
    interval: Duration,
    last_clear: Mutex<Instant>,
}

impl ScheduledCache {
    pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(60 * 60);

    pub fn new(delegate: Arc<dyn Cache>) -> ScheduledCache {
        ScheduledCache::with_interval(delegate, Self::DEFAULT_INTERVAL)
    }

    pub fn with_interval(delegate: Arc<dyn Cache>, interval: Duration) -> ScheduledCache {
        ScheduledCache {
            delegate,
            interval,
            last_clear: Mutex::new(Instant::now()),
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Clears the cache if it is stale. Returns whether it did.
    fn clear_when_stale(&self) -> Result<bool> {
        let stale = self.last_clear.lock().elapsed() >= self.interval;
        if stale {
            tracing::debug!(cache = %self.id(), "flush interval elapsed; clearing");
            self.clear()?;
        }
        Ok(stale)
    }
}

impl Cache for ScheduledCache {
    fn id(&self) -> &str {
        self.delegate.id()
    }

    fn put(&self, key: CacheKey, value: Value) -> Result<()> {
        self.clear_when_stale()?;
        self.delegate.put(key, value)
    }

    fn get(&self, key: &CacheKey) -> Result<Value> {
        if self.clear_when_stale()? {
            return Ok(Value::Null);
        }
        self.delegate.get(key)
    }

    fn remove(&self, key: &CacheKey) -> Result<Value> {
        self.clear_when_stale()?;
        self.delegate.remove(key)
    }

    fn clear(&self) -> Result<()> {
        *self.last_clear.lock() = Instant::now();
        self.delegate.clear()
    }

    /// Clearing a stale cache here cannot report failures; they are logged.
    fn size(&self) -> usize {
        if let Err(err) = self.clear_when_stale() {
            tracing::warn!(cache = %self.id(), error = %err, "failed to clear stale cache");
        }
        self.delegate.size()
    }
}
