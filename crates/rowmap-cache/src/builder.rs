use crate::{
    BlockingCache, Cache, CacheConfig, Eviction, FifoCache, LoggingCache, LruCache,
    PerpetualCache, ReferenceCache, Retention, ScheduledCache,
};
use rowmap_core::{Error, Result};

use std::{sync::Arc, time::Duration};

/// Assembles a cache chain.
///
/// From the inside out: the base store, the eviction policy, then the
/// scheduled flush, logging and blocking decorators when enabled.
#[derive(Debug, Clone)]
pub struct CacheBuilder {
    config: CacheConfig,
    base: Option<Arc<dyn Cache>>,
}

impl CacheBuilder {
    pub fn new(id: impl Into<String>) -> CacheBuilder {
        CacheBuilder::from_config(CacheConfig::new(id))
    }

    pub fn from_config(config: CacheConfig) -> CacheBuilder {
        CacheBuilder { config, base: None }
    }

    /// Store to use instead of a [`PerpetualCache`].
    pub fn base(&mut self, base: Arc<dyn Cache>) -> &mut Self {
        self.base = Some(base);
        self
    }

    pub fn eviction(&mut self, eviction: Eviction) -> &mut Self {
        self.config.eviction = eviction;
        self
    }

    pub fn size(&mut self, size: usize) -> &mut Self {
        self.config.size = size;
        self
    }

    pub fn flush_interval(&mut self, interval: Duration) -> &mut Self {
        self.config.flush_interval = Some(interval.as_millis() as u64);
        self
    }

    pub fn blocking(&mut self, blocking: bool) -> &mut Self {
        self.config.blocking = blocking;
        self
    }

    pub fn blocking_timeout(&mut self, timeout: Duration) -> &mut Self {
        self.config.blocking_timeout = timeout.as_millis() as u64;
        self
    }

    pub fn build(&self) -> Result<Arc<dyn Cache>> {
        let config = &self.config;
        if config.id.is_empty() {
            return Err(Error::cache("", "a cache needs an id"));
        }

        let mut cache: Arc<dyn Cache> = match &self.base {
            Some(base) => base.clone(),
            None => Arc::new(PerpetualCache::new(&config.id)),
        };

        if cache.id() != config.id {
            return Err(Error::cache(
                &config.id,
                format!("base store has id `{}`", cache.id()),
            ));
        }

        cache = match config.eviction {
            Eviction::Lru => Arc::new(LruCache::with_size(cache, config.size)),
            Eviction::Fifo => Arc::new(FifoCache::with_size(cache, config.size)),
            Eviction::Soft => Arc::new(ReferenceCache::with_size(cache, Retention::Soft, config.size)),
            Eviction::Weak => Arc::new(ReferenceCache::with_size(cache, Retention::Weak, config.size)),
        };

        if let Some(interval) = config.flush_interval() {
            cache = Arc::new(ScheduledCache::with_interval(cache, interval));
        }

        cache = Arc::new(LoggingCache::new(cache));

        if config.blocking {
            cache = Arc::new(BlockingCache::new(cache).with_timeout(config.blocking_timeout()));
        }

        tracing::debug!(cache = %config.id, eviction = ?config.eviction, "built cache");
        Ok(cache)
    }
}
