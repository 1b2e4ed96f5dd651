use crate::{Cache, TransactionalCache};
use rowmap_core::{stmt::Value, CacheKey, Result};

use by_address::ByAddress;
use indexmap::IndexMap;
use parking_lot::Mutex;
use std::sync::Arc;

/// The transactional views one session holds over shared caches.
///
/// Each shared cache gets its own [`TransactionalCache`] the first time the
/// session touches it; `commit` and `rollback` apply to all of them.
#[derive(Debug, Default)]
pub struct TransactionalCacheManager {
    caches: Mutex<IndexMap<ByAddress<Arc<dyn Cache>>, Arc<TransactionalCache>>>,
}

impl TransactionalCacheManager {
    pub fn new() -> TransactionalCacheManager {
        TransactionalCacheManager::default()
    }

    pub fn clear(&self, cache: &Arc<dyn Cache>) -> Result<()> {
        self.transactional_cache(cache).clear()
    }

    pub fn get(&self, cache: &Arc<dyn Cache>, key: &CacheKey) -> Result<Value> {
        self.transactional_cache(cache).get(key)
    }

    pub fn put(&self, cache: &Arc<dyn Cache>, key: CacheKey, value: Value) -> Result<()> {
        self.transactional_cache(cache).put(key, value)
    }

    pub fn commit(&self) -> Result<()> {
        for cache in self.touched() {
            cache.commit()?;
        }
        Ok(())
    }

    pub fn rollback(&self) {
        for cache in self.touched() {
            cache.rollback();
        }
    }

    fn touched(&self) -> Vec<Arc<TransactionalCache>> {
        self.caches.lock().values().cloned().collect()
    }

    fn transactional_cache(&self, cache: &Arc<dyn Cache>) -> Arc<TransactionalCache> {
        self.caches
            .lock()
            .entry(ByAddress(cache.clone()))
            .or_insert_with(|| Arc::new(TransactionalCache::new(cache.clone())))
            .clone()
    }
}
