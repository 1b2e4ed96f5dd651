use crate::{Cache, DEFAULT_SIZE};
use rowmap_core::{stmt::Value, CacheKey, Result};

use parking_lot::Mutex;
use std::{collections::VecDeque, sync::Arc};

/// Evicts entries in insertion order once more than `size` keys are held.
/// Reads do not affect the order.
#[derive(Debug)]
pub struct FifoCache {
    delegate: Arc<dyn Cache>,
    size: usize,
    keys: Mutex<VecDeque<CacheKey>>,
}

impl FifoCache {
    pub fn new(delegate: Arc<dyn Cache>) -> FifoCache {
        FifoCache::with_size(delegate, DEFAULT_SIZE)
    }

    pub fn with_size(delegate: Arc<dyn Cache>, size: usize) -> FifoCache {
        FifoCache {
            delegate,
            size,
            keys: Mutex::new(VecDeque::new()),
        }
    }

    pub fn capacity(&self) -> usize {
        self.size
    }
}

impl Cache for FifoCache {
    fn id(&self) -> &str {
        self.delegate.id()
    }

    fn put(&self, key: CacheKey, value: Value) -> Result<()> {
        let evicted = {
            let mut keys = self.keys.lock();
            // Overwriting keeps the original position
            if !keys.contains(&key) {
                keys.push_back(key.clone());
            }
            if keys.len() > self.size {
                keys.pop_front()
            } else {
                None
            }
        };

        if let Some(oldest) = evicted {
            self.delegate.remove(&oldest)?;
        }

        self.delegate.put(key, value)
    }

    fn get(&self, key: &CacheKey) -> Result<Value> {
        self.delegate.get(key)
    }

    fn remove(&self, key: &CacheKey) -> Result<Value> {
        self.keys.lock().retain(|k| k != key);
        self.delegate.remove(key)
    }

    fn clear(&self) -> Result<()> {
        self.keys.lock().clear();
        self.delegate.clear()
    }

    fn size(&self) -> usize {
        self.delegate.size()
    }
}
