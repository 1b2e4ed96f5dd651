use crate::{Cache, DEFAULT_SIZE};
use rowmap_core::{stmt::Value, CacheKey, Result};

use parking_lot::Mutex;
use std::{num::NonZeroUsize, sync::Arc};

/// Evicts the least recently used entry once more than `size` keys are
/// held. Both reads and writes count as a use.
#[derive(Debug)]
pub struct LruCache {
    delegate: Arc<dyn Cache>,

    /// Access order of the keys held by `delegate`
    keys: Mutex<::lru::LruCache<CacheKey, ()>>,
}

impl LruCache {
    pub fn new(delegate: Arc<dyn Cache>) -> LruCache {
        LruCache::with_size(delegate, DEFAULT_SIZE)
    }

    /// A size of zero is treated as one.
    pub fn with_size(delegate: Arc<dyn Cache>, size: usize) -> LruCache {
        let size = NonZeroUsize::new(size).unwrap_or(NonZeroUsize::MIN);
        LruCache {
            delegate,
            keys: Mutex::new(::lru::LruCache::new(size)),
        }
    }

    pub fn capacity(&self) -> usize {
        self.keys.lock().cap().get()
    }

    /// Changes the capacity, evicting least recently used entries if the
    /// cache holds more than `size`.
    pub fn set_size(&self, size: usize) -> Result<()> {
        let size = NonZeroUsize::new(size).unwrap_or(NonZeroUsize::MIN);
        let mut evicted = vec![];
        {
            let mut keys = self.keys.lock();
            while keys.len() > size.get() {
                match keys.pop_lru() {
                    Some((key, ())) => evicted.push(key),
                    None => break,
                }
            }
            keys.resize(size);
        }

        for key in evicted {
            self.delegate.remove(&key)?;
        }
        Ok(())
    }
}

impl Cache for LruCache {
    fn id(&self) -> &str {
        self.delegate.id()
    }

    fn put(&self, key: CacheKey, value: Value) -> Result<()> {
        self.delegate.put(key.clone(), value)?;

        let evicted = match self.keys.lock().push(key.clone(), ()) {
            // `push` also hands back the previous entry of the same key
            Some((evicted, ())) if evicted != key => Some(evicted),
            _ => None,
        };

        if let Some(eldest) = evicted {
            tracing::trace!(cache = %self.id(), key = %eldest, "evicting least recently used entry");
            self.delegate.remove(&eldest)?;
        }
        Ok(())
    }

    fn get(&self, key: &CacheKey) -> Result<Value> {
        self.keys.lock().get(key);
        self.delegate.get(key)
    }

    fn remove(&self, key: &CacheKey) -> Result<Value> {
        self.keys.lock().pop(key);
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
