use crate::{Cache, DEFAULT_SIZE};
use rowmap_core::{stmt::Value, CacheKey, Result};

use indexmap::IndexSet;
use parking_lot::Mutex;
use std::{collections::VecDeque, sync::Arc};

/// Entries read most recently are kept regardless of retention.
pub const DEFAULT_HOT_SIZE: usize = 256;

/// How many entries a [`ReferenceCache`] retains.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Retention {
    /// Up to the cache size; entries outside the hot ring are reclaimed
    /// oldest first once the cache is full.
    Soft,

    /// Only as many entries as the hot ring holds.
    Weak,
}

/// Reclaims entries that have not been read recently.
///
/// A ring of the most recently read keys protects hot entries. When the
/// cache holds more than its retention limit, the oldest entries outside
/// the ring are removed from the inner cache. A reclaimed entry reads as
/// absent.
#[derive(Debug)]
pub struct ReferenceCache {
    delegate: Arc<dyn Cache>,
    retention: Retention,
    size: usize,
    state: Mutex<State>,
}

#[derive(Debug)]
struct State {
    /// Keys held by the inner cache, oldest first
    live: IndexSet<CacheKey>,

    /// Most recently read keys, most recent first
    hot: VecDeque<CacheKey>,
    hot_size: usize,
}

impl ReferenceCache {
    pub fn new(delegate: Arc<dyn Cache>, retention: Retention) -> ReferenceCache {
        ReferenceCache::with_size(delegate, retention, DEFAULT_SIZE)
    }

    pub fn with_size(delegate: Arc<dyn Cache>, retention: Retention, size: usize) -> ReferenceCache {
        ReferenceCache {
            delegate,
            retention,
            size,
            state: Mutex::new(State {
                live: IndexSet::new(),
                hot: VecDeque::new(),
                hot_size: DEFAULT_HOT_SIZE,
            }),
        }
    }

    pub fn retention(&self) -> Retention {
        self.retention
    }

    /// Sets how many recently read entries are protected.
    pub fn set_hot_size(&self, hot_size: usize) {
        let mut state = self.state.lock();
        state.hot_size = hot_size;
        state.hot.truncate(hot_size);
    }

    fn limit(&self, state: &State) -> usize {
        match self.retention {
            Retention::Soft => self.size,
            Retention::Weak => state.hot_size,
        }
    }

    /// Picks the entries to reclaim, oldest first.
    fn reclaim(&self, state: &mut State) -> Vec<CacheKey> {
        let limit = self.limit(state);
        let mut reclaimed = vec![];

        let mut i = 0;
        while state.live.len() > limit && i < state.live.len() {
            let candidate = &state.live[i];
            if state.hot.contains(candidate) {
                i += 1;
                continue;
            }
            if let Some(key) = state.live.shift_remove_index(i) {
                reclaimed.push(key);
            }
        }

        reclaimed
    }
}

impl Cache for ReferenceCache {
    fn id(&self) -> &str {
        self.delegate.id()
    }

    fn put(&self, key: CacheKey, value: Value) -> Result<()> {
        self.delegate.put(key.clone(), value)?;

        let reclaimed = {
            let mut state = self.state.lock();
            state.live.insert(key);
            self.reclaim(&mut state)
        };

        for key in &reclaimed {
            self.delegate.remove(key)?;
        }
        Ok(())
    }

    fn get(&self, key: &CacheKey) -> Result<Value> {
        let value = self.delegate.get(key)?;
        let mut state = self.state.lock();

        if value.is_null() {
            // Gone from the inner cache; forget the stale key
            if state.live.shift_remove(key) {
                state.hot.retain(|k| k != key);
                drop(state);
                self.delegate.remove(key)?;
            }
            return Ok(Value::Null);
        }

        state.hot.retain(|k| k != key);
        state.hot.push_front(key.clone());
        let hot_size = state.hot_size;
        state.hot.truncate(hot_size);

        Ok(value)
    }

    fn remove(&self, key: &CacheKey) -> Result<Value> {
        {
            let mut state = self.state.lock();
            state.live.shift_remove(key);
            state.hot.retain(|k| k != key);
        }
        self.delegate.remove(key)
    }

    fn clear(&self) -> Result<()> {
        {
            let mut state = self.state.lock();
            state.live.clear();
            state.hot.clear();
        }
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

    fn key(i: i64) -> CacheKey {
        CacheKey::from_values([Value::I64(i)])
    }

    #[test]
    fn weak_retention_keeps_hot_entries() {
        let cache = ReferenceCache::new(Arc::new(PerpetualCache::new("weak")), Retention::Weak);
        cache.set_hot_size(2);

        cache.put(key(1), Value::I64(1)).unwrap();
        cache.put(key(2), Value::I64(2)).unwrap();
        assert_eq!(cache.get(&key(1)).unwrap(), Value::I64(1));

        // 2 is the oldest entry not read recently
        cache.put(key(3), Value::I64(3)).unwrap();
        assert!(cache.get(&key(2)).unwrap().is_null());
        assert_eq!(cache.get(&key(1)).unwrap(), Value::I64(1));
        assert_eq!(cache.size(), 2);
    }

    #[test]
    fn soft_retention_uses_size() {
        let cache =
            ReferenceCache::with_size(Arc::new(PerpetualCache::new("soft")), Retention::Soft, 3);

        for i in 0..5 {
            cache.put(key(i), Value::I64(i)).unwrap();
        }

        assert_eq!(cache.size(), 3);
        assert!(cache.get(&key(0)).unwrap().is_null());
        assert!(cache.get(&key(1)).unwrap().is_null());
        assert_eq!(cache.get(&key(4)).unwrap(), Value::I64(4));
    }

    #[test]
    fn entries_removed_underneath_read_as_absent() {
        let inner = Arc::new(PerpetualCache::new("soft"));
        let cache = ReferenceCache::new(inner.clone(), Retention::Soft);

        cache.put(key(1), Value::I64(1)).unwrap();
        inner.remove(&key(1)).unwrap();

        assert!(cache.get(&key(1)).unwrap().is_null());
    }
}
