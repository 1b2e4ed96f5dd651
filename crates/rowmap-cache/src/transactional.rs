use crate::Cache;
use rowmap_core::{stmt::Value, CacheKey, Result};

use indexmap::{IndexMap, IndexSet};
use parking_lot::Mutex;
use std::sync::Arc;

/// Stages writes until the surrounding transaction commits.
///
/// Reads go to the shared inner cache; misses are remembered so that a
/// commit can record them and a rollback can release any lock a blocking
/// inner cache holds for them. Meant for one session at a time.
#[derive(Debug)]
pub struct TransactionalCache {
    delegate: Arc<dyn Cache>,
    state: Mutex<State>,
}

#[derive(Debug, Default)]
struct State {
    /// A clear was requested in this transaction
    clear_on_commit: bool,

    /// Writes to apply on commit
    entries_to_add_on_commit: IndexMap<CacheKey, Value>,

    /// Keys that missed in the inner cache
    entries_missed_in_cache: IndexSet<CacheKey>,
}

impl TransactionalCache {
    pub fn new(delegate: Arc<dyn Cache>) -> TransactionalCache {
        TransactionalCache {
            delegate,
            state: Mutex::new(State::default()),
        }
    }

    /// Applies the transaction to the inner cache: clears it if requested,
    /// then writes the staged entries and records the misses as absent.
    pub fn commit(&self) -> Result<()> {
        let state = std::mem::take(&mut *self.state.lock());

        if state.clear_on_commit {
            self.delegate.clear()?;
        }

        for (key, value) in &state.entries_to_add_on_commit {
            self.delegate.put(key.clone(), value.clone())?;
        }

        for key in state.entries_missed_in_cache {
            if !state.entries_to_add_on_commit.contains_key(&key) {
                self.delegate.put(key, Value::Null)?;
            }
        }

        Ok(())
    }

    /// Drops the staged entries and releases the misses in the inner cache.
    pub fn rollback(&self) {
        let state = std::mem::take(&mut *self.state.lock());

        for key in &state.entries_missed_in_cache {
            if let Err(err) = self.delegate.remove(key) {
                tracing::warn!(
                    cache = %self.id(),
                    %key,
                    error = %err,
                    "unexpected failure while releasing a missed entry on rollback"
                );
            }
        }
    }
}

impl Cache for TransactionalCache {
    fn id(&self) -> &str {
        self.delegate.id()
    }

    /// Staged until commit.
    fn put(&self, key: CacheKey, value: Value) -> Result<()> {
        self.state.lock().entries_to_add_on_commit.insert(key, value);
        Ok(())
    }

    fn get(&self, key: &CacheKey) -> Result<Value> {
        let value = self.delegate.get(key)?;

        let mut state = self.state.lock();
        if value.is_null() {
            state.entries_missed_in_cache.insert(key.clone());
        }

        if state.clear_on_commit {
            return Ok(Value::Null);
        }
        Ok(value)
    }

    /// Entries are never removed through a transaction.
    fn remove(&self, _key: &CacheKey) -> Result<Value> {
        Ok(Value::Null)
    }

    fn clear(&self) -> Result<()> {
        let mut state = self.state.lock();
        state.clear_on_commit = true;
        state.entries_to_add_on_commit.clear();
        Ok(())
    }

    fn size(&self) -> usize {
        self.delegate.size()
    }
}
