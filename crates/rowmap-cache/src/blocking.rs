use crate::Cache;
use rowmap_core::{stmt::Value, CacheKey, Error, Result};

use parking_lot::{Condvar, Mutex};
use std::{
    collections::HashMap,
    sync::Arc,
    time::{Duration, Instant},
};

/// Lets one caller at a time fill a missing entry.
///
/// A `get` that misses keeps a lock on the key; other readers of that key
/// wait until the lock holder calls `put` (or `remove`, which only releases
/// the lock). A caller that misses and then never puts or removes blocks
/// the other readers of that key, or makes them fail with a lock timeout
/// when a timeout is set.
#[derive(Debug)]
pub struct BlockingCache {
    delegate: Arc<dyn Cache>,

    /// Zero waits forever
    timeout: Duration,

    locks: Mutex<HashMap<CacheKey, Arc<Latch>>>,
}

/// Opened once by the lock holder.
#[derive(Debug, Default)]
struct Latch {
    released: Mutex<bool>,
    cv: Condvar,
}

impl BlockingCache {
    pub fn new(delegate: Arc<dyn Cache>) -> BlockingCache {
        BlockingCache {
            delegate,
            timeout: Duration::ZERO,
            locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn set_timeout(&mut self, timeout: Duration) {
        self.timeout = timeout;
    }

    pub fn with_timeout(mut self, timeout: Duration) -> BlockingCache {
        self.set_timeout(timeout);
        self
    }

    fn acquire_lock(&self, key: &CacheKey) -> Result<()> {
        let deadline = (!self.timeout.is_zero()).then(|| Instant::now() + self.timeout);

        loop {
            let latch = {
                let mut locks = self.locks.lock();
                match locks.get(key) {
                    Some(latch) => latch.clone(),
                    None => {
                        locks.insert(key.clone(), Arc::new(Latch::default()));
                        return Ok(());
                    }
                }
            };

            tracing::debug!(cache = %self.id(), %key, "waiting for lock");
            if !latch.wait(deadline) {
                return Err(Error::lock_timeout(
                    self.id(),
                    key.to_string(),
                    self.timeout.as_millis() as u64,
                ));
            }
        }
    }

    /// Releasing a key that is not locked does nothing.
    fn release_lock(&self, key: &CacheKey) {
        let latch = self.locks.lock().remove(key);
        if let Some(latch) = latch {
            latch.release();
        }
    }
}

impl Latch {
    fn release(&self) {
        *self.released.lock() = true;
        self.cv.notify_all();
    }

    /// Waits for the release. Returns `false` if the deadline passed first.
    fn wait(&self, deadline: Option<Instant>) -> bool {
        let mut released = self.released.lock();
        while !*released {
            match deadline {
                Some(deadline) => {
                    if self.cv.wait_until(&mut released, deadline).timed_out() {
                        return *released;
                    }
                }
                None => self.cv.wait(&mut released),
            }
        }
        true
    }
}

impl Cache for BlockingCache {
    fn id(&self) -> &str {
        self.delegate.id()
    }

    fn put(&self, key: CacheKey, value: Value) -> Result<()> {
        let res = self.delegate.put(key.clone(), value);
        self.release_lock(&key);
        res
    }

    fn get(&self, key: &CacheKey) -> Result<Value> {
        self.acquire_lock(key)?;

        let value = match self.delegate.get(key) {
            Ok(value) => value,
            Err(err) => {
                self.release_lock(key);
                return Err(err);
            }
        };

        // On a miss the lock stays held until the caller puts the value
        if !value.is_null() {
            self.release_lock(key);
        }
        Ok(value)
    }

    /// Only releases the lock on `key`; the entry stays.
    fn remove(&self, key: &CacheKey) -> Result<Value> {
        self.release_lock(key);
        Ok(Value::Null)
    }

    fn clear(&self) -> Result<()> {
        self.delegate.clear()
    }

    fn size(&self) -> usize {
        self.delegate.size()
    }
}
