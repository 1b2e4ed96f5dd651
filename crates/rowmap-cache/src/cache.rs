use rowmap_core::{stmt::Value, CacheKey, Result};

use std::{fmt, sync::Arc};

/// A keyed store of query results.
///
/// `Value::Null` stands for "absent": `get` returns it on a miss and `put`
/// may store it to record that a key is known to have no entry. Caches are
/// shared between sessions, so every operation takes `&self`.
pub trait Cache: fmt::Debug + Send + Sync {
    /// Identifier of the cache, usually the namespace it serves.
    fn id(&self) -> &str;

    fn put(&self, key: CacheKey, value: Value) -> Result<()>;

    fn get(&self, key: &CacheKey) -> Result<Value>;

    /// Removes an entry, returning it.
    fn remove(&self, key: &CacheKey) -> Result<Value>;

    fn clear(&self) -> Result<()>;

    /// Number of stored entries.
    fn size(&self) -> usize;
}

impl<T: Cache + ?Sized> Cache for Arc<T> {
    fn id(&self) -> &str {
        (**self).id()
    }

    fn put(&self, key: CacheKey, value: Value) -> Result<()> {
        (**self).put(key, value)
    }

    fn get(&self, key: &CacheKey) -> Result<Value> {
        (**self).get(key)
    }

    fn remove(&self, key: &CacheKey) -> Result<Value> {
        (**self).remove(key)
    }

    fn clear(&self) -> Result<()> {
        (**self).clear()
    }

    fn size(&self) -> usize {
        (**self).size()
    }
}
