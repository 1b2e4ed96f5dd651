use crate::Cache;
use rowmap_core::{stmt::Value, CacheKey, Result};

use parking_lot::Mutex;
use std::collections::HashMap;

/// Unbounded map of entries; the innermost store of every chain.
#[derive(Debug)]
pub struct PerpetualCache {
    id: String,
    entries: Mutex<HashMap<CacheKey, Value>>,
}

impl PerpetualCache {
    pub fn new(id: impl Into<String>) -> PerpetualCache {
        PerpetualCache {
            id: id.into(),
            entries: Mutex::new(HashMap::new()),
        }
    }
}

impl Cache for PerpetualCache {
    fn id(&self) -> &str {
        &self.id
    }

    fn put(&self, key: CacheKey, value: Value) -> Result<()> {
        self.entries.lock().insert(key, value);
        Ok(())
    }

    fn get(&self, key: &CacheKey) -> Result<Value> {
        Ok(self.entries.lock().get(key).cloned().unwrap_or_default())
    }

    fn remove(&self, key: &CacheKey) -> Result<Value> {
        Ok(self.entries.lock().remove(key).unwrap_or_default())
    }

    fn clear(&self) -> Result<()> {
        self.entries.lock().clear();
        Ok(())
    }

    fn size(&self) -> usize {
        self.entries.lock().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn put_get_remove() {
        let cache = PerpetualCache::new("users");
        let key = CacheKey::from_values(["user.find", "1"]);

        assert!(cache.get(&key).unwrap().is_null());

        cache.put(key.clone(), Value::from("alice")).unwrap();
        assert_eq!(cache.get(&key).unwrap(), Value::from("alice"));
        assert_eq!(cache.size(), 1);

        assert_eq!(cache.remove(&key).unwrap(), Value::from("alice"));
        assert_eq!(cache.size(), 0);
    }

    #[test]
    fn null_entries_count() {
        let cache = PerpetualCache::new("users");
        cache.put(CacheKey::from_values(["miss"]), Value::Null).unwrap();
        assert_eq!(cache.size(), 1);
    }
}
