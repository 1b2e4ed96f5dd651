use rowmap_cache::{Cache, FifoCache, LruCache, PerpetualCache};
use rowmap_core::{stmt::Value, CacheKey};

use pretty_assertions::assert_eq;

use std::sync::Arc;

fn key(i: i64) -> CacheKey {
    CacheKey::from_values([Value::from("user.find"), Value::I64(i)])
}

fn base() -> Arc<dyn Cache> {
    Arc::new(PerpetualCache::new("users"))
}

#[test]
fn lru_evicts_least_recently_inserted() {
    let cache = LruCache::with_size(base(), 3);

    for i in 0..4 {
        cache.put(key(i), Value::I64(i)).unwrap();
    }

    assert_eq!(cache.size(), 3);
    assert!(cache.get(&key(0)).unwrap().is_null());
    for i in 1..4 {
        assert_eq!(cache.get(&key(i)).unwrap(), Value::I64(i));
    }
}

#[test]
fn lru_read_protects_key() {
    let cache = LruCache::with_size(base(), 3);

    for i in 0..3 {
        cache.put(key(i), Value::I64(i)).unwrap();
    }

    // Touching 0 makes 1 the least recently used
    cache.get(&key(0)).unwrap();
    cache.put(key(3), Value::I64(3)).unwrap();

    assert_eq!(cache.get(&key(0)).unwrap(), Value::I64(0));
    assert!(cache.get(&key(1)).unwrap().is_null());
}

#[test]
fn lru_overwrite_does_not_evict() {
    let cache = LruCache::with_size(base(), 2);

    cache.put(key(0), Value::I64(0)).unwrap();
    cache.put(key(1), Value::I64(1)).unwrap();
    cache.put(key(1), Value::I64(10)).unwrap();

    assert_eq!(cache.size(), 2);
    assert_eq!(cache.get(&key(0)).unwrap(), Value::I64(0));
    assert_eq!(cache.get(&key(1)).unwrap(), Value::I64(10));
}

#[test]
fn lru_shrinking_evicts() {
    let cache = LruCache::with_size(base(), 4);
    for i in 0..4 {
        cache.put(key(i), Value::I64(i)).unwrap();
    }

    cache.set_size(2).unwrap();

    assert_eq!(cache.capacity(), 2);
    assert_eq!(cache.size(), 2);
    assert!(cache.get(&key(1)).unwrap().is_null());
    assert_eq!(cache.get(&key(3)).unwrap(), Value::I64(3));
}

#[test]
fn fifo_ignores_reads() {
    let cache = FifoCache::with_size(base(), 3);

    for i in 0..3 {
        cache.put(key(i), Value::I64(i)).unwrap();
    }

    // Reads do not change the eviction order
    cache.get(&key(0)).unwrap();
    cache.put(key(3), Value::I64(3)).unwrap();
    assert!(cache.get(&key(0)).unwrap().is_null());

    cache.put(key(4), Value::I64(4)).unwrap();
    assert!(cache.get(&key(1)).unwrap().is_null());
    assert_eq!(cache.get(&key(2)).unwrap(), Value::I64(2));
    assert_eq!(cache.size(), 3);
}

#[test]
fn fifo_default_capacity() {
    let cache = FifoCache::new(base());
    assert_eq!(cache.capacity(), rowmap_cache::DEFAULT_SIZE);
}

#[test]
fn clear_resets_order() {
    let cache = FifoCache::with_size(base(), 2);
    cache.put(key(0), Value::I64(0)).unwrap();
    cache.put(key(1), Value::I64(1)).unwrap();
    cache.clear().unwrap();

    cache.put(key(2), Value::I64(2)).unwrap();
    cache.put(key(3), Value::I64(3)).unwrap();
    assert_eq!(cache.size(), 2);
}

#[test]
fn lru_is_shared_across_threads() {
    let cache = Arc::new(LruCache::with_size(base(), 64));

    let handles: Vec<_> = (0..4)
        .map(|t| {
            let cache = cache.clone();
            std::thread::spawn(move || {
                for i in 0..100 {
                    let k = key(t * 1000 + i);
                    cache.put(k.clone(), Value::I64(i)).unwrap();
                    cache.get(&k).unwrap();
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(cache.size(), 64);
}
