use rowmap_cache::{BlockingCache, Cache, PerpetualCache};
use rowmap_core::{stmt::Value, CacheKey};

use std::{
    sync::{mpsc, Arc},
    thread,
    time::Duration,
};

fn key() -> CacheKey {
    CacheKey::from_values(["user.find", "1"])
}

fn cache(timeout: Duration) -> Arc<BlockingCache> {
    Arc::new(BlockingCache::new(Arc::new(PerpetualCache::new("users"))).with_timeout(timeout))
}

#[test]
fn hit_does_not_hold_lock() {
    let cache = cache(Duration::from_millis(50));
    cache.put(key(), Value::from("alice")).unwrap();

    assert_eq!(cache.get(&key()).unwrap(), Value::from("alice"));
    assert_eq!(cache.get(&key()).unwrap(), Value::from("alice"));
}

#[test]
fn second_reader_sees_first_readers_put() {
    let cache = cache(Duration::ZERO);

    // The first reader misses and holds the lock
    assert!(cache.get(&key()).unwrap().is_null());

    let (tx, rx) = mpsc::channel();
    let reader = {
        let cache = cache.clone();
        thread::spawn(move || {
            tx.send(()).unwrap();
            cache.get(&key()).unwrap()
        })
    };

    rx.recv().unwrap();
    thread::sleep(Duration::from_millis(20));
    cache.put(key(), Value::from("alice")).unwrap();

    assert_eq!(reader.join().unwrap(), Value::from("alice"));
}

#[test]
fn waiter_times_out() {
    let cache = cache(Duration::from_millis(30));
    assert!(cache.get(&key()).unwrap().is_null());

    let waiter = {
        let cache = cache.clone();
        thread::spawn(move || cache.get(&key()))
    };

    let err = waiter.join().unwrap().unwrap_err();
    assert!(err.is_lock_timeout());
    assert!(err.is_retryable());
}

#[test]
fn remove_releases_lock_only() {
    let cache = cache(Duration::from_millis(30));
    cache.put(key(), Value::from("alice")).unwrap();

    // Releasing a key nobody holds is harmless
    assert!(cache.remove(&key()).unwrap().is_null());
    assert_eq!(cache.size(), 1);

    let other = CacheKey::from_values(["user.find", "2"]);
    assert!(cache.get(&other).unwrap().is_null());
    cache.remove(&other).unwrap();

    // Not blocked any more
    assert!(cache.get(&other).unwrap().is_null());
}

#[test]
fn distinct_keys_do_not_block_each_other() {
    let cache = cache(Duration::from_millis(30));
    assert!(cache.get(&key()).unwrap().is_null());

    let other = CacheKey::from_values(["user.find", "2"]);
    let reader = {
        let cache = cache.clone();
        thread::spawn(move || cache.get(&other))
    };

    assert!(reader.join().unwrap().unwrap().is_null());
}
