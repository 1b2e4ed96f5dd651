use proptest::prelude::*;
use rowmap_core::{stmt::RowBounds, stmt::Value, CacheKey};

fn value() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i32>().prop_map(Value::I32),
        any::<i64>().prop_map(Value::I64),
        "[a-z]{0,8}".prop_map(Value::String),
        proptest::collection::vec(any::<u8>(), 0..4).prop_map(Value::Bytes),
    ]
}

proptest! {
    #[test]
    fn same_sequence_same_key(values in proptest::collection::vec(value(), 0..8)) {
        let a = CacheKey::from_values(values.clone());
        let b = CacheKey::from_values(values);
        prop_assert_eq!(a.hash_code(), b.hash_code());
        prop_assert_eq!(a, b);
    }

    #[test]
    fn different_sequences_differ(
        a in proptest::collection::vec(value(), 0..6),
        b in proptest::collection::vec(value(), 0..6),
    ) {
        prop_assume!(a != b);
        prop_assert_ne!(CacheKey::from_values(a), CacheKey::from_values(b));
    }
}

#[test]
fn query_keys_cover_bounds_and_parameters() {
    let params = [Value::I64(1)];
    let a = CacheKey::for_query("blog.find", RowBounds::DEFAULT, "select", &params);
    let b = CacheKey::for_query("blog.find", RowBounds::new(10, 5), "select", &params);
    let c = CacheKey::for_query("blog.find", RowBounds::DEFAULT, "select", &[Value::I64(2)]);
    let a2 = CacheKey::for_query("blog.find", RowBounds::DEFAULT, "select", &params);

    assert_ne!(a, b);
    assert_ne!(a, c);
    assert_eq!(a, a2);
    assert_eq!(a.update_count(), 5);
}

#[test]
fn usable_as_map_key() {
    use std::collections::HashMap;

    let mut map = HashMap::new();
    map.insert(CacheKey::from_values(["blog", "1"]), 1);
    map.insert(CacheKey::from_values(["blog", "2"]), 2);

    assert_eq!(map.get(&CacheKey::from_values(["blog", "2"])), Some(&2));
    assert_eq!(map.get(&CacheKey::from_values(["blog", "3"])), None);
}

#[test]
fn hand_built_sequences_do_not_collide() {
    let keys = [
        CacheKey::from_values([Value::I64(1), Value::I64(2)]),
        CacheKey::from_values([Value::I64(2), Value::I64(1)]),
        CacheKey::from_values([Value::I32(1), Value::I64(2)]),
        CacheKey::from_values([Value::I64(1), Value::Null]),
        CacheKey::from_values([Value::Null, Value::I64(1)]),
        CacheKey::from_values([Value::I64(3)]),
        CacheKey::from_values([Value::from("1"), Value::from("2")]),
    ];

    for (i, a) in keys.iter().enumerate() {
        for (j, b) in keys.iter().enumerate() {
            assert_eq!(i == j, a == b, "{a} vs {b}");
        }
    }
}
