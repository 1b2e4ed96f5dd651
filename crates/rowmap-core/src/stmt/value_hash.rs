use super::Value;

use std::{
    collections::hash_map::DefaultHasher,
    hash::{Hash, Hasher},
};

/// Stable 32-bit hash code of a value, used by [`CacheKey`](crate::CacheKey).
///
/// Null hashes to 1. Lists and byte arrays hash by content.
pub(crate) fn hash_code(value: &Value) -> i32 {
    if value.is_null() {
        return 1;
    }

    // `DefaultHasher::new()` uses fixed keys, so codes are stable within a build.
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    let hash = hasher.finish();
    (hash ^ (hash >> 32)) as i32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_hashes_to_one() {
        assert_eq!(hash_code(&Value::Null), 1);
    }

    #[test]
    fn equal_values_hash_equal() {
        assert_eq!(
            hash_code(&Value::from(vec![1_u8, 2, 3])),
            hash_code(&Value::from(vec![1_u8, 2, 3]))
        );
        assert_eq!(
            hash_code(&Value::from(vec![Value::I64(7), Value::Null])),
            hash_code(&Value::from(vec![Value::I64(7), Value::Null]))
        );
    }
}
