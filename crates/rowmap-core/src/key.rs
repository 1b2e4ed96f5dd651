use crate::stmt::{hash_code, RowBounds, Value};

use std::{fmt, hash};

const DEFAULT_MULTIPLIER: i32 = 37;
const DEFAULT_HASHCODE: i32 = 17;

/// Structural, order-sensitive identity built from a sequence of values.
///
/// Used as the key of the second-level cache (statement + parameters +
/// bounds) and to recognize rows that belong to an already mapped object
/// while collapsing joined rows.
///
/// The rolling hash alone does not decide equality: two keys are equal only
/// when hash, checksum, update count and every contributed value match.
///
/// A row that contributes nothing identifying has no key at all; the engine
/// passes such keys around as `Option<CacheKey>` so an empty identity can
/// never be used for grouping or caching.
#[derive(Clone)]
pub struct CacheKey {
    hashcode: i32,
    checksum: i64,
    count: i32,
    values: Vec<Value>,
}

impl CacheKey {
    pub fn new() -> CacheKey {
        CacheKey {
            hashcode: DEFAULT_HASHCODE,
            checksum: 0,
            count: 0,
            values: vec![],
        }
    }

    pub fn from_values<I>(values: I) -> CacheKey
    where
        I: IntoIterator,
        I::Item: Into<Value>,
    {
        let mut key = CacheKey::new();
        key.update_all(values);
        key
    }

    /// Key for a statement invocation: statement id, paging bounds, the
    /// statement text and every bound parameter value, in order.
    pub fn for_query(statement: &str, bounds: RowBounds, sql: &str, parameters: &[Value]) -> CacheKey {
        let mut key = CacheKey::new();
        key.update(statement);
        key.update(bounds.offset as i64);
        key.update(bounds.limit as i64);
        key.update(sql);
        for parameter in parameters {
            key.update(parameter.clone());
        }
        key
    }

    /// Contributes a value to the key.
    pub fn update(&mut self, value: impl Into<Value>) {
        let value = value.into();
        let mut base = hash_code(&value);

        self.count += 1;
        self.checksum += base as i64;
        base = base.wrapping_mul(self.count);

        self.hashcode = DEFAULT_MULTIPLIER
            .wrapping_mul(self.hashcode)
            .wrapping_add(base);

        self.values.push(value);
    }

    pub fn update_all<I>(&mut self, values: I)
    where
        I: IntoIterator,
        I::Item: Into<Value>,
    {
        for value in values {
            self.update(value);
        }
    }

    /// Number of values contributed so far.
    pub fn update_count(&self) -> usize {
        self.values.len()
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn hash_code(&self) -> i32 {
        self.hashcode
    }

    pub fn checksum(&self) -> i64 {
        self.checksum
    }

    /// Builds the identity of a nested row from its own key and its parent's.
    ///
    /// Both keys must be non-trivial (at least two contributions, i.e. an id
    /// plus one value); otherwise there is no combined identity.
    pub fn combine(key: &CacheKey, parent: &CacheKey) -> Option<CacheKey> {
        if key.update_count() < 2 || parent.update_count() < 2 {
            return None;
        }

        let mut combined = key.clone();
        combined.update_all(parent.values.iter().cloned());
        Some(combined)
    }
}

impl Default for CacheKey {
    fn default() -> Self {
        CacheKey::new()
    }
}

impl PartialEq for CacheKey {
    fn eq(&self, other: &Self) -> bool {
        if self.hashcode != other.hashcode {
            return false;
        }

        if self.checksum != other.checksum {
            return false;
        }

        if self.count != other.count {
            return false;
        }

        self.values == other.values
    }
}

impl Eq for CacheKey {}

impl hash::Hash for CacheKey {
    fn hash<H: hash::Hasher>(&self, state: &mut H) {
        state.write_i32(self.hashcode);
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.hashcode, self.checksum)?;
        for value in &self.values {
            write!(f, ":{value}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CacheKey({self})")
    }
}
