use crate::DEFAULT_SIZE;

use serde::Deserialize;
use std::time::Duration;

/// Declarative description of a cache chain.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Identifier of the cache, usually the namespace it serves
    pub id: String,

    pub eviction: Eviction,

    /// Capacity of the eviction policy
    pub size: usize,

    /// Clears the whole cache this often, in milliseconds
    pub flush_interval: Option<u64>,

    /// Lets one caller at a time fill a missing entry
    pub blocking: bool,

    /// How long a blocked reader waits, in milliseconds. Zero waits forever.
    pub blocking_timeout: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Eviction {
    #[default]
    Lru,
    Fifo,
    Soft,
    Weak,
}

impl CacheConfig {
    pub fn new(id: impl Into<String>) -> CacheConfig {
        CacheConfig {
            id: id.into(),
            ..CacheConfig::default()
        }
    }

    pub fn flush_interval(&self) -> Option<Duration> {
        self.flush_interval.map(Duration::from_millis)
    }

    pub fn blocking_timeout(&self) -> Duration {
        Duration::from_millis(self.blocking_timeout)
    }
}

impl Default for CacheConfig {
    fn default() -> CacheConfig {
        CacheConfig {
            id: String::new(),
            eviction: Eviction::Lru,
            size: DEFAULT_SIZE,
            flush_interval: None,
            blocking: false,
            blocking_timeout: 0,
        }
    }
}
