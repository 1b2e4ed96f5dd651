//! Second-level cache stores for mapped query results.
//!
//! A [`PerpetualCache`] holds the entries; decorators each wrap one inner
//! cache and add a single policy on top of it. [`CacheBuilder`] assembles
//! the usual chain from a [`CacheConfig`].

mod blocking;
pub use blocking::BlockingCache;

mod builder;
pub use builder::CacheBuilder;

mod cache;
pub use cache::Cache;

mod config;
pub use config::{CacheConfig, Eviction};

mod fifo;
pub use fifo::FifoCache;

mod logging;
pub use logging::LoggingCache;

mod lru;
pub use self::lru::LruCache;

mod manager;
pub use manager::TransactionalCacheManager;

mod perpetual;
pub use perpetual::PerpetualCache;

mod reference;
pub use reference::{ReferenceCache, Retention};

mod scheduled;
pub use scheduled::ScheduledCache;

mod transactional;
pub use transactional::TransactionalCache;

pub use rowmap_core::{stmt::Value, CacheKey, Error, Result};

/// Capacity of the eviction decorators unless configured otherwise.
pub const DEFAULT_SIZE: usize = 1024;
