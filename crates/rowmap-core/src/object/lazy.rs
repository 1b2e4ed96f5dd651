use crate::{stmt::Value, Result};

use std::{fmt, sync::Arc};

/// A property cell that is either loaded or waiting on a loader.
///
/// The first read of a deferred cell runs the loader and replaces the cell
/// with its result, so a loader runs at most once per cell.
#[derive(Debug, Clone)]
pub enum Lazy {
    Loaded(Value),
    Deferred(Loader),
}

/// Callback producing the value of a deferred property, usually by running
/// a nested query.
#[derive(Clone)]
pub struct Loader(Arc<dyn Fn() -> Result<Value> + Send + Sync>);

/// How an object with deferred properties reacts to access.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LazyOptions {
    /// Load every deferred property on the first access to any property
    pub aggressive: bool,

    /// Method names that load every deferred property when invoked
    pub trigger_methods: Vec<String>,
}

impl Lazy {
    pub fn is_loaded(&self) -> bool {
        matches!(self, Lazy::Loaded(_))
    }

    pub fn as_loaded(&self) -> Option<&Value> {
        match self {
            Lazy::Loaded(value) => Some(value),
            Lazy::Deferred(_) => None,
        }
    }
}

impl Loader {
    pub fn new(f: impl Fn() -> Result<Value> + Send + Sync + 'static) -> Loader {
        Loader(Arc::new(f))
    }

    pub fn load(&self) -> Result<Value> {
        (self.0)()
    }
}

impl fmt::Debug for Loader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Loader(..)")
    }
}

impl LazyOptions {
    pub fn is_trigger(&self, method: &str) -> bool {
        self.trigger_methods.iter().any(|m| m == method)
    }
}
