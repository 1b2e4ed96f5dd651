use super::Executor;
use rowmap_cache::{Cache, TransactionalCacheManager};
use rowmap_core::{
    object::ObjectRef,
    schema::MappedStatement,
    stmt::{RowBounds, Type, Value},
    CacheKey, Result,
};

use std::{collections::HashMap, sync::Arc};

/// Serves statements from shared second-level caches.
///
/// A statement uses the cache whose id is the statement's namespace (the
/// part of its id before the last `.`). Results read or produced during a
/// session reach the shared cache only when the session commits.
#[derive(Debug)]
pub struct CachingExecutor {
    delegate: Arc<dyn Executor>,
    caches: HashMap<String, Arc<dyn Cache>>,
    tcm: TransactionalCacheManager,
}

impl CachingExecutor {
    pub fn new(delegate: Arc<dyn Executor>) -> CachingExecutor {
        CachingExecutor {
            delegate,
            caches: HashMap::new(),
            tcm: TransactionalCacheManager::new(),
        }
    }

    /// Registers a shared cache for the namespace named by its id.
    pub fn cache(mut self, cache: Arc<dyn Cache>) -> Self {
        self.caches.insert(cache.id().to_string(), cache);
        self
    }

    fn cache_for(&self, statement: &MappedStatement) -> Option<&Arc<dyn Cache>> {
        let (namespace, _) = statement.id.rsplit_once('.')?;
        self.caches.get(namespace)
    }
}

impl Executor for CachingExecutor {
    fn query(
        &self,
        statement: &Arc<MappedStatement>,
        parameter: &Value,
        bounds: RowBounds,
        key: Option<&CacheKey>,
    ) -> Result<Vec<Value>> {
        let Some(cache) = self.cache_for(statement) else {
            return self.delegate.query(statement, parameter, bounds, key);
        };

        let key = match key {
            Some(key) => key.clone(),
            None => self.create_cache_key(statement, parameter, bounds),
        };

        if let Value::List(list) = self.tcm.get(cache, &key)? {
            tracing::trace!(statement = %statement.id, "second-level cache hit");
            return Ok(list);
        }

        let list = self.delegate.query(statement, parameter, bounds, Some(&key))?;
        self.tcm.put(cache, key, Value::List(list.clone()))?;
        Ok(list)
    }

    fn create_cache_key(&self, statement: &MappedStatement, parameter: &Value, bounds: RowBounds) -> CacheKey {
        self.delegate.create_cache_key(statement, parameter, bounds)
    }

    fn is_cached(&self, statement: &MappedStatement, key: &CacheKey) -> bool {
        self.delegate.is_cached(statement, key)
    }

    fn defer_load(
        &self,
        statement: &MappedStatement,
        object: &ObjectRef,
        property: &str,
        key: &CacheKey,
        target: &Type,
    ) -> Result<()> {
        self.delegate.defer_load(statement, object, property, key, target)
    }

    fn commit(&self) -> Result<()> {
        self.delegate.commit()?;
        self.tcm.commit()
    }

    fn rollback(&self) -> Result<()> {
        let res = self.delegate.rollback();
        self.tcm.rollback();
        res
    }
}
