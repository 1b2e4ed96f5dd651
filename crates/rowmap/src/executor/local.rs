use super::{extract, Executor};
use crate::{cursor::Cursor, handler::ResultSetHandler};
use rowmap_core::{
    driver::RowSource,
    object::{MetaObject, ObjectRef},
    schema::MappedStatement,
    stmt::{RowBounds, Type, Value},
    CacheKey, Error, Result, Schema,
};

use parking_lot::Mutex;
use std::{
    collections::HashMap,
    fmt,
    sync::{Arc, Weak},
};

/// Produces the resultsets of a statement. Implemented by the database
/// layer.
pub trait StatementRunner: fmt::Debug + Send + Sync {
    fn run(&self, statement: &MappedStatement, parameter: &Value) -> Result<Vec<Box<dyn RowSource>>>;
}

/// Runs statements through a [`StatementRunner`] and keeps their results
/// for the rest of the session.
///
/// Results are cached by invocation, which also resolves nested queries
/// that point back at a query still in progress: those are deferred and
/// filled in once the outermost query returns.
#[derive(Debug)]
pub struct LocalExecutor {
    schema: Arc<Schema>,
    runner: Arc<dyn StatementRunner>,

    /// Handed to the mapping engine for nested queries
    this: Weak<LocalExecutor>,

    state: Mutex<State>,
}

#[derive(Debug, Default)]
struct State {
    local_cache: HashMap<CacheKey, LocalEntry>,
    deferred_loads: Vec<DeferredLoad>,

    /// Depth of nested `query` calls
    query_stack: usize,
    closed: bool,
}

#[derive(Debug)]
enum LocalEntry {
    /// The query is running
    Placeholder,
    Ready(Vec<Value>),
}

/// A property waiting for a query that was still running.
#[derive(Debug)]
struct DeferredLoad {
    object: ObjectRef,
    property: String,
    key: CacheKey,
    target: Type,
}

impl LocalExecutor {
    pub fn new(schema: Arc<Schema>, runner: Arc<dyn StatementRunner>) -> Arc<LocalExecutor> {
        Arc::new_cyclic(|this| LocalExecutor {
            schema,
            runner,
            this: this.clone(),
            state: Mutex::new(State::default()),
        })
    }

    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    /// Runs the statement registered under `id` with default bounds.
    pub fn select_list(&self, id: &str, parameter: &Value) -> Result<Vec<Value>> {
        let statement = self.schema.statement(id)?.clone();
        self.query(&statement, parameter, RowBounds::DEFAULT, None)
    }

    /// Runs the statement registered under `id` and maps its first
    /// resultset lazily.
    pub fn query_cursor(&self, id: &str, parameter: &Value, bounds: RowBounds) -> Result<Cursor> {
        self.ensure_open()?;
        let statement = self.schema.statement(id)?.clone();
        let sources = self.runner.run(&statement, parameter)?;
        self.handler(&statement)?
            .bounds(bounds)
            .handle_cursor_result_sets(sources)
    }

    pub fn clear_local_cache(&self) {
        self.state.lock().local_cache.clear();
    }

    /// Drops the cached results. Further queries fail.
    pub fn close(&self) {
        let mut state = self.state.lock();
        state.closed = true;
        state.local_cache.clear();
        state.deferred_loads.clear();
    }

    pub fn is_closed(&self) -> bool {
        self.state.lock().closed
    }

    fn ensure_open(&self) -> Result<()> {
        if self.is_closed() {
            return Err(Error::invalid_state("executor was closed"));
        }
        Ok(())
    }

    fn handler(&self, statement: &Arc<MappedStatement>) -> Result<ResultSetHandler> {
        let Some(this) = self.this.upgrade() else {
            return Err(Error::invalid_state("executor was dropped"));
        };
        Ok(ResultSetHandler::new(self.schema.clone(), statement.clone()).executor(this))
    }

    fn query_from_database(
        &self,
        statement: &Arc<MappedStatement>,
        parameter: &Value,
        bounds: RowBounds,
        key: CacheKey,
    ) -> Result<Vec<Value>> {
        self.state
            .lock()
            .local_cache
            .insert(key.clone(), LocalEntry::Placeholder);

        let res = self.do_query(statement, parameter, bounds);

        let mut state = self.state.lock();
        state.local_cache.remove(&key);
        let list = res?;
        state
            .local_cache
            .insert(key, LocalEntry::Ready(list.clone()));
        Ok(list)
    }

    fn do_query(&self, statement: &Arc<MappedStatement>, parameter: &Value, bounds: RowBounds) -> Result<Vec<Value>> {
        tracing::trace!(statement = %statement.id, "running statement");
        let sources = self.runner.run(statement, parameter)?;
        self.handler(statement)?
            .bounds(bounds)
            .handle_result_sets(sources)
    }

    /// Results held for `key`, if complete.
    fn ready(&self, key: &CacheKey) -> Option<Vec<Value>> {
        match self.state.lock().local_cache.get(key) {
            Some(LocalEntry::Ready(list)) => Some(list.clone()),
            _ => None,
        }
    }

    fn load(&self, deferred: &DeferredLoad) -> Result<()> {
        let Some(list) = self.ready(&deferred.key) else {
            return Ok(());
        };
        let value = extract(list, &deferred.target, &*self.schema.object_factory)?;
        MetaObject::new(&deferred.object, &self.schema.types, &*self.schema.object_factory)
            .set_value(&deferred.property, value)
    }
}

impl Executor for LocalExecutor {
    fn query(
        &self,
        statement: &Arc<MappedStatement>,
        parameter: &Value,
        bounds: RowBounds,
        key: Option<&CacheKey>,
    ) -> Result<Vec<Value>> {
        let key = match key {
            Some(key) => key.clone(),
            None => self.create_cache_key(statement, parameter, bounds),
        };

        let cached = {
            let mut state = self.state.lock();
            if state.closed {
                return Err(Error::invalid_state("executor was closed"));
            }
            state.query_stack += 1;
            match state.local_cache.get(&key) {
                Some(LocalEntry::Ready(list)) => Some(list.clone()),
                _ => None,
            }
        };

        let res = match cached {
            Some(list) => Ok(list),
            None => self.query_from_database(statement, parameter, bounds, key),
        };

        let deferred_loads = {
            let mut state = self.state.lock();
            state.query_stack -= 1;
            if state.query_stack == 0 {
                std::mem::take(&mut state.deferred_loads)
            } else {
                vec![]
            }
        };

        let list = res?;
        for deferred in &deferred_loads {
            self.load(deferred)?;
        }
        Ok(list)
    }

    fn is_cached(&self, _statement: &MappedStatement, key: &CacheKey) -> bool {
        self.state.lock().local_cache.contains_key(key)
    }

    fn defer_load(
        &self,
        _statement: &MappedStatement,
        object: &ObjectRef,
        property: &str,
        key: &CacheKey,
        target: &Type,
    ) -> Result<()> {
        let deferred = DeferredLoad {
            object: object.clone(),
            property: property.to_string(),
            key: key.clone(),
            target: target.clone(),
        };

        if self.ready(key).is_some() {
            return self.load(&deferred);
        }

        self.state.lock().deferred_loads.push(deferred);
        Ok(())
    }

    fn commit(&self) -> Result<()> {
        self.ensure_open()?;
        self.clear_local_cache();
        Ok(())
    }

    fn rollback(&self) -> Result<()> {
        if !self.is_closed() {
            self.clear_local_cache();
        }
        Ok(())
    }
}
