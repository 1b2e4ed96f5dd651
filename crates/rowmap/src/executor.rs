//! Running statements, including the nested queries of result mappings.

mod caching;
pub use caching::CachingExecutor;

mod local;
pub use local::{LocalExecutor, StatementRunner};

use rowmap_core::{
    object::{ObjectFactory, ObjectRef},
    schema::MappedStatement,
    stmt::{RowBounds, Type, Value},
    CacheKey, Error, Result,
};

use std::{fmt, sync::Arc};

/// Runs mapped statements on behalf of the mapping engine.
pub trait Executor: fmt::Debug + Send + Sync {
    /// Runs `statement` and maps its results. `key` is the statement's
    /// cache key when the caller already computed it.
    fn query(
        &self,
        statement: &Arc<MappedStatement>,
        parameter: &Value,
        bounds: RowBounds,
        key: Option<&CacheKey>,
    ) -> Result<Vec<Value>>;

    /// Identity of an invocation: statement, bounds, statement text and
    /// parameter values.
    fn create_cache_key(&self, statement: &MappedStatement, parameter: &Value, bounds: RowBounds) -> CacheKey {
        CacheKey::for_query(&statement.id, bounds, &statement.sql, &parameter_values(parameter))
    }

    /// Whether results for `key` are held, or being produced, by this
    /// executor.
    fn is_cached(&self, statement: &MappedStatement, key: &CacheKey) -> bool;

    /// Fills `property` of `object` from the results held for `key` once
    /// they are complete.
    fn defer_load(
        &self,
        statement: &MappedStatement,
        object: &ObjectRef,
        property: &str,
        key: &CacheKey,
        target: &Type,
    ) -> Result<()>;

    fn commit(&self) -> Result<()> {
        Ok(())
    }

    fn rollback(&self) -> Result<()> {
        Ok(())
    }
}

/// Values a parameter contributes to a cache key, in order.
pub fn parameter_values(parameter: &Value) -> Vec<Value> {
    match parameter {
        Value::Object(object) => object
            .loaded_values()
            .into_iter()
            .map(|(_, value)| value)
            .collect(),
        Value::List(items) => items.clone(),
        value => vec![value.clone()],
    }
}

/// Shapes the rows of a nested query for the property they fill: the whole
/// list for collection targets, otherwise the single row (or null).
pub fn extract(mut list: Vec<Value>, target: &Type, factory: &dyn ObjectFactory) -> Result<Value> {
    if factory.is_collection(target) {
        return Ok(Value::List(list));
    }

    match list.len() {
        0 => Ok(Value::Null),
        1 => Ok(list.pop().unwrap_or_default()),
        n => Err(Error::invalid_record_count(format!(
            "statement returned {n} rows where at most one was expected"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rowmap_core::object::DefaultObjectFactory;

    #[test]
    fn extract_single() {
        let factory = DefaultObjectFactory;

        assert_eq!(extract(vec![], &Type::I64, &factory).unwrap(), Value::Null);
        assert_eq!(
            extract(vec![Value::I64(1)], &Type::I64, &factory).unwrap(),
            Value::I64(1)
        );

        let err = extract(vec![Value::I64(1), Value::I64(2)], &Type::I64, &factory).unwrap_err();
        assert!(err.is_invalid_record_count());
    }

    #[test]
    fn extract_list() {
        let list = extract(
            vec![Value::I64(1), Value::I64(2)],
            &Type::list(Type::I64),
            &DefaultObjectFactory,
        )
        .unwrap();
        assert_eq!(list, Value::List(vec![Value::I64(1), Value::I64(2)]));
    }

    #[test]
    fn scalar_parameter_is_one_value() {
        assert_eq!(parameter_values(&Value::I64(7)), vec![Value::I64(7)]);
    }
}
