use super::{properties::PropertyValue, ResultSetHandler};
use crate::{
    executor::{self, Executor},
    rowset::{prefixed, RowSet},
};
use rowmap_core::{
    object::{Loader, ObjectRef},
    schema::{MappedStatement, ResultMapping},
    stmt::{RowBounds, Type, Value},
    Error, Result,
};

use std::sync::Arc;

impl ResultSetHandler {
    /// Value of a property filled by another statement.
    ///
    /// Results the executor already holds are attached once the outermost
    /// query finishes; lazy properties get a loader; everything else runs
    /// the query now. A null parameter skips the query.
    pub(super) fn get_nested_query_mapping_value(
        &self,
        rowset: &mut RowSet,
        object: &ObjectRef,
        mapping: &ResultMapping,
        column_prefix: Option<&str>,
    ) -> Result<PropertyValue> {
        let (executor, nested) = self.nested_query(mapping)?;
        let parameter = self.prepare_parameter_for_nested_query(rowset, mapping, &nested, column_prefix)?;
        if parameter.is_null() {
            return Ok(PropertyValue::Value(Value::Null));
        }

        let Some(property) = mapping.property.as_deref() else {
            return Ok(PropertyValue::Value(Value::Null));
        };

        let key = executor.create_cache_key(&nested, &parameter, RowBounds::DEFAULT);
        let target = self.property_type(object, mapping, property);

        if executor.is_cached(&nested, &key) {
            executor.defer_load(&nested, object, property, &key, &target)?;
            return Ok(PropertyValue::Deferred);
        }

        let lazy = mapping
            .lazy
            .unwrap_or(self.schema.settings.lazy_loading_enabled);

        // Loaders are installed on the object itself, so a dotted path
        // loads eagerly
        if lazy && !property.contains('.') {
            let schema = self.schema.clone();
            let loader = Loader::new(move || {
                let list = executor.query(&nested, &parameter, RowBounds::DEFAULT, Some(&key))?;
                executor::extract(list, &target, &*schema.object_factory)
            });
            object.set_deferred(property, loader, &self.schema.settings.lazy_options());
            return Ok(PropertyValue::Deferred);
        }

        let list = executor.query(&nested, &parameter, RowBounds::DEFAULT, Some(&key))?;
        let value = executor::extract(list, &target, &*self.schema.object_factory)?;
        Ok(PropertyValue::Value(value))
    }

    /// Constructor argument filled by another statement. Always loaded
    /// eagerly.
    pub(super) fn get_nested_query_constructor_value(
        &self,
        rowset: &mut RowSet,
        mapping: &ResultMapping,
        column_prefix: Option<&str>,
    ) -> Result<Value> {
        let (executor, nested) = self.nested_query(mapping)?;
        let parameter = self.prepare_parameter_for_nested_query(rowset, mapping, &nested, column_prefix)?;
        if parameter.is_null() {
            return Ok(Value::Null);
        }

        let key = executor.create_cache_key(&nested, &parameter, RowBounds::DEFAULT);
        let list = executor.query(&nested, &parameter, RowBounds::DEFAULT, Some(&key))?;
        executor::extract(list, &mapping.ty, &*self.schema.object_factory)
    }

    fn nested_query(&self, mapping: &ResultMapping) -> Result<(Arc<dyn Executor>, Arc<MappedStatement>)> {
        let Some(id) = &mapping.nested_query_id else {
            return Err(Error::invalid_schema("mapping has no nested query"));
        };
        let nested = self.schema.statement(id)?.clone();

        let Some(executor) = &self.executor else {
            return Err(Error::invalid_state(format!(
                "nested query `{id}` of `{}` needs an executor",
                self.statement.id
            )));
        };

        Ok((executor.clone(), nested))
    }

    /// Builds the parameter of a nested query from the current row.
    ///
    /// A composite mapping produces an object holding one property per
    /// component, or null when every component is null. A simple mapping
    /// produces the column value converted to the statement's parameter
    /// type.
    fn prepare_parameter_for_nested_query(
        &self,
        rowset: &mut RowSet,
        mapping: &ResultMapping,
        nested: &MappedStatement,
        column_prefix: Option<&str>,
    ) -> Result<Value> {
        if mapping.is_composite() {
            self.prepare_composite_key_parameter(rowset, mapping, nested, column_prefix)
        } else {
            self.prepare_simple_key_parameter(rowset, mapping, nested, column_prefix)
        }
    }

    fn prepare_simple_key_parameter(
        &self,
        rowset: &mut RowSet,
        mapping: &ResultMapping,
        nested: &MappedStatement,
        column_prefix: Option<&str>,
    ) -> Result<Value> {
        let Some(column) = &mapping.column else {
            return Ok(Value::Null);
        };
        let column = prefixed(column, column_prefix);

        let handlers = &self.schema.handlers;
        let handler = nested
            .parameter_type
            .as_ref()
            .and_then(|ty| handlers.get(ty, rowset.sql_type(&column)))
            .unwrap_or_else(|| handlers.any());

        rowset.read(&column, &*handler)
    }

    fn prepare_composite_key_parameter(
        &self,
        rowset: &mut RowSet,
        mapping: &ResultMapping,
        nested: &MappedStatement,
        column_prefix: Option<&str>,
    ) -> Result<Value> {
        let object_type = match nested.parameter_type.as_ref() {
            Some(ty @ Type::Object(_)) => self.schema.object_type(ty),
            _ => None,
        }
        .unwrap_or_else(|| self.schema.types.map());

        let parameter = self.schema.object_factory.create(object_type)?;
        let meta = self.meta(&parameter);
        let mut found = false;

        for composite in &mapping.composites {
            let (Some(property), Some(column)) = (&composite.property, &composite.column) else {
                continue;
            };
            let column = prefixed(column, column_prefix);
            let handler = rowset.handler(&meta.setter_type(property), &column);
            let value = rowset.read(&column, &*handler)?;

            // A null component never reaches the nested query
            if !value.is_null() {
                meta.set_value(property, value)?;
                found = true;
            }
        }

        Ok(if found {
            Value::Object(parameter)
        } else {
            Value::Null
        })
    }
}
