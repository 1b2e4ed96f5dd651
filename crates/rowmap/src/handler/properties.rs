use super::{Context, ResultSetHandler};
use crate::rowset::{prefixed, RowSet};
use rowmap_core::{
    object::ObjectRef,
    schema::{ResultMap, ResultMapping},
    stmt::Value,
    Result,
};

/// Outcome of reading one property mapping.
pub(super) enum PropertyValue {
    Value(Value),

    /// Filled later, by a loader or by rows of another resultset
    Deferred,
}

impl ResultSetHandler {
    /// Writes the explicitly mapped properties of `result_map` onto
    /// `object`. Returns whether any value was found.
    pub(super) fn apply_property_mappings(
        &self,
        cx: &mut Context,
        rowset: &mut RowSet,
        result_map: &ResultMap,
        object: &ObjectRef,
        column_prefix: Option<&str>,
    ) -> Result<bool> {
        let partition = rowset.partition(result_map, column_prefix);
        let meta = self.meta(object);
        let mut found = false;

        for mapping in result_map.property_result_mappings() {
            // A column on a nested result map mapping is not read here
            let column = match (&mapping.nested_result_map_id, &mapping.column) {
                (None, Some(column)) => Some(prefixed(column, column_prefix).to_uppercase()),
                _ => None,
            };

            let readable = mapping.is_composite()
                || column.is_some_and(|column| partition.mapped.contains(&column))
                || mapping.result_set.is_some();
            if !readable {
                continue;
            }

            let value = self.get_property_mapping_value(cx, rowset, object, mapping, column_prefix)?;
            let Some(property) = &mapping.property else {
                continue;
            };

            let value = match value {
                PropertyValue::Deferred => {
                    found = true;
                    continue;
                }
                PropertyValue::Value(value) => value,
            };

            if !value.is_null() {
                found = true;
                meta.set_value(property, value)?;
            } else if self.schema.settings.call_setters_on_nulls && object.ty().is_nullable(property) {
                meta.set_value(property, value)?;
            }
        }

        Ok(found)
    }

    fn get_property_mapping_value(
        &self,
        cx: &mut Context,
        rowset: &mut RowSet,
        object: &ObjectRef,
        mapping: &ResultMapping,
        column_prefix: Option<&str>,
    ) -> Result<PropertyValue> {
        if mapping.nested_query_id.is_some() {
            return self.get_nested_query_mapping_value(rowset, object, mapping, column_prefix);
        }

        if mapping.result_set.is_some() {
            self.add_pending_child_relation(cx, rowset, object, mapping)?;
            return Ok(PropertyValue::Deferred);
        }

        let Some(column) = &mapping.column else {
            return Ok(PropertyValue::Value(Value::Null));
        };
        let column = prefixed(column, column_prefix);
        let handler = match &mapping.handler {
            Some(handler) => handler.clone(),
            None => rowset.handler(&mapping.ty, &column),
        };
        Ok(PropertyValue::Value(rowset.read(&column, &*handler)?))
    }
}
