use super::{row_key::combine_keys, Context, ResultSetHandler, Sink};
use crate::{result_handler::ResultContext, rowset::{prefixed, RowSet}};
use rowmap_core::{
    object::ObjectRef,
    schema::{ResultMap, ResultMapping},
    stmt::{RowBounds, Value},
    CacheKey, Result,
};

use std::sync::Arc;

impl ResultSetHandler {
    /// Collapses joined rows into object graphs.
    ///
    /// Rows with the same identity extend the same object. In ordered mode
    /// an object is handed out as soon as a row with a new identity starts,
    /// and only the object under construction is remembered; otherwise
    /// every object is remembered until the resultset is exhausted.
    pub(super) fn handle_row_values_for_nested_result_map(
        &self,
        cx: &mut Context,
        rowset: &mut RowSet,
        result_map: &Arc<ResultMap>,
        sink: &mut Sink<'_>,
        bounds: RowBounds,
        ordered: bool,
    ) -> Result<()> {
        let mut context = ResultContext::new();
        rowset.skip(bounds.offset)?;

        let mut row_value = cx.previous_row_value.take().unwrap_or_default();

        while Self::should_process_more_rows(&context, bounds) && !rowset.is_closed() && rowset.next()? {
            let discriminated = self.resolve_discriminated_result_map(rowset, result_map, None)?;
            let row_key = self.create_row_key(rowset, &discriminated, None)?;
            let partial = cx.partial_object(row_key.as_ref());

            if ordered {
                if partial.is_none() && !row_value.is_null() {
                    cx.nested_result_objects.clear();
                    self.store_object(cx, rowset, sink, &mut context, row_value.take())?;
                }
                row_value = self.get_row_value_nested(cx, rowset, &discriminated, row_key.as_ref(), None, partial)?;
            } else {
                let known = partial.is_some();
                row_value = self.get_row_value_nested(cx, rowset, &discriminated, row_key.as_ref(), None, partial)?;
                if !known {
                    self.store_object(cx, rowset, sink, &mut context, row_value.take())?;
                }
            }
        }

        if !row_value.is_null() && ordered && Self::should_process_more_rows(&context, bounds) {
            self.store_object(cx, rowset, sink, &mut context, row_value)?;
        } else if !row_value.is_null() {
            cx.previous_row_value = Some(row_value);
        }

        Ok(())
    }

    /// Builds the value of the current row, or extends `partial` when the
    /// row belongs to an object already built.
    fn get_row_value_nested(
        &self,
        cx: &mut Context,
        rowset: &mut RowSet,
        result_map: &ResultMap,
        combined_key: Option<&CacheKey>,
        column_prefix: Option<&str>,
        partial: Option<Value>,
    ) -> Result<Value> {
        if let Some(row_value) = partial {
            if let Value::Object(object) = &row_value {
                cx.ancestors.push(&result_map.id, row_value.clone());
                let res = self.apply_nested_result_mappings(cx, rowset, result_map, object, column_prefix, combined_key, false);
                cx.ancestors.pop(&result_map.id);
                res?;
            }
            return Ok(row_value);
        }

        let mut row_value = self.create_result_object(cx, rowset, result_map, column_prefix)?;

        if let Value::Object(object) = &row_value {
            if !self.has_type_handler_for_result_object(rowset, &result_map.ty) {
                let mut found = cx.use_constructor_mappings;
                if self.should_apply_automatic_mappings(result_map, true) {
                    found |= self.apply_automatic_mappings(cx, rowset, result_map, object, column_prefix)?;
                }
                found |= self.apply_property_mappings(cx, rowset, result_map, object, column_prefix)?;

                cx.ancestors.push(&result_map.id, row_value.clone());
                let res = self.apply_nested_result_mappings(cx, rowset, result_map, object, column_prefix, combined_key, true);
                cx.ancestors.pop(&result_map.id);
                found |= res?;

                found |= !object.deferred_properties().is_empty();

                if !found && !self.schema.settings.return_instance_for_empty_row {
                    row_value = Value::Null;
                }
            }
        }

        if let Some(key) = combined_key {
            cx.nested_result_objects.insert(key.clone(), row_value.clone());
        }

        Ok(row_value)
    }

    /// Maps the nested result maps of `result_map` from the current row and
    /// links the objects they produce onto `object`. Returns whether a new
    /// nested object was linked.
    #[allow(clippy::too_many_arguments)]
    fn apply_nested_result_mappings(
        &self,
        cx: &mut Context,
        rowset: &mut RowSet,
        result_map: &ResultMap,
        object: &ObjectRef,
        parent_prefix: Option<&str>,
        parent_key: Option<&CacheKey>,
        new_object: bool,
    ) -> Result<bool> {
        let mut found = false;

        for mapping in result_map.property_result_mappings() {
            let (Some(nested_id), None) = (&mapping.nested_result_map_id, &mapping.result_set) else {
                continue;
            };

            let column_prefix = super::column_prefix(parent_prefix, mapping);
            let column_prefix = column_prefix.as_deref();
            let nested = self.schema.result_map(nested_id)?.clone();
            let nested = self.resolve_discriminated_result_map(rowset, &nested, column_prefix)?;

            // Without a prefix the nested columns are the parent's columns,
            // so a map already under construction is a reference back to it
            if mapping.column_prefix.is_none() {
                if let Some(ancestor) = cx.ancestors.get(nested_id).cloned() {
                    if new_object {
                        self.link_objects(object, mapping, ancestor)?;
                    }
                    continue;
                }
            }

            let row_key = self.create_row_key(rowset, &nested, column_prefix)?;
            let combined_key = combine_keys(row_key.as_ref(), parent_key);
            let partial = cx.partial_object(combined_key.as_ref());
            let known = partial.is_some();

            self.instantiate_collection_property_if_appropriate(object, mapping)?;

            if self.any_not_null_column_has_value(rowset, mapping, column_prefix)? {
                let row_value = self.get_row_value_nested(cx, rowset, &nested, combined_key.as_ref(), column_prefix, partial)?;
                if !row_value.is_null() && !known {
                    self.link_objects(object, mapping, row_value)?;
                    found = true;
                }
            }
        }

        Ok(found)
    }

    /// Whether the row carries a nested object at all: one of the declared
    /// not-null columns has a value, or, with a column prefix, some column
    /// carries the prefix.
    fn any_not_null_column_has_value(
        &self,
        rowset: &RowSet,
        mapping: &ResultMapping,
        column_prefix: Option<&str>,
    ) -> Result<bool> {
        if !mapping.not_null_columns.is_empty() {
            for column in &mapping.not_null_columns {
                if !rowset.raw(&prefixed(column, column_prefix))?.is_null() {
                    return Ok(true);
                }
            }
            return Ok(false);
        }

        if let Some(prefix) = column_prefix {
            let prefix = prefix.to_uppercase();
            return Ok(rowset
                .column_names()
                .iter()
                .any(|column| column.to_uppercase().starts_with(&prefix)));
        }

        Ok(true)
    }
}

impl Context {
    /// Object already built for a row identity. A row that produced nothing
    /// counts as not built.
    fn partial_object(&self, key: Option<&CacheKey>) -> Option<Value> {
        self.nested_result_objects
            .get(key?)
            .filter(|value| !value.is_null())
            .cloned()
    }
}
