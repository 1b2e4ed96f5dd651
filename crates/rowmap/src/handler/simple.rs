use super::{Context, ResultSetHandler, Sink};
use crate::{result_handler::ResultContext, rowset::RowSet};
use rowmap_core::{
    schema::ResultMap,
    stmt::{RowBounds, Value},
    Result,
};

use std::sync::Arc;

impl ResultSetHandler {
    /// One object per row.
    pub(super) fn handle_row_values_for_simple_result_map(
        &self,
        cx: &mut Context,
        rowset: &mut RowSet,
        result_map: &Arc<ResultMap>,
        sink: &mut Sink<'_>,
        bounds: RowBounds,
    ) -> Result<()> {
        let mut context = ResultContext::new();
        rowset.skip(bounds.offset)?;

        while Self::should_process_more_rows(&context, bounds) && !rowset.is_closed() && rowset.next()? {
            let discriminated = self.resolve_discriminated_result_map(rowset, result_map, None)?;
            let row_value = self.get_row_value(cx, rowset, &discriminated, None)?;
            self.store_object(cx, rowset, sink, &mut context, row_value)?;
        }

        Ok(())
    }

    /// Builds the value of the current row without looking at nested result
    /// maps. Returns null when nothing was found, unless empty rows produce
    /// empty instances.
    pub(super) fn get_row_value(
        &self,
        cx: &mut Context,
        rowset: &mut RowSet,
        result_map: &ResultMap,
        column_prefix: Option<&str>,
    ) -> Result<Value> {
        let row_value = self.create_result_object(cx, rowset, result_map, column_prefix)?;

        let Value::Object(object) = &row_value else {
            return Ok(row_value);
        };
        if self.has_type_handler_for_result_object(rowset, &result_map.ty) {
            return Ok(row_value);
        }

        let mut found = cx.use_constructor_mappings;
        if self.should_apply_automatic_mappings(result_map, false) {
            found |= self.apply_automatic_mappings(cx, rowset, result_map, object, column_prefix)?;
        }
        found |= self.apply_property_mappings(cx, rowset, result_map, object, column_prefix)?;
        found |= !object.deferred_properties().is_empty();

        if found || self.schema.settings.return_instance_for_empty_row {
            Ok(row_value)
        } else {
            Ok(Value::Null)
        }
    }
}
