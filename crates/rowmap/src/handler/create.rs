use super::{Context, ResultSetHandler};
use crate::rowset::{prefixed, RowSet};
use rowmap_core::{
    object::{Constructor, ObjectType},
    schema::{ResultMap, ResultMapping},
    stmt::{Type, Value},
    Error, Result,
};

use std::sync::Arc;

impl ResultSetHandler {
    /// Creates the value `result_map` produces for the current row.
    ///
    /// Scalar targets are read straight from a column. Objects are built
    /// from constructor mappings when the map declares some, empty through
    /// the default constructor otherwise, and as a last resort by feeding
    /// columns to the constructor in order. Returns null when constructor
    /// arguments were all null.
    pub(super) fn create_result_object(
        &self,
        cx: &mut Context,
        rowset: &mut RowSet,
        result_map: &ResultMap,
        column_prefix: Option<&str>,
    ) -> Result<Value> {
        cx.use_constructor_mappings = false;

        let (value, from_args) = self.create_result_object_inner(cx, rowset, result_map, column_prefix)?;

        cx.use_constructor_mappings = from_args && !value.is_null();
        Ok(value)
    }

    fn create_result_object_inner(
        &self,
        cx: &mut Context,
        rowset: &mut RowSet,
        result_map: &ResultMap,
        column_prefix: Option<&str>,
    ) -> Result<(Value, bool)> {
        let ty = &result_map.ty;

        if self.has_type_handler_for_result_object(rowset, ty) {
            let value = self.create_primitive_result_object(rowset, result_map, column_prefix)?;
            return Ok((value, false));
        }

        let constructor_mappings = result_map.constructor_result_mappings();
        if !constructor_mappings.is_empty() {
            return self.create_parameterized_result_object(cx, rowset, result_map, constructor_mappings, column_prefix);
        }

        let Some(object_type) = self.schema.object_type(ty) else {
            return Err(Error::invalid_schema(format!(
                "do not know how to create an instance of `{ty}` for result map `{}`",
                result_map.id
            )));
        };

        if object_type.has_default_constructor() {
            let object = self.schema.object_factory.create(object_type)?;
            return Ok((Value::Object(object), false));
        }

        if self.should_apply_automatic_mappings(result_map, false) {
            return self.create_by_constructor_signature(rowset, result_map);
        }

        Err(Error::invalid_schema(format!(
            "do not know how to create an instance of `{}` for result map `{}`",
            object_type.name, result_map.id
        )))
    }

    /// Whether the target is a single value read by a type handler rather
    /// than an object with properties.
    pub(super) fn has_type_handler_for_result_object(&self, rowset: &RowSet, ty: &Type) -> bool {
        let handlers = &self.schema.handlers;
        match rowset.column_names() {
            [column] => handlers.has_handler(ty, rowset.sql_type(column)),
            _ => handlers.has_handler(ty, None),
        }
    }

    fn create_primitive_result_object(
        &self,
        rowset: &mut RowSet,
        result_map: &ResultMap,
        column_prefix: Option<&str>,
    ) -> Result<Value> {
        let column = match result_map.result_mappings().first() {
            Some(mapping) => match &mapping.column {
                Some(column) => prefixed(column, column_prefix),
                None => return Err(Error::invalid_schema(format!(
                    "the first mapping of result map `{}` has no column",
                    result_map.id
                ))),
            },
            None => match rowset.column_names().first() {
                Some(column) => column.clone(),
                None => return Ok(Value::Null),
            },
        };

        let handler = rowset.handler(&result_map.ty, &column);
        rowset.read(&column, &*handler)
    }

    fn create_parameterized_result_object(
        &self,
        cx: &mut Context,
        rowset: &mut RowSet,
        result_map: &ResultMap,
        constructor_mappings: &[ResultMapping],
        column_prefix: Option<&str>,
    ) -> Result<(Value, bool)> {
        let mut args = Vec::with_capacity(constructor_mappings.len());
        let mut found = false;

        for mapping in constructor_mappings {
            let value = if mapping.nested_query_id.is_some() {
                self.get_nested_query_constructor_value(rowset, mapping, column_prefix)?
            } else if let Some(nested_id) = &mapping.nested_result_map_id {
                let prefix = super::column_prefix(column_prefix, mapping);
                let nested = self.schema.result_map(nested_id)?.clone();
                let nested = self.resolve_discriminated_result_map(rowset, &nested, prefix.as_deref())?;
                self.get_row_value(cx, rowset, &nested, prefix.as_deref())?
            } else {
                let Some(column) = &mapping.column else {
                    return Err(Error::invalid_schema(format!(
                        "constructor mapping of result map `{}` has no column",
                        result_map.id
                    )));
                };
                let column = prefixed(column, column_prefix);
                let handler = match &mapping.handler {
                    Some(handler) => handler.clone(),
                    None => rowset.handler(&mapping.ty, &column),
                };
                rowset.read(&column, &*handler)?
            };

            found |= !value.is_null();
            let name = mapping
                .property
                .clone()
                .or_else(|| mapping.column.clone())
                .unwrap_or_default();
            args.push((name, value));
        }

        if !found {
            return Ok((Value::Null, true));
        }

        let object_type = self.target_type(result_map)?;
        let object = self.schema.object_factory.create_with_args(&object_type, args)?;
        Ok((Value::Object(object), true))
    }

    /// Feeds the columns, in order, to the only constructor of the target.
    fn create_by_constructor_signature(
        &self,
        rowset: &mut RowSet,
        result_map: &ResultMap,
    ) -> Result<(Value, bool)> {
        let object_type = self.target_type(result_map)?;
        let Constructor::Args(params) = &object_type.constructor else {
            return Err(Error::invalid_schema(format!(
                "`{}` has no constructor taking columns",
                object_type.name
            )));
        };

        let columns = rowset.column_names().to_vec();
        if columns.len() != params.len() {
            return Err(Error::invalid_schema(format!(
                "no constructor of `{}` matches the {} columns of the resultset",
                object_type.name,
                columns.len()
            )));
        }

        let handlers = &self.schema.handlers;
        let usable = params
            .iter()
            .zip(&columns)
            .all(|(param, column)| handlers.has_handler(&param.ty, rowset.sql_type(column)));
        if !usable {
            return Err(Error::invalid_schema(format!(
                "the constructor of `{}` does not accept the column types of the resultset",
                object_type.name
            )));
        }

        let mut args = Vec::with_capacity(params.len());
        let mut found = false;
        for (param, column) in params.iter().zip(&columns) {
            let handler = rowset.handler(&param.ty, column);
            let value = rowset.read(column, &*handler)?;
            found |= !value.is_null();
            args.push((param.name.clone(), value));
        }

        if !found {
            return Ok((Value::Null, true));
        }

        let object = self.schema.object_factory.create_with_args(&object_type, args)?;
        Ok((Value::Object(object), true))
    }

    fn target_type(&self, result_map: &ResultMap) -> Result<Arc<ObjectType>> {
        self.schema.object_type(&result_map.ty).cloned().ok_or_else(|| {
            Error::invalid_schema(format!(
                "result map `{}` targets unknown type `{}`",
                result_map.id, result_map.ty
            ))
        })
    }
}
