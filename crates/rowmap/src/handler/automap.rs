use super::{Context, ResultSetHandler};
use crate::rowset::{map_key, strip_column_prefix, RowSet};
use rowmap_core::{
    handler::TypeHandler,
    object::ObjectRef,
    schema::ResultMap,
    AutoMappingBehavior, Error, Result, UnknownColumnBehavior,
};

use std::sync::Arc;

/// A column mapped to a property by name rather than by a declared mapping.
#[derive(Debug)]
pub(crate) struct AutoMapping {
    column: String,
    property: String,
    handler: Arc<dyn TypeHandler>,
    nullable: bool,
}

impl ResultSetHandler {
    /// Whether columns `result_map` does not list are mapped by name.
    pub(crate) fn should_apply_automatic_mappings(&self, result_map: &ResultMap, nested: bool) -> bool {
        if let Some(enabled) = result_map.auto_mapping {
            return enabled;
        }

        match self.schema.settings.auto_mapping_behavior {
            AutoMappingBehavior::None => false,
            AutoMappingBehavior::Partial => !nested,
            AutoMappingBehavior::Full => true,
        }
    }

    /// Writes every automatically mapped column of the current row onto
    /// `object`. Returns whether any of them was non-null.
    pub(crate) fn apply_automatic_mappings(
        &self,
        cx: &mut Context,
        rowset: &mut RowSet,
        result_map: &ResultMap,
        object: &ObjectRef,
        column_prefix: Option<&str>,
    ) -> Result<bool> {
        let mappings = self.automatic_mappings(cx, rowset, result_map, object, column_prefix)?;
        let call_setters_on_nulls = self.schema.settings.call_setters_on_nulls;
        let meta = self.meta(object);

        let mut found = false;
        for mapping in mappings.iter() {
            let value = rowset.read(&mapping.column, &*mapping.handler)?;
            if !value.is_null() {
                found = true;
            }
            if !value.is_null() || (call_setters_on_nulls && mapping.nullable) {
                meta.set_value(&mapping.property, value)?;
            }
        }
        Ok(found)
    }

    fn automatic_mappings(
        &self,
        cx: &mut Context,
        rowset: &mut RowSet,
        result_map: &ResultMap,
        object: &ObjectRef,
        column_prefix: Option<&str>,
    ) -> Result<Arc<[AutoMapping]>> {
        let key = map_key(result_map, column_prefix);
        if let Some(mappings) = cx.auto_mappings.get(&key) {
            return Ok(mappings.clone());
        }

        let meta = self.meta(object);
        let underscore = self.schema.settings.map_underscore_to_camel_case;
        let partition = rowset.partition(result_map, column_prefix);

        let mut mappings = vec![];
        for column in &partition.unmapped {
            let name = match column_prefix {
                Some(prefix) if !prefix.is_empty() => match strip_column_prefix(column, prefix) {
                    Some(rest) => rest,
                    None => continue,
                },
                _ => column.as_str(),
            };

            let property = meta.find_property(name, underscore);
            let Some(property) = property.filter(|property| meta.has_setter(property)) else {
                self.unknown_column(column, Some(name), None)?;
                continue;
            };

            if result_map.mapped_properties().contains(&property) {
                continue;
            }

            let ty = meta.setter_type(&property);
            let sql_type = rowset.sql_type(column);
            if !self.schema.handlers.has_handler(&ty, sql_type) {
                self.unknown_column(column, Some(&property), Some(&ty.to_string()))?;
                continue;
            }

            mappings.push(AutoMapping {
                handler: rowset.handler(&ty, column),
                column: column.clone(),
                nullable: object.ty().is_nullable(&property),
                property,
            });
        }

        let mappings: Arc<[AutoMapping]> = mappings.into();
        cx.auto_mappings.insert(key, mappings.clone());
        Ok(mappings)
    }

    /// Applies the configured policy to a column automatic mapping cannot
    /// place.
    fn unknown_column(
        &self,
        column: &str,
        property: Option<&str>,
        property_type: Option<&str>,
    ) -> Result<()> {
        match self.schema.settings.auto_mapping_unknown_column_behavior {
            UnknownColumnBehavior::None => Ok(()),
            UnknownColumnBehavior::Warning => {
                tracing::warn!(
                    statement = %self.statement.id,
                    column,
                    property,
                    property_type,
                    "unknown column detected during automatic mapping"
                );
                Ok(())
            }
            UnknownColumnBehavior::Failing => Err(Error::unknown_column(
                &self.statement.id,
                column,
                property,
                property_type,
            )),
        }
    }
}
