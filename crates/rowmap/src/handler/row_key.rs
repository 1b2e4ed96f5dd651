use super::ResultSetHandler;
use crate::rowset::{prefixed, strip_column_prefix, RowSet};
use rowmap_core::{
    schema::{ResultMap, ResultMapping},
    CacheKey, Result,
};

impl ResultSetHandler {
    /// Identity of the object `result_map` builds from the current row.
    ///
    /// Built from the id columns (or every mapped column when none is
    /// flagged), from every column for map-like targets, or else from the
    /// unmapped columns that match a property. Returns `None` when no column
    /// contributed, so all-null rows never share an identity.
    pub(crate) fn create_row_key(
        &self,
        rowset: &mut RowSet,
        result_map: &ResultMap,
        column_prefix: Option<&str>,
    ) -> Result<Option<CacheKey>> {
        let mut key = CacheKey::new();
        key.update(result_map.id.as_str());

        let mappings = result_map.id_result_mappings();
        if mappings.is_empty() {
            if self.is_map_type(result_map) {
                self.row_key_for_map(rowset, &mut key)?;
            } else {
                self.row_key_for_unmapped_properties(rowset, result_map, &mut key, column_prefix)?;
            }
        } else {
            self.row_key_for_mapped_properties(rowset, result_map, &mut key, mappings, column_prefix)?;
        }

        if key.update_count() < 2 {
            return Ok(None);
        }
        Ok(Some(key))
    }

    fn row_key_for_mapped_properties(
        &self,
        rowset: &mut RowSet,
        result_map: &ResultMap,
        key: &mut CacheKey,
        mappings: &[ResultMapping],
        column_prefix: Option<&str>,
    ) -> Result<()> {
        let partition = rowset.partition(result_map, column_prefix);

        for mapping in mappings {
            if let (Some(nested_id), None) = (&mapping.nested_result_map_id, &mapping.result_set) {
                // Nested objects passed to a constructor identify the row
                // through their own constructor columns
                let nested = self.schema.result_map(nested_id)?.clone();
                let prefix = super::column_prefix(column_prefix, mapping);
                self.row_key_for_mapped_properties(
                    rowset,
                    &nested,
                    key,
                    nested.constructor_result_mappings(),
                    prefix.as_deref(),
                )?;
                continue;
            }

            if !mapping.is_simple() {
                continue;
            }

            let Some(column) = &mapping.column else {
                continue;
            };
            let column = prefixed(column, column_prefix);
            if !partition.mapped.contains(&column.to_uppercase()) {
                continue;
            }

            let handler = match &mapping.handler {
                Some(handler) => handler.clone(),
                None => rowset.handler(&mapping.ty, &column),
            };
            let value = rowset.read(&column, &*handler)?;

            if !value.is_null() || self.schema.settings.return_instance_for_empty_row {
                key.update(column);
                key.update(value);
            }
        }
        Ok(())
    }

    fn row_key_for_unmapped_properties(
        &self,
        rowset: &mut RowSet,
        result_map: &ResultMap,
        key: &mut CacheKey,
        column_prefix: Option<&str>,
    ) -> Result<()> {
        let Some(object_type) = self.schema.object_type(&result_map.ty) else {
            return Ok(());
        };
        let partition = rowset.partition(result_map, column_prefix);
        let underscore = self.schema.settings.map_underscore_to_camel_case;

        for column in &partition.unmapped {
            let property = match column_prefix {
                Some(prefix) if !prefix.is_empty() => match strip_column_prefix(column, prefix) {
                    Some(rest) => rest,
                    None => continue,
                },
                _ => column.as_str(),
            };

            if object_type.find_property(property, underscore).is_none() {
                continue;
            }

            let value = rowset.text(column)?;
            if !value.is_null() {
                key.update(column.as_str());
                key.update(value);
            }
        }
        Ok(())
    }

    fn row_key_for_map(&self, rowset: &RowSet, key: &mut CacheKey) -> Result<()> {
        for column in rowset.column_names() {
            let value = rowset.text(column)?;
            if !value.is_null() {
                key.update(column.as_str());
                key.update(value);
            }
        }
        Ok(())
    }

    pub(crate) fn is_map_type(&self, result_map: &ResultMap) -> bool {
        self.schema
            .object_type(&result_map.ty)
            .is_some_and(|ty| ty.is_map())
    }
}

/// Identity of a nested object within its parent; absent unless both sides
/// have one.
pub(crate) fn combine_keys(key: Option<&CacheKey>, parent: Option<&CacheKey>) -> Option<CacheKey> {
    CacheKey::combine(key?, parent?)
}
