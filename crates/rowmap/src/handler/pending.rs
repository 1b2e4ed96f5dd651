use super::{Context, ResultSetHandler};
use crate::rowset::RowSet;
use rowmap_core::{
    object::ObjectRef,
    schema::ResultMapping,
    stmt::Value,
    CacheKey, Error, Result,
};

/// A parent object waiting for rows of a named resultset.
#[derive(Debug)]
pub(super) struct PendingRelation {
    target: ObjectRef,
    mapping: ResultMapping,
}

impl ResultSetHandler {
    /// Registers `object` as the parent of the rows of `mapping`'s named
    /// resultset whose foreign columns match the current row.
    pub(super) fn add_pending_child_relation(
        &self,
        cx: &mut Context,
        rowset: &RowSet,
        object: &ObjectRef,
        mapping: &ResultMapping,
    ) -> Result<()> {
        let Some(result_set) = &mapping.result_set else {
            return Ok(());
        };

        let columns = mapping.column.as_deref().unwrap_or_default();
        let key = self.create_key_for_multiple_results(rowset, mapping, columns, columns)?;

        cx.pending_relations
            .entry(key)
            .or_default()
            .push(PendingRelation {
                target: object.clone(),
                mapping: mapping.clone(),
            });

        match cx.next_result_maps.get(result_set) {
            None => {
                cx.next_result_maps.insert(result_set.clone(), mapping.clone());
            }
            Some(previous) if previous.property != mapping.property => {
                return Err(Error::invalid_record_count(format!(
                    "two different properties are mapped to resultset `{result_set}`: `{}` and `{}`",
                    previous.property.as_deref().unwrap_or_default(),
                    mapping.property.as_deref().unwrap_or_default(),
                )));
            }
            Some(_) => {}
        }

        Ok(())
    }

    /// Links an object of a named resultset onto every parent whose columns
    /// match its foreign columns.
    pub(super) fn link_to_parents(
        &self,
        cx: &mut Context,
        rowset: &RowSet,
        parent_mapping: &ResultMapping,
        value: Value,
    ) -> Result<()> {
        if value.is_null() {
            return Ok(());
        }

        let names = parent_mapping.column.as_deref().unwrap_or_default();
        let columns = parent_mapping.foreign_column.as_deref().unwrap_or_default();
        let key = self.create_key_for_multiple_results(rowset, parent_mapping, names, columns)?;

        let Some(parents) = cx.pending_relations.get(&key) else {
            return Ok(());
        };

        for parent in parents {
            let collection = self.instantiate_collection_property_if_appropriate(&parent.target, &parent.mapping)?;

            if !collection {
                let property = parent.mapping.property.as_deref().unwrap_or_default();
                if !parent.target.peek(property).is_null() {
                    return Err(Error::invalid_record_count(format!(
                        "resultset `{}` returned more than one row for `{}.{property}`",
                        parent_mapping.result_set.as_deref().unwrap_or_default(),
                        parent.target.type_name(),
                    )));
                }
            }

            self.link_objects(&parent.target, &parent.mapping, value.clone())?;
        }

        Ok(())
    }

    /// Identity linking parents and children across resultsets: the
    /// resultset and property, then each named column paired with the text
    /// of the matching column of the current row.
    fn create_key_for_multiple_results(
        &self,
        rowset: &RowSet,
        mapping: &ResultMapping,
        names: &str,
        columns: &str,
    ) -> Result<CacheKey> {
        let mut key = CacheKey::new();
        key.update(format!(
            "{}:{}",
            mapping.result_set.as_deref().unwrap_or_default(),
            mapping.property.as_deref().unwrap_or_default()
        ));

        let names = ResultMapping::split_columns(names);
        let columns = ResultMapping::split_columns(columns);
        for (name, column) in names.iter().zip(&columns) {
            let value = rowset.text(column)?;
            if !value.is_null() {
                key.update(name.as_str());
                key.update(value);
            }
        }

        Ok(key)
    }
}
