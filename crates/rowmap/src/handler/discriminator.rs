use super::ResultSetHandler;
use crate::rowset::{prefixed, RowSet};
use rowmap_core::{schema::ResultMap, Result};

use std::{collections::HashSet, sync::Arc};

impl ResultSetHandler {
    /// Follows discriminators from `result_map` to the most specific result
    /// map for the current row.
    ///
    /// Resolution stops at an unknown case value, at a result map without a
    /// discriminator, and at any result map already visited, so cyclic case
    /// graphs terminate.
    pub(crate) fn resolve_discriminated_result_map(
        &self,
        rowset: &mut RowSet,
        result_map: &Arc<ResultMap>,
        column_prefix: Option<&str>,
    ) -> Result<Arc<ResultMap>> {
        let mut current = result_map.clone();
        let mut visited = HashSet::from([current.id.clone()]);

        while let Some(discriminator) = &current.discriminator {
            let mapping = &discriminator.mapping;
            let Some(column) = &mapping.column else {
                break;
            };
            let column = prefixed(column, column_prefix);

            let handler = match &mapping.handler {
                Some(handler) => handler.clone(),
                None => rowset.handler(&mapping.ty, &column),
            };
            let value = rowset.read(&column, &*handler)?;

            let Some(case) = discriminator.map_id_for(&value.to_string()) else {
                break;
            };
            let Ok(next) = self.schema.result_map(case) else {
                break;
            };

            if !visited.insert(next.id.clone()) {
                tracing::trace!(result_map = %current.id, case, "discriminator cycle; stopping");
                break;
            }

            current = next.clone();
        }

        Ok(current)
    }
}
