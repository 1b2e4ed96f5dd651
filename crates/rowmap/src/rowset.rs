use rowmap_core::{
    driver::{RowSource, SqlType},
    handler::TypeHandler,
    schema::ResultMap,
    stmt::{Type, Value},
    Error, Result, Schema,
};

use std::{
    collections::{HashMap, HashSet},
    sync::Arc,
};

/// Wraps a row source with the column metadata and memoized lookups the
/// mapping engine needs while reading it.
#[derive(Debug)]
pub struct RowSet {
    source: Box<dyn RowSource>,
    schema: Arc<Schema>,

    /// Column labels (or names), as reported
    columns: Vec<String>,

    /// Upper-cased column to index; the first occurrence wins
    index: HashMap<String, usize>,

    /// Resolved handler per (upper-cased column, property type)
    handlers: HashMap<(String, Type), Arc<dyn TypeHandler>>,

    /// Mapped and unmapped columns per `result map id:prefix`
    partitions: HashMap<String, Arc<ColumnPartition>>,

    /// Rows read so far
    row: usize,
}

/// Columns of a row source split by whether a result map reads them.
#[derive(Debug, Default)]
pub(crate) struct ColumnPartition {
    /// Upper-cased
    pub(crate) mapped: HashSet<String>,

    /// As reported by the source
    pub(crate) unmapped: Vec<String>,
}

impl RowSet {
    pub fn new(source: Box<dyn RowSource>, schema: Arc<Schema>) -> RowSet {
        let use_label = schema.settings.use_column_label;
        let columns: Vec<String> = source
            .columns()
            .iter()
            .map(|column| {
                if use_label {
                    column.label.clone()
                } else {
                    column.name.clone()
                }
            })
            .collect();

        let mut index = HashMap::new();
        for (i, column) in columns.iter().enumerate() {
            index.entry(column.to_uppercase()).or_insert(i);
        }

        RowSet {
            source,
            schema,
            columns,
            index,
            handlers: HashMap::new(),
            partitions: HashMap::new(),
            row: 0,
        }
    }

    pub fn column_names(&self) -> &[String] {
        &self.columns
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn index_of(&self, column: &str) -> Option<usize> {
        self.index.get(&column.to_uppercase()).copied()
    }

    pub fn sql_type(&self, column: &str) -> Option<SqlType> {
        let i = self.index_of(column)?;
        Some(self.source.columns()[i].sql_type)
    }

    /// Type the driver produces for the column.
    pub fn class(&self, column: &str) -> Option<Type> {
        let i = self.index_of(column)?;
        Some(self.source.columns()[i].class.clone())
    }

    /// Number of the current row, starting at 1.
    pub fn row(&self) -> usize {
        self.row
    }

    pub fn next(&mut self) -> Result<bool> {
        let more = self.source.next()?;
        if more {
            self.row += 1;
        }
        Ok(more)
    }

    /// Moves past `rows` rows, seeking when the source supports it.
    pub fn skip(&mut self, rows: usize) -> Result<()> {
        if rows == 0 {
            return Ok(());
        }

        if self.source.supports_seek() {
            self.source.absolute(rows)?;
            self.row = rows;
        } else {
            for _ in 0..rows {
                if !self.next()? {
                    break;
                }
            }
        }
        Ok(())
    }

    pub fn is_closed(&self) -> bool {
        self.source.is_closed()
    }

    pub fn close(&mut self) -> Result<()> {
        if self.source.is_closed() {
            return Ok(());
        }
        self.source.close()
    }

    /// Raw value of a column of the current row.
    pub fn raw(&self, column: &str) -> Result<Value> {
        match self.index_of(column) {
            Some(i) => self.source.get(i),
            None => Err(rowmap_core::err!("column `{column}` not found")),
        }
    }

    /// Raw value of a column, read as text the way row identities compare
    /// columns. Null stays null.
    pub fn text(&self, column: &str) -> Result<Value> {
        Ok(match self.raw(column)? {
            Value::Null => Value::Null,
            Value::String(text) => Value::String(text),
            value => Value::String(value.to_string()),
        })
    }

    /// Reads a column through `handler`, attaching the column and row to any
    /// conversion failure.
    pub fn read(&self, column: &str, handler: &dyn TypeHandler) -> Result<Value> {
        let raw = self.raw(column)?;
        handler
            .get(&raw)
            .map_err(|err| err.context(Error::result_mapping(column, self.row)))
    }

    /// Handler converting `column` into `ty`.
    ///
    /// Tries the handler registered for `ty` and the column's SQL type, then
    /// the one for the column's native type, then the pass-through handler.
    /// The choice is remembered for the lifetime of the row set.
    pub fn handler(&mut self, ty: &Type, column: &str) -> Arc<dyn TypeHandler> {
        let key = (column.to_uppercase(), ty.clone());
        if let Some(handler) = self.handlers.get(&key) {
            return handler.clone();
        }

        let sql_type = self.sql_type(column);
        let registry = &self.schema.handlers;

        let handler = match ty {
            Type::Any => None,
            ty => registry.get(ty, sql_type),
        }
        .or_else(|| {
            let class = self.class(column)?;
            registry.get(&class, sql_type)
        })
        .unwrap_or_else(|| registry.any());

        self.handlers.insert(key, handler.clone());
        handler
    }

    /// Splits the columns into those `result_map` reads under `prefix` and
    /// the rest.
    pub(crate) fn partition(
        &mut self,
        result_map: &ResultMap,
        prefix: Option<&str>,
    ) -> Arc<ColumnPartition> {
        let key = map_key(result_map, prefix);
        if let Some(partition) = self.partitions.get(&key) {
            return partition.clone();
        }

        let prefix = prefix.map(str::to_uppercase).unwrap_or_default();
        let declared: HashSet<String> = result_map
            .mapped_columns()
            .iter()
            .map(|column| format!("{prefix}{column}"))
            .collect();

        let mut partition = ColumnPartition::default();
        for column in &self.columns {
            let upper = column.to_uppercase();
            if declared.contains(&upper) {
                partition.mapped.insert(upper);
            } else {
                partition.unmapped.push(column.clone());
            }
        }

        let partition = Arc::new(partition);
        self.partitions.insert(key, partition.clone());
        partition
    }
}

impl Drop for RowSet {
    fn drop(&mut self) {
        if let Err(err) = self.close() {
            tracing::debug!(error = %err, "failed to close row source");
        }
    }
}

/// Memoization key of per result map and column prefix lookups.
pub(crate) fn map_key(result_map: &ResultMap, prefix: Option<&str>) -> String {
    format!("{}:{}", result_map.id, prefix.unwrap_or_default())
}

/// Applies a column prefix.
pub(crate) fn prefixed(column: &str, prefix: Option<&str>) -> String {
    match prefix {
        Some(prefix) => format!("{prefix}{column}"),
        None => column.to_string(),
    }
}

/// Column name without an upper-cased `prefix`, when the column starts with
/// it. Compares case-insensitively.
pub(crate) fn strip_column_prefix<'a>(column: &'a str, prefix: &str) -> Option<&'a str> {
    let head = column.get(..prefix.len())?;
    if head.to_uppercase() != prefix {
        return None;
    }
    column.get(prefix.len()..)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rowmap_core::{
        driver::{Column, MemoryRows},
        object::ObjectType,
        schema::{ResultMap, ResultMapping},
    };

    fn schema() -> Arc<Schema> {
        let mut builder = Schema::builder();
        builder
            .object_type(ObjectType::bean("Blog").property("id", Type::I64))
            .result_map(
                ResultMap::new("blog", Type::object("Blog"))
                    .mapping(ResultMapping::column("id", "id").id()),
            );
        Arc::new(builder.build().unwrap())
    }

    #[test]
    fn partition_is_case_insensitive_and_prefixed() {
        let schema = schema();
        let rows = MemoryRows::from_rows(
            &["ID", "TITLE", "B_ID"],
            [[Value::I64(1), Value::from("t"), Value::I64(2)]],
        );
        let mut rowset = RowSet::new(Box::new(rows), schema.clone());
        let blog = schema.result_map("blog").unwrap();

        let plain = rowset.partition(blog, None);
        assert!(plain.mapped.contains("ID"));
        assert_eq!(plain.unmapped, ["TITLE", "B_ID"]);

        let prefixed = rowset.partition(blog, Some("b_"));
        assert!(prefixed.mapped.contains("B_ID"));
        assert_eq!(prefixed.unmapped, ["ID", "TITLE"]);
    }

    #[test]
    fn handler_cascade_falls_back_to_column_class() {
        let columns = vec![
            Column::new("N", SqlType::Integer),
            Column::new("X", SqlType::Other).class(Type::Any),
        ];
        let rows = MemoryRows::new(columns, vec![vec![Value::I32(4), Value::I32(5)]]);
        let mut rowset = RowSet::new(Box::new(rows), schema());
        rowset.next().unwrap();

        // Any defers to the column's native type
        let handler = rowset.handler(&Type::Any, "n");
        assert_eq!(rowset.read("N", &*handler).unwrap(), Value::I32(4));

        // Unknown object type with an untyped column passes through
        let handler = rowset.handler(&Type::object("Money"), "X");
        assert_eq!(rowset.read("X", &*handler).unwrap(), Value::I32(5));

        let handler = rowset.handler(&Type::I64, "N");
        assert_eq!(rowset.read("N", &*handler).unwrap(), Value::I64(4));
    }

    #[test]
    fn conversion_failure_names_column_and_row() {
        let rows = MemoryRows::from_rows(&["AGE"], [[Value::from("old")]]);
        let mut rowset = RowSet::new(Box::new(rows), schema());
        rowset.next().unwrap();

        let handler = rowset.handler(&Type::I64, "AGE");
        let err = rowset.read("AGE", &*handler).unwrap_err();
        assert_eq!(
            err.to_string(),
            "could not map column `AGE` of row 1: cannot convert String to I64"
        );
    }

    #[test]
    fn strip_prefix_respects_char_boundaries() {
        assert_eq!(strip_column_prefix("s_subject", "S_"), Some("subject"));
        assert_eq!(strip_column_prefix("ID", "S_"), None);
        assert_eq!(strip_column_prefix("S", "S_"), None);

        // `ſ` upper-cases to `S` but is two bytes wide
        assert_eq!(strip_column_prefix("ſubject", "S"), None);
        assert_eq!(strip_column_prefix("éclair", "S"), None);
    }

    #[test]
    fn dropping_closes_source() {
        let rows = MemoryRows::from_rows(&["ID"], [[Value::I64(1)]]);
        let closed = rows.closed_flag();
        drop(RowSet::new(Box::new(rows), schema()));
        assert!(closed.load(std::sync::atomic::Ordering::Acquire));
    }
}
