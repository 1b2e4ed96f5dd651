use super::{Column, RowSource, SqlType};
use crate::{stmt::Value, Error, Result};

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

/// Row source over rows held in memory.
///
/// Used to hand pre-fetched rows to the mapping engine, and by tests.
#[derive(Debug, Clone)]
pub struct MemoryRows {
    columns: Vec<Column>,
    rows: Vec<Vec<Value>>,

    /// Number of rows moved past; the current row is `position - 1`
    position: usize,

    seekable: bool,
    closed: Arc<AtomicBool>,
}

impl MemoryRows {
    pub fn new(columns: Vec<Column>, rows: Vec<Vec<Value>>) -> MemoryRows {
        MemoryRows {
            columns,
            rows,
            position: 0,
            seekable: true,
            closed: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Builds a source from column names, taking each column's SQL type from
    /// its first non-null value.
    pub fn from_rows<I, R, V>(names: &[&str], rows: I) -> MemoryRows
    where
        I: IntoIterator<Item = R>,
        R: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let rows: Vec<Vec<Value>> = rows
            .into_iter()
            .map(|row| row.into_iter().map(Into::into).collect())
            .collect();

        let columns = names
            .iter()
            .enumerate()
            .map(|(i, name)| {
                let sql_type = rows
                    .iter()
                    .filter_map(|row| row.get(i))
                    .find(|value| !value.is_null())
                    .map(SqlType::of)
                    .unwrap_or(SqlType::Null);
                Column::new(*name, sql_type)
            })
            .collect();

        MemoryRows::new(columns, rows)
    }

    /// Disables [`RowSource::absolute`], so skipping has to read rows.
    pub fn forward_only(mut self) -> MemoryRows {
        self.seekable = false;
        self
    }

    /// Handle that observes whether the source has been closed, usable after
    /// the source itself has been moved into the engine.
    pub fn closed_flag(&self) -> Arc<AtomicBool> {
        self.closed.clone()
    }

    /// Number of rows moved past so far.
    pub fn position(&self) -> usize {
        self.position
    }
}

impl RowSource for MemoryRows {
    fn columns(&self) -> &[Column] {
        &self.columns
    }

    fn next(&mut self) -> Result<bool> {
        if self.is_closed() {
            return Err(Error::invalid_state("row source is closed"));
        }

        if self.position < self.rows.len() {
            self.position += 1;
            Ok(true)
        } else {
            self.position = self.rows.len() + 1;
            Ok(false)
        }
    }

    fn get(&self, index: usize) -> Result<Value> {
        let row = self
            .position
            .checked_sub(1)
            .and_then(|current| self.rows.get(current))
            .ok_or_else(|| Error::invalid_state("row source is not positioned on a row"))?;

        match row.get(index) {
            Some(value) => Ok(value.clone()),
            None => Err(Error::invalid_state(format!(
                "column index {index} out of range"
            ))),
        }
    }

    fn supports_seek(&self) -> bool {
        self.seekable
    }

    fn absolute(&mut self, rows: usize) -> Result<()> {
        if !self.seekable {
            return Err(Error::invalid_state("row source is forward only"));
        }
        self.position = rows.min(self.rows.len());
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        self.closed.store(true, Ordering::Release);
        Ok(())
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }
}
