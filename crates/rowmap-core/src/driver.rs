mod column;
pub use column::{Column, SqlType};

mod memory;
pub use memory::MemoryRows;

use crate::{stmt::Value, Error, Result};

use std::fmt::Debug;

/// A forward-only tabular result produced by statement execution.
///
/// The mapping engine reads one row at a time and closes the source once it
/// is done with it, including on error paths. `close` must be idempotent.
pub trait RowSource: Debug + Send {
    /// Describes the columns of every row.
    fn columns(&self) -> &[Column];

    /// Advances to the next row. Returns `false` once the source is
    /// exhausted.
    fn next(&mut self) -> Result<bool>;

    /// Reads a column of the current row.
    fn get(&self, index: usize) -> Result<Value>;

    /// Whether [`absolute`](Self::absolute) can reposition the source.
    fn supports_seek(&self) -> bool {
        false
    }

    /// Positions the source after its first `rows` rows, so that the next
    /// call to [`next`](Self::next) moves to row `rows`.
    fn absolute(&mut self, rows: usize) -> Result<()> {
        let _ = rows;
        Err(Error::invalid_state("row source is forward only"))
    }

    fn close(&mut self) -> Result<()>;

    fn is_closed(&self) -> bool;
}

impl<T: RowSource + ?Sized> RowSource for Box<T> {
    fn columns(&self) -> &[Column] {
        (**self).columns()
    }

    fn next(&mut self) -> Result<bool> {
        (**self).next()
    }

    fn get(&self, index: usize) -> Result<Value> {
        (**self).get(index)
    }

    fn supports_seek(&self) -> bool {
        (**self).supports_seek()
    }

    fn absolute(&mut self, rows: usize) -> Result<()> {
        (**self).absolute(rows)
    }

    fn close(&mut self) -> Result<()> {
        (**self).close()
    }

    fn is_closed(&self) -> bool {
        (**self).is_closed()
    }
}
