use crate::{
    handler::{Context, ResultSetHandler, Sink},
    result_handler::{ResultContext, ResultHandler},
    rowset::RowSet,
};
use rowmap_core::{
    schema::ResultMap,
    stmt::{RowBounds, Value},
    Error, Result,
};

use std::sync::Arc;

/// Forward-only sequence of mapped objects, read one row group at a time.
///
/// Joined rows that belong to the same object are collapsed before the
/// object is handed out, as if the statement's results were ordered. The
/// underlying row source is released when the cursor is closed, dropped or
/// runs out of rows.
#[derive(Debug)]
pub struct Cursor {
    handler: ResultSetHandler,
    rowset: RowSet,
    result_map: Arc<ResultMap>,
    bounds: RowBounds,
    cx: Context,
    status: Status,

    /// Whether `iter` has been called
    iterated: bool,

    /// Objects handed out so far
    yielded: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Status {
    /// No row has been read yet
    Created,

    /// Rows are being read
    Open,

    /// Closed before the end of the rows
    Closed,

    /// Every row was read
    Consumed,
}

/// Iterator over the objects of a [`Cursor`].
#[derive(Debug)]
pub struct Iter<'a> {
    cursor: &'a mut Cursor,
}

/// Keeps the first object handed out and stops the mapping.
#[derive(Default)]
struct SingleResult {
    value: Option<Value>,
}

impl Cursor {
    pub(crate) fn new(
        handler: ResultSetHandler,
        rowset: RowSet,
        result_map: Arc<ResultMap>,
        bounds: RowBounds,
    ) -> Cursor {
        Cursor {
            handler,
            rowset,
            result_map,
            bounds,
            cx: Context::default(),
            status: Status::Created,
            iterated: false,
            yielded: 0,
        }
    }

    /// Returns the iterator over the mapped objects. A cursor can be
    /// iterated once.
    pub fn iter(&mut self) -> Result<Iter<'_>> {
        if self.is_closed() {
            return Err(Error::invalid_state(
                "a cursor that has been closed cannot be iterated",
            ));
        }

        if self.iterated {
            return Err(Error::invalid_state("a cursor can only be iterated once"));
        }

        self.iterated = true;
        Ok(Iter { cursor: self })
    }

    /// Maps every remaining object into a collection.
    pub fn collect<B>(mut self) -> Result<B>
    where
        B: FromIterator<Value>,
    {
        let values = self.iter()?.collect();
        values
    }

    /// Whether the first row has been read and the cursor is not yet closed.
    pub fn is_open(&self) -> bool {
        self.status == Status::Open
    }

    /// Whether the cursor no longer reads rows, because it was closed or
    /// because it read them all.
    pub fn is_closed(&self) -> bool {
        matches!(self.status, Status::Closed | Status::Consumed)
    }

    /// Whether every row has been read.
    pub fn is_consumed(&self) -> bool {
        self.status == Status::Consumed
    }

    /// Position of the last object handed out, counting skipped rows.
    pub fn current_index(&self) -> usize {
        self.bounds.offset + self.yielded
    }

    /// Releases the row source. Closing a closed cursor does nothing.
    pub fn close(&mut self) -> Result<()> {
        if self.is_closed() {
            return Ok(());
        }

        let res = self.rowset.close();
        self.status = Status::Closed;
        res
    }

    fn fetch_next_object(&mut self) -> Result<Option<Value>> {
        if self.is_closed() {
            return Ok(None);
        }

        if self.status == Status::Created {
            self.rowset.skip(self.bounds.offset)?;
            self.status = Status::Open;
        }

        let mut single = SingleResult::default();
        if !self.rowset.is_closed() && self.yielded < self.bounds.limit {
            let mut sink = Sink::Handler(&mut single);
            self.handler.handle_row_values(
                &mut self.cx,
                &mut self.rowset,
                &self.result_map,
                &mut sink,
                RowBounds::DEFAULT,
                true,
            )?;
        }

        let fetched = single.value.is_some();
        if fetched {
            self.yielded += 1;
        }

        if !fetched || self.yielded == self.bounds.limit {
            self.close()?;
            self.status = Status::Consumed;
        }

        Ok(single.value)
    }
}

impl Drop for Cursor {
    fn drop(&mut self) {
        if let Err(err) = self.close() {
            tracing::debug!(error = %err, "failed to close cursor");
        }
    }
}

impl Iterator for Iter<'_> {
    type Item = Result<Value>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.cursor.fetch_next_object() {
            Ok(value) => value.map(Ok),
            Err(err) => {
                // A failed row leaves the row source in an unknown position
                if let Err(close_err) = self.cursor.close() {
                    tracing::debug!(error = %close_err, "failed to close cursor after a mapping error");
                }
                Some(Err(err))
            }
        }
    }
}

impl ResultHandler for SingleResult {
    fn handle_result(&mut self, context: &mut ResultContext, value: Value) -> Result<()> {
        self.value = Some(value);
        context.stop();
        Ok(())
    }
}
