use rowmap_core::{stmt::Value, Result};

/// Receives mapped objects one at a time.
pub trait ResultHandler {
    fn handle_result(&mut self, context: &mut ResultContext, value: Value) -> Result<()>;
}

/// Progress of a result handler; lets it stop the mapping early.
#[derive(Debug, Default)]
pub struct ResultContext {
    count: usize,
    stopped: bool,
}

/// Collects every mapped object into a list.
#[derive(Debug, Default)]
pub struct DefaultResultHandler {
    list: Vec<Value>,
}

impl ResultContext {
    pub fn new() -> ResultContext {
        ResultContext::default()
    }

    /// Number of objects handed out so far, including the current one.
    pub fn result_count(&self) -> usize {
        self.count
    }

    /// Asks the engine not to map any further rows.
    pub fn stop(&mut self) {
        self.stopped = true;
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped
    }

    pub(crate) fn next_result(&mut self) {
        self.count += 1;
    }
}

impl DefaultResultHandler {
    pub fn new() -> DefaultResultHandler {
        DefaultResultHandler::default()
    }

    pub fn into_list(self) -> Vec<Value> {
        self.list
    }
}

impl ResultHandler for DefaultResultHandler {
    fn handle_result(&mut self, _context: &mut ResultContext, value: Value) -> Result<()> {
        self.list.push(value);
        Ok(())
    }
}

impl<F> ResultHandler for F
where
    F: FnMut(&mut ResultContext, Value) -> Result<()>,
{
    fn handle_result(&mut self, context: &mut ResultContext, value: Value) -> Result<()> {
        self(context, value)
    }
}
