//! The result mapping engine: turns rows into object graphs.

mod ancestors;
use ancestors::Ancestors;

mod automap;
use automap::AutoMapping;

mod create;
mod discriminator;
mod link;
mod nested;
mod nested_query;

mod pending;
use pending::PendingRelation;

mod properties;
mod row_key;
mod simple;

use crate::{
    cursor::Cursor,
    executor::Executor,
    result_handler::{DefaultResultHandler, ResultContext, ResultHandler},
    rowset::RowSet,
};
use rowmap_core::{
    driver::RowSource,
    object::{MetaObject, ObjectRef},
    schema::{MappedStatement, ResultMap, ResultMapping},
    stmt::{RowBounds, Value},
    CacheKey, Error, Result, Schema,
};

use std::{collections::HashMap, collections::VecDeque, sync::Arc};

/// Maps the resultsets of one statement invocation.
///
/// The handler itself is immutable and cheap to clone. Everything that
/// belongs to one invocation (built objects by row identity, the ancestor
/// stack, pending cross-resultset links) lives in a [`Context`] created per
/// call, so one handler can serve several invocations, one at a time or
/// concurrently.
#[derive(Debug, Clone)]
pub struct ResultSetHandler {
    schema: Arc<Schema>,
    statement: Arc<MappedStatement>,
    executor: Option<Arc<dyn Executor>>,
    bounds: RowBounds,
}

/// State of one invocation.
#[derive(Debug, Default)]
pub(crate) struct Context {
    /// Objects built so far, by row identity
    nested_result_objects: HashMap<CacheKey, Value>,

    /// Objects under construction, innermost last
    ancestors: Ancestors,

    /// Parents waiting on rows of a later resultset, by link identity
    pending_relations: HashMap<CacheKey, Vec<PendingRelation>>,

    /// Mapping that consumes each named resultset
    next_result_maps: HashMap<String, ResultMapping>,

    /// Automatic mappings per `result map id:prefix`, for the current
    /// resultset
    auto_mappings: HashMap<String, Arc<[AutoMapping]>>,

    /// Parent object still open when an ordered pass stopped early
    pub(crate) previous_row_value: Option<Value>,

    /// Whether the last object was built from constructor arguments
    use_constructor_mappings: bool,
}

/// Where mapped rows go.
pub(crate) enum Sink<'a> {
    Handler(&'a mut dyn ResultHandler),

    /// Rows of a named resultset, linked onto their pending parents
    Parent(&'a ResultMapping),
}

/// Closes row sources the engine never got to, including on error.
struct PendingSources(VecDeque<Box<dyn RowSource>>);

impl ResultSetHandler {
    pub fn new(schema: Arc<Schema>, statement: Arc<MappedStatement>) -> ResultSetHandler {
        ResultSetHandler {
            schema,
            statement,
            executor: None,
            bounds: RowBounds::DEFAULT,
        }
    }

    pub fn for_statement(schema: Arc<Schema>, id: &str) -> Result<ResultSetHandler> {
        let statement = schema.statement(id)?.clone();
        Ok(ResultSetHandler::new(schema, statement))
    }

    /// Executor used to run nested queries.
    pub fn executor(mut self, executor: Arc<dyn Executor>) -> Self {
        self.executor = Some(executor);
        self
    }

    pub fn bounds(mut self, bounds: RowBounds) -> Self {
        self.bounds = bounds;
        self
    }

    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    pub fn statement(&self) -> &Arc<MappedStatement> {
        &self.statement
    }

    /// Maps every resultset and returns the mapped objects.
    ///
    /// With a single mapped resultset the result is its list of objects;
    /// otherwise it holds one list per resultset.
    pub fn handle_result_sets<I>(&self, sources: I) -> Result<Vec<Value>>
    where
        I: IntoIterator<Item = Box<dyn RowSource>>,
    {
        let mut multiple_results = self.handle_all(sources, None)?;

        if multiple_results.len() == 1 {
            let list = multiple_results.pop().unwrap_or_default();
            return Ok(list.into_list().unwrap_or_default());
        }

        Ok(multiple_results)
    }

    /// Maps every resultset, handing each object to `handler` instead of
    /// collecting them.
    pub fn handle_result_sets_with<I>(&self, sources: I, handler: &mut dyn ResultHandler) -> Result<()>
    where
        I: IntoIterator<Item = Box<dyn RowSource>>,
    {
        self.handle_all(sources, Some(handler))?;
        Ok(())
    }

    /// Maps the first resultset lazily, one object per step of the returned
    /// cursor.
    pub fn handle_cursor_result_sets<I>(&self, sources: I) -> Result<Cursor>
    where
        I: IntoIterator<Item = Box<dyn RowSource>>,
    {
        let mut sources = PendingSources(sources.into_iter().collect());

        if self.statement.result_maps.len() != 1 {
            return Err(Error::invalid_schema(format!(
                "cursor results of `{}` must map through exactly one result map",
                self.statement.id
            )));
        }

        let Some(source) = sources.0.pop_front() else {
            return Err(Error::invalid_state(format!(
                "statement `{}` returned no resultset",
                self.statement.id
            )));
        };

        let result_map = self.schema.result_map(&self.statement.result_maps[0])?.clone();
        let rowset = RowSet::new(source, self.schema.clone());
        Ok(Cursor::new(self.clone(), rowset, result_map, self.bounds))
    }

    fn handle_all<I>(&self, sources: I, mut handler: Option<&mut dyn ResultHandler>) -> Result<Vec<Value>>
    where
        I: IntoIterator<Item = Box<dyn RowSource>>,
    {
        let mut sources = PendingSources(sources.into_iter().collect());
        let mut cx = Context::default();
        let mut multiple_results = vec![];

        let result_maps = &self.statement.result_maps;
        let mut index = 0;

        while index < result_maps.len() {
            let Some(source) = sources.0.pop_front() else {
                break;
            };
            let mut rowset = RowSet::new(source, self.schema.clone());
            let result_map = self.schema.result_map(&result_maps[index])?.clone();

            cx.start_result_set();
            match handler.as_deref_mut() {
                Some(handler) => {
                    self.check_result_handler(&result_map)?;
                    let mut sink = Sink::Handler(handler);
                    self.handle_row_values(&mut cx, &mut rowset, &result_map, &mut sink, self.bounds, self.statement.result_ordered)?;
                }
                None => {
                    let mut collect = DefaultResultHandler::new();
                    let mut sink = Sink::Handler(&mut collect);
                    self.handle_row_values(&mut cx, &mut rowset, &result_map, &mut sink, self.bounds, self.statement.result_ordered)?;
                    multiple_results.push(Value::List(collect.into_list()));
                }
            }

            rowset.close()?;
            cx.nested_result_objects.clear();
            index += 1;
        }

        // Named resultsets that feed properties of the objects mapped above
        let result_sets = &self.statement.result_sets;
        while index < result_sets.len() {
            let Some(source) = sources.0.pop_front() else {
                break;
            };
            let mut rowset = RowSet::new(source, self.schema.clone());

            if let Some(parent_mapping) = cx.next_result_maps.get(&result_sets[index]).cloned() {
                let Some(nested_id) = &parent_mapping.nested_result_map_id else {
                    return Err(Error::invalid_schema(format!(
                        "resultset `{}` has no result map",
                        result_sets[index]
                    )));
                };
                let result_map = self.schema.result_map(nested_id)?.clone();

                cx.start_result_set();
                let mut sink = Sink::Parent(&parent_mapping);
                self.handle_row_values(&mut cx, &mut rowset, &result_map, &mut sink, RowBounds::DEFAULT, self.statement.result_ordered)?;
            }

            rowset.close()?;
            cx.nested_result_objects.clear();
            index += 1;
        }

        Ok(multiple_results)
    }

    /// Maps the rows of one resultset into `sink`.
    pub(crate) fn handle_row_values(
        &self,
        cx: &mut Context,
        rowset: &mut RowSet,
        result_map: &Arc<ResultMap>,
        sink: &mut Sink<'_>,
        bounds: RowBounds,
        ordered: bool,
    ) -> Result<()> {
        if result_map.has_nested_result_maps() {
            self.ensure_no_row_bounds(bounds)?;
            self.handle_row_values_for_nested_result_map(cx, rowset, result_map, sink, bounds, ordered)
        } else {
            self.handle_row_values_for_simple_result_map(cx, rowset, result_map, sink, bounds)
        }
    }

    fn ensure_no_row_bounds(&self, bounds: RowBounds) -> Result<()> {
        if self.schema.settings.safe_row_bounds_enabled && !bounds.is_default() {
            return Err(Error::invalid_state(format!(
                "statement `{}` has nested result maps and cannot be safely constrained by row bounds",
                self.statement.id
            )));
        }
        Ok(())
    }

    fn check_result_handler(&self, result_map: &ResultMap) -> Result<()> {
        if self.schema.settings.safe_result_handler_enabled
            && result_map.has_nested_result_maps()
            && !self.statement.result_ordered
        {
            return Err(Error::invalid_state(format!(
                "statement `{}` has nested result maps and cannot be safely used with a custom result handler unless its results are ordered",
                self.statement.id
            )));
        }
        Ok(())
    }

    fn should_process_more_rows(context: &ResultContext, bounds: RowBounds) -> bool {
        !context.is_stopped() && context.result_count() < bounds.limit
    }

    fn store_object(
        &self,
        cx: &mut Context,
        rowset: &RowSet,
        sink: &mut Sink<'_>,
        context: &mut ResultContext,
        value: Value,
    ) -> Result<()> {
        match sink {
            Sink::Parent(parent_mapping) => self.link_to_parents(cx, rowset, parent_mapping, value),
            Sink::Handler(handler) => {
                context.next_result();
                handler.handle_result(context, value)
            }
        }
    }

    fn meta<'a>(&'a self, object: &'a ObjectRef) -> MetaObject<'a> {
        MetaObject::new(object, &self.schema.types, &*self.schema.object_factory)
    }
}

impl Context {
    /// Resets what depends on the columns of the current resultset.
    fn start_result_set(&mut self) {
        self.auto_mappings.clear();
    }
}

impl Drop for PendingSources {
    fn drop(&mut self) {
        for source in &mut self.0 {
            if !source.is_closed() {
                if let Err(err) = source.close() {
                    tracing::debug!(error = %err, "failed to close row source");
                }
            }
        }
    }
}

/// Combines a column prefix inherited from the enclosing mapping with the
/// mapping's own prefix. Prefixes are compared upper-cased.
pub(crate) fn column_prefix(parent_prefix: Option<&str>, mapping: &ResultMapping) -> Option<String> {
    let mut prefix = String::new();
    if let Some(parent) = parent_prefix {
        prefix.push_str(parent);
    }
    if let Some(own) = &mapping.column_prefix {
        prefix.push_str(own);
    }

    if prefix.is_empty() {
        None
    } else {
        Some(prefix.to_uppercase())
    }
}
