use crate::stmt::Type;

/// A select statement as seen by the mapping engine: which result maps
/// apply to its resultsets.
#[derive(Debug, Clone)]
pub struct MappedStatement {
    pub id: String,

    /// Result map per resultset, in order
    pub result_maps: Vec<String>,

    /// Names of the resultsets, in order. Resultsets beyond the mapped ones
    /// are only reachable through named resultset mappings.
    pub result_sets: Vec<String>,

    /// Rows of one parent are contiguous, so a parent can be emitted as soon
    /// as the next one starts
    pub result_ordered: bool,

    /// Target of an implicit result map with no mappings
    pub result_type: Option<Type>,

    /// Type of the parameter nested queries pass to this statement.
    /// Composite parameters default to a map.
    pub parameter_type: Option<Type>,

    /// Statement text, part of the cache key of each invocation
    pub sql: String,
}

impl MappedStatement {
    pub fn new(id: impl Into<String>) -> MappedStatement {
        MappedStatement {
            id: id.into(),
            result_maps: vec![],
            result_sets: vec![],
            result_ordered: false,
            result_type: None,
            parameter_type: None,
            sql: String::new(),
        }
    }

    pub fn result_map(mut self, id: impl Into<String>) -> Self {
        self.result_maps.push(id.into());
        self
    }

    /// Maps every row to `ty` through automatic mapping alone.
    pub fn result_type(mut self, ty: Type) -> Self {
        self.result_type = Some(ty);
        self
    }

    pub fn parameter_type(mut self, ty: Type) -> Self {
        self.parameter_type = Some(ty);
        self
    }

    pub fn sql(mut self, sql: impl Into<String>) -> Self {
        self.sql = sql.into();
        self
    }

    pub fn result_sets<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.result_sets = names.into_iter().map(Into::into).collect();
        self
    }

    pub fn ordered(mut self, ordered: bool) -> Self {
        self.result_ordered = ordered;
        self
    }

    /// Id of the implicit result map created for `result_type`.
    pub fn inline_result_map_id(&self) -> String {
        format!("{}-Inline", self.id)
    }

    pub fn has_nested_result_maps(&self, schema: &super::Schema) -> bool {
        self.result_maps.iter().any(|id| {
            schema
                .result_map(id)
                .is_ok_and(|result_map| result_map.has_nested_result_maps())
        })
    }
}
