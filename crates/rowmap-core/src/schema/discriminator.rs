use super::ResultMapping;
use crate::stmt::Type;

use indexmap::IndexMap;

/// Picks a more specific result map from the value of a column.
#[derive(Debug, Clone)]
pub struct Discriminator {
    /// Column read to select a case
    pub mapping: ResultMapping,

    /// Column value, as displayed, to result map id
    pub cases: IndexMap<String, String>,
}

impl Discriminator {
    pub fn new(column: impl Into<String>) -> Discriminator {
        Discriminator {
            mapping: ResultMapping::unnamed(column),
            cases: IndexMap::new(),
        }
    }

    pub fn ty(mut self, ty: Type) -> Self {
        self.mapping.ty = ty;
        self
    }

    pub fn case(mut self, value: impl Into<String>, result_map_id: impl Into<String>) -> Self {
        self.cases.insert(value.into(), result_map_id.into());
        self
    }

    pub fn map_id_for(&self, value: &str) -> Option<&str> {
        self.cases.get(value).map(String::as_str)
    }
}
