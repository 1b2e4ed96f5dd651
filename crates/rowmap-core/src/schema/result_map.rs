use super::{Discriminator, ResultMapping};
use crate::stmt::Type;

use std::collections::HashSet;

/// Describes how rows become instances of one target type.
#[derive(Debug, Clone)]
pub struct ResultMap {
    pub id: String,

    /// Target type: an object type, or a scalar read from a single column
    pub ty: Type,

    /// Result map whose mappings this one inherits
    pub extends: Option<String>,

    pub discriminator: Option<Discriminator>,

    /// Overrides the global automatic mapping behavior
    pub auto_mapping: Option<bool>,

    /// Mappings as declared, before inheritance
    pub mappings: Vec<ResultMapping>,

    // Derived when the schema is built
    result_mappings: Vec<ResultMapping>,
    id_result_mappings: Vec<ResultMapping>,
    constructor_result_mappings: Vec<ResultMapping>,
    property_result_mappings: Vec<ResultMapping>,
    mapped_columns: HashSet<String>,
    mapped_properties: HashSet<String>,
    has_nested_result_maps: bool,
    has_nested_queries: bool,
}

impl ResultMap {
    pub fn new(id: impl Into<String>, ty: Type) -> ResultMap {
        ResultMap {
            id: id.into(),
            ty,
            extends: None,
            discriminator: None,
            auto_mapping: None,
            mappings: vec![],
            result_mappings: vec![],
            id_result_mappings: vec![],
            constructor_result_mappings: vec![],
            property_result_mappings: vec![],
            mapped_columns: HashSet::new(),
            mapped_properties: HashSet::new(),
            has_nested_result_maps: false,
            has_nested_queries: false,
        }
    }

    pub fn mapping(mut self, mapping: ResultMapping) -> Self {
        self.mappings.push(mapping);
        self
    }

    pub fn extends(mut self, parent: impl Into<String>) -> Self {
        self.extends = Some(parent.into());
        self
    }

    pub fn discriminator(mut self, discriminator: Discriminator) -> Self {
        self.discriminator = Some(discriminator);
        self
    }

    pub fn auto_mapping(mut self, enabled: bool) -> Self {
        self.auto_mapping = Some(enabled);
        self
    }

    /// Every mapping, constructor mappings included.
    pub fn result_mappings(&self) -> &[ResultMapping] {
        &self.result_mappings
    }

    /// Mappings that make up the row identity: the ones flagged as ids, or
    /// every mapping when none is.
    pub fn id_result_mappings(&self) -> &[ResultMapping] {
        &self.id_result_mappings
    }

    pub fn constructor_result_mappings(&self) -> &[ResultMapping] {
        &self.constructor_result_mappings
    }

    pub fn property_result_mappings(&self) -> &[ResultMapping] {
        &self.property_result_mappings
    }

    /// Upper-cased columns read by the mappings.
    pub fn mapped_columns(&self) -> &HashSet<String> {
        &self.mapped_columns
    }

    pub fn mapped_properties(&self) -> &HashSet<String> {
        &self.mapped_properties
    }

    pub fn has_nested_result_maps(&self) -> bool {
        self.has_nested_result_maps
    }

    pub fn has_nested_queries(&self) -> bool {
        self.has_nested_queries
    }

    /// Computes the derived views from `result_mappings`.
    pub(super) fn finalize(&mut self, result_mappings: Vec<ResultMapping>) {
        self.mapped_columns.clear();
        self.mapped_properties.clear();
        self.id_result_mappings.clear();
        self.constructor_result_mappings.clear();
        self.property_result_mappings.clear();
        self.has_nested_result_maps = false;
        self.has_nested_queries = false;

        for mapping in &result_mappings {
            self.has_nested_queries |= mapping.nested_query_id.is_some();
            self.has_nested_result_maps |=
                mapping.nested_result_map_id.is_some() && mapping.result_set.is_none();

            for column in mapping.columns() {
                self.mapped_columns.insert(column.to_uppercase());
            }

            if let Some(property) = &mapping.property {
                self.mapped_properties.insert(property.clone());
            }

            if mapping.flags.constructor {
                self.constructor_result_mappings.push(mapping.clone());
            } else {
                self.property_result_mappings.push(mapping.clone());
            }

            if mapping.flags.id {
                self.id_result_mappings.push(mapping.clone());
            }
        }

        if self.id_result_mappings.is_empty() {
            self.id_result_mappings = result_mappings.clone();
        }

        self.result_mappings = result_mappings;
    }
}
