mod builder;
pub use builder::Builder;

mod discriminator;
pub use discriminator::Discriminator;

mod mapped_statement;
pub use mapped_statement::MappedStatement;

mod result_map;
pub use result_map::ResultMap;

mod result_mapping;
pub use result_mapping::{ResultFlags, ResultMapping};

mod verify;

use crate::{
    handler::TypeHandlerRegistry,
    object::{ObjectFactory, ObjectType, Types},
    stmt::Type,
    Error, Result, Settings,
};

use indexmap::IndexMap;
use std::sync::Arc;

/// Everything the mapping engine needs to know about targets and
/// statements. Built once, then shared read-only.
#[derive(Debug)]
pub struct Schema {
    pub settings: Settings,

    pub types: Types,

    pub handlers: TypeHandlerRegistry,

    pub object_factory: Arc<dyn ObjectFactory>,

    result_maps: IndexMap<String, Arc<ResultMap>>,

    statements: IndexMap<String, Arc<MappedStatement>>,
}

impl Schema {
    pub fn builder() -> Builder {
        Builder::default()
    }

    pub fn result_map(&self, id: &str) -> Result<&Arc<ResultMap>> {
        self.result_maps
            .get(id)
            .ok_or_else(|| Error::invalid_schema(format!("result map `{id}` not found")))
    }

    pub fn statement(&self, id: &str) -> Result<&Arc<MappedStatement>> {
        self.statements
            .get(id)
            .ok_or_else(|| Error::invalid_schema(format!("statement `{id}` not found")))
    }

    pub fn result_maps(&self) -> impl Iterator<Item = &Arc<ResultMap>> {
        self.result_maps.values()
    }

    pub fn statements(&self) -> impl Iterator<Item = &Arc<MappedStatement>> {
        self.statements.values()
    }

    /// Object type behind `ty`, looking through lists.
    pub fn object_type(&self, ty: &Type) -> Option<&Arc<ObjectType>> {
        self.types.resolve(ty)
    }
}
