use super::ObjectType;
use crate::stmt::Type;

use indexmap::IndexMap;
use std::sync::Arc;

/// Registry of the object types mapping targets can refer to by name.
#[derive(Debug, Clone)]
pub struct Types {
    types: IndexMap<String, Arc<ObjectType>>,
}

impl Types {
    /// Name of the built-in map-like type.
    pub const MAP: &'static str = "map";

    pub fn new() -> Types {
        let mut types = Types {
            types: IndexMap::new(),
        };
        types.register(ObjectType::map(Types::MAP));
        types
    }

    /// Registers a type, replacing any previous type of the same name.
    pub fn register(&mut self, ty: ObjectType) -> Arc<ObjectType> {
        let ty = Arc::new(ty);
        self.types.insert(ty.name.clone(), ty.clone());
        ty
    }

    pub fn get(&self, name: &str) -> Option<&Arc<ObjectType>> {
        self.types.get(name)
    }

    pub fn map(&self) -> &Arc<ObjectType> {
        &self.types[Types::MAP]
    }

    /// Object type behind `ty`, looking through lists.
    pub fn resolve(&self, ty: &Type) -> Option<&Arc<ObjectType>> {
        match ty {
            Type::Object(name) => self.get(name),
            Type::List(item) => self.resolve(item),
            _ => None,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<ObjectType>> {
        self.types.values()
    }
}

impl Default for Types {
    fn default() -> Self {
        Types::new()
    }
}
