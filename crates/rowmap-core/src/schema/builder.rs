use super::{MappedStatement, ResultMap, ResultMapping, Schema};
use crate::{
    handler::{TypeHandler, TypeHandlerRegistry},
    driver::SqlType,
    object::{Constructor, DefaultObjectFactory, ObjectFactory, ObjectType, Types},
    stmt::Type,
    Error, Result, Settings,
};

use indexmap::IndexMap;
use std::{collections::HashSet, sync::Arc};

/// Collects object types, result maps and statements, then resolves and
/// verifies them into a [`Schema`].
#[derive(Debug, Default)]
pub struct Builder {
    settings: Settings,
    types: Types,
    handlers: TypeHandlerRegistry,
    object_factory: Option<Arc<dyn ObjectFactory>>,
    result_maps: IndexMap<String, ResultMap>,
    statements: IndexMap<String, MappedStatement>,
}

/// Used to track state while result maps are resolved
struct Resolve<'a> {
    builder: &'a Builder,

    /// Result maps with inheritance applied, by id
    resolved: IndexMap<String, Vec<ResultMapping>>,

    /// Result maps whose parents are being resolved; detects `extends` cycles
    in_progress: HashSet<String>,
}

impl Builder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn settings(&mut self, settings: Settings) -> &mut Self {
        self.settings = settings;
        self
    }

    pub fn object_type(&mut self, ty: ObjectType) -> &mut Self {
        self.types.register(ty);
        self
    }

    pub fn type_handler(
        &mut self,
        ty: Type,
        sql_type: Option<SqlType>,
        handler: Arc<dyn TypeHandler>,
    ) -> &mut Self {
        self.handlers.register(ty, sql_type, handler);
        self
    }

    pub fn object_factory(&mut self, factory: Arc<dyn ObjectFactory>) -> &mut Self {
        self.object_factory = Some(factory);
        self
    }

    pub fn result_map(&mut self, result_map: ResultMap) -> &mut Self {
        self.result_maps.insert(result_map.id.clone(), result_map);
        self
    }

    pub fn statement(&mut self, statement: MappedStatement) -> &mut Self {
        self.statements.insert(statement.id.clone(), statement);
        self
    }

    pub fn build(&mut self) -> Result<Schema> {
        // Statements declaring only a result type get an implicit result map
        let inline: Vec<_> = self
            .statements
            .values_mut()
            .filter_map(|statement| {
                let ty = statement.result_type.take()?;
                let id = statement.inline_result_map_id();
                statement.result_maps.insert(0, id.clone());
                Some(ResultMap::new(id, ty))
            })
            .collect();
        for result_map in inline {
            self.result_map(result_map);
        }

        let mut resolve = Resolve {
            builder: self,
            resolved: IndexMap::new(),
            in_progress: HashSet::new(),
        };
        for id in self.result_maps.keys() {
            resolve.inherited_mappings(id)?;
        }
        let mut resolved = resolve.resolved;

        let mut result_maps = IndexMap::new();
        for (id, result_map) in &self.result_maps {
            let mut result_map = result_map.clone();
            let mappings = resolved.swap_remove(id).unwrap_or_default();
            let mappings = mappings
                .into_iter()
                .map(|mapping| self.resolve_mapping(&result_map, mapping))
                .collect::<Result<Vec<_>>>()?;

            if let Some(mapping) = result_map.discriminator.as_ref().map(|d| d.mapping.clone()) {
                let mapping = self.resolve_mapping(&result_map, mapping)?;
                if let Some(discriminator) = &mut result_map.discriminator {
                    discriminator.mapping = mapping;
                }
            }

            result_map.finalize(mappings);
            result_maps.insert(id.clone(), Arc::new(result_map));
        }

        let statements = self
            .statements
            .iter()
            .map(|(id, statement)| (id.clone(), Arc::new(statement.clone())))
            .collect();

        let schema = Schema {
            settings: self.settings.clone(),
            types: self.types.clone(),
            handlers: self.handlers.clone(),
            object_factory: self
                .object_factory
                .clone()
                .unwrap_or_else(|| Arc::new(DefaultObjectFactory)),
            result_maps,
            statements,
        };

        schema.verify()?;

        Ok(schema)
    }

    /// Fills in the property type and, where possible, the type handler.
    fn resolve_mapping(&self, owner: &ResultMap, mut mapping: ResultMapping) -> Result<ResultMapping> {
        if mapping.ty == Type::Any {
            if let Some(property) = &mapping.property {
                mapping.ty = self.declared_type(owner, property, mapping.flags.constructor);
            }
        }

        mapping.composites = mapping
            .composites
            .into_iter()
            .map(|composite| self.resolve_mapping(owner, composite))
            .collect::<Result<_>>()?;

        if mapping.is_simple() && mapping.handler.is_none() {
            mapping.handler = self.handlers.get(&mapping.ty, mapping.sql_type);
        }

        if mapping.nested_result_map_id.is_some() && mapping.nested_query_id.is_some() {
            return Err(Error::invalid_schema(format!(
                "mapping `{}` of result map `{}` cannot have both a nested result map and a nested query",
                mapping.property.as_deref().unwrap_or_default(),
                owner.id
            )));
        }

        Ok(mapping)
    }

    fn declared_type(&self, owner: &ResultMap, property: &str, constructor: bool) -> Type {
        let Some(object_type) = self.types.resolve(&owner.ty) else {
            return Type::Any;
        };

        if constructor {
            if let Constructor::Args(params) = &object_type.constructor {
                if let Some(param) = params.iter().find(|param| param.name == property) {
                    return param.ty.clone();
                }
            }
        }

        // Dotted paths take the type of their last segment
        let mut ty = object_type.clone();
        let mut segments = property.split('.').peekable();
        while let Some(segment) = segments.next() {
            let declared = ty.setter_type(segment);
            if segments.peek().is_none() {
                return declared;
            }
            match self.types.resolve(&declared) {
                Some(next) => ty = next.clone(),
                None => return Type::Any,
            }
        }
        Type::Any
    }
}

impl Resolve<'_> {
    /// Mappings of `id` with its ancestors' mappings merged in. A mapping of
    /// the child replaces an inherited mapping for the same property, and
    /// child constructor mappings replace every inherited one.
    fn inherited_mappings(&mut self, id: &str) -> Result<Vec<ResultMapping>> {
        if let Some(mappings) = self.resolved.get(id) {
            return Ok(mappings.clone());
        }

        let Some(result_map) = self.builder.result_maps.get(id) else {
            return Err(Error::invalid_schema(format!("result map `{id}` not found")));
        };

        let mut mappings = result_map.mappings.clone();

        if let Some(parent) = &result_map.extends {
            if !self.in_progress.insert(id.to_string()) {
                return Err(Error::invalid_schema(format!(
                    "result map `{id}` extends itself"
                )));
            }
            let inherited = self.inherited_mappings(parent)?;
            self.in_progress.remove(id);

            let declares_constructor = mappings.iter().any(|m| m.flags.constructor);
            for mapping in inherited {
                if declares_constructor && mapping.flags.constructor {
                    continue;
                }
                let overridden = mappings
                    .iter()
                    .any(|m| m.property.is_some() && m.property == mapping.property);
                if !overridden {
                    mappings.push(mapping);
                }
            }
        }

        self.resolved.insert(id.to_string(), mappings.clone());
        Ok(mappings)
    }
}
