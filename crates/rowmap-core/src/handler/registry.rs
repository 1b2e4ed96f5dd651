use super::{AnyHandler, ConvertHandler, TypeHandler};
use crate::{driver::SqlType, stmt::Type};

use std::{collections::HashMap, sync::Arc};

/// Type handlers by target type, optionally narrowed to a SQL type.
///
/// A lookup first tries the exact `(type, sql type)` pair and then the
/// handler registered for the type regardless of SQL type.
#[derive(Debug, Clone)]
pub struct TypeHandlerRegistry {
    handlers: HashMap<(Type, Option<SqlType>), Arc<dyn TypeHandler>>,
    any: Arc<dyn TypeHandler>,
}

impl TypeHandlerRegistry {
    /// Registry with the built-in scalar conversions and the pass-through
    /// handler for `Any`.
    pub fn new() -> TypeHandlerRegistry {
        let any: Arc<dyn TypeHandler> = Arc::new(AnyHandler);
        let mut registry = TypeHandlerRegistry {
            handlers: HashMap::new(),
            any: any.clone(),
        };

        for ty in [
            Type::Bool,
            Type::I32,
            Type::I64,
            Type::F64,
            Type::String,
            Type::Bytes,
        ] {
            registry.register(ty.clone(), None, Arc::new(ConvertHandler::new(ty)));
        }
        registry.register(Type::Any, None, any);

        registry
    }

    pub fn register(
        &mut self,
        ty: Type,
        sql_type: Option<SqlType>,
        handler: Arc<dyn TypeHandler>,
    ) {
        self.handlers.insert((ty, sql_type), handler);
    }

    pub fn get(&self, ty: &Type, sql_type: Option<SqlType>) -> Option<Arc<dyn TypeHandler>> {
        if sql_type.is_some() {
            if let Some(handler) = self.handlers.get(&(ty.clone(), sql_type)) {
                return Some(handler.clone());
            }
        }
        self.handlers.get(&(ty.clone(), None)).cloned()
    }

    pub fn has_handler(&self, ty: &Type, sql_type: Option<SqlType>) -> bool {
        self.get(ty, sql_type).is_some()
    }

    /// The pass-through handler, used when nothing more specific applies.
    pub fn any(&self) -> Arc<dyn TypeHandler> {
        self.any.clone()
    }
}

impl Default for TypeHandlerRegistry {
    fn default() -> Self {
        TypeHandlerRegistry::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{stmt::Value, Result};

    #[derive(Debug)]
    struct YesNo;

    impl TypeHandler for YesNo {
        fn get(&self, raw: &Value) -> Result<Value> {
            Ok(Value::Bool(raw.as_str() == Some("Y")))
        }
    }

    #[test]
    fn exact_match_wins() {
        let mut registry = TypeHandlerRegistry::new();
        registry.register(Type::Bool, Some(SqlType::Varchar), Arc::new(YesNo));

        let handler = registry.get(&Type::Bool, Some(SqlType::Varchar)).unwrap();
        assert_eq!(handler.get(&Value::from("Y")).unwrap(), Value::Bool(true));

        let handler = registry.get(&Type::Bool, Some(SqlType::Integer)).unwrap();
        assert_eq!(handler.get(&Value::I32(1)).unwrap(), Value::Bool(true));
    }

    #[test]
    fn objects_have_no_builtin_handler() {
        let registry = TypeHandlerRegistry::new();
        assert!(!registry.has_handler(&Type::object("Author"), None));
        assert!(!registry.has_handler(&Type::list(Type::I64), None));
        assert!(registry.has_handler(&Type::Any, Some(SqlType::Other)));
    }
}
