use super::{Constructor, ObjectRef, ObjectType};
use crate::{
    stmt::{Type, Value},
    Error, Result,
};

use std::{fmt, sync::Arc};

/// Creates target objects on behalf of the mapping engine.
pub trait ObjectFactory: fmt::Debug + Send + Sync {
    /// Creates an empty instance through the default constructor.
    fn create(&self, ty: &Arc<ObjectType>) -> Result<ObjectRef>;

    /// Creates an instance from named constructor arguments, in parameter
    /// order.
    fn create_with_args(&self, ty: &Arc<ObjectType>, args: Vec<(String, Value)>)
        -> Result<ObjectRef>;

    /// Whether values of `ty` are collections that nested rows append to.
    fn is_collection(&self, ty: &Type) -> bool {
        ty.is_list()
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultObjectFactory;

impl ObjectFactory for DefaultObjectFactory {
    fn create(&self, ty: &Arc<ObjectType>) -> Result<ObjectRef> {
        if !ty.has_default_constructor() {
            return Err(Error::invalid_schema(format!(
                "`{}` has no default constructor",
                ty.name
            )));
        }
        Ok(ObjectRef::new(ty.clone()))
    }

    fn create_with_args(
        &self,
        ty: &Arc<ObjectType>,
        args: Vec<(String, Value)>,
    ) -> Result<ObjectRef> {
        if let Constructor::Args(params) = &ty.constructor {
            if params.len() != args.len() {
                return Err(Error::invalid_schema(format!(
                    "constructor of `{}` takes {} arguments, got {}",
                    ty.name,
                    params.len(),
                    args.len()
                )));
            }
        }

        let object = ObjectRef::new(ty.clone());
        for (name, value) in args {
            object.set(&name, value);
        }
        Ok(object)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_requires_default_constructor() {
        let ty = Arc::new(
            ObjectType::bean("Point")
                .read_only("x", Type::I32)
                .read_only("y", Type::I32)
                .constructor(["x", "y"]),
        );

        let err = DefaultObjectFactory.create(&ty).unwrap_err();
        assert!(err.is_invalid_schema());

        let point = DefaultObjectFactory
            .create_with_args(
                &ty,
                vec![("x".into(), Value::I32(1)), ("y".into(), Value::I32(2))],
            )
            .unwrap();
        assert_eq!(point.peek("y"), Value::I32(2));
    }

    #[test]
    fn argument_count_must_match() {
        let ty = Arc::new(
            ObjectType::bean("Point")
                .read_only("x", Type::I32)
                .constructor(["x"]),
        );
        assert!(DefaultObjectFactory.create_with_args(&ty, vec![]).is_err());
    }
}
