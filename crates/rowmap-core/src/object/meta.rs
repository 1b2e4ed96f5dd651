use super::{ObjectFactory, ObjectRef, ObjectType, PathSegment, PropertyPath, Types};
use crate::{
    stmt::{Type, Value},
    Error, Result,
};

use std::sync::Arc;

/// Path-based access to a mapped object.
///
/// Reads walk `a.b[0].c` through nested objects, lists and map-like objects.
/// Writes create missing intermediate objects from the declared property
/// types.
#[derive(Debug, Clone, Copy)]
pub struct MetaObject<'a> {
    object: &'a ObjectRef,
    types: &'a Types,
    factory: &'a dyn ObjectFactory,
}

impl<'a> MetaObject<'a> {
    pub fn new(object: &'a ObjectRef, types: &'a Types, factory: &'a dyn ObjectFactory) -> Self {
        MetaObject {
            object,
            types,
            factory,
        }
    }

    pub fn object(&self) -> &ObjectRef {
        self.object
    }

    pub fn ty(&self) -> &Arc<ObjectType> {
        self.object.ty()
    }

    pub fn find_property(&self, name: &str, underscore_to_camel: bool) -> Option<String> {
        self.ty().find_property(name, underscore_to_camel)
    }

    pub fn get_value(&self, path: &str) -> Result<Value> {
        let path = PropertyPath::parse(path)?;
        let mut current = Value::Object(self.object.clone());

        for segment in path.segments() {
            let Value::Object(object) = &current else {
                return Ok(Value::Null);
            };
            let value = object.get(&segment.name)?;
            current = match &segment.index {
                Some(_) => index_into(&value, segment)?,
                None => value,
            };
        }

        Ok(current)
    }

    /// Writes `value` at `path`, instantiating null intermediate objects.
    pub fn set_value(&self, path: &str, value: Value) -> Result<()> {
        let path = PropertyPath::parse(path)?;
        let mut parent = self.object.clone();
        let (last, intermediate) = (path.last(), path.parents());

        for segment in intermediate {
            parent = self.child_for_write(&parent, segment)?;
        }

        match last.position() {
            Some(position) => {
                let mut items = match parent.get(&last.name)? {
                    Value::List(items) => items,
                    other => return Err(Error::type_conversion(other, "List")),
                };
                let Some(slot) = items.get_mut(position) else {
                    return Err(Error::invalid_state(format!(
                        "index {position} out of bounds for `{}`",
                        last.name
                    )));
                };
                *slot = value;
                parent.set(&last.name, items);
            }
            None => parent.set(&last.name, value),
        }

        Ok(())
    }

    /// Appends to the collection at `path`, creating it on first use.
    pub fn add(&self, path: &str, value: Value) -> Result<()> {
        let path = PropertyPath::parse(path)?;
        let (last, intermediate) = (path.last(), path.parents());

        let mut parent = self.object.clone();
        for segment in intermediate {
            parent = self.child_for_write(&parent, segment)?;
        }
        parent.push(&last.name, value)
    }

    pub fn has_setter(&self, path: &str) -> bool {
        let Ok(path) = PropertyPath::parse(path) else {
            return false;
        };
        let (last, intermediate) = (path.last(), path.parents());

        let mut ty = self.ty().clone();
        for segment in intermediate {
            match self.segment_type(&ty, segment) {
                Some(next) => ty = next,
                None => return false,
            }
        }
        ty.has_setter(&last.name)
    }

    /// Declared type at `path`; `Any` when it cannot be determined.
    pub fn setter_type(&self, path: &str) -> Type {
        let Ok(path) = PropertyPath::parse(path) else {
            return Type::Any;
        };
        let (last, intermediate) = (path.last(), path.parents());

        let mut ty = self.ty().clone();
        for segment in intermediate {
            match self.segment_type(&ty, segment) {
                Some(next) => ty = next,
                None => return Type::Any,
            }
        }

        let declared = ty.setter_type(&last.name);
        match &last.index {
            Some(_) => declared.item().clone(),
            None => declared,
        }
    }

    fn segment_type(&self, ty: &ObjectType, segment: &PathSegment) -> Option<Arc<ObjectType>> {
        let declared = ty.setter_type(&segment.name);
        match declared {
            Type::Any if ty.is_map() => Some(self.types.map().clone()),
            declared => self.types.resolve(&declared).cloned(),
        }
    }

    fn child_for_write(&self, parent: &ObjectRef, segment: &PathSegment) -> Result<ObjectRef> {
        let value = parent.get(&segment.name)?;
        let value = match &segment.index {
            Some(_) => index_into(&value, segment)?,
            None => value,
        };

        match value {
            Value::Object(child) => Ok(child),
            Value::Null if segment.index.is_none() => {
                let Some(ty) = self.segment_type(parent.ty(), segment) else {
                    return Err(Error::invalid_schema(format!(
                        "cannot instantiate property `{}` of `{}`",
                        segment.name,
                        parent.type_name()
                    )));
                };
                let child = self.factory.create(&ty)?;
                parent.set(&segment.name, child.clone());
                Ok(child)
            }
            value => Err(Error::type_conversion(value, "Object")),
        }
    }
}

fn index_into(value: &Value, segment: &PathSegment) -> Result<Value> {
    match value {
        Value::List(items) => Ok(segment
            .position()
            .and_then(|position| items.get(position))
            .cloned()
            .unwrap_or_default()),
        Value::Object(object) if object.ty().is_map() => {
            let key = segment.index.as_deref().unwrap_or_default();
            object.get(key)
        }
        Value::Null => Ok(Value::Null),
        value => Err(Error::type_conversion(value.clone(), "List")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::DefaultObjectFactory;

    fn types() -> Types {
        let mut types = Types::new();
        types.register(
            ObjectType::bean("Author")
                .property("id", Type::I64)
                .property("name", Type::String),
        );
        types.register(
            ObjectType::bean("Blog")
                .property("id", Type::I64)
                .property("author", Type::object("Author"))
                .property("tags", Type::list(Type::String)),
        );
        types
    }

    #[test]
    fn set_creates_intermediate_objects() {
        let types = types();
        let blog = ObjectRef::new(types.get("Blog").unwrap().clone());
        let meta = MetaObject::new(&blog, &types, &DefaultObjectFactory);

        meta.set_value("author.name", Value::from("jane")).unwrap();

        let author = blog.peek("author");
        assert_eq!(author.expect_object().type_name(), "Author");
        assert_eq!(meta.get_value("author.name").unwrap(), Value::from("jane"));
    }

    #[test]
    fn indexed_access() {
        let types = types();
        let blog = ObjectRef::new(types.get("Blog").unwrap().clone());
        let meta = MetaObject::new(&blog, &types, &DefaultObjectFactory);

        meta.add("tags", Value::from("a")).unwrap();
        meta.add("tags", Value::from("b")).unwrap();
        meta.set_value("tags[1]", Value::from("c")).unwrap();

        assert_eq!(meta.get_value("tags[1]").unwrap(), Value::from("c"));
        assert_eq!(meta.get_value("tags[5]").unwrap(), Value::Null);
        assert_eq!(meta.setter_type("tags[0]"), Type::String);
    }

    #[test]
    fn setter_introspection_follows_paths() {
        let types = types();
        let blog = ObjectRef::new(types.get("Blog").unwrap().clone());
        let meta = MetaObject::new(&blog, &types, &DefaultObjectFactory);

        assert!(meta.has_setter("author.name"));
        assert!(!meta.has_setter("author.email"));
        assert_eq!(meta.setter_type("author.id"), Type::I64);
        assert_eq!(meta.setter_type("nothing.here"), Type::Any);
    }

    #[test]
    fn map_objects_accept_nested_paths() {
        let types = types();
        let map = ObjectRef::new(types.map().clone());
        let meta = MetaObject::new(&map, &types, &DefaultObjectFactory);

        meta.set_value("outer.inner", Value::I32(1)).unwrap();
        assert_eq!(meta.get_value("outer.inner").unwrap(), Value::I32(1));
        assert_eq!(meta.get_value("outer[inner]").unwrap(), Value::I32(1));
    }
}
