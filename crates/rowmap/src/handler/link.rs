use super::ResultSetHandler;
use rowmap_core::{
    object::ObjectRef,
    schema::ResultMapping,
    stmt::{Type, Value},
    Error, Result,
};

impl ResultSetHandler {
    /// Attaches `value` to the property `mapping` targets: appended when the
    /// property is a collection, assigned otherwise.
    pub(super) fn link_objects(&self, object: &ObjectRef, mapping: &ResultMapping, value: Value) -> Result<()> {
        let property = Self::linked_property(mapping)?;
        let meta = self.meta(object);

        if self.instantiate_collection_property_if_appropriate(object, mapping)? {
            meta.add(property, value)
        } else {
            meta.set_value(property, value)
        }
    }

    /// Creates an empty collection for a collection property that is still
    /// unset. Returns whether the property holds a collection.
    pub(super) fn instantiate_collection_property_if_appropriate(
        &self,
        object: &ObjectRef,
        mapping: &ResultMapping,
    ) -> Result<bool> {
        let property = Self::linked_property(mapping)?;
        let meta = self.meta(object);

        match meta.get_value(property)? {
            Value::Null => {
                let ty = self.property_type(object, mapping, property);
                if self.schema.object_factory.is_collection(&ty) {
                    meta.set_value(property, Value::List(vec![]))?;
                    Ok(true)
                } else {
                    Ok(false)
                }
            }
            Value::List(_) => Ok(true),
            _ => Ok(false),
        }
    }

    /// Declared type of the property a mapping writes, falling back to the
    /// target object's setter type.
    pub(super) fn property_type(&self, object: &ObjectRef, mapping: &ResultMapping, property: &str) -> Type {
        match &mapping.ty {
            Type::Any => self.meta(object).setter_type(property),
            ty => ty.clone(),
        }
    }

    fn linked_property(mapping: &ResultMapping) -> Result<&str> {
        mapping.property.as_deref().ok_or_else(|| {
            Error::invalid_schema("a nested mapping must name the property it fills")
        })
    }
}
