use crate::stmt::Type;

use indexmap::IndexMap;

/// Compiled description of a mapping target: its properties, their types
/// and how instances are constructed.
#[derive(Debug, Clone)]
pub struct ObjectType {
    /// Name the type is registered under
    pub name: String,

    pub kind: ObjectKind,

    /// Declared properties, in declaration order. Map-like types accept any
    /// property and usually declare none.
    pub properties: IndexMap<String, Property>,

    pub constructor: Constructor,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectKind {
    /// Fixed set of declared properties
    Bean,

    /// Accepts any property name; the row key of a map-typed result map is
    /// built from every column.
    Map,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Constructor {
    /// Instances can be created empty and filled through setters
    Default,

    /// The only way to build an instance is with these arguments, in order
    Args(Vec<Property>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Property {
    pub name: String,
    pub ty: Type,

    /// Whether the property can be written after construction
    pub settable: bool,

    /// Whether null can be stored (used with `call_setters_on_nulls`)
    pub nullable: bool,
}

impl ObjectType {
    pub fn bean(name: impl Into<String>) -> ObjectType {
        ObjectType {
            name: name.into(),
            kind: ObjectKind::Bean,
            properties: IndexMap::new(),
            constructor: Constructor::Default,
        }
    }

    pub fn map(name: impl Into<String>) -> ObjectType {
        ObjectType {
            kind: ObjectKind::Map,
            ..ObjectType::bean(name)
        }
    }

    /// Adds a settable, nullable property.
    pub fn property(mut self, name: impl Into<String>, ty: Type) -> ObjectType {
        let property = Property::new(name, ty);
        self.properties.insert(property.name.clone(), property);
        self
    }

    /// Adds a settable property that cannot hold null.
    pub fn required(mut self, name: impl Into<String>, ty: Type) -> ObjectType {
        let property = Property {
            nullable: false,
            ..Property::new(name, ty)
        };
        self.properties.insert(property.name.clone(), property);
        self
    }

    /// Adds a property that can only be provided through the constructor.
    pub fn read_only(mut self, name: impl Into<String>, ty: Type) -> ObjectType {
        let property = Property {
            settable: false,
            ..Property::new(name, ty)
        };
        self.properties.insert(property.name.clone(), property);
        self
    }

    /// Replaces the default constructor with one taking the named properties.
    ///
    /// # Panics
    ///
    /// Panics if a name does not refer to a declared property.
    #[track_caller]
    pub fn constructor<'a>(mut self, params: impl IntoIterator<Item = &'a str>) -> ObjectType {
        let params = params
            .into_iter()
            .map(|name| match self.properties.get(name) {
                Some(property) => property.clone(),
                None => panic!("constructor parameter `{name}` is not a property of `{}`", self.name),
            })
            .collect();
        self.constructor = Constructor::Args(params);
        self
    }

    pub fn is_map(&self) -> bool {
        self.kind == ObjectKind::Map
    }

    pub fn has_default_constructor(&self) -> bool {
        matches!(self.constructor, Constructor::Default)
    }

    pub fn property_named(&self, name: &str) -> Option<&Property> {
        self.properties.get(name)
    }

    /// Resolves a column-derived name to a declared property.
    ///
    /// Matching ignores ASCII case; with `underscore_to_camel` underscores are
    /// dropped first, so `first_name` finds `firstName`. Map-like types accept
    /// the name unchanged.
    pub fn find_property(&self, name: &str, underscore_to_camel: bool) -> Option<String> {
        if self.is_map() {
            return Some(name.to_string());
        }

        let candidate = if underscore_to_camel {
            name.replace('_', "")
        } else {
            name.to_string()
        };

        self.properties
            .keys()
            .find(|property| property.eq_ignore_ascii_case(&candidate))
            .cloned()
    }

    pub fn has_setter(&self, name: &str) -> bool {
        match self.kind {
            ObjectKind::Map => true,
            ObjectKind::Bean => self.properties.get(name).is_some_and(|p| p.settable),
        }
    }

    /// Declared type of a property; `Any` for map-like types and unknown names.
    pub fn setter_type(&self, name: &str) -> Type {
        self.properties
            .get(name)
            .map(|property| property.ty.clone())
            .unwrap_or(Type::Any)
    }

    pub fn is_nullable(&self, name: &str) -> bool {
        self.properties.get(name).map_or(true, |p| p.nullable)
    }
}

impl Property {
    pub fn new(name: impl Into<String>, ty: Type) -> Property {
        Property {
            name: name.into(),
            ty,
            settable: true,
            nullable: true,
        }
    }
}
