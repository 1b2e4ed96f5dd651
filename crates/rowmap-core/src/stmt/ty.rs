use std::fmt;

/// Application-level type of a value, property or result map target.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Type {
    /// Any value; conversion is left to the column's native type
    Any,

    /// Boolean value
    Bool,

    /// Signed 32-bit integer
    I32,

    /// Signed 64-bit integer
    I64,

    /// 64-bit floating point number
    F64,

    /// String value
    String,

    /// Byte array
    Bytes,

    /// A collection of items of the given type
    List(Box<Type>),

    /// An object of a registered object type, by name
    Object(String),
}

impl Type {
    pub fn list(item: impl Into<Type>) -> Type {
        Type::List(Box::new(item.into()))
    }

    pub fn object(name: impl Into<String>) -> Type {
        Type::Object(name.into())
    }

    pub fn is_list(&self) -> bool {
        matches!(self, Type::List(_))
    }

    pub fn is_object(&self) -> bool {
        matches!(self, Type::Object(_))
    }

    /// Scalar types carry a single column value and have built-in handlers.
    pub fn is_scalar(&self) -> bool {
        matches!(
            self,
            Type::Bool | Type::I32 | Type::I64 | Type::F64 | Type::String | Type::Bytes
        )
    }

    /// Returns the item type of a list, or the type itself otherwise.
    pub fn item(&self) -> &Type {
        match self {
            Type::List(item) => item,
            ty => ty,
        }
    }

    pub fn as_object_name(&self) -> Option<&str> {
        match self {
            Type::Object(name) => Some(name),
            _ => None,
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Any => f.write_str("Any"),
            Type::Bool => f.write_str("Bool"),
            Type::I32 => f.write_str("I32"),
            Type::I64 => f.write_str("I64"),
            Type::F64 => f.write_str("F64"),
            Type::String => f.write_str("String"),
            Type::Bytes => f.write_str("Bytes"),
            Type::List(item) => write!(f, "List<{item}>"),
            Type::Object(name) => f.write_str(name),
        }
    }
}
