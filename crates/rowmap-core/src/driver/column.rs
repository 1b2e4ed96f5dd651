use crate::stmt::{Type, Value};

/// Column metadata reported by a row source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub name: String,

    /// Alias given in the select list; same as `name` when there is none
    pub label: String,

    /// Declared SQL type
    pub sql_type: SqlType,

    /// Type the driver produces for this column
    pub class: Type,
}

/// SQL type of a column, as declared by the database.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SqlType {
    Boolean,
    Integer,
    BigInt,
    Double,
    Varchar,
    Blob,
    Null,
    Other,
}

impl Column {
    pub fn new(name: impl Into<String>, sql_type: SqlType) -> Column {
        let name = name.into();
        Column {
            label: name.clone(),
            name,
            sql_type,
            class: sql_type.native_type(),
        }
    }

    pub fn label(mut self, label: impl Into<String>) -> Column {
        self.label = label.into();
        self
    }

    pub fn class(mut self, class: Type) -> Column {
        self.class = class;
        self
    }
}

impl SqlType {
    /// Type drivers produce for values of this SQL type.
    pub fn native_type(self) -> Type {
        match self {
            SqlType::Boolean => Type::Bool,
            SqlType::Integer => Type::I32,
            SqlType::BigInt => Type::I64,
            SqlType::Double => Type::F64,
            SqlType::Varchar => Type::String,
            SqlType::Blob => Type::Bytes,
            SqlType::Null | SqlType::Other => Type::Any,
        }
    }

    /// SQL type a value would be stored as.
    pub fn of(value: &Value) -> SqlType {
        match value {
            Value::Bool(_) => SqlType::Boolean,
            Value::I32(_) => SqlType::Integer,
            Value::I64(_) => SqlType::BigInt,
            Value::F64(_) => SqlType::Double,
            Value::String(_) => SqlType::Varchar,
            Value::Bytes(_) => SqlType::Blob,
            Value::Null => SqlType::Null,
            Value::List(_) | Value::Object(_) => SqlType::Other,
        }
    }
}
