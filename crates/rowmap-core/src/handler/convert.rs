use super::TypeHandler;
use crate::{
    stmt::{Type, Value},
    Error, Result,
};

/// Converts between the built-in scalar types.
///
/// Null always converts to null. Integers narrow only when the value fits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConvertHandler {
    to: Type,
}

/// Passes raw values through unchanged.
#[derive(Debug, Default, Clone, Copy)]
pub struct AnyHandler;

impl ConvertHandler {
    /// # Panics
    ///
    /// Panics if `to` is not a scalar type.
    #[track_caller]
    pub fn new(to: Type) -> ConvertHandler {
        assert!(to.is_scalar(), "no built-in conversion to {to}");
        ConvertHandler { to }
    }

    pub fn target(&self) -> &Type {
        &self.to
    }

    fn convert(&self, raw: &Value) -> Option<Value> {
        let value = match (&self.to, raw) {
            (_, Value::Null) => Value::Null,

            (Type::Bool, Value::Bool(v)) => Value::Bool(*v),
            (Type::Bool, Value::I32(v)) => Value::Bool(*v != 0),
            (Type::Bool, Value::I64(v)) => Value::Bool(*v != 0),
            (Type::Bool, Value::String(v)) => Value::Bool(v.trim().parse().ok()?),

            (Type::I32, Value::I32(v)) => Value::I32(*v),
            (Type::I32, Value::I64(v)) => Value::I32(i32::try_from(*v).ok()?),
            (Type::I32, Value::Bool(v)) => Value::I32(*v as i32),
            (Type::I32, Value::String(v)) => Value::I32(v.trim().parse().ok()?),

            (Type::I64, Value::I32(v)) => Value::I64(*v as i64),
            (Type::I64, Value::I64(v)) => Value::I64(*v),
            (Type::I64, Value::Bool(v)) => Value::I64(*v as i64),
            (Type::I64, Value::String(v)) => Value::I64(v.trim().parse().ok()?),

            (Type::F64, Value::F64(v)) => Value::F64(*v),
            (Type::F64, Value::I32(v)) => Value::F64(*v as f64),
            (Type::F64, Value::I64(v)) => Value::F64(*v as f64),
            (Type::F64, Value::String(v)) => Value::F64(v.trim().parse().ok()?),

            (Type::String, Value::String(v)) => Value::String(v.clone()),
            (Type::String, Value::Bytes(v)) => Value::String(String::from_utf8(v.clone()).ok()?),
            (
                Type::String,
                v @ (Value::Bool(_) | Value::I32(_) | Value::I64(_) | Value::F64(_)),
            ) => Value::String(v.to_string()),

            (Type::Bytes, Value::Bytes(v)) => Value::Bytes(v.clone()),
            (Type::Bytes, Value::String(v)) => Value::Bytes(v.as_bytes().to_vec()),

            _ => return None,
        };
        Some(value)
    }
}

impl TypeHandler for ConvertHandler {
    fn get(&self, raw: &Value) -> Result<Value> {
        self.convert(raw)
            .ok_or_else(|| Error::type_conversion(raw.clone(), self.to.to_string()))
    }
}

impl TypeHandler for AnyHandler {
    fn get(&self, raw: &Value) -> Result<Value> {
        Ok(raw.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn widen_and_narrow() {
        let i32_handler = ConvertHandler::new(Type::I32);
        assert_eq!(i32_handler.get(&Value::I64(7)).unwrap(), Value::I32(7));
        assert!(i32_handler
            .get(&Value::I64(i64::MAX))
            .unwrap_err()
            .is_type_conversion());

        let i64_handler = ConvertHandler::new(Type::I64);
        assert_eq!(i64_handler.get(&Value::I32(7)).unwrap(), Value::I64(7));
    }

    #[test]
    fn parse_strings() {
        assert_eq!(
            ConvertHandler::new(Type::I64).get(&Value::from(" 42 ")).unwrap(),
            Value::I64(42)
        );
        assert_eq!(
            ConvertHandler::new(Type::Bool).get(&Value::from("true")).unwrap(),
            Value::Bool(true)
        );

        let err = ConvertHandler::new(Type::I64)
            .get(&Value::from("abc"))
            .unwrap_err();
        assert_eq!(err.to_string(), "cannot convert String to I64");
    }

    #[test]
    fn null_stays_null() {
        for ty in [Type::Bool, Type::I32, Type::String, Type::Bytes] {
            assert!(ConvertHandler::new(ty).get(&Value::Null).unwrap().is_null());
        }
    }

    #[test]
    fn to_string() {
        let handler = ConvertHandler::new(Type::String);
        assert_eq!(handler.get(&Value::F64(1.5)).unwrap(), Value::from("1.5"));
    }
}
