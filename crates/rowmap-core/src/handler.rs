//! Conversion of raw column values into property values.

mod convert;
pub use convert::{AnyHandler, ConvertHandler};

mod registry;
pub use registry::TypeHandlerRegistry;

use crate::{stmt::Value, Result};

use std::fmt::Debug;

/// Converts the raw value of a column into the value stored on a property.
pub trait TypeHandler: Debug + Send + Sync {
    fn get(&self, raw: &Value) -> Result<Value>;
}
