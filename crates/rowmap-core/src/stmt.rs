mod row_bounds;
pub use row_bounds::RowBounds;

mod ty;
pub use ty::Type;

mod value;
pub use value::Value;

mod value_hash;
pub(crate) use value_hash::hash_code;
