//! Dynamic object model the mapping engine builds graphs out of.
//!
//! Target types are described once by an [`ObjectType`] (a compiled table of
//! properties and their types) instead of being discovered by reflection.
//! Mapped objects are shared through [`ObjectRef`] so that joined rows can
//! keep extending an already emitted parent, and so that circular mappings
//! can point back at an ancestor.

mod factory;
pub use factory::{DefaultObjectFactory, ObjectFactory};

mod lazy;
pub use lazy::{Lazy, LazyOptions, Loader};

mod meta;
pub use meta::MetaObject;

mod object_ref;
pub use object_ref::ObjectRef;

mod object_type;
pub use object_type::{Constructor, ObjectKind, ObjectType, Property};

mod path;
pub use path::{PathSegment, PropertyPath};

mod types;
pub use types::Types;
