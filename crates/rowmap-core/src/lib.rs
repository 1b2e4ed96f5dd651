#[macro_use]
mod error;
pub use error::{Error, IntoError};

pub mod driver;
pub use driver::RowSource;

pub mod handler;

mod key;
pub use key::CacheKey;

pub mod object;

pub mod schema;
pub use schema::Schema;

mod settings;
pub use settings::{AutoMappingBehavior, Settings, UnknownColumnBehavior};

pub mod stmt;

pub type Result<T, E = Error> = core::result::Result<T, E>;
