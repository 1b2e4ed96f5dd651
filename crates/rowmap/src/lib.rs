pub mod cursor;
pub use cursor::Cursor;

pub mod executor;
pub use executor::{CachingExecutor, Executor, LocalExecutor, StatementRunner};

mod handler;
pub use handler::ResultSetHandler;

mod result_handler;
pub use result_handler::{DefaultResultHandler, ResultContext, ResultHandler};

mod rowset;
pub use rowset::RowSet;

pub use rowmap_core::{
    driver::{self, MemoryRows, RowSource},
    object::{self, ObjectRef},
    schema::{self, Schema},
    stmt::{self, RowBounds, Type, Value},
    AutoMappingBehavior, CacheKey, Error, Result, Settings, UnknownColumnBehavior,
};
