//! Filter, sort and paginate a retail sales dataset, either in memory or pushed down to SQLite,
//! with identical results from both.

pub mod backend;
pub mod catalog;
pub mod cli;
pub mod config;
pub mod errors;
pub mod import;
pub mod logger;
pub mod query;
pub mod record;
pub mod service;
pub mod utils;

pub use backend::{AnyBackend, MemoryBackend, SalesBackend, SqliteBackend};
pub use catalog::FilterOptions;
pub use errors::{ErrorKind, QueryError};
pub use query::{PageResult, Pagination, Query, RawQuery};
pub use record::{SaleRecord, SaleRow};
pub use service::{FixedClock, Health, QueryService, SystemClock};

/// Initializes logging from the `SALESQ_LOG_*` environment variables.
///
/// # Errors
/// Returns an error if the log directory cannot be created or a logger is already installed.
pub fn init() -> Result<(), Box<dyn std::error::Error>> {
    logger::configure_from_env()
}
