//! Query evaluators. Both answer the same [`Query`] with identical results; the service does not
//! care which one it drives.

mod memory;
mod sqlite;

use std::future::Future;

use crate::catalog::FilterOptions;
use crate::errors::QueryError;
use crate::query::{PageResult, Query};

pub use memory::MemoryBackend;
pub use sqlite::{SqliteBackend, ensure_schema, import_records};

/// A dataset that can be loaded once and then queried concurrently.
pub trait SalesBackend: Send + Sync {
    fn name(&self) -> &'static str;

    /// Load the dataset and return how many records are queryable.
    fn load(&self) -> impl Future<Output = Result<usize, QueryError>> + Send;

    /// Distinct values per filterable field. Fails with `NotReady` before `load`.
    fn filter_options(&self) -> impl Future<Output = Result<FilterOptions, QueryError>> + Send;

    /// Filter, order and slice one page. Fails with `NotReady` before `load`.
    fn execute(&self, query: &Query) -> impl Future<Output = Result<PageResult, QueryError>> + Send;
}

/// Backend picked at runtime from configuration.
#[derive(Debug)]
pub enum AnyBackend {
    Memory(MemoryBackend),
    Sqlite(SqliteBackend),
}

impl SalesBackend for AnyBackend {
    fn name(&self) -> &'static str {
        match self {
            Self::Memory(b) => b.name(),
            Self::Sqlite(b) => b.name(),
        }
    }

    async fn load(&self) -> Result<usize, QueryError> {
        match self {
            Self::Memory(b) => b.load().await,
            Self::Sqlite(b) => b.load().await,
        }
    }

    async fn filter_options(&self) -> Result<FilterOptions, QueryError> {
        match self {
            Self::Memory(b) => b.filter_options().await,
            Self::Sqlite(b) => b.filter_options().await,
        }
    }

    async fn execute(&self, query: &Query) -> Result<PageResult, QueryError> {
        match self {
            Self::Memory(b) => b.execute(query).await,
            Self::Sqlite(b) => b.execute(query).await,
        }
    }
}
