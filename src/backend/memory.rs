use std::sync::{Arc, OnceLock};
use std::time::Instant;

use crate::catalog::FilterOptions;
use crate::errors::QueryError;
use crate::import::DataSource;
use crate::query::{PageResult, Query, filter_records, paginate, sort_records};
use crate::record::SaleRecord;
use crate::utils::num::u128_to_u64_saturating;

use super::SalesBackend;

/// Immutable after load; shared by every in-flight query.
#[derive(Debug)]
struct Snapshot {
    records: Arc<[SaleRecord]>,
    catalog: FilterOptions,
}

/// Evaluates queries by scanning the whole dataset held in memory.
#[derive(Debug)]
pub struct MemoryBackend {
    source: DataSource,
    snapshot: OnceLock<Arc<Snapshot>>,
}

impl MemoryBackend {
    #[must_use]
    pub fn new(source: DataSource) -> Self {
        Self { source, snapshot: OnceLock::new() }
    }

    fn snapshot(&self) -> Result<&Arc<Snapshot>, QueryError> {
        self.snapshot.get().ok_or(QueryError::NotReady)
    }
}

impl SalesBackend for MemoryBackend {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn load(&self) -> Result<usize, QueryError> {
        if let Some(s) = self.snapshot.get() {
            return Ok(s.records.len());
        }
        let (records, _report) = self.source.read().await?;
        let started = Instant::now();
        let catalog = FilterOptions::from_records(&records);
        crate::devlog!(
            "{}",
            serde_json::json!({
                "op": "catalog",
                "backend": "memory",
                "tags": catalog.tags.len(),
                "ms": u128_to_u64_saturating(started.elapsed().as_millis()),
            })
        );
        let snap = self.snapshot.get_or_init(|| Arc::new(Snapshot { records, catalog }));
        Ok(snap.records.len())
    }

    async fn filter_options(&self) -> Result<FilterOptions, QueryError> {
        Ok(self.snapshot()?.catalog.clone())
    }

    async fn execute(&self, query: &Query) -> Result<PageResult, QueryError> {
        let snap = Arc::clone(self.snapshot()?);
        let started = Instant::now();
        let matched = filter_records(&snap.records, &query.criteria, query.as_of);
        let ordered = sort_records(&matched, query.sort);
        let page = paginate(&ordered, query.page);
        let result = PageResult {
            data: page.items.iter().map(|r| r.to_row()).collect(),
            pagination: page.pagination,
        };
        crate::devlog!(
            "{}",
            serde_json::json!({
                "op": "query",
                "backend": "memory",
                "total": result.pagination.total,
                "page": result.pagination.page,
                "ms": u128_to_u64_saturating(started.elapsed().as_millis()),
            })
        );
        Ok(result)
    }
}
