#![allow(dead_code)]

use std::path::PathBuf;

use chrono::NaiveDate;
use salesquery::import::DataSource;
use salesquery::{FixedClock, MemoryBackend, QueryService, SqliteBackend};

pub fn fixture_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/sales_sample.csv")
}

/// The day the fixture dates are measured from.
pub fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, 10).unwrap()
}

pub fn memory_service(source: DataSource) -> QueryService<MemoryBackend> {
    QueryService::new(MemoryBackend::new(source)).with_clock(FixedClock(today()))
}

pub async fn sqlite_service(source: DataSource) -> QueryService<SqliteBackend> {
    let backend = SqliteBackend::in_memory(Some(source)).await.unwrap();
    QueryService::new(backend).with_clock(FixedClock(today()))
}

pub fn ids(page: &salesquery::PageResult) -> Vec<String> {
    page.data.iter().map(|r| r.transaction_id.clone()).collect()
}
