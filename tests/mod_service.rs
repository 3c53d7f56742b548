mod common;

use std::sync::Arc;
use std::time::Duration;

use salesquery::backend::{MemoryBackend, SalesBackend};
use salesquery::catalog::FilterOptions;
use salesquery::import::DataSource;
use salesquery::query::{PageResult, Query, RawQuery};
use salesquery::{QueryError, QueryService, SaleRecord};
use tokio::sync::Notify;

use common::{fixture_path, ids, memory_service, sqlite_service};

fn female_26_35_page_2() -> RawQuery {
    RawQuery {
        gender: Some("Female".into()),
        age_range: Some("26-35".into()),
        sort_by: Some("Total Amount".into()),
        sort_order: Some("desc".into()),
        page: Some("2".into()),
        limit: Some("10".into()),
        ..RawQuery::default()
    }
}

fn expected_page_2() -> Vec<String> {
    (10..20).map(|k| format!("TF{k:02}")).collect()
}

#[tokio::test]
async fn end_to_end_female_26_35_by_amount_desc_memory() {
    let svc = memory_service(DataSource::csv(fixture_path()));
    assert_eq!(svc.initialize().await.unwrap(), 60);
    let page = svc.query(&female_26_35_page_2()).await.unwrap();
    assert_eq!(page.pagination.total, 25);
    assert_eq!(page.pagination.total_pages, 3);
    assert_eq!(page.pagination.page, 2);
    assert_eq!(ids(&page), expected_page_2());
    let json = serde_json::to_value(&page).unwrap();
    assert_eq!(json["pagination"]["totalPages"], 3);
    assert_eq!(json["data"][0]["Total Amount"], 900.0);
}

#[tokio::test]
async fn end_to_end_female_26_35_by_amount_desc_sqlite() {
    let svc = sqlite_service(DataSource::csv(fixture_path())).await;
    assert_eq!(svc.initialize().await.unwrap(), 60);
    let page = svc.query(&female_26_35_page_2()).await.unwrap();
    assert_eq!(page.pagination.total, 25);
    assert_eq!(page.pagination.total_pages, 3);
    assert_eq!(ids(&page), expected_page_2());
}

#[tokio::test]
async fn catalogs_agree_across_backends() {
    let mem = memory_service(DataSource::csv(fixture_path()));
    let sql = sqlite_service(DataSource::csv(fixture_path())).await;
    mem.initialize().await.unwrap();
    sql.initialize().await.unwrap();
    let a = mem.catalog().unwrap();
    assert_eq!(a, sql.catalog().unwrap());
    assert_eq!(a.genders, ["Female", "Male", "Other"]);
    assert_eq!(a.tags, ["clearance", "new", "organic", "premium", "sale"]);
    assert_eq!(a.age_ranges, ["18-25", "26-35", "36-50", "51+"]);
    assert_eq!(a.date_ranges.len(), 4);
    for list in [&a.customer_regions, &a.product_categories, &a.payment_methods, &a.tags] {
        assert!(list.iter().all(|v| !v.is_empty()));
        assert!(list.windows(2).all(|w| w[0] < w[1]));
    }
}

#[tokio::test]
async fn impossible_criteria_is_empty_not_an_error() {
    let svc = memory_service(DataSource::csv(fixture_path()));
    svc.initialize().await.unwrap();
    let raw = RawQuery {
        gender: Some("Female".into()),
        age_range: Some("51+".into()),
        customer_region: Some("Atlantis".into()),
        ..RawQuery::default()
    };
    let page = svc.query(&raw).await.unwrap();
    assert!(page.data.is_empty());
    assert_eq!(page.pagination.total, 0);
    assert_eq!(page.pagination.total_pages, 0);
}

#[tokio::test]
async fn empty_criteria_returns_everything_by_name() {
    let svc = memory_service(DataSource::csv(fixture_path()));
    svc.initialize().await.unwrap();
    let page = svc.query(&RawQuery { limit: Some("100".into()), ..RawQuery::default() }).await.unwrap();
    assert_eq!(page.pagination.total, 60);
    let names: Vec<String> =
        page.data.iter().map(|r| r.customer_name.to_ascii_lowercase()).collect();
    assert!(names.windows(2).all(|w| w[0] <= w[1]));
}

/// Wraps a backend and holds `load` until released.
struct GatedBackend {
    inner: MemoryBackend,
    gate: Arc<Notify>,
}

impl SalesBackend for GatedBackend {
    fn name(&self) -> &'static str {
        "gated"
    }

    async fn load(&self) -> Result<usize, QueryError> {
        self.gate.notified().await;
        self.inner.load().await
    }

    async fn filter_options(&self) -> Result<FilterOptions, QueryError> {
        self.inner.filter_options().await
    }

    async fn execute(&self, query: &Query) -> Result<PageResult, QueryError> {
        self.inner.execute(query).await
    }
}

#[tokio::test]
async fn concurrent_initialize_and_queries_see_not_ready_while_loading() {
    let gate = Arc::new(Notify::new());
    let records = vec![SaleRecord { transaction_id: "T1".into(), ..SaleRecord::default() }];
    let svc = QueryService::new(GatedBackend {
        inner: MemoryBackend::new(DataSource::records(records)),
        gate: Arc::clone(&gate),
    });

    let first = svc.initialize();
    let others = async {
        // the first initialize is parked on the gate by now
        tokio::task::yield_now().await;
        let second = svc.initialize().await;
        let query = svc.query(&RawQuery::default()).await;
        let loading_health = svc.health();
        gate.notify_one();
        (second, query, loading_health)
    };
    let (first, (second, query, loading_health)) = tokio::join!(first, others);

    assert_eq!(first.unwrap(), 1);
    assert!(second.unwrap_err().is_not_ready());
    assert!(query.unwrap_err().is_not_ready());
    assert!(!loading_health.data_loaded);
    assert!(svc.health().data_loaded);
}

#[tokio::test]
async fn abandoned_initialize_can_be_retried() {
    let gate = Arc::new(Notify::new());
    let records = vec![SaleRecord { transaction_id: "T1".into(), ..SaleRecord::default() }];
    let svc = QueryService::new(GatedBackend {
        inner: MemoryBackend::new(DataSource::records(records)),
        gate: Arc::clone(&gate),
    });

    let timed_out = tokio::time::timeout(Duration::from_millis(50), svc.initialize()).await;
    assert!(timed_out.is_err());
    assert!(!svc.is_ready());
    assert!(!svc.health().data_loaded);

    // stores a permit for the next load
    gate.notify_one();
    assert_eq!(svc.initialize().await.unwrap(), 1);
    assert_eq!(svc.query(&RawQuery::default()).await.unwrap().pagination.total, 1);
}
