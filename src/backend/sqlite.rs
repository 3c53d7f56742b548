use std::str::FromStr;
use std::sync::OnceLock;
use std::time::Instant;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::{QueryBuilder, Row, Sqlite};

use crate::catalog::FilterOptions;
use crate::errors::QueryError;
use crate::import::DataSource;
use crate::query::{
    Categorical, Fragment, PageResult, Pagination, Predicate, Query, SqlParam, compile, order_by,
};
use crate::record::{SaleRecord, SaleRow, parse_date};
use crate::utils::num::{i64_to_usize_saturating, u128_to_u64_saturating, usize_to_i64_saturating};

const SCHEMA: &str = r"
CREATE TABLE IF NOT EXISTS sales (
    id INTEGER PRIMARY KEY,
    transaction_id TEXT NOT NULL DEFAULT '',
    date TEXT,
    customer_id TEXT NOT NULL DEFAULT '',
    customer_name TEXT NOT NULL DEFAULT '',
    phone_number TEXT NOT NULL DEFAULT '',
    gender TEXT NOT NULL DEFAULT '',
    age INTEGER,
    customer_region TEXT NOT NULL DEFAULT '',
    customer_type TEXT NOT NULL DEFAULT '',
    product_id TEXT NOT NULL DEFAULT '',
    product_name TEXT NOT NULL DEFAULT '',
    brand TEXT NOT NULL DEFAULT '',
    product_category TEXT NOT NULL DEFAULT '',
    tags TEXT NOT NULL DEFAULT '',
    quantity INTEGER,
    price_per_unit REAL,
    discount_percentage REAL,
    total_amount REAL,
    final_amount REAL,
    payment_method TEXT NOT NULL DEFAULT '',
    order_status TEXT NOT NULL DEFAULT '',
    delivery_type TEXT NOT NULL DEFAULT '',
    store_id TEXT NOT NULL DEFAULT '',
    store_location TEXT NOT NULL DEFAULT '',
    salesperson_id TEXT NOT NULL DEFAULT '',
    employee_name TEXT NOT NULL DEFAULT ''
);
CREATE TABLE IF NOT EXISTS sale_tags (
    sale_id INTEGER NOT NULL REFERENCES sales(id),
    tag TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_sale_tags_tag ON sale_tags(tag, sale_id);
CREATE INDEX IF NOT EXISTS idx_sales_customer_region ON sales(customer_region);
CREATE INDEX IF NOT EXISTS idx_sales_gender ON sales(gender);
CREATE INDEX IF NOT EXISTS idx_sales_product_category ON sales(product_category);
CREATE INDEX IF NOT EXISTS idx_sales_payment_method ON sales(payment_method);
CREATE INDEX IF NOT EXISTS idx_sales_age ON sales(age);
CREATE INDEX IF NOT EXISTS idx_sales_date ON sales(date);
";

const INSERT_COLUMNS: &str = "INSERT INTO sales (id, transaction_id, date, customer_id, \
    customer_name, phone_number, gender, age, customer_region, customer_type, product_id, \
    product_name, brand, product_category, tags, quantity, price_per_unit, discount_percentage, \
    total_amount, final_amount, payment_method, order_status, delivery_type, store_id, \
    store_location, salesperson_id, employee_name) ";

const ROW_COLUMNS: &str = "SELECT transaction_id, date, customer_id, customer_name, phone_number, \
    gender, age, customer_region, product_category, quantity, total_amount, product_id, \
    employee_name FROM sales";

/// Create the tables and indexes if they are missing.
pub async fn ensure_schema(pool: &SqlitePool) -> Result<(), QueryError> {
    sqlx::raw_sql(SCHEMA).execute(pool).await?;
    Ok(())
}

/// Insert `records` into an empty `sales` table in one transaction.
///
/// Row ids are load positions starting at 1, which the page query uses as its tie-break.
pub async fn import_records(
    pool: &SqlitePool,
    records: &[SaleRecord],
    batch_size: usize,
) -> Result<u64, QueryError> {
    let mut tx = pool.begin().await?;
    let mut inserted = 0u64;
    let batch_size = batch_size.max(1);
    for (chunk_no, chunk) in records.chunks(batch_size).enumerate() {
        let base = chunk_no * batch_size;
        let rows = chunk
            .iter()
            .enumerate()
            .map(move |(i, r)| (usize_to_i64_saturating(base + i + 1), r));

        let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new(INSERT_COLUMNS);
        qb.push_values(rows.clone(), |mut b, (id, r)| {
            b.push_bind(id)
                .push_bind(r.transaction_id.as_str())
                .push_bind(r.date.map(|d| d.format("%Y-%m-%d").to_string()))
                .push_bind(r.customer_id.as_str())
                .push_bind(r.customer_name.as_str())
                .push_bind(r.phone_number.as_str())
                .push_bind(r.gender.as_str())
                .push_bind(r.age)
                .push_bind(r.customer_region.as_str())
                .push_bind(r.customer_type.as_str())
                .push_bind(r.product_id.as_str())
                .push_bind(r.product_name.as_str())
                .push_bind(r.brand.as_str())
                .push_bind(r.product_category.as_str())
                .push_bind(r.tags.as_str())
                .push_bind(r.quantity)
                .push_bind(r.price_per_unit)
                .push_bind(r.discount_percentage)
                .push_bind(r.total_amount)
                .push_bind(r.final_amount)
                .push_bind(r.payment_method.as_str())
                .push_bind(r.order_status.as_str())
                .push_bind(r.delivery_type.as_str())
                .push_bind(r.store_id.as_str())
                .push_bind(r.store_location.as_str())
                .push_bind(r.salesperson_id.as_str())
                .push_bind(r.employee_name.as_str());
        });
        inserted += qb.build().execute(&mut *tx).await?.rows_affected();

        let tags: Vec<(i64, &str)> =
            rows.flat_map(|(id, r)| r.tag_tokens().map(move |t| (id, t))).collect();
        if !tags.is_empty() {
            let mut qb: QueryBuilder<Sqlite> =
                QueryBuilder::new("INSERT INTO sale_tags (sale_id, tag) ");
            qb.push_values(tags, |mut b, (id, tag)| {
                b.push_bind(id).push_bind(tag);
            });
            qb.build().execute(&mut *tx).await?;
        }
    }
    tx.commit().await?;
    Ok(inserted)
}

fn push_predicate(qb: &mut QueryBuilder<'_, Sqlite>, predicate: &Predicate) {
    for frag in predicate.fragments() {
        match frag {
            Fragment::Sql(s) => {
                qb.push(s);
            }
            Fragment::Bind(SqlParam::Text(v)) => {
                qb.push_bind(v.clone());
            }
            Fragment::Bind(SqlParam::Int(v)) => {
                qb.push_bind(*v);
            }
        }
    }
}

fn row_to_sale(row: &SqliteRow) -> Result<SaleRow, sqlx::Error> {
    let date: Option<String> = row.try_get("date")?;
    Ok(SaleRow {
        transaction_id: row.try_get("transaction_id")?,
        date: date.as_deref().and_then(parse_date),
        customer_id: row.try_get("customer_id")?,
        customer_name: row.try_get("customer_name")?,
        phone_number: row.try_get("phone_number")?,
        gender: row.try_get("gender")?,
        age: row.try_get("age")?,
        customer_region: row.try_get("customer_region")?,
        product_category: row.try_get("product_category")?,
        quantity: row.try_get("quantity")?,
        total_amount: row.try_get("total_amount")?,
        product_id: row.try_get("product_id")?,
        employee_name: row.try_get("employee_name")?,
    })
}

/// Pushes filtering, ordering and slicing down to SQLite.
///
/// The count and the page are two independent statements, not one transaction. If the table
/// changes between them, `total` may disagree with the page.
#[derive(Debug)]
pub struct SqliteBackend {
    pool: SqlitePool,
    source: Option<DataSource>,
    batch_size: usize,
    catalog: OnceLock<FilterOptions>,
}

impl SqliteBackend {
    /// Open (creating if missing) the database at `url`. With a `source`, `load` imports it when
    /// the `sales` table is empty.
    pub async fn connect(url: &str, source: Option<DataSource>) -> Result<Self, QueryError> {
        if is_memory_url(url) {
            return Self::in_memory(source).await;
        }
        let opts = SqliteConnectOptions::from_str(url)?.create_if_missing(true);
        let pool = SqlitePoolOptions::new().max_connections(8).connect_with(opts).await?;
        Ok(Self::from_pool(pool, source))
    }

    /// A private in-memory database. One connection that never recycles, so the data lives as
    /// long as the pool.
    pub async fn in_memory(source: Option<DataSource>) -> Result<Self, QueryError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await?;
        Ok(Self::from_pool(pool, source))
    }

    #[must_use]
    pub fn from_pool(pool: SqlitePool, source: Option<DataSource>) -> Self {
        let batch_size = match &source {
            Some(DataSource::Csv { options, .. }) => options.batch_size,
            _ => 500,
        };
        Self { pool, source, batch_size, catalog: OnceLock::new() }
    }

    #[must_use]
    pub const fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    async fn count_rows(&self) -> Result<usize, QueryError> {
        let n: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sales").fetch_one(&self.pool).await?;
        Ok(i64_to_usize_saturating(n))
    }

    async fn distinct(&self, field: Categorical) -> Result<Vec<String>, QueryError> {
        let col = field.column();
        let sql = format!("SELECT DISTINCT {col} FROM sales WHERE {col} <> ''");
        Ok(sqlx::query_scalar(&sql).fetch_all(&self.pool).await?)
    }

    async fn build_catalog(&self) -> Result<FilterOptions, QueryError> {
        let started = Instant::now();
        let tags: Vec<String> =
            sqlx::query_scalar("SELECT DISTINCT tag FROM sale_tags").fetch_all(&self.pool).await?;
        let catalog = FilterOptions::from_distinct(
            self.distinct(Categorical::CustomerRegion).await?,
            self.distinct(Categorical::Gender).await?,
            self.distinct(Categorical::ProductCategory).await?,
            self.distinct(Categorical::PaymentMethod).await?,
            tags,
        );
        crate::devlog!(
            "{}",
            serde_json::json!({
                "op": "catalog",
                "backend": "sqlite",
                "tags": catalog.tags.len(),
                "ms": u128_to_u64_saturating(started.elapsed().as_millis()),
            })
        );
        Ok(catalog)
    }

    async fn count(&self, predicate: &Predicate) -> Result<usize, QueryError> {
        let started = Instant::now();
        let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new("SELECT COUNT(*) FROM sales");
        push_predicate(&mut qb, predicate);
        let n: i64 = qb.build_query_scalar().fetch_one(&self.pool).await?;
        crate::devlog!(
            "{}",
            serde_json::json!({
                "op": "count",
                "backend": "sqlite",
                "total": n,
                "ms": u128_to_u64_saturating(started.elapsed().as_millis()),
            })
        );
        Ok(i64_to_usize_saturating(n))
    }

    async fn page(&self, predicate: &Predicate, query: &Query) -> Result<Vec<SaleRow>, QueryError> {
        let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new(ROW_COLUMNS);
        push_predicate(&mut qb, predicate);
        qb.push(order_by(query.sort));
        qb.push(" LIMIT ").push_bind(usize_to_i64_saturating(query.page.limit()));
        qb.push(" OFFSET ").push_bind(usize_to_i64_saturating(query.page.offset()));
        let rows = qb.build().fetch_all(&self.pool).await?;
        Ok(rows.iter().map(row_to_sale).collect::<Result<_, _>>()?)
    }
}

fn is_memory_url(url: &str) -> bool {
    matches!(url, "sqlite::memory:" | "sqlite://:memory:" | ":memory:")
}

impl super::SalesBackend for SqliteBackend {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    async fn load(&self) -> Result<usize, QueryError> {
        ensure_schema(&self.pool).await?;
        if let Some(source) = &self.source
            && self.count_rows().await? == 0
        {
            let (records, report) = source.read().await?;
            let inserted = import_records(&self.pool, &records, self.batch_size).await?;
            log::info!("imported {inserted} records into sqlite ({} skipped)", report.skipped);
        }
        let catalog = self.build_catalog().await?;
        let _ = self.catalog.set(catalog);
        self.count_rows().await
    }

    async fn filter_options(&self) -> Result<FilterOptions, QueryError> {
        self.catalog.get().cloned().ok_or(QueryError::NotReady)
    }

    async fn execute(&self, query: &Query) -> Result<PageResult, QueryError> {
        if self.catalog.get().is_none() {
            return Err(QueryError::NotReady);
        }
        let started = Instant::now();
        let predicate = compile(&query.criteria, query.as_of);
        let total = self.count(&predicate).await?;
        let data = self.page(&predicate, query).await?;
        crate::devlog!(
            "{}",
            serde_json::json!({
                "op": "query",
                "backend": "sqlite",
                "where": predicate.to_string(),
                "total": total,
                "page": query.page.page(),
                "ms": u128_to_u64_saturating(started.elapsed().as_millis()),
            })
        );
        Ok(PageResult { data, pagination: Pagination::new(total, query.page) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::SalesBackend;
    use crate::query::{FilterCriteria, PageRequest, SortSpec};
    use chrono::NaiveDate;

    fn rec(id: &str, tags: &str) -> SaleRecord {
        SaleRecord {
            transaction_id: id.into(),
            customer_name: format!("name {id}"),
            tags: tags.into(),
            ..SaleRecord::default()
        }
    }

    #[tokio::test]
    async fn load_imports_once_and_builds_catalog() {
        let source = DataSource::records(vec![rec("T1", "a, b"), rec("T2", " b ,,c")]);
        let b = SqliteBackend::in_memory(Some(source)).await.unwrap();
        assert!(b.filter_options().await.unwrap_err().is_not_ready());
        assert_eq!(b.load().await.unwrap(), 2);
        // a second load finds the table populated and does not import again
        assert_eq!(b.load().await.unwrap(), 2);
        assert_eq!(b.filter_options().await.unwrap().tags, ["a", "b", "c"]);
        let tag_rows: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM sale_tags").fetch_one(b.pool()).await.unwrap();
        assert_eq!(tag_rows, 4);
    }

    #[tokio::test]
    async fn batches_keep_load_positions() {
        let records: Vec<_> = (0..7).map(|i| rec(&format!("T{i}"), "")).collect();
        let b = SqliteBackend::in_memory(None).await.unwrap();
        ensure_schema(b.pool()).await.unwrap();
        assert_eq!(import_records(b.pool(), &records, 3).await.unwrap(), 7);
        let ids: Vec<i64> =
            sqlx::query_scalar("SELECT id FROM sales ORDER BY id").fetch_all(b.pool()).await.unwrap();
        assert_eq!(ids, (1..=7).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn page_query_binds_limit_and_offset() {
        let records: Vec<_> = (0..5).map(|i| rec(&format!("T{i}"), "")).collect();
        let b = SqliteBackend::in_memory(Some(DataSource::records(records))).await.unwrap();
        b.load().await.unwrap();
        let q = Query {
            criteria: FilterCriteria::default(),
            sort: SortSpec::default(),
            page: PageRequest::new(2, 2),
            as_of: NaiveDate::from_ymd_opt(2024, 6, 10).unwrap(),
        };
        let _g = crate::utils::devlog::enable_thread_sink();
        let res = b.execute(&q).await.unwrap();
        let ids: Vec<_> = res.data.iter().map(|r| r.transaction_id.as_str()).collect();
        assert_eq!(ids, ["T2", "T3"]);
        assert_eq!(res.pagination.total_pages, 3);
        let ops: Vec<String> = crate::utils::devlog::drain()
            .iter()
            .map(|l| serde_json::from_str::<serde_json::Value>(l).unwrap()["op"].to_string())
            .collect();
        assert_eq!(ops, ["\"count\"", "\"query\""]);
    }

    #[tokio::test]
    async fn load_logs_catalog_timing() {
        let b = SqliteBackend::in_memory(Some(DataSource::records(vec![rec("T1", "a")])))
            .await
            .unwrap();
        let _g = crate::utils::devlog::enable_thread_sink();
        b.load().await.unwrap();
        let lines = crate::utils::devlog::drain();
        assert!(lines.iter().any(|l| l.contains("\"op\":\"catalog\"")));
    }
}
