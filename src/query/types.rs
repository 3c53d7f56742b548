use std::collections::BTreeSet;

use chrono::{Datelike, Days, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::record::{SaleRecord, SaleRow};

// Safety limits to prevent resource abuse
pub(crate) const MAX_IN_SET: usize = 1000;
pub(crate) const DEFAULT_PAGE_SIZE: usize = 10;
pub(crate) const MAX_LIMIT: usize = 10_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Order {
    #[default]
    Asc,
    Desc,
}

impl Order {
    /// `desc` in any case selects descending; everything else is ascending.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        if s.trim().eq_ignore_ascii_case("desc") { Self::Desc } else { Self::Asc }
    }

    #[must_use]
    pub const fn as_sql(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

/// The four multi-select text columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Categorical {
    CustomerRegion,
    Gender,
    ProductCategory,
    PaymentMethod,
}

impl Categorical {
    pub const ALL: [Self; 4] =
        [Self::CustomerRegion, Self::Gender, Self::ProductCategory, Self::PaymentMethod];

    #[must_use]
    pub fn value(self, r: &SaleRecord) -> &str {
        match self {
            Self::CustomerRegion => &r.customer_region,
            Self::Gender => &r.gender,
            Self::ProductCategory => &r.product_category,
            Self::PaymentMethod => &r.payment_method,
        }
    }

    #[must_use]
    pub const fn column(self) -> &'static str {
        match self {
            Self::CustomerRegion => "customer_region",
            Self::Gender => "gender",
            Self::ProductCategory => "product_category",
            Self::PaymentMethod => "payment_method",
        }
    }
}

/// Fixed age groupings. Bounds are inclusive; `51+` has no upper bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AgeBucket {
    From18To25,
    From26To35,
    From36To50,
    From51,
}

impl AgeBucket {
    pub const ALL: [Self; 4] = [Self::From18To25, Self::From26To35, Self::From36To50, Self::From51];

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::From18To25 => "18-25",
            Self::From26To35 => "26-35",
            Self::From36To50 => "36-50",
            Self::From51 => "51+",
        }
    }

    #[must_use]
    pub fn from_label(s: &str) -> Option<Self> {
        let s = s.trim();
        Self::ALL.into_iter().find(|b| b.label() == s)
    }

    /// Inclusive lower bound and optional inclusive upper bound.
    #[must_use]
    pub const fn bounds(self) -> (i64, Option<i64>) {
        match self {
            Self::From18To25 => (18, Some(25)),
            Self::From26To35 => (26, Some(35)),
            Self::From36To50 => (36, Some(50)),
            Self::From51 => (51, None),
        }
    }

    #[must_use]
    pub const fn contains(self, age: i64) -> bool {
        match self.bounds() {
            (lo, Some(hi)) => age >= lo && age <= hi,
            (lo, None) => age >= lo,
        }
    }
}

/// Relative date windows. Three are rolling; `LastYear` is anchored to January 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DateWindow {
    Last7Days,
    Last30Days,
    Last90Days,
    LastYear,
}

impl DateWindow {
    pub const ALL: [Self; 4] = [Self::Last7Days, Self::Last30Days, Self::Last90Days, Self::LastYear];

    #[must_use]
    pub const fn value(self) -> &'static str {
        match self {
            Self::Last7Days => "last7days",
            Self::Last30Days => "last30days",
            Self::Last90Days => "last90days",
            Self::LastYear => "lastyear",
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Last7Days => "Last 7 Days",
            Self::Last30Days => "Last 30 Days",
            Self::Last90Days => "Last 90 Days",
            Self::LastYear => "Last Year",
        }
    }

    #[must_use]
    pub fn from_value(s: &str) -> Option<Self> {
        let s = s.trim();
        Self::ALL.into_iter().find(|w| w.value() == s)
    }

    /// Earliest date (inclusive) inside the window when evaluated on `as_of`.
    ///
    /// `LastYear` is January 1 of the previous calendar year, not `as_of - 365 days`.
    #[must_use]
    pub fn cutoff(self, as_of: NaiveDate) -> NaiveDate {
        let rolling = |n: u64| as_of.checked_sub_days(Days::new(n)).unwrap_or(NaiveDate::MIN);
        match self {
            Self::Last7Days => rolling(7),
            Self::Last30Days => rolling(30),
            Self::Last90Days => rolling(90),
            Self::LastYear => {
                NaiveDate::from_ymd_opt(as_of.year() - 1, 1, 1).unwrap_or(NaiveDate::MIN)
            }
        }
    }
}

/// How a sort field compares.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortMode {
    Numeric,
    Chronological,
    Text,
}

/// The display fields a page can be ordered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SortField {
    TransactionId,
    Date,
    CustomerId,
    #[default]
    CustomerName,
    PhoneNumber,
    Gender,
    Age,
    CustomerRegion,
    ProductCategory,
    Quantity,
    TotalAmount,
    ProductId,
    EmployeeName,
}

impl SortField {
    pub const ALL: [Self; 13] = [
        Self::TransactionId,
        Self::Date,
        Self::CustomerId,
        Self::CustomerName,
        Self::PhoneNumber,
        Self::Gender,
        Self::Age,
        Self::CustomerRegion,
        Self::ProductCategory,
        Self::Quantity,
        Self::TotalAmount,
        Self::ProductId,
        Self::EmployeeName,
    ];

    /// Display name; matching is exact and case-sensitive.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::TransactionId => "Transaction ID",
            Self::Date => "Date",
            Self::CustomerId => "Customer ID",
            Self::CustomerName => "Customer Name",
            Self::PhoneNumber => "Phone Number",
            Self::Gender => "Gender",
            Self::Age => "Age",
            Self::CustomerRegion => "Customer Region",
            Self::ProductCategory => "Product Category",
            Self::Quantity => "Quantity",
            Self::TotalAmount => "Total Amount",
            Self::ProductId => "Product ID",
            Self::EmployeeName => "Employee Name",
        }
    }

    #[must_use]
    pub fn from_name(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.name() == s)
    }

    #[must_use]
    pub const fn column(self) -> &'static str {
        match self {
            Self::TransactionId => "transaction_id",
            Self::Date => "date",
            Self::CustomerId => "customer_id",
            Self::CustomerName => "customer_name",
            Self::PhoneNumber => "phone_number",
            Self::Gender => "gender",
            Self::Age => "age",
            Self::CustomerRegion => "customer_region",
            Self::ProductCategory => "product_category",
            Self::Quantity => "quantity",
            Self::TotalAmount => "total_amount",
            Self::ProductId => "product_id",
            Self::EmployeeName => "employee_name",
        }
    }

    #[must_use]
    pub const fn mode(self) -> SortMode {
        match self {
            Self::Age | Self::Quantity | Self::TotalAmount => SortMode::Numeric,
            Self::Date => SortMode::Chronological,
            _ => SortMode::Text,
        }
    }

    /// Text accessor for lexicographic fields; `None` for typed ones.
    #[must_use]
    pub fn text(self, r: &SaleRecord) -> Option<&str> {
        Some(match self {
            Self::TransactionId => &r.transaction_id,
            Self::CustomerId => &r.customer_id,
            Self::CustomerName => &r.customer_name,
            Self::PhoneNumber => &r.phone_number,
            Self::Gender => &r.gender,
            Self::CustomerRegion => &r.customer_region,
            Self::ProductCategory => &r.product_category,
            Self::ProductId => &r.product_id,
            Self::EmployeeName => &r.employee_name,
            Self::Date | Self::Age | Self::Quantity | Self::TotalAmount => return None,
        })
    }

    /// Integer accessor for `Age` and `Quantity`; `None` for other fields or a missing value.
    #[must_use]
    pub const fn integer(self, r: &SaleRecord) -> Option<i64> {
        match self {
            Self::Age => r.age,
            Self::Quantity => r.quantity,
            _ => None,
        }
    }

    /// Decimal accessor for `TotalAmount`.
    #[must_use]
    pub const fn decimal(self, r: &SaleRecord) -> Option<f64> {
        match self {
            Self::TotalAmount => r.total_amount,
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SortSpec {
    pub field: SortField,
    pub order: Order,
}

/// A 1-based page number and a page size, both already coerced to valid values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    page: usize,
    limit: usize,
}

impl PageRequest {
    /// `page < 1` becomes 1 and `limit < 1` becomes the default page size.
    #[must_use]
    pub const fn new(page: usize, limit: usize) -> Self {
        let page = if page < 1 { 1 } else { page };
        let limit = if limit < 1 { DEFAULT_PAGE_SIZE } else { limit };
        Self { page, limit }
    }

    #[must_use]
    pub const fn page(&self) -> usize {
        self.page
    }

    #[must_use]
    pub const fn limit(&self) -> usize {
        self.limit
    }

    /// Index of the first row on this page; saturates on absurd page numbers.
    #[must_use]
    pub const fn offset(&self) -> usize {
        (self.page - 1).saturating_mul(self.limit)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(1, DEFAULT_PAGE_SIZE)
    }
}

/// Which records to include. Built once per query and never mutated.
///
/// Every unset field (empty set, `None`) places no restriction.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FilterCriteria {
    pub(crate) search: Option<String>,
    pub(crate) categorical: [BTreeSet<String>; 4],
    pub(crate) age_buckets: BTreeSet<AgeBucket>,
    pub(crate) tags: BTreeSet<String>,
    pub(crate) date_window: Option<DateWindow>,
}

impl FilterCriteria {
    #[must_use]
    pub fn builder() -> FilterCriteriaBuilder {
        FilterCriteriaBuilder::default()
    }

    #[must_use]
    pub fn search(&self) -> Option<&str> {
        self.search.as_deref()
    }

    #[must_use]
    pub fn selected(&self, field: Categorical) -> &BTreeSet<String> {
        &self.categorical[field as usize]
    }

    #[must_use]
    pub const fn age_buckets(&self) -> &BTreeSet<AgeBucket> {
        &self.age_buckets
    }

    #[must_use]
    pub const fn tags(&self) -> &BTreeSet<String> {
        &self.tags
    }

    #[must_use]
    pub const fn date_window(&self) -> Option<DateWindow> {
        self.date_window
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.search.is_none()
            && self.categorical.iter().all(BTreeSet::is_empty)
            && self.age_buckets.is_empty()
            && self.tags.is_empty()
            && self.date_window.is_none()
    }
}

/// Assembles a [`FilterCriteria`]; the only way to construct a non-empty one.
#[derive(Debug, Default)]
pub struct FilterCriteriaBuilder {
    inner: FilterCriteria,
}

impl FilterCriteriaBuilder {
    /// An empty term leaves search unset.
    #[must_use]
    pub fn search(mut self, term: impl Into<String>) -> Self {
        let term = term.into();
        self.inner.search = (!term.is_empty()).then_some(term);
        self
    }

    #[must_use]
    pub fn any_of<I, S>(mut self, field: Categorical, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let set = &mut self.inner.categorical[field as usize];
        for v in values {
            if set.len() >= MAX_IN_SET {
                log::debug!("{field:?} selection capped at {MAX_IN_SET} values; rest ignored");
                break;
            }
            let v = v.into();
            if !v.is_empty() {
                set.insert(v);
            }
        }
        self
    }

    #[must_use]
    pub fn age_buckets(mut self, buckets: impl IntoIterator<Item = AgeBucket>) -> Self {
        self.inner.age_buckets.extend(buckets);
        self
    }

    /// Tags are trimmed; blank tags are dropped.
    #[must_use]
    pub fn tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for t in tags {
            if self.inner.tags.len() >= MAX_IN_SET {
                log::debug!("tag selection capped at {MAX_IN_SET} values; rest ignored");
                break;
            }
            let t = t.as_ref().trim();
            if !t.is_empty() {
                self.inner.tags.insert(t.to_string());
            }
        }
        self
    }

    #[must_use]
    pub const fn date_window(mut self, window: Option<DateWindow>) -> Self {
        self.inner.date_window = window;
        self
    }

    #[must_use]
    pub fn build(self) -> FilterCriteria {
        self.inner
    }
}

/// A fully normalized query: what to match, how to order, which page, and the evaluation date
/// relative date windows are measured from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    pub criteria: FilterCriteria,
    pub sort: SortSpec,
    pub page: PageRequest,
    pub as_of: NaiveDate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub total: usize,
    pub page: usize,
    pub limit: usize,
    pub total_pages: usize,
}

impl Pagination {
    #[must_use]
    pub const fn new(total: usize, page: PageRequest) -> Self {
        Self {
            total,
            page: page.page(),
            limit: page.limit(),
            total_pages: total.div_ceil(page.limit()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageResult {
    pub data: Vec<SaleRow>,
    pub pagination: Pagination,
}
