use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::types::{
    AgeBucket, Categorical, DEFAULT_PAGE_SIZE, DateWindow, FilterCriteria, MAX_LIMIT, Order,
    PageRequest, Query, SortField, SortSpec,
};

/// Query parameters exactly as a caller sent them. Multi-value fields are comma separated.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RawQuery {
    pub search: Option<String>,
    pub customer_region: Option<String>,
    pub gender: Option<String>,
    pub age_range: Option<String>,
    pub product_category: Option<String>,
    pub tags: Option<String>,
    pub payment_method: Option<String>,
    pub date_range: Option<String>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
    pub page: Option<String>,
    pub limit: Option<String>,
}

/// Page size policy applied while normalizing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PagingPolicy {
    pub default_page_size: usize,
    pub max_page_size: usize,
}

impl Default for PagingPolicy {
    fn default() -> Self {
        Self { default_page_size: DEFAULT_PAGE_SIZE, max_page_size: MAX_LIMIT }
    }
}

fn split_list(raw: Option<&str>) -> impl Iterator<Item = &str> {
    raw.unwrap_or_default().split(',').filter(|s| !s.is_empty())
}

fn positive(raw: Option<&str>, what: &str) -> Option<usize> {
    let raw = raw?;
    match raw.trim().parse::<usize>() {
        Ok(n) if n >= 1 => Some(n),
        _ => {
            log::debug!("ignoring invalid {what} {raw:?}; using default");
            None
        }
    }
}

impl RawQuery {
    /// Build the filter criteria. Unknown age or date labels are ignored, never an error.
    #[must_use]
    pub fn criteria(&self) -> FilterCriteria {
        let ages = split_list(self.age_range.as_deref()).filter_map(|label| {
            let bucket = AgeBucket::from_label(label);
            if bucket.is_none() {
                log::debug!("ignoring unknown age range {label:?}");
            }
            bucket
        });
        let window = self
            .date_range
            .as_deref()
            .filter(|s| !s.is_empty())
            .and_then(|s| {
                let w = DateWindow::from_value(s);
                if w.is_none() {
                    log::debug!("ignoring unknown date range {s:?}");
                }
                w
            });
        FilterCriteria::builder()
            .search(self.search.clone().unwrap_or_default())
            .any_of(Categorical::CustomerRegion, split_list(self.customer_region.as_deref()))
            .any_of(Categorical::Gender, split_list(self.gender.as_deref()))
            .age_buckets(ages)
            .any_of(Categorical::ProductCategory, split_list(self.product_category.as_deref()))
            .tags(split_list(self.tags.as_deref()))
            .any_of(Categorical::PaymentMethod, split_list(self.payment_method.as_deref()))
            .date_window(window)
            .build()
    }

    /// Unknown sort fields fall back to Customer Name; direction defaults to ascending.
    #[must_use]
    pub fn sort(&self) -> SortSpec {
        let field = match self.sort_by.as_deref() {
            None | Some("") => SortField::default(),
            Some(name) => SortField::from_name(name).unwrap_or_else(|| {
                log::debug!("unknown sort field {name:?}; using {}", SortField::default().name());
                SortField::default()
            }),
        };
        let order = self.sort_order.as_deref().map(Order::parse).unwrap_or_default();
        SortSpec { field, order }
    }

    #[must_use]
    pub fn page(&self, policy: PagingPolicy) -> PageRequest {
        let page = positive(self.page.as_deref(), "page").unwrap_or(1);
        let limit = positive(self.limit.as_deref(), "limit")
            .unwrap_or(policy.default_page_size)
            .min(policy.max_page_size.max(1));
        PageRequest::new(page, limit)
    }

    /// Normalize everything into one [`Query`] evaluated on `as_of`.
    #[must_use]
    pub fn normalize(&self, policy: PagingPolicy, as_of: NaiveDate) -> Query {
        Query { criteria: self.criteria(), sort: self.sort(), page: self.page(policy), as_of }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw() -> RawQuery {
        RawQuery::default()
    }

    #[test]
    fn empty_parameters_normalize_to_defaults() {
        let q = raw().normalize(PagingPolicy::default(), NaiveDate::MIN);
        assert!(q.criteria.is_empty());
        assert_eq!(q.sort, SortSpec { field: SortField::CustomerName, order: Order::Asc });
        assert_eq!(q.page, PageRequest::new(1, 10));
    }

    #[test]
    fn comma_lists_split_and_drop_blanks() {
        let r = RawQuery {
            customer_region: Some("North,,South,".into()),
            tags: Some(" new ,sale".into()),
            age_range: Some("18-25,bogus,51+".into()),
            ..raw()
        };
        let c = r.criteria();
        let regions: Vec<_> = c.selected(Categorical::CustomerRegion).iter().cloned().collect();
        assert_eq!(regions, ["North", "South"]);
        let tags: Vec<_> = c.tags().iter().cloned().collect();
        assert_eq!(tags, ["new", "sale"]);
        let ages: Vec<_> = c.age_buckets().iter().copied().collect();
        assert_eq!(ages, [AgeBucket::From18To25, AgeBucket::From51]);
    }

    #[test]
    fn bad_paging_and_sort_fall_back() {
        let r = RawQuery {
            page: Some("abc".into()),
            limit: Some("-5".into()),
            sort_by: Some("customer name".into()),
            sort_order: Some("DESC".into()),
            ..raw()
        };
        let q = r.normalize(PagingPolicy::default(), NaiveDate::MIN);
        assert_eq!(q.page, PageRequest::new(1, 10));
        assert_eq!(q.sort.field, SortField::CustomerName);
        assert_eq!(q.sort.order, Order::Desc);
    }

    #[test]
    fn limit_is_capped_by_policy() {
        let r = RawQuery { limit: Some("500".into()), page: Some("3".into()), ..raw() };
        let policy = PagingPolicy { default_page_size: 10, max_page_size: 100 };
        assert_eq!(r.page(policy), PageRequest::new(3, 100));
    }

    #[test]
    fn unknown_date_range_is_unset() {
        let r = RawQuery { date_range: Some("yesterday".into()), ..raw() };
        assert!(r.criteria().is_empty());
        let r = RawQuery { date_range: Some("lastyear".into()), ..raw() };
        assert_eq!(r.criteria().date_window(), Some(DateWindow::LastYear));
    }

    #[test]
    fn parameters_use_camel_case_names() {
        let r: RawQuery = serde_json::from_value(serde_json::json!({
            "customerRegion": "North,East",
            "ageRange": "26-35",
            "productCategory": "Beauty",
            "paymentMethod": "UPI",
            "dateRange": "last30days",
            "sortBy": "Date",
            "sortOrder": "desc",
        }))
        .unwrap();
        let q = r.normalize(PagingPolicy::default(), NaiveDate::MIN);
        assert_eq!(q.criteria.selected(Categorical::CustomerRegion).len(), 2);
        assert_eq!(q.criteria.selected(Categorical::PaymentMethod).len(), 1);
        assert!(q.criteria.age_buckets().contains(&AgeBucket::From26To35));
        assert_eq!(q.criteria.date_window(), Some(DateWindow::Last30Days));
        assert_eq!(q.sort, SortSpec { field: SortField::Date, order: Order::Desc });
    }
}
