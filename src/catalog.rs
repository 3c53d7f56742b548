//! Filter option catalog: the legal values a client can offer for each filter.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::query::{AgeBucket, Categorical, DateWindow};
use crate::record::SaleRecord;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRangeOption {
    pub value: String,
    pub label: String,
}

/// Distinct observed values per filterable field plus the fixed enumerations.
///
/// Observed lists are sorted in ordinal (byte) order and never contain empty strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterOptions {
    pub customer_regions: Vec<String>,
    pub genders: Vec<String>,
    pub age_ranges: Vec<String>,
    pub product_categories: Vec<String>,
    pub tags: Vec<String>,
    pub payment_methods: Vec<String>,
    pub date_ranges: Vec<DateRangeOption>,
}

impl FilterOptions {
    /// Assemble from already-distinct lists; empties are dropped and lists re-sorted so the
    /// result does not depend on how a backend ordered them.
    #[must_use]
    pub fn from_distinct(
        customer_regions: Vec<String>,
        genders: Vec<String>,
        product_categories: Vec<String>,
        payment_methods: Vec<String>,
        tags: Vec<String>,
    ) -> Self {
        let clean = |v: Vec<String>| -> Vec<String> {
            v.into_iter().filter(|s| !s.is_empty()).collect::<BTreeSet<_>>().into_iter().collect()
        };
        Self {
            customer_regions: clean(customer_regions),
            genders: clean(genders),
            age_ranges: AgeBucket::ALL.iter().map(|b| b.label().to_string()).collect(),
            product_categories: clean(product_categories),
            tags: clean(tags),
            payment_methods: clean(payment_methods),
            date_ranges: DateWindow::ALL
                .iter()
                .map(|w| DateRangeOption { value: w.value().into(), label: w.label().into() })
                .collect(),
        }
    }

    /// Scan the full dataset.
    #[must_use]
    pub fn from_records(records: &[SaleRecord]) -> Self {
        let distinct = |field: Categorical| -> Vec<String> {
            records
                .iter()
                .map(|r| field.value(r))
                .filter(|v| !v.is_empty())
                .collect::<BTreeSet<_>>()
                .into_iter()
                .map(str::to_string)
                .collect()
        };
        let tags: BTreeSet<&str> = records.iter().flat_map(|r| r.tag_tokens()).collect();
        Self::from_distinct(
            distinct(Categorical::CustomerRegion),
            distinct(Categorical::Gender),
            distinct(Categorical::ProductCategory),
            distinct(Categorical::PaymentMethod),
            tags.into_iter().map(str::to_string).collect(),
        )
    }
}
