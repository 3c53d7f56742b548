use std::cmp::Ordering;

use chrono::NaiveDate;
use ordered_float::OrderedFloat;

use crate::record::SaleRecord;

use super::types::{Order, SortField, SortMode, SortSpec};

/// Comparable key extracted once per record.
///
/// All keys of one sort share a variant, so the derived cross-variant order never applies.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum SortKey {
    /// Exact integer; missing values sort as 0.
    Integer(i64),
    /// Missing amounts sort as 0.
    Decimal(OrderedFloat<f64>),
    /// `None` is older than every date.
    Date(Option<NaiveDate>),
    /// ASCII case-folded text.
    Text(String),
}

impl SortKey {
    #[must_use]
    pub fn of(field: SortField, r: &SaleRecord) -> Self {
        match field.mode() {
            SortMode::Numeric if field == SortField::TotalAmount => {
                Self::Decimal(OrderedFloat(field.decimal(r).unwrap_or(0.0)))
            }
            SortMode::Numeric => Self::Integer(field.integer(r).unwrap_or(0)),
            SortMode::Chronological => Self::Date(r.date),
            SortMode::Text => Self::Text(field.text(r).unwrap_or_default().to_ascii_lowercase()),
        }
    }
}

/// Order `records` by `spec` without touching the input slice.
///
/// Stable: equal keys keep their input order in both directions, because the direction only
/// reverses the key comparison.
#[must_use]
pub fn sort_records<'a>(records: &[&'a SaleRecord], spec: SortSpec) -> Vec<&'a SaleRecord> {
    let mut keyed: Vec<(SortKey, &'a SaleRecord)> =
        records.iter().map(|r| (SortKey::of(spec.field, r), *r)).collect();
    keyed.sort_by(|a, b| directed(a.0.cmp(&b.0), spec.order));
    keyed.into_iter().map(|(_, r)| r).collect()
}

fn directed(ord: Ordering, order: Order) -> Ordering {
    match order {
        Order::Asc => ord,
        Order::Desc => ord.reverse(),
    }
}
