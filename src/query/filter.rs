//! In-memory filter evaluation.
//!
//! A [`FilterCriteria`] is first lowered into a list of [`Clause`]s holding only the restrictions
//! that are actually set. The in-memory evaluator here and the SQL compiler in `compile` both
//! consume that list, so an unset criterion is absent from both and passes everything.

use std::collections::BTreeSet;

use chrono::NaiveDate;

use crate::record::SaleRecord;

use super::types::{AgeBucket, Categorical, FilterCriteria};

/// One restriction; a record must satisfy every clause of a criteria.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Clause<'a> {
    /// Name contains `folded` (ASCII case-insensitive) or phone contains `term` verbatim.
    Search { term: &'a str, folded: String },
    Member { field: Categorical, values: &'a BTreeSet<String> },
    AgeIn(&'a BTreeSet<AgeBucket>),
    AnyTag(&'a BTreeSet<String>),
    /// Record date on or after this day.
    DateFrom(NaiveDate),
}

impl FilterCriteria {
    /// Lower into clauses, resolving relative date windows against `as_of`.
    ///
    /// Order: search, region, gender, age, category, tags, payment method, date.
    #[must_use]
    pub fn clauses(&self, as_of: NaiveDate) -> Vec<Clause<'_>> {
        let mut out = Vec::new();
        if let Some(term) = self.search() {
            out.push(Clause::Search { term, folded: term.to_ascii_lowercase() });
        }
        let member = |field: Categorical| {
            let values = self.selected(field);
            (!values.is_empty()).then_some(Clause::Member { field, values })
        };
        out.extend(member(Categorical::CustomerRegion));
        out.extend(member(Categorical::Gender));
        if !self.age_buckets().is_empty() {
            out.push(Clause::AgeIn(self.age_buckets()));
        }
        out.extend(member(Categorical::ProductCategory));
        if !self.tags().is_empty() {
            out.push(Clause::AnyTag(self.tags()));
        }
        out.extend(member(Categorical::PaymentMethod));
        if let Some(window) = self.date_window() {
            out.push(Clause::DateFrom(window.cutoff(as_of)));
        }
        out
    }
}

impl Clause<'_> {
    #[must_use]
    pub fn matches(&self, r: &SaleRecord) -> bool {
        match self {
            Self::Search { term, folded } => {
                r.customer_name.to_ascii_lowercase().contains(folded.as_str())
                    || r.phone_number.contains(term)
            }
            Self::Member { field, values } => values.contains(field.value(r)),
            Self::AgeIn(buckets) => {
                r.age.is_some_and(|age| buckets.iter().any(|b| b.contains(age)))
            }
            Self::AnyTag(tags) => r.tag_tokens().any(|t| tags.contains(t)),
            Self::DateFrom(cutoff) => r.date.is_some_and(|d| d >= *cutoff),
        }
    }
}

/// True when `record` satisfies every clause of `criteria` on day `as_of`.
#[must_use]
pub fn matches(record: &SaleRecord, criteria: &FilterCriteria, as_of: NaiveDate) -> bool {
    matches_all(record, &criteria.clauses(as_of))
}

/// Evaluate pre-lowered clauses; lets callers lower once per query instead of once per record.
#[must_use]
pub fn matches_all(record: &SaleRecord, clauses: &[Clause<'_>]) -> bool {
    clauses.iter().all(|c| c.matches(record))
}

/// All records of `records` matching `criteria`, in their original order.
pub fn filter_records<'a>(
    records: &'a [SaleRecord],
    criteria: &FilterCriteria,
    as_of: NaiveDate,
) -> Vec<&'a SaleRecord> {
    let clauses = criteria.clauses(as_of);
    records.iter().filter(|r| matches_all(r, &clauses)).collect()
}
