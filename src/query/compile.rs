//! Pushdown compilation of filter criteria and sort specs into SQLite SQL.
//!
//! The output is a list of SQL text fragments and bind values. Nothing user-supplied is
//! interpolated into SQL text: every value travels as a bind parameter.

use std::fmt;

use chrono::NaiveDate;

use super::filter::Clause;
use super::types::{FilterCriteria, SortMode, SortSpec};

/// A bind parameter value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SqlParam {
    Text(String),
    Int(i64),
}

/// One piece of a compiled statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fragment {
    Sql(String),
    Bind(SqlParam),
}

/// A compiled `WHERE` clause. Empty when the criteria places no restriction.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Predicate {
    fragments: Vec<Fragment>,
}

impl Predicate {
    #[must_use]
    pub fn fragments(&self) -> &[Fragment] {
        &self.fragments
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }

    /// Bind values in placeholder order.
    pub fn params(&self) -> impl Iterator<Item = &SqlParam> {
        self.fragments.iter().filter_map(|f| match f {
            Fragment::Bind(p) => Some(p),
            Fragment::Sql(_) => None,
        })
    }

    fn sql(&mut self, s: impl Into<String>) {
        self.fragments.push(Fragment::Sql(s.into()));
    }

    fn bind(&mut self, p: SqlParam) {
        self.fragments.push(Fragment::Bind(p));
    }

    fn bind_list<'v>(&mut self, values: impl IntoIterator<Item = &'v String>) {
        self.sql("(");
        for (i, v) in values.into_iter().enumerate() {
            if i > 0 {
                self.sql(", ");
            }
            self.bind(SqlParam::Text(v.clone()));
        }
        self.sql(")");
    }

    fn push_clause(&mut self, clause: &Clause<'_>) {
        match clause {
            Clause::Search { term, folded } => {
                self.sql("(instr(lower(customer_name), ");
                self.bind(SqlParam::Text(folded.clone()));
                self.sql(") > 0 OR instr(phone_number, ");
                self.bind(SqlParam::Text((*term).to_string()));
                self.sql(") > 0)");
            }
            Clause::Member { field, values } => {
                self.sql(format!("{} IN ", field.column()));
                self.bind_list(values.iter());
            }
            Clause::AgeIn(buckets) => {
                self.sql("(");
                for (i, b) in buckets.iter().enumerate() {
                    if i > 0 {
                        self.sql(" OR ");
                    }
                    let (lo, hi) = b.bounds();
                    self.sql("age >= ");
                    self.bind(SqlParam::Int(lo));
                    if let Some(hi) = hi {
                        self.sql(" AND age <= ");
                        self.bind(SqlParam::Int(hi));
                    }
                }
                self.sql(")");
            }
            Clause::AnyTag(tags) => {
                self.sql(
                    "EXISTS (SELECT 1 FROM sale_tags t WHERE t.sale_id = sales.id AND t.tag IN ",
                );
                self.bind_list(tags.iter());
                self.sql(")");
            }
            Clause::DateFrom(cutoff) => {
                self.sql("date >= ");
                self.bind(SqlParam::Text(cutoff.format("%Y-%m-%d").to_string()));
            }
        }
    }
}

/// Renders with `?` placeholders, mainly for logs and tests.
impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for frag in &self.fragments {
            match frag {
                Fragment::Sql(s) => f.write_str(s)?,
                Fragment::Bind(_) => f.write_str("?")?,
            }
        }
        Ok(())
    }
}

/// Compile `criteria` into a ` WHERE ...` clause over the `sales` table.
#[must_use]
pub fn compile(criteria: &FilterCriteria, as_of: NaiveDate) -> Predicate {
    let mut out = Predicate::default();
    for (i, clause) in criteria.clauses(as_of).iter().enumerate() {
        out.sql(if i == 0 { " WHERE " } else { " AND " });
        out.push_clause(clause);
    }
    out
}

/// The `ORDER BY` body: the sort key in the requested direction, then load position ascending so
/// ties keep their original order in both directions.
#[must_use]
pub fn order_by(sort: SortSpec) -> String {
    let col = sort.field.column();
    let key = match sort.field.mode() {
        SortMode::Numeric => format!("COALESCE({col}, 0)"),
        // NULL sorts first ascending, which is where an unparsable date belongs
        SortMode::Chronological => col.to_string(),
        SortMode::Text => format!("lower({col})"),
    };
    format!(" ORDER BY {key} {}, id ASC", sort.order.as_sql())
}
