use std::path::PathBuf;

use crate::query::RawQuery;

/// One CLI action, independent of argument parsing.
#[derive(Debug, Clone)]
pub enum Command {
    /// Run a query and print one page.
    Query(RawQuery),
    /// Print the filter option catalog.
    Catalog,
    /// Load the dataset and print the health report.
    Health,
    /// Load a CSV file into the configured SQLite database.
    Import { csv: PathBuf },
    /// Copy the header and the first `rows` rows of a CSV file.
    Sample { input: PathBuf, output: PathBuf, rows: usize },
}
