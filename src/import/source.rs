use std::path::PathBuf;
use std::sync::Arc;

use crate::errors::QueryError;
use crate::record::SaleRecord;

use super::csv::read_sales_csv;
use super::options::{ImportOptions, ImportReport};

/// Where a backend gets its rows from when it loads.
#[derive(Debug, Clone)]
pub enum DataSource {
    Csv { path: PathBuf, options: ImportOptions },
    Records(Arc<[SaleRecord]>),
}

impl DataSource {
    #[must_use]
    pub fn csv(path: impl Into<PathBuf>) -> Self {
        Self::Csv { path: path.into(), options: ImportOptions::default() }
    }

    #[must_use]
    pub fn records(records: impl Into<Arc<[SaleRecord]>>) -> Self {
        Self::Records(records.into())
    }

    /// Materialize every row. CSV parsing runs on the blocking pool.
    pub async fn read(&self) -> Result<(Arc<[SaleRecord]>, ImportReport), QueryError> {
        match self {
            Self::Records(r) => {
                let n = r.len() as u64;
                Ok((Arc::clone(r), ImportReport { inserted: n, skipped: 0 }))
            }
            Self::Csv { path, options } => {
                let path = path.clone();
                let options = options.clone();
                tokio::task::spawn_blocking(move || -> Result<_, QueryError> {
                    let file = std::fs::File::open(&path).map_err(|e| {
                        QueryError::Io(format!("cannot open {}: {e}", path.display()))
                    })?;
                    let mut report = ImportReport::default();
                    let rows =
                        read_sales_csv(std::io::BufReader::new(file), &options, &mut report)?;
                    log::info!(
                        "loaded {} records from {} ({} skipped)",
                        report.inserted,
                        path.display(),
                        report.skipped
                    );
                    Ok((Arc::from(rows), report))
                })
                .await?
            }
        }
    }
}
