use std::io::{Read, Write};

use crate::errors::QueryError;
use crate::record::{RawSale, SaleRecord};

use super::options::{ImportOptions, ImportReport};

/// Parse sales rows from CSV by header name.
///
/// With `skip_errors` a malformed row is counted and skipped; otherwise the first one aborts.
pub fn read_sales_csv<R: Read>(
    reader: R,
    opts: &ImportOptions,
    report: &mut ImportReport,
) -> Result<Vec<SaleRecord>, QueryError> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(opts.csv.has_headers)
        .delimiter(opts.csv.delimiter)
        .flexible(true)
        .from_reader(reader);
    let mut sidecar = match &opts.error_sidecar {
        Some(p) if opts.skip_errors => Some(std::fs::File::create(p)?),
        _ => None,
    };
    let mut out = Vec::new();
    let mut row_no: usize = 0;
    for rec in rdr.deserialize::<RawSale>() {
        row_no += 1;
        let raw = match rec {
            Ok(r) => r,
            Err(e) => {
                if !opts.skip_errors {
                    return Err(e.into());
                }
                log::warn!("skipping csv row {row_no}: {e}");
                if let Some(f) = sidecar.as_mut() {
                    let line = serde_json::json!({ "row": row_no, "error": e.to_string() });
                    writeln!(f, "{line}")?;
                }
                report.skipped += 1;
                continue;
            }
        };
        out.push(SaleRecord::from(raw));
        report.inserted += 1;
        if let Some(n) = opts.progress_every.filter(|n| *n > 0)
            && row_no % n == 0
        {
            log::info!("read {} records (csv)", report.inserted);
        }
    }
    Ok(out)
}
