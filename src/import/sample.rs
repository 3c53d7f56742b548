use std::io::{Read, Write};

use crate::errors::QueryError;

/// Copy the header and the first `rows` data rows of a CSV stream.
///
/// Goes through the CSV parser rather than lines so quoted fields with embedded newlines survive.
/// Returns the number of data rows written.
pub fn write_sample<R: Read, W: Write>(
    input: R,
    output: W,
    rows: usize,
) -> Result<usize, QueryError> {
    let mut rdr = csv::ReaderBuilder::new().has_headers(true).flexible(true).from_reader(input);
    let mut wtr = csv::WriterBuilder::new().flexible(true).from_writer(output);
    wtr.write_record(rdr.headers()?)?;
    let mut written = 0usize;
    for rec in rdr.records().take(rows) {
        wtr.write_record(&rec?)?;
        written += 1;
    }
    wtr.flush()?;
    log::info!("sample written: {written} rows");
    Ok(written)
}
