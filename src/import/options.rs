use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct CsvOptions {
    pub delimiter: u8,
    pub has_headers: bool,
}

impl Default for CsvOptions {
    fn default() -> Self {
        Self { delimiter: b',', has_headers: true }
    }
}

#[derive(Debug, Clone)]
pub struct ImportOptions {
    pub skip_errors: bool,
    pub csv: CsvOptions,
    /// Write one NDJSON line per rejected row here.
    pub error_sidecar: Option<PathBuf>,
    pub progress_every: Option<usize>,
    /// Rows per multi-row INSERT when importing into SQLite.
    pub batch_size: usize,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            skip_errors: true,
            csv: CsvOptions::default(),
            error_sidecar: None,
            progress_every: Some(10_000),
            batch_size: 500,
        }
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ImportReport {
    pub inserted: u64,
    pub skipped: u64,
}
