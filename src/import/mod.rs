mod csv;
mod options;
mod sample;
mod source;

pub use self::csv::read_sales_csv;
pub use options::{CsvOptions, ImportOptions, ImportReport};
pub use sample::write_sample;
pub use source::DataSource;
