//! Concrete tabular backends behind the [`TabularSource`](crate::types::TabularSource)
//! and [`ReportSink`](crate::storage::ReportSink) ports.

pub mod csv_dir;
pub mod sheets;

pub use csv_dir::CsvDirectory;
pub use sheets::SheetsClient;
