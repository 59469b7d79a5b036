//! Dataset files and CSV export.

pub mod dataset;
pub mod export;

pub use dataset::{DatasetError, load_json, save_json};
pub use export::{export_records_csv, export_report_csv, write_records_csv, write_report_csv};
