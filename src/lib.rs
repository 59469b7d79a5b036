//! Schema inference and normalization for power-system datasets.

pub mod config;
pub mod io;
pub mod reporting;
/// Field profiling, normalization, and schema edits over record collections.
pub mod schema;
pub mod store;
pub mod summary;
