//! CSV export of collections and schema reports.

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use serde_json::Value;

use super::DatasetError;
use crate::schema::{FieldPolicy, Record, SchemaReport, presence_percentage};

/// Column header of a schema report export.
const REPORT_HEADER: &str = "field,type,present,nulls,presence_pct,protected";

/// Exports records to a CSV file at the given path.
///
/// # Errors
///
/// Returns a `DatasetError` if file creation or writing fails.
pub fn export_records_csv(
    records: &[Record],
    columns: &[String],
    path: &Path,
) -> Result<(), DatasetError> {
    let file = File::create(path).map_err(|source| DatasetError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    write_records_csv(records, columns, io::BufWriter::new(file))
}

/// Writes one row per record with the given columns.
///
/// Strings are written raw, `null` and missing fields as empty cells, and
/// arrays or objects as compact JSON.
///
/// # Errors
///
/// Returns a `DatasetError` if writing fails.
pub fn write_records_csv(
    records: &[Record],
    columns: &[String],
    writer: impl Write,
) -> Result<(), DatasetError> {
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);
    wtr.write_record(columns)?;
    for record in records {
        wtr.write_record(columns.iter().map(|c| cell(record.get(c))))?;
    }
    wtr.flush()?;
    Ok(())
}

fn cell(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

/// Exports a schema report to a CSV file at the given path.
///
/// # Errors
///
/// Returns a `DatasetError` if file creation or writing fails.
pub fn export_report_csv(
    report: &SchemaReport,
    policy: &FieldPolicy,
    path: &Path,
) -> Result<(), DatasetError> {
    let file = File::create(path).map_err(|source| DatasetError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    write_report_csv(report, policy, io::BufWriter::new(file))
}

/// Writes one row per profiled field, protected fields first.
///
/// # Errors
///
/// Returns a `DatasetError` if writing fails.
pub fn write_report_csv(
    report: &SchemaReport,
    policy: &FieldPolicy,
    writer: impl Write,
) -> Result<(), DatasetError> {
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);
    wtr.write_record(REPORT_HEADER.split(','))?;

    for name in report.ordered_fields(policy) {
        let Some(profile) = report.properties.get(name) else {
            continue;
        };
        let pct = presence_percentage(profile.count, report.total_items);
        wtr.write_record(&[
            name.to_string(),
            profile.value_type.to_string(),
            profile.count.to_string(),
            profile.null_count.to_string(),
            pct.to_string(),
            policy.is_protected(name).to_string(),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}
