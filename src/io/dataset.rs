//! JSON dataset files.

use std::fs::File;
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use serde_json::Value;
use thiserror::Error;
use tracing::debug;

/// Failure reading or writing a dataset file.
#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("cannot access \"{path}\": {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("\"{path}\" is not valid JSON: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("CSV output failed: {0}")]
    Csv(#[from] csv::Error),

    #[error("output failed: {0}")]
    Write(#[from] io::Error),
}

/// Reads a whole JSON document, keeping field order.
///
/// # Errors
///
/// Returns `DatasetError::Io` if the file cannot be opened and
/// `DatasetError::Json` if it does not parse.
pub fn load_json(path: &Path) -> Result<Value, DatasetError> {
    let file = File::open(path).map_err(|source| DatasetError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let value = serde_json::from_reader(BufReader::new(file)).map_err(|source| DatasetError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    debug!(path = %path.display(), "dataset loaded");
    Ok(value)
}

/// Writes `value` as pretty-printed JSON, replacing the file.
///
/// # Errors
///
/// Returns `DatasetError::Io` if the file cannot be created or written.
pub fn save_json(path: &Path, value: &Value) -> Result<(), DatasetError> {
    let io_err = |source| DatasetError::Io {
        path: path.to_path_buf(),
        source,
    };
    let file = File::create(path).map_err(io_err)?;
    let mut buf = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut buf, value).map_err(|source| DatasetError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    buf.write_all(b"\n").map_err(io_err)?;
    buf.flush().map_err(io_err)?;
    debug!(path = %path.display(), "dataset saved");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn save_then_load_keeps_field_order() {
        let dir = tempfile::tempdir().ok();
        let path = dir.as_ref().map(|d| d.path().join("data.json"));
        let Some(path) = path else {
            panic!("tempdir unavailable");
        };
        let value = json!({"zeta": 1, "alpha": [true, null], "mid": {"b": 1, "a": 2}});
        assert!(save_json(&path, &value).is_ok());

        let loaded = load_json(&path).ok();
        assert_eq!(loaded.as_ref(), Some(&value));
        let keys: Vec<String> = loaded
            .as_ref()
            .and_then(Value::as_object)
            .map(|m| m.keys().cloned().collect())
            .unwrap_or_default();
        assert_eq!(keys, vec!["zeta", "alpha", "mid"]);
    }

    #[test]
    fn missing_file_is_io_error() {
        let result = load_json(Path::new("/nonexistent/grid-schema/data.json"));
        assert!(matches!(result, Err(DatasetError::Io { .. })));
    }

    #[test]
    fn malformed_json_is_reported() {
        let file = tempfile::NamedTempFile::new().ok();
        let Some(mut file) = file else {
            panic!("tempfile unavailable");
        };
        assert!(file.write_all(b"{\"base\": ").is_ok());
        let result = load_json(file.path());
        assert!(matches!(result, Err(DatasetError::Json { .. })));
    }
}
