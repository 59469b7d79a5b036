//! Integration tests for dataset files and CSV export.

mod common;

use grid_schema::config::EditorConfig;
use grid_schema::io::{export_records_csv, export_report_csv, load_json, save_json};
use grid_schema::store::{DataStore, DatasetKind, Scope};

fn read_csv(path: &std::path::Path) -> (Vec<String>, Vec<Vec<String>>) {
    let mut rdr = match csv::Reader::from_path(path) {
        Ok(rdr) => rdr,
        Err(e) => panic!("cannot open {}: {e}", path.display()),
    };
    let header = rdr
        .headers()
        .map(|h| h.iter().map(str::to_string).collect())
        .unwrap_or_default();
    let rows = rdr
        .records()
        .filter_map(Result::ok)
        .map(|r| r.iter().map(str::to_string).collect())
        .collect();
    (header, rows)
}

#[test]
fn exported_items_follow_field_order() {
    let dir = tempfile::tempdir().ok();
    let Some(dir) = dir else {
        panic!("tempdir unavailable");
    };
    let path = dir.path().join("branches.csv");

    let mut store = common::loaded_store();
    let scope = Scope::Network {
        category: "branch".to_string(),
    };
    let mut columns = store.ordered_fields(&scope).unwrap_or_default();
    columns.insert(0, "_key".to_string());
    let items = store.items(&scope, false).unwrap_or_default();
    assert!(export_records_csv(&items, &columns, &path).is_ok());

    let (header, rows) = read_csv(&path);
    assert_eq!(
        header,
        vec!["_key", "f_bus", "index", "name", "t_bus", "angmin", "br_status", "rate_a", "tags"]
    );
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[0][8], "[\"ac\"]");
    assert_eq!(rows[1][7], "");
    assert_eq!(rows[2][6], "0");
}

#[test]
fn report_export_marks_protected_fields() {
    let dir = tempfile::tempdir().ok();
    let Some(dir) = dir else {
        panic!("tempdir unavailable");
    };
    let path = dir.path().join("demand-report.csv");

    let mut store = common::loaded_store();
    let report = store.report(&Scope::Demand).unwrap_or_default();
    let policy = store.policy(&Scope::Demand);
    assert!(export_report_csv(&report, &policy, &path).is_ok());

    let (header, rows) = read_csv(&path);
    assert_eq!(
        header,
        vec!["field", "type", "present", "nulls", "presence_pct", "protected"]
    );
    assert_eq!(rows[0], vec!["index", "number", "4", "0", "100", "true"]);
    let qd = rows.iter().find(|r| r[0] == "qd");
    assert_eq!(
        qd.cloned(),
        Some(["qd", "number", "2", "0", "50", "false"].map(String::from).to_vec())
    );
}

#[test]
fn normalized_dataset_survives_save_and_reload() {
    let dir = tempfile::tempdir().ok();
    let Some(dir) = dir else {
        panic!("tempdir unavailable");
    };
    let path = dir.path().join("demand.json");
    assert!(save_json(&path, &common::demand_base()).is_ok());

    let mut store = DataStore::new(EditorConfig::standard());
    let loaded = load_json(&path);
    assert!(loaded.is_ok());
    if let Ok(data) = loaded {
        store.load(DatasetKind::Demand, data);
    }
    assert_eq!(store.normalize(&Scope::Demand).ok(), Some(5));
    let saved = store
        .require(DatasetKind::Demand)
        .map(|data| save_json(&path, data).is_ok());
    assert!(matches!(saved, Ok(true)));

    let mut reloaded = DataStore::new(EditorConfig::standard());
    if let Ok(data) = load_json(&path) {
        reloaded.load(DatasetKind::Demand, data);
    }
    let report = reloaded.report(&Scope::Demand).unwrap_or_default();
    assert_eq!(report.total_items, 4);
    assert!(report.is_consistent());
    assert_eq!(reloaded.normalize(&Scope::Demand).ok(), Some(0));
}
