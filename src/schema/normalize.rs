//! Additive backfill of missing fields.

use serde_json::{Map, Value};

use super::policy::FieldPolicy;
use super::types::{Record, ValueType};

/// Backfills every record with every field seen anywhere in the collection.
///
/// Each field's default comes from the first non-null value seen for it
/// across the collection ([`ValueType::backfill_default`]); a field that was
/// only ever `null` is backfilled with `null`. Only absent keys are filled:
/// a field explicitly set to `null` counts as present. Existing values are
/// never changed or removed.
///
/// Returns the number of `(record, field)` pairs patched, so a second call on
/// the same collection returns 0.
///
/// # Examples
///
/// ```
/// use grid_schema::schema::{normalize, FieldPolicy};
/// use serde_json::json;
///
/// let mut records: Vec<_> = [json!({"a": 1, "b": true}), json!({"c": null})]
///     .into_iter()
///     .filter_map(|v| v.as_object().cloned())
///     .collect();
/// assert_eq!(normalize(&mut records, &FieldPolicy::new()), 3);
/// assert_eq!(records[1]["a"], json!(0));
/// assert_eq!(records[1]["b"], json!(false));
/// assert_eq!(records[0]["c"], json!(null));
/// assert_eq!(normalize(&mut records, &FieldPolicy::new()), 0);
/// ```
pub fn normalize<'a, I>(records: I, policy: &FieldPolicy) -> usize
where
    I: IntoIterator<Item = &'a mut Record>,
{
    let mut records: Vec<&'a mut Record> = records.into_iter().collect();
    if records.is_empty() {
        return 0;
    }

    let defaults = collect_defaults(records.iter().map(|r| &**r), policy);

    let mut patched = 0usize;
    for record in &mut records {
        for (name, default) in &defaults {
            if !record.contains_key(name) {
                record.insert(name.clone(), default.clone());
                patched += 1;
            }
        }
    }
    patched
}

/// Field names in first-seen order with their backfill default.
///
/// A field stays `null` until its first non-null value; every non-null type
/// has a non-null default, so a `null` slot always means "not typed yet".
fn collect_defaults<'r, I>(records: I, policy: &FieldPolicy) -> Map<String, Value>
where
    I: IntoIterator<Item = &'r Record>,
{
    let mut defaults = Map::new();
    for record in records {
        for (name, value) in record {
            if !policy.participates(name, value) {
                continue;
            }
            let slot = defaults.entry(name.as_str()).or_insert(Value::Null);
            if slot.is_null() {
                if let Some(value_type) = ValueType::of(value) {
                    *slot = value_type.backfill_default();
                }
            }
        }
    }
    defaults
}
