//! Schema profiling: per-field type, presence, and null counts.

use std::collections::BTreeMap;

use serde::Serialize;

use super::policy::FieldPolicy;
use super::types::{FieldProfile, Inconsistency, NullCount, Record, SchemaReport, ValueType};

/// Profiles a collection of records.
///
/// The recorded type of a field is the type of its first non-null value;
/// later values of other types do not change it. An empty collection yields
/// [`SchemaReport::empty`].
///
/// # Examples
///
/// ```
/// use grid_schema::schema::{profile, FieldPolicy, ValueType};
/// use serde_json::json;
///
/// let records: Vec<_> = [json!({"a": null}), json!({"a": 5}), json!({"a": "x"})]
///     .into_iter()
///     .filter_map(|v| v.as_object().cloned())
///     .collect();
/// let report = profile(&records, &FieldPolicy::new());
/// let a = &report.properties["a"];
/// assert_eq!(a.value_type, ValueType::Number);
/// assert_eq!((a.count, a.null_count), (3, 1));
/// ```
pub fn profile<'a, I>(records: I, policy: &FieldPolicy) -> SchemaReport
where
    I: IntoIterator<Item = &'a Record>,
{
    let mut properties: BTreeMap<String, FieldProfile> = BTreeMap::new();
    let mut total_items = 0usize;

    for record in records {
        total_items += 1;
        for (name, value) in record {
            if !policy.participates(name, value) {
                continue;
            }
            let Some(value_type) = ValueType::of(value) else {
                continue;
            };
            let entry = properties
                .entry(name.clone())
                .or_insert_with(|| FieldProfile {
                    value_type,
                    count: 0,
                    null_count: 0,
                });
            entry.count += 1;
            if value.is_null() {
                entry.null_count += 1;
            } else if entry.value_type == ValueType::Null {
                entry.value_type = value_type;
            }
        }
    }

    let mut inconsistencies = Vec::new();
    let mut null_counts = BTreeMap::new();
    for (name, info) in &properties {
        if info.count < total_items {
            inconsistencies.push(Inconsistency {
                property: name.clone(),
                present_in: info.count,
                total_items,
                percentage: presence_percentage(info.count, total_items),
            });
        }
        if info.null_count > 0 {
            null_counts.insert(
                name.clone(),
                NullCount {
                    count: info.null_count,
                    total: info.count,
                },
            );
        }
    }

    SchemaReport {
        properties,
        inconsistencies,
        null_counts,
        total_items,
    }
}

/// `round(present / total * 100)`, 0 for an empty collection.
pub fn presence_percentage(present: usize, total: usize) -> u32 {
    if total == 0 {
        return 0;
    }
    (present as f64 / total as f64 * 100.0).round() as u32
}

/// A field whose non-null values carry more than one type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TypeConflict {
    pub property: String,
    /// Distinct non-null types, in the order they were first seen.
    pub observed: Vec<ValueType>,
}

/// Lists fields with mixed non-null types.
///
/// [`profile`] keeps the first type it sees; this is the stricter view for
/// callers that need to know when that choice hides a disagreement.
pub fn type_conflicts<'a, I>(records: I, policy: &FieldPolicy) -> Vec<TypeConflict>
where
    I: IntoIterator<Item = &'a Record>,
{
    let mut seen: BTreeMap<&'a str, Vec<ValueType>> = BTreeMap::new();
    for record in records {
        for (name, value) in record {
            if value.is_null() || !policy.participates(name, value) {
                continue;
            }
            let Some(value_type) = ValueType::of(value) else {
                continue;
            };
            let types = seen.entry(name.as_str()).or_default();
            if !types.contains(&value_type) {
                types.push(value_type);
            }
        }
    }
    seen.into_iter()
        .filter(|(_, types)| types.len() > 1)
        .map(|(name, observed)| TypeConflict {
            property: name.to_string(),
            observed,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};

    fn records(values: Vec<Value>) -> Vec<Record> {
        values
            .into_iter()
            .filter_map(|v| v.as_object().cloned())
            .collect()
    }

    #[test]
    fn empty_collection_gives_empty_report() {
        let report = profile(&Vec::<Record>::new(), &FieldPolicy::new());
        assert_eq!(report, SchemaReport::empty());
        assert_eq!(report.total_items, 0);
    }

    #[test]
    fn first_non_null_type_wins() {
        let recs = records(vec![json!({"a": null}), json!({"a": 5}), json!({"a": "x"})]);
        let report = profile(&recs, &FieldPolicy::new());
        let a = &report.properties["a"];
        assert_eq!(a.value_type, ValueType::Number);
        assert_eq!(a.count, 3);
        assert_eq!(a.null_count, 1);
        assert_eq!(report.null_counts["a"], NullCount { count: 1, total: 3 });
    }

    #[test]
    fn all_null_field_stays_null_typed() {
        let recs = records(vec![json!({"a": null}), json!({"a": null})]);
        let report = profile(&recs, &FieldPolicy::new());
        assert_eq!(report.field_type("a"), ValueType::Null);
    }

    #[test]
    fn detects_partially_present_fields() {
        let recs = records(vec![json!({"a": 1, "b": 2}), json!({"a": 1})]);
        let report = profile(&recs, &FieldPolicy::new());
        assert_eq!(
            report.inconsistencies,
            vec![Inconsistency {
                property: "b".to_string(),
                present_in: 1,
                total_items: 2,
                percentage: 50,
            }]
        );
        assert!(report.null_counts.is_empty());
    }

    #[test]
    fn percentage_rounds_to_nearest() {
        assert_eq!(presence_percentage(1, 3), 33);
        assert_eq!(presence_percentage(2, 3), 67);
        assert_eq!(presence_percentage(1, 8), 13);
    }

    #[test]
    fn arrays_profiled_nested_objects_skipped() {
        let recs = records(vec![json!({"a": [1, 2], "b": {"nested": 1}})]);
        let report = profile(&recs, &FieldPolicy::new());
        assert_eq!(report.field_type("a"), ValueType::Array);
        assert!(!report.properties.contains_key("b"));
    }

    #[test]
    fn excluded_fields_skipped() {
        let recs = records(vec![json!({"Name": "x", "Complejos_G2": []})]);
        let policy = FieldPolicy::new().with_excluded(["Complejos_G2"]);
        let report = profile(&recs, &policy);
        assert_eq!(report.properties.len(), 1);
        assert!(report.is_consistent());
    }

    #[test]
    fn conflicts_list_types_in_first_seen_order() {
        let recs = records(vec![
            json!({"a": null, "b": 1}),
            json!({"a": 5, "b": 2}),
            json!({"a": "x"}),
            json!({"a": 7}),
        ]);
        let conflicts = type_conflicts(&recs, &FieldPolicy::new());
        assert_eq!(
            conflicts,
            vec![TypeConflict {
                property: "a".to_string(),
                observed: vec![ValueType::Number, ValueType::String],
            }]
        );
    }
}
