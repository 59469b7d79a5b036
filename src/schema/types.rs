//! Core schema types: records, value type tags, field profiles, and reports.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::editor::EditError;
use super::policy::FieldPolicy;

/// One dataset element: an ordered mapping of field name to JSON value.
pub type Record = serde_json::Map<String, Value>;

/// Observed type of a field value.
///
/// `Undefined` tags an absent field and is never recorded in a profile.
///
/// # Examples
///
/// ```
/// use grid_schema::schema::ValueType;
/// use serde_json::json;
///
/// assert_eq!(ValueType::of(&json!(null)), Some(ValueType::Null));
/// assert_eq!(ValueType::of(&json!([1, 2])), Some(ValueType::Array));
/// assert_eq!(ValueType::of(&json!({"nested": 1})), None);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueType {
    String,
    Number,
    Boolean,
    Null,
    Array,
    Undefined,
}

impl ValueType {
    /// Type tag of a value, or `None` for nested objects (which never take
    /// part in schema profiling).
    pub fn of(value: &Value) -> Option<Self> {
        match value {
            Value::Null => Some(Self::Null),
            Value::Bool(_) => Some(Self::Boolean),
            Value::Number(_) => Some(Self::Number),
            Value::String(_) => Some(Self::String),
            Value::Array(_) => Some(Self::Array),
            Value::Object(_) => None,
        }
    }

    /// Lowercase tag name as shown to users.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Number => "number",
            Self::Boolean => "boolean",
            Self::Null => "null",
            Self::Array => "array",
            Self::Undefined => "undefined",
        }
    }

    /// Default value used when backfilling a field first seen with this type.
    ///
    /// Arrays fall back to an empty string, as the dataset editor always did.
    pub fn backfill_default(self) -> Value {
        match self {
            Self::Boolean => Value::Bool(false),
            Self::Number => Value::from(0),
            Self::String | Self::Array => Value::String(String::new()),
            Self::Null | Self::Undefined => Value::Null,
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ValueType {
    type Err = EditError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "string" | "text" => Ok(Self::String),
            "number" => Ok(Self::Number),
            "boolean" | "bool" => Ok(Self::Boolean),
            "null" => Ok(Self::Null),
            "array" => Ok(Self::Array),
            other => Err(EditError::UnknownType(other.to_string())),
        }
    }
}

/// Per-field observation within one collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldProfile {
    /// First non-null type seen, or `null` if every occurrence was null.
    #[serde(rename = "type")]
    pub value_type: ValueType,
    /// Records where the field is present, whatever its value.
    pub count: usize,
    /// Records where the field is present and null.
    pub null_count: usize,
}

/// A field missing from part of the collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Inconsistency {
    pub property: String,
    pub present_in: usize,
    pub total_items: usize,
    /// `round(present_in / total_items * 100)`.
    pub percentage: u32,
}

/// Null occurrences of one field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NullCount {
    pub count: usize,
    pub total: usize,
}

/// Schema profile of a whole collection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaReport {
    pub properties: BTreeMap<String, FieldProfile>,
    pub inconsistencies: Vec<Inconsistency>,
    pub null_counts: BTreeMap<String, NullCount>,
    pub total_items: usize,
}

impl SchemaReport {
    /// Report of an empty collection.
    pub fn empty() -> Self {
        Self::default()
    }

    /// True when every field is present on every record.
    pub fn is_consistent(&self) -> bool {
        self.inconsistencies.is_empty()
    }

    /// Type of a field, `Undefined` when the collection never carries it.
    pub fn field_type(&self, name: &str) -> ValueType {
        self.properties
            .get(name)
            .map_or(ValueType::Undefined, |p| p.value_type)
    }

    /// Field names with protected fields first, the rest alphabetical.
    pub fn ordered_fields(&self, policy: &FieldPolicy) -> Vec<&str> {
        let mut names: Vec<&str> = self.properties.keys().map(String::as_str).collect();
        names.sort_by(|a, b| compare_fields(policy, a, b));
        names
    }
}

/// Protected-first ordering, then case-insensitive alphabetical.
pub fn compare_fields(policy: &FieldPolicy, a: &str, b: &str) -> Ordering {
    let a_protected = policy.is_protected(a);
    let b_protected = policy.is_protected(b);
    b_protected
        .cmp(&a_protected)
        .then_with(|| a.to_lowercase().cmp(&b.to_lowercase()))
        .then_with(|| a.cmp(b))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn type_tags_cover_scalars_and_arrays() {
        assert_eq!(ValueType::of(&json!("x")), Some(ValueType::String));
        assert_eq!(ValueType::of(&json!(1.5)), Some(ValueType::Number));
        assert_eq!(ValueType::of(&json!(true)), Some(ValueType::Boolean));
        assert_eq!(ValueType::of(&json!({})), None);
    }

    #[test]
    fn parses_ui_type_tags() {
        assert_eq!("text".parse::<ValueType>().ok(), Some(ValueType::String));
        assert_eq!("Number".parse::<ValueType>().ok(), Some(ValueType::Number));
        assert!("date".parse::<ValueType>().is_err());
    }

    #[test]
    fn empty_report_serializes_with_camel_case_keys() {
        let value = serde_json::to_value(SchemaReport::empty()).ok();
        assert_eq!(
            value,
            Some(json!({
                "properties": {},
                "inconsistencies": [],
                "nullCounts": {},
                "totalItems": 0
            }))
        );
    }

    #[test]
    fn ordering_puts_protected_fields_first() {
        let policy = FieldPolicy::new().with_protected(["Name", "Code"]);
        let mut report = SchemaReport::empty();
        for name in ["zeta", "Code", "alpha", "Name", "Beta"] {
            report.properties.insert(
                name.to_string(),
                FieldProfile {
                    value_type: ValueType::String,
                    count: 1,
                    null_count: 0,
                },
            );
        }
        assert_eq!(
            report.ordered_fields(&policy),
            vec!["Code", "Name", "alpha", "Beta", "zeta"]
        );
    }
}
