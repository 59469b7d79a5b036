//! Bulk schema edits: add a field to every record, or remove it from all.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde_json::{Number, Value};
use thiserror::Error;

use super::types::{Record, ValueType};

static FIELD_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").unwrap_or_else(|e| panic!("field name pattern: {e}"))
});

static FLOAT_PREFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[+-]?(\d+\.?\d*|\.\d+)([eE][+-]?\d+)?")
        .unwrap_or_else(|e| panic!("float prefix pattern: {e}"))
});

/// Rejected schema edit. Nothing has been mutated when one is returned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EditError {
    #[error("field name is empty")]
    EmptyName,

    #[error(
        "invalid field name \"{0}\": must start with a letter or underscore, \
         followed by letters, digits, or underscores"
    )]
    InvalidName(String),

    #[error("unknown field type \"{0}\", expected string, number, boolean, null, or array")]
    UnknownType(String),
}

/// A validated field name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldName(String);

impl FieldName {
    /// Validates `name` against the identifier pattern.
    ///
    /// # Errors
    ///
    /// `EmptyName` for an empty string, `InvalidName` when the pattern does
    /// not match.
    pub fn parse(name: &str) -> Result<Self, EditError> {
        if name.is_empty() {
            return Err(EditError::EmptyName);
        }
        if !FIELD_NAME.is_match(name) {
            return Err(EditError::InvalidName(name.to_string()));
        }
        Ok(Self(name.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FieldName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Converts default-value text from the UI into a value of type `ty`.
///
/// Never fails:
/// - `number`: leading numeric prefix of the text; empty, unparsable, or
///   non-finite text gives `0`
/// - `boolean`: `true` only for `"true"` or `"1"`
/// - `null`: `null`
/// - `array`: the text when it is a JSON array, otherwise `[]`
/// - `string`: the raw text
pub fn coerce_default(ty: ValueType, text: &str) -> Value {
    match ty {
        ValueType::Number => parse_number_prefix(text).unwrap_or_else(|| Value::from(0)),
        ValueType::Boolean => Value::Bool(text == "true" || text == "1"),
        ValueType::Null | ValueType::Undefined => Value::Null,
        ValueType::Array => match serde_json::from_str::<Value>(text) {
            Ok(array @ Value::Array(_)) => array,
            _ => Value::Array(Vec::new()),
        },
        ValueType::String => Value::String(text.to_string()),
    }
}

fn parse_number_prefix(text: &str) -> Option<Value> {
    let matched = FLOAT_PREFIX.find(text.trim_start())?;
    let parsed: f64 = matched.as_str().parse().ok()?;
    if !parsed.is_finite() || parsed == 0.0 {
        return None;
    }
    if parsed.fract() == 0.0 && parsed.abs() < i64::MAX as f64 {
        return Some(Value::from(parsed as i64));
    }
    Number::from_f64(parsed).map(Value::Number)
}

/// Adds `name` to every record that lacks it, set to the coerced default.
///
/// Records that already have the field keep their value. Returns the number
/// of records touched.
///
/// # Errors
///
/// Returns an [`EditError`] for an invalid name; no record is modified.
///
/// # Examples
///
/// ```
/// use grid_schema::schema::{add_field, ValueType};
/// use serde_json::json;
///
/// let mut records: Vec<_> = [json!({"a": 1}), json!({"b": 2})]
///     .into_iter()
///     .filter_map(|v| v.as_object().cloned())
///     .collect();
/// let added = add_field(&mut records, "a", ValueType::Number, "9");
/// assert_eq!(added, Ok(1));
/// assert_eq!(records[0]["a"], json!(1));
/// assert_eq!(records[1]["a"], json!(9));
/// ```
pub fn add_field<'a, I>(
    records: I,
    name: &str,
    ty: ValueType,
    default_text: &str,
) -> Result<usize, EditError>
where
    I: IntoIterator<Item = &'a mut Record>,
{
    let name = FieldName::parse(name)?;
    let value = coerce_default(ty, default_text);

    let mut added = 0usize;
    for record in records {
        if !record.contains_key(name.as_str()) {
            record.insert(name.0.clone(), value.clone());
            added += 1;
        }
    }
    Ok(added)
}

/// Removes `name` from every record holding it. Returns the number removed.
///
/// Protected fields are not checked here; callers guard them.
pub fn remove_field<'a, I>(records: I, name: &str) -> usize
where
    I: IntoIterator<Item = &'a mut Record>,
{
    records
        .into_iter()
        .filter_map(|record| record.shift_remove(name))
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn records(values: Vec<Value>) -> Vec<Record> {
        values
            .into_iter()
            .filter_map(|v| v.as_object().cloned())
            .collect()
    }

    #[test]
    fn field_names_follow_identifier_pattern() {
        assert!(FieldName::parse("Pmax").is_ok());
        assert!(FieldName::parse("_private2").is_ok());
        assert_eq!(FieldName::parse(""), Err(EditError::EmptyName));
        assert_eq!(
            FieldName::parse("1bad"),
            Err(EditError::InvalidName("1bad".to_string()))
        );
        assert!(FieldName::parse("has space").is_err());
        assert!(FieldName::parse("dash-ed").is_err());
    }

    #[test]
    fn number_coercion_matches_leading_float_parse() {
        assert_eq!(coerce_default(ValueType::Number, "9"), json!(9));
        assert_eq!(coerce_default(ValueType::Number, "2.5"), json!(2.5));
        assert_eq!(coerce_default(ValueType::Number, "  12abc"), json!(12));
        assert_eq!(coerce_default(ValueType::Number, "-.5"), json!(-0.5));
        assert_eq!(coerce_default(ValueType::Number, "1e3"), json!(1000));
        assert_eq!(coerce_default(ValueType::Number, ""), json!(0));
        assert_eq!(coerce_default(ValueType::Number, "abc"), json!(0));
        assert_eq!(coerce_default(ValueType::Number, "1e999"), json!(0));
    }

    #[test]
    fn boolean_null_and_text_coercion() {
        assert_eq!(coerce_default(ValueType::Boolean, "true"), json!(true));
        assert_eq!(coerce_default(ValueType::Boolean, "1"), json!(true));
        assert_eq!(coerce_default(ValueType::Boolean, "yes"), json!(false));
        assert_eq!(coerce_default(ValueType::Null, "anything"), json!(null));
        assert_eq!(coerce_default(ValueType::String, "Gas"), json!("Gas"));
        assert_eq!(coerce_default(ValueType::String, ""), json!(""));
    }

    #[test]
    fn array_coercion_accepts_json_arrays_only() {
        assert_eq!(coerce_default(ValueType::Array, "[1, 2]"), json!([1, 2]));
        assert_eq!(coerce_default(ValueType::Array, "{\"a\": 1}"), json!([]));
        assert_eq!(coerce_default(ValueType::Array, "1,2"), json!([]));
    }

    #[test]
    fn invalid_name_mutates_nothing() {
        let mut recs = records(vec![json!({"a": 1}), json!({})]);
        let before = recs.clone();
        let result = add_field(&mut recs, "1bad", ValueType::String, "x");
        assert!(matches!(result, Err(EditError::InvalidName(_))));
        assert_eq!(recs, before);
    }

    #[test]
    fn add_skips_records_that_already_have_the_field() {
        let mut recs = records(vec![json!({"a": null}), json!({"b": 2}), json!({})]);
        let added = add_field(&mut recs, "a", ValueType::Boolean, "1");
        assert_eq!(added, Ok(2));
        assert_eq!(recs[0]["a"], json!(null));
        assert_eq!(recs[2]["a"], json!(true));
    }

    #[test]
    fn remove_deletes_every_occurrence() {
        let mut recs = records(vec![
            json!({"x": 1}),
            json!({"y": 1}),
            json!({"x": null}),
            json!({"x": "v", "y": 2}),
            json!({}),
        ]);
        assert_eq!(remove_field(&mut recs, "x"), 3);
        assert!(recs.iter().all(|r| !r.contains_key("x")));
        assert_eq!(remove_field(&mut recs, "x"), 0);
    }

    #[test]
    fn remove_keeps_remaining_field_order() {
        let mut recs = records(vec![json!({"a": 1, "x": 2, "b": 3, "c": 4})]);
        remove_field(&mut recs, "x");
        let keys: Vec<&str> = recs[0].keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["a", "b", "c"]);
    }
}
