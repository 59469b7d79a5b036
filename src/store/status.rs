//! In-service checks for records carrying a status field.

use serde_json::Value;

use crate::config::ActivityRule;
use crate::schema::Record;

/// Whether `record` counts as in service under `rule`.
///
/// A scope without a status field treats every record as active. An absent
/// status field is active under `NotFalse` and `Truthy`, inactive under
/// `Strict`.
pub fn is_active(record: &Record, status_field: Option<&str>, rule: ActivityRule) -> bool {
    let Some(field) = status_field else {
        return true;
    };
    let status = record.get(field);
    match rule {
        ActivityRule::NotFalse => !matches!(status, Some(Value::Bool(false))),
        ActivityRule::Truthy => {
            !matches!(status, Some(Value::Bool(false)))
                && !number_equals(status, 0.0)
                && !matches!(status, Some(Value::String(s)) if s == "0")
        }
        ActivityRule::Strict => {
            matches!(status, Some(Value::Bool(true))) || number_equals(status, 1.0)
        }
    }
}

fn number_equals(value: Option<&Value>, expected: f64) -> bool {
    value.and_then(Value::as_f64) == Some(expected)
}
