//! Per-scope field rules shared by every schema operation.

use serde_json::Value;

/// Which fields of a collection take part in schema operations, and which
/// ones are locked against removal.
///
/// Excluded fields (child-collection links, projected map keys) are skipped
/// by profiling and normalization. Nested objects are always skipped.
///
/// # Examples
///
/// ```
/// use grid_schema::schema::FieldPolicy;
/// use serde_json::json;
///
/// let policy = FieldPolicy::new()
///     .with_excluded(["Complejos_G2"])
///     .with_protected(["Name", "Code"]);
/// assert!(!policy.participates("Complejos_G2", &json!([])));
/// assert!(!policy.participates("meta", &json!({"a": 1})));
/// assert!(policy.participates("Pmax", &json!(12.5)));
/// assert!(policy.is_protected("Code"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldPolicy {
    excluded: Vec<String>,
    protected: Vec<String>,
}

impl FieldPolicy {
    /// A policy that excludes nothing but nested objects.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_excluded<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.excluded.extend(names.into_iter().map(Into::into));
        self
    }

    pub fn with_protected<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.protected.extend(names.into_iter().map(Into::into));
        self
    }

    pub fn is_excluded(&self, name: &str) -> bool {
        self.excluded.iter().any(|n| n == name)
    }

    pub fn is_protected(&self, name: &str) -> bool {
        self.protected.iter().any(|n| n == name)
    }

    /// Protected field names in their configured order.
    pub fn protected(&self) -> &[String] {
        &self.protected
    }

    /// Whether a field/value pair is visible to profiling and normalization.
    pub fn participates(&self, name: &str, value: &Value) -> bool {
        !value.is_object() && !self.is_excluded(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn arrays_and_nulls_participate() {
        let policy = FieldPolicy::new();
        assert!(policy.participates("a", &json!([1, 2])));
        assert!(policy.participates("a", &json!(null)));
    }

    #[test]
    fn excluded_names_never_participate() {
        let policy = FieldPolicy::new().with_excluded(["_key"]);
        assert!(!policy.participates("_key", &json!("7")));
        assert!(!policy.is_protected("_key"));
    }
}
