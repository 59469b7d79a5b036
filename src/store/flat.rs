//! Flat keyed-map resolution for network categories and demand loads.
//!
//! A category is an object under the dataset's root key mapping an item id
//! to its record. Materialized items carry the id in a key field so edits can
//! be written back to the right entry.

use serde_json::{Map, Value};

use super::StoreError;
use super::status::is_active;
use crate::config::{ActivityRule, NetworkConfig};
use crate::schema::Record;

/// Resolver over one `root.category` map.
#[derive(Debug, Clone, Copy)]
pub struct FlatMap<'c> {
    root_key: &'c str,
    category: &'c str,
    key_field: &'c str,
}

impl<'c> FlatMap<'c> {
    pub fn new(root_key: &'c str, category: &'c str, key_field: &'c str) -> Self {
        Self {
            root_key,
            category,
            key_field,
        }
    }

    fn path(&self) -> String {
        format!("{}.{}", self.root_key, self.category)
    }

    fn map<'a>(&self, root: &'a Value) -> Result<Option<&'a Map<String, Value>>, StoreError> {
        let base = match root.get(self.root_key) {
            None | Some(Value::Null) => return Ok(None),
            Some(Value::Object(base)) => base,
            Some(_) => {
                return Err(StoreError::Malformed {
                    path: self.root_key.to_string(),
                    expected: "an object",
                });
            }
        };
        match base.get(self.category) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::Object(map)) => Ok(Some(map)),
            Some(_) => Err(StoreError::Malformed {
                path: self.path(),
                expected: "an object",
            }),
        }
    }

    fn map_mut<'a>(
        &self,
        root: &'a mut Value,
    ) -> Result<Option<&'a mut Map<String, Value>>, StoreError> {
        let base = match root.get_mut(self.root_key) {
            None | Some(Value::Null) => return Ok(None),
            Some(Value::Object(base)) => base,
            Some(_) => {
                return Err(StoreError::Malformed {
                    path: self.root_key.to_string(),
                    expected: "an object",
                });
            }
        };
        match base.get_mut(self.category) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::Object(map)) => Ok(Some(map)),
            Some(_) => Err(StoreError::Malformed {
                path: self.path(),
                expected: "an object",
            }),
        }
    }

    /// The stored records, in map order. A missing category is empty.
    pub fn records<'a>(&self, root: &'a Value) -> Result<Vec<&'a Record>, StoreError> {
        let Some(map) = self.map(root)? else {
            return Ok(Vec::new());
        };
        map.iter()
            .map(|(key, value)| {
                value.as_object().ok_or_else(|| StoreError::NotARecord {
                    path: format!("{}[\"{key}\"]", self.path()),
                })
            })
            .collect()
    }

    pub fn records_mut<'a>(&self, root: &'a mut Value) -> Result<Vec<&'a mut Record>, StoreError> {
        let path = self.path();
        let Some(map) = self.map_mut(root)? else {
            return Ok(Vec::new());
        };
        map.iter_mut()
            .map(|(key, value)| {
                value.as_object_mut().ok_or_else(|| StoreError::NotARecord {
                    path: format!("{path}[\"{key}\"]"),
                })
            })
            .collect()
    }

    /// Copies of the records with their map key projected into the key field.
    pub fn materialize(
        &self,
        root: &Value,
        status: Option<(&str, ActivityRule)>,
    ) -> Result<Vec<Record>, StoreError> {
        let Some(map) = self.map(root)? else {
            return Ok(Vec::new());
        };
        let mut items = Vec::with_capacity(map.len());
        for (key, value) in map {
            let Value::Object(record) = value else {
                return Err(StoreError::NotARecord {
                    path: format!("{}[\"{key}\"]", self.path()),
                });
            };
            if let Some((field, rule)) = status {
                if !is_active(record, Some(field), rule) {
                    continue;
                }
            }
            let mut item = record.clone();
            item.insert(self.key_field.to_string(), Value::String(key.clone()));
            items.push(item);
        }
        Ok(items)
    }

    /// Stores a materialized item under the id in its key field, creating the
    /// category when needed. Returns the id.
    ///
    /// # Errors
    ///
    /// `MissingKey` when the item carries no usable id.
    pub fn write_back(&self, root: &mut Value, mut item: Record) -> Result<String, StoreError> {
        let key = match item.shift_remove(self.key_field) {
            Some(Value::String(key)) if !key.is_empty() => key,
            Some(Value::Number(n)) => n.to_string(),
            _ => return Err(StoreError::MissingKey(self.key_field.to_string())),
        };
        if !root.is_object() {
            *root = Value::Object(Map::new());
        }
        let Some(root_map) = root.as_object_mut() else {
            return Err(StoreError::Malformed {
                path: "$".to_string(),
                expected: "an object",
            });
        };
        let base = root_map
            .entry(self.root_key)
            .or_insert_with(|| Value::Object(Map::new()));
        let Some(base) = base.as_object_mut() else {
            return Err(StoreError::Malformed {
                path: self.root_key.to_string(),
                expected: "an object",
            });
        };
        let map = base
            .entry(self.category)
            .or_insert_with(|| Value::Object(Map::new()));
        let Some(map) = map.as_object_mut() else {
            return Err(StoreError::Malformed {
                path: self.path(),
                expected: "an object",
            });
        };
        map.insert(key.clone(), Value::Object(item));
        Ok(key)
    }

    /// Deletes the entry with id `key`. Returns whether it existed.
    pub fn remove(&self, root: &mut Value, key: &str) -> Result<bool, StoreError> {
        Ok(self
            .map_mut(root)?
            .is_some_and(|map| map.shift_remove(key).is_some()))
    }
}

/// Non-empty categories of a network dataset: configured ones first, in
/// configured order, then any other object-valued key that is not a system
/// property.
pub fn available_categories(root: &Value, config: &NetworkConfig) -> Vec<String> {
    let Some(base) = root.get(&config.root_key).and_then(Value::as_object) else {
        return Vec::new();
    };
    let non_empty = |name: &str| {
        base.get(name)
            .and_then(Value::as_object)
            .is_some_and(|m| !m.is_empty())
    };

    let mut available: Vec<String> = config
        .categories
        .iter()
        .map(|c| c.name.clone())
        .filter(|name| non_empty(name))
        .collect();
    for name in base.keys() {
        if config.system_fields.contains(name) || available.contains(name) {
            continue;
        }
        if non_empty(name) {
            available.push(name.clone());
        }
    }
    available
}
