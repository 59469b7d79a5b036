//! Generator hierarchy resolution.
//!
//! The dataset is a tree of arrays: the root key holds level 0, and each
//! level's items hold the next level under a fixed child key. A level's
//! collection is every item at that depth, from every branch.

use serde_json::Value;

use super::StoreError;
use super::status::is_active;
use crate::config::HierarchyConfig;
use crate::schema::{FieldPolicy, Record};

/// Resolver over one hierarchy layout.
#[derive(Debug, Clone, Copy)]
pub struct Hierarchy<'c> {
    config: &'c HierarchyConfig,
}

impl<'c> Hierarchy<'c> {
    pub fn new(config: &'c HierarchyConfig) -> Self {
        Self { config }
    }

    pub fn depth(&self) -> usize {
        self.config.depth()
    }

    /// Display name of `level`, if it exists.
    pub fn level_name(&self, level: usize) -> Option<&'c str> {
        self.config.level_names.get(level).map(String::as_str)
    }

    /// Child-array key of `level`, `None` for the leaf level.
    pub fn child_key(&self, level: usize) -> Option<&'c str> {
        self.config.child_keys.get(level).map(String::as_str)
    }

    /// Schema rules for every level: child links excluded, configured
    /// identity fields protected.
    pub fn policy(&self) -> FieldPolicy {
        FieldPolicy::new()
            .with_excluded(self.config.child_keys.iter().cloned())
            .with_protected(self.config.protected.iter().cloned())
    }

    fn check_level(&self, level: usize) -> Result<(), StoreError> {
        if level < self.depth() {
            Ok(())
        } else {
            Err(StoreError::LevelOutOfRange {
                level,
                depth: self.depth(),
            })
        }
    }

    /// Every item at `level`, across all branches.
    ///
    /// # Errors
    ///
    /// `LevelOutOfRange` for a level past the leaf, `NotARecord` when a
    /// traversed array holds something other than an object.
    pub fn items_at_level<'a>(
        &self,
        root: &'a Value,
        level: usize,
    ) -> Result<Vec<&'a Record>, StoreError> {
        self.collect(root, level, false)
    }

    /// Items at `level` whose whole ancestor chain is in service.
    pub fn active_items_at_level<'a>(
        &self,
        root: &'a Value,
        level: usize,
    ) -> Result<Vec<&'a Record>, StoreError> {
        self.collect(root, level, true)
    }

    fn collect<'a>(
        &self,
        root: &'a Value,
        level: usize,
        active_only: bool,
    ) -> Result<Vec<&'a Record>, StoreError> {
        self.check_level(level)?;
        let mut out = Vec::new();
        if let Some(items) = self.root_array(root)? {
            self.collect_from(items, 0, level, active_only, &self.config.root_key, &mut out)?;
        }
        Ok(out)
    }

    fn collect_from<'a>(
        &self,
        items: &'a [Value],
        depth: usize,
        target: usize,
        active_only: bool,
        path: &str,
        out: &mut Vec<&'a Record>,
    ) -> Result<(), StoreError> {
        for (index, item) in items.iter().enumerate() {
            let Value::Object(record) = item else {
                return Err(StoreError::NotARecord {
                    path: format!("{path}[{index}]"),
                });
            };
            if active_only && !self.is_active(record) {
                continue;
            }
            if depth == target {
                out.push(record);
                continue;
            }
            let key = &self.config.child_keys[depth];
            if let Some(Value::Array(children)) = record.get(key) {
                let child_path = format!("{path}[{index}].{key}");
                self.collect_from(children, depth + 1, target, active_only, &child_path, out)?;
            }
        }
        Ok(())
    }

    /// Mutable access to every item at `level`, across all branches.
    pub fn items_at_level_mut<'a>(
        &self,
        root: &'a mut Value,
        level: usize,
    ) -> Result<Vec<&'a mut Record>, StoreError> {
        self.check_level(level)?;
        let mut out = Vec::new();
        if let Some(items) = self.root_array_mut(root)? {
            self.collect_from_mut(items, 0, level, &self.config.root_key, &mut out)?;
        }
        Ok(out)
    }

    fn collect_from_mut<'a>(
        &self,
        items: &'a mut [Value],
        depth: usize,
        target: usize,
        path: &str,
        out: &mut Vec<&'a mut Record>,
    ) -> Result<(), StoreError> {
        for (index, item) in items.iter_mut().enumerate() {
            let Value::Object(record) = item else {
                return Err(StoreError::NotARecord {
                    path: format!("{path}[{index}]"),
                });
            };
            if depth == target {
                out.push(record);
                continue;
            }
            let key = &self.config.child_keys[depth];
            if let Some(Value::Array(children)) = record.get_mut(key) {
                let child_path = format!("{path}[{index}].{key}");
                self.collect_from_mut(children, depth + 1, target, &child_path, out)?;
            }
        }
        Ok(())
    }

    /// Children reached by following `codes` from the root, one code per
    /// level. An empty path yields the root level; an unknown code yields
    /// nothing.
    pub fn items_at_path<'a>(
        &self,
        root: &'a Value,
        codes: &[&str],
    ) -> Result<Vec<&'a Record>, StoreError> {
        self.check_level(codes.len())?;
        let Some(mut current) = self.root_array(root)? else {
            return Ok(Vec::new());
        };
        for (depth, code) in codes.iter().enumerate() {
            let found = current
                .iter()
                .filter_map(Value::as_object)
                .find(|record| self.has_code(record, code));
            let Some(parent) = found else {
                return Ok(Vec::new());
            };
            current = match parent.get(&self.config.child_keys[depth]) {
                Some(Value::Array(children)) => children,
                _ => return Ok(Vec::new()),
            };
        }
        Ok(current.iter().filter_map(Value::as_object).collect())
    }

    /// Removes the first item at `level` whose code is `code`.
    pub fn remove_at_level(
        &self,
        root: &mut Value,
        level: usize,
        code: &str,
    ) -> Result<bool, StoreError> {
        self.check_level(level)?;
        let arrays: Vec<&mut Vec<Value>> = if level == 0 {
            self.root_array_mut(root)?.into_iter().collect()
        } else {
            let key = &self.config.child_keys[level - 1];
            self.items_at_level_mut(root, level - 1)?
                .into_iter()
                .filter_map(|parent| match parent.get_mut(key) {
                    Some(Value::Array(children)) => Some(children),
                    _ => None,
                })
                .collect()
        };
        for array in arrays {
            let position = array
                .iter()
                .position(|item| item.as_object().is_some_and(|r| self.has_code(r, code)));
            if let Some(position) = position {
                array.remove(position);
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Whether `record` is in service under the hierarchy's status rule.
    pub fn is_active(&self, record: &Record) -> bool {
        is_active(
            record,
            self.config.status_field.as_deref(),
            self.config.activity,
        )
    }

    fn has_code(&self, record: &Record, code: &str) -> bool {
        match record.get(&self.config.code_field) {
            Some(Value::String(s)) => s == code,
            Some(Value::Number(n)) => n.to_string() == code,
            _ => false,
        }
    }

    fn root_array<'a>(&self, root: &'a Value) -> Result<Option<&'a Vec<Value>>, StoreError> {
        match root.get(&self.config.root_key) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::Array(items)) => Ok(Some(items)),
            Some(_) => Err(StoreError::Malformed {
                path: self.config.root_key.clone(),
                expected: "an array",
            }),
        }
    }

    fn root_array_mut<'a>(
        &self,
        root: &'a mut Value,
    ) -> Result<Option<&'a mut Vec<Value>>, StoreError> {
        match root.get_mut(&self.config.root_key) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::Array(items)) => Ok(Some(items)),
            Some(_) => Err(StoreError::Malformed {
                path: self.config.root_key.clone(),
                expected: "an array",
            }),
        }
    }
}
