//! Loaded datasets, scope resolution, and cached schema views.
//!
//! Every operation names its collection with an explicit [`Scope`]. Any
//! mutation of a scope drops that scope's cached report and views; a
//! mutation of one hierarchy level drops every level.

pub mod cache;
pub mod flat;
pub mod hierarchy;
pub mod status;

use std::fmt;
use std::str::FromStr;

use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info};

use crate::config::{ActivityRule, EditorConfig};
use crate::schema::{
    self, EditError, FieldPolicy, Record, SchemaReport, TypeConflict, ValueType,
};

pub use cache::{ScopeCache, ViewConfig};
pub use flat::{FlatMap, available_categories};
pub use hierarchy::Hierarchy;
pub use status::is_active;

/// Which loaded dataset a scope belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DatasetKind {
    Generators,
    Network,
    Demand,
}

impl DatasetKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Generators => "generators",
            Self::Network => "network",
            Self::Demand => "demand",
        }
    }
}

impl fmt::Display for DatasetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DatasetKind {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "generators" => Ok(Self::Generators),
            "network" => Ok(Self::Network),
            "demand" => Ok(Self::Demand),
            other => Err(StoreError::InvalidScope(other.to_string())),
        }
    }
}

/// One collection: a hierarchy level, a network category, or the load map.
///
/// Written as `generators:<level>`, `network:<category>`, or `demand`.
///
/// # Examples
///
/// ```
/// use grid_schema::store::Scope;
///
/// let scope: Scope = "network:branch".parse().unwrap();
/// assert_eq!(scope, Scope::Network { category: "branch".to_string() });
/// assert_eq!(scope.to_string(), "network:branch");
/// assert!("generators:x".parse::<Scope>().is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Scope {
    Generators { level: usize },
    Network { category: String },
    Demand,
}

impl Scope {
    pub fn kind(&self) -> DatasetKind {
        match self {
            Self::Generators { .. } => DatasetKind::Generators,
            Self::Network { .. } => DatasetKind::Network,
            Self::Demand => DatasetKind::Demand,
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Generators { level } => write!(f, "generators:{level}"),
            Self::Network { category } => write!(f, "network:{category}"),
            Self::Demand => f.write_str("demand"),
        }
    }
}

impl FromStr for Scope {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || StoreError::InvalidScope(s.to_string());
        match s.split_once(':') {
            Some(("generators", level)) => level
                .parse()
                .map(|level| Self::Generators { level })
                .map_err(|_| invalid()),
            Some(("network", category)) if !category.is_empty() => Ok(Self::Network {
                category: category.to_string(),
            }),
            None if s == "demand" => Ok(Self::Demand),
            _ => Err(invalid()),
        }
    }
}

/// Data store errors.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{0} dataset is not loaded")]
    NotLoaded(DatasetKind),

    #[error("level {level} out of range, hierarchy has {depth} levels")]
    LevelOutOfRange { level: usize, depth: usize },

    #[error("expected an object at {path}")]
    NotARecord { path: String },

    #[error("expected {expected} at {path}")]
    Malformed {
        path: String,
        expected: &'static str,
    },

    #[error("field \"{field}\" is protected in {scope}")]
    ProtectedField { field: String, scope: Scope },

    #[error("item has no \"{0}\" identifier")]
    MissingKey(String),

    #[error("{operation} is not supported for {scope}")]
    UnsupportedForScope {
        operation: &'static str,
        scope: Scope,
    },

    #[error(
        "invalid scope \"{0}\": expected generators:<level>, network:<category>, or demand"
    )]
    InvalidScope(String),

    #[error(transparent)]
    Edit(#[from] EditError),
}

/// Holds the loaded datasets and applies schema operations to explicit
/// scopes.
///
/// # Examples
///
/// ```
/// use grid_schema::config::EditorConfig;
/// use grid_schema::store::{DataStore, DatasetKind, Scope};
/// use serde_json::json;
///
/// let mut store = DataStore::new(EditorConfig::standard());
/// store.load(DatasetKind::Demand, json!({
///     "base": {"load": {"1": {"name": "L1", "pd": 10}, "2": {"name": "L2"}}}
/// }));
/// let report = store.report(&Scope::Demand).unwrap();
/// assert_eq!(report.inconsistencies.len(), 1);
/// assert_eq!(store.normalize(&Scope::Demand).unwrap(), 1);
/// ```
#[derive(Debug)]
pub struct DataStore {
    config: EditorConfig,
    generators: Option<Value>,
    network: Option<Value>,
    demand: Option<Value>,
    reports: ScopeCache<SchemaReport>,
    views: ScopeCache<Vec<Record>>,
}

impl DataStore {
    pub fn new(config: EditorConfig) -> Self {
        let reports = ScopeCache::from_config(&config.cache);
        let views = ScopeCache::from_config(&config.cache);
        Self {
            config,
            generators: None,
            network: None,
            demand: None,
            reports,
            views,
        }
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    /// Replaces a dataset, dropping every cached entry derived from it.
    pub fn load(&mut self, kind: DatasetKind, data: Value) {
        *self.slot_mut(kind) = Some(data);
        let dropped = self.reports.invalidate_kind(kind) + self.views.invalidate_kind(kind);
        info!(dataset = %kind, dropped, "dataset loaded");
    }

    pub fn dataset(&self, kind: DatasetKind) -> Option<&Value> {
        match kind {
            DatasetKind::Generators => self.generators.as_ref(),
            DatasetKind::Network => self.network.as_ref(),
            DatasetKind::Demand => self.demand.as_ref(),
        }
    }

    /// A loaded dataset, or `NotLoaded`.
    pub fn require(&self, kind: DatasetKind) -> Result<&Value, StoreError> {
        self.dataset(kind).ok_or(StoreError::NotLoaded(kind))
    }

    fn slot_mut(&mut self, kind: DatasetKind) -> &mut Option<Value> {
        match kind {
            DatasetKind::Generators => &mut self.generators,
            DatasetKind::Network => &mut self.network,
            DatasetKind::Demand => &mut self.demand,
        }
    }

    /// Schema rules of a scope.
    pub fn policy(&self, scope: &Scope) -> FieldPolicy {
        match scope {
            Scope::Generators { .. } => Hierarchy::new(&self.config.generators).policy(),
            Scope::Network { category } => {
                let key_field = &self.config.network.key_field;
                FieldPolicy::new()
                    .with_excluded([key_field.clone()])
                    .with_protected(self.config.network.category(category).protected)
                    .with_protected([key_field.clone()])
            }
            Scope::Demand => {
                let demand = &self.config.demand;
                FieldPolicy::new()
                    .with_excluded([demand.key_field.clone()])
                    .with_protected(demand.protected.iter().cloned())
                    .with_protected([demand.key_field.clone()])
            }
        }
    }

    /// Status field and activity rule of a scope.
    pub fn status_rule(&self, scope: &Scope) -> (Option<String>, ActivityRule) {
        match scope {
            Scope::Generators { .. } => {
                let g = &self.config.generators;
                (g.status_field.clone(), g.activity)
            }
            Scope::Network { category } => (
                self.config.network.category(category).status_field,
                self.config.network.activity,
            ),
            Scope::Demand => {
                let d = &self.config.demand;
                (d.status_field.clone(), d.activity)
            }
        }
    }

    fn flat_map<'c>(config: &'c EditorConfig, scope: &'c Scope) -> Option<FlatMap<'c>> {
        match scope {
            Scope::Generators { .. } => None,
            Scope::Network { category } => Some(FlatMap::new(
                &config.network.root_key,
                category,
                &config.network.key_field,
            )),
            Scope::Demand => Some(FlatMap::new(
                &config.demand.root_key,
                &config.demand.category,
                &config.demand.key_field,
            )),
        }
    }

    /// The stored records of a scope. A dataset that is not loaded reads as
    /// an empty collection.
    pub fn records(&self, scope: &Scope) -> Result<Vec<&Record>, StoreError> {
        let Some(root) = self.dataset(scope.kind()) else {
            return Ok(Vec::new());
        };
        match Self::flat_map(&self.config, scope) {
            Some(flat) => flat.records(root),
            None => {
                let Scope::Generators { level } = scope else {
                    return Ok(Vec::new());
                };
                Hierarchy::new(&self.config.generators).items_at_level(root, *level)
            }
        }
    }

    fn records_mut(&mut self, scope: &Scope) -> Result<Vec<&mut Record>, StoreError> {
        let root = match scope.kind() {
            DatasetKind::Generators => self.generators.as_mut(),
            DatasetKind::Network => self.network.as_mut(),
            DatasetKind::Demand => self.demand.as_mut(),
        };
        let Some(root) = root else {
            return Ok(Vec::new());
        };
        match (scope, Self::flat_map(&self.config, scope)) {
            (_, Some(flat)) => flat.records_mut(root),
            (Scope::Generators { level }, None) => {
                Hierarchy::new(&self.config.generators).items_at_level_mut(root, *level)
            }
            (_, None) => Ok(Vec::new()),
        }
    }

    /// Schema report of a scope, served from cache while fresh.
    pub fn report(&mut self, scope: &Scope) -> Result<SchemaReport, StoreError> {
        if let Some(report) = self.reports.get(scope, ViewConfig::ALL) {
            debug!(%scope, "schema report cache hit");
            return Ok(report.clone());
        }
        debug!(%scope, "schema report cache miss");
        let policy = self.policy(scope);
        let report = schema::profile(self.records(scope)?, &policy);
        self.reports
            .insert(scope.clone(), ViewConfig::ALL, report.clone());
        Ok(report)
    }

    /// Fields whose non-null values disagree on type.
    pub fn type_conflicts(&self, scope: &Scope) -> Result<Vec<TypeConflict>, StoreError> {
        let policy = self.policy(scope);
        Ok(schema::type_conflicts(self.records(scope)?, &policy))
    }

    /// Field names of a scope, protected first.
    pub fn ordered_fields(&mut self, scope: &Scope) -> Result<Vec<String>, StoreError> {
        let policy = self.policy(scope);
        let report = self.report(scope)?;
        Ok(report
            .ordered_fields(&policy)
            .into_iter()
            .map(str::to_string)
            .collect())
    }

    /// Materialized copies of a scope's records, optionally only the active
    /// ones. Flat-map items carry their id in the key field.
    pub fn items(&mut self, scope: &Scope, active_only: bool) -> Result<Vec<Record>, StoreError> {
        let view = if active_only {
            ViewConfig::ACTIVE
        } else {
            ViewConfig::ALL
        };
        if let Some(items) = self.views.get(scope, view) {
            debug!(%scope, active_only, "item view cache hit");
            return Ok(items.clone());
        }

        let Some(root) = self.dataset(scope.kind()) else {
            return Ok(Vec::new());
        };
        let items = match (scope, Self::flat_map(&self.config, scope)) {
            (_, Some(flat)) => {
                let (status_field, rule) = self.status_rule(scope);
                let status = if active_only {
                    status_field.as_deref().map(|field| (field, rule))
                } else {
                    None
                };
                flat.materialize(root, status)?
            }
            (Scope::Generators { level }, None) => {
                let hierarchy = Hierarchy::new(&self.config.generators);
                let records = if active_only {
                    hierarchy.active_items_at_level(root, *level)?
                } else {
                    hierarchy.items_at_level(root, *level)?
                };
                records.into_iter().cloned().collect()
            }
            (_, None) => Vec::new(),
        };
        self.views.insert(scope.clone(), view, items.clone());
        Ok(items)
    }

    /// Backfills every record of a scope with every field seen in it.
    pub fn normalize(&mut self, scope: &Scope) -> Result<usize, StoreError> {
        let policy = self.policy(scope);
        let patched = schema::normalize(self.records_mut(scope)?, &policy);
        self.invalidate(scope);
        info!(%scope, patched, "normalized collection");
        Ok(patched)
    }

    /// Adds a field to every record of a scope lacking it.
    ///
    /// # Errors
    ///
    /// `ProtectedField` when the name collides with a protected or excluded
    /// field; `Edit` for an invalid name. Nothing is modified on error.
    pub fn add_field(
        &mut self,
        scope: &Scope,
        name: &str,
        ty: ValueType,
        default_text: &str,
    ) -> Result<usize, StoreError> {
        let policy = self.policy(scope);
        if policy.is_protected(name) || policy.is_excluded(name) {
            return Err(StoreError::ProtectedField {
                field: name.to_string(),
                scope: scope.clone(),
            });
        }
        schema::FieldName::parse(name)?;
        let added = schema::add_field(self.records_mut(scope)?, name, ty, default_text)?;
        self.invalidate(scope);
        info!(%scope, field = name, %ty, added, "added field");
        Ok(added)
    }

    /// Removes a field from every record of a scope.
    ///
    /// # Errors
    ///
    /// `ProtectedField` for protected or excluded names.
    pub fn remove_field(&mut self, scope: &Scope, name: &str) -> Result<usize, StoreError> {
        let policy = self.policy(scope);
        if policy.is_protected(name) || policy.is_excluded(name) {
            return Err(StoreError::ProtectedField {
                field: name.to_string(),
                scope: scope.clone(),
            });
        }
        let removed = schema::remove_field(self.records_mut(scope)?, name);
        self.invalidate(scope);
        info!(%scope, field = name, removed, "removed field");
        Ok(removed)
    }

    /// Writes a materialized item back to its flat-map entry, inserting it
    /// when the id is new. Returns the id.
    pub fn upsert_item(&mut self, scope: &Scope, item: Record) -> Result<String, StoreError> {
        let kind = scope.kind();
        let Some(flat) = Self::flat_map(&self.config, scope) else {
            return Err(StoreError::UnsupportedForScope {
                operation: "upsert",
                scope: scope.clone(),
            });
        };
        let root = match kind {
            DatasetKind::Network => self.network.get_or_insert_with(empty_dataset),
            DatasetKind::Demand => self.demand.get_or_insert_with(empty_dataset),
            DatasetKind::Generators => self.generators.get_or_insert_with(empty_dataset),
        };
        let key = flat.write_back(root, item)?;
        self.invalidate(scope);
        info!(%scope, key = %key, "item saved");
        Ok(key)
    }

    /// Deletes one item: by map id for flat maps, by code for hierarchy
    /// levels. Returns whether it existed.
    pub fn remove_item(&mut self, scope: &Scope, id: &str) -> Result<bool, StoreError> {
        let root = match scope.kind() {
            DatasetKind::Generators => self.generators.as_mut(),
            DatasetKind::Network => self.network.as_mut(),
            DatasetKind::Demand => self.demand.as_mut(),
        };
        let Some(root) = root else {
            return Ok(false);
        };
        let removed = match (scope, Self::flat_map(&self.config, scope)) {
            (_, Some(flat)) => flat.remove(root, id)?,
            (Scope::Generators { level }, None) => {
                Hierarchy::new(&self.config.generators).remove_at_level(root, *level, id)?
            }
            (_, None) => false,
        };
        if removed {
            self.invalidate(scope);
            info!(%scope, id, "item removed");
        }
        Ok(removed)
    }

    /// A blank record shaped like the scope's collection: protected fields
    /// first, every profiled field with a type default, the status field set
    /// to in service, and an empty child array on non-leaf hierarchy levels.
    pub fn new_item_template(&mut self, scope: &Scope) -> Result<Record, StoreError> {
        let policy = self.policy(scope);
        let report = self.report(scope)?;
        let (status_field, rule) = self.status_rule(scope);

        let mut template = Record::new();
        for name in policy.protected() {
            if !policy.is_excluded(name) {
                template.insert(name.clone(), template_default(report.field_type(name)));
            }
        }
        for name in report.ordered_fields(&policy) {
            if !template.contains_key(name) {
                template.insert(name.to_string(), template_default(report.field_type(name)));
            }
        }
        if let Some(status_field) = status_field {
            let active = match rule {
                ActivityRule::NotFalse => Value::Bool(true),
                ActivityRule::Truthy | ActivityRule::Strict => Value::from(1),
            };
            template.insert(status_field, active);
        }
        if let Scope::Generators { level } = scope {
            let hierarchy = Hierarchy::new(&self.config.generators);
            if let Some(child_key) = hierarchy.child_key(*level) {
                template.insert(child_key.to_string(), Value::Array(Vec::new()));
            }
        }
        Ok(template)
    }

    /// Non-empty categories of the loaded network dataset.
    pub fn categories(&self) -> Vec<String> {
        self.network
            .as_ref()
            .map(|root| available_categories(root, &self.config.network))
            .unwrap_or_default()
    }

    /// Number of cached reports and views.
    pub fn cached_entries(&self) -> usize {
        self.reports.len() + self.views.len()
    }

    /// Hierarchy levels nest inside each other, so a change at any level
    /// drops every level's entries. Flat scopes are disjoint.
    fn invalidate(&mut self, scope: &Scope) {
        let dropped = match scope {
            Scope::Generators { .. } => {
                self.reports.invalidate_kind(DatasetKind::Generators)
                    + self.views.invalidate_kind(DatasetKind::Generators)
            }
            Scope::Network { .. } | Scope::Demand => {
                self.reports.invalidate(scope) + self.views.invalidate(scope)
            }
        };
        debug!(%scope, dropped, "cache invalidated");
    }
}

fn empty_dataset() -> Value {
    Value::Object(serde_json::Map::new())
}

fn template_default(ty: ValueType) -> Value {
    match ty {
        ValueType::Boolean => Value::Bool(false),
        ValueType::Number => Value::from(0),
        ValueType::Array => Value::Array(Vec::new()),
        ValueType::Null => Value::Null,
        ValueType::String | ValueType::Undefined => Value::String(String::new()),
    }
}
