//! TOML-based editor configuration: dataset layout, protected fields, and
//! cache settings.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::schema::FieldName;

/// Top-level editor configuration parsed from TOML.
///
/// All fields have defaults matching the standard dataset layout. Load from
/// TOML with [`EditorConfig::from_toml_file`] or use
/// [`EditorConfig::standard`] for the built-in default.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct EditorConfig {
    /// Report and view cache.
    #[serde(default)]
    pub cache: CacheConfig,
    /// Log filter defaults.
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Generator hierarchy layout.
    #[serde(default)]
    pub generators: HierarchyConfig,
    /// Network model layout.
    #[serde(default)]
    pub network: NetworkConfig,
    /// Demand dataset layout.
    #[serde(default)]
    pub demand: DemandConfig,
}

/// Cache freshness window.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct CacheConfig {
    pub enabled: bool,
    /// Seconds a cached report or view stays fresh. Zero disables caching.
    pub ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            ttl_secs: 30,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    /// `tracing_subscriber::EnvFilter` directive used when `RUST_LOG` is unset.
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
        }
    }
}

/// How a status field decides whether a record is in service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityRule {
    /// Active unless the status is exactly `false`.
    NotFalse,
    /// Active unless the status is `0`, `false`, or `"0"`.
    Truthy,
    /// Active only when the status is `1` or `true`.
    Strict,
}

/// Generator hierarchy layout.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct HierarchyConfig {
    /// Top-level key holding the first level's array.
    pub root_key: String,
    /// Child-array key of each level, from level 0 downward.
    pub child_keys: Vec<String>,
    /// Display name of each level (one more than `child_keys`).
    pub level_names: Vec<String>,
    /// Fields that can never be removed.
    pub protected: Vec<String>,
    /// Field used to navigate by identity.
    pub code_field: String,
    pub status_field: Option<String>,
    pub activity: ActivityRule,
    /// Field summed for installed capacity.
    pub capacity_field: String,
    /// Level whose items carry `capacity_field`.
    pub capacity_level: usize,
}

impl Default for HierarchyConfig {
    fn default() -> Self {
        Self {
            root_key: "Empresas_G1".to_string(),
            child_keys: strings(&["Complejos_G2", "Centrales_G3", "Grupos_G4", "Unidades_G5"]),
            level_names: strings(&["Empresas", "Complejos", "Centrales", "Grupos", "Unidades"]),
            protected: strings(&["Name", "Code", "Estado"]),
            code_field: "Code".to_string(),
            status_field: Some("Estado".to_string()),
            activity: ActivityRule::NotFalse,
            capacity_field: "Pmax".to_string(),
            capacity_level: 2,
        }
    }
}

impl HierarchyConfig {
    /// Number of levels in the hierarchy.
    pub fn depth(&self) -> usize {
        self.child_keys.len() + 1
    }
}

/// One network category's rules.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct CategoryConfig {
    pub name: String,
    #[serde(default)]
    pub status_field: Option<String>,
    #[serde(default)]
    pub protected: Vec<String>,
}

/// Network model layout.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct NetworkConfig {
    /// Top-level key holding the category maps.
    pub root_key: String,
    /// Field carrying the map key on materialized items.
    pub key_field: String,
    /// Keys under the root that are system properties, not categories.
    pub system_fields: Vec<String>,
    pub activity: ActivityRule,
    /// Rules for categories not listed in `categories`.
    pub default_protected: Vec<String>,
    pub default_status_field: Option<String>,
    /// Known categories in display order.
    pub categories: Vec<CategoryConfig>,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            root_key: "base".to_string(),
            key_field: "_key".to_string(),
            system_fields: strings(&["name", "baseMVA", "version", "f", "source_type", "per_unit"]),
            activity: ActivityRule::Truthy,
            default_protected: strings(&["name", "index"]),
            default_status_field: Some("status".to_string()),
            categories: vec![
                category("bus", None, &["name", "index", "bus_i"]),
                category("gen", Some("gen_status"), &["name", "index", "gen_bus"]),
                category("branch", Some("br_status"), &["name", "index", "f_bus", "t_bus"]),
                category("load", Some("status"), &["name", "index", "load_bus"]),
                category("shunt", Some("status"), &["name", "index", "shunt_bus"]),
                category("storage", Some("status"), &["name", "index", "storage_bus"]),
                category("branch3", Some("br_status"), &["name", "index"]),
                category("dcline", Some("status"), &["name", "index", "f_bus", "t_bus"]),
                category("switch", Some("status"), &["name", "index", "f_bus", "t_bus"]),
            ],
        }
    }
}

impl NetworkConfig {
    /// Rules for `name`, falling back to the defaults for unknown categories.
    pub fn category(&self, name: &str) -> CategoryConfig {
        self.categories
            .iter()
            .find(|c| c.name == name)
            .cloned()
            .unwrap_or_else(|| CategoryConfig {
                name: name.to_string(),
                status_field: self.default_status_field.clone(),
                protected: self.default_protected.clone(),
            })
    }
}

/// Demand dataset layout.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct DemandConfig {
    pub root_key: String,
    /// Category under the root holding the load map.
    pub category: String,
    pub key_field: String,
    pub protected: Vec<String>,
    pub status_field: Option<String>,
    pub activity: ActivityRule,
    /// Active power field.
    pub p_field: String,
    /// Reactive power field.
    pub q_field: String,
}

impl Default for DemandConfig {
    fn default() -> Self {
        Self {
            root_key: "base".to_string(),
            category: "load".to_string(),
            key_field: "_key".to_string(),
            protected: strings(&["name", "index", "load_bus"]),
            status_field: Some("status".to_string()),
            activity: ActivityRule::Strict,
            p_field: "pd".to_string(),
            q_field: "qd".to_string(),
        }
    }
}

fn strings(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| (*s).to_string()).collect()
}

fn category(name: &str, status_field: Option<&str>, protected: &[&str]) -> CategoryConfig {
    CategoryConfig {
        name: name.to_string(),
        status_field: status_field.map(str::to_string),
        protected: strings(protected),
    }
}

/// Configuration error with field path and constraint description.
#[derive(Debug, Error)]
#[error("config error: {field}: {message}")]
pub struct ConfigError {
    /// Dotted field path (e.g., `"generators.child_keys"`).
    pub field: String,
    /// Human-readable constraint description.
    pub message: String,
}

impl ConfigError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl EditorConfig {
    /// Returns the standard configuration.
    pub fn standard() -> Self {
        Self::default()
    }

    /// Parses a configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the file cannot be read or the TOML is invalid.
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| {
            ConfigError::new("config", format!("cannot read \"{}\": {e}", path.display()))
        })?;
        Self::from_toml_str(&content)
    }

    /// Parses a configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the TOML is invalid or contains unknown fields.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(|e| ConfigError::new("toml", e.to_string()))
    }

    /// Validates all fields and returns a list of errors.
    ///
    /// Returns an empty vector if configuration is valid.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();

        if self.logging.filter.trim().is_empty() {
            errors.push(ConfigError::new("logging.filter", "must not be empty"));
        }

        let g = &self.generators;
        if g.root_key.is_empty() {
            errors.push(ConfigError::new("generators.root_key", "must not be empty"));
        }
        if g.child_keys.is_empty() {
            errors.push(ConfigError::new("generators.child_keys", "must name at least one level"));
        }
        if g.level_names.len() != g.depth() {
            errors.push(ConfigError::new(
                "generators.level_names",
                format!(
                    "expected {} names (one per level), got {}",
                    g.depth(),
                    g.level_names.len()
                ),
            ));
        }
        if g.capacity_level >= g.depth() {
            errors.push(ConfigError::new(
                "generators.capacity_level",
                format!("must be < {}", g.depth()),
            ));
        }
        check_names(&mut errors, "generators.protected", &g.protected);

        let n = &self.network;
        if n.root_key.is_empty() {
            errors.push(ConfigError::new("network.root_key", "must not be empty"));
        }
        if n.key_field.is_empty() {
            errors.push(ConfigError::new("network.key_field", "must not be empty"));
        }
        check_names(&mut errors, "network.default_protected", &n.default_protected);
        let mut seen = HashSet::new();
        for (i, c) in n.categories.iter().enumerate() {
            if !seen.insert(c.name.as_str()) {
                errors.push(ConfigError::new(
                    format!("network.categories[{i}].name"),
                    format!("duplicate category \"{}\"", c.name),
                ));
            }
            check_names(
                &mut errors,
                &format!("network.categories[{i}].protected"),
                &c.protected,
            );
        }

        let d = &self.demand;
        if d.category.is_empty() {
            errors.push(ConfigError::new("demand.category", "must not be empty"));
        }
        if d.key_field.is_empty() {
            errors.push(ConfigError::new("demand.key_field", "must not be empty"));
        }
        check_names(&mut errors, "demand.protected", &d.protected);

        errors
    }
}

fn check_names(errors: &mut Vec<ConfigError>, field: &str, names: &[String]) {
    for name in names {
        if let Err(e) = FieldName::parse(name) {
            errors.push(ConfigError::new(field, e.to_string()));
        }
    }
}
