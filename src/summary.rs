//! Dataset-wide counts and totals for generators, network, and demand.

use std::fmt;

use serde::Serialize;
use serde_json::Value;

use crate::config::{DemandConfig, HierarchyConfig, NetworkConfig};
use crate::schema::Record;
use crate::store::{FlatMap, Hierarchy, StoreError, available_categories, is_active};

/// Item counts of one hierarchy level.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LevelCount {
    pub name: String,
    pub total: usize,
    /// Items whose whole ancestor chain is in service.
    pub active: usize,
}

/// Generator hierarchy overview.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeneratorSummary {
    pub levels: Vec<LevelCount>,
    /// Sum of the capacity field over every item of the capacity level (MW).
    pub installed_capacity: f64,
    /// Same sum restricted to active items.
    pub active_capacity: f64,
}

impl GeneratorSummary {
    /// Counts every level and sums installed capacity.
    ///
    /// A missing dataset yields zero counts.
    pub fn from_dataset(
        root: Option<&Value>,
        config: &HierarchyConfig,
    ) -> Result<Self, StoreError> {
        let hierarchy = Hierarchy::new(config);
        let empty = Value::Null;
        let root = root.unwrap_or(&empty);

        let mut levels = Vec::with_capacity(hierarchy.depth());
        for level in 0..hierarchy.depth() {
            levels.push(LevelCount {
                name: hierarchy
                    .level_name(level)
                    .map_or_else(|| format!("level {level}"), str::to_string),
                total: hierarchy.items_at_level(root, level)?.len(),
                active: hierarchy.active_items_at_level(root, level)?.len(),
            });
        }

        let field = config.capacity_field.as_str();
        let installed_capacity =
            sum_field(hierarchy.items_at_level(root, config.capacity_level)?, field);
        let active_capacity = sum_field(
            hierarchy.active_items_at_level(root, config.capacity_level)?,
            field,
        );

        Ok(Self {
            levels,
            installed_capacity,
            active_capacity,
        })
    }
}

impl fmt::Display for GeneratorSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- Generators ---")?;
        for level in &self.levels {
            writeln!(f, "{:<12} {:>6} total {:>6} active", level.name, level.total, level.active)?;
        }
        writeln!(f, "Installed capacity:  {:.2} MW", self.installed_capacity)?;
        write!(f, "Active capacity:     {:.2} MW", self.active_capacity)
    }
}

/// Item counts of one network category.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryCount {
    pub category: String,
    pub total: usize,
    pub active: usize,
}

/// Network model overview.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NetworkSummary {
    pub categories: Vec<CategoryCount>,
    /// Sum of `pmax` over active generators.
    pub active_generation: f64,
    /// Sum of `pd` over active loads.
    pub active_load: f64,
}

impl NetworkSummary {
    pub fn from_dataset(root: Option<&Value>, config: &NetworkConfig) -> Result<Self, StoreError> {
        let Some(root) = root else {
            return Ok(Self {
                categories: Vec::new(),
                active_generation: 0.0,
                active_load: 0.0,
            });
        };

        let mut categories = Vec::new();
        for name in available_categories(root, config) {
            let rules = config.category(&name);
            let records = FlatMap::new(&config.root_key, &name, &config.key_field).records(root)?;
            let active = records
                .iter()
                .filter(|r| is_active(r, rules.status_field.as_deref(), config.activity))
                .count();
            categories.push(CategoryCount {
                category: name,
                total: records.len(),
                active,
            });
        }

        Ok(Self {
            categories,
            active_generation: active_sum(root, config, "gen", "pmax")?,
            active_load: active_sum(root, config, "load", "pd")?,
        })
    }
}

fn active_sum(
    root: &Value,
    config: &NetworkConfig,
    category: &str,
    field: &str,
) -> Result<f64, StoreError> {
    let rules = config.category(category);
    let records = FlatMap::new(&config.root_key, category, &config.key_field).records(root)?;
    Ok(sum_field(
        records
            .into_iter()
            .filter(|r| is_active(r, rules.status_field.as_deref(), config.activity)),
        field,
    ))
}

impl fmt::Display for NetworkSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- Network ---")?;
        for c in &self.categories {
            writeln!(f, "{:<12} {:>6} total {:>6} active", c.category, c.total, c.active)?;
        }
        writeln!(f, "Active generation:   {:.2} MW", self.active_generation)?;
        write!(f, "Active load:         {:.2} MW", self.active_load)
    }
}

/// Demand dataset overview. Power figures cover active loads only.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DemandSummary {
    pub total: usize,
    pub active: usize,
    pub inactive: usize,
    pub total_pd: f64,
    pub total_qd: f64,
    pub max_pd: f64,
    /// Zero when no load is active.
    pub min_pd: f64,
    pub avg_pd: f64,
}

impl DemandSummary {
    pub fn from_dataset(root: Option<&Value>, config: &DemandConfig) -> Result<Self, StoreError> {
        let records = match root {
            Some(root) => {
                FlatMap::new(&config.root_key, &config.category, &config.key_field).records(root)?
            }
            None => Vec::new(),
        };
        let active: Vec<&Record> = records
            .iter()
            .copied()
            .filter(|r| is_active(r, config.status_field.as_deref(), config.activity))
            .collect();

        let pd: Vec<f64> = active
            .iter()
            .map(|r| number(r.get(&config.p_field)))
            .collect();
        let total_pd: f64 = pd.iter().sum();
        let (max_pd, min_pd, avg_pd) = if pd.is_empty() {
            (0.0, 0.0, 0.0)
        } else {
            (
                pd.iter().copied().fold(f64::NEG_INFINITY, f64::max),
                pd.iter().copied().fold(f64::INFINITY, f64::min),
                total_pd / pd.len() as f64,
            )
        };

        Ok(Self {
            total: records.len(),
            active: active.len(),
            inactive: records.len() - active.len(),
            total_pd,
            total_qd: sum_field(active.iter().copied(), &config.q_field),
            max_pd,
            min_pd,
            avg_pd,
        })
    }
}

impl fmt::Display for DemandSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- Demand ---")?;
        writeln!(
            f,
            "Loads:        {} total, {} active, {} inactive",
            self.total, self.active, self.inactive
        )?;
        writeln!(f, "Total P:      {:.2} MW", self.total_pd)?;
        writeln!(f, "Total Q:      {:.2} MVAr", self.total_qd)?;
        write!(
            f,
            "P per load:   max {:.2}, min {:.2}, avg {:.2} MW",
            self.max_pd, self.min_pd, self.avg_pd
        )
    }
}

/// Non-numeric and missing values count as zero.
fn number(value: Option<&Value>) -> f64 {
    value.and_then(Value::as_f64).unwrap_or(0.0)
}

fn sum_field<'a>(records: impl IntoIterator<Item = &'a Record>, field: &str) -> f64 {
    records.into_iter().map(|r| number(r.get(field))).sum()
}
