//! Report and view cache keyed by `(Scope, ViewConfig)`.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use super::{DatasetKind, Scope};
use crate::config::CacheConfig;

/// View options that change what a cached entry contains.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct ViewConfig {
    /// Only in-service records.
    pub active_only: bool,
}

impl ViewConfig {
    /// Every record of the scope.
    pub const ALL: Self = Self { active_only: false };
    pub const ACTIVE: Self = Self { active_only: true };
}

/// Values derived from one scope, kept for a freshness window.
///
/// Entries for a scope must be dropped with [`ScopeCache::invalidate`]
/// whenever that scope's records change. Scopes are disjoint, so
/// invalidating one never touches another.
#[derive(Debug)]
pub struct ScopeCache<V> {
    ttl: Duration,
    entries: HashMap<(Scope, ViewConfig), (Instant, V)>,
}

impl<V> ScopeCache<V> {
    /// A cache whose entries stay fresh for `ttl`. A zero `ttl` stores nothing.
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: HashMap::new(),
        }
    }

    pub fn from_config(config: &CacheConfig) -> Self {
        if config.enabled {
            Self::new(Duration::from_secs(config.ttl_secs))
        } else {
            Self::new(Duration::ZERO)
        }
    }

    /// Fresh entry for `(scope, view)`, if any.
    pub fn get(&self, scope: &Scope, view: ViewConfig) -> Option<&V> {
        let (stored_at, value) = self.entries.get(&(scope.clone(), view))?;
        (stored_at.elapsed() < self.ttl).then_some(value)
    }

    pub fn insert(&mut self, scope: Scope, view: ViewConfig, value: V) {
        if self.ttl.is_zero() {
            return;
        }
        self.entries.insert((scope, view), (Instant::now(), value));
    }

    /// Drops every entry of `scope`. Returns how many were dropped.
    pub fn invalidate(&mut self, scope: &Scope) -> usize {
        let before = self.entries.len();
        self.entries.retain(|(s, _), _| s != scope);
        before - self.entries.len()
    }

    /// Drops every entry of every scope of one dataset.
    pub fn invalidate_kind(&mut self, kind: DatasetKind) -> usize {
        let before = self.entries.len();
        self.entries.retain(|(s, _), _| s.kind() != kind);
        before - self.entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn branch() -> Scope {
        Scope::Network {
            category: "branch".to_string(),
        }
    }

    #[test]
    fn fresh_entries_are_returned() {
        let mut cache = ScopeCache::new(Duration::from_secs(60));
        cache.insert(branch(), ViewConfig::ALL, 7);
        assert_eq!(cache.get(&branch(), ViewConfig::ALL), Some(&7));
        assert_eq!(cache.get(&branch(), ViewConfig::ACTIVE), None);
    }

    #[test]
    fn zero_ttl_stores_nothing() {
        let mut cache = ScopeCache::new(Duration::ZERO);
        cache.insert(branch(), ViewConfig::ALL, 7);
        assert!(cache.is_empty());
        assert_eq!(cache.get(&branch(), ViewConfig::ALL), None);
    }

    #[test]
    fn disabled_config_stores_nothing() {
        let config = CacheConfig {
            enabled: false,
            ttl_secs: 30,
        };
        let mut cache = ScopeCache::from_config(&config);
        cache.insert(Scope::Demand, ViewConfig::ALL, "x");
        assert!(cache.is_empty());
    }

    #[test]
    fn invalidate_drops_only_that_scope() {
        let mut cache = ScopeCache::new(Duration::from_secs(60));
        cache.insert(branch(), ViewConfig::ALL, 1);
        cache.insert(branch(), ViewConfig::ACTIVE, 2);
        cache.insert(Scope::Demand, ViewConfig::ALL, 3);
        cache.insert(Scope::Generators { level: 0 }, ViewConfig::ALL, 4);

        assert_eq!(cache.invalidate(&branch()), 2);
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get(&Scope::Demand, ViewConfig::ALL), Some(&3));
    }

    #[test]
    fn invalidate_kind_drops_all_scopes_of_a_dataset() {
        let mut cache = ScopeCache::new(Duration::from_secs(60));
        cache.insert(Scope::Generators { level: 0 }, ViewConfig::ALL, 1);
        cache.insert(Scope::Generators { level: 3 }, ViewConfig::ALL, 2);
        cache.insert(branch(), ViewConfig::ALL, 3);

        assert_eq!(cache.invalidate_kind(DatasetKind::Generators), 2);
        assert_eq!(cache.get(&branch(), ViewConfig::ALL), Some(&3));
    }
}
