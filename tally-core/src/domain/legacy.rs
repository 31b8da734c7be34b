//! Legacy version compatibility map

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

/// Version the pre-consolidation migrations were folded into
pub const CONSOLIDATED_VERSION: i64 = 20251129001;

/// Maps an old version identifier to the version it was consolidated into
///
/// A store that recorded the old version is treated as having applied the
/// new one. The map is configuration only and is never written to the store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LegacyVersionMap(BTreeMap<i64, i64>);

impl LegacyVersionMap {
    /// A map with no entries
    pub fn empty() -> Self {
        Self::default()
    }

    /// The map shipped with the packaged migrations: the sequential
    /// versions 1-3 became `2025-11-29-001`.
    pub fn builtin() -> Self {
        [(1, CONSOLIDATED_VERSION), (2, CONSOLIDATED_VERSION), (3, CONSOLIDATED_VERSION)]
            .into_iter()
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (i64, i64)> + '_ {
        self.0.iter().map(|(legacy, current)| (*legacy, *current))
    }

    /// Add every current version whose legacy counterpart is recorded
    pub fn resolve(&self, recorded: &BTreeSet<i64>) -> BTreeSet<i64> {
        let mut effective = recorded.clone();
        for (legacy, current) in self.iter() {
            if recorded.contains(&legacy) {
                effective.insert(current);
            }
        }
        effective
    }

    /// Recorded legacy versions that stand in for `current`
    pub fn legacy_sources(&self, current: i64, recorded: &BTreeSet<i64>) -> Vec<i64> {
        self.iter()
            .filter(|(legacy, target)| *target == current && recorded.contains(legacy))
            .map(|(legacy, _)| legacy)
            .collect()
    }
}

impl FromIterator<(i64, i64)> for LegacyVersionMap {
    fn from_iter<I: IntoIterator<Item = (i64, i64)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}
