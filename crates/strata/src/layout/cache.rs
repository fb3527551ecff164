//! Per-algorithm position cache.

use std::collections::HashMap;

use log::trace;

use super::{Positions, graph::Fingerprint};

#[derive(Debug, Clone)]
struct Entry {
    fingerprint: Fingerprint,
    positions: Positions,
}

/// Cached positions keyed by algorithm name.
///
/// Each algorithm keeps at most one entry; an entry is only returned for the
/// exact node set (and level numbers, for hierarchy-aware runs) it was
/// computed for.
#[derive(Debug, Clone, Default)]
pub struct LayoutCache {
    entries: HashMap<String, Entry>,
}

impl LayoutCache {
    pub fn get(&self, algorithm: &str, fingerprint: &Fingerprint) -> Option<&Positions> {
        self.entries
            .get(algorithm)
            .filter(|entry| &entry.fingerprint == fingerprint)
            .map(|entry| &entry.positions)
    }

    pub fn insert(&mut self, algorithm: &str, fingerprint: Fingerprint, positions: Positions) {
        trace!(algorithm, nodes = positions.len(); "Caching layout");
        self.entries.insert(
            algorithm.to_string(),
            Entry {
                fingerprint,
                positions,
            },
        );
    }

    /// Drop one algorithm's entry, or every entry when `None`.
    pub fn clear(&mut self, algorithm: Option<&str>) {
        match algorithm {
            Some(name) => {
                self.entries.remove(name);
            }
            None => self.entries.clear(),
        }
    }

    pub fn contains(&self, algorithm: &str) -> bool {
        self.entries.contains_key(algorithm)
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
    use strata_core::{geometry::Point, identifier::Id};

    use super::*;

    fn fingerprint(ids: &[&str]) -> Fingerprint {
        ids.iter().map(|id| (Id::new(id), None)).collect()
    }

    #[test]
    fn test_get_requires_matching_fingerprint() {
        let mut cache = LayoutCache::default();
        let positions: Positions = [(Id::new("a"), Point::new(1.0, 2.0))].into_iter().collect();
        cache.insert("grid", fingerprint(&["a"]), positions.clone());

        assert_eq!(cache.get("grid", &fingerprint(&["a"])), Some(&positions));
        assert!(cache.get("grid", &fingerprint(&["a", "b"])).is_none());
        assert!(cache.get("force", &fingerprint(&["a"])).is_none());
    }

    #[test]
    fn test_clear_one_or_all() {
        let mut cache = LayoutCache::default();
        cache.insert("grid", fingerprint(&["a"]), Positions::new());
        cache.insert("force", fingerprint(&["a"]), Positions::new());

        cache.clear(Some("grid"));
        assert!(!cache.contains("grid"));
        assert!(cache.contains("force"));

        cache.clear(None);
        assert!(cache.is_empty());
    }
}
