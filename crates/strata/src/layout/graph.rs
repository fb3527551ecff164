//! Graph view consumed by positioning strategies.

use std::collections::{BTreeMap, HashMap};

use petgraph::graphmap::DiGraphMap;

use strata_core::{element::ElementSet, identifier::Id};

use crate::layout::LayoutOptions;

/// Identity of the input a cached layout was computed for.
///
/// Maps every node id to its level number when hierarchy-aware placement was
/// requested, and to `None` otherwise.
pub type Fingerprint = BTreeMap<Id, Option<u32>>;

/// Directed graph of the nodes and edges to position, plus level numbers.
///
/// Parallel edges of different types collapse into one; self-loops are kept
/// in the graph but ignored by the built-in strategies.
#[derive(Debug, Clone, Default)]
pub struct LayoutGraph {
    graph: DiGraphMap<Id, ()>,
    levels: HashMap<Id, u32>,
}

impl LayoutGraph {
    /// Build from a validated element set. Node order follows the set.
    pub fn from_elements(elements: &ElementSet) -> Self {
        let mut graph = DiGraphMap::with_capacity(elements.nodes_count(), elements.edges_count());
        let mut levels = HashMap::new();
        for node in elements.nodes() {
            graph.add_node(node.id);
            if let Some(level) = node.data.level {
                levels.insert(node.id, level);
            }
        }
        for edge in elements.edges() {
            graph.add_edge(edge.source(), edge.target(), ());
        }
        Self { graph, levels }
    }

    /// Build from explicit nodes and edges. Edges with unknown endpoints are ignored.
    pub fn from_parts(
        nodes: impl IntoIterator<Item = (Id, Option<u32>)>,
        edges: impl IntoIterator<Item = (Id, Id)>,
    ) -> Self {
        let mut graph = DiGraphMap::new();
        let mut levels = HashMap::new();
        for (id, level) in nodes {
            graph.add_node(id);
            if let Some(level) = level {
                levels.insert(id, level);
            }
        }
        for (source, target) in edges {
            if graph.contains_node(source) && graph.contains_node(target) {
                graph.add_edge(source, target, ());
            }
        }
        Self { graph, levels }
    }

    /// Node ids in insertion order.
    pub fn nodes(&self) -> impl Iterator<Item = Id> + '_ {
        self.graph.nodes()
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Edges as `(source, target)`, excluding self-loops.
    pub fn edges(&self) -> impl Iterator<Item = (Id, Id)> + '_ {
        self.graph
            .all_edges()
            .filter(|(source, target, _)| source != target)
            .map(|(source, target, _)| (source, target))
    }

    pub fn level(&self, id: Id) -> Option<u32> {
        self.levels.get(&id).copied()
    }

    /// Whether any node carries a level number.
    pub fn has_levels(&self) -> bool {
        !self.levels.is_empty()
    }

    /// Whether a layout should rank nodes by level: the caller asked for it
    /// and at least one node carries a level number.
    pub fn ranks_by_level(&self, options: &LayoutOptions) -> bool {
        options.respect_hierarchy && self.has_levels()
    }

    pub fn fingerprint(&self, respect_hierarchy: bool) -> Fingerprint {
        self.graph
            .nodes()
            .map(|id| (id, respect_hierarchy.then(|| self.level(id)).flatten()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn graph() -> LayoutGraph {
        LayoutGraph::from_parts(
            [
                (Id::new("a"), Some(1)),
                (Id::new("b"), Some(2)),
                (Id::new("c"), None),
            ],
            [
                (Id::new("a"), Id::new("b")),
                (Id::new("b"), Id::new("b")),
                (Id::new("a"), Id::new("zz")),
            ],
        )
    }

    #[test]
    fn test_edges_skip_self_loops_and_unknown() {
        let graph = graph();
        let edges: Vec<(Id, Id)> = graph.edges().collect();
        assert_eq!(edges, vec![(Id::new("a"), Id::new("b"))]);
        assert_eq!(graph.node_count(), 3);
    }

    #[test]
    fn test_fingerprint_levels_only_when_respected() {
        let graph = graph();

        let plain = graph.fingerprint(false);
        assert!(plain.values().all(Option::is_none));

        let leveled = graph.fingerprint(true);
        assert_eq!(leveled[&Id::new("a")], Some(1));
        assert_eq!(leveled[&Id::new("c")], None);
        assert!(graph.has_levels());
    }
}
