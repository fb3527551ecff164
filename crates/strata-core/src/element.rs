//! The validated element set handed to a rendering engine.
//!
//! [`ElementSet`] enforces the central presentation invariant: an edge is only
//! ever present when both of its endpoints are present as nodes of the same
//! set. Inserting an edge with a missing endpoint fails, and removing a node
//! removes every edge touching it.

use indexmap::IndexMap;
use serde::Serialize;

use crate::{domain::DomainEdge, identifier::Id};

/// Data carried by a rendered node.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeData {
    pub label: String,
    #[serde(rename = "type")]
    pub node_type: String,
    /// Level number in the active hierarchy, if the node is assigned there.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level: Option<u32>,
}

/// A node as seen by the rendering engine.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderNode {
    pub id: Id,
    pub data: NodeData,
}

/// Identity of a rendered edge: the `(source, target, type)` triple.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct EdgeKey {
    pub source: Id,
    pub target: Id,
    #[serde(rename = "type")]
    pub edge_type: Id,
}

impl From<&DomainEdge> for EdgeKey {
    fn from(edge: &DomainEdge) -> Self {
        Self {
            source: edge.source,
            target: edge.target,
            edge_type: edge.edge_type,
        }
    }
}

/// An edge as seen by the rendering engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RenderEdge {
    pub data: EdgeKey,
}

impl RenderEdge {
    pub fn key(&self) -> EdgeKey {
        self.data
    }

    pub fn source(&self) -> Id {
        self.data.source
    }

    pub fn target(&self) -> Id {
        self.data.target
    }
}

/// Either kind of render element, borrowed from an [`ElementSet`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "group", rename_all = "lowercase")]
pub enum RenderElement<'a> {
    Node(&'a RenderNode),
    Edge(&'a RenderEdge),
}

/// Owned counterpart of [`RenderElement`], used in diffs.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "group", rename_all = "lowercase")]
pub enum OwnedElement {
    Node(RenderNode),
    Edge(RenderEdge),
}

/// Identity of an element, used for removal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "group", content = "id", rename_all = "lowercase")]
pub enum ElementId {
    Node(Id),
    Edge(EdgeKey),
}

/// Raised when an edge would be inserted without both endpoints present.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("edge {}->{} ({}) references a node missing from the element set", .0.source, .0.target, .0.edge_type)]
pub struct DanglingEdge(pub EdgeKey);

/// An ordered, deduplicated set of render elements.
///
/// Iteration yields nodes first (in insertion order), then edges (in insertion order).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ElementSet {
    nodes: IndexMap<Id, RenderNode>,
    edges: IndexMap<EdgeKey, RenderEdge>,
}

impl ElementSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn nodes(&self) -> impl Iterator<Item = &RenderNode> {
        self.nodes.values()
    }

    pub fn edges(&self) -> impl Iterator<Item = &RenderEdge> {
        self.edges.values()
    }

    /// All elements, nodes first then edges.
    pub fn elements(&self) -> impl Iterator<Item = RenderElement<'_>> {
        self.nodes
            .values()
            .map(RenderElement::Node)
            .chain(self.edges.values().map(RenderElement::Edge))
    }

    pub fn node(&self, id: Id) -> Option<&RenderNode> {
        self.nodes.get(&id)
    }

    pub fn contains_node(&self, id: Id) -> bool {
        self.nodes.contains_key(&id)
    }

    pub fn contains_edge(&self, key: &EdgeKey) -> bool {
        self.edges.contains_key(key)
    }

    pub fn node_ids(&self) -> impl Iterator<Item = Id> + '_ {
        self.nodes.keys().copied()
    }

    pub fn nodes_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edges_count(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Insert a node, or replace the data of an existing node with the same id.
    ///
    /// Returns the previous node, if any.
    pub fn insert_node(&mut self, node: RenderNode) -> Option<RenderNode> {
        self.nodes.insert(node.id, node)
    }

    /// Insert an edge whose endpoints are both present.
    ///
    /// Returns `Ok(false)` if an edge with the same key was already present.
    ///
    /// # Errors
    ///
    /// Returns [`DanglingEdge`] if either endpoint is missing.
    pub fn insert_edge(&mut self, edge: RenderEdge) -> Result<bool, DanglingEdge> {
        if !self.contains_node(edge.source()) || !self.contains_node(edge.target()) {
            return Err(DanglingEdge(edge.key()));
        }
        if self.edges.contains_key(&edge.key()) {
            return Ok(false);
        }
        self.edges.insert(edge.key(), edge);
        Ok(true)
    }

    /// Remove a node and every edge touching it. Returns the removed edges.
    pub fn remove_node(&mut self, id: Id) -> Vec<RenderEdge> {
        if self.nodes.shift_remove(&id).is_none() {
            return Vec::new();
        }
        let touching: Vec<EdgeKey> = self
            .edges
            .keys()
            .filter(|key| key.source == id || key.target == id)
            .copied()
            .collect();
        touching
            .into_iter()
            .filter_map(|key| self.edges.shift_remove(&key))
            .collect()
    }

    pub fn remove_edge(&mut self, key: &EdgeKey) -> Option<RenderEdge> {
        self.edges.shift_remove(key)
    }

    /// Remove an element by identity.
    pub fn remove(&mut self, id: ElementId) {
        match id {
            ElementId::Node(node_id) => {
                self.remove_node(node_id);
            }
            ElementId::Edge(key) => {
                self.remove_edge(&key);
            }
        }
    }

    /// Check the edge-validity invariant. Always true for sets built through this API.
    pub fn is_consistent(&self) -> bool {
        self.edges
            .keys()
            .all(|key| self.contains_node(key.source) && self.contains_node(key.target))
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    fn node(id: &str) -> RenderNode {
        RenderNode {
            id: Id::new(id),
            data: NodeData {
                label: id.to_string(),
                node_type: "concept".to_string(),
                level: None,
            },
        }
    }

    fn edge(source: &str, target: &str) -> RenderEdge {
        RenderEdge {
            data: EdgeKey::from(&DomainEdge::structural(source, target)),
        }
    }

    #[test]
    fn test_insert_edge_requires_endpoints() {
        let mut set = ElementSet::new();
        set.insert_node(node("n1"));

        let err = set.insert_edge(edge("n1", "n2")).unwrap_err();
        assert_eq!(err.0.target, "n2");
        assert_eq!(set.edges_count(), 0);

        set.insert_node(node("n2"));
        assert_eq!(set.insert_edge(edge("n1", "n2")), Ok(true));
        assert_eq!(set.insert_edge(edge("n1", "n2")), Ok(false));
        assert_eq!(set.edges_count(), 1);
    }

    #[test]
    fn test_remove_node_cascades_edges() {
        let mut set = ElementSet::new();
        for id in ["a", "b", "c"] {
            set.insert_node(node(id));
        }
        set.insert_edge(edge("a", "b")).unwrap();
        set.insert_edge(edge("b", "c")).unwrap();
        set.insert_edge(edge("a", "c")).unwrap();

        let removed = set.remove_node(Id::new("b"));

        assert_eq!(removed.len(), 2);
        assert_eq!(set.edges_count(), 1);
        assert!(set.is_consistent());
    }

    #[test]
    fn test_elements_nodes_first() {
        let mut set = ElementSet::new();
        set.insert_node(node("a"));
        set.insert_node(node("b"));
        set.insert_edge(edge("a", "b")).unwrap();
        set.insert_node(node("c"));

        let kinds: Vec<bool> = set
            .elements()
            .map(|element| matches!(element, RenderElement::Node(_)))
            .collect();
        assert_eq!(kinds, vec![true, true, true, false]);
    }

    #[test]
    fn test_dangling_edge_message() {
        let err = DanglingEdge(edge("x", "y").key());
        assert_eq!(
            err.to_string(),
            "edge x->y (structural) references a node missing from the element set"
        );
    }

    #[derive(Debug, Clone)]
    enum Op {
        InsertNode(u8),
        InsertEdge(u8, u8),
        RemoveNode(u8),
        RemoveEdge(u8, u8),
    }

    fn op_strategy() -> impl Strategy<Value = Op> {
        prop_oneof![
            (0u8..6).prop_map(Op::InsertNode),
            (0u8..6, 0u8..6).prop_map(|(s, t)| Op::InsertEdge(s, t)),
            (0u8..6).prop_map(Op::RemoveNode),
            (0u8..6, 0u8..6).prop_map(|(s, t)| Op::RemoveEdge(s, t)),
        ]
    }

    fn name(i: u8) -> String {
        format!("e{i}")
    }

    proptest! {
        #[test]
        fn prop_edges_never_outlive_their_endpoints(ops in prop::collection::vec(op_strategy(), 0..60)) {
            let mut set = ElementSet::new();
            for op in ops {
                match op {
                    Op::InsertNode(i) => {
                        set.insert_node(node(&name(i)));
                    }
                    Op::InsertEdge(s, t) => {
                        let endpoints_present = set.contains_node(Id::new(&name(s)))
                            && set.contains_node(Id::new(&name(t)));
                        let before = set.edges_count();
                        let result = set.insert_edge(edge(&name(s), &name(t)));
                        prop_assert_eq!(result.is_ok(), endpoints_present);
                        if result.is_err() {
                            prop_assert_eq!(set.edges_count(), before);
                        }
                    }
                    Op::RemoveNode(i) => {
                        let id = Id::new(&name(i));
                        for removed in set.remove_node(id) {
                            prop_assert!(removed.source() == id || removed.target() == id);
                        }
                        prop_assert!(!set.contains_node(id));
                    }
                    Op::RemoveEdge(s, t) => {
                        let key = edge(&name(s), &name(t)).key();
                        set.remove_edge(&key);
                        prop_assert!(!set.contains_edge(&key));
                    }
                }
                prop_assert!(set.is_consistent());
                prop_assert_eq!(set.elements().count(), set.nodes_count() + set.edges_count());
            }
        }
    }
}
