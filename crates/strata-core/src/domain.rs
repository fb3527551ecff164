//! The authoritative node/edge model being edited.
//!
//! The domain graph is independent of how it is drawn. Edges are allowed to
//! reference node ids that are not (or no longer) present; filtering those out
//! before presentation is the synchronizer's job, not this module's.

use std::collections::BTreeSet;

use indexmap::IndexMap;
use log::trace;
use serde::{Deserialize, Serialize};

use crate::identifier::Id;

/// A node's placement in one hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Assignment {
    pub hierarchy_id: Id,
    pub level_id: Id,
    pub level_number: u32,
}

/// A node of the domain graph.
///
/// A node holds at most one [`Assignment`] per hierarchy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DomainNode {
    id: Id,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    label: Option<String>,
    #[serde(rename = "type")]
    node_type: String,
    #[serde(default)]
    assignments: Vec<Assignment>,
}

impl DomainNode {
    pub fn new(id: impl Into<Id>, node_type: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: None,
            node_type: node_type.into(),
            assignments: Vec::new(),
        }
    }

    /// Set the display label (builder style).
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Add an assignment (builder style), replacing any for the same hierarchy.
    pub fn with_assignment(mut self, assignment: Assignment) -> Self {
        self.set_assignment(assignment);
        self
    }

    pub fn id(&self) -> Id {
        self.id
    }

    /// Display label; defaults to the id when none was given.
    pub fn label(&self) -> String {
        self.label.clone().unwrap_or_else(|| self.id.to_string())
    }

    pub fn set_label(&mut self, label: Option<String>) {
        self.label = label;
    }

    pub fn node_type(&self) -> &str {
        &self.node_type
    }

    pub fn assignments(&self) -> &[Assignment] {
        &self.assignments
    }

    /// The node's assignment in `hierarchy_id`, if any.
    pub fn assignment_in(&self, hierarchy_id: Id) -> Option<&Assignment> {
        self.assignments
            .iter()
            .find(|assignment| assignment.hierarchy_id == hierarchy_id)
    }

    /// Record an assignment, replacing the existing entry for the same
    /// hierarchy in place or appending a new one.
    ///
    /// Returns the replaced assignment, if there was one.
    pub fn set_assignment(&mut self, assignment: Assignment) -> Option<Assignment> {
        match self
            .assignments
            .iter_mut()
            .find(|existing| existing.hierarchy_id == assignment.hierarchy_id)
        {
            Some(existing) => Some(std::mem::replace(existing, assignment)),
            None => {
                self.assignments.push(assignment);
                None
            }
        }
    }

    /// Remove the assignment for `hierarchy_id`.
    pub fn clear_assignment(&mut self, hierarchy_id: Id) -> Option<Assignment> {
        let idx = self
            .assignments
            .iter()
            .position(|assignment| assignment.hierarchy_id == hierarchy_id)?;
        Some(self.assignments.remove(idx))
    }
}

/// Default discriminator for edges without an explicit type.
pub const DEFAULT_EDGE_TYPE: &str = "structural";

fn default_edge_type() -> Id {
    Id::new(DEFAULT_EDGE_TYPE)
}

/// A directed edge of the domain graph.
///
/// `source` and `target` are not required to reference existing nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DomainEdge {
    pub source: Id,
    pub target: Id,
    #[serde(rename = "type", default = "default_edge_type")]
    pub edge_type: Id,
}

impl DomainEdge {
    pub fn new(source: impl Into<Id>, target: impl Into<Id>, edge_type: impl Into<Id>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            edge_type: edge_type.into(),
        }
    }

    /// An edge with the default structural type.
    pub fn structural(source: impl Into<Id>, target: impl Into<Id>) -> Self {
        Self::new(source, target, default_edge_type())
    }

    pub fn is_self_loop(&self) -> bool {
        self.source == self.target
    }

    pub fn touches(&self, id: Id) -> bool {
        self.source == id || self.target == id
    }
}

/// Serialized form of a domain graph: `{"nodes": [...], "edges": [...]}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GraphData {
    #[serde(default)]
    pub nodes: Vec<DomainNode>,
    #[serde(default)]
    pub edges: Vec<DomainEdge>,
}

/// The domain graph owned by an editing session.
///
/// Nodes keep their insertion order so that every derived element set is
/// reproducible.
#[derive(Debug, Clone, Default)]
pub struct DomainGraph {
    nodes: IndexMap<Id, DomainNode>,
    edges: Vec<DomainEdge>,
}

impl DomainGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a graph from serialized data. Later nodes with an id already seen are ignored.
    pub fn from_data(data: GraphData) -> Self {
        let mut graph = Self::new();
        for node in data.nodes {
            if graph.nodes.contains_key(&node.id()) {
                trace!(node_id:% = node.id(); "Ignoring duplicate node");
                continue;
            }
            graph.nodes.insert(node.id(), node);
        }
        graph.edges = data.edges;
        graph
    }

    pub fn to_data(&self) -> GraphData {
        GraphData {
            nodes: self.nodes.values().cloned().collect(),
            edges: self.edges.clone(),
        }
    }

    pub fn node(&self, id: Id) -> Option<&DomainNode> {
        self.nodes.get(&id)
    }

    pub fn node_mut(&mut self, id: Id) -> Option<&mut DomainNode> {
        self.nodes.get_mut(&id)
    }

    pub fn contains_node(&self, id: Id) -> bool {
        self.nodes.contains_key(&id)
    }

    pub fn nodes(&self) -> impl Iterator<Item = &DomainNode> {
        self.nodes.values()
    }

    pub fn nodes_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edges(&self) -> &[DomainEdge] {
        &self.edges
    }

    /// Insert or replace a node, keeping its original position when replacing.
    pub fn upsert_node(&mut self, node: DomainNode) -> Option<DomainNode> {
        self.nodes.insert(node.id(), node)
    }

    /// Remove a node. Edges referencing it are kept and become dangling.
    pub fn remove_node(&mut self, id: Id) -> Option<DomainNode> {
        self.nodes.shift_remove(&id)
    }

    /// Add an edge unless an identical (source, target, type) edge already exists.
    ///
    /// Returns whether the edge was added.
    pub fn add_edge(&mut self, edge: DomainEdge) -> bool {
        if self.edges.contains(&edge) {
            return false;
        }
        self.edges.push(edge);
        true
    }

    /// Remove every edge equal to `edge`. Returns whether anything was removed.
    pub fn remove_edge(&mut self, edge: &DomainEdge) -> bool {
        let before = self.edges.len();
        self.edges.retain(|existing| existing != edge);
        before != self.edges.len()
    }

    /// Ids adjacent to `id` in either direction, excluding `id` itself.
    pub fn neighbors(&self, id: Id) -> BTreeSet<Id> {
        self.edges
            .iter()
            .filter_map(|edge| {
                if edge.source == id && edge.target != id {
                    Some(edge.target)
                } else if edge.target == id && edge.source != id {
                    Some(edge.source)
                } else {
                    None
                }
            })
            .collect()
    }

    /// Record an assignment on a node, replacing the node's entry for the same hierarchy.
    ///
    /// Returns `None` if the node does not exist, otherwise the replaced assignment (if any).
    pub fn set_assignment(&mut self, node_id: Id, assignment: Assignment) -> Option<Option<Assignment>> {
        self.nodes
            .get_mut(&node_id)
            .map(|node| node.set_assignment(assignment))
    }
}
