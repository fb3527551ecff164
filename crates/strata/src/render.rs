//! Rendering engine boundary.
//!
//! The engine that paints elements is opaque; it is driven through the small
//! operation set of [`RenderBackend`]. [`MemoryBackend`] mirrors the element
//! set in memory, which is what the CLI and the tests use.

use log::{error, trace};

use strata_core::element::{ElementId, ElementSet, OwnedElement, RenderNode};

use crate::{
    layout::{LayoutOutcome, Positions},
    sync::ElementDiff,
};

/// Operations the core issues against a rendering engine.
pub trait RenderBackend {
    /// Drop everything and show `elements`.
    fn replace_elements(&mut self, elements: &ElementSet);

    /// Add elements. Nodes come before the edges that reference them.
    fn add_elements(&mut self, elements: &[OwnedElement]);

    /// Remove elements. Edges come before the nodes they reference.
    fn remove_elements(&mut self, ids: &[ElementId]);

    /// Patch the data of nodes that are already shown.
    fn update_elements(&mut self, nodes: &[RenderNode]);

    /// Move nodes to the positions of a finished layout run.
    fn apply_positions(&mut self, outcome: &LayoutOutcome);

    /// Apply a diff as remove, add, update, in that order.
    fn apply_diff(&mut self, diff: &ElementDiff) {
        if !diff.removed.is_empty() {
            self.remove_elements(&diff.removed);
        }
        if !diff.added.is_empty() {
            self.add_elements(&diff.added);
        }
        if !diff.updated.is_empty() {
            self.update_elements(&diff.updated);
        }
    }
}

/// One call received by a [`MemoryBackend`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendCall {
    Replace { nodes: usize, edges: usize },
    Add(usize),
    Remove(usize),
    Update(usize),
    Positions { algorithm: String, animate: bool },
}

/// In-memory rendering engine.
///
/// Keeps its own copy of the element set and counts every operation that
/// would have left an edge without both endpoints.
#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    elements: ElementSet,
    positions: Positions,
    calls: Vec<BackendCall>,
    violations: usize,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn elements(&self) -> &ElementSet {
        &self.elements
    }

    pub fn positions(&self) -> &Positions {
        &self.positions
    }

    pub fn calls(&self) -> &[BackendCall] {
        &self.calls
    }

    /// Number of operations that broke the edge-endpoint invariant.
    pub fn violations(&self) -> usize {
        self.violations
    }

    fn violation(&mut self, message: &str) {
        error!(message; "Render backend received an inconsistent operation");
        self.violations += 1;
    }
}

impl RenderBackend for MemoryBackend {
    fn replace_elements(&mut self, elements: &ElementSet) {
        trace!(nodes = elements.nodes_count(), edges = elements.edges_count(); "Replacing elements");
        self.calls.push(BackendCall::Replace {
            nodes: elements.nodes_count(),
            edges: elements.edges_count(),
        });
        self.elements = elements.clone();
        self.positions.retain(|id, _| elements.contains_node(*id));
    }

    fn add_elements(&mut self, elements: &[OwnedElement]) {
        self.calls.push(BackendCall::Add(elements.len()));
        for element in elements {
            match element {
                OwnedElement::Node(node) => {
                    self.elements.insert_node(node.clone());
                }
                OwnedElement::Edge(edge) => {
                    if let Err(err) = self.elements.insert_edge(*edge) {
                        self.violation(&err.to_string());
                    }
                }
            }
        }
    }

    fn remove_elements(&mut self, ids: &[ElementId]) {
        self.calls.push(BackendCall::Remove(ids.len()));
        for &id in ids {
            if let ElementId::Node(node_id) = id {
                let attached = self
                    .elements
                    .edges()
                    .any(|edge| edge.source() == node_id || edge.target() == node_id);
                if attached {
                    self.violation(&format!("node `{node_id}` removed while edges still reference it"));
                }
                self.positions.remove(&node_id);
            }
            self.elements.remove(id);
        }
    }

    fn update_elements(&mut self, nodes: &[RenderNode]) {
        self.calls.push(BackendCall::Update(nodes.len()));
        for node in nodes {
            if !self.elements.contains_node(node.id) {
                self.violation(&format!("update for unknown node `{}`", node.id));
                continue;
            }
            self.elements.insert_node(node.clone());
        }
    }

    fn apply_positions(&mut self, outcome: &LayoutOutcome) {
        self.calls.push(BackendCall::Positions {
            algorithm: outcome.algorithm.clone(),
            animate: outcome.animate,
        });
        for (id, point) in &outcome.positions {
            if self.elements.contains_node(*id) {
                self.positions.insert(*id, *point);
            }
        }
    }
}
