//! Render graph synchronization.
//!
//! Converts the domain graph into a validated, deduplicated [`ElementSet`] and
//! computes the minimal [`ElementDiff`] against the element set the rendering
//! engine currently holds.
//!
//! Edges whose endpoints are not both visible are dropped and counted. When the
//! number of dropped edges exceeds the number of hidden nodes, some drops are
//! not explained by the user hiding things, and a [`DataIntegrityWarning`] is
//! attached to the diagnostics.

use std::collections::HashSet;

use log::{debug, trace, warn};
use serde::Serialize;

use strata_core::{
    domain::{DomainEdge, DomainNode},
    element::{EdgeKey, ElementId, ElementSet, NodeData, OwnedElement, RenderEdge, RenderNode},
    identifier::Id,
};

/// Non-fatal signal that edges were dropped for reasons other than hiding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, thiserror::Error)]
#[error("{dropped_edges} edge(s) dropped but only {hidden_nodes} node(s) hidden")]
pub struct DataIntegrityWarning {
    pub dropped_edges: usize,
    pub hidden_nodes: usize,
}

/// Counters collected during one synchronization.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SyncDiagnostics {
    /// Edges left out because an endpoint is not visible.
    pub dropped_edges: usize,
    /// Dropped edges with an endpoint that is neither visible nor hidden,
    /// i.e. references to nodes that were never loaded.
    pub dangling_edges: usize,
    /// Domain nodes left out because their id is hidden.
    pub hidden_nodes: usize,
    /// Nodes ignored because their id was already seen.
    pub duplicate_nodes: usize,
    /// Edges ignored because their `(source, target, type)` was already seen.
    pub duplicate_edges: usize,
    pub warning: Option<DataIntegrityWarning>,
}

/// Changes to apply to the rendering engine, in application order.
///
/// Applying `removed` (edges before nodes), then `added` (nodes before edges),
/// then `updated` never leaves an edge without both endpoints in between.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ElementDiff {
    pub removed: Vec<ElementId>,
    pub added: Vec<OwnedElement>,
    /// Nodes that stayed but whose render data changed.
    pub updated: Vec<RenderNode>,
}

impl ElementDiff {
    pub fn is_empty(&self) -> bool {
        self.removed.is_empty() && self.added.is_empty() && self.updated.is_empty()
    }

    /// Whether the set of node ids changed, which invalidates cached layouts.
    pub fn changes_node_set(&self) -> bool {
        self.removed
            .iter()
            .any(|id| matches!(id, ElementId::Node(_)))
            || self
                .added
                .iter()
                .any(|element| matches!(element, OwnedElement::Node(_)))
    }
}

/// Result of [`synchronize`].
#[derive(Debug, Clone)]
pub struct Synchronized {
    pub elements: ElementSet,
    pub diff: ElementDiff,
    pub diagnostics: SyncDiagnostics,
}

/// Inputs describing what should be visible.
#[derive(Debug, Clone, Copy)]
pub struct SyncInput<'a> {
    pub edges: &'a [DomainEdge],
    pub hidden: &'a HashSet<Id>,
    /// Hierarchy whose level numbers are copied into node data.
    pub active_hierarchy: Option<Id>,
}

fn render_node(node: &DomainNode, active_hierarchy: Option<Id>) -> RenderNode {
    RenderNode {
        id: node.id(),
        data: NodeData {
            label: node.label(),
            node_type: node.node_type().to_string(),
            level: active_hierarchy
                .and_then(|hierarchy| node.assignment_in(hierarchy))
                .map(|assignment| assignment.level_number),
        },
    }
}

/// Build the element set for `nodes` and diff it against `previous`.
///
/// Node output order follows `nodes`; edge output order follows `input.edges`.
pub fn synchronize<'a, I>(previous: &ElementSet, nodes: I, input: SyncInput<'_>) -> Synchronized
where
    I: IntoIterator<Item = &'a DomainNode>,
{
    let mut elements = ElementSet::new();
    let mut diagnostics = SyncDiagnostics::default();
    let mut hidden_seen: HashSet<Id> = HashSet::new();

    for node in nodes {
        let id = node.id();
        if input.hidden.contains(&id) {
            if hidden_seen.insert(id) {
                diagnostics.hidden_nodes += 1;
            }
            continue;
        }
        if elements.contains_node(id) {
            diagnostics.duplicate_nodes += 1;
            continue;
        }
        elements.insert_node(render_node(node, input.active_hierarchy));
    }

    for edge in input.edges {
        let key = EdgeKey::from(edge);
        match elements.insert_edge(RenderEdge { data: key }) {
            Ok(true) => {}
            Ok(false) => diagnostics.duplicate_edges += 1,
            Err(_) => {
                diagnostics.dropped_edges += 1;
                let explained = |id: Id| elements.contains_node(id) || hidden_seen.contains(&id);
                if !explained(key.source) || !explained(key.target) {
                    diagnostics.dangling_edges += 1;
                }
                trace!(source:% = key.source, target:% = key.target; "Dropped edge");
            }
        }
    }

    if diagnostics.dropped_edges > diagnostics.hidden_nodes {
        let warning = DataIntegrityWarning {
            dropped_edges: diagnostics.dropped_edges,
            hidden_nodes: diagnostics.hidden_nodes,
        };
        warn!(
            dropped_edges = warning.dropped_edges,
            hidden_nodes = warning.hidden_nodes,
            dangling_edges = diagnostics.dangling_edges;
            "Dropped edges not explained by hidden nodes"
        );
        diagnostics.warning = Some(warning);
    }

    let diff = diff_elements(previous, &elements);
    debug!(
        nodes = elements.nodes_count(),
        edges = elements.edges_count(),
        removed = diff.removed.len(),
        added = diff.added.len(),
        updated = diff.updated.len();
        "Synchronized element set"
    );

    Synchronized {
        elements,
        diff,
        diagnostics,
    }
}

/// Compute the minimal diff that turns `previous` into `next`.
///
/// Nodes are matched by id and edges by `(source, target, type)`.
pub fn diff_elements(previous: &ElementSet, next: &ElementSet) -> ElementDiff {
    let mut diff = ElementDiff::default();

    diff.removed.extend(
        previous
            .edges()
            .filter(|edge| !next.contains_edge(&edge.key()))
            .map(|edge| ElementId::Edge(edge.key())),
    );
    diff.removed.extend(
        previous
            .nodes()
            .filter(|node| !next.contains_node(node.id))
            .map(|node| ElementId::Node(node.id)),
    );

    for node in next.nodes() {
        match previous.node(node.id) {
            None => diff.added.push(OwnedElement::Node(node.clone())),
            Some(old) if old.data != node.data => diff.updated.push(node.clone()),
            Some(_) => {}
        }
    }
    diff.added.extend(
        next.edges()
            .filter(|edge| !previous.contains_edge(&edge.key()))
            .map(|edge| OwnedElement::Edge(*edge)),
    );

    diff
}
