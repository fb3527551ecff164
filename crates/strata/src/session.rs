//! Editing session.
//!
//! [`EditingSession`] owns the authoritative domain graph and everything
//! derived from it, and sequences each update cycle: the element set is
//! synchronized and applied to the render backend first, and only then is a
//! layout computed, always over the element set the backend now holds.
//!
//! Asynchronous work (levels fetches, assignment persistence) is split into a
//! start call that returns a ticket and a completion call that takes the
//! answer, so a shell can run the middle part on whatever executor it has.

use std::collections::HashSet;

use log::{debug, info, warn};
use serde::Serialize;

use strata_core::{
    domain::{Assignment, DomainEdge, DomainGraph, DomainNode},
    element::ElementSet,
    hierarchy::Level,
    identifier::Id,
};

use crate::{
    assign::{
        AssignmentBackend, AssignmentError, AssignmentService, PendingAssignment,
        PersistenceError, RejectReason,
    },
    config::LayoutConfig,
    dnd::DragPayload,
    hierarchy::{HierarchyProvider, HierarchyState, LevelsFetchError, LevelsRequest, ProviderError},
    layout::{
        LayoutEngine, LayoutError, LayoutOptions, LayoutOutcome, LayoutQueue, LayoutRequest,
        Positions, Submission,
    },
    menu::{MenuAction, MenuBuilder, MenuDescriptor, MenuTarget},
    render::RenderBackend,
    sync::{self, ElementDiff, SyncDiagnostics, SyncInput},
};

/// What one update cycle did.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RefreshReport {
    pub diff: ElementDiff,
    pub diagnostics: SyncDiagnostics,
    /// Present when the cycle ran a layout.
    pub layout: Option<LayoutOutcome>,
}

/// Result of dispatching a [`MenuAction`].
#[derive(Debug, Clone, PartialEq)]
pub enum ActionOutcome {
    /// The session carried the action out.
    Applied(RefreshReport),
    /// The action needs input or data only the shell has (a form, a fetch).
    NeedsShell(MenuAction),
    /// The action no longer applies, e.g. its node is busy or gone.
    Ignored,
}

pub struct EditingSession<B: RenderBackend> {
    graph: DomainGraph,
    hidden: HashSet<Id>,
    elements: ElementSet,
    diagnostics: SyncDiagnostics,
    hierarchy: HierarchyState,
    assignments: AssignmentService,
    layout: LayoutEngine,
    queue: LayoutQueue,
    algorithm: String,
    options: LayoutOptions,
    last_layout: Option<LayoutOutcome>,
    backend: B,
}

impl<B: RenderBackend> EditingSession<B> {
    pub fn new(backend: B, config: &LayoutConfig) -> Self {
        let layout = config.engine_builder().build();
        let mut algorithm = config.algorithm().to_string();
        if !layout.has_algorithm(&algorithm) {
            warn!(algorithm:%; "Configured layout algorithm is not registered, using `layered`");
            algorithm = "layered".to_string();
        }
        Self {
            graph: DomainGraph::new(),
            hidden: HashSet::new(),
            elements: ElementSet::new(),
            diagnostics: SyncDiagnostics::default(),
            hierarchy: HierarchyState::new(),
            assignments: AssignmentService::new(),
            layout,
            queue: LayoutQueue::new(),
            algorithm,
            options: config.options(),
            last_layout: None,
            backend,
        }
    }

    pub fn graph(&self) -> &DomainGraph {
        &self.graph
    }

    /// The element set the backend currently shows.
    pub fn elements(&self) -> &ElementSet {
        &self.elements
    }

    pub fn hidden(&self) -> &HashSet<Id> {
        &self.hidden
    }

    pub fn diagnostics(&self) -> &SyncDiagnostics {
        &self.diagnostics
    }

    pub fn hierarchy(&self) -> &HierarchyState {
        &self.hierarchy
    }

    pub fn layout_engine(&self) -> &LayoutEngine {
        &self.layout
    }

    pub fn layout_engine_mut(&mut self) -> &mut LayoutEngine {
        &mut self.layout
    }

    pub fn algorithm(&self) -> &str {
        &self.algorithm
    }

    pub fn options(&self) -> LayoutOptions {
        self.options
    }

    pub fn last_layout(&self) -> Option<&LayoutOutcome> {
        self.last_layout.as_ref()
    }

    /// Positions of the last layout run, empty before the first one.
    pub fn positions(&self) -> Positions {
        self.last_layout
            .as_ref()
            .map(|outcome| outcome.positions.clone())
            .unwrap_or_default()
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    pub fn is_busy(&self, node_id: Id) -> bool {
        self.assignments.is_busy(node_id)
    }

    // Graph loading and editing

    /// Replace the whole domain graph. Hidden nodes become visible again.
    pub fn load_graph(&mut self, graph: DomainGraph) -> RefreshReport {
        info!(nodes = graph.nodes_count(), edges = graph.edges().len(); "Loading graph");
        self.graph = graph;
        self.hidden.clear();

        let synchronized = self.synchronize(&ElementSet::new());
        self.backend.replace_elements(&synchronized.elements);
        self.elements = synchronized.elements;
        self.diagnostics = synchronized.diagnostics.clone();

        let layout = self.request_layout();
        RefreshReport {
            diff: synchronized.diff,
            diagnostics: synchronized.diagnostics,
            layout,
        }
    }

    /// Add a node or replace the node with the same id.
    pub fn upsert_node(&mut self, node: DomainNode) -> RefreshReport {
        self.graph.upsert_node(node);
        self.refresh()
    }

    /// Change the display label of a node; `None` falls back to the id.
    ///
    /// Returns `None` without changing anything if the node is unknown or
    /// its assignment is in flight.
    pub fn rename_node(&mut self, node_id: Id, label: Option<String>) -> Option<RefreshReport> {
        if self.is_busy(node_id) {
            return None;
        }
        self.graph.node_mut(node_id)?.set_label(label);
        debug!(node_id:%; "Node renamed");
        Some(self.refresh())
    }

    /// Delete a node and the edges touching it.
    pub fn delete_node(&mut self, node_id: Id) -> RefreshReport {
        self.delete_nodes(&[node_id])
    }

    pub fn delete_nodes(&mut self, node_ids: &[Id]) -> RefreshReport {
        for &node_id in node_ids {
            if self.graph.remove_node(node_id).is_some() {
                let touching: Vec<DomainEdge> = self
                    .graph
                    .edges()
                    .iter()
                    .filter(|edge| edge.touches(node_id))
                    .copied()
                    .collect();
                for edge in &touching {
                    self.graph.remove_edge(edge);
                }
                self.hidden.remove(&node_id);
                debug!(node_id:%, edges = touching.len(); "Deleted node");
            }
        }
        self.refresh()
    }

    pub fn add_edge(&mut self, edge: DomainEdge) -> RefreshReport {
        self.graph.add_edge(edge);
        self.refresh()
    }

    pub fn remove_edge(&mut self, edge: &DomainEdge) -> RefreshReport {
        self.graph.remove_edge(edge);
        self.refresh()
    }

    pub fn hide(&mut self, node_ids: &[Id]) -> RefreshReport {
        self.hidden.extend(node_ids.iter().copied());
        self.refresh()
    }

    pub fn show(&mut self, node_ids: &[Id]) -> RefreshReport {
        for node_id in node_ids {
            self.hidden.remove(node_id);
        }
        self.refresh()
    }

    /// Show the hidden neighbours of `node_id`.
    pub fn expand(&mut self, node_id: Id) -> RefreshReport {
        let neighbours: Vec<Id> = self
            .graph
            .neighbors(node_id)
            .into_iter()
            .filter(|id| self.hidden.contains(id))
            .collect();
        debug!(node_id:%, shown = neighbours.len(); "Expanding node");
        self.show(&neighbours)
    }

    /// Run one update cycle: synchronize, apply the diff, then lay out if the
    /// node set (or, for hierarchy-aware layouts, a level number) changed.
    pub fn refresh(&mut self) -> RefreshReport {
        let previous = std::mem::take(&mut self.elements);
        let synchronized = self.synchronize(&previous);

        if !synchronized.diff.is_empty() {
            self.backend.apply_diff(&synchronized.diff);
        }
        self.elements = synchronized.elements;
        self.diagnostics = synchronized.diagnostics.clone();

        let diff = synchronized.diff;
        let needs_layout = self.last_layout.is_none()
            || diff.changes_node_set()
            || (self.options.respect_hierarchy && !diff.updated.is_empty());
        let layout = if needs_layout {
            self.request_layout()
        } else {
            None
        };

        RefreshReport {
            diff,
            diagnostics: synchronized.diagnostics,
            layout,
        }
    }

    fn synchronize(&self, previous: &ElementSet) -> sync::Synchronized {
        sync::synchronize(
            previous,
            self.graph.nodes(),
            SyncInput {
                edges: self.graph.edges(),
                hidden: &self.hidden,
                active_hierarchy: self.hierarchy.active(),
            },
        )
    }

    // Layout

    /// Ask for a layout of the current element set with the active algorithm.
    ///
    /// Returns the outcome of the last run, or `None` when the request was
    /// folded into a run already in flight.
    pub fn request_layout(&mut self) -> Option<LayoutOutcome> {
        let request = LayoutRequest {
            algorithm: self.algorithm.clone(),
            options: self.options,
        };
        match self.queue.submit(request) {
            Submission::Coalesced => None,
            Submission::Start(mut request) => loop {
                let outcome = self.run_layout(&request);
                match self.queue.finish(&request.algorithm) {
                    Some(next) => request = next,
                    None => break Some(outcome),
                }
            },
        }
    }

    fn run_layout(&mut self, request: &LayoutRequest) -> LayoutOutcome {
        let outcome = self
            .layout
            .apply_layout(&self.elements, &request.algorithm, &request.options);
        self.backend.apply_positions(&outcome);
        self.last_layout = Some(outcome.clone());
        outcome
    }

    /// Switch the active algorithm and lay out with it.
    ///
    /// Cached results of the target algorithm are reused.
    ///
    /// # Errors
    ///
    /// Returns [`LayoutError::UnknownAlgorithm`] if nothing is registered
    /// under `algorithm`; the active algorithm is unchanged.
    pub fn set_algorithm(&mut self, algorithm: &str) -> Result<Option<LayoutOutcome>, LayoutError> {
        if !self.layout.has_algorithm(algorithm) {
            return Err(LayoutError::UnknownAlgorithm(algorithm.to_string()));
        }
        info!(from:% = self.algorithm, to = algorithm; "Switching layout algorithm");
        self.algorithm = algorithm.to_string();
        Ok(self.request_layout())
    }

    pub fn set_options(&mut self, options: LayoutOptions) {
        self.options = options;
    }

    /// Drop the active algorithm's cached result and lay out again.
    pub fn reset_layout(&mut self) -> Option<LayoutOutcome> {
        self.layout.clear_cache(Some(&self.algorithm));
        self.request_layout()
    }

    /// Drop cached results for one algorithm, or for all when `None`.
    pub fn clear_layout_cache(&mut self, algorithm: Option<&str>) {
        self.layout.clear_cache(algorithm);
    }

    // Hierarchy

    /// Make `hierarchy_id` active. Node level numbers switch to the new
    /// hierarchy right away; its levels arrive through
    /// [`complete_levels`](Self::complete_levels).
    pub fn switch_hierarchy(&mut self, hierarchy_id: Id) -> (LevelsRequest, RefreshReport) {
        let request = self.hierarchy.switch_to(hierarchy_id);
        (request, self.refresh())
    }

    pub fn deactivate_hierarchy(&mut self) -> RefreshReport {
        self.hierarchy.deactivate();
        self.refresh()
    }

    /// Apply the answer to a levels fetch.
    ///
    /// # Errors
    ///
    /// See [`HierarchyState::complete_fetch`]. A stale answer is reported as
    /// [`LevelsFetchError::Stale`] and otherwise ignored.
    pub fn complete_levels(
        &mut self,
        request: LevelsRequest,
        result: Result<Vec<Level>, ProviderError>,
    ) -> Result<(), LevelsFetchError> {
        self.hierarchy.complete_fetch(request, result).map(|_| ())
    }

    /// Switch to `hierarchy_id` and fetch its levels from `provider` in one step.
    ///
    /// # Errors
    ///
    /// Returns [`LevelsFetchError`] if the provider fails or returns invalid levels.
    pub fn load_hierarchy(
        &mut self,
        provider: &dyn HierarchyProvider,
        hierarchy_id: Id,
    ) -> Result<RefreshReport, LevelsFetchError> {
        let (request, report) = self.switch_hierarchy(hierarchy_id);
        let result = provider.get_levels(hierarchy_id);
        self.complete_levels(request, result)?;
        Ok(report)
    }

    // Interaction

    /// Build the context menu for `target` from the current state.
    pub fn context_menu(&self, target: &MenuTarget) -> MenuDescriptor {
        MenuBuilder::new(&self.graph, &self.hidden, self.assignments.busy_nodes())
            .build(target, self.hierarchy.context())
    }

    /// Carry out a picked menu action.
    pub fn apply_action(&mut self, action: &MenuAction) -> ActionOutcome {
        match action {
            MenuAction::Delete { node_id } => {
                if self.is_busy(*node_id) || !self.graph.contains_node(*node_id) {
                    return ActionOutcome::Ignored;
                }
                ActionOutcome::Applied(self.delete_node(*node_id))
            }
            MenuAction::DeleteMany { node_ids } => {
                let deletable: Vec<Id> = node_ids
                    .iter()
                    .copied()
                    .filter(|id| !self.is_busy(*id))
                    .collect();
                ActionOutcome::Applied(self.delete_nodes(&deletable))
            }
            MenuAction::Hide { node_id } => ActionOutcome::Applied(self.hide(&[*node_id])),
            MenuAction::HideMany { node_ids } => ActionOutcome::Applied(self.hide(node_ids)),
            MenuAction::Expand { node_id } => ActionOutcome::Applied(self.expand(*node_id)),
            MenuAction::AddNodeAt { .. }
            | MenuAction::LoadFullGraph
            | MenuAction::Edit { .. }
            | MenuAction::AddChild { .. } => ActionOutcome::NeedsShell(action.clone()),
        }
    }

    /// Create `child` one level below `parent`, linked by a structural edge,
    /// and start assigning it to `level_id`.
    ///
    /// # Errors
    ///
    /// Rejected before anything changes if the parent is unknown, the child
    /// id is already taken or still being assigned, the hierarchy is no
    /// longer active, or the level does not offer the child's type.
    pub fn add_child(
        &mut self,
        parent: Id,
        hierarchy_id: Id,
        level_id: Id,
        child: DomainNode,
    ) -> Result<(PendingAssignment, RefreshReport), AssignmentError> {
        if !self.graph.contains_node(parent) {
            return Err(RejectReason::UnknownNode { node_id: parent }.into());
        }
        let child_id = child.id();
        if child_id == parent || self.graph.contains_node(child_id) {
            return Err(RejectReason::DuplicateNode { node_id: child_id }.into());
        }
        if self.is_busy(child_id) {
            return Err(RejectReason::Busy { node_id: child_id }.into());
        }
        let context = self
            .hierarchy
            .context()
            .filter(|context| context.hierarchy_id == hierarchy_id)
            .ok_or(RejectReason::NoActiveHierarchy)?;
        let level = context
            .levels
            .by_id(level_id)
            .ok_or(RejectReason::UnknownLevel {
                hierarchy_id,
                level_id,
            })?;
        if !level.offers_types() || !level.accepts(child.node_type()) {
            return Err(RejectReason::TypeNotAllowed {
                node_type: child.node_type().to_string(),
                level_id,
            }
            .into());
        }

        self.graph.upsert_node(child);
        self.graph.add_edge(DomainEdge::structural(parent, child_id));
        let report = self.refresh();
        let pending = self.begin_assignment(child_id, level_id)?;
        Ok((pending, report))
    }

    /// Validate and start an assignment; the node is busy until completed.
    ///
    /// # Errors
    ///
    /// See [`AssignmentService::begin`].
    pub fn begin_assignment(
        &mut self,
        node_id: Id,
        level_id: Id,
    ) -> Result<PendingAssignment, AssignmentError> {
        self.assignments
            .begin(&self.graph, &self.hierarchy, node_id, level_id)
    }

    /// Apply the persistence answer and resynchronize on success.
    ///
    /// # Errors
    ///
    /// See [`AssignmentService::complete`].
    pub fn complete_assignment(
        &mut self,
        pending: PendingAssignment,
        result: Result<(), PersistenceError>,
    ) -> Result<(Assignment, RefreshReport), AssignmentError> {
        let assignment =
            self.assignments
                .complete(pending, result, &mut self.graph, &self.hierarchy)?;
        Ok((assignment, self.refresh()))
    }

    /// Release a node whose assignment will never complete.
    pub fn abandon_assignment(&mut self, pending: PendingAssignment) {
        self.assignments.abandon(pending);
    }

    /// Handle a drop of `raw_payload` onto the level `level_id`.
    ///
    /// Payloads that are not graph nodes are ignored and return `None`.
    pub fn drop_on_level(
        &mut self,
        raw_payload: &str,
        level_id: Id,
    ) -> Option<Result<PendingAssignment, AssignmentError>> {
        match DragPayload::parse(raw_payload) {
            DragPayload::GraphNode { node_id, .. } => {
                debug!(node_id:%, level_id:%; "Node dropped on level");
                Some(self.begin_assignment(node_id, level_id))
            }
            DragPayload::Unknown => {
                debug!("Ignoring drop of a non-node payload");
                None
            }
        }
    }

    /// Validate, persist through `backend` and apply an assignment in one step.
    ///
    /// # Errors
    ///
    /// See [`AssignmentService::begin`] and [`AssignmentService::complete`].
    pub fn assign(
        &mut self,
        backend: &mut dyn AssignmentBackend,
        node_id: Id,
        level_id: Id,
    ) -> Result<(Assignment, RefreshReport), AssignmentError> {
        let pending = self.begin_assignment(node_id, level_id)?;
        let result = backend.assign_node_to_level(node_id, level_id, pending.snapshot());
        self.complete_assignment(pending, result)
    }
}

#[cfg(test)]
mod tests {
    use strata_core::{
        domain::GraphData,
        element::{ElementId, OwnedElement, RenderEdge},
        hierarchy::Hierarchy,
    };

    use super::*;
    use crate::{
        hierarchy::StaticHierarchies,
        layout::PositionSource,
        render::{BackendCall, MemoryBackend},
    };

    fn session() -> EditingSession<MemoryBackend> {
        EditingSession::new(
            MemoryBackend::new(),
            &LayoutConfig::default().with_algorithm("grid"),
        )
    }

    fn graph() -> DomainGraph {
        DomainGraph::from_data(GraphData {
            nodes: vec![
                DomainNode::new("root", "concept"),
                DomainNode::new("leaf", "example"),
                DomainNode::new("other", "concept"),
            ],
            edges: vec![
                DomainEdge::structural("root", "leaf"),
                DomainEdge::structural("root", "other"),
            ],
        })
    }

    fn provider() -> StaticHierarchies {
        let mut provider = StaticHierarchies::new();
        provider.insert(
            Hierarchy::new("H1", "Primary"),
            vec![
                Level::new("L1", 1).with_allowed_types(["concept"]),
                Level::new("L2", 2).with_allowed_types(["example"]),
            ],
        );
        provider
    }

    #[test]
    fn test_load_replaces_and_lays_out() {
        let mut session = session();
        let report = session.load_graph(graph());

        assert_eq!(session.elements().nodes_count(), 3);
        assert_eq!(session.backend().elements(), session.elements());
        let layout = report.layout.expect("load should lay out");
        assert_eq!(layout.positions.len(), 3);
        assert_eq!(session.backend().positions().len(), 3);
        assert!(matches!(
            session.backend().calls(),
            [BackendCall::Replace { nodes: 3, edges: 2 }, BackendCall::Positions { .. }]
        ));
    }

    #[test]
    fn test_hide_applies_minimal_diff_then_layout() {
        let mut session = session();
        session.load_graph(graph());

        let report = session.hide(&[Id::new("leaf")]);

        assert_eq!(report.diagnostics.hidden_nodes, 1);
        assert_eq!(report.diagnostics.dropped_edges, 1);
        assert!(report.diagnostics.warning.is_none());
        assert_eq!(
            report.diff.removed,
            vec![
                ElementId::Edge((&DomainEdge::structural("root", "leaf")).into()),
                ElementId::Node(Id::new("leaf"))
            ]
        );
        assert!(report.diff.added.is_empty());
        assert_eq!(report.layout.unwrap().positions.len(), 2);
        assert_eq!(session.backend().violations(), 0);

        // Remove, then positions: the layout ran on the synchronized set.
        let calls = session.backend().calls();
        assert!(matches!(
            &calls[calls.len() - 2..],
            [BackendCall::Remove(2), BackendCall::Positions { .. }]
        ));
    }

    #[test]
    fn test_unchanged_refresh_is_a_no_op() {
        let mut session = session();
        session.load_graph(graph());
        let calls_before = session.backend().calls().len();

        let report = session.refresh();

        assert!(report.diff.is_empty());
        assert!(report.layout.is_none());
        assert_eq!(session.backend().calls().len(), calls_before);
    }

    #[test]
    fn test_dangling_edge_warns_but_renders() {
        let mut session = session();
        session.load_graph(graph());

        let report = session.add_edge(DomainEdge::structural("root", "missing"));

        assert!(report.diagnostics.warning.is_some());
        assert_eq!(report.diagnostics.dangling_edges, 1);
        assert_eq!(session.elements().edges_count(), 2);
        assert!(session.elements().is_consistent());
    }

    #[test]
    fn test_expand_shows_hidden_neighbours() {
        let mut session = session();
        session.load_graph(graph());
        session.hide(&[Id::new("leaf"), Id::new("other")]);

        let menu = session.context_menu(&MenuTarget::Node {
            node_id: Id::new("root"),
        });
        let expand = menu.item("expand").unwrap().action.clone();
        assert!(!menu.item("expand").unwrap().disabled);

        let outcome = session.apply_action(&expand);
        assert!(matches!(outcome, ActionOutcome::Applied(_)));
        assert!(session.hidden().is_empty());
        assert_eq!(session.elements().nodes_count(), 3);
    }

    #[test]
    fn test_switching_algorithms_reuses_cache() {
        let mut session = session();
        session.load_graph(graph());

        let force = session.set_algorithm("force").unwrap().unwrap();
        assert_eq!(force.source, PositionSource::Computed);
        let grid = session.set_algorithm("grid").unwrap().unwrap();
        assert_eq!(grid.source, PositionSource::Cached);

        let reset = session.reset_layout().unwrap();
        assert_eq!(reset.source, PositionSource::Computed);

        assert_eq!(
            session.set_algorithm("nope"),
            Err(LayoutError::UnknownAlgorithm("nope".to_string()))
        );
        assert_eq!(session.algorithm(), "grid");
    }

    #[test]
    fn test_drop_assigns_and_refreshes_level() {
        let mut session = session();
        session.load_graph(graph());
        session.load_hierarchy(&provider(), Id::new("H1")).unwrap();

        let pending = session
            .drop_on_level(r#"{"sourceType":"graph-node","nodeId":"root"}"#, Id::new("L1"))
            .expect("graph-node payload")
            .unwrap();
        assert!(session.is_busy(Id::new("root")));
        let menu = session.context_menu(&MenuTarget::Node {
            node_id: Id::new("root"),
        });
        assert!(menu.item("edit").unwrap().disabled);

        let (assignment, report) = session.complete_assignment(pending, Ok(())).unwrap();
        assert_eq!(assignment.level_number, 1);
        assert!(!session.is_busy(Id::new("root")));
        assert_eq!(report.diff.updated.len(), 1);
        assert_eq!(session.elements().node(Id::new("root")).unwrap().data.level, Some(1));

        // Level 2 offers "example": add child is offered now.
        let menu = session.context_menu(&MenuTarget::Node {
            node_id: Id::new("root"),
        });
        assert!(menu.contains("add-child"));
    }

    #[test]
    fn test_drop_of_foreign_payload_is_ignored() {
        let mut session = session();
        session.load_graph(graph());
        session.load_hierarchy(&provider(), Id::new("H1")).unwrap();

        assert!(session.drop_on_level("https://example.com", Id::new("L1")).is_none());
        assert_eq!(session.backend().violations(), 0);
    }

    #[test]
    fn test_add_child_links_and_assigns() {
        let mut session = session();
        session.load_graph(graph());
        session.load_hierarchy(&provider(), Id::new("H1")).unwrap();

        let rejected = session.add_child(
            Id::new("root"),
            Id::new("H1"),
            Id::new("L2"),
            DomainNode::new("wrong", "concept"),
        );
        assert!(matches!(
            rejected,
            Err(AssignmentError::Rejected(RejectReason::TypeNotAllowed { .. }))
        ));
        assert!(!session.graph().contains_node(Id::new("wrong")));

        let (pending, report) = session
            .add_child(
                Id::new("root"),
                Id::new("H1"),
                Id::new("L2"),
                DomainNode::new("child", "example"),
            )
            .unwrap();
        assert!(report.diff.added.contains(&OwnedElement::Edge(RenderEdge {
            data: (&DomainEdge::structural("root", "child")).into(),
        })));
        session.complete_assignment(pending, Ok(())).unwrap();
        assert_eq!(
            session.graph().node(Id::new("child")).unwrap().assignments()[0].level_number,
            2
        );
    }

    #[test]
    fn test_add_child_rejects_taken_ids_without_touching_the_graph() {
        let mut session = session();
        session.load_graph(graph());
        session.load_hierarchy(&provider(), Id::new("H1")).unwrap();

        for taken in ["root", "leaf"] {
            let err = session
                .add_child(
                    Id::new("root"),
                    Id::new("H1"),
                    Id::new("L2"),
                    DomainNode::new(taken, "example"),
                )
                .unwrap_err();
            assert_eq!(
                err,
                AssignmentError::Rejected(RejectReason::DuplicateNode {
                    node_id: Id::new(taken)
                })
            );
        }
        assert_eq!(session.graph().node(Id::new("root")).unwrap().node_type(), "concept");
        assert_eq!(session.graph().edges().len(), 2);
        assert_eq!(session.elements().nodes_count(), 3);

        let (_pending, _) = session
            .add_child(
                Id::new("root"),
                Id::new("H1"),
                Id::new("L2"),
                DomainNode::new("child", "example"),
            )
            .unwrap();
        // Reloading drops the node while its assignment is still in flight.
        session.load_graph(graph());
        let err = session
            .add_child(
                Id::new("other"),
                Id::new("H1"),
                Id::new("L2"),
                DomainNode::new("child", "example"),
            )
            .unwrap_err();

        assert_eq!(
            err,
            AssignmentError::Rejected(RejectReason::Busy {
                node_id: Id::new("child")
            })
        );
        assert!(!session.graph().contains_node(Id::new("child")));
        assert_eq!(session.graph().edges().len(), 2);
    }

    #[test]
    fn test_rename_updates_rendered_label() {
        let mut session = session();
        session.load_graph(graph());

        let report = session
            .rename_node(Id::new("leaf"), Some("Leaf node".to_string()))
            .expect("known node should be renamed");

        assert_eq!(report.diff.updated.len(), 1);
        assert_eq!(
            session.elements().node(Id::new("leaf")).unwrap().data.label,
            "Leaf node"
        );
        assert!(report.layout.is_none());

        session.rename_node(Id::new("leaf"), None).unwrap();
        assert_eq!(session.elements().node(Id::new("leaf")).unwrap().data.label, "leaf");
        assert!(session.rename_node(Id::new("ghost"), None).is_none());
    }

    #[test]
    fn test_delete_removes_touching_edges() {
        let mut session = session();
        session.load_graph(graph());

        let outcome = session.apply_action(&MenuAction::Delete {
            node_id: Id::new("root"),
        });

        let ActionOutcome::Applied(report) = outcome else {
            panic!("delete should apply");
        };
        assert!(report.diagnostics.warning.is_none());
        assert!(session.graph().edges().is_empty());
        assert_eq!(session.elements().nodes_count(), 2);
        assert_eq!(session.backend().violations(), 0);
    }

    #[test]
    fn test_stale_levels_are_not_applied() {
        let mut session = session();
        session.load_graph(graph());

        let (first, _) = session.switch_hierarchy(Id::new("H1"));
        let (second, _) = session.switch_hierarchy(Id::new("H2"));
        let stale = session.complete_levels(first, provider().get_levels(Id::new("H1")));

        assert!(matches!(stale, Err(LevelsFetchError::Stale(_))));
        assert!(session.hierarchy().levels().is_empty());
        assert_eq!(second.hierarchy_id(), Id::new("H2"));
    }
}
