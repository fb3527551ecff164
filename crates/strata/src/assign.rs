//! Hierarchy assignment.
//!
//! Assigning a node to a level is a two-step operation around a persistence
//! call the shell performs asynchronously: [`AssignmentService::begin`]
//! validates the request and marks the node busy, and
//! [`AssignmentService::complete`] applies (or discards) the answer. A node
//! with an assignment in flight rejects further attempts until the first one
//! completes.

use std::collections::HashSet;

use log::{debug, info, warn};
use serde::Serialize;

use strata_core::{
    domain::{Assignment, DomainGraph, DomainNode},
    identifier::Id,
};

use crate::hierarchy::{HierarchyState, StaleContextDiscarded};

/// Why an assignment was refused before reaching persistence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum RejectReason {
    #[error("node `{node_id}` does not exist")]
    UnknownNode { node_id: Id },

    #[error("no hierarchy is active")]
    NoActiveHierarchy,

    #[error("level `{level_id}` is not part of hierarchy `{hierarchy_id}`")]
    UnknownLevel { hierarchy_id: Id, level_id: Id },

    #[error("type `{node_type}` is not allowed at level `{level_id}`")]
    TypeNotAllowed { node_type: String, level_id: Id },

    #[error("an assignment for node `{node_id}` is already in progress")]
    Busy { node_id: Id },

    #[error("node `{node_id}` already exists")]
    DuplicateNode { node_id: Id },
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AssignmentError {
    #[error("assignment rejected: {0}")]
    Rejected(#[from] RejectReason),

    #[error("assignment failed: {message}")]
    Transport { message: String },

    #[error(transparent)]
    StaleContextDiscarded(#[from] StaleContextDiscarded),
}

impl AssignmentError {
    /// Whether retrying the same gesture may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transport { .. } | Self::Rejected(RejectReason::Busy { .. }))
    }

    /// Whether the error should be shown to the user.
    ///
    /// Stale answers belong to a context that no longer exists and are dropped quietly.
    pub fn is_user_visible(&self) -> bool {
        !matches!(self, Self::StaleContextDiscarded(_))
    }
}

/// Failure reported by an [`AssignmentBackend`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct PersistenceError {
    pub message: String,
}

impl PersistenceError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Persistence side of an assignment.
pub trait AssignmentBackend {
    /// Store `snapshot`, which already carries the new assignment.
    fn assign_node_to_level(
        &mut self,
        node_id: Id,
        level_id: Id,
        snapshot: &DomainNode,
    ) -> Result<(), PersistenceError>;
}

/// An accepted assignment waiting for persistence.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingAssignment {
    assignment: Assignment,
    node_id: Id,
    snapshot: DomainNode,
    generation: u64,
}

impl PendingAssignment {
    pub fn node_id(&self) -> Id {
        self.node_id
    }

    pub fn level_id(&self) -> Id {
        self.assignment.level_id
    }

    pub fn assignment(&self) -> &Assignment {
        &self.assignment
    }

    /// The node as it will look once the assignment is stored.
    pub fn snapshot(&self) -> &DomainNode {
        &self.snapshot
    }
}

/// Validates assignments and tracks which nodes have one in flight.
#[derive(Debug, Clone, Default)]
pub struct AssignmentService {
    in_flight: HashSet<Id>,
}

impl AssignmentService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate an assignment of `node_id` to `level_id` in the active hierarchy.
    ///
    /// On success the node is marked busy until [`complete`](Self::complete)
    /// or [`abandon`](Self::abandon) is called with the returned ticket.
    ///
    /// # Errors
    ///
    /// Returns [`AssignmentError::Rejected`] if the node or level is unknown,
    /// no hierarchy is active, the node's type is not accepted by the level, or
    /// the node already has an assignment in flight. Nothing is changed.
    pub fn begin(
        &mut self,
        graph: &DomainGraph,
        hierarchy: &HierarchyState,
        node_id: Id,
        level_id: Id,
    ) -> Result<PendingAssignment, AssignmentError> {
        let node = graph
            .node(node_id)
            .ok_or(RejectReason::UnknownNode { node_id })?;
        if self.in_flight.contains(&node_id) {
            return Err(RejectReason::Busy { node_id }.into());
        }
        let context = hierarchy.context().ok_or(RejectReason::NoActiveHierarchy)?;
        let level = context
            .levels
            .by_id(level_id)
            .ok_or(RejectReason::UnknownLevel {
                hierarchy_id: context.hierarchy_id,
                level_id,
            })?;
        if !level.accepts(node.node_type()) {
            return Err(RejectReason::TypeNotAllowed {
                node_type: node.node_type().to_string(),
                level_id,
            }
            .into());
        }

        let assignment = Assignment {
            hierarchy_id: context.hierarchy_id,
            level_id,
            level_number: level.level_number(),
        };
        let mut snapshot = node.clone();
        snapshot.set_assignment(assignment);

        self.in_flight.insert(node_id);
        debug!(node_id:%, level_id:%; "Assignment started");
        Ok(PendingAssignment {
            assignment,
            node_id,
            snapshot,
            generation: hierarchy.generation(),
        })
    }

    /// Apply the persistence answer for `pending`.
    ///
    /// The node is no longer busy afterwards, whatever the outcome.
    ///
    /// # Errors
    ///
    /// - [`AssignmentError::StaleContextDiscarded`] if the active hierarchy
    ///   changed or the node was removed while the call was in flight. A
    ///   switched hierarchy wins over a persistence failure.
    /// - [`AssignmentError::Transport`] if persistence failed; nothing is applied.
    pub fn complete(
        &mut self,
        pending: PendingAssignment,
        result: Result<(), PersistenceError>,
        graph: &mut DomainGraph,
        hierarchy: &HierarchyState,
    ) -> Result<Assignment, AssignmentError> {
        self.in_flight.remove(&pending.node_id);
        let node_id = pending.node_id;
        let assignment = pending.assignment;

        let stale = || StaleContextDiscarded {
            hierarchy_id: assignment.hierarchy_id,
        };
        if hierarchy.generation() != pending.generation
            || hierarchy.active() != Some(assignment.hierarchy_id)
        {
            debug!(node_id:%; "Discarding assignment answer for a hierarchy that is no longer active");
            return Err(stale().into());
        }

        if let Err(err) = result {
            warn!(node_id:%, err:err; "Assignment failed");
            return Err(AssignmentError::Transport {
                message: err.message,
            });
        }
        if graph.set_assignment(node_id, assignment).is_none() {
            debug!(node_id:%; "Discarding assignment for a removed node");
            return Err(stale().into());
        }

        info!(node_id:%, level_id:% = assignment.level_id, level_number = assignment.level_number; "Node assigned");
        Ok(assignment)
    }

    /// Release the node without applying anything.
    pub fn abandon(&mut self, pending: PendingAssignment) {
        self.in_flight.remove(&pending.node_id);
    }

    pub fn is_busy(&self, node_id: Id) -> bool {
        self.in_flight.contains(&node_id)
    }

    pub fn busy_nodes(&self) -> &HashSet<Id> {
        &self.in_flight
    }

    /// Validate, persist through `backend`, and apply in one step.
    ///
    /// # Errors
    ///
    /// See [`begin`](Self::begin) and [`complete`](Self::complete).
    pub fn assign(
        &mut self,
        graph: &mut DomainGraph,
        hierarchy: &HierarchyState,
        backend: &mut dyn AssignmentBackend,
        node_id: Id,
        level_id: Id,
    ) -> Result<Assignment, AssignmentError> {
        let pending = self.begin(graph, hierarchy, node_id, level_id)?;
        let result = backend.assign_node_to_level(node_id, level_id, pending.snapshot());
        self.complete(pending, result, graph, hierarchy)
    }
}
