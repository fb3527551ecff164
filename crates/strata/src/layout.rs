//! Layout engine abstraction.
//!
//! A registry of named positioning strategies ([`engines::LayoutAlgorithm`])
//! plus a per-algorithm position cache and a last-good fallback. Flipping
//! between algorithms reuses each algorithm's cached result as long as the set
//! of node ids it was computed for is unchanged.
//!
//! If an algorithm fails (returns an error, panics, or produces non-finite
//! coordinates) the previously applied positions are reused, new nodes are
//! placed on a grid next to them, and the failure is reported in the
//! [`LayoutOutcome`].

mod cache;
pub mod engines;
mod graph;
mod positioning;
mod queue;

use std::{
    collections::BTreeMap,
    panic::{self, AssertUnwindSafe},
};

use log::{debug, info, warn};
use serde::Serialize;

use strata_core::{
    element::ElementSet,
    geometry::{Bounds, Point},
    identifier::Id,
};

pub use cache::LayoutCache;
pub use engines::{EngineBuilder, LayoutAlgorithm};
pub use graph::{Fingerprint, LayoutGraph};
pub use queue::{LayoutQueue, LayoutRequest, Submission};

/// Node id to position mapping produced by a layout run.
pub type Positions = BTreeMap<Id, Point>;

/// Flags applied to every layout run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LayoutOptions {
    /// Interpolate from old to new positions instead of snapping.
    pub animate: bool,
    /// Reframe the viewport to the new bounding box.
    pub fit: bool,
    /// Use the node's level number as the primary placement axis.
    pub respect_hierarchy: bool,
}

impl Default for LayoutOptions {
    fn default() -> Self {
        Self {
            animate: true,
            fit: true,
            respect_hierarchy: false,
        }
    }
}

/// Errors produced by a positioning strategy.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LayoutError {
    #[error("unknown layout algorithm `{0}`")]
    UnknownAlgorithm(String),

    #[error("layout diverged: {0}")]
    Diverged(String),

    #[error("layout engine panicked: {0}")]
    Panicked(String),

    #[error("layout failed: {0}")]
    Failed(String),
}

/// A failed run of a named algorithm.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[error("layout `{algorithm}` failed: {message}")]
pub struct LayoutFailure {
    pub algorithm: String,
    pub message: String,
}

/// Where the positions of a [`LayoutOutcome`] came from.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PositionSource {
    Computed,
    Cached,
    Fallback { failure: LayoutFailure },
}

/// Result of [`LayoutEngine::apply_layout`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LayoutOutcome {
    pub algorithm: String,
    pub positions: Positions,
    pub source: PositionSource,
    pub animate: bool,
    /// Viewport to frame when `fit` was requested.
    pub viewport: Option<Bounds>,
}

impl LayoutOutcome {
    pub fn failure(&self) -> Option<&LayoutFailure> {
        match &self.source {
            PositionSource::Fallback { failure } => Some(failure),
            _ => None,
        }
    }
}

/// Registry of layout algorithms with a per-algorithm cache.
///
/// Mutation goes through `&mut self`; a multi-threaded shell must wrap the
/// engine in a lock so cache reads never observe a half-written entry.
pub struct LayoutEngine {
    algorithms: indexmap::IndexMap<String, Box<dyn LayoutAlgorithm>>,
    cache: LayoutCache,
    last_good: Positions,
    fallback_spacing: f32,
}

impl LayoutEngine {
    pub(crate) fn new(
        algorithms: indexmap::IndexMap<String, Box<dyn LayoutAlgorithm>>,
        fallback_spacing: f32,
    ) -> Self {
        Self {
            algorithms,
            cache: LayoutCache::default(),
            last_good: Positions::new(),
            fallback_spacing,
        }
    }

    /// Register (or replace) an algorithm under `name`. Drops any cached result for it.
    pub fn register(&mut self, name: impl Into<String>, algorithm: Box<dyn LayoutAlgorithm>) {
        let name = name.into();
        self.cache.clear(Some(&name));
        self.algorithms.insert(name, algorithm);
    }

    /// Registered algorithm names in registration order.
    pub fn algorithms(&self) -> impl Iterator<Item = &str> {
        self.algorithms.keys().map(String::as_str)
    }

    pub fn has_algorithm(&self, name: &str) -> bool {
        self.algorithms.contains_key(name)
    }

    /// Positions of the most recent successful run, of any algorithm.
    pub fn last_good(&self) -> &Positions {
        &self.last_good
    }

    pub fn cache(&self) -> &LayoutCache {
        &self.cache
    }

    /// Drop cached positions for one algorithm, or for all when `None`.
    pub fn clear_cache(&mut self, algorithm: Option<&str>) {
        debug!(algorithm:?; "Clearing layout cache");
        self.cache.clear(algorithm);
    }

    /// Position `elements` with the named algorithm.
    ///
    /// Never fails: on error the outcome carries fallback positions and the failure.
    pub fn apply_layout(
        &mut self,
        elements: &ElementSet,
        algorithm: &str,
        options: &LayoutOptions,
    ) -> LayoutOutcome {
        let graph = LayoutGraph::from_elements(elements);
        let fingerprint = graph.fingerprint(options.respect_hierarchy);

        if let Some(positions) = self.cache.get(algorithm, &fingerprint) {
            debug!(algorithm, nodes = positions.len(); "Layout cache hit");
            let positions = positions.clone();
            self.last_good = positions.clone();
            return self.outcome(algorithm, positions, PositionSource::Cached, options);
        }

        match self.run(algorithm, &graph, options) {
            Ok(positions) => {
                info!(algorithm, nodes = positions.len(); "Layout computed");
                self.cache
                    .insert(algorithm, fingerprint, positions.clone());
                self.last_good = positions.clone();
                self.outcome(algorithm, positions, PositionSource::Computed, options)
            }
            Err(err) => {
                let failure = LayoutFailure {
                    algorithm: algorithm.to_string(),
                    message: err.to_string(),
                };
                warn!(algorithm, err:err; "Layout failed, falling back to last good positions");
                let positions = self.fallback_positions(&graph);
                self.outcome(
                    algorithm,
                    positions,
                    PositionSource::Fallback { failure },
                    options,
                )
            }
        }
    }

    fn run(
        &self,
        algorithm: &str,
        graph: &LayoutGraph,
        options: &LayoutOptions,
    ) -> Result<Positions, LayoutError> {
        let engine = self
            .algorithms
            .get(algorithm)
            .ok_or_else(|| LayoutError::UnknownAlgorithm(algorithm.to_string()))?;

        let positions = panic::catch_unwind(AssertUnwindSafe(|| engine.position(graph, options)))
            .map_err(|err| {
                let message = err
                    .downcast_ref::<String>()
                    .cloned()
                    .or_else(|| err.downcast_ref::<&str>().map(|s| s.to_string()))
                    .unwrap_or_else(|| "unknown panic".to_string());
                LayoutError::Panicked(message)
            })??;

        if let Some((id, point)) = positions.iter().find(|(_, point)| !point.is_finite()) {
            return Err(LayoutError::Diverged(format!(
                "node `{id}` ended at ({}, {})",
                point.x(),
                point.y()
            )));
        }
        if let Some(missing) = graph.nodes().find(|id| !positions.contains_key(id)) {
            return Err(LayoutError::Failed(format!("node `{missing}` was not positioned")));
        }
        Ok(positions)
    }

    /// Last good positions for nodes that have them, grid slots below them for the rest.
    fn fallback_positions(&self, graph: &LayoutGraph) -> Positions {
        let mut positions = Positions::new();
        let mut missing = Vec::new();
        for id in graph.nodes() {
            match self.last_good.get(&id) {
                Some(point) => {
                    positions.insert(id, *point);
                }
                None => missing.push(id),
            }
        }

        let origin = Bounds::from_points(positions.values().copied())
            .map(|bounds| Point::new(bounds.min_x(), bounds.max_y() + self.fallback_spacing))
            .unwrap_or_default();
        for (id, point) in positioning::grid(&missing, self.fallback_spacing) {
            positions.insert(id, origin.add_point(point));
        }
        positions
    }

    fn outcome(
        &self,
        algorithm: &str,
        positions: Positions,
        source: PositionSource,
        options: &LayoutOptions,
    ) -> LayoutOutcome {
        let viewport = if options.fit {
            Bounds::from_points(positions.values().copied())
        } else {
            None
        };
        LayoutOutcome {
            algorithm: algorithm.to_string(),
            positions,
            source,
            animate: options.animate,
            viewport,
        }
    }
}
