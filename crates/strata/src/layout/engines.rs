//! Built-in positioning strategies and the builder that registers them.
//!
//! Every strategy implements [`LayoutAlgorithm`]: given the graph to place and
//! the run's [`LayoutOptions`], it returns one position per node or an error.
//! Strategies are pure; caching, fallback and panic isolation live in
//! [`LayoutEngine`].

mod force;
mod grid;
mod layered;

use indexmap::IndexMap;
use log::trace;

pub use force::{Engine as Force, ForceConfig};
pub use grid::{Engine as Grid, GridConfig};
pub use layered::{Engine as Layered, LayeredConfig};

use super::{LayoutEngine, LayoutError, LayoutGraph, LayoutOptions, Positions};

/// A named positioning strategy.
pub trait LayoutAlgorithm {
    /// Compute a position for every node of `graph`.
    ///
    /// # Errors
    /// Returns a [`LayoutError`] when the strategy cannot place the graph.
    fn position(&self, graph: &LayoutGraph, options: &LayoutOptions)
    -> Result<Positions, LayoutError>;
}

/// Builder for a [`LayoutEngine`] with the built-in strategies registered.
///
/// Registers `layered`, `force` and `grid`, in that order.
#[derive(Debug, Default)]
pub struct EngineBuilder {
    force: ForceConfig,
    layered: LayeredConfig,
    grid: GridConfig,
}

impl EngineBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_force(mut self, config: ForceConfig) -> Self {
        self.force = config;
        self
    }

    pub fn with_layered(mut self, config: LayeredConfig) -> Self {
        self.layered = config;
        self
    }

    /// Grid spacing is also used to place nodes that a failed run left without a position.
    pub fn with_grid(mut self, config: GridConfig) -> Self {
        self.grid = config;
        self
    }

    pub fn build(self) -> LayoutEngine {
        trace!(force:?=self.force, layered:?=self.layered, grid:?=self.grid; "Building layout engine");
        let fallback_spacing = self.grid.spacing();

        let mut algorithms: IndexMap<String, Box<dyn LayoutAlgorithm>> = IndexMap::new();
        algorithms.insert("layered".to_string(), Box::new(Layered::new(self.layered)));
        algorithms.insert("force".to_string(), Box::new(Force::new(self.force)));
        algorithms.insert("grid".to_string(), Box::new(Grid::new(self.grid)));

        LayoutEngine::new(algorithms, fallback_spacing)
    }
}
