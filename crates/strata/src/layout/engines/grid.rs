//! Square grid layout.

use serde::Deserialize;
use strata_core::{geometry::Point, identifier::Id};

use crate::layout::{
    LayoutError, LayoutGraph, LayoutOptions, Positions, engines::LayoutAlgorithm, positioning,
};

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    spacing: f32,
}

impl GridConfig {
    pub fn new(spacing: f32) -> Self {
        Self { spacing }
    }

    pub fn spacing(&self) -> f32 {
        self.spacing
    }
}

impl Default for GridConfig {
    fn default() -> Self {
        Self { spacing: 120.0 }
    }
}

/// Places nodes row by row in their current order.
///
/// With `respect_hierarchy` and at least one leveled node, each level gets
/// its own row (ordered by level number) and nodes are spread along it.
pub struct Engine {
    config: GridConfig,
}

impl Engine {
    pub fn new(config: GridConfig) -> Self {
        Self { config }
    }
}

impl LayoutAlgorithm for Engine {
    fn position(
        &self,
        graph: &LayoutGraph,
        options: &LayoutOptions,
    ) -> Result<Positions, LayoutError> {
        let spacing = self.config.spacing;

        if !graph.ranks_by_level(options) {
            let ids: Vec<Id> = graph.nodes().collect();
            return Ok(positioning::grid(&ids, spacing).into_iter().collect());
        }

        let ranks = positioning::level_ranks(graph);
        let mut next_column: Vec<usize> = Vec::new();
        let mut positions = Positions::new();
        for id in graph.nodes() {
            let rank = ranks.get(&id).copied().unwrap_or_default();
            if next_column.len() <= rank {
                next_column.resize(rank + 1, 0);
            }
            let column = next_column[rank];
            next_column[rank] += 1;
            positions.insert(
                id,
                Point::new(column as f32 * spacing, rank as f32 * spacing),
            );
        }
        Ok(positions)
    }
}
