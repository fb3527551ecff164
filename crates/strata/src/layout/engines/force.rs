//! Force-directed layout
//!
//! A damped spring/repulsion simulation. Nodes start on a jittered grid; the
//! jitter comes from a seeded generator so the same graph always lands in the
//! same place, which keeps cached and recomputed results interchangeable.

use std::collections::HashMap;

use log::debug;
use rand::{Rng, SeedableRng, rngs::StdRng};
use serde::Deserialize;
use strata_core::{
    geometry::{Bounds, Point},
    identifier::Id,
};

use crate::layout::{
    LayoutError, LayoutGraph, LayoutOptions, Positions, engines::LayoutAlgorithm, positioning,
};

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct ForceConfig {
    iterations: usize,
    spring_constant: f32,
    repulsion_constant: f32,
    damping_factor: f32,
    min_distance: f32,
    /// Vertical distance between level bands when the hierarchy is respected.
    level_spacing: f32,
    /// Layouts larger than this in either direction are scaled down.
    max_dimension: f32,
    seed: u64,
}

impl Default for ForceConfig {
    fn default() -> Self {
        Self {
            iterations: 100,
            spring_constant: 0.1,
            repulsion_constant: 1000.0,
            damping_factor: 0.85,
            min_distance: 80.0,
            level_spacing: 150.0,
            max_dimension: 1200.0,
            seed: 0x5eed,
        }
    }
}

impl ForceConfig {
    pub fn with_iterations(mut self, iterations: usize) -> Self {
        self.iterations = iterations;
        self
    }

    pub fn with_spring_constant(mut self, constant: f32) -> Self {
        self.spring_constant = constant;
        self
    }

    pub fn with_repulsion_constant(mut self, constant: f32) -> Self {
        self.repulsion_constant = constant;
        self
    }

    pub fn with_damping_factor(mut self, factor: f32) -> Self {
        self.damping_factor = factor;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn iterations(&self) -> usize {
        self.iterations
    }
}

pub struct Engine {
    config: ForceConfig,
}

impl Engine {
    pub fn new(config: ForceConfig) -> Self {
        Self { config }
    }

    fn initialize_positions(&self, nodes: &[Id]) -> HashMap<Id, Point> {
        let mut rng = StdRng::seed_from_u64(self.config.seed);

        let columns = positioning::grid_columns(nodes.len());
        let cell_size = self.config.min_distance * 1.5;

        nodes
            .iter()
            .enumerate()
            .map(|(i, &id)| {
                let row = i / columns;
                let col = i % columns;
                let base = Point::new(col as f32 * cell_size, row as f32 * cell_size);
                // Break symmetry so coincident nodes can push apart.
                let jitter =
                    Point::new(rng.random_range(-20.0..20.0), rng.random_range(-20.0..20.0));
                (id, base.add_point(jitter))
            })
            .collect()
    }

    fn simulate(&self, graph: &LayoutGraph, pinned_y: Option<&HashMap<Id, f32>>) -> Positions {
        let config = &self.config;
        let nodes: Vec<Id> = graph.nodes().collect();
        let edges: Vec<(Id, Id)> = graph.edges().collect();

        let mut positions = self.initialize_positions(&nodes);
        if let Some(pinned) = pinned_y {
            for (id, point) in positions.iter_mut() {
                if let Some(&y) = pinned.get(id) {
                    *point = point.with_y(y);
                }
            }
        }
        let mut velocities: HashMap<Id, Point> =
            nodes.iter().map(|&id| (id, Point::default())).collect();

        for _ in 0..config.iterations {
            let mut forces: HashMap<Id, Point> =
                nodes.iter().map(|&id| (id, Point::default())).collect();

            for &node_i in &nodes {
                for &node_j in &nodes {
                    if node_i == node_j {
                        continue;
                    }
                    let trans = positions[&node_i].sub_point(positions[&node_j]);
                    let distance = trans.hypot().max(1.0);

                    let factor = if distance < config.min_distance {
                        config.repulsion_constant * (config.min_distance / distance).powf(2.0)
                    } else {
                        config.repulsion_constant / distance
                    };
                    let force = trans.scale(factor / distance);
                    if let Some(total) = forces.get_mut(&node_i) {
                        *total = total.add_point(force);
                    }
                }
            }

            for &(source, target) in &edges {
                // Spring pull grows linearly with distance.
                let force = positions[&source]
                    .sub_point(positions[&target])
                    .scale(config.spring_constant);

                if let Some(total) = forces.get_mut(&source) {
                    *total = total.sub_point(force);
                }
                if let Some(total) = forces.get_mut(&target) {
                    *total = total.add_point(force);
                }
            }

            for &id in &nodes {
                let velocity = velocities[&id]
                    .add_point(forces[&id])
                    .scale(config.damping_factor);
                velocities.insert(id, velocity);

                let moved = positions[&id].add_point(velocity);
                let next = match pinned_y.and_then(|pinned| pinned.get(&id)) {
                    Some(&y) => moved.with_y(y),
                    None => moved,
                };
                positions.insert(id, next);
            }
        }

        positions.into_iter().collect()
    }

    /// Center around the origin and scale down oversized layouts.
    fn center_layout(&self, positions: &mut Positions) {
        let Some(bounds) = Bounds::from_points(positions.values().copied()) else {
            return;
        };
        let center = bounds.center();
        for point in positions.values_mut() {
            *point = point.sub_point(center);
        }

        let largest = bounds.width().max(bounds.height());
        if largest > self.config.max_dimension {
            let factor = self.config.max_dimension / largest;
            for point in positions.values_mut() {
                *point = point.scale(factor);
            }
        }
    }
}

impl LayoutAlgorithm for Engine {
    fn position(
        &self,
        graph: &LayoutGraph,
        options: &LayoutOptions,
    ) -> Result<Positions, LayoutError> {
        debug!(nodes = graph.node_count(), iterations = self.config.iterations; "Running force simulation");

        let pinned = graph.ranks_by_level(options).then(|| {
            positioning::level_ranks(graph)
                .into_iter()
                .map(|(id, rank)| (id, rank as f32 * self.config.level_spacing))
                .collect::<HashMap<Id, f32>>()
        });

        let mut positions = self.simulate(graph, pinned.as_ref());

        if let Some((id, _)) = positions.iter().find(|(_, point)| !point.is_finite()) {
            return Err(LayoutError::Diverged(format!(
                "force simulation produced a non-finite position for `{id}`"
            )));
        }

        self.center_layout(&mut positions);
        Ok(positions)
    }
}

#[cfg(test)]
mod tests {
    use float_cmp::assert_approx_eq;

    use super::*;

    fn chain() -> LayoutGraph {
        LayoutGraph::from_parts(
            [
                (Id::new("a"), Some(1)),
                (Id::new("b"), Some(2)),
                (Id::new("c"), Some(3)),
            ],
            [(Id::new("a"), Id::new("b")), (Id::new("b"), Id::new("c"))],
        )
    }

    #[test]
    fn test_positions_every_node_deterministically() {
        let engine = Engine::new(ForceConfig::default());
        let first = engine.position(&chain(), &LayoutOptions::default()).unwrap();
        let second = engine.position(&chain(), &LayoutOptions::default()).unwrap();

        assert_eq!(first.len(), 3);
        assert_eq!(first, second);
        assert!(first.values().all(|point| point.is_finite()));
    }

    #[test]
    fn test_respect_hierarchy_pins_levels_to_bands() {
        let engine = Engine::new(ForceConfig::default());
        let options = LayoutOptions {
            respect_hierarchy: true,
            ..LayoutOptions::default()
        };
        let positions = engine.position(&chain(), &options).unwrap();

        let a = positions[&Id::new("a")].y();
        let b = positions[&Id::new("b")].y();
        let c = positions[&Id::new("c")].y();
        assert!(a < b && b < c);
        assert_approx_eq!(f32, b - a, c - b, epsilon = 0.01);
    }

    #[test]
    fn test_unleveled_nodes_are_not_pinned() {
        let graph = LayoutGraph::from_parts(
            [(Id::new("a"), None), (Id::new("b"), None), (Id::new("c"), None)],
            [(Id::new("a"), Id::new("b")), (Id::new("b"), Id::new("c"))],
        );
        let engine = Engine::new(ForceConfig::default());
        let options = LayoutOptions {
            respect_hierarchy: true,
            ..LayoutOptions::default()
        };

        let respected = engine.position(&graph, &options).unwrap();
        let plain = engine.position(&graph, &LayoutOptions::default()).unwrap();

        assert_eq!(respected, plain);
        assert!(respected.values().any(|point| point.y().abs() > 1.0));
    }

    #[test]
    fn test_runaway_forces_are_reported() {
        let engine = Engine::new(
            ForceConfig::default()
                .with_repulsion_constant(f32::MAX)
                .with_damping_factor(f32::MAX),
        );
        let result = engine.position(&chain(), &LayoutOptions::default());

        assert!(matches!(result, Err(LayoutError::Diverged(_))));
    }

    #[test]
    fn test_empty_graph() {
        let engine = Engine::new(ForceConfig::default());
        let positions = engine
            .position(&LayoutGraph::default(), &LayoutOptions::default())
            .unwrap();
        assert!(positions.is_empty());
    }
}
