//! Layered (Sugiyama) layout
//!
//! Delegates crossing minimisation and coordinate assignment to
//! `rust-sugiyama`. Each connected component comes back separately; components
//! are placed side by side and nodes without edges follow them in a row.
//!
//! With `respect_hierarchy` and leveled nodes, rows are the levels instead of
//! the computed layers, and the computed x order is kept within each row.

use std::{
    collections::{BTreeMap, HashMap},
    panic::{self, AssertUnwindSafe},
};

use log::debug;
use rust_sugiyama::configure::Config;
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
pub struct LayeredConfig {
    horizontal_spacing: f32,
    vertical_spacing: f32,
    /// Spacing handed to the Sugiyama solver, in its own units.
    vertex_spacing: f64,
}

impl Default for LayeredConfig {
    fn default() -> Self {
        Self {
            horizontal_spacing: 120.0,
            vertical_spacing: 150.0,
            vertex_spacing: 3.0,
        }
    }
}

impl LayeredConfig {
    pub fn with_spacing(mut self, horizontal: f32, vertical: f32) -> Self {
        self.horizontal_spacing = horizontal;
        self.vertical_spacing = vertical;
        self
    }
}

pub struct Engine {
    config: LayeredConfig,
}

impl Engine {
    pub fn new(config: LayeredConfig) -> Self {
        Self { config }
    }

    /// Run the solver and lay the components out left to right.
    fn solve(&self, nodes: &[Id], edges: &[(u32, u32)]) -> Result<Positions, LayoutError> {
        let solver_config = Config {
            minimum_length: 1,
            vertex_spacing: self.config.vertex_spacing,
            ..Default::default()
        };
        let components = panic::catch_unwind(AssertUnwindSafe(|| {
            rust_sugiyama::from_edges(edges, &solver_config)
        }))
        .map_err(|err| {
            let message = err
                .downcast_ref::<String>()
                .cloned()
                .or_else(|| err.downcast_ref::<&str>().map(|s| s.to_string()))
                .unwrap_or_else(|| "unknown error".to_string());
            LayoutError::Panicked(format!("sugiyama solver panicked: {message}"))
        })?;

        if components.is_empty() {
            return Err(LayoutError::Failed(
                "sugiyama solver returned no components".to_string(),
            ));
        }

        let unit = self.config.vertex_spacing.max(f64::EPSILON) as f32;
        let mut positions = Positions::new();
        let mut offset_x = 0.0_f32;
        for (coords, _, _) in &components {
            let mut component = Positions::new();
            for &(index, (x, y)) in coords {
                let Some(&id) = nodes.get(index as usize) else {
                    debug!(index; "Sugiyama result refers to an unknown vertex");
                    continue;
                };
                component.insert(
                    id,
                    Point::new(
                        x as f32 / unit * self.config.horizontal_spacing,
                        y as f32 / unit * self.config.vertical_spacing,
                    ),
                );
            }
            orient_downwards(&mut component, nodes, edges);
            positioning::normalize(&mut component);

            let width = Bounds::from_points(component.values().copied())
                .map(|bounds| bounds.width())
                .unwrap_or_default();
            for (id, point) in component {
                positions.insert(id, point.add_point(Point::new(offset_x, 0.0)));
            }
            offset_x += width + self.config.horizontal_spacing;
        }

        if positions.is_empty() {
            return Err(LayoutError::Failed(
                "failed to map any sugiyama positions back to nodes".to_string(),
            ));
        }

        // Nodes without edges are not part of any component.
        let isolated: Vec<Id> = nodes
            .iter()
            .filter(|id| !positions.contains_key(*id))
            .copied()
            .collect();
        for (i, id) in isolated.into_iter().enumerate() {
            positions.insert(
                id,
                Point::new(offset_x + i as f32 * self.config.horizontal_spacing, 0.0),
            );
        }
        Ok(positions)
    }

    /// Re-row positions by level, keeping the x order within each row.
    fn rows_by_level(&self, graph: &LayoutGraph, positions: &Positions) -> Positions {
        let ranks = positioning::level_ranks(graph);
        let mut rows: BTreeMap<usize, Vec<(Id, f32)>> = BTreeMap::new();
        for (&id, &rank) in &ranks {
            let x = positions.get(&id).map(|point| point.x()).unwrap_or_default();
            rows.entry(rank).or_default().push((id, x));
        }

        let mut result = Positions::new();
        for (rank, mut row) in rows {
            row.sort_by(|a, b| a.1.total_cmp(&b.1).then_with(|| a.0.cmp(&b.0)));
            let widths = vec![0.0; row.len()];
            let xs = positioning::distribute_horizontally(&widths, self.config.horizontal_spacing);
            for ((id, _), x) in row.into_iter().zip(xs) {
                result.insert(id, Point::new(x, rank as f32 * self.config.vertical_spacing));
            }
        }
        result
    }
}

/// Flip a component vertically if its edges point upwards on average.
fn orient_downwards(component: &mut Positions, nodes: &[Id], edges: &[(u32, u32)]) {
    let drop: f32 = edges
        .iter()
        .filter_map(|&(source, target)| {
            let source = component.get(nodes.get(source as usize)?)?;
            let target = component.get(nodes.get(target as usize)?)?;
            Some(target.y() - source.y())
        })
        .sum();
    if drop < 0.0 {
        for point in component.values_mut() {
            *point = point.with_y(-point.y());
        }
    }
}

impl LayoutAlgorithm for Engine {
    fn position(
        &self,
        graph: &LayoutGraph,
        options: &LayoutOptions,
    ) -> Result<Positions, LayoutError> {
        let nodes: Vec<Id> = graph.nodes().collect();
        let indices: HashMap<Id, u32> = nodes
            .iter()
            .enumerate()
            .map(|(i, &id)| (id, i as u32))
            .collect();
        let edges: Vec<(u32, u32)> = graph
            .edges()
            .filter_map(|(source, target)| Some((*indices.get(&source)?, *indices.get(&target)?)))
            .collect();

        let positions = if edges.is_empty() {
            debug!(nodes = nodes.len(); "Graph has no edges, arranging nodes in a row");
            let widths = vec![0.0; nodes.len()];
            nodes
                .iter()
                .copied()
                .zip(positioning::distribute_horizontally(
                    &widths,
                    self.config.horizontal_spacing,
                ))
                .map(|(id, x)| (id, Point::new(x, 0.0)))
                .collect()
        } else {
            debug!(nodes = nodes.len(), edges = edges.len(); "Applying Sugiyama algorithm");
            self.solve(&nodes, &edges)?
        };

        if graph.ranks_by_level(options) {
            Ok(self.rows_by_level(graph, &positions))
        } else {
            Ok(positions)
        }
    }
}

#[cfg(test)]
mod tests {
    use float_cmp::assert_approx_eq;

    use super::*;

    fn options(respect_hierarchy: bool) -> LayoutOptions {
        LayoutOptions {
            respect_hierarchy,
            ..LayoutOptions::default()
        }
    }

    #[test]
    fn test_every_node_positioned_including_isolated() {
        let graph = LayoutGraph::from_parts(
            [
                (Id::new("a"), None),
                (Id::new("b"), None),
                (Id::new("c"), None),
                (Id::new("d"), None),
                (Id::new("alone"), None),
            ],
            [
                (Id::new("a"), Id::new("b")),
                (Id::new("c"), Id::new("d")),
            ],
        );
        let positions = Engine::new(LayeredConfig::default())
            .position(&graph, &options(false))
            .unwrap();

        assert_eq!(positions.len(), 5);
        assert!(positions.values().all(|point| point.is_finite()));
        assert_ne!(positions[&Id::new("a")], positions[&Id::new("c")]);
    }

    #[test]
    fn test_edgeless_graph_is_a_row() {
        let graph = LayoutGraph::from_parts([(Id::new("a"), None), (Id::new("b"), None)], []);
        let positions = Engine::new(LayeredConfig::default())
            .position(&graph, &options(false))
            .unwrap();

        assert_approx_eq!(f32, positions[&Id::new("a")].y(), 0.0);
        assert_approx_eq!(f32, positions[&Id::new("b")].x(), 120.0);
    }

    #[test]
    fn test_levels_become_rows() {
        let graph = LayoutGraph::from_parts(
            [
                (Id::new("root"), Some(1)),
                (Id::new("left"), Some(2)),
                (Id::new("right"), Some(2)),
                (Id::new("loose"), Some(3)),
            ],
            [
                (Id::new("root"), Id::new("left")),
                (Id::new("root"), Id::new("right")),
            ],
        );
        let positions = Engine::new(LayeredConfig::default().with_spacing(100.0, 50.0))
            .position(&graph, &options(true))
            .unwrap();

        assert_approx_eq!(f32, positions[&Id::new("root")].y(), 0.0);
        assert_approx_eq!(f32, positions[&Id::new("left")].y(), 50.0);
        assert_approx_eq!(f32, positions[&Id::new("right")].y(), 50.0);
        assert_approx_eq!(f32, positions[&Id::new("loose")].y(), 100.0);
        let gap = (positions[&Id::new("left")].x() - positions[&Id::new("right")].x()).abs();
        assert_approx_eq!(f32, gap, 100.0);
    }

    #[test]
    fn test_unleveled_chain_keeps_its_layers() {
        let graph = LayoutGraph::from_parts(
            [(Id::new("a"), None), (Id::new("b"), None), (Id::new("c"), None)],
            [(Id::new("a"), Id::new("b")), (Id::new("b"), Id::new("c"))],
        );
        let engine = Engine::new(LayeredConfig::default());

        let plain = engine.position(&graph, &options(false)).unwrap();
        let respected = engine.position(&graph, &options(true)).unwrap();

        assert_eq!(respected, plain);
        assert!(respected[&Id::new("a")].y() < respected[&Id::new("b")].y());
        assert!(respected[&Id::new("b")].y() < respected[&Id::new("c")].y());
    }
}
