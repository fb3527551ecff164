//! Positioning helpers shared by the built-in strategies.

use std::collections::BTreeMap;

use strata_core::{
    geometry::{Bounds, Point},
    identifier::Id,
};

use super::{LayoutGraph, Positions};

/// Place `ids` row by row on a square grid starting at the origin.
///
/// The grid has `ceil(sqrt(n))` columns; cells are `spacing` apart.
pub(crate) fn grid(ids: &[Id], spacing: f32) -> Vec<(Id, Point)> {
    let columns = grid_columns(ids.len());
    ids.iter()
        .enumerate()
        .map(|(i, id)| {
            let row = i / columns;
            let col = i % columns;
            (id.to_owned(), Point::new(col as f32 * spacing, row as f32 * spacing))
        })
        .collect()
}

pub(crate) fn grid_columns(count: usize) -> usize {
    ((count as f32).sqrt().ceil() as usize).max(1)
}

/// X coordinates for the centers of elements laid out left to right.
///
/// `widths` are the element extents; neighbours are at least `min_spacing`
/// apart, edge to edge.
pub(crate) fn distribute_horizontally(widths: &[f32], min_spacing: f32) -> Vec<f32> {
    let mut positions = Vec::with_capacity(widths.len());
    let mut x = 0.0_f32;
    for (i, width) in widths.iter().enumerate() {
        if i == 0 {
            x += width / 2.0;
        } else {
            x += widths[i - 1] / 2.0 + min_spacing + width / 2.0;
        }
        positions.push(x);
    }
    positions
}

/// Rank of every node along the hierarchy axis.
///
/// Distinct level numbers are ranked in ascending order, so gaps in the
/// numbering do not leave empty bands. Nodes without a level share one
/// band after the deepest level.
pub(crate) fn level_ranks(graph: &LayoutGraph) -> BTreeMap<Id, usize> {
    let mut distinct: Vec<u32> = graph.nodes().filter_map(|id| graph.level(id)).collect();
    distinct.sort_unstable();
    distinct.dedup();

    graph
        .nodes()
        .map(|id| {
            let rank = match graph.level(id) {
                Some(level) => distinct.partition_point(|&l| l < level),
                None => distinct.len(),
            };
            (id, rank)
        })
        .collect()
}

/// Shift positions so the bounding box starts at the origin.
pub(crate) fn normalize(positions: &mut Positions) {
    let Some(bounds) = Bounds::from_points(positions.values().copied()) else {
        return;
    };
    let offset = Point::new(bounds.min_x(), bounds.min_y());
    for point in positions.values_mut() {
        *point = point.sub_point(offset);
    }
}
