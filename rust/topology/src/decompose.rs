// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Ring decomposition.
//!
//! Turns each ring of a polygon into directed primitive edges between
//! consecutive snapped vertices. Rings are normalised so the owning polygon's
//! interior always lies on the **left** of every directed edge: exterior rings
//! run counter-clockwise and holes clockwise. A border shared by two
//! polygons is then walked in opposite directions by its two owners.

use tracing::trace;

use crate::arena::VertexArena;
use crate::error::{Error, Result};
use crate::feature::{PolygonFeature, RingRole, Winding};
use crate::geometry::signed_area;
use crate::keys::VertexKey;
use crate::spatial::VertexGrid;

/// A directed edge between two consecutive ring vertices.
#[derive(Debug, Clone, PartialEq)]
pub struct PrimitiveEdge {
    /// Index of the owning feature in the build input.
    pub polygon: usize,
    /// Ring ordinal within the feature; 0 is the exterior.
    pub ring: usize,
    pub role: RingRole,
    /// Winding of the ring as it was read, before normalisation.
    pub winding: Winding,
    pub origin: VertexKey,
    pub dest: VertexKey,
    /// Source coordinates before snapping.
    pub origin_at: [f64; 2],
    pub dest_at: [f64; 2],
}

/// All primitive edges of one ring, in normalised travel order.
#[derive(Debug, Clone)]
pub struct DecomposedRing {
    pub polygon: usize,
    pub ring: usize,
    pub role: RingRole,
    pub winding: Winding,
    pub edges: Vec<PrimitiveEdge>,
}

impl DecomposedRing {
    /// Vertex keys in travel order, without the closing repeat.
    pub fn vertices(&self) -> impl Iterator<Item = VertexKey> + '_ {
        self.edges.iter().map(|e| e.origin)
    }
}

/// Decomposes every ring of `feature`, snapping its coordinates into `arena`.
///
/// `polygon` is the feature's position in the build input and is copied onto
/// every edge. Fails with [`Error::DegenerateGeometry`] on the first ring that
/// has fewer than four vertices after closing, a non-finite coordinate, or
/// no enclosed area once snapped.
pub fn decompose(
    feature: &PolygonFeature,
    polygon: usize,
    arena: &mut VertexArena,
    grid: &mut VertexGrid,
    tolerance: f64,
) -> Result<Vec<DecomposedRing>> {
    feature
        .rings()
        .enumerate()
        .map(|(ring, (role, coords))| {
            decompose_ring(feature, polygon, ring, role, coords, arena, grid, tolerance)
        })
        .collect()
}

#[allow(clippy::too_many_arguments)]
fn decompose_ring(
    feature: &PolygonFeature,
    polygon: usize,
    ring: usize,
    role: RingRole,
    coords: &[[f64; 2]],
    arena: &mut VertexArena,
    grid: &mut VertexGrid,
    tolerance: f64,
) -> Result<DecomposedRing> {
    let degenerate = |reason: String| Error::DegenerateGeometry {
        polygon: feature.id.clone(),
        ring,
        role,
        reason,
    };

    if let Some(bad) = coords
        .iter()
        .find(|c| !c[0].is_finite() || !c[1].is_finite())
    {
        return Err(degenerate(format!(
            "non-finite coordinate ({}, {})",
            bad[0], bad[1]
        )));
    }

    let mut closed = coords.to_vec();
    if let (Some(first), Some(last)) = (closed.first().copied(), closed.last().copied()) {
        let gap = (first[0] - last[0]).hypot(first[1] - last[1]);
        if gap > tolerance {
            closed.push(first);
        }
    }
    if closed.len() < 4 {
        return Err(degenerate(format!(
            "{} vertices after closing, at least 4 required",
            closed.len()
        )));
    }

    // Snap the open ring, dropping vertices that collapse onto their
    // predecessor.
    let open = &closed[..closed.len() - 1];
    let mut snapped: Vec<(VertexKey, [f64; 2])> = Vec::with_capacity(open.len());
    for &c in open {
        let key = arena.find_or_add_vertex(grid, c[0], c[1], tolerance);
        if snapped.last().map_or(true, |&(prev, _)| prev != key) {
            snapped.push((key, c));
        }
    }
    while snapped.len() > 1 && snapped.first().map(|s| s.0) == snapped.last().map(|s| s.0) {
        snapped.pop();
    }
    if snapped.len() < 3 {
        return Err(degenerate(format!(
            "ring collapses to {} distinct vertices under tolerance {}",
            snapped.len(),
            tolerance
        )));
    }

    let positions: Vec<[f64; 2]> = snapped
        .iter()
        .map(|&(key, _)| {
            let p = arena.position(key);
            [p.x, p.y]
        })
        .collect();
    let area = signed_area(&positions);
    if area.abs() <= tolerance * tolerance {
        return Err(degenerate("zero signed area".to_string()));
    }

    let winding = Winding::of_signed_area(area);
    if winding != Winding::interior_left(role) {
        snapped.reverse();
    }

    let n = snapped.len();
    let edges = (0..n)
        .map(|i| {
            let (origin, origin_at) = snapped[i];
            let (dest, dest_at) = snapped[(i + 1) % n];
            PrimitiveEdge {
                polygon,
                ring,
                role,
                winding,
                origin,
                dest,
                origin_at,
                dest_at,
            }
        })
        .collect::<Vec<_>>();

    trace!(
        polygon = %feature.id,
        ring,
        edges = edges.len(),
        reversed = winding != Winding::interior_left(role),
        "ring decomposed"
    );

    Ok(DecomposedRing {
        polygon,
        ring,
        role,
        winding,
        edges,
    })
}
