// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Arena of snapped vertices.
//!
//! The [`VertexArena`] owns every vertex location seen during a build. Input
//! coordinates are snapped into it through a [`VertexGrid`](crate::spatial::VertexGrid),
//! so two coordinates within tolerance share one [`VertexKey`]. Rings,
//! sub-edges and canonical edges reference keys only, which keeps the
//! matching phase free of aliasing: the arena is read-only once
//! decomposition has finished.

use nalgebra::Point2;
use slotmap::SlotMap;

use crate::keys::VertexKey;

/// Data stored for a vertex: a point in the plane.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VertexData {
    pub x: f64,
    pub y: f64,
}

/// Owner of all vertices of one build.
///
/// # Example
///
/// ```
/// use area_mesher_topology::VertexArena;
///
/// let mut arena = VertexArena::new();
/// let v0 = arena.add_vertex(0.0, 0.0);
/// let v1 = arena.add_vertex(1.0, 0.0);
///
/// assert_ne!(v0, v1);
/// assert_eq!(arena.vertex_count(), 2);
/// ```
#[derive(Debug, Default)]
pub struct VertexArena {
    pub(crate) vertices: SlotMap<VertexKey, VertexData>,
}

impl VertexArena {
    /// Creates a new, empty arena.
    pub fn new() -> Self {
        Self {
            vertices: SlotMap::with_key(),
        }
    }

    /// Adds a vertex at the given coordinates.
    pub fn add_vertex(&mut self, x: f64, y: f64) -> VertexKey {
        self.vertices.insert(VertexData { x, y })
    }

    /// Returns the vertex data for the given key, or `None` if not found.
    pub fn vertex(&self, key: VertexKey) -> Option<&VertexData> {
        self.vertices.get(key)
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Returns the coordinates of a vertex as `[x, y]`.
    pub fn vertex_coords(&self, key: VertexKey) -> Option<[f64; 2]> {
        self.vertices.get(key).map(|v| [v.x, v.y])
    }

    /// Position of a vertex created by this arena.
    ///
    /// Keys never leave the build that created them, so a missing key is a
    /// programming error rather than an input problem.
    pub(crate) fn position(&self, key: VertexKey) -> Point2<f64> {
        let v = &self.vertices[key];
        Point2::new(v.x, v.y)
    }

    pub fn iter(&self) -> impl Iterator<Item = (VertexKey, &VertexData)> {
        self.vertices.iter()
    }
}
