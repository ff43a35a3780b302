// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The build output: canonical edges over a shared vertex set.

use nalgebra::Point2;
use rstar::primitives::{GeomWithData, Rectangle};
use rstar::{RTree, AABB};
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result, Warning};
use crate::geometry::{collinear_overlap, point, polyline_length, polyline_midpoint, Bounds};
use crate::keys::Face;
use crate::spatial::VertexGrid;

/// A mesh vertex. `id` equals its position in [`Mesh::vertices`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MeshVertex {
    pub id: usize,
    pub x: f64,
    pub y: f64,
}

impl MeshVertex {
    pub fn coords(&self) -> [f64; 2] {
        [self.x, self.y]
    }
}

/// A canonical edge: a polyline with a face on each side.
///
/// `left` and `right` are relative to the direction of `vertices`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeshEdge {
    pub id: usize,
    pub vertices: Vec<usize>,
    pub left: Face,
    pub right: Face,
    #[serde(default, skip_serializing_if = "is_false")]
    pub hole_in_parent: bool,
    /// Input position of the feature whose ring first produced the edge.
    pub polygon: usize,
}

fn is_false(b: &bool) -> bool {
    !*b
}

impl MeshEdge {
    /// `true` if one side is the exterior.
    pub fn is_exterior(&self) -> bool {
        self.left.is_exterior() || self.right.is_exterior()
    }

    /// `true` if the edge separates `a` and `b`, in either order.
    pub fn separates(&self, a: &Face, b: &Face) -> bool {
        (&self.left == a && &self.right == b) || (&self.left == b && &self.right == a)
    }
}

/// Canonical edges plus the vertices they reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mesh {
    tolerance: f64,
    vertices: Vec<MeshVertex>,
    edges: Vec<MeshEdge>,
}

impl Mesh {
    pub(crate) fn new(tolerance: f64, vertices: Vec<MeshVertex>, edges: Vec<MeshEdge>) -> Self {
        Self {
            tolerance,
            vertices,
            edges,
        }
    }

    /// Tolerance the mesh was built with.
    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    pub fn vertices(&self) -> &[MeshVertex] {
        &self.vertices
    }

    pub fn edges(&self) -> &[MeshEdge] {
        &self.edges
    }

    pub fn vertex(&self, id: usize) -> Option<&MeshVertex> {
        self.vertices.get(id)
    }

    pub fn edge(&self, id: usize) -> Option<&MeshEdge> {
        self.edges.get(id)
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn exterior_edge_count(&self) -> usize {
        self.edges.iter().filter(|e| e.is_exterior()).count()
    }

    /// Coordinates of an edge's vertex chain.
    pub fn edge_coords(&self, edge: &MeshEdge) -> Vec<[f64; 2]> {
        edge.vertices
            .iter()
            .filter_map(|&id| self.vertex(id))
            .map(MeshVertex::coords)
            .collect()
    }

    pub fn edge_length(&self, edge: &MeshEdge) -> f64 {
        let points: Vec<_> = self.edge_coords(edge).into_iter().map(point).collect();
        polyline_length(&points)
    }

    /// Point halfway along the edge.
    pub fn edge_midpoint(&self, edge: &MeshEdge) -> Option<[f64; 2]> {
        let points: Vec<_> = self.edge_coords(edge).into_iter().map(point).collect();
        polyline_midpoint(&points).map(|p| [p.x, p.y])
    }

    /// Summed length of all edges.
    pub fn total_length(&self) -> f64 {
        self.edges.iter().map(|e| self.edge_length(e)).sum()
    }

    /// Length of the border between `a` and `b`.
    ///
    /// ```
    /// use area_mesher_topology::{build, Face, MeshConfig, PolygonFeature};
    ///
    /// let a = PolygonFeature::new("A", vec![[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]]);
    /// let b = PolygonFeature::new("B", vec![[1.0, 0.0], [2.0, 0.0], [2.0, 1.0], [1.0, 1.0]]);
    /// let built = build(&[a, b], &MeshConfig::default()).unwrap();
    ///
    /// let border = built.mesh.shared_length(&"A".into(), &"B".into());
    /// assert!((border - 1.0).abs() < 1e-9);
    /// assert!((built.mesh.shared_length(&"A".into(), &Face::Exterior) - 3.0).abs() < 1e-9);
    /// ```
    pub fn shared_length(&self, a: &Face, b: &Face) -> f64 {
        self.edges
            .iter()
            .filter(|e| e.separates(a, b))
            .map(|e| self.edge_length(e))
            .sum()
    }

    /// Checks the mesh invariants.
    ///
    /// Every edge references existing vertices with no zero-length step, has
    /// at least one polygon side, has equal sides only when tagged as a
    /// hole-in-parent border, and no two segments run along each other
    /// within the tolerance. Vertices are pairwise farther apart than the
    /// tolerance.
    pub fn validate(&self) -> Result<()> {
        let violation = |msg: String| Err(Error::InvariantViolation(msg));

        if !self.tolerance.is_finite() || self.tolerance <= 0.0 {
            return violation(format!("tolerance {} is not positive", self.tolerance));
        }

        let mut grid: VertexGrid<usize> = VertexGrid::new(self.tolerance);
        for (pos, v) in self.vertices.iter().enumerate() {
            if v.id != pos {
                return violation(format!("vertex at position {} has id {}", pos, v.id));
            }
            if !v.x.is_finite() || !v.y.is_finite() {
                return violation(format!("vertex {} is not finite", v.id));
            }
            if let Some(other) = grid.find_near(v.x, v.y, self.tolerance) {
                return violation(format!(
                    "vertices {} and {} lie within tolerance",
                    other, v.id
                ));
            }
            grid.insert(v.id, v.x, v.y);
        }

        let mut segments: FxHashSet<(usize, usize)> = FxHashSet::default();
        for (pos, e) in self.edges.iter().enumerate() {
            if e.id != pos {
                return violation(format!("edge at position {} has id {}", pos, e.id));
            }
            if e.vertices.len() < 2 {
                return violation(format!("edge {} has {} vertices", e.id, e.vertices.len()));
            }
            if let Some(&bad) = e.vertices.iter().find(|&&v| v >= self.vertices.len()) {
                return violation(format!("edge {} references missing vertex {}", e.id, bad));
            }
            if e.left.is_exterior() && e.right.is_exterior() {
                return violation(format!("edge {} has exterior on both sides", e.id));
            }
            if (e.left == e.right) != e.hole_in_parent {
                return violation(format!(
                    "edge {} has left {} and right {} with hole tag {}",
                    e.id, e.left, e.right, e.hole_in_parent
                ));
            }
            for w in e.vertices.windows(2) {
                if w[0] == w[1] {
                    return violation(format!("edge {} repeats vertex {}", e.id, w[0]));
                }
                if !segments.insert((w[0].min(w[1]), w[0].max(w[1]))) {
                    return violation(format!(
                        "segment {}-{} of edge {} is already covered",
                        w[0], w[1], e.id
                    ));
                }
            }
        }

        if let Some((first, second)) = self.overlapping_edges() {
            return violation(format!(
                "edges {} and {} overlap within tolerance",
                first, second
            ));
        }
        Ok(())
    }

    /// First pair of edges with segments running along each other for more
    /// than the tolerance.
    fn overlapping_edges(&self) -> Option<(usize, usize)> {
        let tolerance = self.tolerance;
        let at = |v: usize| point(self.vertices[v].coords());
        let segments: Vec<(usize, Point2<f64>, Point2<f64>)> = self
            .edges
            .iter()
            .flat_map(|e| e.vertices.windows(2).map(move |w| (e.id, at(w[0]), at(w[1]))))
            .collect();

        let tree = RTree::bulk_load(
            segments
                .iter()
                .enumerate()
                .map(|(i, &(_, a, b))| {
                    GeomWithData::new(Rectangle::from_corners([a.x, a.y], [b.x, b.y]), i)
                })
                .collect(),
        );

        for (i, &(edge, a, b)) in segments.iter().enumerate() {
            let search = Bounds::of_segment(a, b).expand(tolerance);
            let envelope = AABB::from_corners(search.min, search.max);
            for hit in tree.locate_in_envelope_intersecting(&envelope) {
                let j = hit.data;
                if j <= i {
                    continue;
                }
                let (other, c, d) = segments[j];
                let covered = collinear_overlap(a, b, c, d, tolerance)
                    .max(collinear_overlap(c, d, a, b, tolerance));
                if covered > tolerance {
                    return Some((edge, other));
                }
            }
        }
        None
    }
}

/// Counters collected while building a mesh.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BuildStats {
    pub polygons: usize,
    /// Summed area of the input polygons, holes excluded.
    pub polygon_area: f64,
    pub rings: usize,
    pub primitive_edges: usize,
    pub sub_edges: usize,
    pub shared_segments: usize,
    pub ignored_duplicates: usize,
}

/// A successful build: the mesh and everything reported along the way.
#[derive(Debug, Clone)]
pub struct MeshBuild {
    pub mesh: Mesh,
    pub warnings: Vec<Warning>,
    pub stats: BuildStats,
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn vertex(id: usize, x: f64, y: f64) -> MeshVertex {
        MeshVertex { id, x, y }
    }

    fn edge(id: usize, vertices: Vec<usize>, left: Face, right: Face) -> MeshEdge {
        MeshEdge {
            id,
            vertices,
            left,
            right,
            hole_in_parent: false,
            polygon: 0,
        }
    }

    fn a() -> Face {
        Face::Polygon("A".into())
    }

    fn b() -> Face {
        Face::Polygon("B".into())
    }

    fn strip() -> Mesh {
        Mesh::new(
            1e-6,
            vec![
                vertex(0, 0.0, 0.0),
                vertex(1, 0.0, 1.0),
                vertex(2, 0.0, 2.0),
                vertex(3, 3.0, 0.0),
            ],
            vec![
                edge(0, vec![0, 1, 2], a(), b()),
                edge(1, vec![0, 3], a(), Face::Exterior),
            ],
        )
    }

    #[test]
    fn lengths() {
        let mesh = strip();
        assert!(mesh.validate().is_ok());
        assert_relative_eq!(mesh.shared_length(&a(), &b()), 2.0);
        assert_relative_eq!(mesh.shared_length(&b(), &a()), 2.0);
        assert_relative_eq!(mesh.total_length(), 5.0);
        assert_eq!(mesh.exterior_edge_count(), 1);
    }

    #[test]
    fn midpoint_and_coords() {
        let mesh = strip();
        let e = mesh.edge(0).unwrap();
        assert_eq!(mesh.edge_coords(e), vec![[0.0, 0.0], [0.0, 1.0], [0.0, 2.0]]);
        assert_eq!(mesh.edge_midpoint(e), Some([0.0, 1.0]));
    }

    #[test]
    fn both_sides_exterior_is_a_violation() {
        let mesh = Mesh::new(
            1e-6,
            vec![vertex(0, 0.0, 0.0), vertex(1, 1.0, 0.0)],
            vec![edge(0, vec![0, 1], Face::Exterior, Face::Exterior)],
        );
        assert!(matches!(mesh.validate(), Err(Error::InvariantViolation(_))));
    }

    #[test]
    fn untagged_self_border_is_a_violation() {
        let mut e = edge(0, vec![0, 1], a(), a());
        let vertices = vec![vertex(0, 0.0, 0.0), vertex(1, 1.0, 0.0)];
        let mesh = Mesh::new(1e-6, vertices.clone(), vec![e.clone()]);
        assert!(mesh.validate().is_err());

        e.hole_in_parent = true;
        let mesh = Mesh::new(1e-6, vertices, vec![e]);
        assert!(mesh.validate().is_ok());
    }

    #[test]
    fn repeated_segment_is_a_violation() {
        let mesh = Mesh::new(
            1e-6,
            vec![vertex(0, 0.0, 0.0), vertex(1, 1.0, 0.0)],
            vec![
                edge(0, vec![0, 1], a(), Face::Exterior),
                edge(1, vec![1, 0], b(), Face::Exterior),
            ],
        );
        assert!(mesh.validate().is_err());
    }

    #[test]
    fn edges_within_tolerance_of_each_other_are_a_violation() {
        // Same border digitised twice, one copy ending 0.9 tolerance off the
        // line: no shared vertex pair, but the geometry coincides.
        let mesh = Mesh::new(
            1e-6,
            vec![
                vertex(0, 1.0, 0.0),
                vertex(1, 1.0, 1.0),
                vertex(2, 1.0 + 9e-7, 9e-7),
            ],
            vec![
                edge(0, vec![0, 1], a(), Face::Exterior),
                edge(1, vec![1, 2], b(), Face::Exterior),
            ],
        );
        match mesh.validate() {
            Err(Error::InvariantViolation(msg)) => assert!(msg.contains("overlap")),
            other => panic!("expected an overlap violation, got {:?}", other),
        }
    }

    #[test]
    fn close_vertices_are_a_violation() {
        let mesh = Mesh::new(
            1e-3,
            vec![vertex(0, 0.0, 0.0), vertex(1, 0.0005, 0.0)],
            vec![edge(0, vec![0, 1], a(), Face::Exterior)],
        );
        assert!(mesh.validate().is_err());
    }

    #[test]
    fn dangling_vertex_reference_is_a_violation() {
        let mesh = Mesh::new(
            1e-6,
            vec![vertex(0, 0.0, 0.0)],
            vec![edge(0, vec![0, 4], a(), Face::Exterior)],
        );
        assert!(mesh.validate().is_err());
    }
}
