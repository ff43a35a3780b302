// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! # Area Mesher Topology
//!
//! Builds a line mesh from adjacent polygons: every shared boundary becomes
//! exactly one edge, attributed with the polygon on its left and on its
//! right, or the exterior where only one side has a polygon.
//!
//! Vertices live in a slot-map arena and are snapped on a tolerance grid, so
//! coordinates closer than the build tolerance share one key. Rings are
//! decomposed into directed edges with the interior on the left, split at
//! neighbour vertices, and paired with their reversed twins. The merger
//! deduplicates and joins collinear runs; the assembler assigns ids and
//! validates the result.
//!
//! ```
//! use area_mesher_topology::{build, MeshConfig, PolygonFeature};
//!
//! let a = PolygonFeature::new("A", vec![[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0], [0.0, 0.0]]);
//! let b = PolygonFeature::new("B", vec![[1.0, 0.0], [2.0, 0.0], [2.0, 1.0], [1.0, 1.0], [1.0, 0.0]]);
//!
//! let built = build(&[a, b], &MeshConfig::default()).unwrap();
//! assert_eq!(built.mesh.edge_count(), 7);
//! assert_eq!(built.mesh.exterior_edge_count(), 6);
//! ```

pub mod arena;
pub mod assembler;
pub mod config;
pub mod decompose;
pub mod error;
pub mod feature;
pub mod geometry;
pub mod index;
pub mod keys;
pub mod matcher;
pub mod merger;
pub mod mesh;
pub mod pipeline;
pub mod spatial;

pub use arena::{VertexArena, VertexData};
pub use assembler::assemble_mesh;
pub use config::MeshConfig;
pub use decompose::{decompose, DecomposedRing, PrimitiveEdge};
pub use error::{Error, Result, Warning};
pub use feature::{PolygonFeature, RingRole, Winding};
pub use geometry::Bounds;
pub use index::CandidateIndex;
pub use keys::{Face, PolygonId, VertexKey};
pub use matcher::{match_segments, EdgeCandidate, MatchOutcome, Pairing};
pub use merger::{merge_topology, MergeOutcome, MergedEdge};
pub use mesh::{BuildStats, Mesh, MeshBuild, MeshEdge, MeshVertex};
pub use pipeline::build;
pub use spatial::VertexGrid;
