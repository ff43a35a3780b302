// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The build pipeline.
//!
//! Decompose, index, match, merge, assemble. Each phase consumes the output
//! of the previous one; any error drops everything built so far.

use tracing::{debug, info};

use crate::arena::VertexArena;
use crate::assembler::assemble_mesh;
use crate::config::MeshConfig;
use crate::decompose::decompose;
use crate::error::Result;
use crate::feature::PolygonFeature;
use crate::index::CandidateIndex;
use crate::matcher::match_segments;
use crate::merger::merge_topology;
use crate::mesh::{BuildStats, MeshBuild};
use crate::spatial::VertexGrid;

/// Builds the line mesh of `features`.
///
/// Features are borrowed for the duration of the build and never modified.
/// Feature order decides vertex and edge ids and breaks no other ties, so the
/// same input always yields the same mesh.
pub fn build(features: &[PolygonFeature], config: &MeshConfig) -> Result<MeshBuild> {
    config.validate()?;
    info!(
        polygons = features.len(),
        tolerance = config.tolerance,
        "building mesh"
    );

    let mut arena = VertexArena::new();
    let mut grid = VertexGrid::new(config.tolerance);
    let mut rings = Vec::new();
    for (i, feature) in features.iter().enumerate() {
        rings.extend(decompose(feature, i, &mut arena, &mut grid, config.tolerance)?);
    }
    debug!(
        rings = rings.len(),
        vertices = arena.vertex_count(),
        "rings decomposed"
    );

    let index = CandidateIndex::from_features(features, config.tolerance);
    let matched = match_segments(features, &rings, &arena, &index, config.tolerance);
    let merged = merge_topology(matched.candidates, &arena, config)?;

    let stats = BuildStats {
        polygons: features.len(),
        polygon_area: features.iter().map(PolygonFeature::area).sum(),
        rings: rings.len(),
        primitive_edges: matched.primitive_edges,
        sub_edges: matched.sub_edges,
        shared_segments: matched.shared,
        ignored_duplicates: merged.ignored_duplicates,
    };
    let mesh = assemble_mesh(merged.edges, &arena, config)?;

    info!(
        vertices = mesh.vertex_count(),
        edges = mesh.edge_count(),
        warnings = matched.warnings.len(),
        "mesh built"
    );

    Ok(MeshBuild {
        mesh,
        warnings: matched.warnings,
        stats,
    })
}
