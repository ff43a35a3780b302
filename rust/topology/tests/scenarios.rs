// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use approx::assert_relative_eq;
use area_mesher_topology::{build, Error, Face, MeshBuild, MeshConfig, PolygonFeature, Warning};

fn rect(x0: f64, y0: f64, x1: f64, y1: f64) -> Vec<[f64; 2]> {
    vec![[x0, y0], [x1, y0], [x1, y1], [x0, y1], [x0, y0]]
}

fn unit(x0: f64, y0: f64) -> Vec<[f64; 2]> {
    rect(x0, y0, x0 + 1.0, y0 + 1.0)
}

fn face(id: &str) -> Face {
    Face::from(id)
}

fn build_default(features: &[PolygonFeature]) -> MeshBuild {
    build(features, &MeshConfig::default()).expect("build should succeed")
}

fn shared_edges(built: &MeshBuild) -> usize {
    built.mesh.edges().iter().filter(|e| !e.is_exterior()).count()
}

#[test]
fn two_squares_share_one_edge() {
    let built = build_default(&[
        PolygonFeature::new("A", unit(0.0, 0.0)),
        PolygonFeature::new("B", unit(1.0, 0.0)),
    ]);
    let mesh = &built.mesh;

    assert_eq!(mesh.edge_count(), 7);
    assert_eq!(mesh.exterior_edge_count(), 6);
    let shared: Vec<_> = mesh.edges().iter().filter(|e| !e.is_exterior()).collect();
    assert_eq!(shared.len(), 1);
    assert!(shared[0].separates(&face("A"), &face("B")));
    assert_relative_eq!(mesh.shared_length(&face("A"), &face("B")), 1.0);
    assert!(built.warnings.is_empty());
}

#[test]
fn single_square_is_all_exterior() {
    let built = build_default(&[PolygonFeature::new("A", unit(0.0, 0.0))]);

    assert_eq!(built.mesh.edge_count(), 4);
    assert_eq!(built.mesh.vertex_count(), 4);
    for e in built.mesh.edges() {
        assert_eq!(e.left, face("A"));
        assert!(e.right.is_exterior());
    }
}

#[test]
fn polygons_meeting_at_a_point_share_nothing() {
    let built = build_default(&[
        PolygonFeature::new("A", unit(0.0, 0.0)),
        PolygonFeature::new("B", unit(-1.0, -1.0)),
        PolygonFeature::new("C", vec![[0.0, 0.0], [1.0, -2.0], [1.5, -1.0], [0.0, 0.0]]),
    ]);

    assert_eq!(shared_edges(&built), 0);
    assert_eq!(built.mesh.edge_count(), 11);
    assert_eq!(built.stats.shared_segments, 0);
}

#[test]
fn island_filling_a_hole_is_attributed_outer_left() {
    let built = build_default(&[
        PolygonFeature::new("outer", rect(0.0, 0.0, 10.0, 10.0)).with_hole(rect(3.0, 3.0, 7.0, 7.0)),
        PolygonFeature::new("inner", rect(3.0, 3.0, 7.0, 7.0)),
    ]);
    let mesh = &built.mesh;

    assert_eq!(mesh.edge_count(), 8);
    let border: Vec<_> = mesh.edges().iter().filter(|e| !e.is_exterior()).collect();
    assert_eq!(border.len(), 4);
    for e in border {
        assert_eq!(e.left, face("outer"));
        assert_eq!(e.right, face("inner"));
    }
    assert_relative_eq!(mesh.shared_length(&face("outer"), &face("inner")), 16.0);
}

#[test]
fn finer_neighbour_is_matched_piecewise() {
    let b = vec![[1.0, 0.0], [2.0, 0.0], [2.0, 1.0], [1.0, 1.0], [1.0, 0.5], [1.0, 0.0]];
    let features = [
        PolygonFeature::new("A", unit(0.0, 0.0)),
        PolygonFeature::new("B", b),
    ];

    let merged = build_default(&features);
    assert_eq!(merged.mesh.edge_count(), 7);
    assert_relative_eq!(merged.mesh.shared_length(&face("A"), &face("B")), 1.0);

    let config = MeshConfig::default().with_merge_collinear(false);
    let split = build(&features, &config).unwrap();
    assert_eq!(split.mesh.edge_count(), 8);
    assert_relative_eq!(split.mesh.shared_length(&face("A"), &face("B")), 1.0);
}

#[test]
fn staggered_neighbours_share_only_the_overlap() {
    let built = build_default(&[
        PolygonFeature::new("A", rect(0.0, 0.0, 1.0, 2.0)),
        PolygonFeature::new("B", rect(1.0, 1.0, 2.0, 3.0)),
    ]);
    assert_relative_eq!(built.mesh.shared_length(&face("A"), &face("B")), 1.0);
    assert_relative_eq!(built.mesh.total_length(), 6.0 + 6.0 - 1.0);
}

#[test]
fn grid_of_squares_covers_every_boundary_once() {
    let mut features = Vec::new();
    for row in 0..3 {
        for col in 0..3 {
            let id = format!("{}{}", row, col);
            features.push(PolygonFeature::new(id, unit(col as f64, row as f64)));
        }
    }
    let built = build_default(&features);
    let mesh = &built.mesh;

    assert_eq!(mesh.edge_count(), 24);
    assert_eq!(mesh.exterior_edge_count(), 12);
    assert_eq!(mesh.vertex_count(), 16);
    assert_relative_eq!(mesh.total_length(), 24.0);
    assert_relative_eq!(mesh.shared_length(&face("11"), &face("12")), 1.0);
    assert_relative_eq!(mesh.shared_length(&face("00"), &face("11")), 0.0);
}

#[test]
fn winding_of_the_input_does_not_matter() {
    let cw: Vec<[f64; 2]> = unit(1.0, 0.0).into_iter().rev().collect();
    let a = build_default(&[
        PolygonFeature::new("A", unit(0.0, 0.0)),
        PolygonFeature::new("B", unit(1.0, 0.0)),
    ]);
    let b = build_default(&[
        PolygonFeature::new("A", unit(0.0, 0.0)),
        PolygonFeature::new("B", cw),
    ]);
    assert_eq!(a.mesh.edge_count(), b.mesh.edge_count());
    assert_relative_eq!(b.mesh.shared_length(&face("A"), &face("B")), 1.0);
}

#[test]
fn near_coincident_border_snaps_within_tolerance() {
    let mut b = unit(1.0, 0.0);
    b[0] = [1.0 + 4e-7, 0.0];
    b[3] = [1.0 - 3e-7, 1.0];
    b[4] = b[0];
    let built = build_default(&[PolygonFeature::new("A", unit(0.0, 0.0)), PolygonFeature::new("B", b)]);

    assert_eq!(built.mesh.edge_count(), 7);
    assert_eq!(shared_edges(&built), 1);
}

#[test]
fn offset_corner_within_tolerance_still_shares_the_border() {
    // B's corner is 0.9 tolerance off A's on both axes: more than the
    // tolerance away from A's corner, so it does not snap.
    let tolerance = MeshConfig::default().tolerance;
    let off = 0.9 * tolerance;
    let mut b = unit(1.0, 0.0);
    b[0] = [1.0 + off, off];
    b[4] = b[0];
    let built = build_default(&[PolygonFeature::new("A", unit(0.0, 0.0)), PolygonFeature::new("B", b)]);
    let mesh = &built.mesh;

    assert_eq!(shared_edges(&built), 1);
    assert_relative_eq!(
        mesh.shared_length(&face("A"), &face("B")),
        1.0,
        epsilon = tolerance
    );
    // The only other border along x = 1 is A's stub between the corners.
    let stub: Vec<_> = mesh
        .edges()
        .iter()
        .filter(|e| e.is_exterior() && mesh.edge_length(e) < 2.0 * tolerance)
        .collect();
    assert_eq!(stub.len(), 1);
    assert_eq!(stub[0].left, face("A"));
    assert!(mesh.validate().is_ok());
}

#[test]
fn near_parallel_borders_never_survive_as_separate_edges() {
    // A's right side and B's left side run within tolerance of each other
    // without sharing any vertex. They must come out as one shared edge.
    let tolerance = MeshConfig::default().tolerance;
    let off = 0.9 * tolerance;
    let b = vec![[1.0 + off, 0.5], [2.0, 0.5], [2.0, 1.5], [1.0 + off, 1.5], [1.0 + off, 0.5]];
    let a = rect(0.0, 0.0, 1.0, 2.0);
    let built = build_default(&[PolygonFeature::new("A", a), PolygonFeature::new("B", b)]);

    assert_relative_eq!(
        built.mesh.shared_length(&face("A"), &face("B")),
        1.0,
        epsilon = tolerance
    );
    assert!(built.mesh.validate().is_ok());
}

#[test]
fn equal_candidates_resolve_by_id_and_warn() {
    let built = build_default(&[
        PolygonFeature::new("A", unit(0.0, 0.0)),
        PolygonFeature::new("C", unit(1.0, 0.0)),
        PolygonFeature::new("B", unit(1.0, 0.0)),
    ]);

    assert_eq!(built.mesh.edge_count(), 7);
    assert_eq!(built.stats.ignored_duplicates, 4);
    assert_relative_eq!(built.mesh.shared_length(&face("A"), &face("B")), 1.0);
    assert_relative_eq!(built.mesh.shared_length(&face("A"), &face("C")), 0.0);

    assert_eq!(built.warnings.len(), 1);
    let Warning::TopologyAmbiguity { chosen, tied, .. } = &built.warnings[0];
    assert_eq!(chosen.as_str(), "B");
    assert_eq!(tied.len(), 2);
}

#[test]
fn parts_of_one_polygon_touching_is_self_adjacency() {
    let result = build(
        &[
            PolygonFeature::new("P", unit(0.0, 0.0)),
            PolygonFeature::new("P", unit(1.0, 0.0)),
        ],
        &MeshConfig::default(),
    );
    match result {
        Err(Error::SelfAdjacency { polygon, .. }) => assert_eq!(polygon.as_str(), "P"),
        other => panic!("expected self adjacency, got {:?}", other.map(|b| b.mesh)),
    }
}

#[test]
fn island_of_the_same_polygon_is_tagged() {
    let built = build_default(&[
        PolygonFeature::new("P", rect(0.0, 0.0, 10.0, 10.0)).with_hole(rect(3.0, 3.0, 7.0, 7.0)),
        PolygonFeature::new("P", rect(3.0, 3.0, 7.0, 7.0)),
    ]);

    let tagged: Vec<_> = built.mesh.edges().iter().filter(|e| e.hole_in_parent).collect();
    assert_eq!(tagged.len(), 4);
    assert!(tagged.iter().all(|e| e.left == face("P") && e.right == face("P")));
    // The hole is subtracted from the outer part and filled by the island.
    assert_relative_eq!(built.stats.polygon_area, 100.0);
}

#[test]
fn degenerate_ring_aborts_the_build() {
    let result = build(
        &[
            PolygonFeature::new("A", unit(0.0, 0.0)),
            PolygonFeature::new("flat", vec![[5.0, 5.0], [6.0, 5.0], [7.0, 5.0], [5.0, 5.0]]),
        ],
        &MeshConfig::default(),
    );
    match result {
        Err(Error::DegenerateGeometry { polygon, ring, .. }) => {
            assert_eq!(polygon.as_str(), "flat");
            assert_eq!(ring, 0);
        }
        other => panic!("expected degenerate geometry, got {:?}", other.map(|b| b.mesh)),
    }
}

#[test]
fn repeated_builds_are_identical() {
    let features = vec![
        PolygonFeature::new("A", rect(0.0, 0.0, 2.0, 1.0)),
        PolygonFeature::new("B", rect(2.0, 0.0, 3.0, 2.0)),
        PolygonFeature::new("C", rect(0.0, 1.0, 2.0, 2.0)),
    ];
    let first = build_default(&features);
    let second = build_default(&features);

    assert_eq!(first.mesh, second.mesh);
    assert_eq!(first.stats, second.stats);
}

#[test]
fn every_exterior_primitive_edge_is_covered_once() {
    let features = vec![
        PolygonFeature::new("A", rect(0.0, 0.0, 2.0, 1.0)),
        PolygonFeature::new("B", rect(2.0, 0.0, 3.0, 2.0)),
        PolygonFeature::new("C", rect(0.0, 1.0, 2.0, 2.0)),
    ];
    let built = build_default(&features);

    let perimeters: f64 = features
        .iter()
        .map(|f| f.exterior.windows(2).map(|w| (w[1][0] - w[0][0]).hypot(w[1][1] - w[0][1])).sum::<f64>())
        .sum();
    let shared: f64 = built
        .mesh
        .edges()
        .iter()
        .filter(|e| !e.is_exterior())
        .map(|e| built.mesh.edge_length(e))
        .sum();
    // Each shared stretch is walked by two rings but stored once.
    assert_relative_eq!(built.mesh.total_length(), perimeters - shared, epsilon = 1e-9);
    assert_relative_eq!(built.mesh.shared_length(&face("A"), &face("B")), 1.0);
    assert_relative_eq!(built.mesh.shared_length(&face("C"), &face("B")), 1.0);
    assert_relative_eq!(built.mesh.shared_length(&face("A"), &face("C")), 2.0);
}
