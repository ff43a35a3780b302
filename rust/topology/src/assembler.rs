// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Mesh assembly: arena keys to sequential ids, then validation.

use rustc_hash::FxHashMap;
use tracing::debug;

use crate::arena::VertexArena;
use crate::config::MeshConfig;
use crate::error::{Error, Result};
use crate::keys::VertexKey;
use crate::merger::MergedEdge;
use crate::mesh::{Mesh, MeshEdge, MeshVertex};

/// Assigns vertex ids in order of first use and validates the result.
///
/// Vertices no edge references are left out. Edge ids follow the order of
/// `edges`, so identical input yields identical ids.
pub fn assemble_mesh(
    edges: Vec<MergedEdge>,
    arena: &VertexArena,
    config: &MeshConfig,
) -> Result<Mesh> {
    let mut ids: FxHashMap<VertexKey, usize> = FxHashMap::default();
    let mut vertices: Vec<MeshVertex> = Vec::new();
    let mut mesh_edges = Vec::with_capacity(edges.len());

    for (id, edge) in edges.into_iter().enumerate() {
        let mut chain = Vec::with_capacity(edge.vertices.len());
        for key in edge.vertices {
            let vid = match ids.get(&key) {
                Some(&vid) => vid,
                None => {
                    let [x, y] = arena.vertex_coords(key).ok_or_else(|| {
                        Error::InvariantViolation(format!(
                            "edge {} references a vertex outside the arena",
                            id
                        ))
                    })?;
                    let vid = vertices.len();
                    vertices.push(MeshVertex { id: vid, x, y });
                    ids.insert(key, vid);
                    vid
                }
            };
            chain.push(vid);
        }
        mesh_edges.push(MeshEdge {
            id,
            vertices: chain,
            left: edge.left,
            right: edge.right,
            hole_in_parent: edge.hole_in_parent,
            polygon: edge.polygon,
        });
    }

    let mesh = Mesh::new(config.tolerance, vertices, mesh_edges);
    mesh.validate()?;

    debug!(
        vertices = mesh.vertex_count(),
        edges = mesh.edge_count(),
        "mesh assembled"
    );
    Ok(mesh)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::Face;

    fn merged(vertices: Vec<VertexKey>, left: &str, right: Face) -> MergedEdge {
        MergedEdge {
            vertices,
            left: left.into(),
            right,
            hole_in_parent: false,
            polygon: 0,
        }
    }

    #[test]
    fn ids_follow_first_use() {
        let mut arena = VertexArena::new();
        let unused = arena.add_vertex(9.0, 9.0);
        let a = arena.add_vertex(0.0, 0.0);
        let b = arena.add_vertex(1.0, 0.0);
        let c = arena.add_vertex(1.0, 1.0);
        assert_ne!(unused, a);

        let mesh = assemble_mesh(
            vec![
                merged(vec![b, c], "A", Face::Exterior),
                merged(vec![a, b], "A", "B".into()),
            ],
            &arena,
            &MeshConfig::default(),
        )
        .unwrap();

        assert_eq!(mesh.vertex_count(), 3);
        assert_eq!(mesh.vertices()[0].coords(), [1.0, 0.0]);
        assert_eq!(mesh.edges()[0].vertices, vec![0, 1]);
        assert_eq!(mesh.edges()[1].vertices, vec![2, 0]);
        assert_eq!(mesh.edges()[1].id, 1);
    }

    #[test]
    fn invalid_edges_abort_assembly() {
        let mut arena = VertexArena::new();
        let a = arena.add_vertex(0.0, 0.0);
        let b = arena.add_vertex(1.0, 0.0);

        let result = assemble_mesh(
            vec![
                merged(vec![a, b], "A", Face::Exterior),
                merged(vec![b, a], "B", Face::Exterior),
            ],
            &arena,
            &MeshConfig::default(),
        );
        assert!(matches!(result, Err(Error::InvariantViolation(_))));
    }
}
