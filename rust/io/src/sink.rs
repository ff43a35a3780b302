// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Line-mesh dumps.
//!
//! A dump is a GeoJSON `FeatureCollection` with one `LineString` feature
//! per canonical edge. Properties: `id`, `hash`, `left`, `right`,
//! `polygon`, and `hole` on hole-in-parent edges. The exterior is written
//! as `null`. Coordinates are written at full precision, so reloading a
//! dump reproduces the mesh exactly.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use area_mesher_topology::{Face, Mesh, MeshEdge, PolygonId};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use tracing::info;

use crate::error::{Error, Result};

/// An edge read back from a dump.
#[derive(Debug, Clone, PartialEq)]
pub struct DumpedEdge {
    pub id: usize,
    pub hash: String,
    pub coords: Vec<[f64; 2]>,
    pub left: Face,
    pub right: Face,
    pub hole_in_parent: bool,
    pub polygon: usize,
}

#[derive(Serialize, Deserialize)]
struct LineCollection {
    #[serde(rename = "type")]
    kind: String,
    features: Vec<LineFeature>,
}

#[derive(Serialize, Deserialize)]
struct LineFeature {
    #[serde(rename = "type")]
    kind: String,
    id: String,
    geometry: LineGeometry,
    properties: EdgeProperties,
}

#[derive(Serialize, Deserialize)]
struct LineGeometry {
    #[serde(rename = "type")]
    kind: String,
    coordinates: Vec<[f64; 2]>,
}

#[derive(Serialize, Deserialize)]
struct EdgeProperties {
    id: usize,
    hash: String,
    left: Option<PolygonId>,
    right: Option<PolygonId>,
    polygon: usize,
    #[serde(default, skip_serializing_if = "is_false")]
    hole: bool,
}

fn is_false(b: &bool) -> bool {
    !*b
}

/// Digest of the point halfway along `edge`.
///
/// Hex SHA-256 of the point's WKT, so identical meshes give identical
/// hashes on every run.
pub fn edge_hash(mesh: &Mesh, edge: &MeshEdge) -> String {
    let [x, y] = mesh.edge_midpoint(edge).unwrap_or([f64::NAN; 2]);
    let mut hasher = Sha256::new();
    hasher.update(format!("POINT ({} {})", x, y).as_bytes());
    hex::encode(hasher.finalize())
}

fn collection(mesh: &Mesh) -> LineCollection {
    let features = mesh
        .edges()
        .iter()
        .map(|edge| {
            let hash = edge_hash(mesh, edge);
            LineFeature {
                kind: "Feature".to_string(),
                id: hash.clone(),
                geometry: LineGeometry {
                    kind: "LineString".to_string(),
                    coordinates: mesh.edge_coords(edge),
                },
                properties: EdgeProperties {
                    id: edge.id,
                    hash,
                    left: edge.left.polygon().cloned(),
                    right: edge.right.polygon().cloned(),
                    polygon: edge.polygon,
                    hole: edge.hole_in_parent,
                },
            }
        })
        .collect();

    LineCollection {
        kind: "FeatureCollection".to_string(),
        features,
    }
}

/// The mesh as a GeoJSON value.
pub fn to_geojson(mesh: &Mesh) -> Result<Value> {
    serde_json::to_value(collection(mesh)).map_err(|e| Error::Serialization(e.to_string()))
}

/// Writes the mesh to `path`, replacing any existing file.
pub fn dump(mesh: &Mesh, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let write_err = |source| Error::Write {
        path: path.to_path_buf(),
        source,
    };

    let file = File::create(path).map_err(write_err)?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer(&mut writer, &collection(mesh))
        .map_err(|e| Error::Serialization(e.to_string()))?;
    writer.flush().map_err(write_err)?;

    info!(
        path = %path.display(),
        edges = mesh.edge_count(),
        "mesh dumped"
    );
    Ok(())
}

/// Reads a dump written by [`dump`].
pub fn reload(path: impl AsRef<Path>) -> Result<Vec<DumpedEdge>> {
    let path = path.as_ref();
    let text = fs::read_to_string(path).map_err(|e| Error::unreadable(path, e))?;
    let collection: LineCollection =
        serde_json::from_str(&text).map_err(|e| Error::unreadable(path, e))?;

    Ok(collection
        .features
        .into_iter()
        .map(|f| DumpedEdge {
            id: f.properties.id,
            hash: f.properties.hash,
            coords: f.geometry.coordinates,
            left: f.properties.left.into(),
            right: f.properties.right.into(),
            hole_in_parent: f.properties.hole,
            polygon: f.properties.polygon,
        })
        .collect())
}

/// Checks that `dumped` holds the same edges as `mesh`: equal faces and
/// coordinates within the mesh tolerance.
pub fn verify(mesh: &Mesh, dumped: &[DumpedEdge]) -> Result<()> {
    if dumped.len() != mesh.edge_count() {
        return Err(Error::DumpMismatch(format!(
            "{} edges dumped, mesh has {}",
            dumped.len(),
            mesh.edge_count()
        )));
    }

    let tolerance = mesh.tolerance();
    for d in dumped {
        let edge = mesh
            .edge(d.id)
            .ok_or_else(|| Error::DumpMismatch(format!("edge {} is not in the mesh", d.id)))?;

        if d.left != edge.left || d.right != edge.right || d.hole_in_parent != edge.hole_in_parent
        {
            return Err(Error::DumpMismatch(format!(
                "edge {} faces {}|{} differ from {}|{}",
                d.id, d.left, d.right, edge.left, edge.right
            )));
        }

        let coords = mesh.edge_coords(edge);
        let same_shape = coords.len() == d.coords.len()
            && coords
                .iter()
                .zip(&d.coords)
                .all(|(a, b)| (a[0] - b[0]).hypot(a[1] - b[1]) <= tolerance);
        if !same_shape {
            return Err(Error::DumpMismatch(format!(
                "edge {} geometry differs",
                d.id
            )));
        }
    }
    Ok(())
}
