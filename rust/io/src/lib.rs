// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! # Area Mesher I/O
//!
//! Reads polygon layers from GeoJSON in a declared text encoding and writes
//! built meshes back out as GeoJSON line features with `left`/`right`
//! attribution.

pub mod error;
pub mod mesher;
pub mod sink;
pub mod source;

pub use error::{Error, Result};
pub use mesher::Mesher;
pub use sink::{dump, edge_hash, reload, to_geojson, verify, DumpedEdge};
pub use source::{decode, load, AttrValue, FeatureLayer, FieldAccessor, SourceRecord};
