// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Load, build and dump in one place.

use std::path::Path;

use area_mesher_topology::{build, Mesh, MeshBuild, MeshConfig};
use tracing::info;

use crate::error::{Error, Result};
use crate::sink;
use crate::source::{self, FeatureLayer};

/// Holds the loaded layer and the last build.
///
/// Several sources may be loaded before building; they must share one
/// coordinate reference system. Loading again discards the previous build.
#[derive(Debug, Default)]
pub struct Mesher {
    config: MeshConfig,
    layer: Option<FeatureLayer>,
    built: Option<MeshBuild>,
}

impl Mesher {
    pub fn new(config: MeshConfig) -> Self {
        Self {
            config,
            layer: None,
            built: None,
        }
    }

    pub fn config(&self) -> &MeshConfig {
        &self.config
    }

    /// Loads `path` and appends it to the current layer.
    ///
    /// A failed load leaves the layer and the last build untouched.
    pub fn load(&mut self, path: impl AsRef<Path>, encoding: &str) -> Result<&FeatureLayer> {
        let loaded = source::load(path, encoding)?;
        match self.layer.as_mut() {
            Some(layer) => layer.extend(loaded)?,
            None => self.layer = Some(loaded),
        }
        self.built = None;
        Ok(self.layer.get_or_insert_with(FeatureLayer::default))
    }

    pub fn layer(&self) -> Option<&FeatureLayer> {
        self.layer.as_ref()
    }

    /// Builds the mesh of everything loaded so far.
    pub fn build(&mut self) -> Result<&MeshBuild> {
        let layer = self.layer.as_ref().ok_or(Error::NothingLoaded)?;
        let features = layer.polygons(&self.config.id_field)?;
        info!(
            sources = layer.sources().len(),
            polygons = features.len(),
            id_field = %self.config.id_field,
            "build_linework start"
        );
        let built = build(&features, &self.config)?;
        Ok(self.built.insert(built))
    }

    pub fn mesh(&self) -> Option<&Mesh> {
        self.built.as_ref().map(|b| &b.mesh)
    }

    /// Writes the last built mesh to `path`.
    pub fn dump(&self, path: impl AsRef<Path>) -> Result<()> {
        let mesh = self.mesh().ok_or(Error::NothingBuilt)?;
        sink::dump(mesh, path)
    }
}
