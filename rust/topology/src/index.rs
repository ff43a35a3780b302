// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Spatial candidate index over polygon extents.
//!
//! An R-tree of polygon bounding boxes. For a query box it returns every
//! polygon whose box overlaps it; false positives are fine (exact matching
//! filters them later), false negatives are not. Rebuilding with
//! [`CandidateIndex::bulk`] is O(n log n) and queries are O(log n + k).

use std::fmt;

use rstar::{RTree, RTreeObject, AABB};

use crate::feature::PolygonFeature;
use crate::geometry::Bounds;

#[derive(Debug, Clone, PartialEq)]
struct PolygonBox {
    polygon: usize,
    env: AABB<[f64; 2]>,
}

impl RTreeObject for PolygonBox {
    type Envelope = AABB<[f64; 2]>;

    #[inline]
    fn envelope(&self) -> Self::Envelope {
        self.env
    }
}

fn envelope(bounds: &Bounds) -> AABB<[f64; 2]> {
    AABB::from_corners(bounds.min, bounds.max)
}

/// Index from bounding boxes to polygon positions in the build input.
pub struct CandidateIndex {
    tree: RTree<PolygonBox>,
}

impl CandidateIndex {
    pub fn new() -> Self {
        Self { tree: RTree::new() }
    }

    /// Bulk loads `(polygon, bounds)` pairs in one pass.
    pub fn bulk(entries: impl IntoIterator<Item = (usize, Bounds)>) -> Self {
        let boxes: Vec<PolygonBox> = entries
            .into_iter()
            .map(|(polygon, bounds)| PolygonBox {
                polygon,
                env: envelope(&bounds),
            })
            .collect();
        Self {
            tree: RTree::bulk_load(boxes),
        }
    }

    /// Indexes the exterior extent of every feature, grown by `margin`.
    ///
    /// Holes lie inside the exterior, so the exterior box covers every ring.
    pub fn from_features(features: &[PolygonFeature], margin: f64) -> Self {
        Self::bulk(
            features
                .iter()
                .enumerate()
                .filter_map(|(i, f)| f.bounds().map(|b| (i, b.expand(margin)))),
        )
    }

    pub fn insert(&mut self, polygon: usize, bounds: Bounds) {
        self.tree.insert(PolygonBox {
            polygon,
            env: envelope(&bounds),
        });
    }

    /// Polygons whose box overlaps `bounds`, ascending and without repeats.
    pub fn query_overlapping(&self, bounds: &Bounds) -> Vec<usize> {
        let mut hits: Vec<usize> = self
            .tree
            .locate_in_envelope_intersecting(&envelope(bounds))
            .map(|b| b.polygon)
            .collect();
        hits.sort_unstable();
        hits.dedup();
        hits
    }

    pub fn len(&self) -> usize {
        self.tree.size()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }
}

impl Default for CandidateIndex {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for CandidateIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CandidateIndex")
            .field("polygons", &self.tree.size())
            .finish()
    }
}
