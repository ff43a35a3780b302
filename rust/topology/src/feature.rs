// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Polygon features, the immutable input of a build.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::geometry::{signed_area, Bounds};
use crate::keys::PolygonId;

/// A polygon with one exterior ring and zero or more holes.
///
/// Rings are closed coordinate sequences (first = last). An unclosed ring is
/// closed implicitly when it is decomposed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolygonFeature {
    pub id: PolygonId,
    pub exterior: Vec<[f64; 2]>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub holes: Vec<Vec<[f64; 2]>>,
}

impl PolygonFeature {
    pub fn new(id: impl Into<PolygonId>, exterior: Vec<[f64; 2]>) -> Self {
        Self {
            id: id.into(),
            exterior,
            holes: Vec::new(),
        }
    }

    /// Adds an interior ring.
    pub fn with_hole(mut self, hole: Vec<[f64; 2]>) -> Self {
        self.holes.push(hole);
        self
    }

    /// Iterates rings in order: exterior first, then holes.
    pub fn rings(&self) -> impl Iterator<Item = (RingRole, &[[f64; 2]])> + '_ {
        std::iter::once((RingRole::Exterior, self.exterior.as_slice()))
            .chain(self.holes.iter().map(|h| (RingRole::Hole, h.as_slice())))
    }

    /// Bounding box of the exterior ring.
    pub fn bounds(&self) -> Option<Bounds> {
        Bounds::from_coords(&self.exterior)
    }

    /// Area of the exterior minus the holes.
    pub fn area(&self) -> f64 {
        let holes: f64 = self.holes.iter().map(|h| signed_area(h).abs()).sum();
        signed_area(&self.exterior).abs() - holes
    }
}

/// Whether a ring bounds a polygon from outside or encloses a hole.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RingRole {
    Exterior,
    Hole,
}

impl fmt::Display for RingRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RingRole::Exterior => "exterior",
            RingRole::Hole => "hole",
        })
    }
}

/// Travel direction of a ring, from the sign of its area.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Winding {
    Clockwise,
    CounterClockwise,
}

impl Winding {
    /// Positive shoelace area is counter-clockwise in a y-up frame.
    pub fn of_signed_area(area: f64) -> Self {
        if area < 0.0 {
            Winding::Clockwise
        } else {
            Winding::CounterClockwise
        }
    }

    /// The winding that keeps the polygon interior on the left of travel.
    pub fn interior_left(role: RingRole) -> Self {
        match role {
            RingRole::Exterior => Winding::CounterClockwise,
            RingRole::Hole => Winding::Clockwise,
        }
    }
}
