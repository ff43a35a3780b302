// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Identifier types shared by every build phase.
//!
//! Vertices live in a slot map and are addressed by [`VertexKey`]; once a
//! coordinate has been snapped into the arena, every ring, sub-edge and
//! canonical edge refers to it by key, never by raw coordinates. Polygon
//! identity is the value read from the designated id field.

use std::fmt;

use serde::{Deserialize, Serialize};
use slotmap::new_key_type;

new_key_type! {
    /// Key for a snapped vertex in the build arena.
    pub struct VertexKey;
}

/// Identifier of a polygon, taken from the designated id attribute.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PolygonId(String);

impl PolygonId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PolygonId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PolygonId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for PolygonId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// What lies on one side of a canonical edge.
///
/// Serializes as the polygon id, or `null` for the exterior sentinel.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "Option<PolygonId>", into = "Option<PolygonId>")]
pub enum Face {
    Exterior,
    Polygon(PolygonId),
}

impl Face {
    pub fn is_exterior(&self) -> bool {
        matches!(self, Face::Exterior)
    }

    /// Returns the polygon id, or `None` for the exterior.
    pub fn polygon(&self) -> Option<&PolygonId> {
        match self {
            Face::Exterior => None,
            Face::Polygon(id) => Some(id),
        }
    }
}

impl From<Option<PolygonId>> for Face {
    fn from(id: Option<PolygonId>) -> Self {
        id.map_or(Face::Exterior, Face::Polygon)
    }
}

impl From<Face> for Option<PolygonId> {
    fn from(face: Face) -> Self {
        match face {
            Face::Exterior => None,
            Face::Polygon(id) => Some(id),
        }
    }
}

impl From<PolygonId> for Face {
    fn from(id: PolygonId) -> Self {
        Face::Polygon(id)
    }
}

impl From<&str> for Face {
    fn from(id: &str) -> Self {
        Face::Polygon(id.into())
    }
}

impl fmt::Display for Face {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Face::Exterior => f.write_str("<exterior>"),
            Face::Polygon(id) => id.fmt(f),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exterior_sorts_first() {
        let a = Face::Polygon(PolygonId::from("A"));
        assert!(Face::Exterior < a);
        assert!(Face::Polygon(PolygonId::from("A")) < Face::Polygon(PolygonId::from("B")));
    }

    #[test]
    fn face_option_conversions() {
        let face: Face = Some(PolygonId::from("0214")).into();
        assert_eq!(face.polygon().map(PolygonId::as_str), Some("0214"));

        let exterior: Face = None.into();
        assert!(exterior.is_exterior());
        assert_eq!(Option::<PolygonId>::from(exterior), None);
    }

    #[test]
    fn display_names() {
        assert_eq!(Face::Exterior.to_string(), "<exterior>");
        assert_eq!(Face::from(PolygonId::new("Harju")).to_string(), "Harju");
    }
}
