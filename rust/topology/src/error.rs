// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error and warning types for mesh builds.
//!
//! Every [`Error`] aborts the whole build: no partial mesh is returned.
//! [`Warning`]s are recoverable and travel next to a successful mesh.

use std::fmt;

use serde::Serialize;

use crate::feature::RingRole;
use crate::keys::PolygonId;

/// Result type alias for mesh build operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that abort a build.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A ring has too few vertices or encloses no area.
    #[error("degenerate {role} ring {ring} of polygon {polygon}: {reason}")]
    DegenerateGeometry {
        polygon: PolygonId,
        ring: usize,
        role: RingRole,
        reason: String,
    },

    /// A polygon borders itself across a boundary that is not a hole.
    #[error("polygon {polygon} borders itself at ({:.6}, {:.6})-({:.6}, {:.6})", at[0][0], at[0][1], at[1][0], at[1][1])]
    SelfAdjacency { polygon: PolygonId, at: [[f64; 2]; 2] },

    /// The assembled mesh breaks a global invariant.
    #[error("mesh invariant violated: {0}")]
    InvariantViolation(String),

    /// The build configuration is unusable.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Recoverable conditions reported alongside a successful build.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Warning {
    /// Several neighbour edges matched a boundary segment equally well; the
    /// segment was paired with `chosen` by the polygon id tie-break.
    TopologyAmbiguity {
        polygon: PolygonId,
        segment: [[f64; 2]; 2],
        chosen: PolygonId,
        tied: Vec<PolygonId>,
    },
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Warning::TopologyAmbiguity {
                polygon,
                segment,
                chosen,
                tied,
            } => {
                let tied: Vec<&str> = tied.iter().map(PolygonId::as_str).collect();
                write!(
                    f,
                    "ambiguous neighbour for polygon {} at ({}, {})-({}, {}): chose {} among [{}]",
                    polygon,
                    segment[0][0],
                    segment[0][1],
                    segment[1][0],
                    segment[1][1],
                    chosen,
                    tied.join(", ")
                )
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn degenerate_message_names_ring() {
        let err = Error::DegenerateGeometry {
            polygon: PolygonId::from("0214"),
            ring: 1,
            role: RingRole::Hole,
            reason: "zero signed area".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "degenerate hole ring 1 of polygon 0214: zero signed area"
        );
    }

    #[test]
    fn ambiguity_display_lists_candidates() {
        let warning = Warning::TopologyAmbiguity {
            polygon: PolygonId::from("A"),
            segment: [[0.0, 0.0], [0.0, 1.0]],
            chosen: PolygonId::from("B"),
            tied: vec![PolygonId::from("B"), PolygonId::from("C")],
        };
        let text = warning.to_string();
        assert!(text.contains("chose B"));
        assert!(text.contains("[B, C]"));
    }
}
