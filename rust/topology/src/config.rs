// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Build configuration.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Default coincidence tolerance, in source units.
pub const DEFAULT_TOLERANCE: f64 = 1e-6;

/// Default attribute used as polygon id.
pub const DEFAULT_ID_FIELD: &str = "id";

/// Options recognised by a mesh build.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MeshConfig {
    /// Distance below which two vertices are the same location.
    pub tolerance: f64,
    /// Join runs of collinear edges with the same faces into one edge.
    pub merge_collinear: bool,
    /// Attribute read as the polygon identifier.
    pub id_field: String,
}

impl Default for MeshConfig {
    fn default() -> Self {
        Self {
            tolerance: DEFAULT_TOLERANCE,
            merge_collinear: true,
            id_field: DEFAULT_ID_FIELD.to_string(),
        }
    }
}

impl MeshConfig {
    pub fn new(id_field: impl Into<String>) -> Self {
        Self {
            id_field: id_field.into(),
            ..Self::default()
        }
    }

    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    pub fn with_merge_collinear(mut self, merge: bool) -> Self {
        self.merge_collinear = merge;
        self
    }

    /// Load configuration from environment variables.
    ///
    /// Reads `AREA_MESHER_TOLERANCE`, `AREA_MESHER_MERGE_COLLINEAR` and
    /// `AREA_MESHER_ID_FIELD`; absent or unparsable values keep the default.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            tolerance: std::env::var("AREA_MESHER_TOLERANCE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.tolerance),
            merge_collinear: std::env::var("AREA_MESHER_MERGE_COLLINEAR")
                .ok()
                .and_then(|v| parse_flag(&v))
                .unwrap_or(defaults.merge_collinear),
            id_field: std::env::var("AREA_MESHER_ID_FIELD")
                .ok()
                .filter(|v| !v.trim().is_empty())
                .unwrap_or(defaults.id_field),
        }
    }

    /// Rejects settings no build can run with.
    pub fn validate(&self) -> Result<()> {
        if !self.tolerance.is_finite() || self.tolerance <= 0.0 {
            return Err(Error::InvalidConfig(format!(
                "tolerance must be a positive finite number, got {}",
                self.tolerance
            )));
        }
        if self.id_field.trim().is_empty() {
            return Err(Error::InvalidConfig("id field name is empty".to_string()));
        }
        Ok(())
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = MeshConfig::default();
        assert_eq!(config.tolerance, DEFAULT_TOLERANCE);
        assert!(config.merge_collinear);
        assert_eq!(config.id_field, "id");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn builder_setters() {
        let config = MeshConfig::new("OKOOD")
            .with_tolerance(0.01)
            .with_merge_collinear(false);
        assert_eq!(config.id_field, "OKOOD");
        assert_eq!(config.tolerance, 0.01);
        assert!(!config.merge_collinear);
    }

    #[test]
    fn validate_rejects_bad_tolerance() {
        assert!(MeshConfig::default().with_tolerance(0.0).validate().is_err());
        assert!(MeshConfig::default().with_tolerance(-1.0).validate().is_err());
        assert!(MeshConfig::default()
            .with_tolerance(f64::NAN)
            .validate()
            .is_err());
    }

    #[test]
    fn validate_rejects_empty_field() {
        assert!(MeshConfig::new("  ").validate().is_err());
    }

    #[test]
    fn flag_parsing() {
        assert_eq!(parse_flag("TRUE"), Some(true));
        assert_eq!(parse_flag(" off "), Some(false));
        assert_eq!(parse_flag("maybe"), None);
    }
}
