// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Polygon sources.
//!
//! A source is a GeoJSON `FeatureCollection` of `Polygon` and
//! `MultiPolygon` features, stored in a declared text encoding. Attributes
//! are kept positionally: every record holds one value per layer field, and
//! a field is resolved to its position once through [`FeatureLayer::field`].

use std::borrow::Cow;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use area_mesher_topology::{PolygonFeature, PolygonId};
use encoding_rs::Encoding;
use rustc_hash::FxHashMap;
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::error::{Error, Result};

/// A closed coordinate ring.
pub type Ring = Vec<[f64; 2]>;

/// One attribute value.
#[derive(Debug, Clone, PartialEq)]
pub enum AttrValue {
    Null,
    Bool(bool),
    Number(serde_json::Number),
    Text(String),
}

static NULL: AttrValue = AttrValue::Null;

impl AttrValue {
    fn from_json(value: Value) -> Self {
        match value {
            Value::Null => AttrValue::Null,
            Value::Bool(b) => AttrValue::Bool(b),
            Value::Number(n) => AttrValue::Number(n),
            Value::String(s) => AttrValue::Text(s),
            other => AttrValue::Text(other.to_string()),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, AttrValue::Null)
    }

    /// The value as a polygon id. Null and blank text have none.
    pub fn as_id(&self) -> Option<PolygonId> {
        match self {
            AttrValue::Null => None,
            AttrValue::Text(s) if s.trim().is_empty() => None,
            other => Some(PolygonId::new(other.to_string())),
        }
    }
}

impl fmt::Display for AttrValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttrValue::Null => Ok(()),
            AttrValue::Bool(b) => b.fmt(f),
            AttrValue::Number(n) => n.fmt(f),
            AttrValue::Text(s) => f.write_str(s),
        }
    }
}

/// One source feature: its attributes and its polygon parts.
///
/// Each part is a list of rings, exterior first.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceRecord {
    /// Position of the record in its layer.
    pub index: usize,
    pub attributes: Vec<AttrValue>,
    pub parts: Vec<Vec<Ring>>,
}

/// A field resolved to its position in a layer's records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldAccessor {
    name: String,
    position: usize,
}

impl FieldAccessor {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn get<'a>(&self, record: &'a SourceRecord) -> &'a AttrValue {
        record.attributes.get(self.position).unwrap_or(&NULL)
    }
}

/// Polygon records loaded from one or more sources.
#[derive(Debug, Clone, Default)]
pub struct FeatureLayer {
    fields: Vec<String>,
    records: Vec<SourceRecord>,
    sources: Vec<PathBuf>,
    crs: Option<Value>,
}

impl FeatureLayer {
    /// Parses GeoJSON text. `origin` names the source in errors.
    pub fn from_geojson_str(text: &str, origin: impl Into<PathBuf>) -> Result<Self> {
        let origin = origin.into();
        let raw: RawCollection =
            serde_json::from_str(text).map_err(|e| Error::unreadable(&origin, e))?;
        if raw.kind != "FeatureCollection" {
            return Err(Error::unreadable(
                &origin,
                format!("expected a FeatureCollection, found {}", raw.kind),
            ));
        }

        let mut layer = FeatureLayer {
            sources: vec![origin.clone()],
            crs: raw.crs,
            ..FeatureLayer::default()
        };
        let mut positions: FxHashMap<String, usize> = FxHashMap::default();

        for (i, feature) in raw.features.into_iter().enumerate() {
            let Some(geometry) = feature.geometry else {
                warn!(source = %origin.display(), feature = i, "feature without geometry skipped");
                continue;
            };
            let parts = geometry
                .into_parts()
                .map_err(|reason| Error::unreadable(&origin, format!("feature {}: {}", i, reason)))?;

            let mut attributes = vec![AttrValue::Null; layer.fields.len()];
            for (name, value) in feature.properties.unwrap_or_default() {
                let pos = *positions.entry(name.clone()).or_insert_with(|| {
                    layer.fields.push(name);
                    layer.fields.len() - 1
                });
                if pos >= attributes.len() {
                    attributes.resize(pos + 1, AttrValue::Null);
                }
                attributes[pos] = AttrValue::from_json(value);
            }

            let index = layer.records.len();
            layer.records.push(SourceRecord {
                index,
                attributes,
                parts,
            });
        }

        let width = layer.fields.len();
        for record in &mut layer.records {
            record.attributes.resize(width, AttrValue::Null);
        }
        Ok(layer)
    }

    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    pub fn records(&self) -> &[SourceRecord] {
        &self.records
    }

    pub fn sources(&self) -> &[PathBuf] {
        &self.sources
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Total polygon parts over all records.
    pub fn part_count(&self) -> usize {
        self.records.iter().map(|r| r.parts.len()).sum()
    }

    /// Resolves `name` to a field accessor.
    pub fn field(&self, name: &str) -> Result<FieldAccessor> {
        match self.fields.iter().position(|f| f == name) {
            Some(position) => Ok(FieldAccessor {
                name: name.to_string(),
                position,
            }),
            None => Err(Error::unreadable(
                self.origin(),
                format!(
                    "unknown field '{}', available: [{}]",
                    name,
                    self.fields.join(", ")
                ),
            )),
        }
    }

    /// One polygon feature per part, identified by `id_field`.
    ///
    /// Parts of a multipolygon share their record's id.
    pub fn polygons(&self, id_field: &str) -> Result<Vec<PolygonFeature>> {
        let field = self.field(id_field)?;
        let mut features = Vec::with_capacity(self.part_count());

        for record in &self.records {
            let id = field.get(record).as_id().ok_or_else(|| {
                Error::unreadable(
                    self.origin(),
                    format!(
                        "feature {} has no value for field '{}'",
                        record.index,
                        field.name()
                    ),
                )
            })?;
            for part in &record.parts {
                let Some((exterior, holes)) = part.split_first() else {
                    continue;
                };
                let mut feature = PolygonFeature::new(id.clone(), exterior.clone());
                feature.holes = holes.to_vec();
                features.push(feature);
            }
        }

        debug!(
            records = self.records.len(),
            polygons = features.len(),
            id_field,
            "polygons extracted"
        );
        Ok(features)
    }

    /// Appends the records of `other`.
    ///
    /// Fields are merged by name; records missing a field read it as null.
    /// Both layers must declare the same coordinate reference system, since
    /// nothing is reprojected.
    pub fn extend(&mut self, other: FeatureLayer) -> Result<()> {
        if let (Some(mine), Some(theirs)) = (&self.crs, &other.crs) {
            if mine != theirs {
                return Err(Error::unreadable(
                    other.origin(),
                    format!("coordinate reference system {} differs from {}", theirs, mine),
                ));
            }
        }
        if self.crs.is_none() {
            self.crs = other.crs;
        }

        let mapping: Vec<usize> = other
            .fields
            .into_iter()
            .map(|name| match self.fields.iter().position(|f| *f == name) {
                Some(pos) => pos,
                None => {
                    self.fields.push(name);
                    self.fields.len() - 1
                }
            })
            .collect();

        let width = self.fields.len();
        for record in &mut self.records {
            record.attributes.resize(width, AttrValue::Null);
        }
        for record in other.records {
            let mut attributes = vec![AttrValue::Null; width];
            for (value, &pos) in record.attributes.into_iter().zip(&mapping) {
                attributes[pos] = value;
            }
            let index = self.records.len();
            self.records.push(SourceRecord {
                index,
                attributes,
                parts: record.parts,
            });
        }
        self.sources.extend(other.sources);
        Ok(())
    }

    fn origin(&self) -> PathBuf {
        self.sources.first().cloned().unwrap_or_default()
    }
}

/// Reads the GeoJSON source at `path`, decoding it with `encoding`.
///
/// `encoding` is a WHATWG label such as `utf-8` or `windows-1257`.
pub fn load(path: impl AsRef<Path>, encoding: &str) -> Result<FeatureLayer> {
    let path = path.as_ref();
    debug!(path = %path.display(), encoding, "load start");

    let bytes = fs::read(path).map_err(|e| Error::unreadable(path, e))?;
    let text = decode(&bytes, encoding)?;
    let layer = FeatureLayer::from_geojson_str(&text, path)?;

    debug!(
        path = %path.display(),
        records = layer.len(),
        parts = layer.part_count(),
        "load done"
    );
    Ok(layer)
}

/// Decodes `bytes` as `label`, rejecting malformed input.
///
/// A byte order mark is stripped when it agrees with the label.
pub fn decode(bytes: &[u8], label: &str) -> Result<String> {
    let encoding = Encoding::for_label(label.trim().as_bytes()).ok_or_else(|| {
        Error::EncodingError {
            encoding: label.to_string(),
            reason: "unknown encoding label".to_string(),
        }
    })?;

    let mut body = bytes;
    if let Some((declared, bom_len)) = Encoding::for_bom(bytes) {
        if declared != encoding {
            return Err(Error::EncodingError {
                encoding: encoding.name().to_string(),
                reason: format!("byte order mark declares {}", declared.name()),
            });
        }
        body = &bytes[bom_len..];
    }

    encoding
        .decode_without_bom_handling_and_without_replacement(body)
        .map(Cow::into_owned)
        .ok_or_else(|| Error::EncodingError {
            encoding: encoding.name().to_string(),
            reason: "malformed byte sequence".to_string(),
        })
}

#[derive(Deserialize)]
struct RawCollection {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    features: Vec<RawFeature>,
    #[serde(default)]
    crs: Option<Value>,
}

#[derive(Deserialize)]
struct RawFeature {
    #[serde(default)]
    properties: Option<Map<String, Value>>,
    #[serde(default)]
    geometry: Option<RawGeometry>,
}

#[derive(Deserialize)]
struct RawGeometry {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    coordinates: Value,
}

impl RawGeometry {
    fn into_parts(self) -> std::result::Result<Vec<Vec<Ring>>, String> {
        match self.kind.as_str() {
            "Polygon" => {
                let rings: Vec<Vec<Vec<f64>>> =
                    serde_json::from_value(self.coordinates).map_err(|e| e.to_string())?;
                Ok(vec![polygon(rings)?])
            }
            "MultiPolygon" => {
                let parts: Vec<Vec<Vec<Vec<f64>>>> =
                    serde_json::from_value(self.coordinates).map_err(|e| e.to_string())?;
                parts.into_iter().map(polygon).collect()
            }
            other => Err(format!("unsupported geometry type {}", other)),
        }
    }
}

fn polygon(rings: Vec<Vec<Vec<f64>>>) -> std::result::Result<Vec<Ring>, String> {
    rings
        .into_iter()
        .map(|ring| {
            ring.into_iter()
                .map(|pos| match pos.as_slice() {
                    [x, y, ..] => Ok([*x, *y]),
                    _ => Err(format!("position with {} values", pos.len())),
                })
                .collect()
        })
        .collect()
}
