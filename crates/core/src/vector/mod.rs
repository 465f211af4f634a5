//! Vector data structures: source features and basins

use crate::network::SegmentId;
use geo_types::{Geometry, MultiPolygon, Point};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Reserved source name whose identifiers are segment ids.
pub const COMID_SOURCE: &str = "comid";

/// Attribute value types
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
}

/// Reference to a feature in some external source, e.g. `("wqp", "USGS-05427718")`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceFeatureRef {
    pub source: String,
    pub identifier: String,
}

impl SourceFeatureRef {
    pub fn new(source: impl Into<String>, identifier: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            identifier: identifier.into(),
        }
    }

    /// Reference to a network segment by COMID.
    pub fn comid(id: SegmentId) -> Self {
        Self::new(COMID_SOURCE, id.to_string())
    }

    /// Whether the identifier space is the network itself.
    pub fn is_network_native(&self) -> bool {
        self.source.eq_ignore_ascii_case(COMID_SOURCE)
    }
}

impl fmt::Display for SourceFeatureRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.source, self.identifier)
    }
}

/// An externally sourced feature (monitoring site, gage, ...) indexed onto the network.
#[derive(Debug, Clone)]
pub struct SourceFeature {
    pub source: String,
    pub identifier: String,
    pub name: Option<String>,
    /// Associated segment (COMID)
    pub segment: Option<SegmentId>,
    /// Recorded linear-reference measure. Zero is treated as unrecorded.
    pub measure: Option<f64>,
    pub reach_code: Option<String>,
    pub geometry: Geometry<f64>,
    pub properties: HashMap<String, AttributeValue>,
}

impl SourceFeature {
    /// Create a new feature with geometry
    pub fn new(
        source: impl Into<String>,
        identifier: impl Into<String>,
        geometry: Geometry<f64>,
    ) -> Self {
        Self {
            source: source.into(),
            identifier: identifier.into(),
            name: None,
            segment: None,
            measure: None,
            reach_code: None,
            geometry,
            properties: HashMap::new(),
        }
    }

    pub fn reference(&self) -> SourceFeatureRef {
        SourceFeatureRef::new(self.source.clone(), self.identifier.clone())
    }

    /// The recorded measure, if one was actually recorded.
    pub fn recorded_measure(&self) -> Option<f64> {
        self.measure.filter(|m| m.is_finite() && *m != 0.0)
    }

    /// The raw coordinate when the geometry is a point.
    pub fn point(&self) -> Option<Point<f64>> {
        match &self.geometry {
            Geometry::Point(p) => Some(*p),
            _ => None,
        }
    }

    /// Set an attribute
    pub fn set_property(&mut self, key: impl Into<String>, value: AttributeValue) {
        self.properties.insert(key.into(), value);
    }

    /// Get an attribute
    pub fn get_property(&self, key: &str) -> Option<&AttributeValue> {
        self.properties.get(key)
    }
}

/// Aggregated upstream drainage area for a seed segment.
#[derive(Debug, Clone, PartialEq)]
pub struct Basin {
    pub seed: SegmentId,
    pub geometry: MultiPolygon<f64>,
    /// Computed by splitting the seed catchment at a pour point
    pub split: bool,
    pub simplified: bool,
}
