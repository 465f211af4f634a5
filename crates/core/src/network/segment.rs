//! Flow network segments (flowlines keyed by COMID)

use geo_types::{LineString, Polygon};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Feature code flagging coastline segments. These terminate every walk.
pub const COASTAL_CLASS_CODE: i32 = 56600;

/// Sequence value meaning "no link".
pub const NO_SEQUENCE: u64 = 0;

/// Stable segment identifier ("COMID").
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SegmentId(pub u64);

impl fmt::Display for SegmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for SegmentId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(SegmentId)
    }
}

impl From<u64> for SegmentId {
    fn from(v: u64) -> Self {
        SegmentId(v)
    }
}

/// A directed reach of the flow network.
///
/// The geometry is digitized from the upstream end (measure = `to_measure`)
/// to the downstream end (measure = `from_measure`). `path_length` is the
/// distance in km from the network mouth to this segment's downstream end.
#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    pub id: SegmentId,
    /// Hydrologic sequence, strictly ordered along flow
    pub sequence: u64,
    pub down_sequence: u64,
    /// Secondary downstream link, only set on diversions
    pub down_minor_sequence: u64,
    /// Mainstem upstream link
    pub up_sequence: u64,
    pub mainstem_path_id: u64,
    pub terminal_path_id: u64,
    pub path_length: f64,
    pub length: f64,
    pub is_network_start: bool,
    pub is_network_terminal: bool,
    pub class_code: i32,
    pub from_measure: f64,
    pub to_measure: f64,
    pub geometry: LineString<f64>,
    /// Local drainage area attributed to this segment
    pub catchment: Option<Polygon<f64>>,
}

impl Segment {
    /// Minimal segment with linear bounds 0..100 and no links.
    pub fn new(id: impl Into<SegmentId>, sequence: u64, geometry: LineString<f64>) -> Self {
        Self {
            id: id.into(),
            sequence,
            down_sequence: NO_SEQUENCE,
            down_minor_sequence: NO_SEQUENCE,
            up_sequence: NO_SEQUENCE,
            mainstem_path_id: 0,
            terminal_path_id: 0,
            path_length: 0.0,
            length: 0.0,
            is_network_start: false,
            is_network_terminal: false,
            class_code: 0,
            from_measure: 0.0,
            to_measure: 100.0,
            geometry,
            catchment: None,
        }
    }

    pub fn is_coastal(&self) -> bool {
        self.class_code == COASTAL_CLASS_CODE
    }

    /// Path length from the mouth to this segment's upstream end.
    pub fn upstream_top(&self) -> f64 {
        self.path_length + self.length
    }

    pub fn measure_span(&self) -> f64 {
        self.to_measure - self.from_measure
    }

    pub fn has_minor_downstream(&self) -> bool {
        self.down_minor_sequence != NO_SEQUENCE
    }

    /// Whether `measure` falls within this segment's linear bounds.
    pub fn contains_measure(&self, measure: f64) -> bool {
        measure.is_finite() && measure >= self.from_measure && measure <= self.to_measure
    }
}
