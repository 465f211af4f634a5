//! JSON network reader

use crate::error::{Error, Result};
use crate::network::{Segment, SegmentId};
use crate::vector::{AttributeValue, SourceFeature};
use geo_types::{Coord, Geometry, LineString, Point, Polygon};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Segment as stored in a network document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SegmentRecord {
    #[serde(alias = "comid")]
    pub id: u64,
    #[serde(alias = "hydroseq")]
    pub sequence: u64,
    #[serde(default, alias = "dnhydroseq")]
    pub down_sequence: u64,
    #[serde(default, alias = "dnminorhyd")]
    pub down_minor_sequence: u64,
    #[serde(default, alias = "uphydroseq")]
    pub up_sequence: u64,
    #[serde(default, alias = "levelpathid")]
    pub mainstem_path_id: u64,
    #[serde(default, alias = "terminalpathid")]
    pub terminal_path_id: u64,
    #[serde(default, alias = "pathlength")]
    pub path_length: f64,
    #[serde(default, alias = "lengthkm")]
    pub length: f64,
    #[serde(default, alias = "startflag")]
    pub is_network_start: bool,
    #[serde(default, alias = "terminalflag")]
    pub is_network_terminal: bool,
    #[serde(default, alias = "fcode")]
    pub class_code: i32,
    #[serde(default, alias = "frommeas")]
    pub from_measure: f64,
    #[serde(default = "default_to_measure", alias = "tomeas")]
    pub to_measure: f64,
    /// Coordinates from the upstream end to the downstream end
    pub geometry: Vec<[f64; 2]>,
    /// Exterior ring of the local catchment
    #[serde(default)]
    pub catchment: Option<Vec<[f64; 2]>>,
}

fn default_to_measure() -> f64 {
    100.0
}

/// Point or polyline geometry of a feature record
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum GeometryRecord {
    Point([f64; 2]),
    Line(Vec<[f64; 2]>),
}

/// Source feature as stored in a network document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureRecord {
    pub source: String,
    pub identifier: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, alias = "comid")]
    pub segment: Option<u64>,
    #[serde(default)]
    pub measure: Option<f64>,
    #[serde(default, alias = "reachcode")]
    pub reach_code: Option<String>,
    pub geometry: GeometryRecord,
    #[serde(default)]
    pub properties: HashMap<String, AttributeValue>,
}

#[derive(Debug, Deserialize)]
struct RawDocument {
    segments: Vec<SegmentRecord>,
    #[serde(default)]
    features: Vec<FeatureRecord>,
}

/// A parsed and validated network document
#[derive(Debug, Clone, Default)]
pub struct NetworkDocument {
    pub segments: Vec<Segment>,
    pub features: Vec<SourceFeature>,
}

/// Read a network document from a file
pub fn read_network<P: AsRef<Path>>(path: P) -> Result<NetworkDocument> {
    let file = File::open(path.as_ref())?;
    let raw: RawDocument = serde_json::from_reader(BufReader::new(file))?;
    convert(raw)
}

/// Read a network document from a JSON string
pub fn read_network_from_str(json: &str) -> Result<NetworkDocument> {
    let raw: RawDocument = serde_json::from_str(json)?;
    convert(raw)
}

/// Read a network document from an in-memory buffer
pub fn read_network_from_slice(data: &[u8]) -> Result<NetworkDocument> {
    let raw: RawDocument = serde_json::from_slice(data)?;
    convert(raw)
}

fn convert(raw: RawDocument) -> Result<NetworkDocument> {
    let mut ids = HashSet::with_capacity(raw.segments.len());
    let mut sequences = HashSet::with_capacity(raw.segments.len());
    let mut segments = Vec::with_capacity(raw.segments.len());

    for record in raw.segments {
        if !ids.insert(record.id) {
            return Err(Error::Parse(format!("duplicate segment id {}", record.id)));
        }
        if record.sequence != 0 && !sequences.insert(record.sequence) {
            return Err(Error::Parse(format!(
                "duplicate sequence {} on segment {}",
                record.sequence, record.id
            )));
        }
        segments.push(segment_from_record(record)?);
    }

    let features = raw
        .features
        .into_iter()
        .map(feature_from_record)
        .collect();

    Ok(NetworkDocument { segments, features })
}

fn segment_from_record(r: SegmentRecord) -> Result<Segment> {
    if r.geometry.len() < 2 {
        return Err(Error::Parse(format!(
            "segment {} geometry needs at least 2 coordinates, got {}",
            r.id,
            r.geometry.len()
        )));
    }
    if !(r.from_measure <= r.to_measure) {
        return Err(Error::Parse(format!(
            "segment {} has from_measure {} above to_measure {}",
            r.id, r.from_measure, r.to_measure
        )));
    }

    let catchment = match r.catchment {
        Some(ring) if ring.len() >= 4 => Some(Polygon::new(line(&ring), vec![])),
        Some(ring) => {
            return Err(Error::Parse(format!(
                "segment {} catchment ring needs at least 4 coordinates, got {}",
                r.id,
                ring.len()
            )))
        }
        None => None,
    };

    Ok(Segment {
        id: SegmentId(r.id),
        sequence: r.sequence,
        down_sequence: r.down_sequence,
        down_minor_sequence: r.down_minor_sequence,
        up_sequence: r.up_sequence,
        mainstem_path_id: r.mainstem_path_id,
        terminal_path_id: r.terminal_path_id,
        path_length: r.path_length,
        length: r.length,
        is_network_start: r.is_network_start,
        is_network_terminal: r.is_network_terminal,
        class_code: r.class_code,
        from_measure: r.from_measure,
        to_measure: r.to_measure,
        geometry: line(&r.geometry),
        catchment,
    })
}

fn feature_from_record(r: FeatureRecord) -> SourceFeature {
    let geometry = match &r.geometry {
        GeometryRecord::Point([x, y]) => Geometry::Point(Point::new(*x, *y)),
        GeometryRecord::Line(coords) => Geometry::LineString(line(coords)),
    };
    SourceFeature {
        source: r.source,
        identifier: r.identifier,
        name: r.name,
        segment: r.segment.map(SegmentId),
        measure: r.measure,
        reach_code: r.reach_code,
        geometry,
        properties: r.properties,
    }
}

fn line(coords: &[[f64; 2]]) -> LineString<f64> {
    LineString::new(coords.iter().map(|&[x, y]| Coord { x, y }).collect())
}
