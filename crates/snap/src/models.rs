//! Wire types for the snap service.
//!
//! Requests follow the OGC API - Processes execute body
//! (`{"inputs": {...}}`). Responses are GeoJSON feature collections; only
//! the members the client reads are modelled.

use geo::{Area, LineString, Point, Polygon};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

/// Body for `POST /processes/{id}/execution`.
#[derive(Debug, Clone, Serialize)]
pub struct ExecuteRequest<I> {
    pub inputs: I,
}

/// Inputs of the `flowtrace` process.
#[derive(Debug, Clone, Serialize)]
pub struct FlowtraceInputs {
    pub lat: f64,
    pub lon: f64,
    /// `"up"`, `"down"` or `"none"`
    pub direction: &'static str,
    /// Follow the raindrop path to the nearest flowline first
    pub raindroptrace: bool,
}

/// Inputs of the `splitcatchment` process.
#[derive(Debug, Clone, Serialize)]
pub struct SplitCatchmentInputs {
    pub lat: f64,
    pub lon: f64,
    pub upstream: bool,
}

// ---------------------------------------------------------------------------
// Responses
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct FeatureCollection {
    #[serde(default)]
    pub features: Vec<Feature>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Feature {
    #[serde(default)]
    pub id: Option<Value>,
    #[serde(default)]
    pub geometry: Option<GeoJsonGeometry>,
    #[serde(default)]
    pub properties: Map<String, Value>,
}

impl Feature {
    /// Feature id as text, whether encoded as a string or a number.
    pub fn id_str(&self) -> Option<String> {
        match self.id.as_ref()? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    /// `properties.intersection_point` as `[lon, lat]`.
    pub fn intersection_point(&self) -> Option<Point<f64>> {
        let coords = self.properties.get("intersection_point")?.as_array()?;
        match coords.as_slice() {
            [x, y] => Some(Point::new(x.as_f64()?, y.as_f64()?)),
            _ => None,
        }
    }
}

/// GeoJSON geometry subset returned by the service.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type")]
pub enum GeoJsonGeometry {
    Point { coordinates: [f64; 2] },
    LineString { coordinates: Vec<[f64; 2]> },
    Polygon { coordinates: Vec<Vec<[f64; 2]>> },
    MultiPolygon { coordinates: Vec<Vec<Vec<[f64; 2]>>> },
}

impl GeoJsonGeometry {
    /// The polygon this geometry describes; the largest part of a multipolygon.
    pub fn to_polygon(&self) -> Option<Polygon<f64>> {
        match self {
            GeoJsonGeometry::Polygon { coordinates } => polygon(coordinates),
            GeoJsonGeometry::MultiPolygon { coordinates } => coordinates
                .iter()
                .filter_map(|rings| polygon(rings))
                .max_by(|a, b| a.unsigned_area().total_cmp(&b.unsigned_area())),
            _ => None,
        }
    }
}

fn ring(coords: &[[f64; 2]]) -> LineString<f64> {
    coords.iter().map(|&[x, y]| (x, y)).collect()
}

fn polygon(rings: &[Vec<[f64; 2]>]) -> Option<Polygon<f64>> {
    let (exterior, interiors) = rings.split_first()?;
    if exterior.len() < 4 {
        return None;
    }
    Some(Polygon::new(
        ring(exterior),
        interiors.iter().map(|r| ring(r)).collect(),
    ))
}
