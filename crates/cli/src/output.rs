//! JSON rendering of engine results.
//!
//! Geometries are written as GeoJSON geometry objects so the output can be
//! dropped straight into a map viewer.

use geo::{Area, Coord, Geometry, LineString, MultiPolygon, Point, Polygon};
use hydronav_core::{Basin, NavigationResult, NetworkPosition, SourceFeature};
use hydronav_engine::{Flowline, PourPoint};
use serde_json::{json, Map, Value};

fn coord(c: &Coord<f64>) -> Value {
    json!([c.x, c.y])
}

fn line_coords(line: &LineString<f64>) -> Value {
    Value::Array(line.0.iter().map(coord).collect())
}

fn polygon_coords(polygon: &Polygon<f64>) -> Value {
    let mut rings = vec![line_coords(polygon.exterior())];
    rings.extend(polygon.interiors().iter().map(line_coords));
    Value::Array(rings)
}

pub fn point_json(point: &Point<f64>) -> Value {
    json!({"type": "Point", "coordinates": [point.x(), point.y()]})
}

pub fn line_json(line: &LineString<f64>) -> Value {
    json!({"type": "LineString", "coordinates": line_coords(line)})
}

pub fn multipolygon_json(mp: &MultiPolygon<f64>) -> Value {
    json!({
        "type": "MultiPolygon",
        "coordinates": mp.0.iter().map(polygon_coords).collect::<Vec<_>>(),
    })
}

pub fn geometry_json(geometry: &Geometry<f64>) -> Value {
    match geometry {
        Geometry::Point(p) => point_json(p),
        Geometry::LineString(l) => line_json(l),
        Geometry::Polygon(p) => json!({"type": "Polygon", "coordinates": polygon_coords(p)}),
        Geometry::MultiPolygon(mp) => multipolygon_json(mp),
        _ => Value::Null,
    }
}

pub fn navigation_json(result: &NavigationResult, distance: f64) -> Value {
    json!({
        "seed": result.seed,
        "mode": result.mode.code(),
        "distance_km": distance,
        "count": result.len(),
        "segments": result.segments,
    })
}

pub fn flowlines_json(flowlines: &[Flowline]) -> Value {
    Value::Array(
        flowlines
            .iter()
            .map(|f| {
                json!({
                    "comid": f.segment,
                    "trimmed": f.trimmed,
                    "geometry": line_json(&f.geometry),
                })
            })
            .collect(),
    )
}

pub fn features_json(features: &[SourceFeature]) -> Value {
    Value::Array(
        features
            .iter()
            .map(|f| {
                let properties: Map<String, Value> = f
                    .properties
                    .iter()
                    .filter_map(|(k, v)| Some((k.clone(), serde_json::to_value(v).ok()?)))
                    .collect();
                json!({
                    "source": f.source,
                    "identifier": f.identifier,
                    "name": f.name,
                    "comid": f.segment,
                    "measure": f.measure,
                    "reachcode": f.reach_code,
                    "geometry": geometry_json(&f.geometry),
                    "properties": properties,
                })
            })
            .collect(),
    )
}

pub fn position_json(position: &NetworkPosition) -> Value {
    json!({"comid": position.segment, "measure": position.measure})
}

pub fn basin_json(basin: &Basin, pour_point: Option<&PourPoint>) -> Value {
    let mut out = json!({
        "comid": basin.seed,
        "split": basin.split,
        "simplified": basin.simplified,
        "area": basin.geometry.unsigned_area(),
        "geometry": multipolygon_json(&basin.geometry),
    });
    if let Some(pp) = pour_point {
        out["pour_point"] = json!({"stage": pp.stage, "geometry": point_json(&pp.point)});
    }
    out
}
