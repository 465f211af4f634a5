//! Basin simplification (Douglas-Peucker)

use geo::Simplify;
use geo::{LineString, MultiPolygon, Polygon};

/// Simplify every polygon of a basin.
///
/// Removes ring vertices that deviate less than `tolerance` from the
/// simplified outline. Interior rings that collapse below a valid ring are
/// dropped; an exterior that collapses keeps its original vertices.
pub fn simplify_basin(basin: &MultiPolygon<f64>, tolerance: f64) -> MultiPolygon<f64> {
    if tolerance <= 0.0 {
        return basin.clone();
    }
    MultiPolygon::new(
        basin
            .0
            .iter()
            .map(|p| simplify_polygon(p, tolerance))
            .collect(),
    )
}

fn simplify_polygon(polygon: &Polygon<f64>, tolerance: f64) -> Polygon<f64> {
    let simplified = polygon.exterior().simplify(&tolerance);
    let exterior = if simplified.0.len() >= 4 {
        simplified
    } else {
        polygon.exterior().clone()
    };
    let interiors: Vec<LineString<f64>> = polygon
        .interiors()
        .iter()
        .map(|ring| ring.simplify(&tolerance))
        .filter(|ring| ring.0.len() >= 4) // Must remain valid ring
        .collect();
    Polygon::new(exterior, interiors)
}
