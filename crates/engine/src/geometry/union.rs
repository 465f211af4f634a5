//! Catchment aggregation

use geo::BooleanOps;
use geo::{MultiPolygon, Polygon};

/// Union a set of catchment polygons into one basin geometry.
///
/// Adjacent catchments merge into a single polygon; disjoint ones stay
/// separate members of the result. An empty input yields an empty
/// multipolygon.
pub fn union_catchments<'a, I>(catchments: I) -> MultiPolygon<f64>
where
    I: IntoIterator<Item = &'a Polygon<f64>>,
{
    catchments
        .into_iter()
        .fold(MultiPolygon::new(vec![]), |acc, polygon| {
            let next = MultiPolygon::new(vec![polygon.clone()]);
            if acc.0.is_empty() {
                next
            } else {
                acc.union(&next)
            }
        })
}
