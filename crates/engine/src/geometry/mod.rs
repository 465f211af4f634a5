//! Geometry helpers used by the in-memory store and basin delineation
//!
//! - Union: merge catchment polygons into a basin
//! - Simplify: Douglas-Peucker on basin outlines
//! - Area: basin size in CRS units squared

mod simplify;
mod union;

pub use simplify::simplify_basin;
pub use union::union_catchments;

use geo::{Area, MultiPolygon};

/// Unsigned area of a basin in CRS units squared.
pub fn area(basin: &MultiPolygon<f64>) -> f64 {
    basin.unsigned_area()
}
