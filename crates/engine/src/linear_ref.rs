//! Linear referencing along segment geometries
//!
//! Measures run 0..100 along a segment. Geometry is digitized from the
//! upstream end (measure = `to_measure`) toward the downstream end
//! (measure = `from_measure`), so a fractional position `f` along the
//! geometry maps to
//!
//! ```text
//! measure = from_measure + (1 - f) * (to_measure - from_measure)
//! ```

use crate::config::ReferencingConfig;
use geo::{
    Coord, Distance, Euclidean, Length, Line, LineInterpolatePoint, LineLocatePoint, LineString,
    Point,
};
use hydronav_core::network::{Direction, Segment};
use hydronav_core::{Error, Result};

/// Where a raw point projects onto a segment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Located {
    /// Position of the closest point along the geometry (0 = upstream end)
    pub fraction: f64,
    pub closest: Point<f64>,
    /// Distance from the raw point to `closest`
    pub distance: f64,
}

/// Projects points onto segments and trims segment geometry at a measure.
#[derive(Debug, Clone, Copy, Default)]
pub struct LinearReferencer {
    config: ReferencingConfig,
}

impl LinearReferencer {
    pub fn new(config: ReferencingConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ReferencingConfig {
        &self.config
    }

    /// Project `point` onto the segment geometry.
    pub fn locate(&self, point: Point<f64>, segment: &Segment) -> Located {
        let line = &segment.geometry;
        let fraction = line
            .line_locate_point(&point)
            .filter(|f| f.is_finite())
            .unwrap_or(0.0)
            .clamp(0.0, 1.0);
        let closest = line
            .line_interpolate_point(fraction)
            .or_else(|| line.0.first().map(|c| Point::from(*c)))
            .unwrap_or(point);
        Located {
            fraction,
            closest,
            distance: Euclidean::distance(point, closest),
        }
    }

    /// Closest point on the segment and its distance from `point`.
    pub fn nearest_point(&self, point: Point<f64>, segment: &Segment) -> (Point<f64>, f64) {
        let located = self.locate(point, segment);
        (located.closest, located.distance)
    }

    /// Measure of the closest point, regardless of how far away `point` is.
    pub fn locate_measure(&self, point: Point<f64>, segment: &Segment) -> f64 {
        fraction_to_measure(segment, self.locate(point, segment).fraction)
    }

    /// Estimate the measure of `point` on `segment`.
    ///
    /// Fails with `NotOnNetwork` when the point lies farther from the
    /// geometry than the configured snap tolerance.
    pub fn estimate_measure(&self, point: Point<f64>, segment: &Segment) -> Result<f64> {
        let located = self.locate(point, segment);
        if located.distance > self.config.snap_tolerance {
            return Err(Error::NotOnNetwork {
                segment: Some(segment.id),
                distance: located.distance,
                tolerance: self.config.snap_tolerance,
            });
        }
        Ok(fraction_to_measure(segment, located.fraction))
    }

    /// Point on the segment geometry at `measure`.
    pub fn point_at_measure(&self, segment: &Segment, measure: f64) -> Result<Point<f64>> {
        if !segment.contains_measure(measure) {
            let offset = if measure < segment.from_measure {
                segment.from_measure - measure
            } else if measure > segment.to_measure {
                measure - segment.to_measure
            } else {
                f64::INFINITY
            };
            return Err(Error::NotOnNetwork {
                segment: Some(segment.id),
                distance: offset,
                tolerance: 0.0,
            });
        }
        let fraction = measure_to_fraction(segment, measure);
        segment
            .geometry
            .line_interpolate_point(fraction)
            .ok_or(Error::NotOnNetwork {
                segment: Some(segment.id),
                distance: f64::INFINITY,
                tolerance: 0.0,
            })
    }

    /// Trim the segment geometry at `measure` for a walk in `direction`.
    ///
    /// Downstream walks keep `measure .. downstream end`; upstream walks keep
    /// `upstream end .. measure`. The full geometry comes back untouched when
    /// `100 - measure` is below the trim tolerance.
    pub fn trim(&self, segment: &Segment, measure: f64, direction: Direction) -> LineString<f64> {
        if self.skips_trim(measure) {
            return segment.geometry.clone();
        }
        let fraction = measure_to_fraction(segment, measure);
        match direction {
            Direction::Downstream => sub_line(&segment.geometry, fraction, 1.0),
            Direction::Upstream => sub_line(&segment.geometry, 0.0, fraction),
        }
    }

    /// Like [`trim`](Self::trim) but returns the kept part as a segment with
    /// narrowed measure bounds and adjusted lengths.
    pub fn trim_segment(&self, segment: &Segment, measure: f64, direction: Direction) -> Segment {
        let mut out = segment.clone();
        if self.skips_trim(measure) {
            return out;
        }
        let fraction = measure_to_fraction(segment, measure);
        let measure = measure.clamp(segment.from_measure, segment.to_measure);
        out.geometry = self.trim(segment, measure, direction);
        match direction {
            Direction::Downstream => {
                out.to_measure = measure;
                out.length = segment.length * (1.0 - fraction);
            }
            Direction::Upstream => {
                out.from_measure = measure;
                out.path_length = segment.path_length + segment.length * (1.0 - fraction);
                out.length = segment.length * fraction;
            }
        }
        out
    }

    fn skips_trim(&self, measure: f64) -> bool {
        100.0 - measure < self.config.trim_tolerance
    }
}

fn fraction_to_measure(segment: &Segment, fraction: f64) -> f64 {
    segment.from_measure + (1.0 - fraction) * segment.measure_span()
}

fn measure_to_fraction(segment: &Segment, measure: f64) -> f64 {
    let span = segment.measure_span();
    if span <= 0.0 {
        return 0.0;
    }
    (1.0 - (measure - segment.from_measure) / span).clamp(0.0, 1.0)
}

fn lerp(a: Coord<f64>, b: Coord<f64>, t: f64) -> Coord<f64> {
    Coord {
        x: a.x + (b.x - a.x) * t,
        y: a.y + (b.y - a.y) * t,
    }
}

fn push_distinct(out: &mut Vec<Coord<f64>>, c: Coord<f64>) {
    if out.last() != Some(&c) {
        out.push(c);
    }
}

/// Portion of `line` between two fractions of its length.
fn sub_line(line: &LineString<f64>, start: f64, end: f64) -> LineString<f64> {
    if start <= 0.0 && end >= 1.0 {
        return line.clone();
    }
    let coords = &line.0;
    let total = line.length::<Euclidean>();
    if coords.len() < 2 || total <= 0.0 {
        return line.clone();
    }

    let (start_d, end_d) = (start.max(0.0) * total, end.min(1.0) * total);
    let mut out: Vec<Coord<f64>> = Vec::new();
    let mut walked = 0.0;

    for pair in coords.windows(2) {
        let (a, b) = (pair[0], pair[1]);
        let len = Line::new(a, b).length::<Euclidean>();
        let next = walked + len;
        let t = |d: f64| {
            if len > 0.0 {
                ((d - walked) / len).clamp(0.0, 1.0)
            } else {
                0.0
            }
        };

        if out.is_empty() && start_d <= next {
            push_distinct(&mut out, lerp(a, b, t(start_d)));
        }
        if !out.is_empty() {
            if end_d <= next {
                push_distinct(&mut out, lerp(a, b, t(end_d)));
                break;
            }
            push_distinct(&mut out, b);
        }
        walked = next;
    }

    if out.len() == 1 {
        out.push(out[0]);
    }
    LineString::new(out)
}
