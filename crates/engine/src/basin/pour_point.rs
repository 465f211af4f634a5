//! Pour-point resolution
//!
//! A point feature is moved onto its associated segment before the
//! catchment is split. Three strategies are tried in order and the first
//! that succeeds wins:
//!
//! 1. On-segment interpolation from the recorded (or estimated) measure
//! 2. Closest point on the segment, within a distance threshold
//! 3. The hydrologic snap service, tracing downstream
//!
//! Data-quality failures move the chain along. A collaborator that cannot
//! be reached ends it immediately.

use crate::bounded::{bounded, SNAP};
use crate::config::TimeoutConfig;
use crate::linear_ref::LinearReferencer;
use geo::Point;
use hydronav_core::network::{Direction, Segment};
use hydronav_core::{Error, HydrologicSnapService, Result, SourceFeature};
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

/// Strategy that produced a pour point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PourPointStage {
    OnSegment,
    NearestPoint,
    ExternalSnap,
}

impl fmt::Display for PourPointStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PourPointStage::OnSegment => "on-segment",
            PourPointStage::NearestPoint => "nearest point",
            PourPointStage::ExternalSnap => "external snap",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PourPoint {
    pub point: Point<f64>,
    pub stage: PourPointStage,
}

/// Runs the pour-point fallback chain for one feature at a time.
#[derive(Clone)]
pub struct PourPointLocator {
    referencer: LinearReferencer,
    snap: Arc<dyn HydrologicSnapService>,
    /// Maximum distance accepted by the nearest-point stage
    threshold: f64,
    timeouts: TimeoutConfig,
}

impl PourPointLocator {
    pub fn new(
        referencer: LinearReferencer,
        snap: Arc<dyn HydrologicSnapService>,
        threshold: f64,
        timeouts: TimeoutConfig,
    ) -> Self {
        Self {
            referencer,
            snap,
            threshold,
            timeouts,
        }
    }

    /// Move `point` (the location of `feature`) onto `segment`.
    pub async fn locate(
        &self,
        feature: &SourceFeature,
        segment: &Segment,
        point: Point<f64>,
    ) -> Result<PourPoint> {
        let mut failures: Vec<String> = Vec::new();

        match self.on_segment(feature, segment, point) {
            Ok(p) => return Ok(self.found(p, PourPointStage::OnSegment)),
            Err(e) if e.is_recoverable() => {
                warn!("{}: {} failed: {}", feature.reference(), PourPointStage::OnSegment, e);
                failures.push(format!("{}: {}", PourPointStage::OnSegment, e));
            }
            Err(e) => return Err(e),
        }

        let (closest, distance) = self.referencer.nearest_point(point, segment);
        if distance <= self.threshold {
            return Ok(self.found(closest, PourPointStage::NearestPoint));
        }
        warn!(
            "{}: {} is {} away, threshold {}",
            feature.reference(),
            PourPointStage::NearestPoint,
            distance,
            self.threshold
        );
        failures.push(format!(
            "{}: {} beyond threshold {}",
            PourPointStage::NearestPoint,
            distance,
            self.threshold
        ));

        let snapped = bounded(
            SNAP,
            self.timeouts.snap(),
            self.snap.snap_to_network(point, Direction::Downstream),
        )
        .await;
        match snapped {
            Ok(p) => return Ok(self.found(p, PourPointStage::ExternalSnap)),
            Err(e @ Error::CollaboratorUnavailable { .. }) => return Err(e),
            Err(e) => {
                warn!("{}: {} failed: {}", feature.reference(), PourPointStage::ExternalSnap, e);
                failures.push(format!("{}: {}", PourPointStage::ExternalSnap, e));
            }
        }

        Err(Error::SnapFailed {
            feature: feature.reference().to_string(),
            reason: failures.join("; "),
        })
    }

    /// Interpolate at the recorded measure, estimating it when unrecorded.
    fn on_segment(
        &self,
        feature: &SourceFeature,
        segment: &Segment,
        point: Point<f64>,
    ) -> Result<Point<f64>> {
        let measure = match feature.recorded_measure() {
            Some(m) => m,
            None => self.referencer.estimate_measure(point, segment)?,
        };
        self.referencer.point_at_measure(segment, measure)
    }

    fn found(&self, point: Point<f64>, stage: PourPointStage) -> PourPoint {
        debug!("Pour point {:?} from {}", point, stage);
        PourPoint { point, stage }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use geo::{Geometry, LineString, Polygon};
    use hydronav_core::SegmentId;
    use std::sync::atomic::{AtomicUsize, Ordering};

    enum Reply {
        At(Point<f64>),
        Reject,
        Down,
    }

    struct ScriptedSnap {
        reply: Reply,
        calls: AtomicUsize,
    }

    impl ScriptedSnap {
        fn new(reply: Reply) -> Arc<Self> {
            Arc::new(Self {
                reply,
                calls: AtomicUsize::new(0),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl HydrologicSnapService for ScriptedSnap {
        async fn snap_to_network(&self, _point: Point<f64>, _direction: Direction) -> Result<Point<f64>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match self.reply {
                Reply::At(p) => Ok(p),
                Reply::Reject => Err(Error::SnapFailed {
                    feature: "point".into(),
                    reason: "no flowline intersected".into(),
                }),
                Reply::Down => Err(Error::unavailable(SNAP, "connection refused")),
            }
        }

        async fn split_catchment(&self, _point: Point<f64>, _upstream: bool) -> Result<Polygon<f64>> {
            unreachable!("pour-point resolution never splits")
        }
    }

    fn segment() -> Segment {
        Segment::new(2, 20, LineString::from(vec![(1.0, 0.0), (2.0, 0.0)]))
    }

    fn site(x: f64, y: f64, measure: Option<f64>) -> SourceFeature {
        let mut f = SourceFeature::new("wqp", "site", Geometry::Point(Point::new(x, y)));
        f.segment = Some(SegmentId(2));
        f.measure = measure;
        f
    }

    fn locator(snap: Arc<ScriptedSnap>) -> PourPointLocator {
        PourPointLocator::new(
            LinearReferencer::default(),
            snap,
            0.01,
            TimeoutConfig::default(),
        )
    }

    async fn run(snap: &Arc<ScriptedSnap>, feature: &SourceFeature) -> Result<PourPoint> {
        let point = feature.point().unwrap();
        locator(snap.clone()).locate(feature, &segment(), point).await
    }

    #[tokio::test]
    async fn test_recorded_measure_wins() {
        let snap = ScriptedSnap::new(Reply::Reject);
        // Raw point is far off, but the recorded measure places it mid-segment
        let pp = run(&snap, &site(1.5, 3.0, Some(50.0))).await.unwrap();
        assert_eq!(pp.stage, PourPointStage::OnSegment);
        assert!((pp.point.x() - 1.5).abs() < 1e-9);
        assert_eq!(snap.calls(), 0, "Stage 1 success must not reach the snap service");
    }

    #[tokio::test]
    async fn test_zero_measure_is_estimated() {
        let snap = ScriptedSnap::new(Reply::Reject);
        let pp = run(&snap, &site(1.75, 0.0, Some(0.0))).await.unwrap();
        assert_eq!(pp.stage, PourPointStage::OnSegment);
        assert!((pp.point.x() - 1.75).abs() < 1e-9, "got {:?}", pp.point);
        assert_eq!(snap.calls(), 0);
    }

    #[tokio::test]
    async fn test_nearest_point_fallback() {
        let snap = ScriptedSnap::new(Reply::Reject);
        let pp = run(&snap, &site(1.5, 0.005, None)).await.unwrap();
        assert_eq!(pp.stage, PourPointStage::NearestPoint);
        assert!(pp.point.y().abs() < 1e-12);
        assert_eq!(snap.calls(), 0);
    }

    #[tokio::test]
    async fn test_external_snap_fallback() {
        let snap = ScriptedSnap::new(Reply::At(Point::new(1.9, 0.0)));
        let pp = run(&snap, &site(1.5, 0.5, None)).await.unwrap();
        assert_eq!(pp.stage, PourPointStage::ExternalSnap);
        assert_eq!(pp.point, Point::new(1.9, 0.0));
        assert_eq!(snap.calls(), 1);
    }

    #[tokio::test]
    async fn test_exhausted_chain_reports_every_stage() {
        let snap = ScriptedSnap::new(Reply::Reject);
        match run(&snap, &site(1.5, 0.5, None)).await {
            Err(Error::SnapFailed { feature, reason }) => {
                assert_eq!(feature, "wqp/site");
                assert!(reason.contains("on-segment"), "{}", reason);
                assert!(reason.contains("nearest point"), "{}", reason);
                assert!(reason.contains("external snap"), "{}", reason);
            }
            other => panic!("Expected SnapFailed, got {:?}", other),
        }
        assert_eq!(snap.calls(), 1);
    }

    #[tokio::test]
    async fn test_unavailable_snap_propagates() {
        let snap = ScriptedSnap::new(Reply::Down);
        assert!(matches!(
            run(&snap, &site(1.5, 0.5, None)).await,
            Err(Error::CollaboratorUnavailable { .. })
        ));
    }
}
