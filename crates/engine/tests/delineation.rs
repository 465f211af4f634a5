//! Basin delineation against the reference network fragment.
//!
//! Point features in the fixture exercise each pour-point stage:
//!
//! | Feature      | Segment  | Placement                         | Stage          |
//! |--------------|----------|-----------------------------------|----------------|
//! | USGS-ONSEG   | 13294382 | recorded measure 50               | on-segment     |
//! | USGS-ZERO    | 13293752 | measure 0 (unrecorded), on line   | on-segment     |
//! | USGS-NEAR    | 13293770 | 0.005 off the flowline            | nearest point  |
//! | USGS-FAR     | 13293760 | 0.5 off the flowline              | external snap  |

use async_trait::async_trait;
use geo::{LineString, MultiPolygon, Point, Polygon};
use hydronav_core::io::read_network;
use hydronav_core::network::{Direction, TraversalRequest};
use hydronav_core::{
    Error, FlowNetworkStore, HydrologicSnapService, Result, Segment, SegmentId, SourceFeatureRef,
};
use hydronav_engine::geometry::area;
use hydronav_engine::{
    BasinDelineator, EngineConfig, MemoryNetwork, PourPointStage, TimeoutConfig,
};
use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

fn network() -> Arc<MemoryNetwork> {
    let path =
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/reference_network.json");
    Arc::new(MemoryNetwork::from_document(
        read_network(path).expect("failed to read reference network"),
    ))
}

// ---------------------------------------------------------------------------
// Mock collaborators
// ---------------------------------------------------------------------------

/// Store that delegates to the reference network and counts calls.
struct CountingStore {
    inner: Arc<MemoryNetwork>,
    graphs: AtomicUsize,
    unions: AtomicUsize,
}

impl CountingStore {
    fn new(inner: Arc<MemoryNetwork>) -> Arc<Self> {
        Arc::new(Self {
            inner,
            graphs: AtomicUsize::new(0),
            unions: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl FlowNetworkStore for CountingStore {
    async fn segment(&self, id: SegmentId) -> Result<Option<Segment>> {
        self.inner.segment(id).await
    }

    async fn resolve_graph(&self, request: &TraversalRequest) -> Result<BTreeSet<SegmentId>> {
        self.graphs.fetch_add(1, Ordering::SeqCst);
        self.inner.resolve_graph(request).await
    }

    async fn project_point(&self, point: Point<f64>, tolerance: f64) -> Result<Option<SegmentId>> {
        self.inner.project_point(point, tolerance).await
    }

    async fn union_and_simplify(
        &self,
        ids: &BTreeSet<SegmentId>,
        simplify_tolerance: Option<f64>,
    ) -> Result<MultiPolygon<f64>> {
        self.unions.fetch_add(1, Ordering::SeqCst);
        self.inner.union_and_simplify(ids, simplify_tolerance).await
    }
}

#[derive(Clone, Copy)]
enum SnapBehavior {
    Accept,
    Reject,
    Stall,
}

/// Snap service that records every call it receives.
struct MockSnap {
    behavior: SnapBehavior,
    snaps: AtomicUsize,
    split_points: Mutex<Vec<Point<f64>>>,
}

impl MockSnap {
    fn new(behavior: SnapBehavior) -> Arc<Self> {
        Arc::new(Self {
            behavior,
            snaps: AtomicUsize::new(0),
            split_points: Mutex::new(Vec::new()),
        })
    }

    fn snaps(&self) -> usize {
        self.snaps.load(Ordering::SeqCst)
    }

    fn splits(&self) -> Vec<Point<f64>> {
        self.split_points.lock().unwrap().clone()
    }
}

#[async_trait]
impl HydrologicSnapService for MockSnap {
    async fn snap_to_network(&self, point: Point<f64>, direction: Direction) -> Result<Point<f64>> {
        assert_eq!(direction, Direction::Downstream);
        self.snaps.fetch_add(1, Ordering::SeqCst);
        match self.behavior {
            SnapBehavior::Accept => Ok(Point::new(point.x(), 0.0)),
            SnapBehavior::Reject => Err(Error::SnapFailed {
                feature: format!("{:?}", point),
                reason: "trace did not intersect a flowline".into(),
            }),
            SnapBehavior::Stall => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Ok(point)
            }
        }
    }

    async fn split_catchment(&self, point: Point<f64>, upstream: bool) -> Result<Polygon<f64>> {
        assert!(upstream);
        self.split_points.lock().unwrap().push(point);
        if let SnapBehavior::Stall = self.behavior {
            tokio::time::sleep(Duration::from_secs(3600)).await;
        }
        let (x, y) = (point.x(), point.y());
        Ok(Polygon::new(
            LineString::from(vec![
                (x - 1.0, y - 1.0),
                (x, y - 1.0),
                (x, y + 1.0),
                (x - 1.0, y + 1.0),
                (x - 1.0, y - 1.0),
            ]),
            vec![],
        ))
    }
}

fn delineator(store: Arc<CountingStore>, snap: Arc<MockSnap>) -> BasinDelineator {
    let net = store.inner.clone();
    BasinDelineator::new(store, net, snap, &EngineConfig::default())
}

fn wqp(id: &str) -> SourceFeatureRef {
    SourceFeatureRef::new("wqp", id)
}

// ---------------------------------------------------------------------------
// Aggregation
// ---------------------------------------------------------------------------

#[tokio::test]
async fn comid_basin_unions_upstream_catchments() {
    let store = CountingStore::new(network());
    let snap = MockSnap::new(SnapBehavior::Reject);
    let d = delineator(store.clone(), snap.clone());

    let basin = d
        .delineate(&SourceFeatureRef::comid(SegmentId(13294390)), false, true)
        .await
        .unwrap();
    assert_eq!(basin.seed, SegmentId(13294390));
    assert!(!basin.split);
    assert!(!basin.simplified);
    // Seed (3 x 2) + three 1.1 x 2 mainstem catchments + two 1 x 2 tributary catchments
    let expected = 6.0 + 3.0 * 2.2 + 2.0 * 2.0;
    assert!(
        (area(&basin.geometry) - expected).abs() < 1e-6,
        "area {} != {}",
        area(&basin.geometry),
        expected
    );
    assert_eq!(store.unions.load(Ordering::SeqCst), 1);
    assert_eq!(snap.snaps(), 0);
    assert!(snap.splits().is_empty());
}

#[tokio::test]
async fn simplified_basin_keeps_area() {
    let d = delineator(CountingStore::new(network()), MockSnap::new(SnapBehavior::Reject));
    let reference = SourceFeatureRef::comid(SegmentId(13294390));

    let raw = d.delineate(&reference, false, false).await.unwrap();
    let simple = d.delineate(&reference, true, false).await.unwrap();
    assert!(simple.simplified);

    let vertices = |b: &MultiPolygon<f64>| b.0.iter().map(|p| p.exterior().0.len()).sum::<usize>();
    assert!(vertices(&simple.geometry) <= vertices(&raw.geometry));
    assert!((area(&simple.geometry) - area(&raw.geometry)).abs() < 1e-6);
}

#[tokio::test]
async fn line_feature_aggregates_even_when_split_allowed() {
    let snap = MockSnap::new(SnapBehavior::Accept);
    let d = delineator(CountingStore::new(network()), snap.clone());
    let basin = d.delineate(&wqp("USGS-LINE"), false, true).await.unwrap();
    assert!(!basin.split);
    assert_eq!(basin.seed, SegmentId(13294390));
    assert!(snap.splits().is_empty());
}

#[tokio::test]
async fn split_disabled_never_calls_snap_service() {
    let store = CountingStore::new(network());
    let snap = MockSnap::new(SnapBehavior::Accept);
    let d = delineator(store.clone(), snap.clone());

    for id in ["USGS-ONSEG", "USGS-ZERO", "USGS-NEAR", "USGS-FAR"] {
        let basin = d.delineate(&wqp(id), false, false).await.unwrap();
        assert!(!basin.split, "{} should aggregate", id);
    }
    assert_eq!(snap.snaps(), 0);
    assert!(snap.splits().is_empty());
    assert_eq!(store.unions.load(Ordering::SeqCst), 4);
}

// ---------------------------------------------------------------------------
// Pour-point fallback chain
// ---------------------------------------------------------------------------

#[tokio::test]
async fn recorded_measure_splits_without_snapping() {
    let store = CountingStore::new(network());
    let snap = MockSnap::new(SnapBehavior::Reject);
    let d = delineator(store.clone(), snap.clone());

    let basin = d.delineate(&wqp("USGS-ONSEG"), false, true).await.unwrap();
    assert!(basin.split);
    assert_eq!(basin.seed, SegmentId(13294382));
    assert_eq!(basin.geometry.0.len(), 1);

    let splits = snap.splits();
    assert_eq!(splits.len(), 1);
    assert!((splits[0].x() - 4.65).abs() < 1e-9, "split at {:?}", splits[0]);
    assert_eq!(snap.snaps(), 0, "Stage 1 success must not reach stage 3");
    assert_eq!(store.unions.load(Ordering::SeqCst), 0);
    assert_eq!(store.graphs.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn zero_measure_falls_through_to_estimation() {
    let snap = MockSnap::new(SnapBehavior::Reject);
    let d = delineator(CountingStore::new(network()), snap.clone());

    let pp = d.pour_point(&wqp("USGS-ZERO")).await.unwrap().unwrap();
    assert_eq!(pp.stage, PourPointStage::OnSegment);
    assert!((pp.point.x() - 7.675).abs() < 1e-9, "pour point {:?}", pp.point);
    assert_eq!(snap.snaps(), 0);
}

#[tokio::test]
async fn nearby_point_uses_nearest_point() {
    let snap = MockSnap::new(SnapBehavior::Reject);
    let d = delineator(CountingStore::new(network()), snap.clone());

    let pp = d.pour_point(&wqp("USGS-NEAR")).await.unwrap().unwrap();
    assert_eq!(pp.stage, PourPointStage::NearestPoint);
    assert!(pp.point.y().abs() < 1e-12);
    assert!((pp.point.x() - 10.15).abs() < 1e-9);
    assert_eq!(snap.snaps(), 0);
}

#[tokio::test]
async fn distant_point_reaches_external_snap() {
    let snap = MockSnap::new(SnapBehavior::Accept);
    let d = delineator(CountingStore::new(network()), snap.clone());

    let basin = d.delineate(&wqp("USGS-FAR"), true, true).await.unwrap();
    assert!(basin.split);
    assert!(basin.simplified);
    assert_eq!(snap.snaps(), 1);
    let splits = snap.splits();
    assert_eq!(splits.len(), 1);
    assert_eq!(splits[0], Point::new(9.05, 0.0));
}

#[tokio::test]
async fn rejected_everywhere_is_snap_failed() {
    let snap = MockSnap::new(SnapBehavior::Reject);
    let d = delineator(CountingStore::new(network()), snap.clone());

    match d.delineate(&wqp("USGS-FAR"), false, true).await {
        Err(e @ Error::SnapFailed { .. }) => {
            assert!(e.is_caller_error());
            let message = e.to_string();
            assert!(message.contains("wqp/USGS-FAR"), "{}", message);
            assert!(message.contains("nearest point"), "{}", message);
        }
        other => panic!("Expected SnapFailed, got {:?}", other),
    }
    assert_eq!(snap.snaps(), 1);
    assert!(snap.splits().is_empty(), "No split after a failed chain");
}

#[tokio::test(start_paused = true)]
async fn stalled_snap_service_is_unavailable() {
    let config = EngineConfig {
        timeouts: TimeoutConfig::with_store(Duration::from_millis(100)),
        ..EngineConfig::default()
    };
    let net = network();
    let d = BasinDelineator::new(
        net.clone(),
        net,
        MockSnap::new(SnapBehavior::Stall),
        &config,
    );

    match d.delineate(&wqp("USGS-FAR"), false, true).await {
        Err(Error::CollaboratorUnavailable { reason, .. }) => {
            assert!(reason.contains("200ms"), "{}", reason)
        }
        other => panic!("Expected CollaboratorUnavailable, got {:?}", other),
    }
}

// ---------------------------------------------------------------------------
// Resolution errors
// ---------------------------------------------------------------------------

#[tokio::test]
async fn unknown_features_are_not_found() {
    let d = delineator(CountingStore::new(network()), MockSnap::new(SnapBehavior::Accept));
    for reference in [
        wqp("USGS-NOPE"),
        SourceFeatureRef::new("unknown-source", "x"),
        SourceFeatureRef::new("comid", "13294366x"),
        SourceFeatureRef::comid(SegmentId(42)),
    ] {
        assert!(
            matches!(
                d.delineate(&reference, false, true).await,
                Err(Error::FeatureNotFound { .. })
            ),
            "{} should not resolve",
            reference
        );
    }
}
