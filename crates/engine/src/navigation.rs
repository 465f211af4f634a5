//! Network navigation
//!
//! The engine validates a navigation request, turns it into a
//! [`TraversalRequest`] and hands the walk to the [`FlowNetworkStore`].
//! Results can be returned as bare segment ids, as flowline geometry with
//! the seed optionally trimmed at a measure, or as the source features
//! indexed on the visited segments.

use crate::bounded::{bounded, CATALOG, STORE};
use crate::config::{EngineConfig, TimeoutConfig};
use crate::linear_ref::LinearReferencer;
use geo::{LineString, Point};
use hydronav_core::network::{
    NavigationMode, NavigationRequest, NavigationResult, NetworkPosition, Segment, SegmentId,
    TraversalRequest,
};
use hydronav_core::{Error, FeatureCatalog, FlowNetworkStore, Result, SourceFeature};
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Geometry of one navigated segment.
#[derive(Debug, Clone, PartialEq)]
pub struct Flowline {
    pub segment: SegmentId,
    pub geometry: LineString<f64>,
    /// Whether the geometry was cut at the starting measure
    pub trimmed: bool,
}

/// Upstream / downstream navigation over an injected flow network store.
#[derive(Clone)]
pub struct NavigationEngine {
    store: Arc<dyn FlowNetworkStore>,
    catalog: Arc<dyn FeatureCatalog>,
    referencer: LinearReferencer,
    timeouts: TimeoutConfig,
}

impl NavigationEngine {
    pub fn new(
        store: Arc<dyn FlowNetworkStore>,
        catalog: Arc<dyn FeatureCatalog>,
        config: &EngineConfig,
    ) -> Self {
        Self {
            store,
            catalog,
            referencer: LinearReferencer::new(config.referencing),
            timeouts: config.timeouts,
        }
    }

    pub fn referencer(&self) -> &LinearReferencer {
        &self.referencer
    }

    /// Segments reachable from `seed` under `mode` within `distance` km.
    ///
    /// The result always contains the seed. A distance of zero yields just
    /// the seed.
    pub async fn navigate(
        &self,
        seed: SegmentId,
        mode: NavigationMode,
        distance: f64,
    ) -> Result<NavigationResult> {
        if !distance.is_finite() || distance < 0.0 {
            return Err(Error::InvalidDistance(distance));
        }
        let result = if distance == 0.0 {
            // inclusive bounds would admit zero-length neighbors
            self.seed(seed).await?;
            NavigationResult::new(seed, mode, BTreeSet::new())
        } else {
            self.walk(seed, mode, Some(distance)).await?
        };
        info!(
            "Navigated {} from {} within {} km: {} segments",
            mode,
            seed,
            distance,
            result.len()
        );
        Ok(result)
    }

    pub async fn navigate_request(&self, request: &NavigationRequest) -> Result<NavigationResult> {
        self.navigate(request.seed, request.mode, request.max_distance)
            .await
    }

    /// Like [`navigate`](Self::navigate) with the mode given as a code ("UM", "ut", ...).
    pub async fn navigate_str(
        &self,
        seed: SegmentId,
        mode: &str,
        distance: f64,
    ) -> Result<NavigationResult> {
        let mode: NavigationMode = mode.parse()?;
        self.navigate(seed, mode, distance).await
    }

    /// Walk without validating a distance; `None` means unbounded.
    pub(crate) async fn walk(
        &self,
        seed: SegmentId,
        mode: NavigationMode,
        distance: Option<f64>,
    ) -> Result<NavigationResult> {
        let seed_segment = self.seed(seed).await?;
        let request = TraversalRequest::for_mode(&seed_segment, mode, distance);
        debug!(
            "Traversal from {}: {:?} {:?} {:?}",
            seed, request.adjacency, request.path, request.bound
        );
        let segments = bounded(
            STORE,
            self.timeouts.store(),
            self.store.resolve_graph(&request),
        )
        .await?;
        Ok(NavigationResult::new(seed, mode, segments))
    }

    /// Fetch a segment, mapping a missing record to `InvalidSeed`.
    pub async fn seed(&self, id: SegmentId) -> Result<Segment> {
        bounded(STORE, self.timeouts.store(), self.store.segment(id))
            .await?
            .ok_or(Error::InvalidSeed(id))
    }

    /// Measure of `point` on `segment`, within the snap tolerance.
    pub async fn estimate_measure(&self, point: Point<f64>, segment: SegmentId) -> Result<f64> {
        let segment = self.seed(segment).await?;
        self.referencer.estimate_measure(point, &segment)
    }

    /// Project a raw coordinate onto the network.
    pub async fn resolve_position(&self, point: Point<f64>) -> Result<NetworkPosition> {
        let tolerance = self.referencer.config().snap_tolerance;
        let projected = bounded(
            STORE,
            self.timeouts.store(),
            self.store.project_point(point, tolerance),
        )
        .await?;
        let Some(id) = projected else {
            return Err(Error::NotOnNetwork {
                segment: None,
                distance: f64::INFINITY,
                tolerance,
            });
        };
        let segment = self.seed(id).await?;
        let measure = self.referencer.locate_measure(point, &segment);
        debug!("Resolved {:?} to {} at measure {:.3}", point, id, measure);
        Ok(NetworkPosition::new(id, measure))
    }

    /// Navigate from a position and return flowline geometry.
    ///
    /// With `trim` set, the seed's geometry is cut at `position.measure`
    /// so that only the part in the walk direction remains.
    pub async fn navigate_flowlines(
        &self,
        position: NetworkPosition,
        mode: NavigationMode,
        distance: f64,
        trim: bool,
    ) -> Result<Vec<Flowline>> {
        let result = self.navigate(position.segment, mode, distance).await?;
        let mut flowlines = Vec::with_capacity(result.len());

        for &id in result.iter() {
            let segment = match bounded(STORE, self.timeouts.store(), self.store.segment(id)).await? {
                Some(s) => s,
                None => {
                    warn!("Segment {} returned by traversal has no record", id);
                    continue;
                }
            };
            if trim && id == position.segment {
                let geometry = self
                    .referencer
                    .trim(&segment, position.measure, mode.direction());
                let trimmed = geometry != segment.geometry;
                flowlines.push(Flowline {
                    segment: id,
                    geometry,
                    trimmed,
                });
            } else {
                flowlines.push(Flowline {
                    segment: id,
                    geometry: segment.geometry,
                    trimmed: false,
                });
            }
        }
        Ok(flowlines)
    }

    /// Features of `source` indexed on the navigated segments.
    pub async fn navigate_features(
        &self,
        seed: SegmentId,
        mode: NavigationMode,
        distance: f64,
        source: &str,
    ) -> Result<Vec<SourceFeature>> {
        let result = self.navigate(seed, mode, distance).await?;
        let features = bounded(
            CATALOG,
            self.timeouts.store(),
            self.catalog.features_on(source, &result.segments),
        )
        .await?;
        info!(
            "{} {} features along {} from {}",
            features.len(),
            source,
            mode,
            seed
        );
        Ok(features)
    }
}
