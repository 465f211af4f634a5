//! Basin delineation
//!
//! A basin is the drainage area upstream of a feature. Two strategies:
//!
//! - **Aggregate**: walk every tributary above the associated segment and
//!   union their catchments in the store.
//! - **Split**: for point features, place a pour point on the network and
//!   ask the hydrologic snap service to split the local catchment there.
//!   Only this path yields a basin whose outlet is the point itself.

mod pour_point;

pub use pour_point::{PourPoint, PourPointLocator, PourPointStage};

use crate::bounded::{bounded, CATALOG, SNAP, STORE};
use crate::config::{DelineationConfig, EngineConfig, TimeoutConfig};
use crate::geometry::simplify_basin;
use crate::navigation::NavigationEngine;
use geo::{MultiPolygon, Point};
use hydronav_core::network::{NavigationMode, Segment, SegmentId};
use hydronav_core::{
    Basin, Error, FeatureCatalog, FlowNetworkStore, HydrologicSnapService, Result, SourceFeature,
    SourceFeatureRef,
};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// What a feature reference resolved to.
#[derive(Debug, Clone)]
enum Outlet {
    /// Aggregate everything above this segment
    Segment(Segment),
    /// Split the catchment of `segment` at a point feature
    Point {
        feature: SourceFeature,
        segment: Segment,
        point: Point<f64>,
    },
}

/// Delineates upstream basins for network segments and source features.
#[derive(Clone)]
pub struct BasinDelineator {
    navigator: NavigationEngine,
    store: Arc<dyn FlowNetworkStore>,
    catalog: Arc<dyn FeatureCatalog>,
    snap: Arc<dyn HydrologicSnapService>,
    locator: PourPointLocator,
    config: DelineationConfig,
    timeouts: TimeoutConfig,
}

impl BasinDelineator {
    pub fn new(
        store: Arc<dyn FlowNetworkStore>,
        catalog: Arc<dyn FeatureCatalog>,
        snap: Arc<dyn HydrologicSnapService>,
        config: &EngineConfig,
    ) -> Self {
        let navigator = NavigationEngine::new(store.clone(), catalog.clone(), config);
        let locator = PourPointLocator::new(
            *navigator.referencer(),
            snap.clone(),
            config.delineation.pour_point_threshold,
            config.timeouts,
        );
        Self {
            navigator,
            store,
            catalog,
            snap,
            locator,
            config: config.delineation,
            timeouts: config.timeouts,
        }
    }

    /// Delineate the basin draining to `reference`.
    ///
    /// `simplify` applies the configured Douglas-Peucker tolerance.
    /// `allow_split` lets point features be split at their pour point;
    /// without it every feature aggregates whole catchments.
    pub async fn delineate(
        &self,
        reference: &SourceFeatureRef,
        simplify: bool,
        allow_split: bool,
    ) -> Result<Basin> {
        self.delineate_detailed(reference, simplify, allow_split)
            .await
            .map(|(basin, _)| basin)
    }

    /// Like [`delineate`](Self::delineate), also returning the pour point
    /// when the basin was split.
    pub async fn delineate_detailed(
        &self,
        reference: &SourceFeatureRef,
        simplify: bool,
        allow_split: bool,
    ) -> Result<(Basin, Option<PourPoint>)> {
        let (basin, pour_point) = match self.resolve(reference, allow_split).await? {
            Outlet::Segment(segment) => {
                let basin = self.aggregate(segment.id, simplify).await?;
                if basin.geometry.0.is_empty() {
                    warn!("No catchments above {} for {}", segment.id, reference);
                    return Err(Error::FeatureNotFound {
                        origin: reference.source.clone(),
                        identifier: reference.identifier.clone(),
                    });
                }
                (basin, None)
            }
            Outlet::Point {
                feature,
                segment,
                point,
            } => {
                let pour_point = self.locator.locate(&feature, &segment, point).await?;
                let basin = self.split(&segment, pour_point, simplify).await?;
                (basin, Some(pour_point))
            }
        };
        info!(
            "Delineated {} at {}: {} polygon(s), split={}, simplified={}",
            reference,
            basin.seed,
            basin.geometry.0.len(),
            basin.split,
            basin.simplified
        );
        Ok((basin, pour_point))
    }

    /// Resolve the pour point a split would use, without splitting.
    pub async fn pour_point(&self, reference: &SourceFeatureRef) -> Result<Option<PourPoint>> {
        match self.resolve(reference, true).await? {
            Outlet::Segment(_) => Ok(None),
            Outlet::Point {
                feature,
                segment,
                point,
            } => self.locator.locate(&feature, &segment, point).await.map(Some),
        }
    }

    async fn resolve(&self, reference: &SourceFeatureRef, allow_split: bool) -> Result<Outlet> {
        let not_found = || Error::FeatureNotFound {
            origin: reference.source.clone(),
            identifier: reference.identifier.clone(),
        };

        if reference.is_network_native() {
            let id: SegmentId = reference.identifier.parse().map_err(|_| not_found())?;
            let segment = self.fetch(id).await?.ok_or_else(not_found)?;
            return Ok(Outlet::Segment(segment));
        }

        let feature = bounded(CATALOG, self.timeouts.store(), self.catalog.feature(reference))
            .await?
            .ok_or_else(not_found)?;
        let id = feature.segment.ok_or_else(not_found)?;
        let segment = self.fetch(id).await?.ok_or_else(not_found)?;

        match feature.point() {
            Some(point) if allow_split => Ok(Outlet::Point {
                feature,
                segment,
                point,
            }),
            _ => Ok(Outlet::Segment(segment)),
        }
    }

    async fn fetch(&self, id: SegmentId) -> Result<Option<Segment>> {
        bounded(STORE, self.timeouts.store(), self.store.segment(id)).await
    }

    async fn aggregate(&self, seed: SegmentId, simplify: bool) -> Result<Basin> {
        let upstream = self
            .navigator
            .walk(seed, NavigationMode::UpstreamTributaries, None)
            .await?;
        debug!("Aggregating {} catchments above {}", upstream.len(), seed);
        let tolerance = simplify.then_some(self.config.simplify_tolerance);
        let geometry = bounded(
            STORE,
            self.timeouts.store(),
            self.store.union_and_simplify(&upstream.segments, tolerance),
        )
        .await?;
        Ok(Basin {
            seed,
            geometry,
            split: false,
            simplified: simplify,
        })
    }

    async fn split(&self, segment: &Segment, pour_point: PourPoint, simplify: bool) -> Result<Basin> {
        let polygon = bounded(
            SNAP,
            self.timeouts.snap(),
            self.snap.split_catchment(pour_point.point, true),
        )
        .await?;
        let mut geometry = MultiPolygon::new(vec![polygon]);
        if simplify {
            geometry = simplify_basin(&geometry, self.config.simplify_tolerance);
        }
        Ok(Basin {
            seed: segment.id,
            geometry,
            split: true,
            simplified: simplify,
        })
    }
}
