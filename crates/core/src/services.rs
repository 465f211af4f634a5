//! Collaborator traits consumed by the engine.
//!
//! The engine never owns network data or geometry processing. It talks to
//! three injected collaborators:
//!
//! - [`FlowNetworkStore`]: segment records, graph walks, spatial projection
//!   and catchment aggregation
//! - [`FeatureCatalog`]: externally sourced features indexed onto the network
//! - [`HydrologicSnapService`]: remote snap / split-catchment processing
//!
//! All methods are async so that a store backed by a database or a remote
//! RPC works the same way as the in-memory one. Implementations report
//! transport failures as [`Error::CollaboratorUnavailable`](crate::Error).

use crate::error::Result;
use crate::network::{Direction, Segment, SegmentId, TraversalRequest};
use crate::vector::{SourceFeature, SourceFeatureRef};
use async_trait::async_trait;
use geo_types::{MultiPolygon, Point, Polygon};
use std::collections::BTreeSet;

/// Read-only access to the flow network.
#[async_trait]
pub trait FlowNetworkStore: Send + Sync {
    /// Look up a segment by id.
    async fn segment(&self, id: SegmentId) -> Result<Option<Segment>>;

    /// Run a bounded walk and return every admitted segment, the seed included.
    async fn resolve_graph(&self, request: &TraversalRequest) -> Result<BTreeSet<SegmentId>>;

    /// Find the segment a raw coordinate belongs to, if any lies within `tolerance`.
    async fn project_point(&self, point: Point<f64>, tolerance: f64) -> Result<Option<SegmentId>>;

    /// Union the catchments of `ids`, simplifying with `simplify_tolerance` when given.
    async fn union_and_simplify(
        &self,
        ids: &BTreeSet<SegmentId>,
        simplify_tolerance: Option<f64>,
    ) -> Result<MultiPolygon<f64>>;
}

/// Lookup of externally sourced features.
#[async_trait]
pub trait FeatureCatalog: Send + Sync {
    async fn feature(&self, reference: &SourceFeatureRef) -> Result<Option<SourceFeature>>;

    /// Features of `source` whose associated segment is in `ids`.
    async fn features_on(
        &self,
        source: &str,
        ids: &BTreeSet<SegmentId>,
    ) -> Result<Vec<SourceFeature>>;
}

/// Remote hydrologic processing endpoint.
#[async_trait]
pub trait HydrologicSnapService: Send + Sync {
    /// Trace from `point` in `direction` and return where it meets the network.
    async fn snap_to_network(&self, point: Point<f64>, direction: Direction) -> Result<Point<f64>>;

    /// Split the catchment containing `point` and return the drainage polygon.
    async fn split_catchment(&self, point: Point<f64>, upstream: bool) -> Result<Polygon<f64>>;
}
