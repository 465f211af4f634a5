//! # HydroNav Core
//!
//! Core types, collaborator traits and I/O for the HydroNav flow-network engine.
//!
//! This crate provides:
//! - `Segment`, `SegmentId`: flowline records keyed by COMID
//! - `NavigationMode`, `NavigationResult`, `NetworkPosition`: navigation model
//! - `TraversalRequest`: the declarative walk handed to stores
//! - `SourceFeature`, `Basin`: feature and basin records
//! - Collaborator traits (`FlowNetworkStore`, `FeatureCatalog`, `HydrologicSnapService`)
//! - JSON network document I/O

pub mod error;
pub mod io;
pub mod network;
pub mod services;
pub mod vector;

pub use error::{Error, Result};
pub use network::{
    Direction, NavigationMode, NavigationRequest, NavigationResult, NetworkPosition, Segment,
    SegmentId, TraversalRequest,
};
pub use services::{FeatureCatalog, FlowNetworkStore, HydrologicSnapService};
pub use vector::{AttributeValue, Basin, SourceFeature, SourceFeatureRef};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::error::{Error, Result};
    pub use crate::network::{
        Direction, NavigationMode, NavigationResult, NetworkPosition, Segment, SegmentId,
    };
    pub use crate::services::{FeatureCatalog, FlowNetworkStore, HydrologicSnapService};
    pub use crate::vector::{Basin, SourceFeature, SourceFeatureRef};
}
