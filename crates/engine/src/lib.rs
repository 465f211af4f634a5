//! # HydroNav Engine
//!
//! Navigation and basin delineation over a hydrographic flow network.
//!
//! ## Components
//!
//! - **Navigation**: upstream / downstream walks under UM, UT, DM and DD
//! - **Linear referencing**: measure estimation, point-at-measure, trimming
//! - **Basin delineation**: catchment aggregation or split at a pour point
//! - **Store**: in-memory `FlowNetworkStore` and `FeatureCatalog`
//! - **Geometry**: catchment union and basin simplification
//!
//! Collaborators are injected as `Arc<dyn Trait>`; every call to one is
//! bounded by the timeouts in [`EngineConfig`].
//!
//! ```no_run
//! use hydronav_engine::prelude::*;
//! use std::sync::Arc;
//!
//! # async fn run() -> hydronav_core::Result<()> {
//! let doc = hydronav_core::io::read_network("network.json")?;
//! let network = Arc::new(MemoryNetwork::from_document(doc));
//! let engine = NavigationEngine::new(network.clone(), network, &EngineConfig::default());
//! let result = engine
//!     .navigate(SegmentId(13294366), NavigationMode::DownstreamMain, 10.0)
//!     .await?;
//! println!("{} segments", result.len());
//! # Ok(())
//! # }
//! ```

pub mod basin;
mod bounded;
pub mod config;
pub mod geometry;
pub mod linear_ref;
pub mod navigation;
pub mod store;

pub use basin::{BasinDelineator, PourPoint, PourPointStage};
pub use config::{DelineationConfig, EngineConfig, ReferencingConfig, TimeoutConfig};
pub use linear_ref::LinearReferencer;
pub use navigation::{Flowline, NavigationEngine};
pub use store::MemoryNetwork;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::basin::{BasinDelineator, PourPoint, PourPointStage};
    pub use crate::config::EngineConfig;
    pub use crate::linear_ref::LinearReferencer;
    pub use crate::navigation::{Flowline, NavigationEngine};
    pub use crate::store::MemoryNetwork;
    pub use hydronav_core::prelude::*;
}
