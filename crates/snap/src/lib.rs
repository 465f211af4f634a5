//! # HydroNav Snap
//!
//! HTTP implementation of [`HydrologicSnapService`](hydronav_core::HydrologicSnapService)
//! against an OGC API - Processes endpoint exposing `flowtrace` and
//! `splitcatchment` (such as the NLDI pygeoapi deployment).
//!
//! Transport failures, timeouts and server errors surface to the engine as
//! `CollaboratorUnavailable`; a service that answers but cannot place the
//! point surfaces as `SnapFailed`.

pub mod client;
pub mod error;
pub mod models;

pub use client::{HttpSnapService, SnapClientOptions};
pub use error::{Result, SnapError};
