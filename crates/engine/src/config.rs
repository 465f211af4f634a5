//! Engine configuration
//!
//! Policy constants live here exactly once. Each struct has a `Default`
//! matching production behavior and can be deserialized from JSON with any
//! subset of fields present.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Linear-referencing tolerances (CRS units for distances, measure units for trim).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReferencingConfig {
    /// Maximum distance from a point to a segment for measure estimation.
    /// Default: 0.001
    pub snap_tolerance: f64,
    /// Trimming is skipped when `100 - measure` is below this value.
    /// Default: 0.1
    pub trim_tolerance: f64,
}

impl Default for ReferencingConfig {
    fn default() -> Self {
        Self {
            snap_tolerance: 0.001,
            trim_tolerance: 0.1,
        }
    }
}

/// Basin delineation policy.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DelineationConfig {
    /// Maximum distance for the nearest-point pour-point fallback.
    /// Default: 0.01
    pub pour_point_threshold: f64,
    /// Douglas-Peucker tolerance applied when a simplified basin is requested.
    /// Default: 0.0005
    pub simplify_tolerance: f64,
}

impl Default for DelineationConfig {
    fn default() -> Self {
        Self {
            pour_point_threshold: 0.01,
            simplify_tolerance: 0.0005,
        }
    }
}

/// Per-call collaborator timeouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Store query timeout in milliseconds (default 15 s)
    pub store_ms: u64,
    /// Snap service timeout in milliseconds (default 30 s)
    pub snap_ms: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self::with_store(Duration::from_secs(15))
    }
}

impl TimeoutConfig {
    /// Timeouts derived from a store baseline; the snap service gets double.
    pub fn with_store(store: Duration) -> Self {
        let store_ms = store.as_millis() as u64;
        Self {
            store_ms,
            snap_ms: store_ms.saturating_mul(2),
        }
    }

    pub fn store(&self) -> Duration {
        Duration::from_millis(self.store_ms)
    }

    pub fn snap(&self) -> Duration {
        Duration::from_millis(self.snap_ms)
    }
}

/// Full engine configuration.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub referencing: ReferencingConfig,
    pub delineation: DelineationConfig,
    pub timeouts: TimeoutConfig,
}
