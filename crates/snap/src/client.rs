//! Async client for an OGC API - Processes hydrologic snap service.
//!
//! Two processes are used:
//!
//! - `flowtrace`: trace from a point to the flowline network and report
//!   where the trace intersects it
//! - `splitcatchment`: split the local catchment at a point and return the
//!   drainage polygon upstream of it
//!
//! Requests are sent once. Every request carries an explicit timeout, and
//! dropping the returned future cancels it.

use crate::error::{Result, SnapError};
use crate::models::{
    ExecuteRequest, FeatureCollection, FlowtraceInputs, SplitCatchmentInputs,
};
use async_trait::async_trait;
use geo::{Point, Polygon};
use hydronav_core::network::Direction;
use hydronav_core::HydrologicSnapService;
use serde::Serialize;
use std::time::Duration;
use tracing::debug;

const FLOWTRACE: &str = "flowtrace";
const SPLIT_CATCHMENT: &str = "splitcatchment";

/// Feature ids of a split-catchment response, most preferred first.
const CATCHMENT_IDS: [&str; 2] = ["mergedCatchment", "splitCatchment"];

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

/// Configuration for [`HttpSnapService`].
#[derive(Debug, Clone)]
pub struct SnapClientOptions {
    /// Root of the processes API, e.g. `https://api.water.usgs.gov/nldi/pygeoapi`
    pub base_url: String,
    /// Per-request timeout (default 30 s).
    pub request_timeout: Duration,
}

impl Default for SnapClientOptions {
    fn default() -> Self {
        Self {
            base_url: "https://api.water.usgs.gov/nldi/pygeoapi".to_string(),
            request_timeout: Duration::from_secs(30),
        }
    }
}

impl SnapClientOptions {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// [`HydrologicSnapService`] backed by a remote processes endpoint.
pub struct HttpSnapService {
    client: reqwest::Client,
    options: SnapClientOptions,
}

impl HttpSnapService {
    /// Create a new client.
    pub fn new(options: SnapClientOptions) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(options.request_timeout)
            .build()?;
        Ok(Self { client, options })
    }

    /// `{base_url}/processes/{process}/execution`
    pub fn execution_url(&self, process: &str) -> String {
        format!(
            "{}/processes/{}/execution",
            self.options.base_url.trim_end_matches('/'),
            process
        )
    }

    /// Trace from `point` in `direction` and return the intersection with the network.
    pub async fn flowtrace(&self, point: Point<f64>, direction: Direction) -> Result<Point<f64>> {
        let inputs = FlowtraceInputs {
            lat: point.y(),
            lon: point.x(),
            direction: direction.as_str(),
            raindroptrace: true,
        };
        let collection = self.execute(FLOWTRACE, point, &inputs).await?;
        collection
            .features
            .iter()
            .find_map(|f| f.intersection_point())
            .ok_or_else(|| SnapError::Rejected {
                point: describe(point),
                reason: "flowtrace returned no intersection point".to_string(),
            })
    }

    /// Split the catchment at `point` and return the drainage polygon.
    ///
    /// Prefers the merged upstream catchment over the local split part.
    pub async fn split(&self, point: Point<f64>, upstream: bool) -> Result<Polygon<f64>> {
        let inputs = SplitCatchmentInputs {
            lat: point.y(),
            lon: point.x(),
            upstream,
        };
        let collection = self.execute(SPLIT_CATCHMENT, point, &inputs).await?;

        for wanted in CATCHMENT_IDS {
            let polygon = collection
                .features
                .iter()
                .filter(|f| f.id_str().as_deref() == Some(wanted))
                .find_map(|f| f.geometry.as_ref().and_then(|g| g.to_polygon()));
            if let Some(polygon) = polygon {
                debug!("splitcatchment at {} returned {}", describe(point), wanted);
                return Ok(polygon);
            }
        }
        Err(SnapError::Rejected {
            point: describe(point),
            reason: "splitcatchment returned no catchment polygon".to_string(),
        })
    }

    async fn execute<I: Serialize>(
        &self,
        process: &str,
        point: Point<f64>,
        inputs: &I,
    ) -> Result<FeatureCollection> {
        let url = self.execution_url(process);
        debug!("POST {}", url);

        let resp = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .json(&ExecuteRequest { inputs })
            .send()
            .await
            .map_err(|e| SnapError::from_request(e, self.options.request_timeout))?;

        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| SnapError::from_request(e, self.options.request_timeout))?;

        // 408 and 429 are transient, not a verdict on the point
        if status.is_client_error() && !matches!(status.as_u16(), 408 | 429) {
            return Err(SnapError::Rejected {
                point: describe(point),
                reason: format!("{} HTTP {}: {}", process, status.as_u16(), truncate(&body)),
            });
        }
        if !status.is_success() {
            return Err(SnapError::Status {
                status: status.as_u16(),
                url,
                body: truncate(&body),
            });
        }

        serde_json::from_str(&body)
            .map_err(|e| SnapError::Payload(format!("parsing {} response: {}", process, e)))
    }
}

#[async_trait]
impl HydrologicSnapService for HttpSnapService {
    async fn snap_to_network(
        &self,
        point: Point<f64>,
        direction: Direction,
    ) -> hydronav_core::Result<Point<f64>> {
        Ok(self.flowtrace(point, direction).await?)
    }

    async fn split_catchment(
        &self,
        point: Point<f64>,
        upstream: bool,
    ) -> hydronav_core::Result<Polygon<f64>> {
        Ok(self.split(point, upstream).await?)
    }
}

fn describe(point: Point<f64>) -> String {
    format!("({}, {})", point.x(), point.y())
}

fn truncate(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((i, _)) => format!("{}...", &body[..i]),
        None => body.to_string(),
    }
}
