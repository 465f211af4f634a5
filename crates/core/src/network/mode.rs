//! Navigation modes, requests and results

use super::SegmentId;
use crate::error::Error;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// Direction of a walk relative to flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Upstream,
    Downstream,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Upstream => "up",
            Direction::Downstream => "down",
        }
    }
}

/// Navigation mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NavigationMode {
    /// Upstream along the seed's mainstem only
    UpstreamMain,
    /// Upstream through every inflow
    UpstreamTributaries,
    /// Downstream along the seed's terminal path
    DownstreamMain,
    /// Downstream through every outflow, diversions included
    DownstreamDiversions,
}

impl NavigationMode {
    pub const ALL: [NavigationMode; 4] = [
        NavigationMode::UpstreamMain,
        NavigationMode::UpstreamTributaries,
        NavigationMode::DownstreamMain,
        NavigationMode::DownstreamDiversions,
    ];

    /// Two-letter mode code.
    pub fn code(&self) -> &'static str {
        match self {
            NavigationMode::UpstreamMain => "UM",
            NavigationMode::UpstreamTributaries => "UT",
            NavigationMode::DownstreamMain => "DM",
            NavigationMode::DownstreamDiversions => "DD",
        }
    }

    pub fn direction(&self) -> Direction {
        match self {
            NavigationMode::UpstreamMain | NavigationMode::UpstreamTributaries => {
                Direction::Upstream
            }
            NavigationMode::DownstreamMain | NavigationMode::DownstreamDiversions => {
                Direction::Downstream
            }
        }
    }

    pub fn is_upstream(&self) -> bool {
        self.direction() == Direction::Upstream
    }
}

impl fmt::Display for NavigationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for NavigationMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "um" | "upstreammain" | "upstream-main" => Ok(NavigationMode::UpstreamMain),
            "ut" | "upstreamtributaries" | "upstream-tributaries" => {
                Ok(NavigationMode::UpstreamTributaries)
            }
            "dm" | "downstreammain" | "downstream-main" => Ok(NavigationMode::DownstreamMain),
            "dd" | "downstreamdiversions" | "downstream-diversions" => {
                Ok(NavigationMode::DownstreamDiversions)
            }
            _ => Err(Error::InvalidMode(s.to_string())),
        }
    }
}

/// A resolved location on the network.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NetworkPosition {
    pub segment: SegmentId,
    /// Linear-reference position, 0..=100
    pub measure: f64,
}

impl NetworkPosition {
    pub fn new(segment: SegmentId, measure: f64) -> Self {
        Self { segment, measure }
    }
}

/// Caller-facing navigation request.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NavigationRequest {
    pub seed: SegmentId,
    pub mode: NavigationMode,
    /// Distance budget in km
    pub max_distance: f64,
}

impl NavigationRequest {
    pub fn new(seed: SegmentId, mode: NavigationMode, max_distance: f64) -> Self {
        Self {
            seed,
            mode,
            max_distance,
        }
    }
}

/// Segments reachable under a [`NavigationRequest`]. Always contains the seed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavigationResult {
    pub seed: SegmentId,
    pub mode: NavigationMode,
    pub segments: BTreeSet<SegmentId>,
}

impl NavigationResult {
    pub fn new(seed: SegmentId, mode: NavigationMode, mut segments: BTreeSet<SegmentId>) -> Self {
        segments.insert(seed);
        Self {
            seed,
            mode,
            segments,
        }
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn contains(&self, id: SegmentId) -> bool {
        self.segments.contains(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &SegmentId> {
        self.segments.iter()
    }
}
