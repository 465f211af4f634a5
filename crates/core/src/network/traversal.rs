//! Declarative traversal requests.
//!
//! A [`TraversalRequest`] carries everything a store needs to run a bounded
//! walk from a seed: which sequence links to follow, which candidates to
//! admit and which admitted segments stop their branch. Stores are free to
//! evaluate it as an in-process worklist or translate it into a recursive
//! query.

use super::{NavigationMode, Segment, COASTAL_CLASS_CODE};

/// Slack applied to distance comparisons so accumulated path lengths that
/// land exactly on the budget are admitted.
pub const DISTANCE_EPSILON: f64 = 1e-9;

/// Which sequence links a walk follows from the current segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Adjacency {
    /// The single segment whose `sequence` equals `up_sequence`
    UpMain,
    /// Every segment whose `down_sequence` or `down_minor_sequence` equals `sequence`
    Inflows,
    /// The segment whose `sequence` equals `down_sequence`
    Down,
    /// `down_sequence` plus a non-zero `down_minor_sequence`
    DownWithMinor,
}

/// Path identity a candidate must share with the seed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathConstraint {
    None,
    Mainstem(u64),
    Terminal(u64),
}

impl PathConstraint {
    pub fn admits(&self, candidate: &Segment) -> bool {
        match *self {
            PathConstraint::None => true,
            PathConstraint::Mainstem(id) => candidate.mainstem_path_id == id,
            PathConstraint::Terminal(id) => candidate.terminal_path_id == id,
        }
    }
}

/// Distance budget expressed against each candidate's own path length.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DistanceBound {
    Unbounded,
    /// Upstream: `candidate.path_length <= limit`
    MaxPathLength(f64),
    /// Downstream: `candidate.upstream_top() >= limit`
    MinUpstreamTop(f64),
}

impl DistanceBound {
    pub fn admits(&self, candidate: &Segment) -> bool {
        match *self {
            DistanceBound::Unbounded => true,
            DistanceBound::MaxPathLength(limit) => candidate.path_length <= limit + DISTANCE_EPSILON,
            DistanceBound::MinUpstreamTop(limit) => {
                candidate.upstream_top() >= limit - DISTANCE_EPSILON
            }
        }
    }
}

/// A bounded walk from a seed segment.
#[derive(Debug, Clone, PartialEq)]
pub struct TraversalRequest {
    pub seed: Segment,
    pub mode: NavigationMode,
    pub adjacency: Adjacency,
    pub path: PathConstraint,
    pub bound: DistanceBound,
    /// Candidates with this class code are never admitted
    pub exclude_class_code: Option<i32>,
    /// Admitted network-start segments do not expand further
    pub halt_at_start: bool,
    /// Admitted network-terminal segments do not expand further
    pub halt_at_terminal: bool,
}

impl TraversalRequest {
    /// Build the walk for `mode` from `seed`. `None` means no distance bound.
    pub fn for_mode(seed: &Segment, mode: NavigationMode, distance: Option<f64>) -> Self {
        let (adjacency, path) = match mode {
            NavigationMode::UpstreamMain => {
                (Adjacency::UpMain, PathConstraint::Mainstem(seed.mainstem_path_id))
            }
            NavigationMode::UpstreamTributaries => (Adjacency::Inflows, PathConstraint::None),
            NavigationMode::DownstreamMain => {
                (Adjacency::Down, PathConstraint::Terminal(seed.terminal_path_id))
            }
            NavigationMode::DownstreamDiversions => (Adjacency::DownWithMinor, PathConstraint::None),
        };

        let bound = match distance {
            None => DistanceBound::Unbounded,
            Some(d) if mode.is_upstream() => DistanceBound::MaxPathLength(seed.path_length + d),
            Some(d) => DistanceBound::MinUpstreamTop(seed.upstream_top() - d),
        };

        Self {
            seed: seed.clone(),
            mode,
            adjacency,
            path,
            bound,
            exclude_class_code: Some(COASTAL_CLASS_CODE),
            halt_at_start: mode.is_upstream(),
            halt_at_terminal: !mode.is_upstream(),
        }
    }

    /// Whether a neighbor reached by this walk joins the result.
    pub fn admits(&self, candidate: &Segment) -> bool {
        if self.exclude_class_code == Some(candidate.class_code) {
            return false;
        }
        self.path.admits(candidate) && self.bound.admits(candidate)
    }

    /// Whether the walk continues past an admitted segment (or the seed).
    pub fn expands(&self, segment: &Segment) -> bool {
        if self.exclude_class_code == Some(segment.class_code) {
            return false;
        }
        if self.halt_at_start && segment.is_network_start {
            return false;
        }
        if self.halt_at_terminal && segment.is_network_terminal {
            return false;
        }
        true
    }
}
