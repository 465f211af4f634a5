//! Flow network model: segments, positions, navigation modes and the
//! declarative traversal request shared between the engine and stores.

mod mode;
mod segment;
mod traversal;

pub use mode::{Direction, NavigationMode, NavigationRequest, NavigationResult, NetworkPosition};
pub use segment::{Segment, SegmentId, COASTAL_CLASS_CODE, NO_SEQUENCE};
pub use traversal::{
    Adjacency, DistanceBound, PathConstraint, TraversalRequest, DISTANCE_EPSILON,
};
