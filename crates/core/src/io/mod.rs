//! I/O for flow network documents
//!
//! Networks are exchanged as JSON: `{ "segments": [...], "features": [...] }`.
//! Field names follow the Rust model; the common NHDPlus attribute names
//! (`comid`, `hydroseq`, `dnhydroseq`, ...) are accepted as aliases.

mod json;

pub use json::{
    read_network, read_network_from_slice, read_network_from_str, FeatureRecord, GeometryRecord,
    NetworkDocument, SegmentRecord,
};
