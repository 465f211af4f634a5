//! Flow network stores

mod memory;

pub use memory::MemoryNetwork;
