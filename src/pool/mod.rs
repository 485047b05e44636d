//! Multi-source transaction record aggregation

pub mod group;
pub mod types;

pub use group::PoolGroup;
pub use types::Record;
