//! Data layer for the accumulated traffic history.
//!
//! Holds the record models, the timestamp-keyed merge, and the JSON state file.

mod merge;
mod models;
mod storage;

pub use merge::MergeStats;
pub use models::{Metric, Store, TrafficRecord, TrafficSummary};
pub use storage::StateFile;
