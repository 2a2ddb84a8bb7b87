pub mod archive;
pub mod config;
pub mod error;
pub mod extract;
pub mod merge;
pub mod normalize;
pub mod pipeline;
pub mod series;
pub mod store;

// Re-export tests for integration testing
#[cfg(test)]
pub mod tests;

// Re-export key types and functions for easier access
pub use crate::archive::{SnapshotArchive, SnapshotRecord, WaybackClient};
pub use crate::config::{default_windows, RegionLabels, TimeWindow};
pub use crate::error::ScrapeError;
pub use crate::extract::{Extractor, RawObservation};
pub use crate::normalize::normalize;
pub use crate::pipeline::Orchestrator;
pub use crate::series::{CaseRow, Observation, ResultSet};
pub use crate::store::{read_result_set, write_result_set, IncrementalState};
