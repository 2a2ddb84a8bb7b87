use std::io;

use thiserror::Error;

/// Every failure aborts the whole run; nothing is persisted on error.
#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("archive index unavailable for {url}: {reason}")]
    ArchiveUnavailable { url: String, reason: String },
    #[error("could not fetch snapshot {url}: {reason}")]
    SnapshotFetchFailed { url: String, reason: String },
    #[error("extraction invariant violated: {0}")]
    ExtractionInvariantViolation(String),
    #[error("malformed archive index: {0}")]
    MalformedIndex(String),
    #[error("malformed wide table: {0}")]
    MalformedTable(String),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Csv(#[from] csv::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ScrapeError>;
