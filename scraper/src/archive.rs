use std::collections::HashSet;

use chrono::NaiveDateTime;
use log::{debug, info};
use reqwest::blocking::{Client, Response};
use reqwest::StatusCode;
use serde::Deserialize;

use crate::config::{DEFAULT_ARCHIVE_URL, DEFAULT_AVAILABILITY_URL};
use crate::error::{Result, ScrapeError};

const ARCHIVE_TIMESTAMP_FORMAT: &str = "%Y%m%d%H%M%S";

/// One archived crawl of a URL, as listed by the CDX index.
#[derive(Debug, Clone, PartialEq)]
pub struct SnapshotRecord {
    pub digest: String,
    /// Archive-format timestamp (`YYYYMMDDhhmmss`), used verbatim in replay URLs.
    pub timestamp: String,
    pub datetime: NaiveDateTime,
    pub original: String,
    pub mime_type: String,
    pub status_code: String,
}

/// A snapshot found through the availability API, together with its content.
#[derive(Debug, Clone)]
pub struct ClosestSnapshot {
    pub timestamp: NaiveDateTime,
    pub url: String,
    pub body: Vec<u8>,
}

/// Where snapshots come from. The pipeline only needs these two calls.
pub trait SnapshotArchive {
    /// All distinct `text/html` + `200` captures of `url`.
    fn list_snapshots(&self, url: &str) -> Result<Vec<SnapshotRecord>>;

    /// Raw content of the capture of `original_url` taken exactly at `timestamp`.
    fn fetch_snapshot(&self, original_url: &str, timestamp: &str) -> Result<Vec<u8>>;
}

/// Translate the Wayback Machine's timestamp into a datetime.
pub fn parse_archive_timestamp(timestamp: &str) -> Result<NaiveDateTime> {
    NaiveDateTime::parse_from_str(timestamp, ARCHIVE_TIMESTAMP_FORMAT).map_err(|e| {
        ScrapeError::MalformedIndex(format!("bad archive timestamp {:?}: {}", timestamp, e))
    })
}

/// Replay URL of an exact capture. The original URL is used verbatim.
pub fn replay_url(archive_url: &str, timestamp: &str, original_url: &str) -> String {
    format!("{}/web/{}/{}", archive_url.trim_end_matches('/'), timestamp, original_url)
}

/// Parse a CDX `output=json` response: the first row names the fields, the
/// rest are captures in the same column order.
pub fn parse_cdx_index(body: &str) -> Result<Vec<SnapshotRecord>> {
    let rows: Vec<Vec<String>> = serde_json::from_str(body)
        .map_err(|e| ScrapeError::MalformedIndex(format!("not a JSON table: {}", e)))?;

    let Some((header, captures)) = rows.split_first() else {
        // no captures at all
        return Ok(Vec::new());
    };

    let column = |name: &str| {
        header
            .iter()
            .position(|field| field == name)
            .ok_or_else(|| ScrapeError::MalformedIndex(format!("missing column {:?}", name)))
    };
    let timestamp_col = column("timestamp")?;
    let original_col = column("original")?;
    let mime_col = column("mimetype")?;
    let status_col = column("statuscode")?;
    let digest_col = column("digest")?;

    let mut seen_digests = HashSet::new();
    let mut records = Vec::new();

    for (row_number, row) in captures.iter().enumerate() {
        let field = |col: usize| {
            row.get(col).ok_or_else(|| {
                ScrapeError::MalformedIndex(format!(
                    "row {} has {} fields, header has {}",
                    row_number + 1,
                    row.len(),
                    header.len()
                ))
            })
        };

        let mime_type = field(mime_col)?;
        let status_code = field(status_col)?;
        if mime_type != "text/html" || status_code != "200" {
            continue;
        }

        // byte-identical captures share a digest; the first one wins
        let digest = field(digest_col)?;
        if !seen_digests.insert(digest.clone()) {
            continue;
        }

        let timestamp = field(timestamp_col)?;
        records.push(SnapshotRecord {
            digest: digest.clone(),
            timestamp: timestamp.clone(),
            datetime: parse_archive_timestamp(timestamp)?,
            original: field(original_col)?.clone(),
            mime_type: mime_type.clone(),
            status_code: status_code.clone(),
        });
    }

    Ok(records)
}

#[derive(Debug, Deserialize)]
struct Availability {
    archived_snapshots: ArchivedSnapshots,
}

#[derive(Debug, Deserialize)]
struct ArchivedSnapshots {
    closest: Option<ClosestEntry>,
}

#[derive(Debug, Deserialize)]
struct ClosestEntry {
    available: bool,
    status: String,
    timestamp: String,
    url: String,
}

/// Blocking client for the Wayback Machine's index, replay, and availability endpoints.
pub struct WaybackClient {
    client: Client,
    archive_url: String,
    availability_url: String,
}

impl Default for WaybackClient {
    fn default() -> Self {
        Self::new()
    }
}

impl WaybackClient {
    pub fn new() -> Self {
        Self::with_archive_url(DEFAULT_ARCHIVE_URL)
    }

    pub fn with_archive_url(archive_url: &str) -> Self {
        WaybackClient {
            client: Client::new(),
            archive_url: archive_url.trim_end_matches('/').to_string(),
            availability_url: DEFAULT_AVAILABILITY_URL.to_string(),
        }
    }

    pub fn index_url(&self, url: &str) -> String {
        format!("{}/cdx/search/cdx?url={}&output=json", self.archive_url, url)
    }

    fn get_ok(&self, url: &str) -> std::result::Result<Response, String> {
        let response = self.client.get(url).send().map_err(|e| e.to_string())?;
        if response.status() != StatusCode::OK {
            return Err(format!("HTTP {}", response.status()));
        }
        Ok(response)
    }

    /// Ask the availability API for the capture closest to `timestamp` and
    /// fetch it. Not part of the main pipeline, which pins exact timestamps.
    pub fn fetch_closest_snapshot(&self, url: &str, timestamp: &str) -> Result<ClosestSnapshot> {
        let lookup_url = format!("{}?url={}&timestamp={}", self.availability_url, url, timestamp);
        info!("Looking up closest snapshot: {}", lookup_url);

        let fetch_failed = |reason: String| ScrapeError::SnapshotFetchFailed {
            url: lookup_url.clone(),
            reason,
        };
        let availability: Availability = self
            .get_ok(&lookup_url)
            .and_then(|response| response.json().map_err(|e| e.to_string()))
            .map_err(fetch_failed)?;

        let closest = match availability.archived_snapshots.closest {
            Some(closest) if closest.available && closest.status == "200" => closest,
            Some(closest) => {
                return Err(fetch_failed(format!(
                    "closest snapshot not available (status {})",
                    closest.status
                )))
            }
            None => return Err(fetch_failed("no snapshots archived".to_string())),
        };

        let timestamp = parse_archive_timestamp(&closest.timestamp)?;
        info!("Found snapshot {} at {}", closest.url, timestamp);

        let body = self
            .get_ok(&closest.url)
            .and_then(|response| response.bytes().map_err(|e| e.to_string()))
            .map_err(|reason| ScrapeError::SnapshotFetchFailed {
                url: closest.url.clone(),
                reason,
            })?;

        Ok(ClosestSnapshot {
            timestamp,
            url: closest.url,
            body: body.to_vec(),
        })
    }
}

impl SnapshotArchive for WaybackClient {
    fn list_snapshots(&self, url: &str) -> Result<Vec<SnapshotRecord>> {
        let index_url = self.index_url(url);
        info!("Querying archive index: {}", index_url);

        let body = self
            .get_ok(&index_url)
            .and_then(|response| response.text().map_err(|e| e.to_string()))
            .map_err(|reason| ScrapeError::ArchiveUnavailable {
                url: index_url.clone(),
                reason,
            })?;

        let records = parse_cdx_index(&body)?;
        debug!("{} distinct html captures of {}", records.len(), url);
        Ok(records)
    }

    fn fetch_snapshot(&self, original_url: &str, timestamp: &str) -> Result<Vec<u8>> {
        let url = replay_url(&self.archive_url, timestamp, original_url);
        info!("Fetching {}", url);

        let body = self
            .get_ok(&url)
            .and_then(|response| response.bytes().map_err(|e| e.to_string()))
            .map_err(|reason| ScrapeError::SnapshotFetchFailed {
                url: url.clone(),
                reason,
            })?;
        Ok(body.to_vec())
    }
}
