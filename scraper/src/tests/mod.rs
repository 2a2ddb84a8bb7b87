use std::cell::RefCell;
use std::collections::HashMap;

use crate::archive::{parse_archive_timestamp, SnapshotArchive, SnapshotRecord};
use crate::error::{Result, ScrapeError};

pub mod extract_tests;
pub mod fixtures;

/// In-memory archive. Records every index query and fetch so tests can
/// check what the pipeline touched.
#[derive(Default)]
pub struct FakeArchive {
    indexes: HashMap<String, Vec<SnapshotRecord>>,
    pages: HashMap<(String, String), String>,
    pub index_queries: RefCell<Vec<String>>,
    pub fetched: RefCell<Vec<String>>,
}

impl FakeArchive {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a window URL with no captures yet.
    pub fn with_index(mut self, url: &str) -> Self {
        self.indexes.entry(url.to_string()).or_default();
        self
    }

    /// Register a capture of `url` at `timestamp`; `html: None` makes its fetch fail.
    pub fn with_snapshot(mut self, url: &str, timestamp: &str, html: Option<&str>) -> Self {
        let original = format!("http://{}", url);
        let record = SnapshotRecord {
            digest: format!("sha1:{}", timestamp),
            timestamp: timestamp.to_string(),
            datetime: parse_archive_timestamp(timestamp).unwrap(),
            original: original.clone(),
            mime_type: "text/html".to_string(),
            status_code: "200".to_string(),
        };
        self.indexes.entry(url.to_string()).or_default().push(record);
        if let Some(html) = html {
            self.pages
                .insert((original, timestamp.to_string()), html.to_string());
        }
        self
    }
}

impl SnapshotArchive for FakeArchive {
    fn list_snapshots(&self, url: &str) -> Result<Vec<SnapshotRecord>> {
        self.index_queries.borrow_mut().push(url.to_string());
        self.indexes
            .get(url)
            .cloned()
            .ok_or_else(|| ScrapeError::ArchiveUnavailable {
                url: url.to_string(),
                reason: "HTTP 503 Service Unavailable".to_string(),
            })
    }

    fn fetch_snapshot(&self, original_url: &str, timestamp: &str) -> Result<Vec<u8>> {
        self.fetched.borrow_mut().push(timestamp.to_string());
        self.pages
            .get(&(original_url.to_string(), timestamp.to_string()))
            .map(|html| html.clone().into_bytes())
            .ok_or_else(|| ScrapeError::SnapshotFetchFailed {
                url: format!("{}/{}", timestamp, original_url),
                reason: "HTTP 404 Not Found".to_string(),
            })
    }
}

/// A single-table page in the case-count layout.
pub fn case_count_page(rows: &[(&str, &str)]) -> String {
    let body: String = rows
        .iter()
        .map(|(location, count)| format!("<tr><td>{}</td><td>{}</td></tr>", location, count))
        .collect();
    format!(
        r#"<html><body><table id="case_count_table">{}</table></body></html>"#,
        body
    )
}

/// A single-table page in the wysiwyg layout.
pub fn wysiwyg_page(rows: &[(&str, &str)]) -> String {
    let body: String = rows
        .iter()
        .map(|(location, count)| format!("<tr><td>{}</td><td>{}</td></tr>", location, count))
        .collect();
    format!(
        r#"<html><body><div class="wysiwyg--field-webny-wysiwyg-body"><table>{}</table></div></body></html>"#,
        body
    )
}
