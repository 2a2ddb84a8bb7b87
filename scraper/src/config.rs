use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::time::Duration;

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::extract::Extractor;

pub const DEFAULT_ARCHIVE_URL: &str = "https://web.archive.org";
pub const DEFAULT_AVAILABILITY_URL: &str = "https://archive.org/wayback/available";
pub const DEFAULT_OUTPUT_FILE: &str = "ny_confirmed_cases.csv";

/// Pause between snapshot fetches, to be nice to archive.org
pub const POLITENESS_DELAY: Duration = Duration::from_secs(1);

/// One era of the source site: which page to replay, over which interval,
/// and with which extractor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeWindow {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub url: String,
    pub extractor: Extractor,
}

/// Labels used by the summary-row layout and by the normalizer.
#[derive(Debug, Clone, PartialEq)]
pub struct RegionLabels {
    /// Aggregate for everything outside the core city. Retired by the source.
    pub outside_city: String,
    pub city: String,
}

impl Default for RegionLabels {
    fn default() -> Self {
        RegionLabels {
            outside_city: "New York State (Outside of NYC)".to_string(),
            city: "New York City".to_string(),
        }
    }
}

fn at(year: i32, month: u32, day: u32, hour: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(year, month, day)
        .and_then(|date| date.and_hms_opt(hour, 0, 0))
        .expect("hard-coded window bounds are valid dates")
}

/// First moment with county-level data on the site.
pub fn bootstrap_timestamp() -> NaiveDateTime {
    at(2020, 2, 27, 9)
}

/// The NY health site changed a few times, each time needing a slightly
/// different scraping approach.
pub fn default_windows() -> Vec<TimeWindow> {
    vec![
        // February 27th and March 8th redesigns
        TimeWindow {
            start: at(2020, 2, 27, 9),
            end: at(2020, 3, 17, 19),
            url: "www.health.ny.gov/diseases/communicable/coronavirus/".to_string(),
            extractor: Extractor::CaseCountTable,
        },
        // March 17th redesign and new location
        TimeWindow {
            start: at(2020, 3, 17, 19),
            end: at(2021, 1, 1, 1),
            url: "coronavirus.health.ny.gov/county-county-breakdown-positive-cases".to_string(),
            extractor: Extractor::WysiwygTable,
        },
    ]
}

/// Read a window table from a JSON file.
pub fn load_windows<P: AsRef<Path>>(path: P) -> Result<Vec<TimeWindow>> {
    let reader = BufReader::new(File::open(path)?);
    Ok(serde_json::from_reader(reader)?)
}
