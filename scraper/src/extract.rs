use clap::ValueEnum;
use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};

use crate::config::RegionLabels;
use crate::error::{Result, ScrapeError};

/// First cell of the single summary row used by the early case-count table.
const SUMMARY_ROW_LABEL: &str = "Positive Cases";

/// A `(location, count)` pair read from one snapshot, before it is tagged
/// with the snapshot's timestamp.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawObservation {
    pub location: String,
    pub count: String,
}

impl RawObservation {
    fn new(location: &str, count: &str) -> Self {
        RawObservation {
            location: location.to_string(),
            count: count.to_string(),
        }
    }
}

/// Page layouts the source site has used. Chosen per time window, never by
/// looking at the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
#[value(rename_all = "snake_case")]
pub enum Extractor {
    /// `table#case_count_table` on the original coronavirus page
    /// (February 27th and March 8th designs).
    CaseCountTable,
    /// The table inside the page body's wysiwyg container (March 17th design).
    WysiwygTable,
}

impl Extractor {
    pub fn name(&self) -> &'static str {
        match self {
            Extractor::CaseCountTable => "case_count_table",
            Extractor::WysiwygTable => "wysiwyg_table",
        }
    }

    pub fn extract(&self, raw_html: &[u8], labels: &RegionLabels) -> Result<Vec<RawObservation>> {
        let html = String::from_utf8_lossy(raw_html);
        let document = Html::parse_document(&html);
        match self {
            Extractor::CaseCountTable => extract_case_count_table(&document, labels),
            Extractor::WysiwygTable => extract_wysiwyg_table(&document),
        }
    }
}

fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| {
        ScrapeError::ExtractionInvariantViolation(format!("bad selector {:?}: {:?}", css, e))
    })
}

fn find_table<'a>(document: &'a Html, css: &str) -> Result<ElementRef<'a>> {
    document.select(&selector(css)?).next().ok_or_else(|| {
        ScrapeError::ExtractionInvariantViolation(format!("no table matching {:?}", css))
    })
}

/// Trimmed text of every non-empty `td` in each row. Rows without any text are dropped.
fn table_rows(table: ElementRef) -> Result<Vec<Vec<String>>> {
    let tr_selector = selector("tr")?;
    let td_selector = selector("td")?;

    let rows = table
        .select(&tr_selector)
        .map(|tr| {
            tr.select(&td_selector)
                .map(|td| td.text().collect::<String>().trim().to_string())
                .filter(|text| !text.is_empty())
                .collect::<Vec<_>>()
        })
        .filter(|cells| !cells.is_empty())
        .collect();
    Ok(rows)
}

/// One observation per row from its first two non-empty cells.
fn location_count_pairs(rows: &[Vec<String>]) -> Vec<RawObservation> {
    rows.iter()
        .filter_map(|cells| match cells.as_slice() {
            [location, count, ..] => Some(RawObservation::new(location, count)),
            _ => None,
        })
        .collect()
}

/// Handles two different designs of the same table: a single summary row
/// (`Positive Cases | <outside city> | <city>`) or one row per location.
fn extract_case_count_table(
    document: &Html,
    labels: &RegionLabels,
) -> Result<Vec<RawObservation>> {
    let table = find_table(document, "table#case_count_table")?;
    let rows = table_rows(table)?;

    match rows.first() {
        Some(first) if first[0] == SUMMARY_ROW_LABEL => match first.as_slice() {
            [_, outside_city, city, ..] => Ok(vec![
                RawObservation::new(&labels.outside_city, outside_city),
                RawObservation::new(&labels.city, city),
            ]),
            _ => Err(ScrapeError::ExtractionInvariantViolation(format!(
                "summary row has {} cells, expected a label and two counts",
                first.len()
            ))),
        },
        _ => Ok(location_count_pairs(&rows)),
    }
}

fn extract_wysiwyg_table(document: &Html) -> Result<Vec<RawObservation>> {
    let table = find_table(document, "body div.wysiwyg--field-webny-wysiwyg-body table")?;
    Ok(location_count_pairs(&table_rows(table)?))
}
