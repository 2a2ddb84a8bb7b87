use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Deserializer, Serialize};

/// A count seen for a location in one snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Observation {
    pub location: String,
    pub count: String,
    /// When the snapshot was captured. Used as the data timestamp.
    pub timestamp: NaiveDateTime,
}

/// One row of the persisted series.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaseRow {
    #[serde(rename = "Location")]
    pub location: String,
    #[serde(rename = "Count")]
    pub count: String,
    #[serde(rename = "Timestamp", deserialize_with = "deserialize_date")]
    pub date: NaiveDate,
}

impl CaseRow {
    /// Rows loaded from disk only know their date; they rank before any
    /// snapshot taken later that day.
    pub fn to_observation(&self) -> Observation {
        Observation {
            location: self.location.clone(),
            count: self.count.clone(),
            timestamp: self.date.and_time(NaiveTime::MIN),
        }
    }
}

/// Accepts plain dates as well as full `YYYY-MM-DD HH:MM:SS` timestamps.
fn deserialize_date<'de, D>(deserializer: D) -> Result<NaiveDate, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    let date_part = raw
        .trim()
        .split(|c: char| c == ' ' || c == 'T')
        .next()
        .unwrap_or_default();
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d").map_err(serde::de::Error::custom)
}

/// The normalized series: one row per `(location, date)`, sorted by
/// `(location, date, count)`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResultSet {
    rows: Vec<CaseRow>,
}

impl ResultSet {
    /// Sort rows into `(location, date)` order, keeping the last row given
    /// for each key.
    pub fn from_rows(mut rows: Vec<CaseRow>) -> Self {
        rows.reverse();
        rows.sort_by(|a, b| a.location.cmp(&b.location).then(a.date.cmp(&b.date)));
        rows.dedup_by(|later, kept| later.location == kept.location && later.date == kept.date);
        ResultSet { rows }
    }

    pub fn rows(&self) -> &[CaseRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn max_date(&self) -> Option<NaiveDate> {
        self.rows.iter().map(|row| row.date).max()
    }

    pub fn observations(&self) -> impl Iterator<Item = Observation> + '_ {
        self.rows.iter().map(CaseRow::to_observation)
    }
}
