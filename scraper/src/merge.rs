//! Merge the scraped series into the wide-format confirmed-cases table, where
//! rows are `(Country/Region, Province/State)` and columns are `M/D/YY` dates.

use std::path::Path;

use chrono::{Datelike, NaiveDate};
use log::{debug, info};

use crate::config::RegionLabels;
use crate::error::{Result, ScrapeError};
use crate::series::{CaseRow, ResultSet};
use crate::store::replace_file;

pub const COUNTIES_EX_NYC: [&str; 57] = [
    "Albany", "Allegany", "Broome", "Cattaraugus", "Cayuga", "Chautauqua", "Chemung", "Chenango",
    "Clinton", "Columbia", "Cortland", "Delaware", "Dutchess", "Erie", "Essex", "Franklin",
    "Fulton", "Genesee", "Greene", "Hamilton", "Herkimer", "Jefferson", "Lewis", "Livingston",
    "Madison", "Monroe", "Montgomery", "Nassau", "Niagara", "Oneida", "Onondaga", "Ontario",
    "Orange", "Orleans", "Oswego", "Otsego", "Putnam", "Rensselaer", "Rockland", "St. Lawrence",
    "Saratoga", "Schenectady", "Schoharie", "Schuyler", "Seneca", "Steuben", "Suffolk",
    "Sullivan", "Tioga", "Tompkins", "Ulster", "Warren", "Washington", "Wayne", "Westchester",
    "Wyoming", "Yates",
];

/// The five boroughs are only ever reported together, as the city.
pub const NYC_BOROUGH_COUNTIES: [&str; 5] = ["Bronx", "New York", "Richmond", "Kings", "Queens"];

const COUNTRY_COLUMN: &str = "Country/Region";
const PROVINCE_COLUMN: &str = "Province/State";
const COUNTRY: &str = "US";
const PROVINCE_SUFFIX: &str = " County, NY";
/// New York County stands for all five boroughs.
const CITY_PROVINCE: &str = "New York County, NY";

/// County rows ready to merge: totals dropped, known typos fixed, one row
/// per `(location, date)`, every location checked.
pub fn prepare_rows(result: &ResultSet, labels: &RegionLabels) -> Result<Vec<CaseRow>> {
    let rows = result
        .rows()
        .iter()
        .filter(|row| !row.location.starts_with("Total"))
        .map(|row| {
            let mut row = row.clone();
            if row.location == "Broom" {
                row.location = "Broome".to_string();
            }
            row
        })
        .collect();

    let prepared = ResultSet::from_rows(rows).rows().to_vec();
    validate_locations(&prepared, labels)?;
    Ok(prepared)
}

/// Anything outside the known county list means the page layout changed in
/// a way the extractors don't understand yet.
pub fn validate_locations(rows: &[CaseRow], labels: &RegionLabels) -> Result<()> {
    for row in rows {
        let location = row.location.as_str();
        if NYC_BOROUGH_COUNTIES.contains(&location) {
            return Err(ScrapeError::ExtractionInvariantViolation(format!(
                "{}: NYC counties are grouped together as {:?}",
                location, labels.city
            )));
        }
        if location != labels.city && !COUNTIES_EX_NYC.contains(&location) {
            return Err(ScrapeError::ExtractionInvariantViolation(format!(
                "{}: invalid county",
                location
            )));
        }
    }
    Ok(())
}

pub fn province_key(location: &str, labels: &RegionLabels) -> String {
    if location == labels.city {
        CITY_PROVINCE.to_string()
    } else {
        format!("{}{}", location, PROVINCE_SUFFIX)
    }
}

/// Column name for a date, e.g. `3/7/20`.
pub fn date_column(date: NaiveDate) -> String {
    format!("{}/{}/{}", date.month(), date.day(), date.format("%y"))
}

/// The wide table held in memory as header plus string cells.
#[derive(Debug, Clone, PartialEq)]
pub struct WideTable {
    pub headers: Vec<String>,
    pub records: Vec<Vec<String>>,
}

impl WideTable {
    pub fn read<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut reader = csv::Reader::from_path(path)?;
        let headers = reader.headers()?.iter().map(str::to_string).collect();
        let records = reader
            .records()
            .map(|record| record.map(|r| r.iter().map(str::to_string).collect()))
            .collect::<std::result::Result<Vec<Vec<String>>, _>>()?;
        Ok(WideTable { headers, records })
    }

    pub fn write<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        replace_file(path, |file| {
            let mut writer = csv::Writer::from_writer(file);
            writer.write_record(&self.headers)?;
            for record in &self.records {
                writer.write_record(record)?;
            }
            writer.flush()?;
            Ok(())
        })
    }

    fn column(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|header| header == name)
    }

    fn require_column(&self, name: &str) -> Result<usize> {
        self.column(name)
            .ok_or_else(|| ScrapeError::MalformedTable(format!("no {:?} column", name)))
    }

    fn column_or_insert(&mut self, name: &str) -> usize {
        match self.column(name) {
            Some(idx) => idx,
            None => {
                self.headers.push(name.to_string());
                for record in &mut self.records {
                    record.push(String::new());
                }
                self.headers.len() - 1
            }
        }
    }

    /// Overwrite the cell of the first `US` row for `province`. Returns false
    /// when the table has no such row.
    pub fn set(&mut self, province: &str, column: &str, value: &str) -> Result<bool> {
        let country_col = self.require_column(COUNTRY_COLUMN)?;
        let province_col = self.require_column(PROVINCE_COLUMN)?;
        let Some(row) = self.records.iter().position(|record| {
            record.get(country_col).map(String::as_str) == Some(COUNTRY)
                && record.get(province_col).map(String::as_str) == Some(province)
        }) else {
            return Ok(false);
        };

        let col = self.column_or_insert(column);
        self.records[row][col] = value.to_string();
        Ok(true)
    }

    /// The newest column must hold whole numbers. Empty cells stay empty.
    fn truncate_last_column(&mut self) -> Result<()> {
        let column = self.headers.last().cloned().unwrap_or_default();
        for (row, record) in self.records.iter_mut().enumerate() {
            let Some(cell) = record.last_mut() else {
                continue;
            };
            if cell.is_empty() {
                continue;
            }
            let value = cell
                .parse::<f64>()
                .ok()
                .filter(|value| value.is_finite())
                .ok_or_else(|| {
                    ScrapeError::MalformedTable(format!(
                        "row {} of column {:?} is not a number: {:?}",
                        row + 1,
                        column,
                        cell
                    ))
                })?;
            *cell = format!("{}", value.trunc() as i64);
        }
        Ok(())
    }
}

/// Write every county count of `result` into the table at `table_path`.
/// Returns the number of cells written. Nothing is written if validation fails.
pub fn merge_confirmed<P: AsRef<Path>>(
    result: &ResultSet,
    table_path: P,
    labels: &RegionLabels,
) -> Result<usize> {
    let rows = prepare_rows(result, labels)?;
    let mut table = WideTable::read(&table_path)?;

    let mut written = 0;
    for row in &rows {
        let province = province_key(&row.location, labels);
        let cases = row.count.replace(',', "");
        if table.set(&province, &date_column(row.date), &cases)? {
            written += 1;
        } else {
            debug!("No table row for {}", province);
        }
    }

    table.truncate_last_column()?;
    table.write(&table_path)?;
    info!(
        "Merged {} of {} rows into {}",
        written,
        rows.len(),
        table_path.as_ref().display()
    );
    Ok(written)
}
