use std::fs::File;
use std::path::Path;

use chrono::{NaiveDateTime, NaiveTime};
use log::info;
use tempfile::NamedTempFile;

use crate::error::Result;
use crate::series::{CaseRow, ResultSet};

const HEADER: [&str; 3] = ["Location", "Count", "Timestamp"];

/// Write a file next to `path` and move it into place once complete, so the
/// target is either untouched or fully written.
pub(crate) fn replace_file<P, F>(path: P, fill: F) -> Result<()>
where
    P: AsRef<Path>,
    F: FnOnce(&File) -> Result<()>,
{
    let path = path.as_ref();
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let tmp = NamedTempFile::new_in(dir)?;
    fill(tmp.as_file())?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

pub fn write_result_set<P: AsRef<Path>>(path: P, result: &ResultSet) -> Result<()> {
    replace_file(&path, |file| {
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);
        writer.write_record(HEADER)?;
        for row in result.rows() {
            writer.serialize(row)?;
        }
        writer.flush()?;
        Ok(())
    })?;
    info!("Wrote {} rows to {}", result.len(), path.as_ref().display());
    Ok(())
}

pub fn read_result_set<P: AsRef<Path>>(path: P) -> Result<ResultSet> {
    let mut reader = csv::Reader::from_path(path)?;
    let rows = reader
        .deserialize::<CaseRow>()
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(ResultSet::from_rows(rows))
}

/// What earlier runs already produced, and where the next run picks up.
#[derive(Debug, Clone)]
pub struct IncrementalState {
    prior: ResultSet,
    resume_after: NaiveDateTime,
}

impl IncrementalState {
    /// Build from scratch.
    pub fn fresh(bootstrap: NaiveDateTime) -> Self {
        IncrementalState {
            prior: ResultSet::default(),
            resume_after: bootstrap,
        }
    }

    /// Load the series persisted at `path`, if any. The resume bound is the
    /// start of its latest day, so snapshots later that day are fetched again.
    pub fn load<P: AsRef<Path>>(path: P, bootstrap: NaiveDateTime) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            info!("Prior data not found at {}, starting from zero", path.display());
            return Ok(Self::fresh(bootstrap));
        }

        let prior = read_result_set(path)?;
        let resume_after = prior
            .max_date()
            .map(|date| date.and_time(NaiveTime::MIN).max(bootstrap))
            .unwrap_or(bootstrap);
        info!(
            "Loaded {} prior rows from {}, resuming after {}",
            prior.len(),
            path.display(),
            resume_after
        );

        Ok(IncrementalState {
            prior,
            resume_after,
        })
    }

    pub fn prior(&self) -> &ResultSet {
        &self.prior
    }

    pub fn resume_after(&self) -> NaiveDateTime {
        self.resume_after
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::bootstrap_timestamp;
    use chrono::NaiveDate;
    use std::fs;

    fn row(location: &str, count: &str, date: (i32, u32, u32)) -> CaseRow {
        CaseRow {
            location: location.to_string(),
            count: count.to_string(),
            date: NaiveDate::from_ymd_opt(date.0, date.1, date.2).unwrap(),
        }
    }

    #[test]
    fn test_write_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cases.csv");
        let result = ResultSet::from_rows(vec![
            row("Albany", "5", (2020, 3, 18)),
            row("Erie", "1,204", (2020, 4, 2)),
        ]);

        write_result_set(&path, &result).unwrap();
        let contents = fs::read_to_string(&path).unwrap();
        assert_eq!(
            contents,
            "Location,Count,Timestamp\nAlbany,5,2020-03-18\nErie,\"1,204\",2020-04-02\n"
        );

        let state = IncrementalState::load(&path, bootstrap_timestamp()).unwrap();
        assert_eq!(state.prior(), &result);
        assert_eq!(state.resume_after().to_string(), "2020-04-02 00:00:00");
    }

    #[test]
    fn test_empty_result_still_has_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cases.csv");
        write_result_set(&path, &ResultSet::default()).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "Location,Count,Timestamp\n");

        let state = IncrementalState::load(&path, bootstrap_timestamp()).unwrap();
        assert!(state.prior().is_empty());
        assert_eq!(state.resume_after(), bootstrap_timestamp());
    }

    #[test]
    fn test_missing_file_starts_from_bootstrap() {
        let dir = tempfile::tempdir().unwrap();
        let state =
            IncrementalState::load(dir.path().join("absent.csv"), bootstrap_timestamp()).unwrap();
        assert!(state.prior().is_empty());
        assert_eq!(state.resume_after(), bootstrap_timestamp());
    }

    #[test]
    fn test_loads_datetime_timestamps() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("legacy.csv");
        fs::write(
            &path,
            "Location,Count,Timestamp\n\
             Albany,2,2020-03-10 09:15:00\n\
             Albany,3,2020-03-10 17:40:00\n\
             Erie,1,2020-03-11 12:00:00\n",
        )
        .unwrap();

        let result = read_result_set(&path).unwrap();
        assert_eq!(
            result.rows(),
            &[row("Albany", "3", (2020, 3, 10)), row("Erie", "1", (2020, 3, 11))]
        );
    }

    #[test]
    fn test_resume_bound_never_precedes_bootstrap() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cases.csv");
        write_result_set(&path, &ResultSet::from_rows(vec![row("Albany", "1", (2020, 1, 5))]))
            .unwrap();
        let state = IncrementalState::load(&path, bootstrap_timestamp()).unwrap();
        assert_eq!(state.resume_after(), bootstrap_timestamp());
    }

    #[test]
    fn test_failed_write_leaves_target_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cases.csv");
        fs::write(&path, "original").unwrap();

        let result = replace_file(&path, |_| {
            Err(crate::error::ScrapeError::ExtractionInvariantViolation(
                "boom".to_string(),
            ))
        });
        assert!(result.is_err());
        assert_eq!(fs::read_to_string(&path).unwrap(), "original");
    }
}
