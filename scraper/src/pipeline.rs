use std::thread;
use std::time::Duration;

use chrono::NaiveDateTime;
use log::{debug, info};

use crate::archive::{SnapshotArchive, SnapshotRecord};
use crate::config::{RegionLabels, TimeWindow, POLITENESS_DELAY};
use crate::error::Result;
use crate::normalize::normalize;
use crate::series::{Observation, ResultSet};
use crate::store::IncrementalState;

/// Replays archived snapshots through the extractor of each time window.
///
/// Strictly sequential: one index query per window, then one fetch at a
/// time with a pause in between. Any failure aborts the whole run.
pub struct Orchestrator<'a, A: SnapshotArchive> {
    archive: &'a A,
    labels: &'a RegionLabels,
    delay: Duration,
}

impl<'a, A: SnapshotArchive> Orchestrator<'a, A> {
    pub fn new(archive: &'a A, labels: &'a RegionLabels) -> Self {
        Orchestrator {
            archive,
            labels,
            delay: POLITENESS_DELAY,
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Observations from every snapshot newer than `resume_after`, in window
    /// order and then snapshot order. Not normalized.
    pub fn run(&self, windows: &[TimeWindow], resume_after: NaiveDateTime) -> Result<Vec<Observation>> {
        let mut ordered: Vec<&TimeWindow> = windows.iter().collect();
        ordered.sort_by_key(|window| window.start);

        let mut observations = Vec::new();
        for window in ordered {
            self.scrape_window(window, resume_after, &mut observations)?;
        }
        Ok(observations)
    }

    /// Run from the given state and fold the result into the prior series.
    /// Prior rows go first so that a re-fetched snapshot of the same day wins.
    pub fn update(&self, windows: &[TimeWindow], state: &IncrementalState) -> Result<ResultSet> {
        let fresh = self.run(windows, state.resume_after())?;
        info!(
            "Collected {} new observations on top of {} prior rows",
            fresh.len(),
            state.prior().len()
        );

        let mut all: Vec<Observation> = state.prior().observations().collect();
        all.extend(fresh);
        Ok(normalize(all, self.labels))
    }

    fn pending_snapshots(
        &self,
        window: &TimeWindow,
        resume_after: NaiveDateTime,
    ) -> Result<Vec<SnapshotRecord>> {
        let since = window.start.max(resume_after);
        let mut snapshots: Vec<SnapshotRecord> = self
            .archive
            .list_snapshots(&window.url)?
            .into_iter()
            .filter(|snapshot| snapshot.datetime > since)
            .collect();
        snapshots.sort_by_key(|snapshot| snapshot.datetime);
        Ok(snapshots)
    }

    fn scrape_window(
        &self,
        window: &TimeWindow,
        resume_after: NaiveDateTime,
        observations: &mut Vec<Observation>,
    ) -> Result<()> {
        // the boundary snapshot of this window was persisted by an earlier run
        if resume_after >= window.end {
            info!("Skipping {}: already covered up to {}", window.url, resume_after);
            return Ok(());
        }

        let snapshots = self.pending_snapshots(window, resume_after)?;
        info!("Examining archive snapshots: {}", window.url);
        info!(
            "  there are {} additional snapshots to fetch and process",
            snapshots.len()
        );

        for snapshot in &snapshots {
            let html = self
                .archive
                .fetch_snapshot(&snapshot.original, &snapshot.timestamp)?;
            let found = window.extractor.extract(&html, self.labels)?;
            debug!(
                "{} observations from {} at {} ({})",
                found.len(),
                snapshot.original,
                snapshot.datetime,
                window.extractor.name()
            );

            // the snapshot's capture time is the data timestamp
            observations.extend(found.into_iter().map(|raw| Observation {
                location: raw.location,
                count: raw.count,
                timestamp: snapshot.datetime,
            }));

            if snapshot.datetime >= window.end {
                info!("Reached end of window at {}", snapshot.datetime);
                break;
            }
            thread::sleep(self.delay);
        }

        Ok(())
    }
}
