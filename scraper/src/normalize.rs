use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::config::RegionLabels;
use crate::series::{CaseRow, Observation, ResultSet};

/// Early March wording of the statewide total; always followed by a date or note.
const EARLY_TOTAL_LABEL: &str = "Total Positive Cases ";
const TOTAL_LABEL: &str = "Total Number of Positive Cases";

/// Clean up naming changes made during March 2020.
pub fn canonical_location(raw: &str) -> String {
    // stripping one suffix can expose the other, e.g. "Albany: County"
    let mut cleaned = raw.to_string();
    loop {
        let next = cleaned.replace(" County", "").trim_end_matches(':').to_string();
        if next == cleaned {
            break;
        }
        cleaned = next;
    }
    match cleaned.find(EARLY_TOTAL_LABEL) {
        Some(idx) => format!("{}{}", &cleaned[..idx], TOTAL_LABEL),
        None => cleaned,
    }
}

/// Observations keyed by `(location, date)`, each with its position in scrape order.
type Collapsed = BTreeMap<(String, NaiveDate), (usize, Observation)>;

/// Keep one observation per `(location, date)`: the one from the latest
/// snapshot, or the last one seen when snapshots tie.
fn collapse_duplicates<I>(observations: I) -> Collapsed
where
    I: IntoIterator<Item = (usize, Observation)>,
{
    let mut latest = Collapsed::new();
    for (seq, observation) in observations {
        let key = (observation.location.clone(), observation.timestamp.date());
        let newer_kept = latest.get(&key).map_or(false, |(kept_seq, kept)| {
            (kept.timestamp, *kept_seq) > (observation.timestamp, seq)
        });
        if !newer_kept {
            latest.insert(key, (seq, observation));
        }
    }
    latest
}

/// Turn accumulated observations into the persisted series.
pub fn normalize(raw: Vec<Observation>, labels: &RegionLabels) -> ResultSet {
    let retired = canonical_location(&labels.outside_city);

    let renamed = collapse_duplicates(raw.into_iter().enumerate())
        .into_values()
        .map(|(seq, mut observation)| {
            observation.location = canonical_location(&observation.location);
            (seq, observation)
        })
        // no longer reported as of March 19th
        .filter(|(_, observation)| observation.location != retired);

    // Renaming can fold two raw labels onto one key, so collapse again.
    // Keys are unique afterwards, so count never has to break a tie.
    let rows = collapse_duplicates(renamed)
        .into_iter()
        .map(|((location, date), (_, observation))| CaseRow {
            location,
            count: observation.count,
            date,
        })
        .collect();

    ResultSet::from_rows(rows)
}
