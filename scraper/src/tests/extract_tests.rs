use super::fixtures;
use crate::config::RegionLabels;
use crate::extract::{Extractor, RawObservation};
use crate::normalize::canonical_location;

fn extract_fixture(extractor: Extractor, name: &str) -> Vec<RawObservation> {
    let html = fixtures::load_snapshot_fixture(name);
    extractor
        .extract(html.as_bytes(), &RegionLabels::default())
        .unwrap_or_else(|e| panic!("{} failed on {}: {}", extractor.name(), name, e))
}

#[test]
fn test_summary_layout_snapshot() {
    let observations = extract_fixture(Extractor::CaseCountTable, "case_count_table-feb29");
    assert_eq!(
        observations,
        vec![
            RawObservation {
                location: "New York State (Outside of NYC)".to_string(),
                count: "0".to_string(),
            },
            RawObservation {
                location: "New York City".to_string(),
                count: "1".to_string(),
            },
        ]
    );
}

#[test]
fn test_county_layout_snapshot() {
    let observations = extract_fixture(Extractor::CaseCountTable, "case_count_table-mar08");
    assert_eq!(observations.len(), 8);
    assert_eq!(observations[0].location, "Nassau County:");
    assert_eq!(observations[5].location, "Westchester County:");
    assert_eq!(observations[5].count, "57");

    let last = observations.last().unwrap();
    assert_eq!(canonical_location(&last.location), "Total Number of Positive Cases");
    assert_eq!(last.count, "105");
}

#[test]
fn test_wysiwyg_layout_snapshot() {
    let observations = extract_fixture(Extractor::WysiwygTable, "wysiwyg_table-mar18");
    let locations: Vec<&str> = observations.iter().map(|o| o.location.as_str()).collect();
    assert_eq!(
        locations,
        vec![
            "Albany",
            "Broome",
            "Erie",
            "Nassau",
            "Westchester",
            "New York City",
            "Total Number of Positive Cases",
        ]
    );
    assert_eq!(observations[5].count, "1,339");
}

// Every snapshot saved with `save_snapshot` must stay readable by its extractor
#[test]
fn test_saved_snapshots() {
    let snapshots = fixtures::saved_snapshots();
    assert!(!snapshots.is_empty(), "no saved snapshots found");

    let mut failures = Vec::new();
    for (extractor, name) in snapshots {
        let html = fixtures::load_snapshot_fixture(&name);
        match extractor.extract(html.as_bytes(), &RegionLabels::default()) {
            Ok(observations) if !observations.is_empty() => {}
            Ok(_) => failures.push(format!("{}: no observations", name)),
            Err(e) => failures.push(format!("{}: {}", name, e)),
        }
    }
    assert!(failures.is_empty(), "{}", failures.join("\n"));
}

#[test]
fn test_extractor_is_chosen_by_window_not_content() {
    // A wysiwyg page has no case_count_table, so the wrong extractor fails loudly
    let html = fixtures::load_snapshot_fixture("wysiwyg_table-mar18");
    assert!(Extractor::CaseCountTable
        .extract(html.as_bytes(), &RegionLabels::default())
        .is_err());
}
