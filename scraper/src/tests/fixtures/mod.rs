use std::fs;
use std::path::{Path, PathBuf};

use crate::extract::Extractor;

pub fn fixtures_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("src/tests/fixtures")
}

/// Load a saved snapshot by file stem, e.g. `wysiwyg_table-mar18`
pub fn load_snapshot_fixture(fixture_name: &str) -> String {
    let path = fixtures_dir()
        .join("snapshots")
        .join(format!("{}.html", fixture_name));
    fs::read_to_string(path)
        .unwrap_or_else(|_| panic!("Failed to load test fixture: {}", fixture_name))
}

/// Every saved snapshot with the extractor named by its file prefix
/// (`<extractor>-<label>.html`).
pub fn saved_snapshots() -> Vec<(Extractor, String)> {
    let dir = fixtures_dir().join("snapshots");
    let mut snapshots = Vec::new();
    for entry in fs::read_dir(dir).expect("snapshot fixtures directory") {
        let path = entry.expect("directory entry").path();
        if path.extension().map_or(true, |ext| ext != "html") {
            continue;
        }
        let stem = path.file_stem().unwrap().to_string_lossy().to_string();
        let prefix = stem.split('-').next().unwrap_or_default();
        let extractor: Extractor = serde_json::from_value(serde_json::json!(prefix))
            .unwrap_or_else(|_| panic!("Unknown extractor prefix in fixture {}", stem));
        snapshots.push((extractor, stem));
    }
    snapshots.sort_by(|a, b| a.1.cmp(&b.1));
    snapshots
}
