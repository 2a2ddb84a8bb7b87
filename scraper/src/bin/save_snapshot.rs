use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use ny_cases_scraper::{Extractor, RegionLabels, WaybackClient};

/// Save the archived snapshot closest to a timestamp as a test fixture and
/// check whether an extractor understands it.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Page URL as the archive knows it, e.g. coronavirus.health.ny.gov/county-county-breakdown-positive-cases
    url: String,

    /// Archive timestamp to look near, YYYYMMDD[hhmmss]
    timestamp: String,

    /// Extractor expected to read the page
    #[arg(value_enum)]
    extractor: Extractor,

    /// Fixture label, defaults to the snapshot's date
    #[arg(long)]
    label: Option<String>,

    #[arg(long, default_value = "src/tests/fixtures/snapshots")]
    fixtures_dir: PathBuf,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let client = WaybackClient::new();
    let snapshot = client
        .fetch_closest_snapshot(&cli.url, &cli.timestamp)
        .context("Failed to fetch closest snapshot")?;

    let label = cli
        .label
        .unwrap_or_else(|| snapshot.timestamp.format("%b%d").to_string().to_lowercase());
    fs::create_dir_all(&cli.fixtures_dir).context("Failed to create fixtures directory")?;
    let file_path = cli
        .fixtures_dir
        .join(format!("{}-{}.html", cli.extractor.name(), label));
    fs::write(&file_path, &snapshot.body).context("Failed to write HTML file")?;

    println!(
        "Saved snapshot {} ({}) to {}",
        snapshot.url,
        snapshot.timestamp,
        file_path.display()
    );

    println!("\nAttempting to extract with {}:", cli.extractor.name());
    match cli.extractor.extract(&snapshot.body, &RegionLabels::default()) {
        Ok(observations) if observations.is_empty() => {
            println!("⚠️ Table found but no rows extracted");
        }
        Ok(observations) => {
            println!("✅ Extracted {} rows", observations.len());
            for observation in &observations {
                println!("   {}: {}", observation.location, observation.count);
            }
        }
        Err(e) => {
            println!("❌ Extraction failed: {}", e);
            println!("   The page layout probably changed; a new window and extractor are needed.");
        }
    }

    Ok(())
}
