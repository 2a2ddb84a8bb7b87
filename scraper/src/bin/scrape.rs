use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use ny_cases_scraper::config::{
    bootstrap_timestamp, default_windows, load_windows, DEFAULT_ARCHIVE_URL, DEFAULT_OUTPUT_FILE,
    POLITENESS_DELAY,
};
use ny_cases_scraper::{
    write_result_set, IncrementalState, Orchestrator, RegionLabels, WaybackClient,
};

/// Rebuild the NY confirmed-cases series from archive.org snapshots of the
/// state health department's pages. Only snapshots newer than the existing
/// output are fetched.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Output CSV, also read back as the starting point of the next run
    #[arg(long, default_value = DEFAULT_OUTPUT_FILE)]
    output: PathBuf,

    /// JSON window table to use instead of the built-in one
    #[arg(long)]
    windows: Option<PathBuf>,

    /// Pause between snapshot fetches, in milliseconds
    #[arg(long, default_value_t = POLITENESS_DELAY.as_millis() as u64)]
    delay_ms: u64,

    #[arg(long, default_value = DEFAULT_ARCHIVE_URL)]
    archive_url: String,

    /// Ignore the existing output and start from zero
    #[arg(long)]
    from_scratch: bool,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let windows = match &cli.windows {
        Some(path) => load_windows(path)
            .with_context(|| format!("Failed to load window table from {}", path.display()))?,
        None => default_windows(),
    };

    let state = if cli.from_scratch {
        IncrementalState::fresh(bootstrap_timestamp())
    } else {
        IncrementalState::load(&cli.output, bootstrap_timestamp())
            .with_context(|| format!("Failed to load prior data from {}", cli.output.display()))?
    };

    let labels = RegionLabels::default();
    let archive = WaybackClient::with_archive_url(&cli.archive_url);
    let result = Orchestrator::new(&archive, &labels)
        .with_delay(Duration::from_millis(cli.delay_ms))
        .update(&windows, &state)
        .context("Scrape failed, output left unchanged")?;

    write_result_set(&cli.output, &result)
        .with_context(|| format!("Failed to write {}", cli.output.display()))?;

    println!("\nSaved {} rows to {}", result.len(), cli.output.display());
    Ok(())
}
