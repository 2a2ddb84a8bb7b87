use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use ny_cases_scraper::config::DEFAULT_OUTPUT_FILE;
use ny_cases_scraper::merge::merge_confirmed;
use ny_cases_scraper::{read_result_set, RegionLabels};

/// Merge the scraped county counts into the wide-format confirmed-cases table
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Series written by `scrape`
    #[arg(long, default_value = DEFAULT_OUTPUT_FILE)]
    input: PathBuf,

    /// Wide table with one column per date, rewritten in place
    #[arg(
        long,
        default_value = "COVID-19/csse_covid_19_data/csse_covid_19_time_series/time_series_19-covid-Confirmed.csv"
    )]
    table: PathBuf,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let series = read_result_set(&cli.input)
        .with_context(|| format!("Failed to read {}", cli.input.display()))?;

    let written = merge_confirmed(&series, &cli.table, &RegionLabels::default())
        .with_context(|| format!("Failed to merge into {}", cli.table.display()))?;

    println!("Updated {} cells in {}", written, cli.table.display());
    Ok(())
}
