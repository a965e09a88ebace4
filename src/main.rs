mod config;
mod error;
mod extract;
mod fetch;
mod identity;
mod merge;
mod parse;
mod record;
mod report;
mod store;
mod util;

use crate::config::{Credentials, ReportConfig, SiteConfig};
use crate::error::{FetchError, StoreError};
use crate::extract::Extractor;
use crate::fetch::{AlertFetcher, read_html_file};
use crate::merge::{dedup, merge_sightings};
use crate::parse::{Args, Mode};
use crate::record::{SightingRecord, UNKNOWN};
use crate::report::{ReportRenderer, unique_species};
use crate::store::{HistoryStore, save_to_csv};
use crate::util::print_hms;
use chrono::Utc;
use clap::Parser;
use log::{info, warn};
use scraper::Html;
use std::collections::HashMap;
use std::time::{Duration, Instant};

pub fn print_summary(records: &[SightingRecord]) {
    if records.is_empty() {
        println!("No records to summarize");
        return;
    }

    println!("\nSummary:");
    println!("Total sightings: {}", records.len());
    println!("Unique species: {}", unique_species(records));

    let top = top_locations(records, 3);
    if !top.is_empty() {
        println!("Top locations:");
        for (location, count) in top {
            println!("  {}: {}", location, count);
        }
    }
}

/// Most frequent known locations, highest count first, ties by name.
pub fn top_locations(records: &[SightingRecord], limit: usize) -> Vec<(&str, usize)> {
    let mut location_counts: HashMap<&str, usize> = HashMap::new();
    for record in records {
        if record.location != UNKNOWN {
            *location_counts.entry(&record.location).or_insert(0) += 1;
        }
    }

    let mut sorted_locations: Vec<_> = location_counts.into_iter().collect();
    sorted_locations.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
    sorted_locations.truncate(limit);
    sorted_locations
}

/// Get the alert page markup, from disk or over the network. Credentials are
/// checked before any request goes out.
async fn retrieve(args: &Args, site: &SiteConfig) -> Result<String, FetchError> {
    if let Some(path) = &args.html_file {
        info!("Reading alerts from {}", path.display());
        return read_html_file(path);
    }

    let credentials = if args.no_login {
        None
    } else {
        Some(Credentials::from_env()?)
    };

    let fetcher = AlertFetcher::new(Duration::from_secs(args.timeout))?
        .with_delay(args.delay)
        .with_max_retries(args.retries);

    if let Some(credentials) = &credentials {
        fetcher.login(&site.login_url, credentials).await?;
    }
    fetcher.fetch_alerts(&site.alert_url).await
}

/// Fold this run's sightings into history and persist the result. An empty
/// run leaves history untouched and reports from what is already saved.
pub fn update_history(
    mode: Mode,
    store: &HistoryStore,
    extracted: Vec<SightingRecord>,
) -> Result<Vec<SightingRecord>, StoreError> {
    if extracted.is_empty() {
        warn!("No sightings found - generating report from existing data");
        let existing = store.load()?;
        if existing.is_empty() {
            warn!("No existing data either - creating empty page");
        }
        return Ok(existing);
    }

    let sightings = match mode {
        Mode::Merge => {
            let outcome = merge_sightings(&store.load()?, extracted);
            info!(
                "History now holds {} sightings ({} new)",
                outcome.sightings.len(),
                outcome.added
            );
            outcome.sightings
        }
        Mode::Replace => {
            info!("Replacing history in {} with this run", store.path().display());
            dedup(extracted)
        }
    };

    store.save(&sightings)?;
    Ok(sightings)
}

fn init_logger(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    init_logger(args.verbose);

    let start = Instant::now();
    let site = SiteConfig::from_args(&args)?;
    let html = retrieve(&args, &site).await?;

    let document = Html::parse_document(&html);
    let extracted = Extractor::new(site.base_url.clone()).extract(&document, Utc::now());

    let store = HistoryStore::new(&args.data);
    let sightings = update_history(args.mode, &store, extracted)?;

    ReportRenderer::new(ReportConfig::from_args(&args)).write(&sightings, &args.output)?;
    if let Some(path) = &args.csv {
        save_to_csv(&sightings, path)?;
    }

    print_summary(&sightings);
    print_hms(&start);

    if sightings.is_empty() && args.fail_on_empty {
        return Err("No sightings available".into());
    }
    Ok(())
}
