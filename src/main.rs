//! # Herald Harvest
//!
//! Collects the recent articles of a single news publisher through Google
//! News RSS search and exports them as a deduplicated CSV file.
//!
//! ## Usage
//!
//! ```sh
//! herald_harvest -o miami_herald_articles.csv -d 30
//! ```
//!
//! ## Architecture
//!
//! The run is a strictly sequential pipeline:
//! 1. **Discovery**: one RSS search per catalog query, merged by title
//! 2. **Filtering**: drop articles older than the recency window
//! 3. **Resolution**: decode Google News redirect links to publisher URLs
//! 4. **Deduplication**: drop articles sharing a canonical URL
//! 5. **Export**: newest-first CSV with a fixed column set

use chrono::Local;
use clap::Parser;
use std::error::Error;
use tracing::{debug, error, info, instrument};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod cli;
mod config;
mod dates;
mod models;
mod outputs;
mod pipeline;
mod resolver;
mod scrapers;
mod urls;
mod utils;

use cli::Cli;
use config::PublisherProfile;
use models::FieldCompleteness;
use outputs::csv;
use resolver::GoogleNewsDecoder;
use scrapers::google_news::GoogleNewsClient;
use utils::{cutoff_from, ensure_writable_parent};

const RULE: &str = "============================================================";

#[tokio::main]
#[instrument]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();

    let args = Cli::parse();
    debug!(?args, "Parsed CLI arguments");

    let profile = match args.config.as_deref() {
        Some(path) => PublisherProfile::load(path)?,
        None => PublisherProfile::default(),
    };

    let now = Local::now().naive_local();
    let cutoff = cutoff_from(now, args.days_back);

    info!("{RULE}");
    info!("{} Article Harvest", profile.display_name);
    info!(
        "Date range: {} to {}",
        cutoff.format("%Y-%m-%d"),
        now.format("%Y-%m-%d")
    );
    info!("{RULE}");

    // Fail before spending a few minutes on queries.
    if let Err(e) = ensure_writable_parent(&args.output).await {
        error!(path = %args.output.display(), error = %e, "Output location is not writable");
        return Err(e);
    }

    // ---- Phase 1 ----
    info!("--- Phase 1: Discovering articles ---");
    let client = GoogleNewsClient::new(&profile, args.timeout())?;
    let queries = profile.query_catalog();
    let articles = pipeline::discover(&client, &queries, args.pacing()).await;
    info!(count = articles.len(), "Discovered unique articles");

    // ---- Phase 2 ----
    info!("--- Phase 2: Filtering by date ---");
    let articles = pipeline::filter_by_date(articles, cutoff);

    // ---- Phase 3 ----
    info!("--- Phase 3: Resolving URLs ---");
    let articles = pipeline::resolve_urls(articles, &GoogleNewsDecoder, &profile.domain);

    // ---- Phase 4 ----
    info!("--- Phase 4: Deduplication ---");
    let articles = pipeline::dedup_by_url(articles);

    // ---- Phase 5 ----
    info!("--- Phase 5: Writing CSV ---");
    if let Err(e) = csv::write_csv(&articles, &args.output).await {
        error!(path = %args.output.display(), error = %e, "Failed to write CSV");
        return Err(e);
    }

    // ---- Summary ----
    let counts = FieldCompleteness::tally(&articles, &profile.domain);
    let total = counts.total;
    info!("{RULE}");
    info!("DONE: {} articles saved to {}", total, args.output.display());
    info!("  With title:   {}/{}", counts.with_title, total);
    info!("  With date:    {}/{}", counts.with_date, total);
    info!("  With real URL:{}/{}", counts.with_publisher_url, total);
    info!("  With author:  {}/{}", counts.with_author, total);
    info!("  With summary: {}/{}", counts.with_summary, total);
    info!("{RULE}");

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        secs = elapsed.as_secs(),
        millis = elapsed.subsec_millis(),
        "Execution complete"
    );

    Ok(())
}
