//! Command-line interface definitions.
//!
//! Every option can also be supplied through an environment variable.

use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

/// Command-line arguments for a harvest run.
///
/// # Examples
///
/// ```sh
/// # Miami Herald, last 30 days, into the default CSV
/// herald_harvest
///
/// # Last week only, custom output
/// herald_harvest -d 7 -o ./exports/week.csv
///
/// # Another publisher described in YAML
/// herald_harvest -c ./profiles/tampabay.yaml
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Path of the CSV file to write
    #[arg(short, long, env = "HERALD_OUTPUT", default_value = "miami_herald_articles.csv")]
    pub output: PathBuf,

    /// Keep articles published within this many days
    #[arg(short, long, env = "HERALD_DAYS_BACK", default_value_t = 30)]
    pub days_back: u32,

    /// Pause between feed queries, in milliseconds
    #[arg(long, env = "HERALD_DELAY_MS", default_value_t = 1000)]
    pub delay_ms: u64,

    /// Per-request timeout, in seconds
    #[arg(long, env = "HERALD_TIMEOUT_SECS", default_value_t = 30)]
    pub timeout_secs: u64,

    /// Optional path to a publisher profile YAML file
    #[arg(short, long, env = "HERALD_CONFIG")]
    pub config: Option<String>,
}

impl Cli {
    /// Delay inserted between consecutive feed queries.
    ///
    /// # Returns
    ///
    /// `--delay-ms` as a [`Duration`]. Zero disables pacing.
    pub fn pacing(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }

    /// Per-request HTTP timeout for feed queries.
    ///
    /// # Returns
    ///
    /// `--timeout-secs` as a [`Duration`].
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}
