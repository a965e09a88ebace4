use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// What to do with saved history when new sightings arrive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Mode {
    /// Append sightings not seen before
    Merge,
    /// Start a fresh baseline from this run only
    Replace,
}

#[derive(Parser)]
#[command(name = "warbler")]
#[command(about = "A CLI tool for tracking rare bird alert sightings")]
#[command(version = "0.1")]
pub(crate) struct Args {
    /// Alert summary page to scrape
    #[arg(short, long, default_value = "https://ebird.org/alert/summary?sid=SN35466")]
    pub url: String,

    /// Site origin used to resolve relative links
    #[arg(short, long, default_value = "https://ebird.org")]
    pub base_url: String,

    /// Login page
    #[arg(long, default_value = "https://secure.birds.cornell.edu/cassso/login")]
    pub login_url: String,

    /// Read the alert page from a saved HTML file instead of fetching it
    #[arg(long)]
    pub html_file: Option<PathBuf>,

    /// Fetch without logging in
    #[arg(long)]
    pub no_login: bool,

    /// Sighting history file
    #[arg(long, default_value = "data/sightings.json")]
    pub data: PathBuf,

    /// Output HTML report
    #[arg(short, long, default_value = "index.html")]
    pub output: PathBuf,

    /// Also export the history as CSV
    #[arg(long)]
    pub csv: Option<PathBuf>,

    /// How this run's sightings update the saved history
    #[arg(short, long, value_enum, default_value_t = Mode::Merge)]
    pub mode: Mode,

    /// Base delay between retries in milliseconds
    #[arg(short, long, default_value = "1000")]
    pub delay: u64,

    /// Maximum number of retry attempts
    #[arg(short, long, default_value = "3")]
    pub retries: u32,

    /// Request timeout in seconds
    #[arg(short, long, default_value = "30")]
    pub timeout: u64,

    /// Report title
    #[arg(long, default_value = "eBird Rare Bird Alerts")]
    pub title: String,

    /// Rows per page in the report table
    #[arg(long, default_value = "25")]
    pub page_length: usize,

    /// Exit with an error when there is nothing to report
    #[arg(long)]
    pub fail_on_empty: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}
