//! Command line definition.

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use streamstats_engine::PlayFilter;

/// Listening statistics from Spotify streaming-history exports.
#[derive(Debug, Parser)]
#[command(name = "streamstats", version, about)]
pub struct Cli {
    /// Configuration file (YAML or TOML)
    #[arg(long, global = true, env = "STREAMSTATS_CONFIG_PATH")]
    pub config: Option<PathBuf>,

    /// Display locale, e.g. en-US or fr-FR
    #[arg(long, global = true)]
    pub locale: Option<String>,

    /// IANA time zone used for calendar and clock statistics
    #[arg(long, global = true)]
    pub timezone: Option<String>,

    /// Log filter, e.g. info or streamstats_engine=debug
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// What to do
    #[command(subcommand)]
    pub command: Command,
}

/// Subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Import export files and print their summary
    Import(ImportArgs),
    /// Resolve the display image of an artist or a track
    Artwork(ArtworkArgs),
    /// Print the effective configuration
    Config,
}

/// Output encoding of the import summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable tables
    #[default]
    Text,
    /// One JSON document
    Json,
}

/// Arguments of `streamstats import`.
#[derive(Debug, Args)]
pub struct ImportArgs {
    /// Streaming-history files (.json or .csv)
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    /// Only plays whose artist contains this text
    #[arg(long)]
    pub artist: Option<String>,

    /// Only plays whose track contains this text
    #[arg(long)]
    pub track: Option<String>,

    /// First day to include (YYYY-MM-DD)
    #[arg(long)]
    pub from: Option<NaiveDate>,

    /// Last day to include (YYYY-MM-DD)
    #[arg(long)]
    pub to: Option<NaiveDate>,

    /// Minimum duration of a single play, in minutes
    #[arg(long, value_name = "MINUTES")]
    pub min_playtime: Option<u64>,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Files read concurrently
    #[arg(long)]
    pub parallelism: Option<usize>,

    /// Length of the top tracks and artists lists
    #[arg(long)]
    pub top: Option<usize>,
}

impl ImportArgs {
    /// The filter described by the arguments.
    pub fn filter(&self) -> PlayFilter {
        PlayFilter::new()
            .with_artist(self.artist.clone().unwrap_or_default())
            .with_track(self.track.clone().unwrap_or_default())
            .with_dates(self.from, self.to)
            .with_min_playtime(self.min_playtime.unwrap_or(0))
    }
}

/// Arguments of `streamstats artwork`.
#[derive(Debug, Args)]
pub struct ArtworkArgs {
    /// Artist name
    #[arg(long)]
    pub artist: String,

    /// Track title; the image of its album is resolved
    #[arg(long)]
    pub track: Option<String>,
}
