use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "bloomwatch",
    version,
    about = "Vegetation health reports from NDVI history and forecasts"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to config.yaml
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Increase log verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Build a vegetation health report for a region
    Report(ReportArgs),
    /// Resolve a coordinate to a place name
    Place(PlaceArgs),
    /// Print advisories for an NDVI reading without calling any upstream
    Advise(AdviseArgs),
    /// List advisory rules in evaluation order
    Rules,
    /// Validate config and test connections
    Check,
    /// Run interactive setup
    Init,
}

#[derive(Args)]
pub struct ReportArgs {
    /// Latitude of the region center
    #[arg(long, allow_hyphen_values = true)]
    pub lat: f64,

    /// Longitude of the region center
    #[arg(long, allow_hyphen_values = true)]
    pub lon: f64,

    /// Region size in degrees (square)
    #[arg(long, default_value_t = 5.0)]
    pub size: f64,

    /// Start date (YYYY-MM-DD)
    #[arg(long)]
    pub start: chrono::NaiveDate,

    /// End date (YYYY-MM-DD)
    #[arg(long)]
    pub end: chrono::NaiveDate,

    /// NDVI threshold for bloom detection (defaults to config)
    #[arg(long)]
    pub threshold: Option<f64>,

    /// Print the report as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args)]
pub struct PlaceArgs {
    #[arg(long, allow_hyphen_values = true)]
    pub lat: f64,

    #[arg(long, allow_hyphen_values = true)]
    pub lon: f64,
}

#[derive(Args)]
pub struct AdviseArgs {
    /// Latest observed NDVI
    #[arg(long, allow_hyphen_values = true)]
    pub ndvi: f64,

    /// NDVI change across the trend window
    #[arg(long, allow_hyphen_values = true, default_value_t = 0.0)]
    pub delta: f64,

    /// Calendar month 1-12 (defaults to the current month)
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..=12))]
    pub month: Option<u32>,
}
