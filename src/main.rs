mod app;
mod cli;
mod config;
mod datasources;
mod error;
mod logic;
mod models;

use anyhow::Context;
use app::App;
use clap::Parser;
use chrono::Datelike;
use cli::{AdviseArgs, Cli, Commands, ReportArgs};
use config::Config;
use logic::rules::RecommendationEngine;
use logic::{format_report, ReportOutcome};
use models::Report;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    // Initialize logging
    let default_level = match cli.verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Commands::Init = cli.command {
        Config::setup_interactive()?;
        println!("Run `bloomwatch check` to verify connectivity.");
        return Ok(());
    }

    // Advisory commands work offline and need no config
    match &cli.command {
        Commands::Advise(args) => {
            run_advise(args);
            return Ok(());
        }
        Commands::Rules => {
            for id in RecommendationEngine::new().list_rules() {
                println!("{}", id);
            }
            return Ok(());
        }
        _ => {}
    }

    // Load configuration
    let config = match Config::load(cli.config.clone()) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            eprintln!("Run `bloomwatch init` or pass --config <PATH>");
            std::process::exit(1);
        }
    };

    let app = App::from_config(config).context("Failed to create upstream clients")?;

    match cli.command {
        Commands::Report(args) => run_report(&app, &args).await?,
        Commands::Place(args) => {
            let label = app.resolve_place_name(args.lat, args.lon).await?;
            println!("{}", label);
        }
        Commands::Check => run_check(&app).await,
        Commands::Init | Commands::Advise(_) | Commands::Rules => {}
    }

    Ok(())
}

async fn run_report(app: &App, args: &ReportArgs) -> anyhow::Result<()> {
    let request = app.report_request(args)?;

    match app.build_report(&request).await {
        ReportOutcome::Built(report) => print_report(&report, args.json)?,
        ReportOutcome::Debounced {
            previous: Some(report),
            ..
        } => print_report(&report, args.json)?,
        ReportOutcome::Debounced { retry_after, .. } => {
            eprintln!(
                "A report was built moments ago; retry in {:.1}s",
                retry_after.as_secs_f64()
            );
        }
        ReportOutcome::Superseded => {
            eprintln!("Report request was superseded by a newer one");
        }
    }

    Ok(())
}

fn print_report(report: &Report, json: bool) -> anyhow::Result<()> {
    if json {
        let body = serde_json::to_string_pretty(report).context("Failed to encode report")?;
        println!("{}", body);
    } else {
        print!("{}", format_report(report));
    }
    Ok(())
}

fn run_advise(args: &AdviseArgs) {
    let month = args.month.unwrap_or_else(|| chrono::Local::now().month());
    let advisories = RecommendationEngine::new().recommend(args.ndvi, args.delta, month);

    if advisories.is_empty() {
        println!("No advisories for NDVI {:.3}", args.ndvi);
    }
    for message in advisories {
        println!("- {}", message);
    }
}

async fn run_check(app: &App) {
    println!("Config OK");
    println!("  API: {}", app.config.api.base_url);

    let status = app.check_connections().await;
    println!(
        "  BloomWatch API: {}",
        if status.analytics_api { "OK" } else { "OFFLINE" }
    );
    match status.geocoder {
        Some(true) => println!("  Geocoder: OK"),
        Some(false) => println!("  Geocoder: OFFLINE (offline region names will be used)"),
        None => println!("  Geocoder: disabled"),
    }

    if status.all_connected() {
        println!("All connections OK");
    } else if !status.core_connected() {
        eprintln!("Reports will show \"No Data\" until the BloomWatch API is reachable");
    }
}
