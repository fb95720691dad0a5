//! CLI entry point for the OTD traffic emissions monitor.
//!
//! One invocation performs one fetch, decode, validate, estimate, dedup,
//! and persist pass over a single Delhi OTD vehicle-positions snapshot.

use anyhow::{Context, Result, bail};
use clap::Parser;
use otd_emissions_monitor::{
    config::Config,
    decode::decode_vehicle_entities,
    dedup::dedup_records,
    emissions::estimate,
    fetch::{BasicClient, UrlParam, fetch_snapshot},
    output::{append_pollution_summary, append_vehicle_count, write_raw},
    records::{EmissionRecord, RunSummary, VehicleCountLogEntry},
    validate::validate_entities,
};
use std::ffi::OsStr;
use std::path::Path;
use tracing::{error, info, warn};
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "otd-emissions-monitor")]
#[command(
    about = "Fetches Delhi OTD vehicle positions and estimates traffic emissions",
    long_about = None
)]
struct Cli {
    /// Decode a local snapshot file instead of fetching the feed
    #[arg(long, value_name = "FILE")]
    source: Option<String>,

    /// CSV overwritten with this run's per-vehicle emission records
    #[arg(long, value_name = "FILE")]
    raw_output: Option<String>,

    /// CSV series appended with one (timestamp, vehicle_count) row per run
    #[arg(long, value_name = "FILE")]
    count_log: Option<String>,

    /// CSV series appended with one pollutant-totals row per run
    #[arg(long, value_name = "FILE")]
    summary: Option<String>,
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/otd_emissions.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("otd_emissions.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse().unwrap()));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse().unwrap()));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        error!(error = %e, "Run aborted");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let mut config = Config::from_env()?;
    if let Some(path) = cli.raw_output {
        config.raw_output = path;
    }
    if let Some(path) = cli.count_log {
        config.count_log = path;
    }
    if let Some(path) = cli.summary {
        config.summary = path;
    }

    let payload = load_payload(&cli.source, &config).await?;

    let entities = decode_vehicle_entities(&payload)?;
    info!(vehicles = entities.len(), "Fetched vehicle entities from feed");

    let validation = validate_entities(&entities, &config.bounds);
    if validation.skipped() > 0 {
        warn!(
            skipped = validation.skipped(),
            missing_fields = validation.missing_fields,
            out_of_bounds = validation.out_of_bounds,
            bad_speed = validation.bad_speed,
            bad_timestamp = validation.bad_timestamp,
            "Skipped invalid vehicle records"
        );
    }
    if validation.records.is_empty() {
        bail!(
            "no valid vehicle records after validation ({} skipped)",
            validation.skipped()
        );
    }

    let estimated: Vec<EmissionRecord> = validation
        .records
        .iter()
        .map(|r| estimate(r, &config.emission_factors))
        .collect();
    let records = dedup_records(estimated);
    info!(records = records.len(), "Processing complete");

    // Raw records are the primary artifact; failure here aborts the run.
    write_raw(&config.raw_output, &records)?;
    info!(path = %config.raw_output, rows = records.len(), "Saved raw traffic + emissions");

    // The two series appends are non-fatal and independently attempted.
    let count_entry = VehicleCountLogEntry::from_records(&records);
    match append_vehicle_count(&config.count_log, &count_entry) {
        Ok(()) => info!(vehicle_count = count_entry.vehicle_count, "Logged vehicle count"),
        Err(e) => error!(error = %e, "Failed to log vehicle count"),
    }

    let summary = RunSummary::from_records(&records);
    match append_pollution_summary(&config.summary, &summary) {
        Ok(()) => {
            info!(path = %config.summary, "Saved pollution summary");
            if let Ok(json) = serde_json::to_string(&summary) {
                info!(summary = %json, "Run summary");
            }
        }
        Err(e) => error!(error = %e, "Failed to save pollution summary"),
    }

    info!("All operations completed successfully");
    Ok(())
}

/// Loads the snapshot from a local file when `--source` is given, otherwise
/// fetches it from the configured feed endpoint.
async fn load_payload(source: &Option<String>, config: &Config) -> Result<Vec<u8>> {
    match source {
        Some(path) => {
            std::fs::read(path).with_context(|| format!("reading snapshot file {path}"))
        }
        None => {
            let client = BasicClient::with_timeout(config.request_timeout)?;
            let payload = match &config.api_key {
                Some(key) => {
                    let client = UrlParam {
                        inner: client,
                        param_name: config.api_key_param.clone(),
                        key: key.clone(),
                    };
                    fetch_snapshot(&client, &config.feed_url, config.max_attempts).await?
                }
                None => {
                    warn!("OTD_API_KEY not set, requesting feed without credentials");
                    fetch_snapshot(&client, &config.feed_url, config.max_attempts).await?
                }
            };
            Ok(payload)
        }
    }
}
