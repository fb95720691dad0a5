//! Static run configuration.
//!
//! Resolved once at startup from `.env`/environment variables with Delhi
//! OTD defaults, then never mutated. CLI flags may override the output
//! paths before the run starts.

use std::time::Duration;

use anyhow::{Context, Result};

use crate::emissions::EmissionFactors;
use crate::validate::ValidationBounds;

/// Delhi OTD realtime VehiclePositions endpoint.
pub const DEFAULT_FEED_URL: &str = "https://otd.delhi.gov.in/api/realtime/VehiclePositions.pb";

const DEFAULT_RAW_OUTPUT: &str = "raw_traffic_emissions.csv";
const DEFAULT_COUNT_LOG: &str = "vehicle_count_log.csv";
const DEFAULT_SUMMARY: &str = "traffic_pollution_summary.csv";

#[derive(Debug, Clone)]
pub struct Config {
    pub feed_url: String,
    /// Appended as a query parameter on every feed request. Optional so
    /// local snapshot replays work without credentials.
    pub api_key: Option<String>,
    pub api_key_param: String,
    pub max_attempts: u32,
    pub request_timeout: Duration,
    pub bounds: ValidationBounds,
    pub emission_factors: EmissionFactors,
    pub raw_output: String,
    pub count_log: String,
    pub summary: String,
}

impl Config {
    /// Builds the configuration from the environment:
    /// `OTD_FEED_URL`, `OTD_API_KEY`, and `EMISSION_FACTORS_FILE` (a JSON
    /// object mapping pollutant names to g/km factors).
    pub fn from_env() -> Result<Self> {
        let emission_factors = match std::env::var("EMISSION_FACTORS_FILE") {
            Ok(path) => load_factors(&path)?,
            Err(_) => EmissionFactors::default(),
        };

        Ok(Self {
            feed_url: std::env::var("OTD_FEED_URL")
                .unwrap_or_else(|_| DEFAULT_FEED_URL.to_string()),
            api_key: std::env::var("OTD_API_KEY").ok(),
            api_key_param: "key".to_string(),
            max_attempts: 3,
            request_timeout: Duration::from_secs(30),
            bounds: ValidationBounds::default(),
            emission_factors,
            raw_output: DEFAULT_RAW_OUTPUT.to_string(),
            count_log: DEFAULT_COUNT_LOG.to_string(),
            summary: DEFAULT_SUMMARY.to_string(),
        })
    }
}

fn load_factors(path: &str) -> Result<EmissionFactors> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("reading emission factors file {path}"))?;
    serde_json::from_str(&content)
        .with_context(|| format!("parsing emission factors file {path}"))
}
