//! Record types flowing through the pipeline and the rows persisted per run.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Rounds `value` to `places` decimal places. Persisted fields carry fixed
/// precision: 6 places for coordinates, 2 for speeds and gram totals.
pub fn round_to(value: f64, places: i32) -> f64 {
    let scale = 10f64.powi(places);
    (value * scale).round() / scale
}

/// A vehicle reading that passed every validation check.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedRecord {
    pub vehicle_id: String,
    pub timestamp: DateTime<Utc>,
    pub latitude: f64,
    pub longitude: f64,
    pub speed_m_s: f64,
}

/// A validated reading extended with estimated pollutant masses in grams.
/// Constructed once by the estimator, never mutated.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmissionRecord {
    pub vehicle_id: String,
    pub timestamp: DateTime<Utc>,
    pub latitude: f64,
    pub longitude: f64,
    pub speed_m_s: f64,
    #[serde(rename = "CO")]
    pub co: f64,
    #[serde(rename = "NOx")]
    pub nox: f64,
    #[serde(rename = "PM2.5")]
    pub pm2_5: f64,
    #[serde(rename = "CO2")]
    pub co2: f64,
}

/// One row of the append-only pollution summary series.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunSummary {
    pub timestamp: DateTime<Utc>,
    pub vehicle_count: usize,
    #[serde(rename = "CO_total_g")]
    pub co_total_g: f64,
    #[serde(rename = "NOx_total_g")]
    pub nox_total_g: f64,
    #[serde(rename = "PM2.5_total_g")]
    pub pm2_5_total_g: f64,
    #[serde(rename = "CO2_total_g")]
    pub co2_total_g: f64,
}

impl RunSummary {
    pub const HEADERS: [&'static str; 6] = [
        "timestamp",
        "vehicle_count",
        "CO_total_g",
        "NOx_total_g",
        "PM2.5_total_g",
        "CO2_total_g",
    ];

    /// Aggregates one run's deduplicated records, stamped with wall-clock time.
    pub fn from_records(records: &[EmissionRecord]) -> Self {
        Self {
            timestamp: Utc::now(),
            vehicle_count: distinct_vehicles(records),
            co_total_g: round_to(records.iter().map(|r| r.co).sum(), 2),
            nox_total_g: round_to(records.iter().map(|r| r.nox).sum(), 2),
            pm2_5_total_g: round_to(records.iter().map(|r| r.pm2_5).sum(), 2),
            co2_total_g: round_to(records.iter().map(|r| r.co2).sum(), 2),
        }
    }
}

/// One row of the append-only vehicle-count series.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VehicleCountLogEntry {
    pub timestamp: DateTime<Utc>,
    pub vehicle_count: usize,
}

impl VehicleCountLogEntry {
    pub const HEADERS: [&'static str; 2] = ["timestamp", "vehicle_count"];

    pub fn from_records(records: &[EmissionRecord]) -> Self {
        Self {
            timestamp: Utc::now(),
            vehicle_count: distinct_vehicles(records),
        }
    }
}

/// Number of distinct vehicle identities in a record set.
pub fn distinct_vehicles(records: &[EmissionRecord]) -> usize {
    records
        .iter()
        .map(|r| r.vehicle_id.as_str())
        .collect::<HashSet<_>>()
        .len()
}
