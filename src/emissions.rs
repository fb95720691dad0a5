//! Per-vehicle emission estimation from sampled speed.
//!
//! A deliberately simple linear model: distance covered in one sampling
//! minute times a fixed per-kilometre factor for each pollutant.

use serde::Deserialize;

use crate::records::{EmissionRecord, ValidatedRecord, round_to};

/// Grams of pollutant emitted per kilometre travelled.
///
/// Defaults are representative of a diesel transit bus. Deployments can
/// swap the table via `EMISSION_FACTORS_FILE` (see [`crate::config`]).
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct EmissionFactors {
    #[serde(rename = "CO")]
    pub co: f64,
    #[serde(rename = "NOx")]
    pub nox: f64,
    #[serde(rename = "PM2.5")]
    pub pm2_5: f64,
    #[serde(rename = "CO2")]
    pub co2: f64,
}

impl Default for EmissionFactors {
    fn default() -> Self {
        Self {
            co: 6.0,
            nox: 8.0,
            pm2_5: 0.5,
            co2: 1100.0,
        }
    }
}

/// Distance covered in one sampling minute, in kilometres:
/// m/s → km/h, then one sixtieth of an hour.
fn distance_km_per_minute(speed_m_s: f64) -> f64 {
    speed_m_s * 3.6 / 60.0
}

/// Extends a validated record with pollutant-mass estimates. Total function:
/// inputs are already validated, so there is no failure path.
pub fn estimate(record: &ValidatedRecord, factors: &EmissionFactors) -> EmissionRecord {
    let distance_km = distance_km_per_minute(record.speed_m_s);
    EmissionRecord {
        vehicle_id: record.vehicle_id.clone(),
        timestamp: record.timestamp,
        latitude: record.latitude,
        longitude: record.longitude,
        speed_m_s: record.speed_m_s,
        co: round_to(factors.co * distance_km, 2),
        nox: round_to(factors.nox * distance_km, 2),
        pm2_5: round_to(factors.pm2_5 * distance_km, 2),
        co2: round_to(factors.co2 * distance_km, 2),
    }
}
