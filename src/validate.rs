//! Validation of decoded vehicle entities against field-presence, geographic,
//! speed, and timestamp checks.
//!
//! A pure filter: invalid entities are counted by drop reason, never raised.

use chrono::{TimeZone, Utc};

use crate::gtfs_rt::FeedEntity;
use crate::records::{ValidatedRecord, round_to};

/// Identity sentinel for vehicles with neither a descriptor id nor an
/// entity id. Within one run all such records share this identity.
pub const FALLBACK_VEHICLE_ID: &str = "unknown";

/// Geographic service-area box plus the plausible speed ceiling.
#[derive(Debug, Clone)]
pub struct ValidationBounds {
    pub lat_min: f64,
    pub lat_max: f64,
    pub lon_min: f64,
    pub lon_max: f64,
    pub speed_max_m_s: f64,
}

impl Default for ValidationBounds {
    /// Delhi service area; 30 m/s is roughly 108 km/h, a reasonable bus max.
    fn default() -> Self {
        Self {
            lat_min: 28.5,
            lat_max: 28.8,
            lon_min: 77.0,
            lon_max: 77.4,
            speed_max_m_s: 30.0,
        }
    }
}

/// Why an entity was dropped. Checks run in this order and short-circuit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropReason {
    MissingFields,
    OutOfBounds,
    BadSpeed,
    BadTimestamp,
}

/// Outcome of one validation pass: surviving records plus per-reason drop
/// counts for observability.
#[derive(Debug, Default)]
pub struct Validation {
    pub records: Vec<ValidatedRecord>,
    pub missing_fields: usize,
    pub out_of_bounds: usize,
    pub bad_speed: usize,
    pub bad_timestamp: usize,
}

impl Validation {
    /// Total entities dropped across all reasons.
    pub fn skipped(&self) -> usize {
        self.missing_fields + self.out_of_bounds + self.bad_speed + self.bad_timestamp
    }
}

/// Filters entities down to validated records. Total function: never fails,
/// an all-invalid input just yields zero records.
pub fn validate_entities(entities: &[FeedEntity], bounds: &ValidationBounds) -> Validation {
    let mut out = Validation::default();
    for entity in entities {
        match check_entity(entity, bounds) {
            Ok(record) => out.records.push(record),
            Err(DropReason::MissingFields) => out.missing_fields += 1,
            Err(DropReason::OutOfBounds) => out.out_of_bounds += 1,
            Err(DropReason::BadSpeed) => out.bad_speed += 1,
            Err(DropReason::BadTimestamp) => out.bad_timestamp += 1,
        }
    }
    out
}

fn check_entity(entity: &FeedEntity, bounds: &ValidationBounds) -> Result<ValidatedRecord, DropReason> {
    let Some(vehicle) = &entity.vehicle else {
        return Err(DropReason::MissingFields);
    };
    let (Some(position), Some(epoch)) = (&vehicle.position, vehicle.timestamp) else {
        return Err(DropReason::MissingFields);
    };

    let latitude = f64::from(position.latitude);
    let longitude = f64::from(position.longitude);
    if !(bounds.lat_min..=bounds.lat_max).contains(&latitude)
        || !(bounds.lon_min..=bounds.lon_max).contains(&longitude)
    {
        return Err(DropReason::OutOfBounds);
    }

    // Absent speed reads as stationary, matching the upstream feed contract.
    let speed = position.speed.map(f64::from).unwrap_or(0.0);
    if !(0.0..=bounds.speed_max_m_s).contains(&speed) {
        return Err(DropReason::BadSpeed);
    }

    let timestamp = i64::try_from(epoch)
        .ok()
        .and_then(|secs| Utc.timestamp_opt(secs, 0).single())
        .ok_or(DropReason::BadTimestamp)?;

    Ok(ValidatedRecord {
        vehicle_id: resolve_vehicle_id(entity),
        timestamp,
        latitude: round_to(latitude, 6),
        longitude: round_to(longitude, 6),
        speed_m_s: round_to(speed, 2),
    })
}

/// Vehicle descriptor id first, entity id second, `"unknown"` last.
/// Identity is never empty.
fn resolve_vehicle_id(entity: &FeedEntity) -> String {
    entity
        .vehicle
        .as_ref()
        .and_then(|v| v.vehicle.as_ref())
        .and_then(|d| d.id.as_deref())
        .filter(|id| !id.is_empty())
        .or_else(|| (!entity.id.is_empty()).then_some(entity.id.as_str()))
        .unwrap_or(FALLBACK_VEHICLE_ID)
        .to_string()
}
