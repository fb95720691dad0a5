//! Duplicate removal over one run's emission records.

use std::collections::HashSet;

use chrono::{DateTime, Utc};

use crate::records::EmissionRecord;

/// Drops records sharing a (vehicle_id, timestamp) key, keeping the first
/// occurrence in iteration order. Stable and idempotent. Records carrying
/// the fallback identity share one key, so unidentified vehicles sampled at
/// the same instant collapse to a single record.
pub fn dedup_records(records: Vec<EmissionRecord>) -> Vec<EmissionRecord> {
    let mut seen: HashSet<(String, DateTime<Utc>)> = HashSet::with_capacity(records.len());
    records
        .into_iter()
        .filter(|r| seen.insert((r.vehicle_id.clone(), r.timestamp)))
        .collect()
}
