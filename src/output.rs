//! Persistence sink for run artifacts.
//!
//! Three CSV stores: the raw per-vehicle records (overwritten each run) and
//! two append-only series (vehicle counts, pollution summaries). Store
//! creation with a header row is decoupled from the per-row append so the
//! append path never probes or rewrites the schema.

use std::fs::OpenOptions;
use std::io::ErrorKind;
use std::path::Path;

use csv::WriterBuilder;
use serde::Serialize;
use tracing::debug;

use crate::error::PersistenceError;
use crate::records::{EmissionRecord, RunSummary, VehicleCountLogEntry};

/// Overwrites the raw-records store with this run's deduplicated records,
/// header included. The previous run's rows are gone afterwards.
pub fn write_raw(path: &str, records: &[EmissionRecord]) -> Result<(), PersistenceError> {
    let raw_err = |source: csv::Error| PersistenceError::RawWriteFailed {
        path: path.to_string(),
        source,
    };

    let mut writer = csv::Writer::from_path(path).map_err(raw_err)?;
    for record in records {
        writer.serialize(record).map_err(raw_err)?;
    }
    writer.flush().map_err(|e| raw_err(e.into()))?;
    Ok(())
}

/// Creates an append-only store with its header row if it does not exist
/// yet. Idempotent; safe to call on every run.
pub fn ensure_store(path: &str, headers: &[&str]) -> Result<(), PersistenceError> {
    if Path::new(path).exists() {
        return Ok(());
    }
    let append_err = |source: csv::Error| PersistenceError::AppendFailed {
        path: path.to_string(),
        source,
    };

    debug!(path, "Creating store with header row");
    let file = match OpenOptions::new().write(true).create_new(true).open(path) {
        Ok(file) => file,
        // Another writer created it between the probe and the open; the
        // header row is already in place.
        Err(e) if e.kind() == ErrorKind::AlreadyExists => return Ok(()),
        Err(e) => return Err(append_err(e.into())),
    };
    let mut writer = WriterBuilder::new().from_writer(file);
    writer.write_record(headers).map_err(append_err)?;
    writer.flush().map_err(|e| append_err(e.into()))?;
    Ok(())
}

/// Appends one serialized row. Headers are never written here;
/// [`ensure_store`] owns the schema row.
fn append_row<T: Serialize>(path: &str, row: &T) -> Result<(), PersistenceError> {
    let append_err = |source: csv::Error| PersistenceError::AppendFailed {
        path: path.to_string(),
        source,
    };

    let file = OpenOptions::new()
        .append(true)
        .create(true)
        .open(path)
        .map_err(|e| append_err(e.into()))?;
    let mut writer = WriterBuilder::new().has_headers(false).from_writer(file);
    writer.serialize(row).map_err(append_err)?;
    writer.flush().map_err(|e| append_err(e.into()))?;
    Ok(())
}

/// Appends one row to the vehicle-count series.
pub fn append_vehicle_count(
    path: &str,
    entry: &VehicleCountLogEntry,
) -> Result<(), PersistenceError> {
    ensure_store(path, &VehicleCountLogEntry::HEADERS)?;
    append_row(path, entry)
}

/// Appends one row to the pollution-summary series.
pub fn append_pollution_summary(path: &str, summary: &RunSummary) -> Result<(), PersistenceError> {
    ensure_store(path, &RunSummary::HEADERS)?;
    append_row(path, summary)
}
