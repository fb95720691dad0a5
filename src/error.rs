//! Error taxonomy for the pipeline stages.
//!
//! Fetch, decode, and raw-write failures are fatal and propagate to the
//! entry point; per-record validation problems are counted drops, never
//! errors; series appends fail non-fatally and are handled at the call site.

use thiserror::Error;

/// Failure retrieving a feed snapshot from the upstream service.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Every attempt in the retry budget timed out.
    #[error("feed request timed out")]
    Timeout,
    /// Transport or HTTP failure other than a timeout; never retried.
    #[error("feed request failed: {message}")]
    RequestFailed { message: String },
}

/// Failure turning a raw payload into vehicle entities.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("payload is not a valid GTFS-RT feed: {0}")]
    Malformed(#[from] prost::DecodeError),
    /// The feed decoded but carried no vehicle position entities. Fatal:
    /// downstream aggregates over zero vehicles would be misleading.
    #[error("feed contains no vehicle position entities")]
    NoVehicles,
}

/// Failure writing one of the three output stores.
#[derive(Debug, Error)]
pub enum PersistenceError {
    /// The raw-records store could not be overwritten. Fatal: raw data is
    /// the primary artifact of a run.
    #[error("failed to write raw records to {path}: {source}")]
    RawWriteFailed {
        path: String,
        #[source]
        source: csv::Error,
    },
    /// An append-only series could not be extended. Non-fatal for the
    /// vehicle-count log and pollution summary.
    #[error("failed to append to {path}: {source}")]
    AppendFailed {
        path: String,
        #[source]
        source: csv::Error,
    },
}
