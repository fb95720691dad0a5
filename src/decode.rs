//! Protobuf decoding of the vehicle-positions feed.

use prost::Message;
use tracing::debug;

use crate::error::DecodeError;
use crate::gtfs_rt::{FeedEntity, FeedMessage};

/// Decodes a raw feed payload and keeps only the entities carrying vehicle
/// telemetry. Other entity kinds in the same feed (trip updates and the
/// like) are dropped silently.
///
/// # Errors
///
/// [`DecodeError::Malformed`] if the bytes are not a valid `FeedMessage`,
/// [`DecodeError::NoVehicles`] if nothing with a vehicle payload remains.
pub fn decode_vehicle_entities(payload: &[u8]) -> Result<Vec<FeedEntity>, DecodeError> {
    let feed = FeedMessage::decode(payload)?;
    let total = feed.entity.len();

    let entities: Vec<FeedEntity> = feed
        .entity
        .into_iter()
        .filter(|e| e.vehicle.is_some())
        .collect();
    debug!(total, vehicles = entities.len(), "Decoded feed entities");

    if entities.is_empty() {
        return Err(DecodeError::NoVehicles);
    }
    Ok(entities)
}
