//! End-to-end pipeline tests over synthetic protobuf snapshots:
//! decode → validate → estimate → dedup → persist.

use otd_emissions_monitor::decode::decode_vehicle_entities;
use otd_emissions_monitor::dedup::dedup_records;
use otd_emissions_monitor::emissions::{EmissionFactors, estimate};
use otd_emissions_monitor::error::DecodeError;
use otd_emissions_monitor::gtfs_rt::{
    FeedEntity, FeedHeader, FeedMessage, Position, VehicleDescriptor, VehiclePosition,
};
use otd_emissions_monitor::output::{append_pollution_summary, append_vehicle_count, write_raw};
use otd_emissions_monitor::records::{EmissionRecord, RunSummary, VehicleCountLogEntry};
use otd_emissions_monitor::validate::{ValidationBounds, validate_entities};

use prost::Message;

fn snapshot(entities: Vec<FeedEntity>) -> Vec<u8> {
    FeedMessage {
        header: FeedHeader {
            gtfs_realtime_version: "2.0".to_string(),
            timestamp: Some(1_700_000_000),
        },
        entity: entities,
    }
    .encode_to_vec()
}

fn vehicle(id: &str, lat: f32, lon: f32, speed: f32, ts: Option<u64>) -> FeedEntity {
    FeedEntity {
        id: id.to_string(),
        vehicle: Some(VehiclePosition {
            position: Some(Position {
                latitude: lat,
                longitude: lon,
                speed: Some(speed),
                ..Default::default()
            }),
            timestamp: ts,
            vehicle: Some(VehicleDescriptor {
                id: Some(id.to_string()),
                ..Default::default()
            }),
            ..Default::default()
        }),
        ..Default::default()
    }
}

fn process(payload: &[u8]) -> (Vec<EmissionRecord>, usize) {
    let entities = decode_vehicle_entities(payload).expect("decode failed");
    let validation = validate_entities(&entities, &ValidationBounds::default());
    let skipped = validation.skipped();
    let factors = EmissionFactors::default();
    let estimated: Vec<EmissionRecord> = validation
        .records
        .iter()
        .map(|r| estimate(r, &factors))
        .collect();
    (dedup_records(estimated), skipped)
}

#[test]
fn test_mixed_snapshot_keeps_only_the_valid_vehicle() {
    let payload = snapshot(vec![
        // Missing timestamp: dropped.
        FeedEntity {
            id: "no-ts".to_string(),
            vehicle: Some(VehiclePosition {
                position: Some(Position {
                    latitude: 28.65,
                    longitude: 77.3,
                    speed: Some(5.0),
                    ..Default::default()
                }),
                timestamp: None,
                ..Default::default()
            }),
            ..Default::default()
        },
        // Latitude far outside the service area: dropped.
        vehicle("far-away", 40.0, 77.3, 5.0, Some(1_700_000_000)),
        // Valid reading at 10 m/s.
        vehicle("DL1PC1234", 28.65, 77.3, 10.0, Some(1_700_000_000)),
    ]);

    let (records, skipped) = process(&payload);

    assert_eq!(skipped, 2);
    assert_eq!(records.len(), 1);
    let record = &records[0];
    assert_eq!(record.vehicle_id, "DL1PC1234");
    assert_eq!(record.speed_m_s, 10.0);
    // 10 m/s over one sampling minute is 0.6 km; CO factor 6.0 g/km.
    assert_eq!(record.co, 3.6);
    assert_eq!(record.nox, 4.8);
    assert_eq!(record.pm2_5, 0.3);
    assert_eq!(record.co2, 660.0);
}

#[test]
fn test_duplicate_vehicle_and_timestamp_keeps_first_seen() {
    let payload = snapshot(vec![
        vehicle("V1", 28.65, 77.3, 10.0, Some(1_700_000_000)),
        vehicle("V1", 28.65, 77.3, 25.0, Some(1_700_000_000)),
    ]);

    let (records, skipped) = process(&payload);

    assert_eq!(skipped, 0);
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].speed_m_s, 10.0);
}

#[test]
fn test_all_invalid_snapshot_yields_zero_records() {
    let payload = snapshot(vec![
        vehicle("V1", 40.0, 77.3, 5.0, Some(1_700_000_000)),
        vehicle("V2", 28.65, 77.3, 99.0, Some(1_700_000_000)),
    ]);

    let (records, skipped) = process(&payload);
    assert!(records.is_empty());
    assert_eq!(skipped, 2);
}

#[test]
fn test_garbage_payload_is_a_decode_error() {
    let result = decode_vehicle_entities(&[0xFF, 0xFE, 0x00, 0x01]);
    assert!(matches!(result, Err(DecodeError::Malformed(_))));
}

#[test]
fn test_no_persisted_record_violates_declared_bounds() {
    let bounds = ValidationBounds::default();
    let payload = snapshot(vec![
        vehicle("V1", 28.52, 77.05, 0.0, Some(1_700_000_000)),
        vehicle("V2", 28.79, 77.39, 29.9, Some(1_700_000_000)),
        vehicle("V3", 28.65, 77.3, 12.5, Some(1_700_000_000)),
        vehicle("V4", 29.0, 77.3, 12.5, Some(1_700_000_000)),
    ]);

    let (records, _) = process(&payload);
    assert_eq!(records.len(), 3);
    for r in &records {
        assert!(r.latitude >= bounds.lat_min && r.latitude <= bounds.lat_max);
        assert!(r.longitude >= bounds.lon_min && r.longitude <= bounds.lon_max);
        assert!(r.speed_m_s >= 0.0 && r.speed_m_s <= bounds.speed_max_m_s);
        assert!(r.co >= 0.0 && r.nox >= 0.0 && r.pm2_5 >= 0.0 && r.co2 >= 0.0);
    }
}

#[test]
fn test_series_append_failure_does_not_block_other_stores() {
    let dir = std::env::temp_dir().join("otd_emissions_pipeline_isolation");
    std::fs::create_dir_all(&dir).unwrap();
    let raw_path = dir.join("raw.csv");
    let summary_path = dir.join("summary.csv");
    let bad_count_path = dir.join("missing/count.csv");
    let _ = std::fs::remove_file(&raw_path);
    let _ = std::fs::remove_file(&summary_path);

    let payload = snapshot(vec![vehicle("V1", 28.65, 77.3, 10.0, Some(1_700_000_000))]);
    let (records, _) = process(&payload);

    write_raw(raw_path.to_str().unwrap(), &records).unwrap();

    // Count-log append fails (missing directory)...
    let entry = VehicleCountLogEntry::from_records(&records);
    assert!(append_vehicle_count(bad_count_path.to_str().unwrap(), &entry).is_err());

    // ...but the summary append still succeeds independently.
    let summary = RunSummary::from_records(&records);
    append_pollution_summary(summary_path.to_str().unwrap(), &summary).unwrap();

    let summary_content = std::fs::read_to_string(&summary_path).unwrap();
    assert_eq!(summary_content.lines().count(), 2);
    assert!(std::fs::read_to_string(&raw_path).unwrap().contains("V1"));

    std::fs::remove_file(&raw_path).unwrap();
    std::fs::remove_file(&summary_path).unwrap();
}

#[test]
fn test_raw_store_row_format_is_stable() {
    let dir = std::env::temp_dir();
    let raw_path = dir.join("otd_emissions_pipeline_raw_format.csv");
    let _ = std::fs::remove_file(&raw_path);

    let payload = snapshot(vec![vehicle("V1", 28.65, 77.3, 10.0, Some(1_700_000_000))]);
    let (records, _) = process(&payload);
    write_raw(raw_path.to_str().unwrap(), &records).unwrap();

    let content = std::fs::read_to_string(&raw_path).unwrap();
    let mut lines = content.lines();
    assert_eq!(
        lines.next().unwrap(),
        "vehicle_id,timestamp,latitude,longitude,speed_m_s,CO,NOx,PM2.5,CO2"
    );
    let row = lines.next().unwrap();
    assert!(row.starts_with("V1,2023-11-14T"));
    assert!(row.contains("+00:00") || row.contains('Z'));

    std::fs::remove_file(&raw_path).unwrap();
}
