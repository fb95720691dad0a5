pub mod config;
pub mod decode;
pub mod dedup;
pub mod emissions;
pub mod error;
pub mod fetch;
pub mod output;
pub mod records;
pub mod validate;

pub mod gtfs_rt {
    include!(concat!(env!("OUT_DIR"), "/transit_realtime.rs"));
}
