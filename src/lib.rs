//! compgather: aggregates equestrian-competition listings from heterogeneous
//! public sources into a canonical, deduplicated, geocoded, classified
//! catalog with a small read API.
//!
//! The ingest pipeline per scan: parser → ExtractedEvent list → per event:
//! date parse → venue/postcode normalization → classification → venue
//! matching → geocoding → dedup-key upsert.

pub mod api;
pub mod audit;
pub mod classifier;
pub mod config;
pub mod extract;
pub mod geocoder;
pub mod logging;
pub mod matcher;
pub mod model;
pub mod normalization;
pub mod parsers;
pub mod scanner;
pub mod scheduler;
pub mod seeds;
pub mod store;

pub mod util {
    pub mod env;
    pub mod http;
}
