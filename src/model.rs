//! Persisted row types. Venue-derived attributes (postcode, coordinates,
//! distance) live on the venue row only; competitions read them through
//! `venue_id`.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Source {
    pub id: i64,
    pub key: String,
    pub display_name: String,
    pub url: String,
    pub enabled: bool,
    pub last_scanned_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Venue {
    pub id: i64,
    pub canonical_name: String,
    pub postcode: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub distance_miles: Option<f64>,
}

impl Venue {
    /// Coordinates when both components are present.
    pub fn coords(&self) -> Option<(f64, f64)> {
        match (self.latitude, self.longitude) {
            (Some(lat), Some(lng)) => Some((lat, lng)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct VenueAlias {
    pub id: i64,
    pub alias_name: String,
    pub venue_id: i64,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Competition {
    pub id: i64,
    pub source_id: i64,
    pub name: String,
    pub date_start: NaiveDate,
    pub date_end: Option<NaiveDate>,
    pub venue_id: i64,
    pub is_competition: bool,
    pub discipline: Option<String>,
    pub has_pony_classes: bool,
    pub url: Option<String>,
    pub classes: Json<Vec<String>>,
    pub description: Option<String>,
    pub raw_extract: Option<Json<serde_json::Value>>,
    pub first_seen_at: DateTime<Utc>,
    pub last_seen_at: DateTime<Utc>,
}

/// Competition joined with the venue attributes the read API exposes.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct CompetitionWithVenue {
    pub id: i64,
    pub source_id: i64,
    pub name: String,
    pub date_start: NaiveDate,
    pub date_end: Option<NaiveDate>,
    pub venue_id: i64,
    pub venue_name: String,
    pub venue_postcode: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub distance_miles: Option<f64>,
    pub is_competition: bool,
    pub discipline: Option<String>,
    pub has_pony_classes: bool,
    pub url: Option<String>,
    pub classes: Json<Vec<String>>,
    pub first_seen_at: DateTime<Utc>,
    pub last_seen_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScanStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

impl ScanStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ScanStatus::Pending => "pending",
            ScanStatus::Running => "running",
            ScanStatus::Completed => "completed",
            ScanStatus::Failed => "failed",
        }
    }
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Scan {
    pub id: i64,
    pub source_id: i64,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub status: String,
    pub events_found: i32,
    pub events_upserted: i32,
    pub competition_count: i32,
    pub training_count: i32,
    pub error: Option<String>,
}
