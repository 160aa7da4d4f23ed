// API request/response models (DTOs)

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::store::competitions::CatalogFilter;

/// Standard API response wrapper
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<Meta>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            meta: Some(Meta::now()),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
            meta: Some(Meta::now()),
        }
    }
}

/// Metadata included in all API responses
#[derive(Debug, Serialize, Deserialize)]
pub struct Meta {
    pub timestamp: DateTime<Utc>,
    pub request_id: String,
    pub version: String,
}

impl Meta {
    pub fn now() -> Self {
        Self {
            timestamp: Utc::now(),
            request_id: uuid::Uuid::new_v4().to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub database: String,
    pub uptime_seconds: u64,
}

/// Query parameters for the catalog listing.
#[derive(Debug, Clone, Deserialize)]
pub struct CompetitionQuery {
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
    pub discipline: Option<String>,
    /// Case-insensitive venue-name substring.
    pub venue: Option<String>,
    #[serde(default)]
    pub pony_only: bool,
    pub max_distance: Option<f64>,
    /// Defaults to true (competitions only); pass false for training and
    /// venue-hire events.
    pub is_competition: Option<bool>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl CompetitionQuery {
    pub fn into_filter(self) -> CatalogFilter {
        CatalogFilter {
            date_from: self.date_from,
            date_to: self.date_to,
            discipline: self.discipline,
            venue: self.venue,
            pony_only: self.pony_only,
            max_distance: self.max_distance,
            is_competition: self.is_competition,
            limit: self.limit.unwrap_or(100),
            offset: self.offset.unwrap_or(0),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScanQuery {
    pub source_id: Option<i64>,
    pub limit: Option<i64>,
}

/// Scan trigger body; empty means "all enabled sources".
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ScanTriggerRequest {
    pub source_id: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PostcodeUpdateRequest {
    pub postcode: String,
}

#[derive(Debug, Serialize)]
pub struct TriggerResponse {
    pub started: Vec<StartedScan>,
    pub already_running: Vec<i64>,
}

#[derive(Debug, Serialize)]
pub struct StartedScan {
    pub source_id: i64,
    pub scan_id: i64,
}

#[derive(Debug, Serialize)]
pub struct PostcodeUpdateResponse {
    pub postcode: String,
    pub distances_updated: u64,
}
