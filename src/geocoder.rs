//! Coordinate resolution for venues.
//!
//! Cascade, each step short-circuiting on success: venue cache →
//! parser-provided coordinates → postcode directory → terminated-postcode
//! directory → free-form geocoder. Successful resolutions are written back
//! to the venue row together with the derived great-circle distance from
//! the home postcode. Failures are silent; the venue stays coordinate-less
//! and is retried on the next scan.

use std::sync::RwLock;

use anyhow::Result;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::store::{self, Db};
use crate::util::http::HttpClient;

pub const EARTH_RADIUS_MILES: f64 = 3958.7613;

// UK bounding box, Crown Dependencies included.
const UK_LAT_MIN: f64 = 49.0;
const UK_LAT_MAX: f64 = 61.0;
const UK_LNG_MIN: f64 = -11.0;
const UK_LNG_MAX: f64 = 2.0;

/// True when the coordinates fall inside the UK bounding box.
pub fn coords_in_uk(lat: f64, lng: f64) -> bool {
    (UK_LAT_MIN..=UK_LAT_MAX).contains(&lat) && (UK_LNG_MIN..=UK_LNG_MAX).contains(&lng)
}

/// Great-circle distance in miles between two points.
pub fn haversine_miles(lat1: f64, lng1: f64, lat2: f64, lng2: f64) -> f64 {
    let phi1 = lat1.to_radians();
    let phi2 = lat2.to_radians();
    let dphi = (lat2 - lat1).to_radians();
    let dlambda = (lng2 - lng1).to_radians();
    let a = (dphi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (dlambda / 2.0).sin().powi(2);
    EARTH_RADIUS_MILES * 2.0 * a.sqrt().atan2((1.0 - a).sqrt())
}

/// Where a resolution came from; drives logging only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CoordSource {
    Parser,
    PostcodePrimary,
    PostcodeTerminated,
    Fallback,
}

pub struct Geocoder {
    http: HttpClient,
    primary_url: String,
    fallback_url: String,
    home: RwLock<Option<(f64, f64)>>,
}

impl Geocoder {
    pub fn new(http: HttpClient, primary_url: String, fallback_url: String) -> Self {
        Self {
            http,
            primary_url: primary_url.trim_end_matches('/').to_string(),
            fallback_url: fallback_url.trim_end_matches('/').to_string(),
            home: RwLock::new(None),
        }
    }

    /// Geocode the home postcode; called at startup and on postcode change.
    /// Returns false when the lookup fails (home stays unchanged).
    pub async fn set_home_postcode(&self, postcode: &str) -> bool {
        match self.lookup_postcode(postcode, false).await {
            Some((lat, lng)) => {
                *self.home.write().expect("home lock poisoned") = Some((lat, lng));
                info!(postcode, lat, lng, "home location set");
                true
            }
            None => {
                warn!(postcode, "failed to geocode home postcode");
                false
            }
        }
    }

    pub fn home_coords(&self) -> Option<(f64, f64)> {
        *self.home.read().expect("home lock poisoned")
    }

    /// Distance in miles from home, when home is known.
    pub fn distance_from_home(&self, lat: f64, lng: f64) -> Option<f64> {
        self.home_coords()
            .map(|(home_lat, home_lng)| haversine_miles(home_lat, home_lng, lat, lng))
    }

    /// Run the cascade for one venue. Writes coordinates and the derived
    /// distance to the venue row when a new value is learned.
    pub async fn resolve_venue(
        &self,
        db: &Db,
        venue_id: i64,
        parser_coords: Option<(f64, f64)>,
    ) -> Result<Option<(f64, f64)>> {
        let Some(venue) = store::venues::get_venue(db, venue_id).await? else {
            return Ok(None);
        };

        if let Some((lat, lng)) = venue.coords() {
            if coords_in_uk(lat, lng) {
                return Ok(Some((lat, lng)));
            }
        }

        let mut resolved: Option<((f64, f64), CoordSource)> = None;

        if let Some((lat, lng)) = parser_coords {
            if coords_in_uk(lat, lng) {
                resolved = Some(((lat, lng), CoordSource::Parser));
            } else {
                debug!(venue_id, lat, lng, "parser coordinates outside UK box, dropped");
            }
        }

        if resolved.is_none() {
            if let Some(pc) = venue.postcode.as_deref() {
                if let Some(coords) = self.lookup_postcode(pc, false).await {
                    resolved = Some((coords, CoordSource::PostcodePrimary));
                } else if let Some(coords) = self.lookup_postcode(pc, true).await {
                    resolved = Some((coords, CoordSource::PostcodeTerminated));
                }
            }
        }

        if resolved.is_none() {
            if let Some(coords) = self.lookup_freeform(&venue.canonical_name, venue.postcode.as_deref()).await
            {
                resolved = Some((coords, CoordSource::Fallback));
            }
        }

        let Some(((lat, lng), source)) = resolved else {
            return Ok(None);
        };

        let wrote = store::venues::set_coordinates_if_missing(db, venue_id, lat, lng).await?;
        if wrote {
            debug!(venue_id, ?source, lat, lng, "venue coordinates learned");
            if let Some(distance) = self.distance_from_home(lat, lng) {
                store::venues::set_distance(db, venue_id, distance).await?;
            }
        }
        Ok(Some((lat, lng)))
    }

    /// Postcode directory lookup; `terminated` selects the historic
    /// endpoint. Any HTTP failure is a miss.
    async fn lookup_postcode(&self, postcode: &str, terminated: bool) -> Option<(f64, f64)> {
        let segment = if terminated {
            "terminated_postcodes"
        } else {
            "postcodes"
        };
        let compact: String = postcode.chars().filter(|c| !c.is_whitespace()).collect();
        let url = format!("{}/{}/{}", self.primary_url, segment, compact);
        match self.http.get_json(&url).await {
            Ok(body) => parse_postcode_payload(&body).filter(|&(lat, lng)| coords_in_uk(lat, lng)),
            Err(err) => {
                debug!(postcode, terminated, error = %err, "postcode lookup miss");
                None
            }
        }
    }

    /// Free-form geocoder fallback; covers Crown Dependencies and names the
    /// postcode directory cannot place.
    async fn lookup_freeform(&self, name: &str, postcode: Option<&str>) -> Option<(f64, f64)> {
        let query = match postcode {
            Some(pc) => format!("{name}, {pc}"),
            None => name.to_string(),
        };
        let url = format!(
            "{}/search?format=json&limit=1&countrycodes=gb,gg,je,im&q={}",
            self.fallback_url,
            urlencode(&query)
        );
        match self.http.get_json(&url).await {
            Ok(body) => parse_freeform_payload(&body).filter(|&(lat, lng)| coords_in_uk(lat, lng)),
            Err(err) => {
                debug!(name, error = %err, "freeform geocode miss");
                None
            }
        }
    }
}

/// Extract `(lat, lng)` from a postcode directory response:
/// `{"status": 200, "result": {"latitude": .., "longitude": ..}}`.
fn parse_postcode_payload(body: &Value) -> Option<(f64, f64)> {
    let result = body.get("result")?;
    let lat = result.get("latitude")?.as_f64()?;
    let lng = result.get("longitude")?.as_f64()?;
    Some((lat, lng))
}

/// Extract `(lat, lng)` from a Nominatim-style response:
/// `[{"lat": "51.5", "lon": "-0.12"}, ...]`.
fn parse_freeform_payload(body: &Value) -> Option<(f64, f64)> {
    let first = body.as_array()?.first()?;
    let lat = json_f64(first.get("lat")?)?;
    let lng = json_f64(first.get("lon")?)?;
    Some((lat, lng))
}

fn json_f64(value: &Value) -> Option<f64> {
    if let Some(n) = value.as_f64() {
        return Some(n);
    }
    value.as_str()?.parse().ok()
}

fn urlencode(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for byte in input.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(byte as char)
            }
            b' ' => out.push('+'),
            _ => out.push_str(&format!("%{byte:02X}")),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn uk_bounding_box() {
        assert!(coords_in_uk(51.5074, -0.1278)); // London
        assert!(coords_in_uk(57.1497, -2.0943)); // Aberdeen
        assert!(coords_in_uk(49.45, -2.58)); // Guernsey
        assert!(!coords_in_uk(48.8566, 2.3522)); // Paris
        assert!(!coords_in_uk(40.7128, -74.0060)); // New York
        assert!(!coords_in_uk(51.5, 2.5)); // North Sea, east of the box
    }

    #[test]
    fn haversine_known_distance() {
        // London to Birmingham is just over 100 miles
        let d = haversine_miles(51.5074, -0.1278, 52.4862, -1.8904);
        assert!((d - 101.0).abs() < 3.0, "got {d}");
        // zero distance to self
        assert!(haversine_miles(52.0, -1.0, 52.0, -1.0).abs() < 1e-9);
    }

    #[test]
    fn parses_postcode_directory_payload() {
        let body = json!({"status": 200, "result": {"latitude": 52.52, "longitude": -1.46}});
        assert_eq!(parse_postcode_payload(&body), Some((52.52, -1.46)));
        assert_eq!(parse_postcode_payload(&json!({"status": 404, "error": "not found"})), None);
        assert_eq!(
            parse_postcode_payload(&json!({"result": {"latitude": null, "longitude": null}})),
            None
        );
    }

    #[test]
    fn parses_freeform_payload() {
        let body = json!([{"lat": "49.45", "lon": "-2.58", "display_name": "Guernsey"}]);
        assert_eq!(parse_freeform_payload(&body), Some((49.45, -2.58)));
        assert_eq!(parse_freeform_payload(&json!([])), None);
        assert_eq!(parse_freeform_payload(&json!({"not": "an array"})), None);
    }

    #[test]
    fn urlencodes_queries() {
        assert_eq!(urlencode("Arena UK, NG32 2EF"), "Arena+UK%2C+NG32+2EF");
    }
}
