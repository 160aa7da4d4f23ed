//! Post-scan maintenance: discipline vocabulary audit and venue distance
//! backfill.

use anyhow::Result;
use tracing::{info, instrument, warn};

use crate::geocoder::Geocoder;
use crate::normalization::discipline::normalise_discipline;
use crate::store::{self, Db};

/// Re-run discipline canonicalization over every stored non-null value and
/// fix drift. Runs after scheduled scans only.
#[instrument(skip(db))]
pub async fn audit_disciplines(db: &Db) -> Result<u64> {
    let mut fixed = 0u64;
    for (raw, count) in store::competitions::discipline_counts(db).await? {
        let (canonical, is_competition) = normalise_discipline(&raw);
        match canonical {
            Some(canonical) if canonical != raw => {
                info!(from = %raw, to = %canonical, rows = count, "discipline audit fixup");
                fixed += store::competitions::rewrite_discipline(db, &raw, canonical, is_competition)
                    .await?;
            }
            Some(_) => {}
            None => {
                warn!(discipline = %raw, rows = count, "unmapped discipline in catalog");
            }
        }
    }
    if fixed > 0 {
        info!(fixed, "discipline audit rewrote rows");
    } else {
        info!("discipline audit: all values canonical");
    }
    Ok(fixed)
}

/// Fill `distance_miles` for venues that have coordinates but no derived
/// distance yet. Competitions read distance through the venue reference,
/// so no competition rows are touched.
pub async fn backfill_venue_distances(db: &Db, geocoder: &Geocoder) -> Result<u64> {
    let mut filled = 0u64;
    for venue in store::venues::venues_missing_distance(db).await? {
        let Some((lat, lng)) = venue.coords() else {
            continue;
        };
        if let Some(distance) = geocoder.distance_from_home(lat, lng) {
            store::venues::set_distance(db, venue.id, distance).await?;
            filled += 1;
        }
    }
    if filled > 0 {
        info!(filled, "venue distances backfilled");
    }
    Ok(filled)
}

/// Recompute `distance_miles` for every venue with coordinates; used when
/// the home postcode changes.
#[instrument(skip(db, geocoder))]
pub async fn recompute_all_distances(db: &Db, geocoder: &Geocoder) -> Result<u64> {
    let mut updated = 0u64;
    for venue in store::venues::venues_with_coordinates(db).await? {
        let Some((lat, lng)) = venue.coords() else {
            continue;
        };
        if let Some(distance) = geocoder.distance_from_home(lat, lng) {
            store::venues::set_distance(db, venue.id, distance).await?;
            updated += 1;
        }
    }
    info!(updated, "venue distances recomputed");
    Ok(updated)
}
