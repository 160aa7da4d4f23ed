use anyhow::Result;
use tracing::{info, instrument, warn};

use crate::model::{Venue, VenueAlias};
use crate::seeds;
use crate::store::Db;

/// Upsert the venue seed list. Seed values only fill gaps: a postcode or
/// coordinate pair learned at runtime is never overwritten by re-seeding.
#[instrument(skip(db))]
pub async fn seed_venues(db: &Db) -> Result<()> {
    for seed in seeds::venue_seeds() {
        sqlx::query(
            "INSERT INTO venues (canonical_name, postcode, latitude, longitude)
             VALUES ($1, $2, $3, $4)
             ON CONFLICT (canonical_name) DO UPDATE SET
                 postcode = COALESCE(venues.postcode, EXCLUDED.postcode),
                 latitude = COALESCE(venues.latitude, EXCLUDED.latitude),
                 longitude = COALESCE(venues.longitude, EXCLUDED.longitude)",
        )
        .bind(&seed.canonical_name)
        .bind(&seed.postcode)
        .bind(seed.latitude)
        .bind(seed.longitude)
        .execute(&db.pool)
        .await?;
    }
    info!(count = seeds::venue_seeds().len(), "venue seeds ensured");
    Ok(())
}

/// Upsert seed aliases. Requires `seed_venues` to have run first.
#[instrument(skip(db))]
pub async fn seed_aliases(db: &Db) -> Result<()> {
    let mut inserted = 0u64;
    for seed in seeds::venue_seeds() {
        if seed.aliases.is_empty() {
            continue;
        }
        let Some(venue_id) = venue_id_by_name(db, &seed.canonical_name).await? else {
            warn!(venue = %seed.canonical_name, "seed venue missing while seeding aliases");
            continue;
        };
        for alias in &seed.aliases {
            let result = sqlx::query(
                "INSERT INTO venue_aliases (alias_name, venue_id)
                 VALUES ($1, $2)
                 ON CONFLICT (alias_name) DO NOTHING",
            )
            .bind(alias)
            .bind(venue_id)
            .execute(&db.pool)
            .await?;
            inserted += result.rows_affected();
        }
    }
    info!(inserted, "venue aliases ensured");
    Ok(())
}

pub async fn venue_id_by_name(db: &Db, canonical_name: &str) -> Result<Option<i64>> {
    let id = sqlx::query_scalar::<_, i64>("SELECT id FROM venues WHERE canonical_name = $1")
        .bind(canonical_name)
        .fetch_optional(&db.pool)
        .await?;
    Ok(id)
}

/// Insert a venue, or return the existing row's id when another writer got
/// there first. The DO UPDATE is a no-op touch so RETURNING always yields
/// the surviving row.
pub async fn ensure_venue(db: &Db, canonical_name: &str, postcode: Option<&str>) -> Result<i64> {
    let id = sqlx::query_scalar::<_, i64>(
        "INSERT INTO venues (canonical_name, postcode)
         VALUES ($1, $2)
         ON CONFLICT (canonical_name) DO UPDATE SET
             postcode = COALESCE(venues.postcode, EXCLUDED.postcode)
         RETURNING id",
    )
    .bind(canonical_name)
    .bind(postcode)
    .fetch_one(&db.pool)
    .await?;
    Ok(id)
}

pub async fn get_venue(db: &Db, id: i64) -> Result<Option<Venue>> {
    let venue = sqlx::query_as::<_, Venue>("SELECT * FROM venues WHERE id = $1")
        .bind(id)
        .fetch_optional(&db.pool)
        .await?;
    Ok(venue)
}

pub async fn all_venues(db: &Db) -> Result<Vec<Venue>> {
    let venues = sqlx::query_as::<_, Venue>("SELECT * FROM venues ORDER BY id")
        .fetch_all(&db.pool)
        .await?;
    Ok(venues)
}

pub async fn all_aliases(db: &Db) -> Result<Vec<VenueAlias>> {
    let aliases = sqlx::query_as::<_, VenueAlias>("SELECT * FROM venue_aliases ORDER BY id")
        .fetch_all(&db.pool)
        .await?;
    Ok(aliases)
}

/// Record a runtime-learned alias; racing writers are fine, first insert
/// wins.
pub async fn insert_alias(db: &Db, alias_name: &str, venue_id: i64) -> Result<()> {
    sqlx::query(
        "INSERT INTO venue_aliases (alias_name, venue_id)
         VALUES ($1, $2)
         ON CONFLICT (alias_name) DO NOTHING",
    )
    .bind(alias_name)
    .bind(venue_id)
    .execute(&db.pool)
    .await?;
    Ok(())
}

/// Conditionally write coordinates: only fills venues that have none, so
/// concurrent scans cannot clobber each other.
pub async fn set_coordinates_if_missing(
    db: &Db,
    venue_id: i64,
    latitude: f64,
    longitude: f64,
) -> Result<bool> {
    let result = sqlx::query(
        "UPDATE venues SET latitude = $2, longitude = $3
         WHERE id = $1 AND latitude IS NULL",
    )
    .bind(venue_id)
    .bind(latitude)
    .bind(longitude)
    .execute(&db.pool)
    .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn set_postcode_if_missing(db: &Db, venue_id: i64, postcode: &str) -> Result<()> {
    sqlx::query("UPDATE venues SET postcode = $2 WHERE id = $1 AND postcode IS NULL")
        .bind(venue_id)
        .bind(postcode)
        .execute(&db.pool)
        .await?;
    Ok(())
}

pub async fn set_distance(db: &Db, venue_id: i64, distance_miles: f64) -> Result<()> {
    sqlx::query("UPDATE venues SET distance_miles = $2 WHERE id = $1")
        .bind(venue_id)
        .bind(distance_miles)
        .execute(&db.pool)
        .await?;
    Ok(())
}

/// Venues that have coordinates but no derived distance yet.
pub async fn venues_missing_distance(db: &Db) -> Result<Vec<Venue>> {
    let venues = sqlx::query_as::<_, Venue>(
        "SELECT * FROM venues
         WHERE latitude IS NOT NULL AND longitude IS NOT NULL AND distance_miles IS NULL",
    )
    .fetch_all(&db.pool)
    .await?;
    Ok(venues)
}

/// Every venue with coordinates; used when the home postcode changes.
pub async fn venues_with_coordinates(db: &Db) -> Result<Vec<Venue>> {
    let venues = sqlx::query_as::<_, Venue>(
        "SELECT * FROM venues WHERE latitude IS NOT NULL AND longitude IS NOT NULL",
    )
    .fetch_all(&db.pool)
    .await?;
    Ok(venues)
}
