use anyhow::Result;
use chrono::NaiveDate;
use sqlx::{Postgres, QueryBuilder};
use tracing::instrument;

use crate::model::CompetitionWithVenue;
use crate::store::Db;

/// One fully-normalized event ready for the dedup-key upsert.
#[derive(Debug, Clone)]
pub struct CompetitionUpsert {
    pub source_id: i64,
    pub name: String,
    pub date_start: NaiveDate,
    pub date_end: Option<NaiveDate>,
    pub venue_id: i64,
    pub is_competition: bool,
    pub discipline: Option<String>,
    pub has_pony_classes: bool,
    pub url: Option<String>,
    pub classes: Vec<String>,
    pub description: Option<String>,
    pub raw_extract: Option<serde_json::Value>,
}

/// Upsert on the dedup key `(source_id, name, date_start, venue_id)`.
///
/// New rows get `first_seen_at = last_seen_at = now()`; rediscovered rows
/// keep `first_seen_at` and have every mutable field overwritten.
pub async fn upsert_competition(db: &Db, row: &CompetitionUpsert) -> Result<()> {
    sqlx::query(
        "INSERT INTO competitions
             (source_id, name, date_start, date_end, venue_id, is_competition,
              discipline, has_pony_classes, url, classes, description, raw_extract)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
         ON CONFLICT (source_id, name, date_start, venue_id) DO UPDATE SET
             date_end = EXCLUDED.date_end,
             is_competition = EXCLUDED.is_competition,
             discipline = EXCLUDED.discipline,
             has_pony_classes = EXCLUDED.has_pony_classes,
             url = EXCLUDED.url,
             classes = EXCLUDED.classes,
             description = EXCLUDED.description,
             raw_extract = EXCLUDED.raw_extract,
             last_seen_at = now()",
    )
    .bind(row.source_id)
    .bind(&row.name)
    .bind(row.date_start)
    .bind(row.date_end)
    .bind(row.venue_id)
    .bind(row.is_competition)
    .bind(&row.discipline)
    .bind(row.has_pony_classes)
    .bind(&row.url)
    .bind(sqlx::types::Json(&row.classes))
    .bind(&row.description)
    .bind(row.raw_extract.as_ref().map(sqlx::types::Json))
    .execute(&db.pool)
    .await?;
    Ok(())
}

/// Catalog query filters; everything optional except pagination.
#[derive(Debug, Clone, Default)]
pub struct CatalogFilter {
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
    pub discipline: Option<String>,
    pub venue: Option<String>,
    pub pony_only: bool,
    pub max_distance: Option<f64>,
    /// None applies the default (competitions only); Some(false) selects
    /// training/hire events instead.
    pub is_competition: Option<bool>,
    pub limit: i64,
    pub offset: i64,
}

const COMPETITION_SELECT: &str = "SELECT c.id, c.source_id, c.name, c.date_start, c.date_end,
        c.venue_id, v.canonical_name AS venue_name, v.postcode AS venue_postcode,
        v.latitude, v.longitude, v.distance_miles,
        c.is_competition, c.discipline, c.has_pony_classes, c.url, c.classes,
        c.first_seen_at, c.last_seen_at
   FROM competitions c JOIN venues v ON v.id = c.venue_id";

#[instrument(skip(db, filter))]
pub async fn query_catalog(db: &Db, filter: &CatalogFilter) -> Result<Vec<CompetitionWithVenue>> {
    let mut qb: QueryBuilder<'_, Postgres> = QueryBuilder::new(COMPETITION_SELECT);
    qb.push(" WHERE c.is_competition = ");
    qb.push_bind(filter.is_competition.unwrap_or(true));

    if let Some(from) = filter.date_from {
        qb.push(" AND c.date_start >= ");
        qb.push_bind(from);
    }
    if let Some(to) = filter.date_to {
        qb.push(" AND c.date_start <= ");
        qb.push_bind(to);
    }
    if let Some(discipline) = &filter.discipline {
        qb.push(" AND c.discipline = ");
        qb.push_bind(discipline);
    }
    if let Some(venue) = &filter.venue {
        qb.push(" AND v.canonical_name ILIKE ");
        qb.push_bind(format!("%{venue}%"));
    }
    if filter.pony_only {
        qb.push(" AND c.has_pony_classes = TRUE");
    }
    if let Some(max_distance) = filter.max_distance {
        qb.push(" AND v.distance_miles IS NOT NULL AND v.distance_miles <= ");
        qb.push_bind(max_distance);
    }

    qb.push(" ORDER BY c.date_start, c.id LIMIT ");
    qb.push_bind(filter.limit.clamp(1, 500));
    qb.push(" OFFSET ");
    qb.push_bind(filter.offset.max(0));

    let rows = qb
        .build_query_as::<CompetitionWithVenue>()
        .fetch_all(&db.pool)
        .await?;
    Ok(rows)
}

pub async fn get_competition(db: &Db, id: i64) -> Result<Option<CompetitionWithVenue>> {
    let sql = format!("{COMPETITION_SELECT} WHERE c.id = $1");
    let row = sqlx::query_as::<_, CompetitionWithVenue>(&sql)
        .bind(id)
        .fetch_optional(&db.pool)
        .await?;
    Ok(row)
}

/// Distinct non-null discipline values with row counts, for the audit pass.
pub async fn discipline_counts(db: &Db) -> Result<Vec<(String, i64)>> {
    let rows = sqlx::query_as::<_, (String, i64)>(
        "SELECT discipline, COUNT(*) FROM competitions
         WHERE discipline IS NOT NULL
         GROUP BY discipline",
    )
    .fetch_all(&db.pool)
    .await?;
    Ok(rows)
}

/// Rewrite one stored discipline value to its canonical form.
pub async fn rewrite_discipline(
    db: &Db,
    raw: &str,
    canonical: &str,
    is_competition: bool,
) -> Result<u64> {
    let result = sqlx::query(
        "UPDATE competitions
         SET discipline = $2, is_competition = $3
         WHERE discipline = $1",
    )
    .bind(raw)
    .bind(canonical)
    .bind(is_competition)
    .execute(&db.pool)
    .await?;
    Ok(result.rows_affected())
}
