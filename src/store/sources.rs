use anyhow::Result;
use tracing::{info, instrument};

use crate::model::Source;
use crate::seeds::SOURCE_DEFINITIONS;
use crate::store::Db;

/// Ensure every compiled-in source definition exists. Insert-by-key only;
/// rows that already exist are left untouched. Idempotent.
#[instrument(skip(db))]
pub async fn seed_sources(db: &Db) -> Result<()> {
    let mut inserted = 0u64;
    for def in SOURCE_DEFINITIONS {
        let result = sqlx::query(
            "INSERT INTO sources (key, display_name, url, enabled)
             VALUES ($1, $2, $3, $4)
             ON CONFLICT (key) DO NOTHING",
        )
        .bind(def.key)
        .bind(def.display_name)
        .bind(def.url)
        .bind(def.enabled)
        .execute(&db.pool)
        .await?;
        inserted += result.rows_affected();
    }
    info!(
        total = SOURCE_DEFINITIONS.len(),
        inserted, "source definitions seeded"
    );
    Ok(())
}

pub async fn get_source(db: &Db, id: i64) -> Result<Option<Source>> {
    let source = sqlx::query_as::<_, Source>("SELECT * FROM sources WHERE id = $1")
        .bind(id)
        .fetch_optional(&db.pool)
        .await?;
    Ok(source)
}

pub async fn get_enabled_source(db: &Db, id: i64) -> Result<Option<Source>> {
    let source =
        sqlx::query_as::<_, Source>("SELECT * FROM sources WHERE id = $1 AND enabled = TRUE")
            .bind(id)
            .fetch_optional(&db.pool)
            .await?;
    Ok(source)
}

pub async fn list_sources(db: &Db) -> Result<Vec<Source>> {
    let sources = sqlx::query_as::<_, Source>("SELECT * FROM sources ORDER BY id")
        .fetch_all(&db.pool)
        .await?;
    Ok(sources)
}

pub async fn enabled_sources(db: &Db) -> Result<Vec<Source>> {
    let sources =
        sqlx::query_as::<_, Source>("SELECT * FROM sources WHERE enabled = TRUE ORDER BY id")
            .fetch_all(&db.pool)
            .await?;
    Ok(sources)
}

/// Stamp a source as scanned now; called when a scan reaches a terminal
/// completed state.
pub async fn mark_scanned(db: &Db, id: i64) -> Result<()> {
    sqlx::query("UPDATE sources SET last_scanned_at = now() WHERE id = $1")
        .bind(id)
        .execute(&db.pool)
        .await?;
    Ok(())
}
