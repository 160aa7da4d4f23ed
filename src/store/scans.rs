use anyhow::Result;
use tracing::{info, instrument};

use crate::model::{Scan, ScanStatus};
use crate::store::Db;

pub async fn create_scan(db: &Db, source_id: i64) -> Result<i64> {
    let id = sqlx::query_scalar::<_, i64>(
        "INSERT INTO scans (source_id, status) VALUES ($1, $2) RETURNING id",
    )
    .bind(source_id)
    .bind(ScanStatus::Pending.as_str())
    .fetch_one(&db.pool)
    .await?;
    Ok(id)
}

pub async fn mark_running(db: &Db, scan_id: i64) -> Result<()> {
    sqlx::query("UPDATE scans SET status = $2, started_at = now() WHERE id = $1")
        .bind(scan_id)
        .bind(ScanStatus::Running.as_str())
        .execute(&db.pool)
        .await?;
    Ok(())
}

/// Per-scan counters accumulated by the orchestrator's event loop.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScanCounts {
    pub events_found: i32,
    pub events_upserted: i32,
    pub competition_count: i32,
    pub training_count: i32,
    pub skipped: i32,
}

pub async fn complete_scan(db: &Db, scan_id: i64, counts: &ScanCounts) -> Result<()> {
    sqlx::query(
        "UPDATE scans SET status = $2, finished_at = now(),
             events_found = $3, events_upserted = $4,
             competition_count = $5, training_count = $6
         WHERE id = $1",
    )
    .bind(scan_id)
    .bind(ScanStatus::Completed.as_str())
    .bind(counts.events_found)
    .bind(counts.events_upserted)
    .bind(counts.competition_count)
    .bind(counts.training_count)
    .execute(&db.pool)
    .await?;
    Ok(())
}

pub async fn fail_scan(db: &Db, scan_id: i64, error: &str, counts: &ScanCounts) -> Result<()> {
    sqlx::query(
        "UPDATE scans SET status = $2, finished_at = now(), error = $3,
             events_found = $4, events_upserted = $5,
             competition_count = $6, training_count = $7
         WHERE id = $1",
    )
    .bind(scan_id)
    .bind(ScanStatus::Failed.as_str())
    .bind(error)
    .bind(counts.events_found)
    .bind(counts.events_upserted)
    .bind(counts.competition_count)
    .bind(counts.training_count)
    .execute(&db.pool)
    .await?;
    Ok(())
}

/// Recent scan history, newest first, optionally for one source.
pub async fn list_scans(db: &Db, source_id: Option<i64>, limit: i64) -> Result<Vec<Scan>> {
    let scans = match source_id {
        Some(source_id) => {
            sqlx::query_as::<_, Scan>(
                "SELECT * FROM scans WHERE source_id = $1 ORDER BY id DESC LIMIT $2",
            )
            .bind(source_id)
            .bind(limit)
            .fetch_all(&db.pool)
            .await?
        }
        None => {
            sqlx::query_as::<_, Scan>("SELECT * FROM scans ORDER BY id DESC LIMIT $1")
                .bind(limit)
                .fetch_all(&db.pool)
                .await?
        }
    };
    Ok(scans)
}

/// The most recent completed scan of a source, excluding one scan id; used
/// for the shrinking-source warning.
pub async fn previous_completed_scan(
    db: &Db,
    source_id: i64,
    excluding: i64,
) -> Result<Option<Scan>> {
    let scan = sqlx::query_as::<_, Scan>(
        "SELECT * FROM scans
         WHERE source_id = $1 AND status = 'completed' AND id <> $2
         ORDER BY id DESC LIMIT 1",
    )
    .bind(source_id)
    .bind(excluding)
    .fetch_optional(&db.pool)
    .await?;
    Ok(scan)
}

/// Mark scans stranded `pending`/`running` by a previous process as failed.
/// Runs once at startup.
#[instrument(skip(db))]
pub async fn fail_stale_scans(db: &Db) -> Result<u64> {
    let result = sqlx::query(
        "UPDATE scans SET status = 'failed', finished_at = now(),
             error = 'interrupted by restart'
         WHERE status IN ('pending', 'running')",
    )
    .execute(&db.pool)
    .await?;
    if result.rows_affected() > 0 {
        info!(count = result.rows_affected(), "cleaned up stale scans");
    }
    Ok(result.rows_affected())
}
