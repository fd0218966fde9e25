use anyhow::Context;
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Audit row for one batch run; written after the run regardless of outcome.
pub async fn record_ingest_run(
    pool: &sqlx::PgPool,
    started_at: DateTime<Utc>,
    finished_at: DateTime<Utc>,
    tickers_total: i32,
    tickers_failed: i32,
    status: &str,
    error: Option<&str>,
) -> anyhow::Result<Uuid> {
    let id = Uuid::new_v4();

    sqlx::query(
        "INSERT INTO ingest_runs (id, started_at, finished_at, tickers_total, tickers_failed, status, error) \
         VALUES ($1, $2, $3, $4, $5, $6, $7)",
    )
    .persistent(false)
    .bind(id)
    .bind(started_at)
    .bind(finished_at)
    .bind(tickers_total)
    .bind(tickers_failed)
    .bind(status)
    .bind(error)
    .execute(pool)
    .await
    .context("insert ingest_runs failed")?;

    Ok(id)
}
