use anyhow::Context;

// Advisory locks are scoped to the Postgres session. This is used as a
// best-effort single-writer guard against overlapping batch ingestion runs.
const INGEST_LOCK_KEY: i64 = 0x5357_4154_4348; // "SWATCH" as hex-ish namespace.

pub async fn try_acquire_ingest_lock(pool: &sqlx::PgPool) -> anyhow::Result<bool> {
    let acquired: (bool,) = sqlx::query_as("SELECT pg_try_advisory_lock($1)")
        .persistent(false)
        .bind(INGEST_LOCK_KEY)
        .fetch_one(pool)
        .await
        .with_context(|| format!("failed to acquire advisory lock (key={INGEST_LOCK_KEY})"))?;
    Ok(acquired.0)
}

pub async fn release_ingest_lock(pool: &sqlx::PgPool) -> anyhow::Result<()> {
    sqlx::query("SELECT pg_advisory_unlock($1)")
        .persistent(false)
        .bind(INGEST_LOCK_KEY)
        .execute(pool)
        .await
        .with_context(|| format!("failed to release advisory lock (key={INGEST_LOCK_KEY})"))?;
    Ok(())
}
