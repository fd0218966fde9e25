use crate::domain::market::IssuerMetadata;
use anyhow::Context;
use chrono::{DateTime, Utc};

/// Full-row upsert: the snapshot represents current state, not history, so
/// every column is replaced on refresh.
pub async fn upsert_metadata(pool: &sqlx::PgPool, meta: &IssuerMetadata) -> anyhow::Result<()> {
    sqlx::query(
        "INSERT INTO issuer_metadata (ticker, currency, exchange_name, full_exchange_name, \
             instrument_type, first_trade_date, regular_market_price, fifty_two_week_high, \
             fifty_two_week_low, regular_market_day_high, regular_market_day_low, \
             regular_market_volume, long_name, short_name, chart_previous_close, timezone, \
             exchange_timezone_name, last_updated) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18) \
         ON CONFLICT (ticker) DO UPDATE SET \
             currency = EXCLUDED.currency, \
             exchange_name = EXCLUDED.exchange_name, \
             full_exchange_name = EXCLUDED.full_exchange_name, \
             instrument_type = EXCLUDED.instrument_type, \
             first_trade_date = EXCLUDED.first_trade_date, \
             regular_market_price = EXCLUDED.regular_market_price, \
             fifty_two_week_high = EXCLUDED.fifty_two_week_high, \
             fifty_two_week_low = EXCLUDED.fifty_two_week_low, \
             regular_market_day_high = EXCLUDED.regular_market_day_high, \
             regular_market_day_low = EXCLUDED.regular_market_day_low, \
             regular_market_volume = EXCLUDED.regular_market_volume, \
             long_name = EXCLUDED.long_name, \
             short_name = EXCLUDED.short_name, \
             chart_previous_close = EXCLUDED.chart_previous_close, \
             timezone = EXCLUDED.timezone, \
             exchange_timezone_name = EXCLUDED.exchange_timezone_name, \
             last_updated = EXCLUDED.last_updated",
    )
    .bind(&meta.ticker)
    .bind(&meta.currency)
    .bind(&meta.exchange_name)
    .bind(&meta.full_exchange_name)
    .bind(&meta.instrument_type)
    .bind(meta.first_trade_date)
    .bind(meta.regular_market_price)
    .bind(meta.fifty_two_week_high)
    .bind(meta.fifty_two_week_low)
    .bind(meta.regular_market_day_high)
    .bind(meta.regular_market_day_low)
    .bind(meta.regular_market_volume)
    .bind(&meta.long_name)
    .bind(&meta.short_name)
    .bind(meta.chart_previous_close)
    .bind(&meta.timezone)
    .bind(&meta.exchange_timezone_name)
    .bind(meta.last_updated)
    .execute(pool)
    .await
    .with_context(|| format!("upsert issuer_metadata failed (ticker={})", meta.ticker))?;

    Ok(())
}

pub async fn last_updated(
    pool: &sqlx::PgPool,
    ticker: &str,
) -> anyhow::Result<Option<DateTime<Utc>>> {
    let row: Option<DateTime<Utc>> =
        sqlx::query_scalar("SELECT last_updated FROM issuer_metadata WHERE ticker = $1")
            .bind(ticker)
            .fetch_optional(pool)
            .await
            .context("select issuer_metadata.last_updated failed")?;
    Ok(row)
}
