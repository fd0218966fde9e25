use crate::domain::market::PriceBar;
use anyhow::Context;
use chrono::NaiveDate;

/// Latest trading date already stored for a ticker, or None for a ticker
/// with no rows yet (its first run ingests full history).
pub async fn max_trading_date(
    pool: &sqlx::PgPool,
    ticker: &str,
) -> anyhow::Result<Option<NaiveDate>> {
    let max: Option<NaiveDate> =
        sqlx::query_scalar("SELECT MAX(trading_date) FROM price_bars WHERE ticker = $1")
            .bind(ticker)
            .fetch_one(pool)
            .await
            .context("select max trading_date failed")?;
    Ok(max)
}

/// Row-level upserts keyed on (ticker, trading_date); the conflicting row is
/// overwritten (the boundary day's bar may be an in-progress update).
/// Deliberately not wrapped in a transaction.
pub async fn upsert_price_bars(pool: &sqlx::PgPool, bars: &[PriceBar]) -> anyhow::Result<u64> {
    let mut written: u64 = 0;

    for bar in bars {
        let res = sqlx::query(
            "INSERT INTO price_bars (ticker, trading_date, open, close, high, low, volume) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             ON CONFLICT (ticker, trading_date) DO UPDATE SET \
                 open = EXCLUDED.open, \
                 close = EXCLUDED.close, \
                 high = EXCLUDED.high, \
                 low = EXCLUDED.low, \
                 volume = EXCLUDED.volume",
        )
        .bind(&bar.ticker)
        .bind(bar.trading_date)
        .bind(bar.open)
        .bind(bar.close)
        .bind(bar.high)
        .bind(bar.low)
        .bind(bar.volume)
        .execute(pool)
        .await
        .with_context(|| {
            format!(
                "upsert price_bars failed (ticker={}, trading_date={})",
                bar.ticker, bar.trading_date
            )
        })?;

        written += res.rows_affected();
    }

    Ok(written)
}
