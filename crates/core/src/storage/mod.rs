use crate::domain::market::{IssuerMetadata, NewsArticle, PriceBar};
use anyhow::Context;
use chrono::{DateTime, NaiveDate, Utc};

pub mod lock;
pub mod metadata;
pub mod news;
pub mod price_bars;
pub mod runs;

pub async fn migrate(pool: &sqlx::PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .context("sqlx migrations failed")?;
    Ok(())
}

/// Store contract consumed by the reconciler. Every write is atomic per row,
/// not per batch: a crash mid-series leaves a valid, restartable state and
/// the high-water-mark recomputes from whatever rows did land.
#[async_trait::async_trait]
pub trait MarketStore: Send + Sync {
    async fn max_trading_date(&self, ticker: &str) -> anyhow::Result<Option<NaiveDate>>;

    async fn upsert_price_bars(&self, bars: &[PriceBar]) -> anyhow::Result<u64>;

    async fn upsert_metadata(&self, meta: &IssuerMetadata) -> anyhow::Result<()>;

    async fn insert_news_if_absent(&self, articles: &[NewsArticle]) -> anyhow::Result<u64>;

    async fn metadata_last_updated(&self, ticker: &str)
        -> anyhow::Result<Option<DateTime<Utc>>>;
}

#[derive(Debug, Clone)]
pub struct PgStore {
    pool: sqlx::PgPool,
}

impl PgStore {
    pub fn new(pool: sqlx::PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &sqlx::PgPool {
        &self.pool
    }
}

#[async_trait::async_trait]
impl MarketStore for PgStore {
    async fn max_trading_date(&self, ticker: &str) -> anyhow::Result<Option<NaiveDate>> {
        price_bars::max_trading_date(&self.pool, ticker).await
    }

    async fn upsert_price_bars(&self, bars: &[PriceBar]) -> anyhow::Result<u64> {
        price_bars::upsert_price_bars(&self.pool, bars).await
    }

    async fn upsert_metadata(&self, meta: &IssuerMetadata) -> anyhow::Result<()> {
        metadata::upsert_metadata(&self.pool, meta).await
    }

    async fn insert_news_if_absent(&self, articles: &[NewsArticle]) -> anyhow::Result<u64> {
        news::insert_news_if_absent(&self.pool, articles).await
    }

    async fn metadata_last_updated(
        &self,
        ticker: &str,
    ) -> anyhow::Result<Option<DateTime<Utc>>> {
        metadata::last_updated(&self.pool, ticker).await
    }
}
