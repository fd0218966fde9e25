use crate::domain::market::{IssuerMetadata, NewsArticle, PriceBar};
use crate::ingest::provider::MarketDataClient;
use crate::ingest::types::{MetadataSnapshot, ProviderNewsArticle, ProviderPriceRow};
use crate::storage::MarketStore;
use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

/// Outcome of one ticker's ingestion. Price, metadata, and news writes are
/// independent; a failure in one table is recorded here and the others are
/// still attempted.
#[derive(Debug, Clone, Serialize)]
pub struct TickerReport {
    pub ticker: String,
    pub bars_written: u64,
    pub metadata_updated: bool,
    pub news_inserted: u64,
    pub errors: Vec<String>,
}

impl TickerReport {
    fn new(ticker: &str) -> Self {
        Self {
            ticker: ticker.to_string(),
            bars_written: 0,
            metadata_updated: false,
            news_inserted: 0,
            errors: Vec::new(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.errors.is_empty()
    }

    fn record_error(&mut self, table: &str, err: &anyhow::Error) {
        tracing::error!(ticker = %self.ticker, table, error = %err, "store write failed");
        self.errors.push(format!("{table}: {err:#}"));
    }
}

/// Latest trading date already persisted for a ticker. None means the ticker
/// has no rows yet, which sorts before any real date so the first fetch
/// ingests its entire available history.
pub async fn get_high_water_mark(
    store: &dyn MarketStore,
    ticker: &str,
) -> Result<Option<NaiveDate>> {
    store
        .max_trading_date(ticker)
        .await
        .with_context(|| format!("high-water-mark lookup failed for {ticker}"))
}

/// Upserts the bars at or after the high-water-mark. The boundary date is
/// included: its bar may be an in-progress update while the market is open,
/// and the upsert is last-write-wins. Bounds write volume to O(new bars).
pub async fn reconcile_prices(
    store: &dyn MarketStore,
    ticker: &str,
    series: &[ProviderPriceRow],
    high_water_mark: Option<NaiveDate>,
) -> Result<u64> {
    let (bars, skipped) = select_price_bars(ticker, series, high_water_mark);
    if skipped > 0 {
        tracing::warn!(ticker, skipped, "skipped malformed price rows");
    }
    if bars.is_empty() {
        return Ok(0);
    }

    store.upsert_price_bars(&bars).await
}

/// Full-row snapshot upsert with last_updated set to now. An absent snapshot
/// is logged and skipped; issuer metadata may be temporarily unavailable
/// from the provider and must not abort the ticker.
pub async fn reconcile_metadata(
    store: &dyn MarketStore,
    ticker: &str,
    snapshot: Option<&MetadataSnapshot>,
) -> Result<bool> {
    let Some(snapshot) = snapshot else {
        tracing::warn!(ticker, "no metadata snapshot available; skipping");
        return Ok(false);
    };

    let meta = metadata_from_snapshot(ticker, snapshot, Utc::now());
    store.upsert_metadata(&meta).await?;
    Ok(true)
}

/// Keeps only articles the provider relates to this ticker, then inserts
/// them with conflict-on-uuid as a no-op. Stored articles are never updated.
pub async fn reconcile_news(
    store: &dyn MarketStore,
    ticker: &str,
    articles: &[ProviderNewsArticle],
) -> Result<u64> {
    let (articles, skipped) = select_news_articles(ticker, articles);
    if skipped > 0 {
        tracing::warn!(ticker, skipped, "skipped malformed news articles");
    }
    if articles.is_empty() {
        return Ok(0);
    }

    store.insert_news_if_absent(&articles).await
}

/// Fetch one ticker and merge all three payloads into the store. A fetch
/// failure is the ticker's failure; store failures are isolated per table.
pub async fn ingest_ticker(
    client: &dyn MarketDataClient,
    store: &dyn MarketStore,
    ticker: &str,
) -> Result<TickerReport> {
    let payload = client
        .fetch_ticker(ticker)
        .await
        .with_context(|| format!("provider fetch failed for {ticker}"))?;

    let mut report = TickerReport::new(ticker);

    match get_high_water_mark(store, ticker).await {
        Ok(high_water_mark) => {
            match reconcile_prices(store, ticker, &payload.series, high_water_mark).await {
                Ok(written) => report.bars_written = written,
                Err(err) => report.record_error("price_bars", &err),
            }
        }
        Err(err) => report.record_error("price_bars", &err),
    }

    match reconcile_metadata(store, ticker, payload.metadata.as_ref()).await {
        Ok(updated) => report.metadata_updated = updated,
        Err(err) => report.record_error("issuer_metadata", &err),
    }

    match reconcile_news(store, ticker, &payload.news).await {
        Ok(inserted) => report.news_inserted = inserted,
        Err(err) => report.record_error("news_articles", &err),
    }

    Ok(report)
}

fn select_price_bars(
    ticker: &str,
    series: &[ProviderPriceRow],
    high_water_mark: Option<NaiveDate>,
) -> (Vec<PriceBar>, usize) {
    let mut bars = Vec::new();
    let mut skipped = 0usize;

    for row in series {
        if let Some(mark) = high_water_mark {
            if row.date < mark {
                continue;
            }
        }

        match bar_from_row(ticker, row) {
            Some(bar) => bars.push(bar),
            None => skipped += 1,
        }
    }

    (bars, skipped)
}

fn bar_from_row(ticker: &str, row: &ProviderPriceRow) -> Option<PriceBar> {
    Some(PriceBar {
        ticker: ticker.to_string(),
        trading_date: row.date,
        open: row.open?,
        close: row.close?,
        high: row.high?,
        low: row.low?,
        volume: row.volume?,
    })
}

fn metadata_from_snapshot(
    ticker: &str,
    snapshot: &MetadataSnapshot,
    now: DateTime<Utc>,
) -> IssuerMetadata {
    IssuerMetadata {
        ticker: ticker.to_string(),
        currency: snapshot.currency.clone(),
        exchange_name: snapshot.exchange_name.clone(),
        full_exchange_name: snapshot.full_exchange_name.clone(),
        instrument_type: snapshot.instrument_type.clone(),
        first_trade_date: snapshot
            .first_trade_date
            .and_then(|secs| DateTime::from_timestamp(secs, 0)),
        regular_market_price: snapshot.regular_market_price,
        fifty_two_week_high: snapshot.fifty_two_week_high,
        fifty_two_week_low: snapshot.fifty_two_week_low,
        regular_market_day_high: snapshot.regular_market_day_high,
        regular_market_day_low: snapshot.regular_market_day_low,
        regular_market_volume: snapshot.regular_market_volume,
        long_name: snapshot.long_name.clone(),
        short_name: snapshot.short_name.clone(),
        chart_previous_close: snapshot.chart_previous_close,
        timezone: snapshot.timezone.clone(),
        exchange_timezone_name: snapshot.exchange_timezone_name.clone(),
        last_updated: now,
    }
}

fn select_news_articles(
    ticker: &str,
    articles: &[ProviderNewsArticle],
) -> (Vec<NewsArticle>, usize) {
    let mut out = Vec::new();
    let mut skipped = 0usize;

    for article in articles {
        // The provider returns articles relevant to a basket of tickers.
        if !article.related_tickers.iter().any(|t| t == ticker) {
            continue;
        }

        match article_from_provider(ticker, article) {
            Some(a) => out.push(a),
            None => skipped += 1,
        }
    }

    (out, skipped)
}

fn article_from_provider(ticker: &str, article: &ProviderNewsArticle) -> Option<NewsArticle> {
    let uuid = article.uuid.as_deref()?.trim();
    if uuid.is_empty() {
        return None;
    }
    let title = article.title.as_deref()?.trim();
    if title.is_empty() {
        return None;
    }
    let published_at = DateTime::from_timestamp(article.provider_publish_time?, 0)?;

    let first_resolution = article
        .thumbnail
        .as_ref()
        .and_then(|t| t.resolutions.first());

    Some(NewsArticle {
        uuid: uuid.to_string(),
        ticker: ticker.to_string(),
        published_at,
        title: title.to_string(),
        publisher: article.publisher.clone(),
        link: article.link.clone(),
        article_type: article.article_type.clone(),
        thumbnail_url: first_resolution.and_then(|r| r.url.clone()),
        thumbnail_width: first_resolution.and_then(|r| r.width),
        thumbnail_height: first_resolution.and_then(|r| r.height),
    })
}
