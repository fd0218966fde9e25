use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// One daily OHLCV bar. Natural key is (ticker, trading_date); historical
/// bars are append-only, the current day's bar may be rewritten while the
/// market is open.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct PriceBar {
    pub ticker: String,
    pub trading_date: NaiveDate,
    pub open: f64,
    pub close: f64,
    pub high: f64,
    pub low: f64,
    pub volume: i64,
}

/// Point-in-time issuer snapshot, one row per ticker. Every refresh replaces
/// all columns; `last_updated` must strictly increase across refreshes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct IssuerMetadata {
    pub ticker: String,
    pub currency: Option<String>,
    pub exchange_name: Option<String>,
    pub full_exchange_name: Option<String>,
    pub instrument_type: Option<String>,
    pub first_trade_date: Option<DateTime<Utc>>,
    pub regular_market_price: Option<f64>,
    pub fifty_two_week_high: Option<f64>,
    pub fifty_two_week_low: Option<f64>,
    pub regular_market_day_high: Option<f64>,
    pub regular_market_day_low: Option<f64>,
    pub regular_market_volume: Option<i64>,
    pub long_name: Option<String>,
    pub short_name: Option<String>,
    pub chart_previous_close: Option<f64>,
    pub timezone: Option<String>,
    pub exchange_timezone_name: Option<String>,
    pub last_updated: DateTime<Utc>,
}

/// A news article keyed by the provider's uuid. Write-once: an article
/// already stored is never updated, only skipped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct NewsArticle {
    pub uuid: String,
    pub ticker: String,
    pub published_at: DateTime<Utc>,
    pub title: String,
    pub publisher: Option<String>,
    pub link: Option<String>,
    pub article_type: Option<String>,
    pub thumbnail_url: Option<String>,
    pub thumbnail_width: Option<i32>,
    pub thumbnail_height: Option<i32>,
}
