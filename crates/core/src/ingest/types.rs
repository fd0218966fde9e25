use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Everything the provider returns for one ticker in one fetch.
#[derive(Debug, Clone)]
pub struct TickerPayload {
    pub series: Vec<ProviderPriceRow>,
    pub metadata: Option<MetadataSnapshot>,
    pub news: Vec<ProviderNewsArticle>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryResponse {
    pub ticker: String,
    pub rows: Vec<ProviderPriceRow>,
}

/// One raw daily row as fetched. OHLCV fields are optional on the wire; rows
/// missing any of them are skipped individually during reconciliation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderPriceRow {
    pub date: NaiveDate,
    pub open: Option<f64>,
    pub close: Option<f64>,
    pub high: Option<f64>,
    pub low: Option<f64>,
    pub volume: Option<i64>,
}

/// Provider metadata snapshot, camelCase on the wire. Everything is optional;
/// a missing `firstTradeDate` maps to null rather than an error.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MetadataSnapshot {
    pub currency: Option<String>,
    pub exchange_name: Option<String>,
    pub full_exchange_name: Option<String>,
    pub instrument_type: Option<String>,
    /// Epoch seconds.
    pub first_trade_date: Option<i64>,
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
}

impl MetadataSnapshot {
    /// The provider occasionally answers with an all-null shell instead of a
    /// 404. Treat that the same as an absent snapshot.
    pub fn is_empty(&self) -> bool {
        self.currency.is_none()
            && self.exchange_name.is_none()
            && self.regular_market_price.is_none()
            && self.long_name.is_none()
            && self.short_name.is_none()
    }
}

/// A news article as returned by the provider. Articles are relevant to a
/// basket of tickers, not exactly one; `related_tickers` drives filtering.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProviderNewsArticle {
    pub uuid: Option<String>,
    pub title: Option<String>,
    pub publisher: Option<String>,
    pub link: Option<String>,
    /// Epoch seconds.
    pub provider_publish_time: Option<i64>,
    #[serde(rename = "type")]
    pub article_type: Option<String>,
    pub related_tickers: Vec<String>,
    pub thumbnail: Option<Thumbnail>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Thumbnail {
    pub resolutions: Vec<ThumbnailResolution>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThumbnailResolution {
    pub url: Option<String>,
    pub width: Option<i32>,
    pub height: Option<i32>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_metadata_snapshot_with_partial_fields() {
        let v = json!({
            "currency": "CAD",
            "exchangeName": "TOR",
            "fullExchangeName": "Toronto",
            "instrumentType": "ETF",
            "firstTradeDate": 1566221400,
            "regularMarketPrice": 33.41,
            "longName": "iShares Core Equity ETF Portfolio"
        });

        let parsed: MetadataSnapshot = serde_json::from_value(v).unwrap();
        assert_eq!(parsed.currency.as_deref(), Some("CAD"));
        assert_eq!(parsed.first_trade_date, Some(1566221400));
        assert_eq!(parsed.fifty_two_week_high, None);
        assert!(!parsed.is_empty());
    }

    #[test]
    fn all_null_snapshot_counts_as_empty() {
        let parsed: MetadataSnapshot = serde_json::from_value(json!({})).unwrap();
        assert!(parsed.is_empty());
    }

    #[test]
    fn parses_news_article_with_thumbnail_and_related_tickers() {
        let v = json!({
            "uuid": "ed58a9e8-1c79-4c43-b2a9-d23ecc8a0e7b",
            "title": "Markets close higher",
            "publisher": "Reuters",
            "link": "https://example.com/a",
            "providerPublishTime": 1712345678,
            "type": "STORY",
            "relatedTickers": ["ABC", "XYZ"],
            "thumbnail": {
                "resolutions": [
                    {"url": "https://img.example.com/a.jpg", "width": 140, "height": 140},
                    {"url": "https://img.example.com/a-big.jpg", "width": 720, "height": 480}
                ]
            }
        });

        let parsed: ProviderNewsArticle = serde_json::from_value(v).unwrap();
        assert_eq!(parsed.related_tickers, vec!["ABC", "XYZ"]);
        let thumb = parsed.thumbnail.unwrap();
        assert_eq!(thumb.resolutions.len(), 2);
        assert_eq!(thumb.resolutions[0].width, Some(140));
    }

    #[test]
    fn news_article_without_optional_fields_still_parses() {
        let v = json!({"uuid": "u-1", "title": "bare"});
        let parsed: ProviderNewsArticle = serde_json::from_value(v).unwrap();
        assert!(parsed.related_tickers.is_empty());
        assert!(parsed.thumbnail.is_none());
        assert_eq!(parsed.provider_publish_time, None);
    }

    #[test]
    fn parses_history_rows_with_missing_volume() {
        let v = json!({
            "ticker": "ABC",
            "rows": [
                {"date": "2024-01-02", "open": 1.0, "close": 2.0, "high": 2.5, "low": 0.5, "volume": 1000},
                {"date": "2024-01-03", "open": 2.0, "close": 2.1, "high": 2.2, "low": 1.9}
            ]
        });

        let parsed: HistoryResponse = serde_json::from_value(v).unwrap();
        assert_eq!(parsed.rows.len(), 2);
        assert_eq!(parsed.rows[1].volume, None);
    }
}
