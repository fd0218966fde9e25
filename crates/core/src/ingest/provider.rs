use crate::config::Settings;
use crate::ingest::types::{
    HistoryResponse, MetadataSnapshot, ProviderNewsArticle, TickerPayload,
};
use anyhow::{Context, Result};
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::StatusCode;
use serde_json::Value;
use std::time::Duration;

const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_RETRIES: u32 = 3;

#[async_trait::async_trait]
pub trait MarketDataClient: Send + Sync {
    fn provider_name(&self) -> &'static str;

    /// Fetch the full payload for one ticker: daily history, the metadata
    /// snapshot (None when the provider has nothing for it right now), and
    /// the related news batch.
    async fn fetch_ticker(&self, ticker: &str) -> Result<TickerPayload>;
}

#[derive(Debug, Clone)]
pub struct HttpMarketData {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    retries: u32,
}

impl HttpMarketData {
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let base_url = settings.require_market_data_base_url()?.to_string();
        let api_key = settings.market_data_api_key.clone();

        let timeout_secs = std::env::var("MARKET_DATA_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(DEFAULT_TIMEOUT_SECS);

        let retries = std::env::var("MARKET_DATA_RETRIES")
            .ok()
            .and_then(|s| s.parse::<u32>().ok())
            .unwrap_or(DEFAULT_RETRIES);

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .context("failed to build market data http client")?;

        Ok(Self {
            http,
            base_url,
            api_key,
            retries,
        })
    }

    fn url(&self, path: &str, ticker: &str) -> String {
        format!(
            "{}/{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_matches('/'),
            ticker
        )
    }

    fn headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        if let Some(api_key) = &self.api_key {
            headers.insert("x-api-key", HeaderValue::from_str(api_key)?);
        }
        Ok(headers)
    }

    /// One GET with the retry/backoff loop. Returns None on 404 so callers
    /// can distinguish "provider has no data" from a transport failure.
    async fn get_json(&self, path: &str, ticker: &str) -> Result<Option<Value>> {
        let url = self.url(path, ticker);

        let mut attempt: u32 = 0;
        loop {
            attempt += 1;
            let res = self.get_json_once(&url).await;
            match res {
                Ok(v) => return Ok(v),
                Err(err) => {
                    if attempt >= self.retries {
                        return Err(err);
                    }
                    let backoff = Duration::from_secs(1 << (attempt - 1));
                    tracing::warn!(%url, attempt, ?backoff, error = %err, "market data fetch failed; retrying");
                    tokio::time::sleep(backoff).await;
                }
            }
        }
    }

    async fn get_json_once(&self, url: &str) -> Result<Option<Value>> {
        let headers = self.headers()?;

        let res = self
            .http
            .get(url)
            .headers(headers)
            .send()
            .await
            .context("market data request failed")?;

        let status = res.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let text = res
            .text()
            .await
            .context("failed to read provider response")?;
        let raw_json = serde_json::from_str::<Value>(&text)
            .with_context(|| format!("provider response is not valid JSON: {text}"))?;

        if !status.is_success() {
            anyhow::bail!("market data HTTP {status}: {raw_json}");
        }

        Ok(Some(raw_json))
    }
}

#[async_trait::async_trait]
impl MarketDataClient for HttpMarketData {
    fn provider_name(&self) -> &'static str {
        "external_http_json"
    }

    async fn fetch_ticker(&self, ticker: &str) -> Result<TickerPayload> {
        let series = match self.get_json("v1/history", ticker).await? {
            Some(raw) => {
                let parsed = serde_json::from_value::<HistoryResponse>(raw)
                    .context("failed to parse provider history response")?;
                anyhow::ensure!(
                    parsed.ticker == ticker,
                    "provider ticker mismatch: expected {ticker}, got {}",
                    parsed.ticker
                );
                parsed.rows
            }
            None => Vec::new(),
        };

        // Metadata may be temporarily unavailable; that is not a fetch error.
        let metadata = match self.get_json("v1/metadata", ticker).await? {
            Some(raw) => serde_json::from_value::<MetadataSnapshot>(raw)
                .context("failed to parse provider metadata response")
                .map(Some)?,
            None => None,
        };
        let metadata = metadata.filter(|m| !m.is_empty());

        let news = match self.get_json("v1/news", ticker).await? {
            Some(raw) => serde_json::from_value::<Vec<ProviderNewsArticle>>(raw)
                .context("failed to parse provider news response")?,
            None => Vec::new(),
        };

        Ok(TickerPayload {
            series,
            metadata,
            news,
        })
    }
}
