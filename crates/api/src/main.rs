use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use sqlx::PgPool;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use stockwatch_core::config::Settings;
use stockwatch_core::domain::market::{IssuerMetadata, NewsArticle, PriceBar};
use stockwatch_core::ingest::provider::HttpMarketData;
use stockwatch_core::ingest::reconciler;
use stockwatch_core::refresh;
use stockwatch_core::storage::{self, PgStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer())
        .init();

    let pool: Option<PgPool> = match settings.require_database_url() {
        Ok(db_url) => match sqlx::postgres::PgPoolOptions::new()
            .max_connections(5)
            .connect(db_url)
            .await
        {
            Ok(pool) => match storage::migrate(&pool).await {
                Ok(()) => Some(pool),
                Err(e) => {
                    sentry_anyhow::capture_anyhow(&e);
                    tracing::error!(error = %e, "db migrations failed; starting API in degraded mode");
                    None
                }
            },
            Err(e) => {
                let err = anyhow::Error::new(e);
                sentry_anyhow::capture_anyhow(&err);
                tracing::error!(error = %err, "db connect failed; starting API in degraded mode");
                None
            }
        },
        Err(e) => {
            sentry_anyhow::capture_anyhow(&e);
            tracing::error!(error = %e, "DATABASE_URL missing; starting API in degraded mode");
            None
        }
    };

    // The provider client is only needed by the manual refresh path; the
    // read endpoints keep working without it.
    let client = match HttpMarketData::from_settings(&settings) {
        Ok(client) => Some(client),
        Err(e) => {
            tracing::warn!(error = %e, "market data client unavailable; refresh endpoint disabled");
            None
        }
    };

    let state = AppState { pool, client };

    let app = Router::new()
        .route("/healthz", get(healthz))
        .route("/tickers", get(list_tickers))
        .route("/prices/:ticker", get(get_prices))
        .route("/metadata/:ticker", get(get_metadata))
        .route("/news/:ticker", get(get_news))
        .route("/refresh/:ticker", post(refresh_ticker))
        .with_state(state)
        .layer(TraceLayer::new_for_http());

    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(3000);
    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));

    tracing::info!(%addr, "api listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn healthz() -> &'static str {
    "ok"
}

#[derive(Clone)]
struct AppState {
    pool: Option<PgPool>,
    client: Option<HttpMarketData>,
}

async fn list_tickers(State(state): State<AppState>) -> Result<Json<Vec<String>>, StatusCode> {
    let Some(pool) = &state.pool else {
        return Err(StatusCode::SERVICE_UNAVAILABLE);
    };

    let tickers: Vec<String> =
        sqlx::query_scalar("SELECT ticker FROM issuer_metadata ORDER BY ticker")
            .fetch_all(pool)
            .await
            .map_err(internal_error)?;

    Ok(Json(tickers))
}

#[derive(Debug, Deserialize)]
struct PricesQuery {
    limit: Option<i64>,
}

async fn get_prices(
    State(state): State<AppState>,
    Path(ticker): Path<String>,
    Query(query): Query<PricesQuery>,
) -> Result<Json<Vec<PriceBar>>, StatusCode> {
    let Some(pool) = &state.pool else {
        return Err(StatusCode::SERVICE_UNAVAILABLE);
    };

    let limit = query.limit.unwrap_or(i64::MAX).max(0);

    let bars = sqlx::query_as::<_, PriceBar>(
        "SELECT ticker, trading_date, open, close, high, low, volume \
         FROM price_bars \
         WHERE ticker = $1 \
         ORDER BY trading_date DESC \
         LIMIT $2",
    )
    .bind(&ticker)
    .bind(limit)
    .fetch_all(pool)
    .await
    .map_err(internal_error)?;

    if bars.is_empty() {
        return Err(StatusCode::NOT_FOUND);
    }

    Ok(Json(bars))
}

async fn get_metadata(
    State(state): State<AppState>,
    Path(ticker): Path<String>,
) -> Result<Json<IssuerMetadata>, StatusCode> {
    let Some(pool) = &state.pool else {
        return Err(StatusCode::SERVICE_UNAVAILABLE);
    };

    let meta = sqlx::query_as::<_, IssuerMetadata>(
        "SELECT ticker, currency, exchange_name, full_exchange_name, instrument_type, \
             first_trade_date, regular_market_price, fifty_two_week_high, fifty_two_week_low, \
             regular_market_day_high, regular_market_day_low, regular_market_volume, \
             long_name, short_name, chart_previous_close, timezone, exchange_timezone_name, \
             last_updated \
         FROM issuer_metadata \
         WHERE ticker = $1",
    )
    .bind(&ticker)
    .fetch_optional(pool)
    .await
    .map_err(internal_error)?
    .ok_or(StatusCode::NOT_FOUND)?;

    Ok(Json(meta))
}

async fn get_news(
    State(state): State<AppState>,
    Path(ticker): Path<String>,
) -> Result<Json<Vec<NewsArticle>>, StatusCode> {
    let Some(pool) = &state.pool else {
        return Err(StatusCode::SERVICE_UNAVAILABLE);
    };

    let articles = sqlx::query_as::<_, NewsArticle>(
        "SELECT uuid, ticker, published_at, title, publisher, link, article_type, \
             thumbnail_url, thumbnail_width, thumbnail_height \
         FROM news_articles \
         WHERE ticker = $1 \
         ORDER BY published_at DESC",
    )
    .bind(&ticker)
    .fetch_all(pool)
    .await
    .map_err(internal_error)?;

    Ok(Json(articles))
}

/// User-triggered refresh for one ticker, governed by the cooldown gate.
/// Denial is a normal outcome (429), not an error; the scheduled batch run
/// is not gated.
async fn refresh_ticker(State(state): State<AppState>, Path(ticker): Path<String>) -> Response {
    let Some(pool) = &state.pool else {
        return StatusCode::SERVICE_UNAVAILABLE.into_response();
    };
    let Some(client) = &state.client else {
        return StatusCode::SERVICE_UNAVAILABLE.into_response();
    };

    let last_updated = match storage::metadata::last_updated(pool, &ticker).await {
        Ok(v) => v,
        Err(e) => {
            sentry_anyhow::capture_anyhow(&e);
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    let cooldown = refresh::cooldown_from_env();
    let now = chrono::Utc::now();
    if !refresh::can_refresh(last_updated, now, cooldown) {
        return (
            StatusCode::TOO_MANY_REQUESTS,
            Json(json!({
                "refreshed": false,
                "message": format!(
                    "data can only be refreshed once every {} minutes",
                    cooldown.num_minutes()
                ),
            })),
        )
            .into_response();
    }

    let store = PgStore::new(pool.clone());
    match reconciler::ingest_ticker(client, &store, &ticker).await {
        Ok(report) => (StatusCode::OK, Json(report)).into_response(),
        Err(e) => {
            sentry_anyhow::capture_anyhow(&e);
            tracing::error!(%ticker, error = %e, "manual refresh failed");
            StatusCode::BAD_GATEWAY.into_response()
        }
    }
}

fn internal_error(e: sqlx::Error) -> StatusCode {
    let err = anyhow::Error::new(e);
    sentry_anyhow::capture_anyhow(&err);
    StatusCode::INTERNAL_SERVER_ERROR
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}

fn init_sentry(settings: &Settings) -> Option<sentry::ClientInitGuard> {
    let dsn = settings.sentry_dsn.as_deref()?;
    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    )))
}
