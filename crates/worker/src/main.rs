use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use stockwatch_core::config::Settings;
use stockwatch_core::ingest::provider::HttpMarketData;
use stockwatch_core::ingest::reconciler;
use stockwatch_core::storage::{self, PgStore};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod report;

#[derive(Debug, Parser)]
#[command(name = "stockwatch_worker")]
struct Args {
    /// Watchlist file, one ticker per line. Defaults to WATCHLIST_PATH,
    /// then data/watchlist.txt.
    #[arg(long)]
    watchlist: Option<PathBuf>,

    /// Ingest a single ticker instead of the whole watchlist.
    #[arg(long)]
    ticker: Option<String>,

    /// Do everything except writing to the database.
    #[arg(long)]
    dry_run: bool,
}

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

    let args = Args::parse();

    let tickers = resolve_tickers(&args, &settings)?;

    if args.dry_run {
        tracing::info!(
            dry_run = true,
            tickers_len = tickers.len(),
            "worker: batch ingestion run (dry-run)"
        );
        return Ok(());
    }

    let db_url = settings.require_database_url()?;

    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(5)
        .connect(db_url)
        .await
        .context("connect DATABASE_URL failed")?;

    storage::migrate(&pool).await?;

    let acquired = storage::lock::try_acquire_ingest_lock(&pool).await?;
    if !acquired {
        tracing::warn!("ingest lock not acquired; another run in progress");
        return Ok(());
    }

    let client = HttpMarketData::from_settings(&settings)?;
    let store = PgStore::new(pool.clone());

    let started_at = chrono::Utc::now();
    let mut batch = report::BatchReport::default();

    // Sequential, one ticker at a time. A failure never aborts the batch:
    // the run always attempts every ticker in the watchlist.
    for ticker in &tickers {
        tracing::info!(%ticker, "ingesting ticker");
        match reconciler::ingest_ticker(&client, &store, ticker).await {
            Ok(ticker_report) => {
                tracing::info!(
                    %ticker,
                    bars_written = ticker_report.bars_written,
                    metadata_updated = ticker_report.metadata_updated,
                    news_inserted = ticker_report.news_inserted,
                    errors = ticker_report.errors.len(),
                    "ticker ingested"
                );
                batch.push(ticker_report);
            }
            Err(err) => {
                sentry_anyhow::capture_anyhow(&err);
                tracing::error!(%ticker, error = %err, "ticker fetch failed; continuing");
                batch.push_fetch_failure(ticker, &err);
            }
        }
    }

    let finished_at = chrono::Utc::now();

    tracing::info!(
        total = batch.total(),
        failed = batch.failed(),
        bars_written = batch.bars_written(),
        news_inserted = batch.news_inserted(),
        status = batch.status(),
        "batch ingestion run finished"
    );

    let run_id = storage::runs::record_ingest_run(
        &pool,
        started_at,
        finished_at,
        batch.total() as i32,
        batch.failed() as i32,
        batch.status(),
        batch.error_summary().as_deref(),
    )
    .await?;
    tracing::info!(%run_id, "recorded ingest run");

    let _ = storage::lock::release_ingest_lock(&pool).await;
    Ok(())
}

fn resolve_tickers(args: &Args, settings: &Settings) -> anyhow::Result<Vec<String>> {
    if let Some(ticker) = &args.ticker {
        let ticker = ticker.trim();
        anyhow::ensure!(!ticker.is_empty(), "--ticker must be non-empty");
        return Ok(vec![ticker.to_string()]);
    }

    let path = args
        .watchlist
        .clone()
        .or_else(|| settings.watchlist_path.as_ref().map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(stockwatch_core::watchlist::DEFAULT_WATCHLIST_PATH));

    stockwatch_core::watchlist::load_watchlist(&path)
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
