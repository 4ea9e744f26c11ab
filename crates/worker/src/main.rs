use anyhow::Context;
use clap::{Parser, Subcommand};
use fintrend_core::config::Settings;
use fintrend_core::llm::error::raw_output_of;
use fintrend_core::pipeline::breakouts::{breakout_posts, trending_tickers};
use fintrend_core::pipeline::{Pipeline, PipelineOptions, Providers};
use fintrend_core::storage::lock::{DailyJob, JobLock};
use fintrend_core::storage::memory::MemoryStore;
use fintrend_core::storage::postgres::PgStore;
use fintrend_core::time::us_market::resolve_as_of_date;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "fintrend_worker")]
struct Args {
    /// As-of date (YYYY-MM-DD). Defaults to today's US/Eastern date.
    #[arg(long, global = true)]
    as_of_date: Option<String>,

    /// Use an in-memory store instead of the database.
    #[arg(long, global = true)]
    dry_run: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the daily breakout job.
    Breakouts,
    /// Analyze the given tickers.
    Analyze {
        #[arg(required = true)]
        tickers: Vec<String>,
    },
    /// Analyze every watchlist ticker.
    Watchlist,
    /// Print validated trending tickers (no writes).
    Trending,
    /// Print breakout chatter from hot and new listings (no writes).
    BreakoutPosts,
}

impl Command {
    fn daily_job(&self) -> Option<DailyJob> {
        match self {
            Self::Breakouts => Some(DailyJob::Breakouts),
            Self::Analyze { .. } | Self::Watchlist => Some(DailyJob::Analysis),
            Self::Trending | Self::BreakoutPosts => None,
        }
    }
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
    let as_of_date = resolve_as_of_date(args.as_of_date.as_deref(), chrono::Utc::now())?;

    let providers = Providers::from_settings(&settings)?;
    let options = PipelineOptions::from_settings(&settings);

    let Some(job) = args.command.daily_job() else {
        return match args.command {
            Command::Trending => print_json(&trending_tickers(&providers, &options).await),
            _ => print_json(&breakout_posts(&providers, &options).await),
        };
    };

    let llm = fintrend_core::llm::client_from_settings(&settings)?;

    if args.dry_run {
        tracing::info!(%as_of_date, dry_run = true, "using in-memory store");
        let pipeline = Pipeline::new(providers, llm, Arc::new(MemoryStore::new()), options);
        let result = run_job(&pipeline, &args.command, as_of_date).await;
        return report(result);
    }

    let db_url = settings.require_database_url()?;
    let store = PgStore::connect(db_url, 5)
        .await
        .context("connect DATABASE_URL failed")?;

    fintrend_core::storage::migrate(store.pool()).await?;

    let Some(lock) = JobLock::try_acquire(store.pool(), job, as_of_date).await? else {
        tracing::warn!(%as_of_date, ?job, "job lock not acquired; another run in progress");
        return Ok(());
    };

    let pipeline = Pipeline::new(providers, llm, Arc::new(store.clone()), options);
    let result = run_job(&pipeline, &args.command, as_of_date).await;

    if let Err(err) = lock.release().await {
        tracing::error!(%as_of_date, ?job, error = %format!("{err:#}"), "job lock release failed");
    }
    report(result)
}

async fn run_job(
    pipeline: &Pipeline,
    command: &Command,
    as_of_date: chrono::NaiveDate,
) -> anyhow::Result<serde_json::Value> {
    let summary = match command {
        Command::Breakouts => serde_json::to_value(pipeline.find_breakout_stocks(as_of_date).await?),
        Command::Analyze { tickers } => {
            serde_json::to_value(pipeline.analyze_tickers(tickers, as_of_date).await?)
        }
        Command::Watchlist => serde_json::to_value(pipeline.analyze_watchlist(as_of_date).await?),
        Command::Trending | Command::BreakoutPosts => {
            anyhow::bail!("{command:?} is not a daily job")
        }
    };
    summary.context("summary serialize failed")
}

fn report(result: anyhow::Result<serde_json::Value>) -> anyhow::Result<()> {
    match result {
        Ok(summary) => print_json(&summary),
        Err(err) => {
            sentry_anyhow::capture_anyhow(&err);
            if let Some(raw) = raw_output_of(&err) {
                tracing::error!(raw_output = %raw, "LLM output that failed to parse");
            }
            tracing::error!(error = %format!("{err:#}"), "job failed");
            Err(err)
        }
    }
}

fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
    let text = serde_json::to_string_pretty(value).context("output serialize failed")?;
    println!("{text}");
    Ok(())
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_global_flags_after_subcommand() {
        let args = Args::try_parse_from([
            "fintrend_worker",
            "analyze",
            "AMD",
            "NVDA",
            "--dry-run",
            "--as-of-date",
            "2026-03-02",
        ])
        .unwrap();
        assert!(args.dry_run);
        assert_eq!(args.as_of_date.as_deref(), Some("2026-03-02"));
        match args.command {
            Command::Analyze { tickers } => assert_eq!(tickers, vec!["AMD", "NVDA"]),
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn analyze_requires_a_ticker() {
        assert!(Args::try_parse_from(["fintrend_worker", "analyze"]).is_err());
    }

    #[test]
    fn read_only_commands_take_no_lock() {
        assert_eq!(Command::Trending.daily_job(), None);
        assert_eq!(Command::BreakoutPosts.daily_job(), None);
        assert_eq!(Command::Watchlist.daily_job(), Some(DailyJob::Analysis));
    }
}
