pub mod analyses;
pub mod lock;
pub mod memory;
pub mod postgres;
pub mod recommendations;
pub mod watchlist;

use crate::domain::analysis::{NewStockAnalysis, StockAnalysis};
use crate::domain::recommendation::{BreakoutRecommendation, NewRecommendation};
use anyhow::Context;
use chrono::NaiveDate;
use uuid::Uuid;

pub async fn migrate(pool: &sqlx::PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .context("sqlx migrations failed")?;
    Ok(())
}

/// Result of an insert keyed by (ticker, date).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    Written(Uuid),
    /// A row for the same (ticker, date) already existed; nothing was written.
    Skipped,
}

/// Durable state of the pipeline. Every insert is its own unit of work: it either commits
/// completely or leaves nothing behind.
#[async_trait::async_trait]
pub trait AnalysisStore: Send + Sync {
    async fn find_recommendation(
        &self,
        ticker: &str,
        date: NaiveDate,
    ) -> anyhow::Result<Option<BreakoutRecommendation>>;

    /// Inserts unless a row for (ticker, recommendation_date) exists.
    async fn insert_recommendation(&self, rec: &NewRecommendation) -> anyhow::Result<WriteOutcome>;

    async fn find_analysis(
        &self,
        ticker: &str,
        date: NaiveDate,
    ) -> anyhow::Result<Option<StockAnalysis>>;

    async fn latest_analysis(&self, ticker: &str) -> anyhow::Result<Option<StockAnalysis>>;

    /// Inserts the analysis with its news and post rows unless (ticker, analysis_date) exists.
    async fn insert_analysis(&self, analysis: &NewStockAnalysis) -> anyhow::Result<WriteOutcome>;

    /// Distinct watchlist tickers, sorted.
    async fn watchlist_tickers(&self) -> anyhow::Result<Vec<String>>;
}
