use crate::domain::analysis::{NewStockAnalysis, StockAnalysis};
use crate::domain::recommendation::{BreakoutRecommendation, NewRecommendation};
use crate::storage::{analyses, recommendations, watchlist, AnalysisStore, WriteOutcome};
use anyhow::Context;
use chrono::NaiveDate;
use sqlx::postgres::PgPoolOptions;

#[derive(Clone)]
pub struct PgStore {
    pool: sqlx::PgPool,
}

impl PgStore {
    pub fn new(pool: sqlx::PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(database_url: &str, max_connections: u32) -> anyhow::Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await
            .context("failed to connect to database")?;
        Ok(Self::new(pool))
    }

    pub fn pool(&self) -> &sqlx::PgPool {
        &self.pool
    }
}

#[async_trait::async_trait]
impl AnalysisStore for PgStore {
    async fn find_recommendation(
        &self,
        ticker: &str,
        date: NaiveDate,
    ) -> anyhow::Result<Option<BreakoutRecommendation>> {
        recommendations::find_recommendation(&self.pool, ticker, date).await
    }

    async fn insert_recommendation(&self, rec: &NewRecommendation) -> anyhow::Result<WriteOutcome> {
        recommendations::insert_recommendation(&self.pool, rec).await
    }

    async fn find_analysis(
        &self,
        ticker: &str,
        date: NaiveDate,
    ) -> anyhow::Result<Option<StockAnalysis>> {
        analyses::find_analysis(&self.pool, ticker, date).await
    }

    async fn latest_analysis(&self, ticker: &str) -> anyhow::Result<Option<StockAnalysis>> {
        analyses::latest_analysis(&self.pool, ticker).await
    }

    async fn insert_analysis(&self, analysis: &NewStockAnalysis) -> anyhow::Result<WriteOutcome> {
        analyses::insert_analysis(&self.pool, analysis).await
    }

    async fn watchlist_tickers(&self) -> anyhow::Result<Vec<String>> {
        watchlist::list_tickers(&self.pool).await
    }
}
