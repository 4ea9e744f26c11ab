//! Process-local store used for dry runs and tests. Same uniqueness rules as Postgres.

use crate::domain::analysis::{NewStockAnalysis, StockAnalysis};
use crate::domain::recommendation::{BreakoutRecommendation, NewRecommendation};
use crate::storage::{AnalysisStore, WriteOutcome};
use chrono::{NaiveDate, Utc};
use std::collections::{BTreeMap, BTreeSet};
use tokio::sync::Mutex;
use uuid::Uuid;

#[derive(Default)]
struct Tables {
    recommendations: BTreeMap<(String, NaiveDate), BreakoutRecommendation>,
    analyses: BTreeMap<(String, NaiveDate), StockAnalysis>,
    news_rows: usize,
    post_rows: usize,
    watchlist: BTreeSet<String>,
}

#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_watchlist<I, S>(tickers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let tables = Tables {
            watchlist: tickers.into_iter().map(Into::into).collect(),
            ..Default::default()
        };
        Self {
            tables: Mutex::new(tables),
        }
    }

    pub async fn recommendations(&self) -> Vec<BreakoutRecommendation> {
        self.tables
            .lock()
            .await
            .recommendations
            .values()
            .cloned()
            .collect()
    }

    pub async fn analyses(&self) -> Vec<StockAnalysis> {
        self.tables.lock().await.analyses.values().cloned().collect()
    }

    /// (news rows, post rows) written alongside analyses.
    pub async fn child_row_counts(&self) -> (usize, usize) {
        let tables = self.tables.lock().await;
        (tables.news_rows, tables.post_rows)
    }
}

#[async_trait::async_trait]
impl AnalysisStore for MemoryStore {
    async fn find_recommendation(
        &self,
        ticker: &str,
        date: NaiveDate,
    ) -> anyhow::Result<Option<BreakoutRecommendation>> {
        let tables = self.tables.lock().await;
        Ok(tables
            .recommendations
            .get(&(ticker.to_string(), date))
            .cloned())
    }

    async fn insert_recommendation(&self, rec: &NewRecommendation) -> anyhow::Result<WriteOutcome> {
        let mut tables = self.tables.lock().await;
        let key = (rec.ticker.clone(), rec.recommendation_date);
        if tables.recommendations.contains_key(&key) {
            return Ok(WriteOutcome::Skipped);
        }
        let id = Uuid::new_v4();
        tables
            .recommendations
            .insert(key, rec.clone().into_recommendation(id, Utc::now()));
        Ok(WriteOutcome::Written(id))
    }

    async fn find_analysis(
        &self,
        ticker: &str,
        date: NaiveDate,
    ) -> anyhow::Result<Option<StockAnalysis>> {
        let tables = self.tables.lock().await;
        Ok(tables.analyses.get(&(ticker.to_string(), date)).cloned())
    }

    async fn latest_analysis(&self, ticker: &str) -> anyhow::Result<Option<StockAnalysis>> {
        let tables = self.tables.lock().await;
        Ok(tables
            .analyses
            .values()
            .filter(|a| a.ticker == ticker)
            .max_by_key(|a| a.analysis_date)
            .cloned())
    }

    async fn insert_analysis(&self, analysis: &NewStockAnalysis) -> anyhow::Result<WriteOutcome> {
        let mut tables = self.tables.lock().await;
        let key = (analysis.ticker.clone(), analysis.analysis_date);
        if tables.analyses.contains_key(&key) {
            return Ok(WriteOutcome::Skipped);
        }
        let id = Uuid::new_v4();
        tables.news_rows += analysis.news.len();
        tables.post_rows += analysis.posts.len();
        tables
            .analyses
            .insert(key, analysis.clone().into_analysis(id, Utc::now()));
        Ok(WriteOutcome::Written(id))
    }

    async fn watchlist_tickers(&self) -> anyhow::Result<Vec<String>> {
        Ok(self.tables.lock().await.watchlist.iter().cloned().collect())
    }
}
