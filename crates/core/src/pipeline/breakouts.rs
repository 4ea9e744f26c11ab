use crate::domain::analysis::PriorAnalysis;
use crate::domain::content::Post;
use crate::domain::market::HistoryRange;
use crate::domain::recommendation::{BreakoutCandidate, NewRecommendation};
use crate::extract::extract_trending_tickers;
use crate::extract::mentions::{mention_counts, rank_trending};
use crate::llm::error::raw_output_of;
use crate::pipeline::{Pipeline, PipelineOptions, Providers};
use crate::providers::market::index_snapshots;
use crate::providers::social::fetch_breakout_posts;
use crate::providers::QuoteProvider;
use crate::storage::{AnalysisStore, WriteOutcome};
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;

/// Recorded when the current price cannot be fetched at write time.
pub const SENTINEL_PRICE: f64 = 0.0;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BreakoutRunSummary {
    /// Set when the model call failed; nothing was written.
    pub identifier_failed: bool,
    pub candidates: usize,
    pub written: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl Pipeline {
    pub async fn trending_tickers(&self) -> Vec<String> {
        trending_tickers(&self.providers, &self.options).await
    }

    pub async fn breakout_posts(&self) -> Vec<Post> {
        breakout_posts(&self.providers, &self.options).await
    }

    /// The daily breakout job. Failures degrade: a failed ticker, index or provider is skipped,
    /// and a failed identification is logged and ends the run with nothing written.
    pub async fn find_breakout_stocks(
        &self,
        as_of_date: NaiveDate,
    ) -> anyhow::Result<BreakoutRunSummary> {
        let trending = self.trending_tickers().await;
        if trending.is_empty() {
            tracing::warn!(%as_of_date, "no trending tickers found");
            return Ok(BreakoutRunSummary::default());
        }

        let tickers = &trending[..trending.len().min(self.options.breakout.max_tickers)];

        let range = HistoryRange::from_lookback_days(self.options.breakout.index_lookback_days);
        let indices = index_snapshots(
            self.providers.history.as_ref(),
            &self.options.breakout.indices,
            range,
        )
        .await;

        let mut prior = BTreeMap::new();
        for ticker in tickers {
            match self.store.latest_analysis(ticker).await {
                Ok(Some(analysis)) => {
                    prior.insert(ticker.clone(), PriorAnalysis::from(&analysis));
                }
                Ok(None) => {}
                Err(err) => {
                    tracing::warn!(%ticker, error = %format!("{err:#}"), "prior analysis lookup failed")
                }
            }
        }

        let report = match self
            .breakout
            .identify(as_of_date, tickers, &indices, &prior)
            .await
        {
            Ok(report) => report,
            Err(err) => {
                tracing::error!(
                    %as_of_date,
                    error = %format!("{err:#}"),
                    raw_output = raw_output_of(&err).unwrap_or(""),
                    "breakout identification failed; nothing recorded"
                );
                return Ok(BreakoutRunSummary {
                    identifier_failed: true,
                    ..Default::default()
                });
            }
        };
        if !report.market_assessment.is_empty() {
            tracing::info!(%as_of_date, assessment = %report.market_assessment, "market assessment");
        }

        Ok(record_recommendations(
            self.store.as_ref(),
            self.providers.quotes.as_ref(),
            &report.candidates,
            as_of_date,
        )
        .await)
    }
}

/// Validated tickers from hot posts across all channels, most-mentioned first.
pub async fn trending_tickers(providers: &Providers, options: &PipelineOptions) -> Vec<String> {
    let mut titles = Vec::new();
    for channel in &options.channels {
        match providers.social.hot(channel, options.breakout.hot_limit).await {
            Ok(posts) => titles.extend(posts.into_iter().map(|p| p.title)),
            Err(err) => {
                tracing::warn!(%channel, error = %err, "hot listing failed; skipping channel")
            }
        }
    }

    let validated =
        extract_trending_tickers(&titles, providers.quotes.as_ref(), &options.extractor).await;
    rank_trending(&mention_counts(&titles, &validated))
}

/// Flair/phrase-filtered breakout chatter from hot and new listings.
pub async fn breakout_posts(providers: &Providers, options: &PipelineOptions) -> Vec<Post> {
    fetch_breakout_posts(
        providers.social.as_ref(),
        &options.channels,
        &options.post_filter,
        options.breakout_post_limit,
    )
    .await
}

/// Writes at most one recommendation per (ticker, date). Each write stands alone: a failure is
/// logged and counted, and the batch continues.
pub async fn record_recommendations(
    store: &dyn AnalysisStore,
    quotes: &dyn QuoteProvider,
    candidates: &[BreakoutCandidate],
    as_of_date: NaiveDate,
) -> BreakoutRunSummary {
    let mut summary = BreakoutRunSummary {
        candidates: candidates.len(),
        ..Default::default()
    };

    for candidate in candidates {
        let ticker = candidate.ticker.as_str();

        match store.find_recommendation(ticker, as_of_date).await {
            Ok(Some(_)) => {
                tracing::debug!(%ticker, %as_of_date, "recommendation exists; skipping");
                summary.skipped += 1;
                continue;
            }
            Ok(None) => {}
            // The insert is still guarded by the unique constraint.
            Err(err) => {
                tracing::warn!(%ticker, error = %format!("{err:#}"), "recommendation lookup failed")
            }
        }

        let price = match quotes.quote(ticker).await {
            Ok(Some(quote)) => quote.price,
            Ok(None) => {
                tracing::warn!(%ticker, "no quote; recording sentinel price");
                SENTINEL_PRICE
            }
            Err(err) => {
                tracing::warn!(%ticker, error = %err, "quote fetch failed; recording sentinel price");
                SENTINEL_PRICE
            }
        };

        let rec = NewRecommendation::from_candidate(candidate, as_of_date, price);
        match store.insert_recommendation(&rec).await {
            Ok(WriteOutcome::Written(id)) => {
                tracing::info!(%ticker, %as_of_date, %id, confidence = rec.confidence_score, "created breakout recommendation");
                summary.written += 1;
            }
            Ok(WriteOutcome::Skipped) => {
                tracing::info!(%ticker, %as_of_date, "recommendation written concurrently; skipping");
                summary.skipped += 1;
            }
            Err(err) => {
                tracing::error!(%ticker, %as_of_date, error = %format!("{err:#}"), "failed to write recommendation");
                summary.failed += 1;
            }
        }
    }

    tracing::info!(
        %as_of_date,
        candidates = summary.candidates,
        written = summary.written,
        skipped = summary.skipped,
        failed = summary.failed,
        "breakout recommendations recorded"
    );
    summary
}
