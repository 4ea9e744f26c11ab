use crate::analysis::sentiment::item_id;
use crate::domain::analysis::{NewStockAnalysis, NewsRecord, SocialPostRecord, StockAnalysis};
use crate::domain::content::{Article, Post};
use crate::domain::sentiment::SentimentReport;
use crate::pipeline::Pipeline;
use crate::providers::news::fetch_aggregated_news;
use crate::providers::social::{dedupe_by_url, posts_mentioning};
use crate::storage::WriteOutcome;
use chrono::NaiveDate;
use serde::Serialize;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq)]
pub enum AnalysisOutcome {
    Created(Uuid),
    /// An analysis for (ticker, date) already existed and is returned unchanged.
    Existing(StockAnalysis),
    /// A concurrent run wrote the row between lookup and insert.
    Skipped,
    /// The quote provider does not know the ticker; nothing was written.
    NoMarketData,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AnalysisRunSummary {
    pub created: usize,
    pub existing: usize,
    pub no_market_data: usize,
    pub failed: usize,
}

impl AnalysisRunSummary {
    fn record(&mut self, outcome: &anyhow::Result<AnalysisOutcome>) {
        match outcome {
            Ok(AnalysisOutcome::Created(_)) => self.created += 1,
            Ok(AnalysisOutcome::Existing(_)) | Ok(AnalysisOutcome::Skipped) => self.existing += 1,
            Ok(AnalysisOutcome::NoMarketData) => self.no_market_data += 1,
            Err(_) => self.failed += 1,
        }
    }
}

impl Pipeline {
    /// Analyzes one ticker for `as_of_date`, at most once per day.
    pub async fn analyze_stock(
        &self,
        ticker: &str,
        as_of_date: NaiveDate,
    ) -> anyhow::Result<AnalysisOutcome> {
        let ticker = ticker.trim().to_ascii_uppercase();
        tracing::info!(%ticker, %as_of_date, "analyzing stock");

        if let Some(existing) = self.store.find_analysis(&ticker, as_of_date).await? {
            tracing::info!(%ticker, %as_of_date, "already analyzed; skipping");
            return Ok(AnalysisOutcome::Existing(existing));
        }

        let news = fetch_aggregated_news(
            &self.providers.news,
            &ticker,
            as_of_date,
            self.options.news_lookback_days,
            self.options.news_limit,
        )
        .await;
        let posts = self.social_posts(&ticker).await;

        let quote = match self.providers.quotes.quote(&ticker).await {
            Ok(Some(quote)) => quote,
            Ok(None) => {
                tracing::error!(%ticker, "no market data; skipping analysis");
                return Ok(AnalysisOutcome::NoMarketData);
            }
            Err(err) => {
                tracing::error!(%ticker, error = %err, "quote fetch failed; skipping analysis");
                return Ok(AnalysisOutcome::NoMarketData);
            }
        };

        let news_report = self.sentiment.summarize_news(&news).await;
        let post_report = self.sentiment.summarize_posts(&posts).await;
        let summary = self
            .stock_summary
            .summarize(&ticker, &news_report, &post_report, &quote)
            .await?;

        let analysis = NewStockAnalysis {
            ticker: ticker.clone(),
            analysis_date: as_of_date,
            sentiment_score: summary.overall_sentiment_score,
            news_sentiment: news_report.overall(),
            reddit_sentiment: post_report.overall(),
            mention_count: i32::try_from(news.len() + posts.len()).unwrap_or(i32::MAX),
            is_breakout: summary.is_breakout_candidate,
            summary: summary.combined_text(),
            news: news_records(&news, &news_report),
            posts: post_records(&posts, &post_report),
        };

        match self.store.insert_analysis(&analysis).await? {
            WriteOutcome::Written(id) => {
                tracing::info!(
                    %ticker,
                    %as_of_date,
                    %id,
                    news = analysis.news.len(),
                    posts = analysis.posts.len(),
                    "analysis completed"
                );
                Ok(AnalysisOutcome::Created(id))
            }
            WriteOutcome::Skipped => {
                tracing::info!(%ticker, %as_of_date, "analysis written concurrently; skipping");
                Ok(AnalysisOutcome::Skipped)
            }
        }
    }

    /// Analyzes every watchlist ticker. A failing ticker is logged and the loop continues.
    pub async fn analyze_watchlist(&self, as_of_date: NaiveDate) -> anyhow::Result<AnalysisRunSummary> {
        let tickers = self.store.watchlist_tickers().await?;
        self.analyze_tickers(&tickers, as_of_date).await
    }

    pub async fn analyze_tickers(
        &self,
        tickers: &[String],
        as_of_date: NaiveDate,
    ) -> anyhow::Result<AnalysisRunSummary> {
        let mut summary = AnalysisRunSummary::default();
        for ticker in tickers {
            let outcome = self.analyze_stock(ticker, as_of_date).await;
            if let Err(err) = &outcome {
                tracing::error!(%ticker, %as_of_date, error = %format!("{err:#}"), "analysis failed");
            }
            summary.record(&outcome);
        }

        tracing::info!(
            %as_of_date,
            tickers = tickers.len(),
            created = summary.created,
            existing = summary.existing,
            no_market_data = summary.no_market_data,
            failed = summary.failed,
            "analysis run finished"
        );
        Ok(summary)
    }

    /// Past-week posts naming the ticker, searched as `T` and `$T` in every channel.
    async fn social_posts(&self, ticker: &str) -> Vec<Post> {
        let mut posts = Vec::new();
        for channel in &self.options.channels {
            for query in [ticker.to_string(), format!("${ticker}")] {
                match self
                    .providers
                    .social
                    .search(channel, &query, self.options.search_limit)
                    .await
                {
                    Ok(found) => posts.extend(posts_mentioning(found, ticker)),
                    Err(err) => {
                        tracing::warn!(%channel, %query, error = %err, "post search failed; skipping")
                    }
                }
            }
        }
        let posts = dedupe_by_url(posts);
        tracing::info!(%ticker, posts = posts.len(), "collected social posts");
        posts
    }
}

fn news_records(articles: &[Article], report: &SentimentReport) -> Vec<NewsRecord> {
    articles
        .iter()
        .enumerate()
        .map(|(i, a)| NewsRecord {
            title: a.title.clone(),
            url: a.url.clone(),
            source: a.source.clone(),
            published_at: a.published_at,
            sentiment_score: report.score_for(&item_id('A', i)),
        })
        .collect()
}

fn post_records(posts: &[Post], report: &SentimentReport) -> Vec<SocialPostRecord> {
    posts
        .iter()
        .enumerate()
        .map(|(i, p)| SocialPostRecord {
            title: p.title.clone(),
            url: p.url.clone(),
            channel: p.channel.clone(),
            posted_at: p.created_at,
            sentiment_score: report.score_for(&item_id('P', i)),
            upvote_ratio: p.upvote_ratio,
        })
        .collect()
}
