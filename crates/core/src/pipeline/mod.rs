//! Daily jobs. Every stage runs sequentially and takes the as-of date explicitly; the store is
//! the only durable side effect.

pub mod analysis;
pub mod breakouts;

use crate::analysis::breakout::{BreakoutIdentifier, DEFAULT_MAX_TICKERS};
use crate::analysis::sentiment::SentimentSummarizer;
use crate::analysis::stock_summary::StockSummarizer;
use crate::config::Settings;
use crate::extract::ExtractorOptions;
use crate::llm::retry::RetryPolicy;
use crate::llm::LlmClient;
use crate::providers::finnhub::FinnhubClient;
use crate::providers::newsapi::NewsApiClient;
use crate::providers::reddit::RedditClient;
use crate::providers::social::BreakoutPostFilter;
use crate::providers::yahoo::YahooFinanceClient;
use crate::providers::{NewsProvider, PriceHistoryProvider, QuoteProvider, SocialProvider};
use crate::storage::AnalysisStore;
use std::sync::Arc;

pub use analysis::{AnalysisOutcome, AnalysisRunSummary};
pub use breakouts::BreakoutRunSummary;

const DEFAULT_HOT_LIMIT: u32 = 50;
const DEFAULT_INDICES: &[&str] = &["SPY", "QQQ", "IWM"];
const DEFAULT_INDEX_LOOKBACK_DAYS: u32 = 5;
const DEFAULT_NEWS_LOOKBACK_DAYS: u32 = 5;
const DEFAULT_NEWS_LIMIT: usize = 20;
const DEFAULT_SEARCH_LIMIT: u32 = 20;
const DEFAULT_BREAKOUT_POST_LIMIT: usize = 25;

#[derive(Debug, Clone)]
pub struct BreakoutOptions {
    /// Trending tickers sent to the identifier, most-mentioned first.
    pub max_tickers: usize,
    /// Hot posts scanned per channel.
    pub hot_limit: u32,
    pub indices: Vec<String>,
    pub index_lookback_days: u32,
}

impl Default for BreakoutOptions {
    fn default() -> Self {
        Self {
            max_tickers: DEFAULT_MAX_TICKERS,
            hot_limit: DEFAULT_HOT_LIMIT,
            indices: DEFAULT_INDICES.iter().map(|s| s.to_string()).collect(),
            index_lookback_days: DEFAULT_INDEX_LOOKBACK_DAYS,
        }
    }
}

impl BreakoutOptions {
    pub fn from_env() -> Self {
        let mut out = Self::default();

        if let Ok(s) = std::env::var("BREAKOUT_MAX_TICKERS") {
            if let Ok(n) = s.parse::<usize>() {
                out.max_tickers = n;
            }
        }

        if let Ok(s) = std::env::var("BREAKOUT_HOT_LIMIT") {
            if let Ok(n) = s.parse::<u32>() {
                out.hot_limit = n;
            }
        }

        if let Ok(s) = std::env::var("BREAKOUT_INDICES") {
            let indices: Vec<String> = s
                .split(',')
                .map(|t| t.trim().to_ascii_uppercase())
                .filter(|t| !t.is_empty())
                .collect();
            if !indices.is_empty() {
                out.indices = indices;
            }
        }

        if let Ok(s) = std::env::var("BREAKOUT_INDEX_LOOKBACK_DAYS") {
            if let Ok(n) = s.parse::<u32>() {
                out.index_lookback_days = n;
            }
        }

        out
    }
}

#[derive(Debug, Clone)]
pub struct PipelineOptions {
    /// Discussion channels (subreddits) to scan.
    pub channels: Vec<String>,
    pub extractor: ExtractorOptions,
    pub breakout: BreakoutOptions,
    pub post_filter: BreakoutPostFilter,
    pub retry: RetryPolicy,
    pub news_lookback_days: u32,
    pub news_limit: usize,
    /// Results per channel per search query.
    pub search_limit: u32,
    pub breakout_post_limit: usize,
}

impl PipelineOptions {
    pub fn new(channels: Vec<String>) -> Self {
        Self {
            channels,
            extractor: ExtractorOptions::default(),
            breakout: BreakoutOptions::default(),
            post_filter: BreakoutPostFilter::default(),
            retry: RetryPolicy::default(),
            news_lookback_days: DEFAULT_NEWS_LOOKBACK_DAYS,
            news_limit: DEFAULT_NEWS_LIMIT,
            search_limit: DEFAULT_SEARCH_LIMIT,
            breakout_post_limit: DEFAULT_BREAKOUT_POST_LIMIT,
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        let mut out = Self::new(settings.subreddits.clone());
        out.extractor = ExtractorOptions::from_env();
        out.breakout = BreakoutOptions::from_env();
        out.retry = RetryPolicy::from_env();

        if let Ok(s) = std::env::var("NEWS_LOOKBACK_DAYS") {
            if let Ok(n) = s.parse::<u32>() {
                out.news_lookback_days = n;
            }
        }

        if let Ok(s) = std::env::var("NEWS_LIMIT") {
            if let Ok(n) = s.parse::<usize>() {
                out.news_limit = n;
            }
        }

        out
    }
}

/// External collaborators the pipeline reads from.
#[derive(Clone)]
pub struct Providers {
    pub news: Vec<Arc<dyn NewsProvider>>,
    pub social: Arc<dyn SocialProvider>,
    pub quotes: Arc<dyn QuoteProvider>,
    pub history: Arc<dyn PriceHistoryProvider>,
}

impl Providers {
    /// News providers without a configured key are left out; Reddit credentials are required.
    pub fn from_settings(settings: &Settings) -> anyhow::Result<Self> {
        let mut news: Vec<Arc<dyn NewsProvider>> = Vec::new();
        if let Some(client) = NewsApiClient::from_settings(settings)? {
            news.push(Arc::new(client));
        }
        if let Some(client) = FinnhubClient::from_settings(settings)? {
            news.push(Arc::new(client));
        }
        if news.is_empty() {
            tracing::warn!("no news provider configured (NEWS_API_KEY / FINNHUB_API_KEY)");
        }

        let yahoo = Arc::new(YahooFinanceClient::from_settings(settings)?);
        Ok(Self {
            news,
            social: Arc::new(RedditClient::from_settings(settings)?),
            quotes: yahoo.clone(),
            history: yahoo,
        })
    }
}

pub struct Pipeline {
    providers: Providers,
    store: Arc<dyn AnalysisStore>,
    sentiment: SentimentSummarizer,
    stock_summary: StockSummarizer,
    breakout: BreakoutIdentifier,
    options: PipelineOptions,
}

impl Pipeline {
    pub fn new(
        providers: Providers,
        llm: Arc<dyn LlmClient>,
        store: Arc<dyn AnalysisStore>,
        options: PipelineOptions,
    ) -> Self {
        let sentiment = SentimentSummarizer::new(llm.clone(), options.retry.clone());
        let stock_summary = StockSummarizer::new(llm.clone(), options.retry.clone());
        let breakout = BreakoutIdentifier::new(llm, options.retry.clone())
            .with_max_tickers(options.breakout.max_tickers);
        Self {
            providers,
            store,
            sentiment,
            stock_summary,
            breakout,
            options,
        }
    }
}
