//! In-process fakes for the provider, LLM and store seams.

use crate::domain::analysis::{NewStockAnalysis, StockAnalysis};
use crate::domain::content::{Article, Post};
use crate::domain::market::{DailyClose, HistoryRange, Quote};
use crate::domain::recommendation::{BreakoutRecommendation, NewRecommendation};
use crate::llm::{CompletionRequest, LlmClient, Provider};
use crate::providers::{NewsProvider, PriceHistoryProvider, QuoteProvider, SocialProvider};
use crate::storage::memory::MemoryStore;
use crate::storage::{AnalysisStore, WriteOutcome};
use anyhow::Result;
use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::sync::Mutex;

fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 2, 12, 0, 0).unwrap()
}

pub fn article(title: &str, url: &str, hours: Option<i64>) -> Article {
    Article {
        title: title.to_string(),
        source: "Wire".to_string(),
        url: url.to_string(),
        excerpt: None,
        published_at: hours.map(|h| base_time() + Duration::hours(h)),
    }
}

pub fn post(channel: &str, title: &str, body: &str, score: i64, flair: Option<&str>) -> Post {
    let slug: String = title
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_lowercase() } else { '_' })
        .collect();
    Post {
        title: title.to_string(),
        body: body.to_string(),
        channel: channel.to_string(),
        score,
        upvote_ratio: 0.9,
        num_comments: 0,
        created_at: base_time(),
        url: format!("https://www.reddit.com/r/{channel}/comments/{slug}"),
        flair: flair.map(str::to_string),
    }
}

enum Script {
    Queue(VecDeque<Result<String, String>>),
    Routes(Vec<(String, String)>),
}

/// Replays canned completions. A queue repeats its last entry once exhausted; routes answer with
/// the first entry whose marker appears in the prompt.
pub struct ScriptedLlm {
    script: Mutex<Script>,
    last: Mutex<Option<Result<String, String>>>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedLlm {
    pub fn new(responses: Vec<Result<String, String>>) -> Self {
        Self {
            script: Mutex::new(Script::Queue(responses.into())),
            last: Mutex::new(None),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn routed(routes: Vec<(&str, String)>) -> Self {
        Self {
            script: Mutex::new(Script::Routes(
                routes.into_iter().map(|(m, r)| (m.to_string(), r)).collect(),
            )),
            last: Mutex::new(None),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl LlmClient for ScriptedLlm {
    fn provider(&self) -> Provider {
        Provider::OpenAI
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<String> {
        self.prompts.lock().unwrap().push(request.prompt.clone());

        let next = match &mut *self.script.lock().unwrap() {
            Script::Queue(queue) => match queue.pop_front() {
                Some(r) => {
                    *self.last.lock().unwrap() = Some(r.clone());
                    r
                }
                None => self
                    .last
                    .lock()
                    .unwrap()
                    .clone()
                    .unwrap_or_else(|| Err("script exhausted".to_string())),
            },
            Script::Routes(routes) => routes
                .iter()
                .find(|(marker, _)| request.prompt.contains(marker.as_str()))
                .map(|(_, r)| Ok(r.clone()))
                .unwrap_or_else(|| Err("no route for prompt".to_string())),
        };
        next.map_err(|e| anyhow::anyhow!(e))
    }
}

pub struct StaticQuotes {
    prices: BTreeMap<String, f64>,
    failing: BTreeSet<String>,
    fail_all: bool,
    queried: Mutex<Vec<String>>,
}

impl StaticQuotes {
    pub fn new(prices: &[(&str, f64)]) -> Self {
        Self {
            prices: prices.iter().map(|(t, p)| (t.to_string(), *p)).collect(),
            failing: BTreeSet::new(),
            fail_all: false,
            queried: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(mut self, tickers: &[&str]) -> Self {
        self.failing.extend(tickers.iter().map(|t| t.to_string()));
        self
    }

    pub fn failing_all(mut self) -> Self {
        self.fail_all = true;
        self
    }

    pub fn was_queried(&self, ticker: &str) -> bool {
        self.queried.lock().unwrap().iter().any(|t| t == ticker)
    }

    pub fn query_count(&self) -> usize {
        self.queried.lock().unwrap().len()
    }
}

#[async_trait::async_trait]
impl QuoteProvider for StaticQuotes {
    async fn quote(&self, ticker: &str) -> Result<Option<Quote>> {
        self.queried.lock().unwrap().push(ticker.to_string());
        if self.fail_all || self.failing.contains(ticker) {
            anyhow::bail!("quote lookup failed for {ticker}");
        }
        Ok(self.prices.get(ticker).map(|price| Quote {
            symbol: ticker.to_string(),
            price: *price,
            previous_close: Some(price * 0.98),
            fifty_day_average: None,
            currency: Some("USD".to_string()),
            exchange: Some("NMS".to_string()),
        }))
    }
}

pub struct StaticNews(pub Vec<Article>);

#[async_trait::async_trait]
impl NewsProvider for StaticNews {
    fn provider_name(&self) -> &'static str {
        "static"
    }

    async fn fetch_news(&self, _: &str, _: NaiveDate, _: u32) -> Result<Vec<Article>> {
        Ok(self.0.clone())
    }
}

pub struct FailingNews;

#[async_trait::async_trait]
impl NewsProvider for FailingNews {
    fn provider_name(&self) -> &'static str {
        "failing"
    }

    async fn fetch_news(&self, ticker: &str, _: NaiveDate, _: u32) -> Result<Vec<Article>> {
        anyhow::bail!("news provider unavailable for {ticker}")
    }
}

/// Serves the same posts from every listing; search keeps posts whose title or body contains
/// the query, case-insensitively.
pub struct StaticSocial {
    posts: Vec<Post>,
}

impl StaticSocial {
    pub fn new(posts: Vec<Post>) -> Self {
        Self { posts }
    }

    fn in_channel(&self, channel: &str, limit: u32) -> Vec<Post> {
        self.posts
            .iter()
            .filter(|p| p.channel == channel)
            .take(limit as usize)
            .cloned()
            .collect()
    }
}

#[async_trait::async_trait]
impl SocialProvider for StaticSocial {
    async fn hot(&self, channel: &str, limit: u32) -> Result<Vec<Post>> {
        Ok(self.in_channel(channel, limit))
    }

    async fn latest(&self, channel: &str, limit: u32) -> Result<Vec<Post>> {
        Ok(self.in_channel(channel, limit))
    }

    async fn search(&self, channel: &str, query: &str, limit: u32) -> Result<Vec<Post>> {
        let needle = query.to_lowercase();
        Ok(self
            .in_channel(channel, u32::MAX)
            .into_iter()
            .filter(|p| {
                p.title.to_lowercase().contains(&needle) || p.body.to_lowercase().contains(&needle)
            })
            .take(limit as usize)
            .collect())
    }
}

/// Closes on consecutive days starting 2026-03-02. Unknown symbols fail.
pub struct StaticHistory {
    closes: BTreeMap<String, Vec<f64>>,
}

impl StaticHistory {
    pub fn new(closes: Vec<(&str, Vec<f64>)>) -> Self {
        Self {
            closes: closes.into_iter().map(|(s, c)| (s.to_string(), c)).collect(),
        }
    }
}

#[async_trait::async_trait]
impl PriceHistoryProvider for StaticHistory {
    async fn daily_closes(&self, ticker: &str, _: HistoryRange) -> Result<Vec<DailyClose>> {
        let closes = self
            .closes
            .get(ticker)
            .ok_or_else(|| anyhow::anyhow!("no history for {ticker}"))?;
        let start = base_time().date_naive();
        Ok(closes
            .iter()
            .enumerate()
            .map(|(i, close)| DailyClose {
                date: start + Duration::days(i as i64),
                close: *close,
            })
            .collect())
    }
}

/// Memory store whose writes fail for selected tickers.
pub struct FlakyStore {
    pub inner: MemoryStore,
    failing: BTreeSet<String>,
}

impl FlakyStore {
    pub fn new(inner: MemoryStore, failing: &[&str]) -> Self {
        Self {
            inner,
            failing: failing.iter().map(|t| t.to_string()).collect(),
        }
    }
}

#[async_trait::async_trait]
impl AnalysisStore for FlakyStore {
    async fn find_recommendation(
        &self,
        ticker: &str,
        date: NaiveDate,
    ) -> Result<Option<BreakoutRecommendation>> {
        self.inner.find_recommendation(ticker, date).await
    }

    async fn insert_recommendation(&self, rec: &NewRecommendation) -> Result<WriteOutcome> {
        if self.failing.contains(&rec.ticker) {
            anyhow::bail!("insert failed for {}", rec.ticker);
        }
        self.inner.insert_recommendation(rec).await
    }

    async fn find_analysis(&self, ticker: &str, date: NaiveDate) -> Result<Option<StockAnalysis>> {
        self.inner.find_analysis(ticker, date).await
    }

    async fn latest_analysis(&self, ticker: &str) -> Result<Option<StockAnalysis>> {
        self.inner.latest_analysis(ticker).await
    }

    async fn insert_analysis(&self, analysis: &NewStockAnalysis) -> Result<WriteOutcome> {
        if self.failing.contains(&analysis.ticker) {
            anyhow::bail!("insert failed for {}", analysis.ticker);
        }
        self.inner.insert_analysis(analysis).await
    }

    async fn watchlist_tickers(&self) -> Result<Vec<String>> {
        self.inner.watchlist_tickers().await
    }
}
