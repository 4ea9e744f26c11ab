//! External data providers. Each client normalizes one third-party API into the shared
//! `Article`/`Post`/`Quote` shapes; everything above this module is provider-agnostic.

pub mod finnhub;
pub mod market;
pub mod news;
pub mod newsapi;
pub mod reddit;
pub mod social;
pub mod yahoo;

use crate::config::Settings;
use crate::domain::content::{Article, Post};
use crate::domain::market::{DailyClose, HistoryRange, Quote};
use anyhow::{Context, Result};
use chrono::NaiveDate;
use std::time::Duration;

#[async_trait::async_trait]
pub trait NewsProvider: Send + Sync {
    fn provider_name(&self) -> &'static str;

    /// Articles about `ticker` published in the `lookback_days` before `as_of_date`.
    async fn fetch_news(
        &self,
        ticker: &str,
        as_of_date: NaiveDate,
        lookback_days: u32,
    ) -> Result<Vec<Article>>;
}

#[async_trait::async_trait]
pub trait SocialProvider: Send + Sync {
    /// Currently popular posts in a channel.
    async fn hot(&self, channel: &str, limit: u32) -> Result<Vec<Post>>;

    /// Most recent posts in a channel.
    async fn latest(&self, channel: &str, limit: u32) -> Result<Vec<Post>>;

    /// Keyword search over the past week.
    async fn search(&self, channel: &str, query: &str, limit: u32) -> Result<Vec<Post>>;
}

#[async_trait::async_trait]
pub trait QuoteProvider: Send + Sync {
    /// `Ok(None)` means the provider does not know the ticker.
    async fn quote(&self, ticker: &str) -> Result<Option<Quote>>;
}

#[async_trait::async_trait]
pub trait PriceHistoryProvider: Send + Sync {
    /// Daily closes, oldest first.
    async fn daily_closes(&self, ticker: &str, range: HistoryRange) -> Result<Vec<DailyClose>>;
}

pub(crate) fn build_http_client(settings: &Settings, user_agent: &str) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(settings.http_timeout_secs))
        .user_agent(user_agent)
        .build()
        .context("failed to build provider http client")
}

/// Reads a response body and fails with the body attached on non-2xx statuses.
pub(crate) async fn read_success_body(res: reqwest::Response, provider: &str) -> Result<String> {
    let status = res.status();
    let text = res
        .text()
        .await
        .with_context(|| format!("failed to read {provider} response"))?;
    if !status.is_success() {
        anyhow::bail!("{provider} HTTP {status}: {}", truncate(&text, 500));
    }
    Ok(text)
}

pub(crate) fn truncate(s: &str, max_chars: usize) -> String {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &s[..idx]),
        None => s.to_string(),
    }
}
