use crate::config::Settings;
use crate::domain::content::Article;
use crate::providers::{build_http_client, read_success_body, NewsProvider};
use crate::time::us_market::lookback_start;
use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;

const DEFAULT_BASE_URL: &str = "https://finnhub.io/api/v1";
const USER_AGENT: &str = "fintrend/0.1";

/// Finnhub `/company-news` client.
#[derive(Debug, Clone)]
pub struct FinnhubClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl FinnhubClient {
    pub fn from_settings(settings: &Settings) -> Result<Option<Self>> {
        let Some(api_key) = settings.finnhub_api_key.clone() else {
            return Ok(None);
        };
        let base_url =
            std::env::var("FINNHUB_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());

        Ok(Some(Self {
            http: build_http_client(settings, USER_AGENT)?,
            base_url,
            api_key,
        }))
    }
}

#[async_trait::async_trait]
impl NewsProvider for FinnhubClient {
    fn provider_name(&self) -> &'static str {
        "finnhub"
    }

    async fn fetch_news(
        &self,
        ticker: &str,
        as_of_date: NaiveDate,
        lookback_days: u32,
    ) -> Result<Vec<Article>> {
        let from = lookback_start(as_of_date, lookback_days);
        let url = format!("{}/company-news", self.base_url.trim_end_matches('/'));

        let res = self
            .http
            .get(url)
            .header("X-Finnhub-Token", &self.api_key)
            .query(&[
                ("symbol", ticker.to_string()),
                ("from", from.to_string()),
                ("to", as_of_date.to_string()),
            ])
            .send()
            .await
            .context("Finnhub request failed")?;

        let text = read_success_body(res, "Finnhub").await?;
        let items = serde_json::from_str::<Vec<FinnhubArticle>>(&text)
            .context("failed to parse Finnhub company-news response")?;

        let articles: Vec<Article> = items.into_iter().map(Article::from).collect();
        tracing::info!(%ticker, count = articles.len(), "fetched Finnhub articles");
        Ok(articles)
    }
}

#[derive(Debug, Deserialize)]
struct FinnhubArticle {
    #[serde(default)]
    headline: String,
    #[serde(default)]
    summary: String,
    #[serde(default)]
    url: String,
    #[serde(default)]
    source: String,
    /// Unix seconds.
    #[serde(default)]
    datetime: i64,
}

impl From<FinnhubArticle> for Article {
    fn from(a: FinnhubArticle) -> Self {
        let published_at = (a.datetime > 0)
            .then(|| DateTime::<Utc>::from_timestamp(a.datetime, 0))
            .flatten();

        Article {
            title: a.headline.trim().to_string(),
            source: a.source,
            url: a.url,
            excerpt: Some(a.summary).filter(|s| !s.trim().is_empty()),
            published_at,
        }
    }
}
