use crate::config::Settings;
use crate::domain::content::Article;
use crate::providers::{build_http_client, read_success_body, NewsProvider};
use crate::time::us_market::lookback_start;
use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;

const DEFAULT_BASE_URL: &str = "https://newsapi.org";
const USER_AGENT: &str = "fintrend/0.1";

/// NewsAPI `/v2/everything` client.
#[derive(Debug, Clone)]
pub struct NewsApiClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl NewsApiClient {
    pub fn from_settings(settings: &Settings) -> Result<Option<Self>> {
        let Some(api_key) = settings.news_api_key.clone() else {
            return Ok(None);
        };
        let base_url =
            std::env::var("NEWS_API_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());

        Ok(Some(Self {
            http: build_http_client(settings, USER_AGENT)?,
            base_url,
            api_key,
        }))
    }

    fn query_for(ticker: &str) -> String {
        format!("({ticker} OR ${ticker}) AND (stock OR stocks OR investing OR shares)")
    }
}

#[async_trait::async_trait]
impl NewsProvider for NewsApiClient {
    fn provider_name(&self) -> &'static str {
        "newsapi"
    }

    async fn fetch_news(
        &self,
        ticker: &str,
        as_of_date: NaiveDate,
        lookback_days: u32,
    ) -> Result<Vec<Article>> {
        let from = lookback_start(as_of_date, lookback_days);
        let url = format!("{}/v2/everything", self.base_url.trim_end_matches('/'));

        let res = self
            .http
            .get(url)
            .header("X-Api-Key", &self.api_key)
            .query(&[
                ("q", Self::query_for(ticker)),
                ("language", "en".to_string()),
                ("sortBy", "publishedAt".to_string()),
                ("from", from.to_string()),
            ])
            .send()
            .await
            .context("NewsAPI request failed")?;

        let text = read_success_body(res, "NewsAPI").await?;
        let parsed = serde_json::from_str::<EverythingResponse>(&text)
            .context("failed to parse NewsAPI response")?;

        if parsed.status != "ok" {
            anyhow::bail!(
                "NewsAPI status={} message={}",
                parsed.status,
                parsed.message.unwrap_or_default()
            );
        }

        let articles: Vec<Article> = parsed.articles.into_iter().map(Article::from).collect();
        tracing::info!(%ticker, count = articles.len(), "fetched NewsAPI articles");
        Ok(articles)
    }
}

#[derive(Debug, Deserialize)]
struct EverythingResponse {
    status: String,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    articles: Vec<NewsApiArticle>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NewsApiArticle {
    #[serde(default)]
    source: NewsApiSource,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    published_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Default, Deserialize)]
struct NewsApiSource {
    #[serde(default)]
    name: Option<String>,
}

impl From<NewsApiArticle> for Article {
    fn from(a: NewsApiArticle) -> Self {
        Article {
            title: a.title.unwrap_or_default().trim().to_string(),
            source: a.source.name.unwrap_or_default(),
            url: a.url.unwrap_or_default(),
            excerpt: a.description.filter(|d| !d.trim().is_empty()),
            published_at: a.published_at,
        }
    }
}
