use crate::config::Settings;
use crate::domain::content::Post;
use crate::providers::{build_http_client, read_success_body, SocialProvider};
use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;

const AUTH_URL: &str = "https://www.reddit.com/api/v1/access_token";
const API_BASE_URL: &str = "https://oauth.reddit.com";
const WEB_BASE_URL: &str = "https://www.reddit.com";

// Refresh a little before Reddit says the token expires.
const TOKEN_EXPIRY_MARGIN_SECS: i64 = 60;

/// Reddit client using app-only OAuth (client-credentials grant).
#[derive(Debug)]
pub struct RedditClient {
    http: reqwest::Client,
    client_id: String,
    client_secret: String,
    api_base_url: String,

    // Cache token within a single process run to avoid repeated token issuance.
    token_cache: tokio::sync::Mutex<Option<CachedToken>>,
}

#[derive(Debug, Clone)]
struct CachedToken {
    access_token: String,
    expires_at: DateTime<Utc>,
}

impl RedditClient {
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let (client_id, client_secret) = settings.require_reddit_credentials()?;
        let api_base_url =
            std::env::var("REDDIT_API_BASE_URL").unwrap_or_else(|_| API_BASE_URL.to_string());

        Ok(Self {
            http: build_http_client(settings, &settings.reddit_user_agent)?,
            client_id: client_id.to_string(),
            client_secret: client_secret.to_string(),
            api_base_url,
            token_cache: tokio::sync::Mutex::new(None),
        })
    }

    async fn access_token(&self) -> Result<String> {
        let mut guard = self.token_cache.lock().await;
        if let Some(cached) = guard.as_ref() {
            if Utc::now() < cached.expires_at {
                return Ok(cached.access_token.clone());
            }
        }

        let res = self
            .http
            .post(AUTH_URL)
            .basic_auth(&self.client_id, Some(&self.client_secret))
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await
            .context("Reddit token request failed")?;

        let text = read_success_body(res, "Reddit token").await?;
        let token = serde_json::from_str::<TokenResponse>(&text)
            .context("failed to parse Reddit token response")?;

        let lifetime = (token.expires_in - TOKEN_EXPIRY_MARGIN_SECS).max(0);
        *guard = Some(CachedToken {
            access_token: token.access_token.clone(),
            expires_at: Utc::now() + Duration::seconds(lifetime),
        });
        Ok(token.access_token)
    }

    async fn listing(&self, channel: &str, path: &str, params: &[(&str, String)]) -> Result<Vec<Post>> {
        let token = self.access_token().await?;
        let url = format!(
            "{}/r/{}/{}",
            self.api_base_url.trim_end_matches('/'),
            channel,
            path
        );

        let res = self
            .http
            .get(url)
            .bearer_auth(token)
            .query(&[("raw_json", "1")])
            .query(params)
            .send()
            .await
            .with_context(|| format!("Reddit {path} request failed for r/{channel}"))?;

        let text = read_success_body(res, "Reddit").await?;
        let listing = serde_json::from_str::<Listing>(&text)
            .with_context(|| format!("failed to parse Reddit {path} listing for r/{channel}"))?;

        Ok(listing.into_posts(channel))
    }
}

#[async_trait::async_trait]
impl SocialProvider for RedditClient {
    async fn hot(&self, channel: &str, limit: u32) -> Result<Vec<Post>> {
        self.listing(channel, "hot", &[("limit", limit.to_string())])
            .await
    }

    async fn latest(&self, channel: &str, limit: u32) -> Result<Vec<Post>> {
        self.listing(channel, "new", &[("limit", limit.to_string())])
            .await
    }

    async fn search(&self, channel: &str, query: &str, limit: u32) -> Result<Vec<Post>> {
        self.listing(
            channel,
            "search",
            &[
                ("q", query.to_string()),
                ("restrict_sr", "1".to_string()),
                ("t", "week".to_string()),
                ("limit", limit.to_string()),
            ],
        )
        .await
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: i64,
}

#[derive(Debug, Deserialize)]
struct Listing {
    data: ListingData,
}

#[derive(Debug, Deserialize)]
struct ListingData {
    #[serde(default)]
    children: Vec<Child>,
}

#[derive(Debug, Deserialize)]
struct Child {
    data: RedditPost,
}

#[derive(Debug, Deserialize)]
struct RedditPost {
    #[serde(default)]
    title: String,
    #[serde(default)]
    selftext: String,
    #[serde(default)]
    score: i64,
    #[serde(default)]
    upvote_ratio: f64,
    #[serde(default)]
    num_comments: i64,
    #[serde(default)]
    created_utc: f64,
    #[serde(default)]
    permalink: String,
    #[serde(default)]
    link_flair_text: Option<String>,
}

impl Listing {
    fn into_posts(self, channel: &str) -> Vec<Post> {
        self.data
            .children
            .into_iter()
            .map(|c| c.data.into_post(channel))
            .collect()
    }
}

impl RedditPost {
    fn into_post(self, channel: &str) -> Post {
        let created_at =
            DateTime::<Utc>::from_timestamp(self.created_utc as i64, 0).unwrap_or_default();
        Post {
            title: self.title,
            body: self.selftext,
            channel: channel.to_string(),
            score: self.score,
            upvote_ratio: self.upvote_ratio,
            num_comments: self.num_comments,
            created_at,
            url: format!("{WEB_BASE_URL}{}", self.permalink),
            flair: self.link_flair_text.filter(|f| !f.trim().is_empty()),
        }
    }
}
