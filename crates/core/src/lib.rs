pub mod analysis;
pub mod domain;
pub mod extract;
pub mod llm;
pub mod pipeline;
pub mod providers;
pub mod storage;
pub mod time;

#[cfg(test)]
pub(crate) mod testing;

pub mod config {
    use anyhow::Context;

    const DEFAULT_REDDIT_USER_AGENT: &str = "FinTrend/1.0";
    const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;
    const DEFAULT_SUBREDDITS: &[&str] = &[
        "wallstreetbets",
        "investing",
        "stocks",
        "stockmarket",
        "options",
        "pennystocks",
        "SecurityAnalysis",
    ];

    #[derive(Debug, Clone)]
    pub struct Settings {
        pub database_url: Option<String>,
        pub sentry_dsn: Option<String>,
        pub llm_provider: Option<String>,
        pub openai_api_key: Option<String>,
        pub anthropic_api_key: Option<String>,
        pub news_api_key: Option<String>,
        pub finnhub_api_key: Option<String>,
        pub reddit_client_id: Option<String>,
        pub reddit_client_secret: Option<String>,
        pub reddit_user_agent: String,
        pub subreddits: Vec<String>,
        pub http_timeout_secs: u64,
    }

    impl Settings {
        pub fn from_env() -> anyhow::Result<Self> {
            let http_timeout_secs = match std::env::var("HTTP_TIMEOUT_SECS") {
                Ok(s) => s
                    .parse::<u64>()
                    .with_context(|| format!("HTTP_TIMEOUT_SECS must be an integer (got {s})"))?,
                Err(_) => DEFAULT_HTTP_TIMEOUT_SECS,
            };

            Ok(Self {
                database_url: std::env::var("DATABASE_URL").ok(),
                sentry_dsn: std::env::var("SENTRY_DSN").ok(),
                llm_provider: std::env::var("LLM_PROVIDER").ok(),
                openai_api_key: std::env::var("OPENAI_API_KEY").ok(),
                anthropic_api_key: std::env::var("ANTHROPIC_API_KEY").ok(),
                news_api_key: std::env::var("NEWS_API_KEY").ok(),
                finnhub_api_key: std::env::var("FINNHUB_API_KEY").ok(),
                reddit_client_id: std::env::var("REDDIT_CLIENT_ID").ok(),
                reddit_client_secret: std::env::var("REDDIT_CLIENT_SECRET").ok(),
                reddit_user_agent: std::env::var("REDDIT_USER_AGENT")
                    .ok()
                    .filter(|s| !s.trim().is_empty())
                    .unwrap_or_else(|| DEFAULT_REDDIT_USER_AGENT.to_string()),
                subreddits: parse_list(std::env::var("FINTREND_SUBREDDITS").ok(), DEFAULT_SUBREDDITS),
                http_timeout_secs,
            })
        }

        pub fn require_database_url(&self) -> anyhow::Result<&str> {
            self.database_url
                .as_deref()
                .context("DATABASE_URL is required")
        }

        pub fn require_openai_api_key(&self) -> anyhow::Result<&str> {
            self.openai_api_key
                .as_deref()
                .context("OPENAI_API_KEY is required")
        }

        pub fn require_anthropic_api_key(&self) -> anyhow::Result<&str> {
            self.anthropic_api_key
                .as_deref()
                .context("ANTHROPIC_API_KEY is required")
        }

        pub fn require_reddit_credentials(&self) -> anyhow::Result<(&str, &str)> {
            let id = self
                .reddit_client_id
                .as_deref()
                .context("REDDIT_CLIENT_ID is required")?;
            let secret = self
                .reddit_client_secret
                .as_deref()
                .context("REDDIT_CLIENT_SECRET is required")?;
            Ok((id, secret))
        }
    }

    pub(crate) fn parse_list(raw: Option<String>, default: &[&str]) -> Vec<String> {
        let parsed: Vec<String> = raw
            .as_deref()
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();

        if parsed.is_empty() {
            default.iter().map(|s| s.to_string()).collect()
        } else {
            parsed
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn parse_list_falls_back_to_default() {
            assert_eq!(parse_list(None, &["a", "b"]), vec!["a", "b"]);
            assert_eq!(parse_list(Some(" , ".to_string()), &["a"]), vec!["a"]);
        }

        #[test]
        fn parse_list_trims_entries() {
            assert_eq!(
                parse_list(Some("stocks, options ,".to_string()), &["a"]),
                vec!["stocks", "options"]
            );
        }
    }
}
