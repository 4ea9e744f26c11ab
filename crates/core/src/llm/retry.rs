use crate::llm::{CompletionRequest, LlmClient};
use std::time::Duration;

const DEFAULT_MAX_ATTEMPTS: u32 = 3;
const DEFAULT_BACKOFF_SECS: u64 = 2;

#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    /// Fixed delay between attempts.
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            backoff: Duration::from_secs(DEFAULT_BACKOFF_SECS),
        }
    }
}

impl RetryPolicy {
    pub fn from_env() -> Self {
        let mut out = Self::default();

        if let Ok(s) = std::env::var("LLM_MAX_ATTEMPTS") {
            if let Ok(n) = s.parse::<u32>() {
                out.max_attempts = n;
            }
        }

        if let Ok(s) = std::env::var("LLM_RETRY_BACKOFF_SECS") {
            if let Ok(n) = s.parse::<u64>() {
                out.backoff = Duration::from_secs(n);
            }
        }

        out
    }
}

pub async fn complete_with_retry(
    client: &dyn LlmClient,
    request: &CompletionRequest,
    policy: &RetryPolicy,
) -> anyhow::Result<String> {
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt: u32 = 0;
    loop {
        attempt += 1;
        match client.complete(request).await {
            Ok(text) => return Ok(text),
            Err(err) => {
                if attempt >= max_attempts {
                    tracing::error!(
                        attempt,
                        provider = client.provider().as_str(),
                        error = %err,
                        "LLM call failed; giving up"
                    );
                    return Err(err);
                }
                tracing::warn!(
                    attempt,
                    max_attempts,
                    backoff = ?policy.backoff,
                    provider = client.provider().as_str(),
                    error = %err,
                    "LLM call failed; retrying"
                );
                tokio::time::sleep(policy.backoff).await;
            }
        }
    }
}
