pub mod anthropic;
pub mod error;
pub mod json;
pub mod openai;
pub mod retry;

use crate::config::Settings;
use std::sync::Arc;

/// A single black-box completion. `json` asks the backend for a bare JSON object.
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub system: Option<String>,
    pub prompt: String,
    pub json: bool,
}

impl CompletionRequest {
    pub fn json(system: &str, prompt: String) -> Self {
        Self {
            system: Some(system.to_string()),
            prompt,
            json: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    Anthropic,
    OpenAI,
}

impl Provider {
    pub fn parse(s: &str) -> anyhow::Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "anthropic" => Ok(Self::Anthropic),
            "openai" => Ok(Self::OpenAI),
            other => anyhow::bail!("unknown LLM_PROVIDER: {other} (expected openai or anthropic)"),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Anthropic => "anthropic",
            Self::OpenAI => "openai",
        }
    }
}

#[async_trait::async_trait]
pub trait LlmClient: Send + Sync {
    fn provider(&self) -> Provider;

    async fn complete(&self, request: &CompletionRequest) -> anyhow::Result<String>;
}

/// Builds the client selected by `LLM_PROVIDER` (OpenAI when unset).
pub fn client_from_settings(settings: &Settings) -> anyhow::Result<Arc<dyn LlmClient>> {
    let provider = match settings.llm_provider.as_deref() {
        Some(s) => Provider::parse(s)?,
        None => Provider::OpenAI,
    };

    Ok(match provider {
        Provider::OpenAI => Arc::new(openai::OpenAiClient::from_settings(settings)?),
        Provider::Anthropic => Arc::new(anthropic::AnthropicClient::from_settings(settings)?),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_parses_case_insensitively() {
        assert_eq!(Provider::parse("OpenAI").unwrap(), Provider::OpenAI);
        assert_eq!(Provider::parse(" anthropic ").unwrap(), Provider::Anthropic);
        assert!(Provider::parse("llama").is_err());
    }
}
