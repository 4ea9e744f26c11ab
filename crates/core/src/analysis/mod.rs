//! LLM-backed stages. Each builds one prompt, calls the model through the retry policy and
//! parses the reply defensively.

pub mod breakout;
pub mod sentiment;
pub mod stock_summary;

use crate::llm::error::LlmDiagnosticsError;
use crate::llm::json::parse_object;
use crate::llm::retry::{complete_with_retry, RetryPolicy};
use crate::llm::{CompletionRequest, LlmClient};
use serde_json::Value;

/// Runs a JSON completion, parses the reply into an object and hands it to `decode`. A reply
/// that fails either step keeps the model's text, byte for byte, on the error as
/// `LlmDiagnosticsError`.
pub(crate) async fn request_object<T>(
    llm: &dyn LlmClient,
    policy: &RetryPolicy,
    stage: &'static str,
    request: &CompletionRequest,
    decode: impl FnOnce(Value) -> anyhow::Result<T>,
) -> anyhow::Result<T> {
    let text = complete_with_retry(llm, request, policy).await?;
    parse_object(&text).and_then(decode).map_err(|err| {
        anyhow::Error::new(LlmDiagnosticsError {
            provider: llm.provider(),
            stage,
            detail: format!("{err:#}"),
            raw_output: Some(text),
            raw_response_json: None,
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::error::raw_output_of;
    use crate::testing::ScriptedLlm;
    use anyhow::Context;
    use std::time::Duration;

    fn policy() -> RetryPolicy {
        RetryPolicy {
            max_attempts: 1,
            backoff: Duration::ZERO,
        }
    }

    #[tokio::test]
    async fn fenced_reply_is_parsed_from_the_unmodified_text() {
        let reply = "Here is the analysis:\n```json\n{\"score\": 0.5}\n```";
        let llm = ScriptedLlm::new(vec![Ok(reply.to_string())]);
        let request = CompletionRequest::json("system", "prompt".to_string());

        let score = request_object(&llm, &policy(), "test", &request, |v| {
            v["score"].as_f64().context("score missing")
        })
        .await
        .unwrap();
        assert_eq!(score, 0.5);
    }

    #[tokio::test]
    async fn decode_failure_keeps_prose_and_fences_in_raw_output() {
        let reply = "Sure!\n```json\n{\"score\": \"high\"}\n```\nHope that helps.";
        let llm = ScriptedLlm::new(vec![Ok(reply.to_string())]);
        let request = CompletionRequest::json("system", "prompt".to_string());

        let err = request_object(&llm, &policy(), "test", &request, |v| {
            v["score"].as_f64().context("score is not a number")
        })
        .await
        .unwrap_err();

        assert_eq!(raw_output_of(&err), Some(reply));
        assert!(format!("{err:#}").contains("score is not a number"));
    }
}
