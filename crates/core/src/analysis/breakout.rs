use crate::analysis::request_object;
use crate::domain::analysis::PriorAnalysis;
use crate::domain::contract::parse_breakout_report;
use crate::domain::market::IndexSnapshot;
use crate::domain::recommendation::BreakoutReport;
use crate::llm::retry::RetryPolicy;
use crate::llm::{CompletionRequest, LlmClient};
use anyhow::Context;
use chrono::NaiveDate;
use std::collections::BTreeMap;
use std::sync::Arc;

pub const DEFAULT_MAX_TICKERS: usize = 20;

const SYSTEM_PROMPT: &str =
    "You identify short-term breakout candidates among trending US stocks. Return ONLY valid JSON.";

#[derive(Clone)]
pub struct BreakoutIdentifier {
    llm: Arc<dyn LlmClient>,
    retry: RetryPolicy,
    max_tickers: usize,
}

impl BreakoutIdentifier {
    pub fn new(llm: Arc<dyn LlmClient>, retry: RetryPolicy) -> Self {
        Self {
            llm,
            retry,
            max_tickers: DEFAULT_MAX_TICKERS,
        }
    }

    pub fn with_max_tickers(mut self, max_tickers: usize) -> Self {
        self.max_tickers = max_tickers;
        self
    }

    /// Ranks `tickers` (only the first `max_tickers` are sent) against the index snapshot and
    /// prior analyses. Malformed candidates in the reply are dropped.
    pub async fn identify(
        &self,
        as_of_date: NaiveDate,
        tickers: &[String],
        indices: &[IndexSnapshot],
        prior: &BTreeMap<String, PriorAnalysis>,
    ) -> anyhow::Result<BreakoutReport> {
        let tickers = &tickers[..tickers.len().min(self.max_tickers)];
        let prompt = breakout_prompt(as_of_date, tickers, indices, prior)?;
        let request = CompletionRequest::json(SYSTEM_PROMPT, prompt);

        let report = request_object(self.llm.as_ref(), &self.retry, "breakout", &request, |v| {
            parse_breakout_report(&v).context("invalid breakout response")
        })
        .await
        .context("breakout identification failed")?;

        tracing::info!(
            %as_of_date,
            requested = tickers.len(),
            candidates = report.candidates.len(),
            "breakout candidates identified"
        );
        Ok(report)
    }
}

fn breakout_prompt(
    as_of_date: NaiveDate,
    tickers: &[String],
    indices: &[IndexSnapshot],
    prior: &BTreeMap<String, PriorAnalysis>,
) -> anyhow::Result<String> {
    let market = serde_json::to_string_pretty(indices).context("index snapshot serialize failed")?;
    let prior = serde_json::to_string_pretty(prior).context("prior analyses serialize failed")?;

    let schema = [
        "{",
        "  \"breakout_candidates\": [",
        "    {",
        "      \"ticker\": \"XYZ\",",
        "      \"value_proposition\": \"<1-2 sentences on why this stock might break out>\",",
        "      \"confidence_score\": <number between 0 and 1>,",
        "      \"key_catalysts\": [\"...\"]",
        "    }",
        "  ],",
        "  \"market_assessment\": \"<current market conditions and how they affect these stocks>\",",
        "  \"sectors_to_watch\": [\"...\"]",
        "}",
    ]
    .join("\n");

    Ok(format!(
        "Date: {as_of_date}\n\
Analyze these trending stock tickers and identify which ones are most likely to be breakout \
candidates.\n\n\
Trending Tickers: {}\n\n\
Market Data (trailing change per index):\n{market}\n\n\
Recent Stock Analyses:\n{prior}\n\n\
For each potential breakout stock, explain why it might break out and assign a confidence score \
(0-1). Only use tickers from the trending list.\n\n\
Return your analysis in this JSON format:\n{schema}",
        tickers.join(", ")
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedLlm;
    use serde_json::json;
    use std::time::Duration;

    fn identifier(llm: Arc<ScriptedLlm>) -> BreakoutIdentifier {
        BreakoutIdentifier::new(
            llm,
            RetryPolicy {
                max_attempts: 1,
                backoff: Duration::ZERO,
            },
        )
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 2).unwrap()
    }

    #[tokio::test]
    async fn non_numeric_confidence_is_excluded() {
        let reply = json!({
            "breakout_candidates": [
                {"ticker": "PLTR", "value_proposition": "Gov contracts", "confidence_score": 0.8, "key_catalysts": ["earnings"]},
                {"ticker": "GME", "value_proposition": "Squeeze", "confidence_score": "high"},
                {"value_proposition": "No ticker", "confidence_score": 0.9}
            ],
            "market_assessment": "Risk-on.",
            "sectors_to_watch": ["Software"]
        });
        let llm = Arc::new(ScriptedLlm::new(vec![Ok(reply.to_string())]));
        let tickers = vec!["PLTR".to_string(), "GME".to_string()];

        let report = identifier(llm)
            .identify(date(), &tickers, &[], &BTreeMap::new())
            .await
            .unwrap();

        let got: Vec<_> = report.candidates.iter().map(|c| c.ticker.as_str()).collect();
        assert_eq!(got, vec!["PLTR"]);
        assert_eq!(report.sectors_to_watch, vec!["Software"]);
    }

    #[tokio::test]
    async fn prompt_carries_capped_tickers_indices_and_prior_analyses() {
        let llm = Arc::new(ScriptedLlm::new(vec![Ok(
            json!({"breakout_candidates": []}).to_string()
        )]));
        let tickers: Vec<String> = (0..25).map(|i| format!("T{i:02}")).collect();
        let indices = vec![IndexSnapshot {
            symbol: "SPY".to_string(),
            change_pct: 1.25,
            last: 512.0,
        }];
        let mut prior = BTreeMap::new();
        prior.insert(
            "T00".to_string(),
            PriorAnalysis {
                analysis_date: date(),
                sentiment_score: 0.3,
                mention_count: 7,
                summary: "Quiet week.".to_string(),
            },
        );

        let report = identifier(llm.clone())
            .identify(date(), &tickers, &indices, &prior)
            .await
            .unwrap();
        assert!(report.candidates.is_empty());

        let prompt = &llm.prompts()[0];
        assert!(prompt.contains("T19"));
        assert!(!prompt.contains("T20"));
        assert!(prompt.contains("\"symbol\": \"SPY\""));
        assert!(prompt.contains("Quiet week."));
        assert!(prompt.contains("Date: 2026-03-02"));
    }
}
