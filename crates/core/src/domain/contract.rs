//! Shapes the LLM is asked to emit, and their conversion into domain types.
//!
//! The model is never trusted: numbers are clamped, malformed list entries are dropped and
//! optional prose fields fall back to empty strings.

use crate::domain::analysis::{Recommendation, StockSummary};
use crate::domain::recommendation::{BreakoutCandidate, BreakoutReport};
use crate::domain::sentiment::{ItemScore, SentimentResult};
use anyhow::{ensure, Context};
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeSet;

#[derive(Debug, Clone, Deserialize)]
pub struct LlmSentiment {
    pub overall_sentiment: f64,
    #[serde(default)]
    pub key_themes: Value,
    #[serde(default)]
    pub item_sentiments: Vec<Value>,
    #[serde(default)]
    pub retail_investor_outlook: Value,
    #[serde(default)]
    pub analysis_summary: Value,
}

impl LlmSentiment {
    pub fn from_value(v: Value) -> anyhow::Result<Self> {
        serde_json::from_value(v).context("LLM output does not match the sentiment schema")
    }

    pub fn validate_and_into_result(self) -> anyhow::Result<SentimentResult> {
        ensure!(
            self.overall_sentiment.is_finite(),
            "overall_sentiment must be finite (got {})",
            self.overall_sentiment
        );

        let item_scores = self
            .item_sentiments
            .iter()
            .filter_map(item_score)
            .collect();

        let outlook = Some(text(&self.retail_investor_outlook)).filter(|s| !s.is_empty());

        Ok(SentimentResult {
            overall_sentiment: self.overall_sentiment.clamp(-1.0, 1.0),
            key_themes: text_list(&self.key_themes),
            item_scores,
            outlook,
            summary: text(&self.analysis_summary),
        })
    }
}

fn item_score(v: &Value) -> Option<ItemScore> {
    let id = v.get("id")?.as_str()?.trim().to_string();
    if id.is_empty() {
        return None;
    }
    let score = v.get("score")?.as_f64().filter(|s| s.is_finite())?;
    Some(ItemScore {
        id,
        score: score.clamp(-1.0, 1.0),
        note: v.get("note").map(text).unwrap_or_default(),
    })
}

/// Parses the breakout response. Candidates without a ticker, or whose confidence is not a
/// number in [0, 1], are dropped. Repeated tickers keep their first occurrence.
pub fn parse_breakout_report(v: &Value) -> anyhow::Result<BreakoutReport> {
    ensure!(v.is_object(), "breakout response must be a JSON object");

    let raw_candidates = match v.get("breakout_candidates") {
        Some(Value::Array(items)) => items.as_slice(),
        Some(Value::Null) | None => &[],
        Some(other) => anyhow::bail!("breakout_candidates must be an array (got {other})"),
    };

    let mut seen = BTreeSet::new();
    let mut candidates = Vec::with_capacity(raw_candidates.len());
    for raw in raw_candidates {
        let Some(candidate) = breakout_candidate(raw) else {
            tracing::debug!(candidate = %raw, "dropping malformed breakout candidate");
            continue;
        };
        if seen.insert(candidate.ticker.clone()) {
            candidates.push(candidate);
        }
    }

    Ok(BreakoutReport {
        candidates,
        market_assessment: v.get("market_assessment").map(text).unwrap_or_default(),
        sectors_to_watch: v.get("sectors_to_watch").map(text_list).unwrap_or_default(),
    })
}

fn breakout_candidate(v: &Value) -> Option<BreakoutCandidate> {
    let ticker = v.get("ticker")?.as_str()?.trim().to_ascii_uppercase();
    if ticker.is_empty() {
        return None;
    }

    let confidence_score = v.get("confidence_score")?.as_f64()?;
    if !(0.0..=1.0).contains(&confidence_score) {
        return None;
    }

    Some(BreakoutCandidate {
        ticker,
        value_proposition: v.get("value_proposition").map(text).unwrap_or_default(),
        confidence_score,
        key_catalysts: v.get("key_catalysts").map(text_list).unwrap_or_default(),
    })
}

pub fn parse_stock_summary(v: &Value) -> anyhow::Result<StockSummary> {
    ensure!(v.is_object(), "stock summary response must be a JSON object");

    let number = |key: &str| v.get(key).and_then(Value::as_f64).filter(|n| n.is_finite());
    let field = |key: &str| v.get(key).map(text).unwrap_or_default();
    let list = |key: &str| v.get(key).map(text_list).unwrap_or_default();

    Ok(StockSummary {
        overall_sentiment_score: number("overall_sentiment_score")
            .unwrap_or(0.0)
            .clamp(-1.0, 1.0),
        summary: field("summary"),
        detailed_analysis: field("detailed_analysis"),
        key_drivers: list("key_drivers"),
        risks: list("risks"),
        opportunities: list("opportunities"),
        is_breakout_candidate: v
            .get("is_breakout_candidate")
            .and_then(Value::as_bool)
            .unwrap_or(false),
        breakout_reasoning: field("breakout_reasoning"),
        recommendation: v
            .get("recommendation")
            .and_then(Value::as_str)
            .and_then(Recommendation::parse),
        confidence_score: number("confidence_score").unwrap_or(0.0).clamp(0.0, 1.0),
    })
}

/// Flattens a prose field. Models sometimes answer with a one-element list instead of a string.
fn text(v: &Value) -> String {
    match v {
        Value::String(s) => s.trim().to_string(),
        Value::Array(items) => items
            .iter()
            .map(text)
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(" "),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn text_list(v: &Value) -> Vec<String> {
    match v {
        Value::Array(items) => items
            .iter()
            .map(text)
            .filter(|s| !s.is_empty())
            .collect(),
        Value::String(s) if !s.trim().is_empty() => vec![s.trim().to_string()],
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn sentiment_clamps_and_keeps_structured_scores() {
        let v = json!({
            "overall_sentiment": 1.7,
            "key_themes": ["earnings", "guidance"],
            "item_sentiments": [
                {"id": "A1", "score": 0.5, "note": "beat estimates"},
                {"id": "A2", "score": "very good"},
                {"score": 0.1},
                {"id": "A3", "score": -3.0}
            ],
            "analysis_summary": "Mostly positive."
        });
        let result = LlmSentiment::from_value(v)
            .unwrap()
            .validate_and_into_result()
            .unwrap();

        assert_eq!(result.overall_sentiment, 1.0);
        assert_eq!(result.key_themes, vec!["earnings", "guidance"]);
        assert_eq!(result.item_scores.len(), 2);
        assert_eq!(result.item_scores[0].note, "beat estimates");
        assert_eq!(result.item_scores[1].score, -1.0);
        assert_eq!(result.summary, "Mostly positive.");
        assert_eq!(result.outlook, None);
    }

    #[test]
    fn sentiment_requires_numeric_overall() {
        let v = json!({"overall_sentiment": "positive"});
        assert!(LlmSentiment::from_value(v).is_err());
    }

    #[test]
    fn breakout_drops_malformed_candidates() {
        let v = json!({
            "breakout_candidates": [
                {"ticker": "gme", "value_proposition": "Squeeze setup", "confidence_score": 0.8,
                 "key_catalysts": ["short interest"]},
                {"ticker": "AMC", "confidence_score": "high"},
                {"value_proposition": "no ticker", "confidence_score": 0.9},
                {"ticker": "  ", "confidence_score": 0.4},
                {"ticker": "PLTR", "confidence_score": 1.5},
                {"ticker": "NVDA", "confidence_score": 1},
                {"ticker": "GME", "confidence_score": 0.2}
            ],
            "market_assessment": "Risk-on week.",
            "sectors_to_watch": ["semis"]
        });

        let report = parse_breakout_report(&v).unwrap();
        let tickers: Vec<_> = report.candidates.iter().map(|c| c.ticker.as_str()).collect();
        assert_eq!(tickers, vec!["GME", "NVDA"]);
        assert_eq!(report.candidates[0].confidence_score, 0.8);
        assert_eq!(report.candidates[0].key_catalysts, vec!["short interest"]);
        assert_eq!(report.market_assessment, "Risk-on week.");
        assert_eq!(report.sectors_to_watch, vec!["semis"]);
    }

    #[test]
    fn breakout_tolerates_missing_candidate_list() {
        let report = parse_breakout_report(&json!({"market_assessment": ["Quiet."]})).unwrap();
        assert!(report.candidates.is_empty());
        assert_eq!(report.market_assessment, "Quiet.");
    }

    #[test]
    fn breakout_rejects_non_object() {
        assert!(parse_breakout_report(&json!([1, 2])).is_err());
        assert!(parse_breakout_report(&json!({"breakout_candidates": "GME"})).is_err());
    }

    #[test]
    fn stock_summary_defaults_missing_fields() {
        let v = json!({
            "overall_sentiment_score": -0.3,
            "summary": "Under pressure.",
            "is_breakout_candidate": true,
            "recommendation": "Sell",
            "confidence_score": 4
        });
        let s = parse_stock_summary(&v).unwrap();
        assert_eq!(s.overall_sentiment_score, -0.3);
        assert!(s.is_breakout_candidate);
        assert_eq!(s.recommendation, Some(Recommendation::Sell));
        assert_eq!(s.confidence_score, 1.0);
        assert!(s.detailed_analysis.is_empty());
        assert!(s.risks.is_empty());
    }
}
