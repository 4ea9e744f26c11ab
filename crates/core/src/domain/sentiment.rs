use serde::{Deserialize, Serialize};

/// Per-item score returned by the LLM, keyed by the id the prompt assigned to the item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemScore {
    pub id: String,
    pub score: f64,
    pub note: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentimentResult {
    /// Clamped to [-1, 1].
    pub overall_sentiment: f64,
    pub key_themes: Vec<String>,
    pub item_scores: Vec<ItemScore>,
    pub outlook: Option<String>,
    pub summary: String,
}

impl SentimentResult {
    pub fn neutral(summary: &str) -> Self {
        Self {
            overall_sentiment: 0.0,
            key_themes: Vec::new(),
            item_scores: Vec::new(),
            outlook: None,
            summary: summary.to_string(),
        }
    }
}

/// Outcome of a summarizer call. Failures are values, never errors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SentimentReport {
    Scored(SentimentResult),
    Failed {
        error: String,
        raw_output: Option<String>,
    },
}

impl SentimentReport {
    pub fn overall(&self) -> f64 {
        match self {
            Self::Scored(result) => result.overall_sentiment,
            Self::Failed { .. } => 0.0,
        }
    }

    pub fn score_for(&self, id: &str) -> f64 {
        match self {
            Self::Scored(result) => result
                .item_scores
                .iter()
                .find(|s| s.id == id)
                .map(|s| s.score)
                .unwrap_or(0.0),
            Self::Failed { .. } => 0.0,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }
}
