use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BreakoutCandidate {
    pub ticker: String,
    pub value_proposition: String,
    /// In [0, 1].
    pub confidence_score: f64,
    pub key_catalysts: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BreakoutReport {
    pub candidates: Vec<BreakoutCandidate>,
    pub market_assessment: String,
    pub sectors_to_watch: Vec<String>,
}

/// One row per (ticker, recommendation_date). Never updated after insert.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BreakoutRecommendation {
    pub id: Uuid,
    pub ticker: String,
    pub recommendation_date: NaiveDate,
    pub value_proposition: String,
    pub confidence_score: f64,
    pub price_at_recommendation: f64,
    pub key_catalysts: Vec<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewRecommendation {
    pub ticker: String,
    pub recommendation_date: NaiveDate,
    pub value_proposition: String,
    pub confidence_score: f64,
    pub price_at_recommendation: f64,
    pub key_catalysts: Vec<String>,
}

impl NewRecommendation {
    pub fn from_candidate(
        candidate: &BreakoutCandidate,
        recommendation_date: NaiveDate,
        price_at_recommendation: f64,
    ) -> Self {
        Self {
            ticker: candidate.ticker.clone(),
            recommendation_date,
            value_proposition: candidate.value_proposition.clone(),
            confidence_score: candidate.confidence_score,
            price_at_recommendation,
            key_catalysts: candidate.key_catalysts.clone(),
        }
    }

    pub fn into_recommendation(self, id: Uuid, created_at: DateTime<Utc>) -> BreakoutRecommendation {
        BreakoutRecommendation {
            id,
            ticker: self.ticker,
            recommendation_date: self.recommendation_date,
            value_proposition: self.value_proposition,
            confidence_score: self.confidence_score,
            price_at_recommendation: self.price_at_recommendation,
            key_catalysts: self.key_catalysts,
            created_at,
        }
    }
}
