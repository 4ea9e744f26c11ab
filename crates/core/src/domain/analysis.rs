use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One row per (ticker, analysis_date). Never updated after insert.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockAnalysis {
    pub id: Uuid,
    pub ticker: String,
    pub analysis_date: NaiveDate,
    pub sentiment_score: f64,
    pub news_sentiment: f64,
    pub reddit_sentiment: f64,
    pub mention_count: i32,
    pub is_breakout: bool,
    pub summary: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewStockAnalysis {
    pub ticker: String,
    pub analysis_date: NaiveDate,
    pub sentiment_score: f64,
    pub news_sentiment: f64,
    pub reddit_sentiment: f64,
    pub mention_count: i32,
    pub is_breakout: bool,
    pub summary: String,
    pub news: Vec<NewsRecord>,
    pub posts: Vec<SocialPostRecord>,
}

impl NewStockAnalysis {
    pub fn into_analysis(self, id: Uuid, created_at: DateTime<Utc>) -> StockAnalysis {
        StockAnalysis {
            id,
            ticker: self.ticker,
            analysis_date: self.analysis_date,
            sentiment_score: self.sentiment_score,
            news_sentiment: self.news_sentiment,
            reddit_sentiment: self.reddit_sentiment,
            mention_count: self.mention_count,
            is_breakout: self.is_breakout,
            summary: self.summary,
            created_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewsRecord {
    pub title: String,
    pub url: String,
    pub source: String,
    pub published_at: Option<DateTime<Utc>>,
    pub sentiment_score: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SocialPostRecord {
    pub title: String,
    pub url: String,
    pub channel: String,
    pub posted_at: DateTime<Utc>,
    pub sentiment_score: f64,
    pub upvote_ratio: f64,
}

/// Compact view of the latest analysis, embedded in the breakout prompt.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriorAnalysis {
    pub analysis_date: NaiveDate,
    pub sentiment_score: f64,
    pub mention_count: i32,
    pub summary: String,
}

impl From<&StockAnalysis> for PriorAnalysis {
    fn from(a: &StockAnalysis) -> Self {
        Self {
            analysis_date: a.analysis_date,
            sentiment_score: a.sentiment_score,
            mention_count: a.mention_count,
            summary: a.summary.clone(),
        }
    }
}

/// Recommendation label produced by the stock-summary stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Recommendation {
    #[serde(rename = "Strong Buy")]
    StrongBuy,
    Buy,
    Hold,
    Sell,
    #[serde(rename = "Strong Sell")]
    StrongSell,
}

impl Recommendation {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "strong buy" => Some(Self::StrongBuy),
            "buy" => Some(Self::Buy),
            "hold" => Some(Self::Hold),
            "sell" => Some(Self::Sell),
            "strong sell" => Some(Self::StrongSell),
            _ => None,
        }
    }
}

/// Per-ticker LLM synthesis of news, social sentiment and market data.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StockSummary {
    pub overall_sentiment_score: f64,
    pub summary: String,
    pub detailed_analysis: String,
    pub key_drivers: Vec<String>,
    pub risks: Vec<String>,
    pub opportunities: Vec<String>,
    pub is_breakout_candidate: bool,
    pub breakout_reasoning: String,
    pub recommendation: Option<Recommendation>,
    pub confidence_score: f64,
}

impl StockSummary {
    pub fn combined_text(&self) -> String {
        format!("{}\n\n{}", self.summary, self.detailed_analysis)
    }
}
