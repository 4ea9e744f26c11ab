use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A news article normalized from any news provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Article {
    pub title: String,
    pub source: String,
    pub url: String,
    pub excerpt: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
}

/// A social-media post normalized from a discussion channel (a subreddit for Reddit).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub title: String,
    pub body: String,
    pub channel: String,
    pub score: i64,
    pub upvote_ratio: f64,
    pub num_comments: i64,
    pub created_at: DateTime<Utc>,
    pub url: String,
    pub flair: Option<String>,
}
