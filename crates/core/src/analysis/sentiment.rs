use crate::analysis::request_object;
use crate::domain::content::{Article, Post};
use crate::domain::contract::LlmSentiment;
use crate::domain::sentiment::{SentimentReport, SentimentResult};
use crate::llm::error::raw_output_of;
use crate::llm::retry::RetryPolicy;
use crate::llm::{CompletionRequest, LlmClient};
use std::sync::Arc;

/// Items beyond this are not sent to the model.
pub const MAX_ITEMS: usize = 10;

const SYSTEM_PROMPT: &str = "You are a financial sentiment analyst. Return ONLY valid JSON.";

/// Prompt-local identifier of the item at `index`: `A1`, `A2`, ... for articles, `P1`, ... for
/// posts. Item scores in the reply are keyed by it.
pub fn item_id(prefix: char, index: usize) -> String {
    format!("{prefix}{}", index + 1)
}

#[derive(Clone)]
pub struct SentimentSummarizer {
    llm: Arc<dyn LlmClient>,
    retry: RetryPolicy,
}

impl SentimentSummarizer {
    pub fn new(llm: Arc<dyn LlmClient>, retry: RetryPolicy) -> Self {
        Self { llm, retry }
    }

    pub async fn summarize_news(&self, articles: &[Article]) -> SentimentReport {
        if articles.is_empty() {
            return SentimentReport::Scored(SentimentResult::neutral("No news articles found"));
        }
        self.score("news_sentiment", news_prompt(articles)).await
    }

    pub async fn summarize_posts(&self, posts: &[Post]) -> SentimentReport {
        if posts.is_empty() {
            return SentimentReport::Scored(SentimentResult::neutral("No social posts found"));
        }
        self.score("social_sentiment", posts_prompt(posts)).await
    }

    async fn score(&self, stage: &'static str, prompt: String) -> SentimentReport {
        let request = CompletionRequest::json(SYSTEM_PROMPT, prompt);

        let parsed = request_object(self.llm.as_ref(), &self.retry, stage, &request, |v| {
            LlmSentiment::from_value(v).and_then(LlmSentiment::validate_and_into_result)
        })
        .await;

        match parsed {
            Ok(result) => SentimentReport::Scored(result),
            Err(err) => {
                tracing::warn!(stage, error = %format!("{err:#}"), "sentiment analysis failed");
                SentimentReport::Failed {
                    error: format!("{err:#}"),
                    raw_output: raw_output_of(&err).map(str::to_string),
                }
            }
        }
    }
}

fn news_prompt(articles: &[Article]) -> String {
    let items = articles
        .iter()
        .take(MAX_ITEMS)
        .enumerate()
        .map(|(i, a)| {
            let published = a
                .published_at
                .map(|t| t.to_rfc3339())
                .unwrap_or_else(|| "unknown".to_string());
            format!(
                "[{}] Title: {}\nSource: {}\nPublished: {}\nSummary: {}",
                item_id('A', i),
                a.title,
                a.source,
                published,
                a.excerpt.as_deref().unwrap_or("")
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n");

    format!(
        "Analyze the sentiment of these news articles about a stock. Rate the overall sentiment on a \
scale from -1 (very negative) to 1 (very positive). Score each article by its id.\n\n\
Articles:\n{items}\n\n{}",
        schema(false)
    )
}

fn posts_prompt(posts: &[Post]) -> String {
    let items = posts
        .iter()
        .take(MAX_ITEMS)
        .enumerate()
        .map(|(i, p)| {
            format!(
                "[{}] Title: {}\nSubreddit: r/{}\nScore: {}\nUpvote ratio: {}\nComments: {}",
                item_id('P', i),
                p.title,
                p.channel,
                p.score,
                p.upvote_ratio,
                p.num_comments
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n");

    format!(
        "Analyze the sentiment in these Reddit posts about a stock. Rate the overall sentiment on a \
scale from -1 (very negative) to 1 (very positive). Consider the popularity of posts (score and \
upvote ratio). Score each post by its id.\n\n\
Reddit Posts:\n{items}\n\n{}",
        schema(true)
    )
}

fn schema(with_outlook: bool) -> String {
    let mut lines = vec![
        "Return your analysis as a JSON object with exactly these keys:",
        "{",
        "  \"overall_sentiment\": <number between -1 and 1>,",
        "  \"key_themes\": [\"theme\", ...],",
        "  \"item_sentiments\": [{\"id\": \"<item id>\", \"score\": <number between -1 and 1>, \"note\": \"<one sentence>\"}, ...],",
    ];
    if with_outlook {
        lines.push("  \"retail_investor_outlook\": \"<how retail investors view this stock>\",");
    }
    lines.push("  \"analysis_summary\": \"<brief overall analysis>\"");
    lines.push("}");
    lines.join("\n")
}
