use crate::analysis::request_object;
use crate::domain::analysis::StockSummary;
use crate::domain::contract::parse_stock_summary;
use crate::domain::market::Quote;
use crate::domain::sentiment::SentimentReport;
use crate::llm::retry::RetryPolicy;
use crate::llm::{CompletionRequest, LlmClient};
use anyhow::Context;
use serde_json::json;
use std::sync::Arc;

const SYSTEM_PROMPT: &str =
    "You are an equity research assistant combining news, social sentiment and market data. Return ONLY valid JSON.";

#[derive(Clone)]
pub struct StockSummarizer {
    llm: Arc<dyn LlmClient>,
    retry: RetryPolicy,
}

impl StockSummarizer {
    pub fn new(llm: Arc<dyn LlmClient>, retry: RetryPolicy) -> Self {
        Self { llm, retry }
    }

    pub async fn summarize(
        &self,
        ticker: &str,
        news: &SentimentReport,
        social: &SentimentReport,
        quote: &Quote,
    ) -> anyhow::Result<StockSummary> {
        let prompt = summary_prompt(ticker, news, social, quote)?;
        let request = CompletionRequest::json(SYSTEM_PROMPT, prompt);
        request_object(self.llm.as_ref(), &self.retry, "stock_summary", &request, |v| {
            parse_stock_summary(&v).context("invalid stock summary")
        })
        .await
        .with_context(|| format!("stock summary failed for {ticker}"))
    }
}

fn summary_prompt(
    ticker: &str,
    news: &SentimentReport,
    social: &SentimentReport,
    quote: &Quote,
) -> anyhow::Result<String> {
    let financials = json!({
        "current_price": quote.price,
        "previous_close": quote.previous_close,
        "fifty_day_avg": quote.fifty_day_average,
        "currency": quote.currency,
        "exchange": quote.exchange,
    });

    let news = serde_json::to_string_pretty(news).context("news report serialize failed")?;
    let social = serde_json::to_string_pretty(social).context("social report serialize failed")?;
    let financials =
        serde_json::to_string_pretty(&financials).context("financials serialize failed")?;

    let schema = [
        "{",
        "  \"overall_sentiment_score\": <number between -1 and 1>,",
        "  \"summary\": \"<concise 2-3 sentence summary>\",",
        "  \"detailed_analysis\": \"<paragraph with more detailed analysis>\",",
        "  \"key_drivers\": [\"...\"],",
        "  \"risks\": [\"...\"],",
        "  \"opportunities\": [\"...\"],",
        "  \"is_breakout_candidate\": <true|false>,",
        "  \"breakout_reasoning\": \"<explanation for the breakout assessment>\",",
        "  \"recommendation\": \"<one of: Strong Buy, Buy, Hold, Sell, Strong Sell>\",",
        "  \"confidence_score\": <number between 0 and 1>",
        "}",
    ]
    .join("\n");

    Ok(format!(
        "Create a comprehensive analysis for {ticker} stock based on recent news, Reddit sentiment \
and financial data.\n\n\
News Analysis:\n{news}\n\n\
Reddit Analysis:\n{social}\n\n\
Financial Data:\n{financials}\n\n\
Return your analysis in this JSON format:\n{schema}"
    ))
}
