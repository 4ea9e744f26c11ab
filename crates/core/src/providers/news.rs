use crate::domain::content::Article;
use crate::providers::NewsProvider;
use chrono::NaiveDate;
use std::cmp::Reverse;
use std::collections::HashSet;
use std::sync::Arc;

/// Queries every provider in turn and merges the results. A provider that fails contributes
/// nothing; an empty result is a normal outcome.
pub async fn fetch_aggregated_news(
    providers: &[Arc<dyn NewsProvider>],
    ticker: &str,
    as_of_date: NaiveDate,
    lookback_days: u32,
    limit: usize,
) -> Vec<Article> {
    let mut batches = Vec::with_capacity(providers.len());
    for provider in providers {
        match provider.fetch_news(ticker, as_of_date, lookback_days).await {
            Ok(articles) => batches.push(articles),
            Err(err) => {
                tracing::warn!(
                    provider = provider.provider_name(),
                    %ticker,
                    error = %err,
                    "news fetch failed; skipping provider"
                );
            }
        }
    }
    merge_articles(batches, limit)
}

/// The single merge policy for news: drop untitled articles, dedupe by URL (falling back to
/// the lowercased title), newest first with undated articles last, then truncate.
pub fn merge_articles(batches: Vec<Vec<Article>>, limit: usize) -> Vec<Article> {
    let mut seen = HashSet::new();
    let mut merged: Vec<Article> = batches
        .into_iter()
        .flatten()
        .filter(|a| !a.title.trim().is_empty())
        .filter(|a| seen.insert(dedupe_key(a)))
        .collect();

    // Stable sort keeps provider order among equal timestamps.
    merged.sort_by_key(|a| (a.published_at.is_none(), Reverse(a.published_at)));
    merged.truncate(limit);
    merged
}

fn dedupe_key(a: &Article) -> String {
    let url = a.url.trim();
    if url.is_empty() {
        format!("title:{}", a.title.trim().to_lowercase())
    } else {
        format!("url:{url}")
    }
}
