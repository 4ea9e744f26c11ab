use crate::domain::content::Post;
use crate::providers::SocialProvider;
use std::collections::HashSet;

const DEFAULT_FLAIRS: &[&str] = &["DD", "Discussion", "YOLO", "Technical Analysis"];
const DEFAULT_PHRASES: &[&str] = &[
    "to the moon",
    "going up",
    "bullish",
    "buy",
    "calls",
    "rocket",
    "🚀",
    "gain",
    "breakout",
    "squeeze",
    "short squeeze",
];

/// Posts whose title names the ticker, bare or as a cashtag (case-insensitive substring).
pub fn posts_mentioning(posts: Vec<Post>, ticker: &str) -> Vec<Post> {
    let needle = ticker.to_lowercase();
    posts
        .into_iter()
        .filter(|p| p.title.to_lowercase().contains(&needle))
        .collect()
}

pub fn dedupe_by_url(posts: Vec<Post>) -> Vec<Post> {
    let mut seen = HashSet::new();
    posts
        .into_iter()
        .filter(|p| seen.insert(p.url.clone()))
        .collect()
}

/// Flair and bullish-phrase filter used to surface breakout chatter.
#[derive(Debug, Clone)]
pub struct BreakoutPostFilter {
    pub flairs: Vec<String>,
    pub phrases: Vec<String>,
}

impl Default for BreakoutPostFilter {
    fn default() -> Self {
        Self {
            flairs: DEFAULT_FLAIRS.iter().map(|s| s.to_lowercase()).collect(),
            phrases: DEFAULT_PHRASES.iter().map(|s| s.to_lowercase()).collect(),
        }
    }
}

impl BreakoutPostFilter {
    pub fn matches(&self, post: &Post) -> bool {
        let has_flair = post.flair.as_deref().is_some_and(|flair| {
            let flair = flair.to_lowercase();
            self.flairs.iter().any(|f| flair.contains(&f.to_lowercase()))
        });
        if has_flair {
            return true;
        }

        let title = post.title.to_lowercase();
        let body = post.body.to_lowercase();
        self.phrases.iter().any(|phrase| {
            let phrase = phrase.to_lowercase();
            title.contains(&phrase) || body.contains(&phrase)
        })
    }
}

/// Keeps matching posts, dedupes by URL, orders by score and truncates.
pub fn filter_breakout_posts(posts: Vec<Post>, filter: &BreakoutPostFilter, limit: usize) -> Vec<Post> {
    let mut kept = dedupe_by_url(posts.into_iter().filter(|p| filter.matches(p)).collect());
    kept.sort_by(|a, b| b.score.cmp(&a.score));
    kept.truncate(limit);
    kept
}

/// Scans hot and new listings of every channel for breakout chatter. Channels that fail are
/// logged and skipped.
pub async fn fetch_breakout_posts(
    social: &dyn SocialProvider,
    channels: &[String],
    filter: &BreakoutPostFilter,
    limit: usize,
) -> Vec<Post> {
    let per_listing = u32::try_from(limit.saturating_mul(2)).unwrap_or(u32::MAX);
    let mut posts = Vec::new();
    for channel in channels {
        match social.hot(channel, per_listing).await {
            Ok(p) => posts.extend(p),
            Err(err) => tracing::warn!(%channel, error = %err, "hot listing failed; skipping"),
        }
        match social.latest(channel, per_listing).await {
            Ok(p) => posts.extend(p),
            Err(err) => tracing::warn!(%channel, error = %err, "new listing failed; skipping"),
        }
    }
    filter_breakout_posts(posts, filter, limit)
}
