//! Ticker extraction from free-text post titles.

pub mod mentions;

use crate::providers::QuoteProvider;
use regex::Regex;
use std::collections::BTreeSet;
use std::sync::OnceLock;

const DEFAULT_MAX_CANDIDATES: usize = 50;
const DEFAULT_STOP_WORDS: &[&str] = &[
    "THE", "AND", "FOR", "THIS", "THAT", "WITH", "FROM", "WHAT", "HAVE",
];
const DEFAULT_INDEX_FUNDS: &[&str] = &["SPY", "QQQ", "IWM", "DIA", "VTI"];

fn dollar_ticker_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\$[A-Za-z]{1,5}").expect("valid cashtag regex"))
}

fn bare_ticker_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\b[A-Z]{3,5}\b").expect("valid bare ticker regex"))
}

#[derive(Debug, Clone)]
pub struct ExtractorOptions {
    /// Upper bound on quote lookups per run.
    pub max_candidates: usize,
    pub stop_words: BTreeSet<String>,
    pub index_funds: BTreeSet<String>,
}

impl Default for ExtractorOptions {
    fn default() -> Self {
        Self {
            max_candidates: DEFAULT_MAX_CANDIDATES,
            stop_words: DEFAULT_STOP_WORDS.iter().map(|s| s.to_string()).collect(),
            index_funds: DEFAULT_INDEX_FUNDS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl ExtractorOptions {
    pub fn from_env() -> Self {
        let mut out = Self::default();

        if let Ok(s) = std::env::var("EXTRACTOR_MAX_CANDIDATES") {
            if let Ok(n) = s.parse::<usize>() {
                out.max_candidates = n;
            }
        }

        if let Ok(s) = std::env::var("EXTRACTOR_EXTRA_STOP_WORDS") {
            out.stop_words.extend(
                s.split(',')
                    .map(|w| w.trim().to_ascii_uppercase())
                    .filter(|w| !w.is_empty()),
            );
        }

        out
    }

    fn is_excluded(&self, token: &str) -> bool {
        self.stop_words.contains(token) || self.index_funds.contains(token)
    }
}

/// Every ticker-shaped token in one title: cashtags (prefix stripped, uppercased) and bare
/// 3-5 letter uppercase words.
pub fn ticker_tokens(title: &str) -> BTreeSet<String> {
    let dollar = dollar_ticker_re()
        .find_iter(title)
        .map(|m| m.as_str()[1..].to_ascii_uppercase());
    let bare = bare_ticker_re()
        .find_iter(title)
        .map(|m| m.as_str().to_string());
    dollar.chain(bare).collect()
}

/// Unvalidated candidates: the union of tokens over all titles minus stop words and index
/// funds.
pub fn candidate_tickers<S: AsRef<str>>(titles: &[S], options: &ExtractorOptions) -> BTreeSet<String> {
    titles
        .iter()
        .flat_map(|t| ticker_tokens(t.as_ref()))
        .filter(|t| !options.is_excluded(t))
        .collect()
}

/// Candidates that the quote provider recognizes. Lookup failures silently exclude the
/// candidate, so a provider outage yields an empty set ("no signal this cycle").
pub async fn extract_trending_tickers<S: AsRef<str>>(
    titles: &[S],
    quotes: &dyn QuoteProvider,
    options: &ExtractorOptions,
) -> BTreeSet<String> {
    let candidates = candidate_tickers(titles, options);
    let total = candidates.len();

    let mut validated = BTreeSet::new();
    let mut failures: usize = 0;
    for ticker in candidates.into_iter().take(options.max_candidates) {
        match quotes.quote(&ticker).await {
            Ok(Some(_)) => {
                validated.insert(ticker);
            }
            Ok(None) => {}
            Err(err) => {
                failures += 1;
                tracing::debug!(%ticker, error = %err, "quote lookup failed; excluding candidate");
            }
        }
    }

    tracing::info!(
        candidates = total,
        checked = total.min(options.max_candidates),
        validated = validated.len(),
        failures,
        "extracted trending tickers"
    );
    validated
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::StaticQuotes;

    #[test]
    fn tokens_cover_cashtags_and_bare_words() {
        let tokens = ticker_tokens("Loading $pltr and $Tsla calls, NVDA earnings. AI hype? US");
        let expected: BTreeSet<String> = ["PLTR", "TSLA", "NVDA"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(tokens, expected);
    }

    #[test]
    fn cashtags_may_be_short() {
        let tokens = ticker_tokens("$F and $GE are cheap");
        assert!(tokens.contains("F"));
        assert!(tokens.contains("GE"));
    }

    #[test]
    fn candidates_never_include_stop_words_or_index_funds() {
        let options = ExtractorOptions::default();
        let titles = [
            "THE market WITH SPY and QQQ",
            "$spy puts? THIS is WHAT happens",
            "$the $DIA $VTI IWM",
            "AMC and GME FROM here",
        ];
        let out = candidate_tickers(&titles, &options);
        for t in &out {
            assert!(!options.stop_words.contains(t), "{t} is a stop word");
            assert!(!options.index_funds.contains(t), "{t} is an index fund");
        }
        assert!(out.contains("AMC"));
        assert!(out.contains("GME"));
    }

    #[tokio::test]
    async fn validates_against_quotes() {
        // GME quotes, AAPL lookup errors, THE is a stop word.
        let quotes = StaticQuotes::new(&[("GME", 24.5)]).failing(&["AAPL"]);
        let titles = ["GME", "AAPL", "THE"];

        let out = extract_trending_tickers(&titles, &quotes, &ExtractorOptions::default()).await;
        let expected: BTreeSet<String> = ["GME".to_string()].into_iter().collect();
        assert_eq!(out, expected);
        assert!(!quotes.was_queried("THE"));
    }

    #[tokio::test]
    async fn unknown_tickers_are_excluded() {
        let quotes = StaticQuotes::new(&[("TSLA", 250.0)]);
        let titles = ["TSLA vs LOL", "YOLO on TSLA"];
        let out = extract_trending_tickers(&titles, &quotes, &ExtractorOptions::default()).await;
        assert_eq!(out.into_iter().collect::<Vec<_>>(), vec!["TSLA"]);
    }

    #[tokio::test]
    async fn lookup_outage_yields_empty_set() {
        let quotes = StaticQuotes::new(&[]).failing_all();
        let titles = ["GME AMC BBBY"];
        let out = extract_trending_tickers(&titles, &quotes, &ExtractorOptions::default()).await;
        assert!(out.is_empty());
    }

    #[tokio::test]
    async fn caps_lookups() {
        let quotes = StaticQuotes::new(&[("AAA", 1.0), ("BBB", 1.0), ("CCC", 1.0)]);
        let titles = ["CCC BBB AAA"];
        let options = ExtractorOptions {
            max_candidates: 2,
            ..Default::default()
        };
        let out = extract_trending_tickers(&titles, &quotes, &options).await;
        assert_eq!(out.into_iter().collect::<Vec<_>>(), vec!["AAA", "BBB"]);
        assert_eq!(quotes.query_count(), 2);
    }
}
