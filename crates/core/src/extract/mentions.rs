use crate::extract::ticker_tokens;
use std::collections::{BTreeMap, BTreeSet};

/// Number of titles mentioning each ticker. A title counts once per ticker no matter how many
/// times it repeats the symbol.
pub fn mention_counts<S: AsRef<str>>(
    titles: &[S],
    tickers: &BTreeSet<String>,
) -> BTreeMap<String, usize> {
    let mut counts: BTreeMap<String, usize> = tickers.iter().map(|t| (t.clone(), 0)).collect();
    for title in titles {
        for token in ticker_tokens(title.as_ref()) {
            if let Some(count) = counts.get_mut(&token) {
                *count += 1;
            }
        }
    }
    counts
}

/// Most-mentioned first; ties broken alphabetically.
pub fn rank_trending(counts: &BTreeMap<String, usize>) -> Vec<String> {
    let mut ranked: Vec<(&String, &usize)> = counts.iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));
    ranked.into_iter().map(|(t, _)| t.clone()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn counts_titles_not_occurrences() {
        let titles = ["GME GME $gme", "AMC then GME", "Nothing here", "$amc"];
        let counts = mention_counts(&titles, &set(&["GME", "AMC", "TSLA"]));
        assert_eq!(counts["GME"], 2);
        assert_eq!(counts["AMC"], 2);
        assert_eq!(counts["TSLA"], 0);
    }

    #[test]
    fn ranks_by_count_then_name() {
        let titles = ["NVDA", "NVDA AMD", "TSLA", "AMD"];
        let counts = mention_counts(&titles, &set(&["AMD", "NVDA", "TSLA"]));
        assert_eq!(rank_trending(&counts), vec!["AMD", "NVDA", "TSLA"]);
    }
}
