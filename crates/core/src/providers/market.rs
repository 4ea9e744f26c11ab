use crate::domain::market::{HistoryRange, IndexSnapshot};
use crate::providers::PriceHistoryProvider;

/// Trailing-window snapshot of each tracked index. Indices whose history cannot be fetched
/// are logged and left out.
pub async fn index_snapshots(
    history: &dyn PriceHistoryProvider,
    indices: &[String],
    range: HistoryRange,
) -> Vec<IndexSnapshot> {
    let mut out = Vec::with_capacity(indices.len());
    for symbol in indices {
        match history.daily_closes(symbol, range).await {
            Ok(closes) => match IndexSnapshot::from_closes(symbol, &closes) {
                Some(snapshot) => out.push(snapshot),
                None => tracing::warn!(%symbol, "index history empty; skipping"),
            },
            Err(err) => tracing::error!(%symbol, error = %err, "index history fetch failed"),
        }
    }
    out
}
