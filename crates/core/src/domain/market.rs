use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    pub symbol: String,
    pub price: f64,
    pub previous_close: Option<f64>,
    pub fifty_day_average: Option<f64>,
    pub currency: Option<String>,
    pub exchange: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DailyClose {
    pub date: NaiveDate,
    pub close: f64,
}

/// Trailing-window move of a tracked market index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexSnapshot {
    pub symbol: String,
    pub change_pct: f64,
    pub last: f64,
}

impl IndexSnapshot {
    /// Builds a snapshot from oldest-first closes. Needs at least one positive first close.
    pub fn from_closes(symbol: &str, closes: &[DailyClose]) -> Option<Self> {
        let first = closes.first()?.close;
        let last = closes.last()?.close;
        if !first.is_finite() || !last.is_finite() || first <= 0.0 {
            return None;
        }

        Some(Self {
            symbol: symbol.to_string(),
            change_pct: (last / first - 1.0) * 100.0,
            last,
        })
    }
}

/// Lookback windows supported by price-history providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryRange {
    FiveDays,
    OneMonth,
    ThreeMonths,
    SixMonths,
    OneYear,
}

impl HistoryRange {
    pub fn from_lookback_days(days: u32) -> Self {
        match days {
            0..=5 => Self::FiveDays,
            6..=31 => Self::OneMonth,
            32..=92 => Self::ThreeMonths,
            93..=183 => Self::SixMonths,
            _ => Self::OneYear,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FiveDays => "5d",
            Self::OneMonth => "1mo",
            Self::ThreeMonths => "3mo",
            Self::SixMonths => "6mo",
            Self::OneYear => "1y",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(day: u32, close: f64) -> DailyClose {
        DailyClose {
            date: NaiveDate::from_ymd_opt(2026, 3, day).unwrap(),
            close,
        }
    }

    #[test]
    fn snapshot_uses_first_and_last_close() {
        let closes = [close(2, 400.0), close(3, 390.0), close(6, 410.0)];
        let snap = IndexSnapshot::from_closes("SPY", &closes).unwrap();
        assert_eq!(snap.symbol, "SPY");
        assert_eq!(snap.last, 410.0);
        assert!((snap.change_pct - 2.5).abs() < 1e-9);
    }

    #[test]
    fn snapshot_requires_data() {
        assert!(IndexSnapshot::from_closes("QQQ", &[]).is_none());
        assert!(IndexSnapshot::from_closes("QQQ", &[close(2, 0.0), close(3, 1.0)]).is_none());
    }

    #[test]
    fn lookback_maps_to_provider_ranges() {
        assert_eq!(HistoryRange::from_lookback_days(5), HistoryRange::FiveDays);
        assert_eq!(HistoryRange::from_lookback_days(30).as_str(), "1mo");
        assert_eq!(HistoryRange::from_lookback_days(400), HistoryRange::OneYear);
    }
}
