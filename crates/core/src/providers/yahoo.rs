use crate::config::Settings;
use crate::domain::market::{DailyClose, HistoryRange, Quote};
use crate::providers::{build_http_client, truncate, PriceHistoryProvider, QuoteProvider};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use reqwest::StatusCode;
use serde::Deserialize;

const DEFAULT_BASE_URL: &str = "https://query1.finance.yahoo.com";
// Yahoo rejects requests without a browser-like agent.
const USER_AGENT: &str = "Mozilla/5.0 (compatible; fintrend/0.1)";

/// Yahoo Finance v8 chart client, used for quotes and daily history.
#[derive(Debug, Clone)]
pub struct YahooFinanceClient {
    http: reqwest::Client,
    base_url: String,
}

impl YahooFinanceClient {
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let base_url =
            std::env::var("YAHOO_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        Ok(Self {
            http: build_http_client(settings, USER_AGENT)?,
            base_url,
        })
    }

    /// `Ok(None)` when Yahoo does not recognize the symbol.
    async fn chart(&self, ticker: &str, range: HistoryRange) -> Result<Option<ChartResult>> {
        let url = format!(
            "{}/v8/finance/chart/{}",
            self.base_url.trim_end_matches('/'),
            ticker
        );
        let res = self
            .http
            .get(url)
            .query(&[("range", range.as_str()), ("interval", "1d")])
            .send()
            .await
            .with_context(|| format!("Yahoo chart request failed for {ticker}"))?;

        let status = res.status();
        let text = res
            .text()
            .await
            .context("failed to read Yahoo chart response")?;

        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            anyhow::bail!("Yahoo chart HTTP {status} for {ticker}: {}", truncate(&text, 300));
        }

        let parsed = serde_json::from_str::<ChartResponse>(&text)
            .with_context(|| format!("failed to parse Yahoo chart response for {ticker}"))?;
        Ok(parsed.into_result())
    }
}

#[async_trait::async_trait]
impl QuoteProvider for YahooFinanceClient {
    async fn quote(&self, ticker: &str) -> Result<Option<Quote>> {
        let Some(chart) = self.chart(ticker, HistoryRange::FiveDays).await? else {
            return Ok(None);
        };
        Ok(chart.quote())
    }
}

#[async_trait::async_trait]
impl PriceHistoryProvider for YahooFinanceClient {
    async fn daily_closes(&self, ticker: &str, range: HistoryRange) -> Result<Vec<DailyClose>> {
        let chart = self
            .chart(ticker, range)
            .await?
            .with_context(|| format!("Yahoo has no chart for {ticker}"))?;
        Ok(chart.daily_closes())
    }
}

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: ChartEnvelope,
}

#[derive(Debug, Deserialize)]
struct ChartEnvelope {
    #[serde(default)]
    result: Option<Vec<ChartResult>>,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    meta: ChartMeta,
    #[serde(default)]
    timestamp: Vec<i64>,
    #[serde(default)]
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChartMeta {
    #[serde(default)]
    symbol: String,
    #[serde(default)]
    regular_market_price: Option<f64>,
    #[serde(default)]
    previous_close: Option<f64>,
    #[serde(default)]
    chart_previous_close: Option<f64>,
    #[serde(default)]
    fifty_day_average: Option<f64>,
    #[serde(default)]
    currency: Option<String>,
    #[serde(default)]
    exchange_name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct Indicators {
    #[serde(default)]
    quote: Vec<QuoteSeries>,
}

#[derive(Debug, Default, Deserialize)]
struct QuoteSeries {
    #[serde(default)]
    close: Vec<Option<f64>>,
}

impl ChartResponse {
    fn into_result(self) -> Option<ChartResult> {
        self.chart.result?.into_iter().next()
    }
}

impl ChartResult {
    fn quote(&self) -> Option<Quote> {
        let price = self.meta.regular_market_price.filter(|p| p.is_finite())?;
        Some(Quote {
            symbol: self.meta.symbol.clone(),
            price,
            previous_close: self.meta.previous_close.or(self.meta.chart_previous_close),
            fifty_day_average: self.meta.fifty_day_average,
            currency: self.meta.currency.clone(),
            exchange: self.meta.exchange_name.clone(),
        })
    }

    /// Pairs timestamps with closes, skipping the nulls Yahoo emits for halted sessions.
    fn daily_closes(&self) -> Vec<DailyClose> {
        let Some(series) = self.indicators.quote.first() else {
            return Vec::new();
        };

        self.timestamp
            .iter()
            .zip(series.close.iter())
            .filter_map(|(ts, close)| {
                let close = (*close)?;
                let date = DateTime::<Utc>::from_timestamp(*ts, 0)?.date_naive();
                Some(DailyClose { date, close })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use serde_json::json;

    fn chart_fixture() -> serde_json::Value {
        json!({
            "chart": {
                "result": [{
                    "meta": {
                        "symbol": "SPY",
                        "currency": "USD",
                        "exchangeName": "PCX",
                        "regularMarketPrice": 512.5,
                        "chartPreviousClose": 505.0
                    },
                    "timestamp": [1772460000, 1772546400, 1772632800],
                    "indicators": {"quote": [{"close": [500.0, null, 512.5]}]}
                }],
                "error": null
            }
        })
    }

    #[test]
    fn extracts_quote_from_meta() {
        let parsed: ChartResponse = serde_json::from_value(chart_fixture()).unwrap();
        let quote = parsed.into_result().unwrap().quote().unwrap();
        assert_eq!(quote.symbol, "SPY");
        assert_eq!(quote.price, 512.5);
        assert_eq!(quote.previous_close, Some(505.0));
        assert_eq!(quote.exchange.as_deref(), Some("PCX"));
    }

    #[test]
    fn daily_closes_skip_nulls() {
        let parsed: ChartResponse = serde_json::from_value(chart_fixture()).unwrap();
        let closes = parsed.into_result().unwrap().daily_closes();
        assert_eq!(closes.len(), 2);
        assert_eq!(closes[0].close, 500.0);
        assert_eq!(closes[0].date, NaiveDate::from_ymd_opt(2026, 3, 2).unwrap());
        assert_eq!(closes[1].close, 512.5);
    }

    #[test]
    fn missing_price_means_unknown_ticker() {
        let v = json!({"chart": {"result": [{"meta": {"symbol": "ZZZZ"}}], "error": null}});
        let parsed: ChartResponse = serde_json::from_value(v).unwrap();
        assert!(parsed.into_result().unwrap().quote().is_none());

        let none = json!({"chart": {"result": null, "error": {"code": "Not Found"}}});
        let parsed: ChartResponse = serde_json::from_value(none).unwrap();
        assert!(parsed.into_result().is_none());
    }
}
