// src/services/market.rs
use async_trait::async_trait;
use chrono::{Duration, NaiveDate, Utc};
use csv::Reader;
use log::{info, warn};
use reqwest::Client;

use super::providers::PriceHistoryProvider;
use crate::error::{InsightsError, Result};
use crate::models::PricePoint;

const PROVIDER: &str = "stooq";

/// Daily history from Stooq's CSV download endpoint.
pub struct StooqPriceHistory {
    client: Client,
    base_url: String,
}

impl StooqPriceHistory {
    pub fn new(client: Client) -> Self {
        Self::with_base_url(client, "https://stooq.com")
    }

    pub fn with_base_url(client: Client, base_url: impl Into<String>) -> Self {
        StooqPriceHistory {
            client,
            base_url: base_url.into(),
        }
    }
}

/// Stooq wants `aapl.us`; anything already carrying a market suffix is left alone.
fn stooq_symbol(symbol: &str) -> String {
    let s = symbol.trim().to_ascii_lowercase();
    if s.contains('.') {
        s
    } else {
        format!("{}.us", s)
    }
}

/// Parses `Date,Open,High,Low,Close,Volume` rows into an ascending close series.
/// Rows with an unparseable date or a non-positive close are dropped.
pub fn parse_stooq_csv(csv_text: &str) -> Result<Vec<PricePoint>> {
    let mut rdr = Reader::from_reader(csv_text.as_bytes());

    let headers = rdr.headers().map_err(|e| InsightsError::provider(PROVIDER, e))?.clone();
    let idx_date = headers
        .iter()
        .position(|h| h.trim() == "Date")
        .ok_or_else(|| InsightsError::provider(PROVIDER, "no 'Date' column in CSV"))?;
    let idx_close = headers
        .iter()
        .position(|h| h.trim() == "Close")
        .ok_or_else(|| InsightsError::provider(PROVIDER, "no 'Close' column in CSV"))?;

    let mut points = Vec::new();
    let mut skipped = 0usize;
    for record in rdr.records() {
        let row = record.map_err(|e| InsightsError::provider(PROVIDER, e))?;
        let date = row.get(idx_date).and_then(|d| NaiveDate::parse_from_str(d.trim(), "%Y-%m-%d").ok());
        let close = row.get(idx_close).and_then(|c| c.trim().parse::<f64>().ok());
        match (date, close) {
            (Some(date), Some(price)) if price.is_finite() && price > 0.0 => {
                points.push(PricePoint::new(date, price));
            }
            _ => skipped += 1,
        }
    }

    if skipped > 0 {
        warn!("Skipped {} malformed rows in price history", skipped);
    }
    points.sort_by_key(|p| p.date);
    points.dedup_by_key(|p| p.date);
    Ok(points)
}

#[async_trait]
impl PriceHistoryProvider for StooqPriceHistory {
    async fn fetch_series(&self, symbol: &str) -> Result<Vec<PricePoint>> {
        let url = format!("{}/q/d/l/?s={}&i=d", self.base_url, stooq_symbol(symbol));
        info!("Fetching price history CSV from URL: {}", url);

        let csv_text = self
            .client
            .get(&url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| InsightsError::provider(PROVIDER, e))?
            .text()
            .await
            .map_err(|e| InsightsError::provider(PROVIDER, e))?;

        if csv_text.trim().eq_ignore_ascii_case("no data") {
            return Err(InsightsError::provider(PROVIDER, format!("no data for symbol {}", symbol)));
        }

        let points = parse_stooq_csv(&csv_text)?;
        info!("Fetched {} daily closes for {}", points.len(), symbol);
        Ok(points)
    }

    fn name(&self) -> &'static str {
        PROVIDER
    }
}

/// Deterministic random-walk-ish series ending today, for running without a
/// market data account.
pub struct MockPriceHistory {
    pub days: usize,
    pub start_price: f64,
}

impl Default for MockPriceHistory {
    fn default() -> Self {
        MockPriceHistory {
            days: 90,
            start_price: 150.0,
        }
    }
}

impl MockPriceHistory {
    pub fn series_ending(&self, end: NaiveDate) -> Vec<PricePoint> {
        let mut price = self.start_price;
        (0..self.days)
            .map(|i| {
                let t = i as f64;
                price += 2.5 * (t * 0.7).sin() + 0.4 * (t * 1.9).cos();
                let date = end - Duration::days((self.days - 1 - i) as i64);
                PricePoint::new(date, (price * 100.0).round() / 100.0)
            })
            .collect()
    }
}

#[async_trait]
impl PriceHistoryProvider for MockPriceHistory {
    async fn fetch_series(&self, symbol: &str) -> Result<Vec<PricePoint>> {
        info!("Generating mock price history for {}", symbol);
        Ok(self.series_ending(Utc::now().date_naive()))
    }

    fn name(&self) -> &'static str {
        "mock-prices"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_and_sorts_stooq_rows() {
        let csv = "Date,Open,High,Low,Close,Volume\n\
                   2024-07-22,1,1,1,154.5,100\n\
                   2024-07-20,1,1,1,152.8,100\n\
                   2024-07-21,1,1,1,155.2,100\n";
        let points = parse_stooq_csv(csv).unwrap();
        let closes: Vec<f64> = points.iter().map(|p| p.price).collect();
        assert_eq!(closes, vec![152.8, 155.2, 154.5]);
        assert_eq!(points[0].date, NaiveDate::from_ymd_opt(2024, 7, 20).unwrap());
    }

    #[test]
    fn drops_malformed_and_non_positive_rows() {
        let csv = "Date,Open,High,Low,Close,Volume\n\
                   2024-07-20,1,1,1,152.8,100\n\
                   not-a-date,1,1,1,150.0,100\n\
                   2024-07-21,1,1,1,0,100\n\
                   2024-07-22,1,1,1,,100\n";
        let points = parse_stooq_csv(csv).unwrap();
        assert_eq!(points.len(), 1);
    }

    #[test]
    fn missing_close_column_is_a_provider_error() {
        let err = parse_stooq_csv("Date,Open\n2024-07-20,1\n").unwrap_err();
        assert!(matches!(err, InsightsError::ProviderUnavailable { provider: "stooq", .. }));
    }

    #[test]
    fn symbol_gets_us_suffix() {
        assert_eq!(stooq_symbol("AAPL"), "aapl.us");
        assert_eq!(stooq_symbol("vod.uk"), "vod.uk");
    }

    #[test]
    fn mock_series_is_ascending_and_positive() {
        let end = NaiveDate::from_ymd_opt(2024, 7, 22).unwrap();
        let series = MockPriceHistory::default().series_ending(end);
        assert_eq!(series.len(), 90);
        assert_eq!(series.last().unwrap().date, end);
        assert!(series.windows(2).all(|w| w[0].date < w[1].date));
        assert!(series.iter().all(|p| p.price > 0.0));
    }
}
