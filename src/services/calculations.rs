// src/services/calculations.rs
use log::{debug, warn};

use crate::config::IndicatorConfig;
use crate::models::{AnnotatedPricePoint, PerformanceSummary, PricePoint};

pub const TRADING_DAYS: f64 = 252.0;

#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorSeries {
    /// Starts at the first point carrying both SMA and RSI.
    pub points: Vec<AnnotatedPricePoint>,
    pub performance: Option<PerformanceSummary>,
}

impl IndicatorSeries {
    pub fn empty() -> Self {
        IndicatorSeries {
            points: Vec::new(),
            performance: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

fn calculate_average(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

/// Sample standard deviation; 0.0 below two values.
fn calculate_std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let mean = calculate_average(values);
    let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    var.sqrt()
}

/// Simple moving average aligned with `prices`: `None` for the first `window - 1` slots.
pub fn sma(prices: &[f64], window: usize) -> Vec<Option<f64>> {
    let mut out = vec![None; prices.len()];
    if window == 0 || prices.len() < window {
        return out;
    }
    for i in window - 1..prices.len() {
        out[i] = Some(calculate_average(&prices[i + 1 - window..=i]));
    }
    out
}

/// Wilder RSI aligned with `prices`: `None` for the first `window` slots.
///
/// A flat or strictly rising window has zero average loss and reads 100.
pub fn rsi(prices: &[f64], window: usize) -> Vec<Option<f64>> {
    let mut out = vec![None; prices.len()];
    if window == 0 || prices.len() < window + 1 {
        return out;
    }

    // deltas[j] is the move into prices[j + 1]
    let deltas: Vec<f64> = prices.windows(2).map(|w| w[1] - w[0]).collect();
    let gains: Vec<f64> = deltas.iter().map(|d| d.max(0.0)).collect();
    let losses: Vec<f64> = deltas.iter().map(|d| (-d).max(0.0)).collect();

    let mut avg_gain = calculate_average(&gains[..window]);
    let mut avg_loss = calculate_average(&losses[..window]);
    out[window] = Some(rsi_value(avg_gain, avg_loss));

    let w = window as f64;
    for j in window..deltas.len() {
        avg_gain = (avg_gain * (w - 1.0) + gains[j]) / w;
        avg_loss = (avg_loss * (w - 1.0) + losses[j]) / w;
        out[j + 1] = Some(rsi_value(avg_gain, avg_loss));
    }
    out
}

fn rsi_value(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 {
        return 100.0;
    }
    let rs = avg_gain / avg_loss;
    100.0 - 100.0 / (1.0 + rs)
}

/// Simple returns between consecutive prices. A zero previous price has no
/// defined return and is skipped.
pub fn daily_returns(prices: &[f64]) -> Vec<f64> {
    prices
        .windows(2)
        .filter(|w| w[0] != 0.0)
        .map(|w| (w[1] - w[0]) / w[0])
        .collect()
}

pub fn performance_summary(prices: &[f64]) -> Option<PerformanceSummary> {
    let returns = daily_returns(prices);
    if returns.is_empty() {
        warn!("No daily returns available for performance summary");
        return None;
    }

    let volatility = calculate_std_dev(&returns) * TRADING_DAYS.sqrt();
    let annual_return = (1.0 + calculate_average(&returns)).powf(TRADING_DAYS) - 1.0;
    let sharpe_ratio = if volatility > 0.0 && volatility.is_finite() {
        annual_return / volatility
    } else {
        0.0
    };

    Some(PerformanceSummary {
        volatility: volatility * 100.0,
        annual_return: annual_return * 100.0,
        sharpe_ratio,
    })
}

/// Annotates an oldest-first price series with SMA/RSI and summarizes its
/// performance. Too short a series gives an empty result, not an error.
pub fn compute_indicators(series: &[PricePoint], config: &IndicatorConfig) -> IndicatorSeries {
    if config.sma_window == 0 || config.rsi_window == 0 {
        warn!(
            "Indicator windows must be positive (sma={}, rsi={})",
            config.sma_window, config.rsi_window
        );
        return IndicatorSeries::empty();
    }
    if series.len() < config.min_points() {
        warn!(
            "Insufficient price history for indicators: {} points, need {}",
            series.len(),
            config.min_points()
        );
        return IndicatorSeries::empty();
    }

    let prices: Vec<f64> = series.iter().map(|p| p.price).collect();
    let sma_values = sma(&prices, config.sma_window);
    let rsi_values = rsi(&prices, config.rsi_window);

    let start = (config.sma_window - 1).max(config.rsi_window);
    let points: Vec<AnnotatedPricePoint> = series
        .iter()
        .zip(sma_values.into_iter().zip(rsi_values))
        .skip(start)
        .map(|(p, (sma, rsi))| AnnotatedPricePoint {
            date: p.date,
            price: p.price,
            sma,
            rsi,
        })
        .collect();

    debug!(
        "Annotated {} of {} points (sma={}, rsi={})",
        points.len(),
        series.len(),
        config.sma_window,
        config.rsi_window
    );

    IndicatorSeries {
        points,
        performance: performance_summary(&prices),
    }
}
