// src/models.rs
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::InsightsError;

/// The fixed set of upstream sources the service knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataSource {
    /// Transactions-style source; carries the market EOD snapshot.
    Plaid,
    /// Company enrichment.
    Clearbit,
    /// Market news.
    Openbb,
}

impl DataSource {
    /// Order the collector walks the sources in. `openbb` before `clearbit` keeps
    /// fresh news available to the `plaid` join as early as possible.
    pub const ALL: [DataSource; 3] = [DataSource::Plaid, DataSource::Openbb, DataSource::Clearbit];

    pub fn as_str(&self) -> &'static str {
        match self {
            DataSource::Plaid => "plaid",
            DataSource::Clearbit => "clearbit",
            DataSource::Openbb => "openbb",
        }
    }
}

impl fmt::Display for DataSource {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DataSource {
    type Err = InsightsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "plaid" => Ok(DataSource::Plaid),
            "clearbit" => Ok(DataSource::Clearbit),
            "openbb" => Ok(DataSource::Openbb),
            other => Err(InsightsError::UnknownSource(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub price: f64,
}

impl PricePoint {
    pub fn new(date: NaiveDate, price: f64) -> Self {
        PricePoint { date, price }
    }
}

/// A price point with its indicators. `None` only inside the warm-up window,
/// which the metrics engine trims before handing a series out.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AnnotatedPricePoint {
    pub date: NaiveDate,
    pub price: f64,
    pub sma: Option<f64>,
    pub rsi: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceSummary {
    /// Annualized, in percent.
    pub volatility: f64,
    /// Annualized, in percent.
    pub annual_return: f64,
    /// 0.0 when volatility is zero.
    pub sharpe_ratio: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketSnapshot {
    pub symbol: String,
    pub eod: Vec<AnnotatedPricePoint>,
    pub performance: Option<PerformanceSummary>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewsItem {
    pub id: String,
    pub title: String,
    pub url: String,
    pub source: String,
    pub published: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewsDigest {
    pub category: String,
    pub news: Vec<NewsItem>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanyMetrics {
    pub employees: Option<u64>,
    pub market_cap: Option<String>,
    pub annual_revenue: Option<String>,
    pub raised: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanyProfile {
    pub company_name: String,
    pub domain: String,
    pub description: Option<String>,
    pub logo: Option<String>,
    pub location: Option<String>,
    pub metrics: CompanyMetrics,
}

/// Provider output narrowed to its source kind. Stored as an opaque document.
#[derive(Debug, Clone, PartialEq)]
pub enum SourcePayload {
    Market(MarketSnapshot),
    News(NewsDigest),
    Company(CompanyProfile),
}

impl SourcePayload {
    pub fn source(&self) -> DataSource {
        match self {
            SourcePayload::Market(_) => DataSource::Plaid,
            SourcePayload::News(_) => DataSource::Openbb,
            SourcePayload::Company(_) => DataSource::Clearbit,
        }
    }

    pub fn to_document(&self) -> Result<serde_json::Value, InsightsError> {
        let doc = match self {
            SourcePayload::Market(m) => serde_json::to_value(m)?,
            SourcePayload::News(n) => serde_json::to_value(n)?,
            SourcePayload::Company(c) => serde_json::to_value(c)?,
        };
        Ok(doc)
    }

    /// Reads a stored document back into the variant its source dictates.
    pub fn from_document(source: DataSource, doc: &serde_json::Value) -> Result<Self, InsightsError> {
        let payload = match source {
            DataSource::Plaid => SourcePayload::Market(MarketSnapshot::deserialize(doc)?),
            DataSource::Openbb => SourcePayload::News(NewsDigest::deserialize(doc)?),
            DataSource::Clearbit => SourcePayload::Company(CompanyProfile::deserialize(doc)?),
        };
        Ok(payload)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceRecord {
    pub source_name: String,
    pub payload: serde_json::Value,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InsightRecord {
    pub source_name: String,
    pub insight_text: String,
    pub updated_at: DateTime<Utc>,
}
