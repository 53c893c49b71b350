// src/services/collector.rs
use chrono::Utc;
use log::{error, info, warn};
use std::fmt;

use super::calculations::compute_indicators;
use super::db::LatestStore;
use super::insights::{generate_for_source, InsightOutcome};
use super::providers::Providers;
use crate::config::{AppConfig, IndicatorConfig};
use crate::error::Result;
use crate::models::{DataSource, MarketSnapshot, NewsDigest, SourcePayload};

#[derive(Debug, Clone)]
pub struct CollectorSettings {
    pub symbol: String,
    pub news_category: String,
    pub company_domain: String,
    pub history_days: usize,
    pub indicators: IndicatorConfig,
}

impl From<&AppConfig> for CollectorSettings {
    fn from(config: &AppConfig) -> Self {
        CollectorSettings {
            symbol: config.market_symbol.clone(),
            news_category: config.news_category.clone(),
            company_domain: config.company_domain.clone(),
            history_days: config.history_days,
            indicators: config.indicators,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SourceOutcome {
    Stored,
    /// Not enough history for indicators; the previous record stays.
    NoUsableData,
    Failed(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum InsightStatus {
    Stored,
    Skipped,
    Failed(String),
}

#[derive(Debug, Default)]
pub struct CollectionReport {
    pub sources: Vec<(DataSource, SourceOutcome)>,
    pub insights: Vec<(DataSource, InsightStatus)>,
}

impl CollectionReport {
    pub fn source_outcome(&self, source: DataSource) -> Option<&SourceOutcome> {
        self.sources.iter().find(|(s, _)| *s == source).map(|(_, o)| o)
    }

    pub fn insight_status(&self, source: DataSource) -> Option<&InsightStatus> {
        self.insights.iter().find(|(s, _)| *s == source).map(|(_, o)| o)
    }

    pub fn failures(&self) -> usize {
        let data = self
            .sources
            .iter()
            .filter(|(_, o)| matches!(o, SourceOutcome::Failed(_)))
            .count();
        let insights = self
            .insights
            .iter()
            .filter(|(_, o)| matches!(o, InsightStatus::Failed(_)))
            .count();
        data + insights
    }
}

impl fmt::Display for CollectionReport {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for (source, outcome) in &self.sources {
            writeln!(f, "  data {:<9} {:?}", source.as_str(), outcome)?;
        }
        for (source, status) in &self.insights {
            writeln!(f, "  insight {:<9} {:?}", source.as_str(), status)?;
        }
        write!(f, "  failures: {}", self.failures())
    }
}

/// Pulls `source` from its provider and narrows it. `Ok(None)` means the
/// provider answered but there is nothing worth storing yet.
pub async fn fetch_payload(
    providers: &Providers,
    settings: &CollectorSettings,
    source: DataSource,
) -> Result<Option<SourcePayload>> {
    match source {
        DataSource::Plaid => {
            let mut series = providers.prices.fetch_series(&settings.symbol).await?;
            if series.len() > settings.history_days {
                series.drain(..series.len() - settings.history_days);
            }
            let annotated = compute_indicators(&series, &settings.indicators);
            if annotated.is_empty() {
                return Ok(None);
            }
            Ok(Some(SourcePayload::Market(MarketSnapshot {
                symbol: settings.symbol.clone(),
                eod: annotated.points,
                performance: annotated.performance,
            })))
        }
        DataSource::Openbb => {
            let news = providers.news.fetch_news(&settings.news_category).await?;
            if news.is_empty() {
                return Ok(None);
            }
            Ok(Some(SourcePayload::News(NewsDigest {
                category: settings.news_category.clone(),
                news,
            })))
        }
        DataSource::Clearbit => {
            let company = providers.company.fetch_company(&settings.company_domain).await?;
            Ok(Some(SourcePayload::Company(company)))
        }
    }
}

/// Fetch, narrow, store. Never fails the caller; the outcome says what happened.
pub async fn collect_source(
    store: &dyn LatestStore,
    providers: &Providers,
    settings: &CollectorSettings,
    source: DataSource,
) -> SourceOutcome {
    info!("--- Running pipeline for: {} ---", source);

    let payload = match fetch_payload(providers, settings, source).await {
        Ok(Some(payload)) => payload,
        Ok(None) => {
            warn!("No usable data for {} this cycle, keeping previous record", source);
            return SourceOutcome::NoUsableData;
        }
        Err(e) => {
            error!("Fetch failed for {}: {}", source, e);
            return SourceOutcome::Failed(e.to_string());
        }
    };

    let document = match payload.to_document() {
        Ok(doc) => doc,
        Err(e) => {
            error!("Could not serialize {} payload: {}", source, e);
            return SourceOutcome::Failed(e.to_string());
        }
    };

    match store.upsert_source(source, &document, Utc::now()).await {
        Ok(()) => {
            info!("Data for {} stored", source);
            SourceOutcome::Stored
        }
        Err(e) => {
            error!("Error storing data for {}: {}", source, e);
            SourceOutcome::Failed(e.to_string())
        }
    }
}

/// One collection cycle: every source, then insights for every source.
/// Sources are handled one at a time and independently.
pub async fn run_cycle(store: &dyn LatestStore, providers: &Providers, settings: &CollectorSettings) -> CollectionReport {
    info!("Starting collection cycle");
    let mut report = CollectionReport::default();

    for source in DataSource::ALL {
        let outcome = collect_source(store, providers, settings, source).await;
        report.sources.push((source, outcome));
    }

    for source in DataSource::ALL {
        let status = match generate_for_source(store, providers.generator.as_ref(), source).await {
            Ok(InsightOutcome::Stored(_)) => InsightStatus::Stored,
            Ok(InsightOutcome::Skipped) => InsightStatus::Skipped,
            Err(e) => {
                error!("Insight step failed for {}: {}", source, e);
                InsightStatus::Failed(e.to_string())
            }
        };
        report.insights.push((source, status));
    }

    info!("Collection cycle finished:\n{}", report);
    report
}
