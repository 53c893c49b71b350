use async_trait::async_trait;
use chrono::{Duration, NaiveDate, Utc};
use serde_json::json;
use std::sync::Arc;

use insights_hub::config::IndicatorConfig;
use insights_hub::error::Result;
use insights_hub::models::{DataSource, PricePoint, SourcePayload};
use insights_hub::services::calculations::compute_indicators;
use insights_hub::services::collector::{run_cycle, CollectorSettings, InsightStatus, SourceOutcome};
use insights_hub::services::company::MockCompanyProvider;
use insights_hub::services::db::{LatestStore, MemoryStore};
use insights_hub::services::insights::{generate_for_source, InsightOutcome};
use insights_hub::services::news::MockNewsProvider;
use insights_hub::services::providers::{PriceHistoryProvider, Providers, TextGenerator};
use insights_hub::services::query::get_combined;

struct StubGenerator;

#[async_trait]
impl TextGenerator for StubGenerator {
    async fn generate(&self, _prompt: &str) -> Result<String> {
        Ok("mock summary".to_string())
    }

    fn name(&self) -> &'static str {
        "stub"
    }
}

struct FixedPrices(Vec<PricePoint>);

#[async_trait]
impl PriceHistoryProvider for FixedPrices {
    async fn fetch_series(&self, _symbol: &str) -> Result<Vec<PricePoint>> {
        Ok(self.0.clone())
    }

    fn name(&self) -> &'static str {
        "fixed"
    }
}

fn rising_series(n: usize) -> Vec<PricePoint> {
    let start = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
    (0..n)
        .map(|i| PricePoint::new(start + Duration::days(i as i64), 100.0 + i as f64))
        .collect()
}

#[tokio::test]
async fn seeded_plaid_record_gets_insight_and_combined_view() {
    let store = MemoryStore::new();

    let config = IndicatorConfig { sma_window: 3, rsi_window: 3 };
    let annotated = compute_indicators(&rising_series(10), &config);
    let seed = json!({
        "symbol": "AAPL",
        "eod": annotated.points,
        "performance": annotated.performance,
    });
    store.upsert_source(DataSource::Plaid, &seed, Utc::now()).await.unwrap();

    let outcome = generate_for_source(&store, &StubGenerator, DataSource::Plaid).await.unwrap();
    assert_eq!(outcome, InsightOutcome::Stored("mock summary".to_string()));

    let insight = store.latest_insight(DataSource::Plaid).await.unwrap().unwrap();
    assert_eq!(insight.insight_text, "mock summary");

    let view = get_combined(&store, DataSource::Plaid).await.unwrap();
    assert_eq!(view.insights, "mock summary");
    assert_eq!(view.data["symbol"], "AAPL");
    assert_eq!(view.data["eod"].as_array().unwrap().len(), 7);
    // rising prices never lose, so RSI pins at 100
    assert!(view.data["eod"].as_array().unwrap().iter().all(|p| p["rsi"] == 100.0));
}

#[tokio::test]
async fn collector_cycle_feeds_query_service() {
    let store = Arc::new(MemoryStore::new());
    let providers = Providers {
        prices: Arc::new(FixedPrices(rising_series(40))),
        news: Arc::new(MockNewsProvider),
        company: Arc::new(MockCompanyProvider),
        generator: Arc::new(StubGenerator),
    };
    let settings = CollectorSettings {
        symbol: "MSFT".into(),
        news_category: "business".into(),
        company_domain: "innovateinc.com".into(),
        history_days: 30,
        indicators: IndicatorConfig { sma_window: 5, rsi_window: 14 },
    };

    let report = run_cycle(store.as_ref(), &providers, &settings).await;
    for source in DataSource::ALL {
        assert_eq!(report.source_outcome(source), Some(&SourceOutcome::Stored));
        assert_eq!(report.insight_status(source), Some(&InsightStatus::Stored));
    }

    let view = get_combined(store.as_ref(), DataSource::Plaid).await.unwrap();
    let payload = match SourcePayload::from_document(DataSource::Plaid, &view.data).unwrap() {
        SourcePayload::Market(snapshot) => snapshot,
        other => panic!("unexpected payload {:?}", other),
    };
    assert_eq!(payload.symbol, "MSFT");
    // 30 kept, first 14 are RSI warm-up
    assert_eq!(payload.eod.len(), 16);
    assert_eq!(payload.eod[0].date, rising_series(40)[24].date);
    assert!(payload.performance.unwrap().annual_return > 0.0);
    assert_eq!(view.data["news"].as_array().unwrap().len(), 2);

    let company = get_combined(store.as_ref(), DataSource::Clearbit).await.unwrap();
    assert_eq!(company.data["companyName"], "Innovate Inc.");
    assert!(company.data.get("news").is_none());
}
