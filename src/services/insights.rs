// src/services/insights.rs
use chrono::Utc;
use log::{error, info, warn};

use super::db::LatestStore;
use super::providers::TextGenerator;
use crate::error::Result;
use crate::models::DataSource;

const MARKET_PERSONA: &str = "You are a fintech analyst. Based on the following stock market performance data \
(end-of-day prices with SMA and RSI indicators, and volatility, annual return and Sharpe ratio), provide a short \
summary and 3 actionable recommendations for a potential investor.";

const NEWS_PERSONA: &str = "You are a fintech analyst. Based on the following business news headlines, provide a \
short summary of what they imply for the market and 3 actionable recommendations for a potential investor.";

const COMPANY_PERSONA: &str = "You are a fintech analyst. Based on the following company performance data, provide \
a short summary and 3 actionable recommendations to improve business performance and market position.";

#[derive(Debug, Clone, PartialEq)]
pub enum InsightOutcome {
    Stored(String),
    /// Nothing collected for the source yet.
    Skipped,
}

fn persona(source: DataSource) -> &'static str {
    match source {
        DataSource::Plaid => MARKET_PERSONA,
        DataSource::Openbb => NEWS_PERSONA,
        DataSource::Clearbit => COMPANY_PERSONA,
    }
}

/// Embeds the document as stored; its shape was settled when it was collected.
pub fn build_prompt(source: DataSource, document: &serde_json::Value) -> Result<String> {
    let data = serde_json::to_string_pretty(document)?;
    Ok(format!("{}\n\nData:\n{}", persona(source), data))
}

/// Generates commentary for a document without storing it.
pub async fn generate_for_document(
    generator: &dyn TextGenerator,
    source: DataSource,
    document: &serde_json::Value,
) -> Result<String> {
    let prompt = build_prompt(source, document)?;
    generator.generate(&prompt).await
}

/// Summarizes the latest stored record for `source` and stores the result.
/// A failed generation leaves any earlier insight in place.
pub async fn generate_for_source(
    store: &dyn LatestStore,
    generator: &dyn TextGenerator,
    source: DataSource,
) -> Result<InsightOutcome> {
    let record = match store.latest_source(source).await? {
        Some(record) => record,
        None => {
            warn!("No data stored for {} yet, skipping insight generation", source);
            return Ok(InsightOutcome::Skipped);
        }
    };

    info!("Generating insights for {} (data from {})", source, record.updated_at);
    let text = match generate_for_document(generator, source, &record.payload).await {
        Ok(text) => text,
        Err(e) => {
            error!("Insight generation failed for {}: {}", source, e);
            return Err(e);
        }
    };

    store.upsert_insight(source, &text, Utc::now()).await?;
    info!("Stored insights for {}", source);
    Ok(InsightOutcome::Stored(text))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::InsightsError;
    use crate::models::{NewsDigest, NewsItem};
    use crate::services::db::MemoryStore;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Mutex;

    struct RecordingGenerator {
        reply: Result<String>,
        prompts: Mutex<Vec<String>>,
    }

    impl RecordingGenerator {
        fn replying(text: &str) -> Self {
            RecordingGenerator {
                reply: Ok(text.to_string()),
                prompts: Mutex::new(Vec::new()),
            }
        }

        fn failing() -> Self {
            RecordingGenerator {
                reply: Err(InsightsError::Generation("quota exceeded".into())),
                prompts: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl TextGenerator for RecordingGenerator {
        async fn generate(&self, prompt: &str) -> Result<String> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            match &self.reply {
                Ok(text) => Ok(text.clone()),
                Err(e) => Err(InsightsError::Generation(e.to_string())),
            }
        }

        fn name(&self) -> &'static str {
            "recording"
        }
    }

    fn news_doc() -> serde_json::Value {
        serde_json::to_value(NewsDigest {
            category: "business".into(),
            news: vec![NewsItem {
                id: "1".into(),
                title: "Fed holds rates".into(),
                url: "#".into(),
                source: "Reuters".into(),
                published: "1h ago".into(),
            }],
        })
        .unwrap()
    }

    #[tokio::test]
    async fn skips_when_nothing_collected() {
        let store = MemoryStore::new();
        let generator = RecordingGenerator::replying("unused");

        let outcome = generate_for_source(&store, &generator, DataSource::Openbb).await.unwrap();
        assert_eq!(outcome, InsightOutcome::Skipped);
        assert!(generator.prompts.lock().unwrap().is_empty());
        assert_eq!(store.insight_count(), 0);
    }

    #[tokio::test]
    async fn stores_generated_text_with_source_persona() {
        let store = MemoryStore::new();
        store.upsert_source(DataSource::Openbb, &news_doc(), Utc::now()).await.unwrap();
        let generator = RecordingGenerator::replying("Rates steady.");

        let outcome = generate_for_source(&store, &generator, DataSource::Openbb).await.unwrap();
        assert_eq!(outcome, InsightOutcome::Stored("Rates steady.".into()));

        let insight = store.latest_insight(DataSource::Openbb).await.unwrap().unwrap();
        assert_eq!(insight.insight_text, "Rates steady.");

        let prompts = generator.prompts.lock().unwrap();
        assert!(prompts[0].starts_with(NEWS_PERSONA));
        assert!(prompts[0].contains("Fed holds rates"));
    }

    #[tokio::test]
    async fn failed_generation_keeps_previous_insight() {
        let store = MemoryStore::new();
        store.upsert_source(DataSource::Openbb, &news_doc(), Utc::now()).await.unwrap();
        store.upsert_insight(DataSource::Openbb, "yesterday's take", Utc::now()).await.unwrap();

        let result = generate_for_source(&store, &RecordingGenerator::failing(), DataSource::Openbb).await;
        assert!(matches!(result, Err(InsightsError::Generation(_))));

        let insight = store.latest_insight(DataSource::Openbb).await.unwrap().unwrap();
        assert_eq!(insight.insight_text, "yesterday's take");
    }

    #[tokio::test]
    async fn eod_seed_without_symbol_still_gets_insight() {
        let store = MemoryStore::new();
        let seed = json!({
            "eod": [{ "date": "2024-07-22", "price": 154.5, "sma": 153.1, "rsi": 61.2 }],
            "performance": { "volatility": 15.2, "annualReturn": 25.4, "sharpeRatio": 1.8 }
        });
        store.upsert_source(DataSource::Plaid, &seed, Utc::now()).await.unwrap();
        let generator = RecordingGenerator::replying("mock summary");

        let outcome = generate_for_source(&store, &generator, DataSource::Plaid).await.unwrap();
        assert_eq!(outcome, InsightOutcome::Stored("mock summary".into()));

        let insight = store.latest_insight(DataSource::Plaid).await.unwrap().unwrap();
        assert_eq!(insight.insight_text, "mock summary");
        let prompts = generator.prompts.lock().unwrap();
        assert!(prompts[0].starts_with(MARKET_PERSONA));
        assert!(prompts[0].contains("\"sharpeRatio\": 1.8"));
    }

    #[tokio::test]
    async fn any_inline_document_is_embedded() {
        let generator = RecordingGenerator::replying("ok");
        let transactions = json!([
            { "id": "1", "date": "2024-07-22", "name": "Tech Startup Inc.", "amount": 5000, "category": "Income" }
        ]);
        let text = generate_for_document(&generator, DataSource::Plaid, &transactions).await.unwrap();
        assert_eq!(text, "ok");
        assert!(generator.prompts.lock().unwrap()[0].contains("Tech Startup Inc."));
    }
}
