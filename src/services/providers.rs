// src/services/providers.rs
//! Capability interfaces for the upstream services. The collector and the
//! insight generator only ever see these traits; which implementation sits
//! behind each one is decided once from configuration.
use async_trait::async_trait;
use log::info;
use std::sync::Arc;

use crate::config::{CompanyProviderKind, LlmProviderKind, MarketProviderKind, NewsProviderKind, ProviderConfig};
use crate::error::{InsightsError, Result};
use crate::models::{CompanyProfile, NewsItem, PricePoint};

use super::company::{ClearbitProvider, MockCompanyProvider};
use super::gemini::{GeminiGenerator, MockTextGenerator};
use super::market::{MockPriceHistory, StooqPriceHistory};
use super::news::{MockNewsProvider, NewsApiProvider};

#[async_trait]
pub trait PriceHistoryProvider: Send + Sync {
    /// Daily closes, oldest first.
    async fn fetch_series(&self, symbol: &str) -> Result<Vec<PricePoint>>;

    fn name(&self) -> &'static str;
}

#[async_trait]
pub trait NewsProvider: Send + Sync {
    async fn fetch_news(&self, category: &str) -> Result<Vec<NewsItem>>;

    fn name(&self) -> &'static str;
}

#[async_trait]
pub trait CompanyProvider: Send + Sync {
    async fn fetch_company(&self, domain: &str) -> Result<CompanyProfile>;

    fn name(&self) -> &'static str;
}

#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String>;

    fn name(&self) -> &'static str;
}

/// The full set of upstream collaborators.
#[derive(Clone)]
pub struct Providers {
    pub prices: Arc<dyn PriceHistoryProvider>,
    pub news: Arc<dyn NewsProvider>,
    pub company: Arc<dyn CompanyProvider>,
    pub generator: Arc<dyn TextGenerator>,
}

impl Providers {
    pub fn from_config(config: &ProviderConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.http_timeout)
            .user_agent("insights-hub/0.1")
            .build()
            .map_err(|e| InsightsError::Config(format!("failed to build HTTP client: {}", e)))?;

        let prices: Arc<dyn PriceHistoryProvider> = match config.market {
            MarketProviderKind::Stooq => Arc::new(StooqPriceHistory::new(client.clone())),
            MarketProviderKind::Mock => Arc::new(MockPriceHistory::default()),
        };

        let news: Arc<dyn NewsProvider> = match config.news {
            NewsProviderKind::NewsApi => Arc::new(NewsApiProvider::new(client.clone(), require(&config.news_api_key, "NEWS_API_KEY")?)),
            NewsProviderKind::Mock => Arc::new(MockNewsProvider),
        };

        let company: Arc<dyn CompanyProvider> = match config.company {
            CompanyProviderKind::Clearbit => Arc::new(ClearbitProvider::new(
                client.clone(),
                require(&config.clearbit_api_key, "CLEARBIT_API_KEY")?,
            )),
            CompanyProviderKind::Mock => Arc::new(MockCompanyProvider),
        };

        let generator: Arc<dyn TextGenerator> = match config.llm {
            LlmProviderKind::Gemini => Arc::new(GeminiGenerator::new(
                client,
                require(&config.gemini_api_key, "GEMINI_API_KEY")?,
                config.gemini_model.clone(),
            )),
            LlmProviderKind::Mock => Arc::new(MockTextGenerator::default()),
        };

        info!(
            "Providers ready: prices={}, news={}, company={}, generator={}",
            prices.name(),
            news.name(),
            company.name(),
            generator.name()
        );

        Ok(Providers {
            prices,
            news,
            company,
            generator,
        })
    }
}

fn require(value: &Option<String>, key: &str) -> Result<String> {
    value
        .clone()
        .ok_or_else(|| InsightsError::Config(format!("{} must be set", key)))
}
