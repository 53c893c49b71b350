// src/config.rs
use log::{info, warn};
use std::collections::HashMap;
use std::str::FromStr;
use std::time::Duration;

use crate::error::{InsightsError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarketProviderKind {
    Stooq,
    Mock,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NewsProviderKind {
    NewsApi,
    Mock,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompanyProviderKind {
    Clearbit,
    Mock,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LlmProviderKind {
    Gemini,
    Mock,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndicatorConfig {
    pub sma_window: usize,
    pub rsi_window: usize,
}

impl Default for IndicatorConfig {
    fn default() -> Self {
        IndicatorConfig {
            sma_window: 20,
            rsi_window: 14,
        }
    }
}

impl IndicatorConfig {
    /// Fewest points that yield at least one fully annotated point.
    pub fn min_points(&self) -> usize {
        self.sma_window.max(self.rsi_window) + 1
    }
}

#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub market: MarketProviderKind,
    pub news: NewsProviderKind,
    pub company: CompanyProviderKind,
    pub llm: LlmProviderKind,
    pub news_api_key: Option<String>,
    pub clearbit_api_key: Option<String>,
    pub gemini_api_key: Option<String>,
    pub gemini_model: String,
    pub http_timeout: Duration,
}

/// Everything the binaries need, resolved once at start-up and passed down.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub port: u16,
    pub market_symbol: String,
    pub news_category: String,
    pub company_domain: String,
    pub history_days: usize,
    pub indicators: IndicatorConfig,
    pub providers: ProviderConfig,
    pub collector_cron: Option<String>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_vars(std::env::vars().collect())
    }

    pub fn from_vars(vars: HashMap<String, String>) -> Result<Self> {
        let get = |key: &str| vars.get(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let database_url = get("DATABASE_URL")
            .ok_or_else(|| InsightsError::Config("DATABASE_URL must be set".into()))?;

        let port = match get("PORT") {
            Some(p) => parse_num::<u16>("PORT", &p)?,
            None => {
                warn!("$PORT not set, defaulting to 3030");
                3030
            }
        };

        let indicators = IndicatorConfig {
            sma_window: get("SMA_WINDOW")
                .map(|v| parse_num("SMA_WINDOW", &v))
                .transpose()?
                .unwrap_or(IndicatorConfig::default().sma_window),
            rsi_window: get("RSI_WINDOW")
                .map(|v| parse_num("RSI_WINDOW", &v))
                .transpose()?
                .unwrap_or(IndicatorConfig::default().rsi_window),
        };
        if indicators.sma_window == 0 || indicators.rsi_window == 0 {
            return Err(InsightsError::Config("indicator windows must be positive".into()));
        }

        let history_days = get("HISTORY_DAYS")
            .map(|v| parse_num::<usize>("HISTORY_DAYS", &v))
            .transpose()?
            .unwrap_or(120);
        if history_days < indicators.min_points() {
            return Err(InsightsError::Config(format!(
                "HISTORY_DAYS ({}) must cover at least {} points",
                history_days,
                indicators.min_points()
            )));
        }

        let market = match get("MARKET_PROVIDER").as_deref().unwrap_or("mock") {
            "stooq" => MarketProviderKind::Stooq,
            "mock" => MarketProviderKind::Mock,
            other => return Err(unknown_provider("MARKET_PROVIDER", other)),
        };
        let news = match get("NEWS_PROVIDER").as_deref().unwrap_or("mock") {
            "newsapi" => NewsProviderKind::NewsApi,
            "mock" => NewsProviderKind::Mock,
            other => return Err(unknown_provider("NEWS_PROVIDER", other)),
        };
        let company = match get("COMPANY_PROVIDER").as_deref().unwrap_or("mock") {
            "clearbit" => CompanyProviderKind::Clearbit,
            "mock" => CompanyProviderKind::Mock,
            other => return Err(unknown_provider("COMPANY_PROVIDER", other)),
        };
        let llm = match get("LLM_PROVIDER").as_deref().unwrap_or("mock") {
            "gemini" => LlmProviderKind::Gemini,
            "mock" => LlmProviderKind::Mock,
            other => return Err(unknown_provider("LLM_PROVIDER", other)),
        };

        let news_api_key = get("NEWS_API_KEY");
        let clearbit_api_key = get("CLEARBIT_API_KEY");
        let gemini_api_key = get("GEMINI_API_KEY");

        if news == NewsProviderKind::NewsApi && news_api_key.is_none() {
            return Err(InsightsError::Config("NEWS_PROVIDER=newsapi requires NEWS_API_KEY".into()));
        }
        if company == CompanyProviderKind::Clearbit && clearbit_api_key.is_none() {
            return Err(InsightsError::Config(
                "COMPANY_PROVIDER=clearbit requires CLEARBIT_API_KEY".into(),
            ));
        }
        if llm == LlmProviderKind::Gemini && gemini_api_key.is_none() {
            return Err(InsightsError::Config("LLM_PROVIDER=gemini requires GEMINI_API_KEY".into()));
        }

        let http_timeout = Duration::from_secs(
            get("HTTP_TIMEOUT_SECS")
                .map(|v| parse_num::<u64>("HTTP_TIMEOUT_SECS", &v))
                .transpose()?
                .unwrap_or(20),
        );

        let config = AppConfig {
            database_url,
            port,
            market_symbol: get("MARKET_SYMBOL").unwrap_or_else(|| "AAPL".to_string()),
            news_category: get("NEWS_CATEGORY").unwrap_or_else(|| "business".to_string()),
            company_domain: get("COMPANY_DOMAIN").unwrap_or_else(|| "innovateinc.com".to_string()),
            history_days,
            indicators,
            providers: ProviderConfig {
                market,
                news,
                company,
                llm,
                news_api_key,
                clearbit_api_key,
                gemini_api_key,
                gemini_model: get("GEMINI_MODEL").unwrap_or_else(|| "gemini-1.5-flash".to_string()),
                http_timeout,
            },
            collector_cron: get("COLLECTOR_CRON"),
        };

        info!(
            "Config loaded: port={}, symbol={}, sma={}, rsi={}, providers=({:?}, {:?}, {:?}, {:?})",
            config.port,
            config.market_symbol,
            config.indicators.sma_window,
            config.indicators.rsi_window,
            config.providers.market,
            config.providers.news,
            config.providers.company,
            config.providers.llm,
        );
        Ok(config)
    }
}

fn parse_num<T: FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .parse::<T>()
        .map_err(|_| InsightsError::Config(format!("{} must be a number, got '{}'", key, value)))
}

fn unknown_provider(key: &str, value: &str) -> InsightsError {
    InsightsError::Config(format!("{} has unknown value '{}'", key, value))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn missing_database_url_fails_fast() {
        let err = AppConfig::from_vars(vars(&[("PORT", "8080")])).unwrap_err();
        assert!(matches!(err, InsightsError::Config(_)));
    }

    #[test]
    fn defaults_run_on_mock_providers() {
        let config = AppConfig::from_vars(vars(&[("DATABASE_URL", "postgres://localhost/insights")])).unwrap();
        assert_eq!(config.port, 3030);
        assert_eq!(config.indicators, IndicatorConfig::default());
        assert_eq!(config.providers.market, MarketProviderKind::Mock);
        assert_eq!(config.providers.llm, LlmProviderKind::Mock);
        assert!(config.collector_cron.is_none());
    }

    #[test]
    fn real_provider_without_key_is_rejected() {
        let err = AppConfig::from_vars(vars(&[
            ("DATABASE_URL", "postgres://localhost/insights"),
            ("LLM_PROVIDER", "gemini"),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("GEMINI_API_KEY"));
    }

    #[test]
    fn history_must_cover_indicator_windows() {
        let err = AppConfig::from_vars(vars(&[
            ("DATABASE_URL", "postgres://localhost/insights"),
            ("SMA_WINDOW", "50"),
            ("HISTORY_DAYS", "30"),
        ]))
        .unwrap_err();
        assert!(matches!(err, InsightsError::Config(_)));
    }

    #[test]
    fn bad_number_is_a_config_error() {
        let err = AppConfig::from_vars(vars(&[
            ("DATABASE_URL", "postgres://localhost/insights"),
            ("PORT", "eighty"),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("PORT"));
    }
}
