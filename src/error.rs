// src/error.rs
use thiserror::Error;

#[derive(Debug, Error)]
pub enum InsightsError {
    /// External data provider down, rate-limited or answering garbage.
    #[error("provider {provider} unavailable: {reason}")]
    ProviderUnavailable { provider: &'static str, reason: String },

    #[error("store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("no data found for {0}")]
    NotFound(String),

    #[error("unrecognized data source: {0}")]
    UnknownSource(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("text generation failed: {0}")]
    Generation(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl InsightsError {
    pub fn provider(provider: &'static str, reason: impl ToString) -> Self {
        InsightsError::ProviderUnavailable {
            provider,
            reason: reason.to_string(),
        }
    }
}

impl From<sqlx::Error> for InsightsError {
    fn from(e: sqlx::Error) -> Self {
        InsightsError::StoreUnavailable(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, InsightsError>;
