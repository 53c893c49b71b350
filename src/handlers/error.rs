// src/handlers/error.rs
use std::fmt;
use warp::http::StatusCode;
use warp::reject::Reject;

use crate::error::InsightsError;

#[derive(Debug, Clone)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        ApiError {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn database_error(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }
}

impl From<InsightsError> for ApiError {
    fn from(e: InsightsError) -> Self {
        match e {
            InsightsError::UnknownSource(s) => ApiError::bad_request(format!("Invalid data source: {}", s)),
            InsightsError::NotFound(s) => ApiError::not_found(format!("No data found for {}", s)),
            InsightsError::Serialization(e) => ApiError::database_error(format!("Stored data is unreadable: {}", e)),
            InsightsError::Generation(m) => {
                ApiError::new(StatusCode::BAD_GATEWAY, format!("Insight generation failed: {}", m))
            }
            InsightsError::ProviderUnavailable { provider, reason } => {
                ApiError::new(StatusCode::BAD_GATEWAY, format!("{} unavailable: {}", provider, reason))
            }
            InsightsError::StoreUnavailable(m) => ApiError::database_error(format!("Database error: {}", m)),
            InsightsError::Config(m) => ApiError::database_error(m),
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ApiError {}
impl Reject for ApiError {}
