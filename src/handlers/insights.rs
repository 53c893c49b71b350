// src/handlers/insights.rs
use log::{error, info};
use serde::{Deserialize, Serialize};
use warp::reply::Json;
use warp::Rejection;

use super::error::ApiError;
use super::AppState;
use crate::error::InsightsError;
use crate::models::DataSource;
use crate::services::insights::{generate_for_document, generate_for_source, InsightOutcome};

#[derive(Debug, Deserialize)]
pub struct InsightRequest {
    pub source: String,
    /// Ad-hoc document to analyze instead of the stored one. Not persisted.
    pub data: Option<serde_json::Value>,
}

#[derive(Debug, Serialize)]
struct InsightResponse {
    source: DataSource,
    insights: String,
    stored: bool,
}

pub async fn post_insights(request: InsightRequest, state: AppState) -> Result<Json, Rejection> {
    let source: DataSource = request
        .source
        .parse()
        .map_err(|e: InsightsError| warp::reject::custom(ApiError::from(e)))?;
    info!("Handling insight request for {}", source);

    let (insights, stored) = match request.data {
        Some(document) => {
            let text = generate_for_document(state.generator.as_ref(), source, &document)
                .await
                .map_err(|e| {
                    error!("Ad-hoc insight generation failed for {}: {}", source, e);
                    warp::reject::custom(ApiError::from(e))
                })?;
            (text, false)
        }
        None => match generate_for_source(state.store.as_ref(), state.generator.as_ref(), source).await {
            Ok(InsightOutcome::Stored(text)) => (text, true),
            Ok(InsightOutcome::Skipped) => {
                return Err(warp::reject::custom(ApiError::from(InsightsError::NotFound(
                    source.to_string(),
                ))))
            }
            Err(e) => {
                error!("Insight generation failed for {}: {}", source, e);
                return Err(warp::reject::custom(ApiError::from(e)));
            }
        },
    };

    Ok(warp::reply::json(&InsightResponse {
        source,
        insights,
        stored,
    }))
}
