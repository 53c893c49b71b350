// src/handlers/latest.rs
use log::{error, info};
use warp::reply::Json;
use warp::Rejection;

use super::error::ApiError;
use super::AppState;
use crate::error::InsightsError;
use crate::models::DataSource;
use crate::services::query::get_combined;

pub async fn get_latest(source: String, state: AppState) -> Result<Json, Rejection> {
    info!("Handling request for latest {} data", source);

    let source: DataSource = source
        .parse()
        .map_err(|e: InsightsError| warp::reject::custom(ApiError::from(e)))?;

    match get_combined(state.store.as_ref(), source).await {
        Ok(view) => Ok(warp::reply::json(&view)),
        Err(InsightsError::NotFound(s)) => {
            info!("No data stored for {} yet", s);
            Err(warp::reject::custom(ApiError::from(InsightsError::NotFound(s))))
        }
        Err(e) => {
            error!("Failed to read latest {} data: {}", source, e);
            Err(warp::reject::custom(ApiError::from(e)))
        }
    }
}
