// src/handlers/health.rs
use serde_json::json;
use warp::reply::Json;

pub async fn root() -> Result<Json, warp::Rejection> {
    Ok(warp::reply::json(&json!({
        "message": "Data Insights Hub backend is running."
    })))
}
