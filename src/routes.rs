// src/routes.rs
use log::{info, warn};
use std::convert::Infallible;
use warp::http::StatusCode;
use warp::reject::Rejection;
use warp::{Filter, Reply};

use crate::handlers::error::ApiError;
use crate::handlers::health::root;
use crate::handlers::insights::post_insights;
use crate::handlers::latest::get_latest;
use crate::handlers::AppState;

const MAX_BODY_BYTES: u64 = 1024 * 1024;

async fn handle_rejection(err: Rejection) -> Result<impl Reply, Infallible> {
    let code;
    let message;

    if err.is_not_found() {
        code = StatusCode::NOT_FOUND;
        message = "Not Found".to_string();
    } else if let Some(api_error) = err.find::<ApiError>() {
        code = api_error.status;
        message = api_error.message.clone();
    } else if let Some(e) = err.find::<warp::filters::body::BodyDeserializeError>() {
        code = StatusCode::BAD_REQUEST;
        message = format!("Invalid request body: {}", e);
    } else if err.find::<warp::reject::PayloadTooLarge>().is_some() {
        code = StatusCode::PAYLOAD_TOO_LARGE;
        message = "Payload Too Large".to_string();
    } else if err.find::<warp::reject::MethodNotAllowed>().is_some() {
        code = StatusCode::METHOD_NOT_ALLOWED;
        message = "Method Not Allowed".to_string();
    } else {
        warn!("Unhandled rejection: {:?}", err);
        code = StatusCode::INTERNAL_SERVER_ERROR;
        message = "Internal Server Error".to_string();
    }

    Ok(warp::reply::with_status(
        warp::reply::json(&serde_json::json!({
            "error": message,
        })),
        code,
    ))
}

pub fn routes(state: AppState) -> impl Filter<Extract = impl Reply, Error = Infallible> + Clone {
    info!("Configuring routes...");

    let state_filter = warp::any().map(move || state.clone());

    let root_route = warp::path::end().and(warp::get()).and_then(root);

    let latest_route = warp::path!("latest" / String)
        .and(warp::get())
        .and(state_filter.clone())
        .and_then(get_latest);

    // Path the dashboard frontend has always called.
    let legacy_latest_route = warp::path!("api" / "get-latest-data" / String)
        .and(warp::get())
        .and(state_filter.clone())
        .and_then(get_latest);

    let insights_route = warp::path!("insights")
        .and(warp::post())
        .and(warp::body::content_length_limit(MAX_BODY_BYTES))
        .and(warp::body::json())
        .and(state_filter.clone())
        .and_then(post_insights);

    info!("All routes configured successfully.");

    root_route
        .or(latest_route)
        .or(legacy_latest_route)
        .or(insights_route)
        .recover(handle_rejection)
}
