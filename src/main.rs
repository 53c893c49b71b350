use anyhow::Context;
use dotenv::dotenv;
use log::info;
use std::net::SocketAddr;
use std::sync::Arc;
use warp::Filter;

use insights_hub::config::AppConfig;
use insights_hub::handlers::AppState;
use insights_hub::routes;
use insights_hub::services::db::DbStore;
use insights_hub::services::providers::Providers;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    env_logger::init();
    info!("Logger initialized. Starting the application...");

    let config = AppConfig::from_env().context("invalid configuration")?;

    let store = DbStore::new(&config.database_url)
        .await
        .context("failed to connect to the database")?;
    store.init_schema().await.context("failed to prepare schema")?;

    let providers = Providers::from_config(&config.providers)?;
    let state = AppState {
        store: Arc::new(store),
        generator: providers.generator,
    };

    // Bind to 0.0.0.0 so the service is reachable inside containers
    let addr: SocketAddr = ([0, 0, 0, 0], config.port).into();
    info!("Will bind to: {}", addr);

    let cors = warp::cors()
        .allow_any_origin()
        .allow_header("content-type")
        .allow_methods(vec!["GET", "POST"]);

    let api = routes::routes(state).with(cors).with(warp::log("insights_hub::http"));
    info!("Routes configured successfully with CORS.");

    info!("Starting server on {}", addr);
    warp::serve(api).run(addr).await;
    Ok(())
}
