// src/bin/setup_db.rs
use anyhow::Context;
use dotenv::dotenv;
use log::info;

use insights_hub::config::AppConfig;
use insights_hub::services::db::DbStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    env_logger::init();

    let config = AppConfig::from_env().context("invalid configuration")?;
    let store = DbStore::new(&config.database_url).await?;
    store.init_schema().await?;

    info!("Database setup complete!");
    println!("Database setup complete!");
    Ok(())
}
