// src/bin/collector.rs
//! Scheduled job: pull every source, store it, then summarize it.
//! Runs one cycle and exits, or keeps cycling when `COLLECTOR_CRON` is set.
use anyhow::{anyhow, Context};
use dotenv::dotenv;
use log::{error, info};
use std::sync::Arc;
use tokio_cron_scheduler::{Job, JobScheduler};

use insights_hub::config::AppConfig;
use insights_hub::services::collector::{run_cycle, CollectorSettings};
use insights_hub::services::db::DbStore;
use insights_hub::services::providers::Providers;

struct Collector {
    store: DbStore,
    providers: Providers,
    settings: CollectorSettings,
}

impl Collector {
    async fn cycle(&self) {
        let report = run_cycle(&self.store, &self.providers, &self.settings).await;
        if report.failures() > 0 {
            error!("Collection cycle finished with {} failure(s)", report.failures());
        } else {
            info!("Collection cycle finished successfully");
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    env_logger::init();
    info!("Starting scheduled data fetch job...");

    let config = AppConfig::from_env().context("invalid configuration")?;

    // Without a store there is nothing useful to do: fail fast.
    let store = DbStore::new(&config.database_url)
        .await
        .context("cannot proceed without a database connection")?;
    store.init_schema().await.context("failed to prepare schema")?;

    let collector = Arc::new(Collector {
        store,
        providers: Providers::from_config(&config.providers)?,
        settings: CollectorSettings::from(&config),
    });

    let cron = match config.collector_cron {
        Some(cron) => cron,
        None => {
            collector.cycle().await;
            info!("Scheduled data fetch job finished.");
            return Ok(());
        }
    };

    info!("Scheduling collection with cron expression '{}'", cron);
    let mut sched = JobScheduler::new()
        .await
        .map_err(|e| anyhow!("failed to create scheduler: {:?}", e))?;

    let job_collector = collector.clone();
    let job = Job::new_async(cron.as_str(), move |_uuid, _lock| {
        let collector = job_collector.clone();
        Box::pin(async move {
            collector.cycle().await;
        })
    })
    .map_err(|e| anyhow!("invalid COLLECTOR_CRON '{}': {:?}", cron, e))?;

    sched
        .add(job)
        .await
        .map_err(|e| anyhow!("failed to add collection job: {:?}", e))?;
    sched
        .start()
        .await
        .map_err(|e| anyhow!("failed to start scheduler: {:?}", e))?;

    tokio::signal::ctrl_c().await?;
    info!("Shutting down collector scheduler");
    sched
        .shutdown()
        .await
        .map_err(|e| anyhow!("scheduler shutdown failed: {:?}", e))?;
    Ok(())
}
