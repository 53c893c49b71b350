// src/services/db.rs
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::{debug, info};
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::Row;
use std::collections::HashMap;
use std::sync::Mutex;

use crate::error::{InsightsError, Result};
use crate::models::{DataSource, InsightRecord, SourceRecord};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS source_records (
    source_name TEXT PRIMARY KEY,
    payload JSONB NOT NULL,
    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);
CREATE TABLE IF NOT EXISTS insight_records (
    source_name TEXT PRIMARY KEY,
    insight_text TEXT NOT NULL,
    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
)
"#;

/// Two "latest wins" tables keyed by source name. Writes replace, reads never
/// see history, nothing is ever deleted.
#[async_trait]
pub trait LatestStore: Send + Sync {
    async fn upsert_source(&self, source: DataSource, payload: &serde_json::Value, at: DateTime<Utc>) -> Result<()>;

    async fn latest_source(&self, source: DataSource) -> Result<Option<SourceRecord>>;

    async fn upsert_insight(&self, source: DataSource, text: &str, at: DateTime<Utc>) -> Result<()>;

    async fn latest_insight(&self, source: DataSource) -> Result<Option<InsightRecord>>;
}

pub struct DbStore {
    pub(crate) pool: PgPool,
}

impl DbStore {
    pub async fn new(database_url: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await?;
        info!("Connected to Postgres");
        Ok(Self { pool })
    }

    pub async fn init_schema(&self) -> Result<()> {
        for statement in SCHEMA.split(';') {
            let stmt = statement.trim();
            if !stmt.is_empty() {
                sqlx::query(stmt).execute(&self.pool).await?;
            }
        }
        info!("Schema checked/created");
        Ok(())
    }
}

#[async_trait]
impl LatestStore for DbStore {
    async fn upsert_source(&self, source: DataSource, payload: &serde_json::Value, at: DateTime<Utc>) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO source_records (source_name, payload, updated_at)
            VALUES ($1, $2, $3)
            ON CONFLICT (source_name) DO UPDATE SET
                payload = EXCLUDED.payload,
                updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(source.as_str())
        .bind(sqlx::types::Json(payload))
        .bind(at)
        .execute(&self.pool)
        .await?;

        debug!("Upserted source record for {}", source);
        Ok(())
    }

    async fn latest_source(&self, source: DataSource) -> Result<Option<SourceRecord>> {
        let row = sqlx::query("SELECT source_name, payload, updated_at FROM source_records WHERE source_name = $1")
            .bind(source.as_str())
            .fetch_optional(&self.pool)
            .await?;

        row.map(|r| -> Result<SourceRecord> {
            let sqlx::types::Json(payload) = r.try_get::<sqlx::types::Json<serde_json::Value>, _>("payload")?;
            Ok(SourceRecord {
                source_name: r.try_get("source_name")?,
                payload,
                updated_at: r.try_get("updated_at")?,
            })
        })
        .transpose()
    }

    async fn upsert_insight(&self, source: DataSource, text: &str, at: DateTime<Utc>) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO insight_records (source_name, insight_text, updated_at)
            VALUES ($1, $2, $3)
            ON CONFLICT (source_name) DO UPDATE SET
                insight_text = EXCLUDED.insight_text,
                updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(source.as_str())
        .bind(text)
        .bind(at)
        .execute(&self.pool)
        .await?;

        debug!("Upserted insight record for {}", source);
        Ok(())
    }

    async fn latest_insight(&self, source: DataSource) -> Result<Option<InsightRecord>> {
        let row = sqlx::query("SELECT source_name, insight_text, updated_at FROM insight_records WHERE source_name = $1")
            .bind(source.as_str())
            .fetch_optional(&self.pool)
            .await?;

        row.map(|r| -> Result<InsightRecord> {
            Ok(InsightRecord {
                source_name: r.try_get("source_name")?,
                insight_text: r.try_get("insight_text")?,
                updated_at: r.try_get("updated_at")?,
            })
        })
        .transpose()
    }
}

/// In-process store with the same replace-on-write semantics. Each upsert is a
/// single map insert under the lock, so the last writer to take it wins.
#[derive(Default)]
pub struct MemoryStore {
    sources: Mutex<HashMap<DataSource, SourceRecord>>,
    insights: Mutex<HashMap<DataSource, InsightRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn source_count(&self) -> usize {
        self.sources.lock().map(|m| m.len()).unwrap_or(0)
    }

    pub fn insight_count(&self) -> usize {
        self.insights.lock().map(|m| m.len()).unwrap_or(0)
    }
}

fn poisoned<T>(_: T) -> InsightsError {
    InsightsError::StoreUnavailable("memory store lock poisoned".into())
}

#[async_trait]
impl LatestStore for MemoryStore {
    async fn upsert_source(&self, source: DataSource, payload: &serde_json::Value, at: DateTime<Utc>) -> Result<()> {
        let record = SourceRecord {
            source_name: source.as_str().to_string(),
            payload: payload.clone(),
            updated_at: at,
        };
        self.sources.lock().map_err(poisoned)?.insert(source, record);
        Ok(())
    }

    async fn latest_source(&self, source: DataSource) -> Result<Option<SourceRecord>> {
        Ok(self.sources.lock().map_err(poisoned)?.get(&source).cloned())
    }

    async fn upsert_insight(&self, source: DataSource, text: &str, at: DateTime<Utc>) -> Result<()> {
        let record = InsightRecord {
            source_name: source.as_str().to_string(),
            insight_text: text.to_string(),
            updated_at: at,
        };
        self.insights.lock().map_err(poisoned)?.insert(source, record);
        Ok(())
    }

    async fn latest_insight(&self, source: DataSource) -> Result<Option<InsightRecord>> {
        Ok(self.insights.lock().map_err(poisoned)?.get(&source).cloned())
    }
}
