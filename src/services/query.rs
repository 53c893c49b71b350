// src/services/query.rs
use chrono::{DateTime, Utc};
use log::{debug, warn};
use serde::Serialize;

use super::db::LatestStore;
use crate::error::{InsightsError, Result};
use crate::models::{DataSource, NewsDigest};

pub const NO_INSIGHTS_YET: &str = "No insights generated yet.";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CombinedView {
    pub source: DataSource,
    pub data: serde_json::Value,
    pub insights: String,
    pub data_updated_at: Option<DateTime<Utc>>,
    pub insights_updated_at: Option<DateTime<Utc>>,
}

/// Latest data and latest insight for `source`, read independently.
///
/// The transactions-style source (`plaid`) also carries the `openbb` headlines
/// under `data.news`.
pub async fn get_combined(store: &dyn LatestStore, source: DataSource) -> Result<CombinedView> {
    let record = store.latest_source(source).await?;
    let insight = store.latest_insight(source).await?;

    if record.is_none() && insight.is_none() {
        return Err(InsightsError::NotFound(source.to_string()));
    }

    let data_updated_at = record.as_ref().map(|r| r.updated_at);
    let mut data = record.map(|r| r.payload).unwrap_or(serde_json::Value::Null);

    if source == DataSource::Plaid {
        if let serde_json::Value::Object(map) = &mut data {
            if let Some(digest) = latest_news(store).await? {
                debug!("Attaching {} headlines to {} view", digest.news.len(), source);
                map.insert("news".to_string(), serde_json::to_value(digest.news)?);
            }
        }
    }

    let (insights, insights_updated_at) = match insight {
        Some(i) => (i.insight_text, Some(i.updated_at)),
        None => (NO_INSIGHTS_YET.to_string(), None),
    };

    Ok(CombinedView {
        source,
        data,
        insights,
        data_updated_at,
        insights_updated_at,
    })
}

async fn latest_news(store: &dyn LatestStore) -> Result<Option<NewsDigest>> {
    let record = match store.latest_source(DataSource::Openbb).await? {
        Some(record) => record,
        None => return Ok(None),
    };
    match serde_json::from_value::<NewsDigest>(record.payload) {
        Ok(digest) => Ok(Some(digest)),
        Err(e) => {
            warn!("Stored news record is malformed, not attaching it: {}", e);
            Ok(None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::db::MemoryStore;
    use serde_json::json;

    #[tokio::test]
    async fn nothing_stored_is_not_found() {
        let store = MemoryStore::new();
        let err = get_combined(&store, DataSource::Clearbit).await.unwrap_err();
        assert!(matches!(err, InsightsError::NotFound(s) if s == "clearbit"));
    }

    #[tokio::test]
    async fn data_without_insight_gets_placeholder() {
        let store = MemoryStore::new();
        store
            .upsert_source(DataSource::Clearbit, &json!({ "companyName": "Innovate Inc." }), Utc::now())
            .await
            .unwrap();

        let view = get_combined(&store, DataSource::Clearbit).await.unwrap();
        assert_eq!(view.data["companyName"], "Innovate Inc.");
        assert_eq!(view.insights, NO_INSIGHTS_YET);
        assert!(view.insights_updated_at.is_none());
    }

    #[tokio::test]
    async fn insight_without_data_is_still_returned() {
        let store = MemoryStore::new();
        store.upsert_insight(DataSource::Openbb, "old take", Utc::now()).await.unwrap();

        let view = get_combined(&store, DataSource::Openbb).await.unwrap();
        assert_eq!(view.data, serde_json::Value::Null);
        assert_eq!(view.insights, "old take");
    }

    #[tokio::test]
    async fn plaid_view_carries_openbb_news() {
        let store = MemoryStore::new();
        store
            .upsert_source(DataSource::Plaid, &json!({ "symbol": "AAPL", "eod": [], "performance": null }), Utc::now())
            .await
            .unwrap();
        store
            .upsert_source(
                DataSource::Openbb,
                &json!({ "category": "business", "news": [
                    { "id": "1", "title": "Fed holds rates", "url": "#", "source": "Reuters", "published": "1h ago" }
                ]}),
                Utc::now(),
            )
            .await
            .unwrap();

        let view = get_combined(&store, DataSource::Plaid).await.unwrap();
        assert_eq!(view.data["news"][0]["title"], "Fed holds rates");
        assert_eq!(view.data["symbol"], "AAPL");

        // the join is one-way
        let news_view = get_combined(&store, DataSource::Openbb).await.unwrap();
        assert!(news_view.data.get("eod").is_none());
    }

    #[tokio::test]
    async fn malformed_news_record_is_ignored() {
        let store = MemoryStore::new();
        store
            .upsert_source(DataSource::Plaid, &json!({ "symbol": "AAPL", "eod": [] }), Utc::now())
            .await
            .unwrap();
        store.upsert_source(DataSource::Openbb, &json!(["garbage"]), Utc::now()).await.unwrap();

        let view = get_combined(&store, DataSource::Plaid).await.unwrap();
        assert!(view.data.get("news").is_none());
    }
}
