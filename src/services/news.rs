// src/services/news.rs
use async_trait::async_trait;
use log::info;
use reqwest::Client;
use serde::Deserialize;

use super::providers::NewsProvider;
use crate::error::{InsightsError, Result};
use crate::models::NewsItem;

const PROVIDER: &str = "newsapi";

#[derive(Debug, Deserialize)]
struct ArticleSource {
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Article {
    source: ArticleSource,
    title: Option<String>,
    url: Option<String>,
    published_at: Option<String>,
}

#[derive(Debug, Deserialize)]
struct HeadlinesResponse {
    status: String,
    message: Option<String>,
    #[serde(default)]
    articles: Vec<Article>,
}

pub struct NewsApiProvider {
    client: Client,
    api_key: String,
    base_url: String,
}

impl NewsApiProvider {
    pub fn new(client: Client, api_key: String) -> Self {
        NewsApiProvider {
            client,
            api_key,
            base_url: "https://newsapi.org".to_string(),
        }
    }
}

fn into_items(response: HeadlinesResponse) -> Result<Vec<NewsItem>> {
    if response.status != "ok" {
        return Err(InsightsError::provider(
            PROVIDER,
            response.message.unwrap_or_else(|| format!("status {}", response.status)),
        ));
    }

    let items = response
        .articles
        .into_iter()
        .filter_map(|a| {
            let title = a.title.filter(|t| !t.trim().is_empty())?;
            Some((title, a.url.unwrap_or_else(|| "#".to_string()), a.source.name, a.published_at))
        })
        .enumerate()
        .map(|(i, (title, url, source, published))| NewsItem {
            id: (i + 1).to_string(),
            title,
            url,
            source: source.unwrap_or_else(|| "Unknown".to_string()),
            published: published.unwrap_or_default(),
        })
        .collect();
    Ok(items)
}

#[async_trait]
impl NewsProvider for NewsApiProvider {
    async fn fetch_news(&self, category: &str) -> Result<Vec<NewsItem>> {
        let url = format!("{}/v2/top-headlines", self.base_url);
        info!("Fetching {} headlines from {}", category, url);

        let response = self
            .client
            .get(&url)
            .query(&[("category", category), ("country", "us"), ("pageSize", "10")])
            .header("X-Api-Key", &self.api_key)
            .send()
            .await
            .map_err(|e| InsightsError::provider(PROVIDER, e))?
            .json::<HeadlinesResponse>()
            .await
            .map_err(|e| InsightsError::provider(PROVIDER, e))?;

        let items = into_items(response)?;
        info!("Fetched {} headlines", items.len());
        Ok(items)
    }

    fn name(&self) -> &'static str {
        PROVIDER
    }
}

pub struct MockNewsProvider;

#[async_trait]
impl NewsProvider for MockNewsProvider {
    async fn fetch_news(&self, category: &str) -> Result<Vec<NewsItem>> {
        info!("Returning mock {} headlines", category);
        Ok(vec![
            NewsItem {
                id: "1".into(),
                title: "Tech Stocks Rally on Positive News".into(),
                url: "#".into(),
                source: "MarketWatch".into(),
                published: "2h ago".into(),
            },
            NewsItem {
                id: "2".into(),
                title: "AI Chipmaker Announces Record Earnings".into(),
                url: "#".into(),
                source: "Reuters".into(),
                published: "5h ago".into(),
            },
        ])
    }

    fn name(&self) -> &'static str {
        "mock-news"
    }
}
