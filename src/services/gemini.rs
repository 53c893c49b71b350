// src/services/gemini.rs
use async_trait::async_trait;
use log::{debug, info};
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::providers::TextGenerator;
use crate::error::{InsightsError, Result};

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<ResponseContent>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    error: Option<ApiErrorBody>,
}

fn first_text(response: GenerateResponse) -> Result<String> {
    if let Some(err) = response.error {
        return Err(InsightsError::Generation(err.message));
    }
    let text: String = response
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect::<Vec<_>>().join(""))
        .unwrap_or_default();

    if text.trim().is_empty() {
        return Err(InsightsError::Generation("model returned no text".into()));
    }
    Ok(text.trim().to_string())
}

pub struct GeminiGenerator {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl GeminiGenerator {
    pub fn new(client: Client, api_key: String, model: String) -> Self {
        GeminiGenerator {
            client,
            api_key,
            model,
            base_url: "https://generativelanguage.googleapis.com".to_string(),
        }
    }
}

#[async_trait]
impl TextGenerator for GeminiGenerator {
    async fn generate(&self, prompt: &str) -> Result<String> {
        let url = format!("{}/v1beta/models/{}:generateContent", self.base_url, self.model);
        info!("Requesting generation from {}", self.model);
        debug!("Prompt length: {} chars", prompt.len());

        let body = GenerateRequest {
            contents: vec![Content {
                parts: vec![Part { text: prompt }],
            }],
        };

        let response = self
            .client
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(&body)
            .send()
            .await
            .map_err(|e| InsightsError::Generation(e.to_string()))?
            .json::<GenerateResponse>()
            .await
            .map_err(|e| InsightsError::Generation(e.to_string()))?;

        first_text(response)
    }

    fn name(&self) -> &'static str {
        "gemini"
    }
}

/// Canned commentary for local runs.
pub struct MockTextGenerator {
    pub reply: String,
}

impl Default for MockTextGenerator {
    fn default() -> Self {
        MockTextGenerator {
            reply: "Summary: activity is stable with no material anomalies.\n\
                    1. Keep monitoring the trend against its moving average.\n\
                    2. Review exposure if momentum turns overbought.\n\
                    3. Revisit the position after the next earnings cycle."
                .to_string(),
        }
    }
}

#[async_trait]
impl TextGenerator for MockTextGenerator {
    async fn generate(&self, _prompt: &str) -> Result<String> {
        Ok(self.reply.clone())
    }

    fn name(&self) -> &'static str {
        "mock-llm"
    }
}
