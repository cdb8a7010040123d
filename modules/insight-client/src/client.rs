use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::util::strip_code_blocks;
use crate::{InsightError, InsightTransport};

const INSIGHT_API_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
const INSIGHT_MODEL: &str = "gemini-2.5-flash";

/// Replies shorter than this are treated as empty (the service
/// occasionally returns a lone punctuation mark or whitespace).
const MIN_REPLY_BYTES: usize = 5;

pub struct InsightClient {
    api_key: String,
    http: reqwest::Client,
    base_url: String,
    model: String,
    timeout: Duration,
}

impl InsightClient {
    pub fn new(api_key: &str, timeout: Duration) -> Self {
        Self {
            api_key: api_key.to_string(),
            http: reqwest::Client::new(),
            base_url: INSIGHT_API_URL.to_string(),
            model: INSIGHT_MODEL.to_string(),
            timeout,
        }
    }

    pub fn with_base_url(mut self, url: &str) -> Self {
        self.base_url = url.to_string();
        self
    }
}

#[async_trait]
impl InsightTransport for InsightClient {
    async fn generate(&self, prompt: &str, temperature: f32) -> Result<String, InsightError> {
        let url = format!(
            "{}/models/{}:generateContent?key={}",
            self.base_url, self.model, self.api_key
        );

        let request = GenerateRequest {
            contents: vec![WireContent {
                parts: vec![WirePart {
                    text: prompt.to_string(),
                }],
            }],
            generation_config: GenerationConfig {
                temperature,
                top_p: 0.8,
                top_k: 40,
            },
            // Search grounding: lets the model consult live web results.
            tools: vec![serde_json::json!({ "google_search": {} })],
        };

        debug!(model = %self.model, temperature, "Insight generate request");

        let response = self
            .http
            .post(&url)
            .json(&request)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(classify_reqwest_error)?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(InsightError::Api { status, body });
        }

        let reply: GenerateResponse = response
            .json()
            .await
            .map_err(classify_reqwest_error)?;

        let text = reply
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content.parts.into_iter().next())
            .map(|p| p.text)
            .ok_or(InsightError::EmptyResponse)?;

        let text = strip_code_blocks(&text);
        if text.len() < MIN_REPLY_BYTES {
            return Err(InsightError::EmptyResponse);
        }

        Ok(text.to_string())
    }
}

fn classify_reqwest_error(e: reqwest::Error) -> InsightError {
    if e.is_timeout() {
        InsightError::Timeout
    } else {
        InsightError::Transport(e.to_string())
    }
}

// --- Wire types ---

#[derive(Serialize)]
struct GenerateRequest {
    contents: Vec<WireContent>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
    tools: Vec<serde_json::Value>,
}

#[derive(Serialize, Deserialize)]
struct WireContent {
    parts: Vec<WirePart>,
}

#[derive(Serialize, Deserialize)]
struct WirePart {
    text: String,
}

#[derive(Serialize)]
struct GenerationConfig {
    temperature: f32,
    #[serde(rename = "topP")]
    top_p: f32,
    #[serde(rename = "topK")]
    top_k: u32,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: WireContent,
}
