use std::time::{Duration, Instant};

use anyhow::{anyhow, Context, Result};
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info};

use crate::config::AppConfig;

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

/// Thin client for an OpenAI-compatible chat-completion endpoint. The
/// configured timeout bounds the whole round trip, so a hung provider can
/// never stall a chat submission indefinitely.
pub struct LlmClient {
    client: Client,
    endpoint: String,
    api_key: String,
    model: String,
}

impl LlmClient {
    pub fn new(cfg: &AppConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(cfg.timeout_secs))
            .build()
            .context("building HTTP client")?;
        Ok(Self {
            client,
            endpoint: chat_endpoint(&cfg.api_base),
            api_key: cfg.api_key.clone(),
            model: cfg.model.clone(),
        })
    }

    /// One chat-completion round trip; returns the assistant's text.
    pub async fn complete(&self, system: &str, user: &str) -> Result<String> {
        let start = Instant::now();

        debug!("LLM call starting - prompt_length={} chars", user.len());

        let payload = json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": system },
                { "role": "user", "content": user }
            ],
        });

        let resp = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await
            .with_context(|| format!("request failed for {}", self.endpoint))?
            .error_for_status()
            .with_context(|| format!("HTTP error from {}", self.endpoint))?;

        let body: ChatResponse = resp
            .json()
            .await
            .context("decoding completion response")?;
        let answer = body
            .choices
            .first()
            .map(|c| c.message.content.trim().to_string())
            .ok_or_else(|| anyhow!("completion response had no choices"))?;

        let elapsed = start.elapsed();
        info!(
            "LLM API call completed - duration={:.2}s, response_length={} chars",
            elapsed.as_secs_f32(),
            answer.len()
        );

        Ok(answer)
    }
}

fn chat_endpoint(api_base: &str) -> String {
    if api_base.contains("/chat/completions") {
        api_base.to_string()
    } else {
        format!("{}/chat/completions", api_base.trim_end_matches('/'))
    }
}
