//! Gemini REST backend.
//!
//! Sends one non-streaming `generateContent` request per prompt and joins
//! the text parts of the first candidate.

use std::time::{Duration, Instant};

use serde_json::{Value, json};
use tracing::{debug, info};

use crate::config::LlmConfig;
use crate::error::{ChronoError, Result};
use crate::llm::ModelClient;

/// Model client for the Gemini `generateContent` endpoint.
pub struct GeminiClient {
    agent: ureq::Agent,
    url: String,
    api_key: String,
    temperature: f64,
}

impl GeminiClient {
    /// Create a client from the model section of the config.
    ///
    /// # Errors
    ///
    /// Returns [`ChronoError::Config`] when no API key or model name is
    /// configured.
    pub fn new(config: &LlmConfig) -> Result<Self> {
        if !config.has_api_key() {
            return Err(ChronoError::Config("no API key configured".to_owned()));
        }
        let model = config.model.trim();
        if model.is_empty() {
            return Err(ChronoError::Config("no model name configured".to_owned()));
        }

        let agent = ureq::AgentBuilder::new()
            .timeout(Duration::from_secs(config.timeout_secs.max(1)))
            .build();

        let url = endpoint_url(&config.api_url, model);
        info!("Gemini client configured: model={model}");

        Ok(Self {
            agent,
            url,
            api_key: config.api_key.trim().to_owned(),
            temperature: config.temperature,
        })
    }

    /// Full request URL, without credentials.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }
}

impl ModelClient for GeminiClient {
    fn name(&self) -> &str {
        "gemini"
    }

    fn generate(&self, prompt: &str) -> Result<String> {
        let body = json!({
            "contents": [{
                "role": "user",
                "parts": [{ "text": prompt }],
            }],
            "generationConfig": {
                "temperature": self.temperature,
            },
        });
        let body_str = serde_json::to_string(&body)
            .map_err(|e| ChronoError::Llm(format!("JSON serialization failed: {e}")))?;

        let started = Instant::now();
        let response = self
            .agent
            .post(&self.url)
            .set("Content-Type", "application/json")
            .set("x-goog-api-key", &self.api_key)
            .send_string(&body_str)
            .map_err(|e| match e {
                ureq::Error::Status(code, _) => {
                    ChronoError::Llm(format!("model API returned status {code}"))
                }
                ureq::Error::Transport(t) => ChronoError::Llm(format!("API request failed: {t}")),
            })?;

        let text = response
            .into_string()
            .map_err(|e| ChronoError::Llm(format!("read error: {e}")))?;
        let value: Value = serde_json::from_str(&text)
            .map_err(|e| ChronoError::Llm(format!("JSON parse error: {e}")))?;

        let reply = candidate_text(&value)
            .ok_or_else(|| ChronoError::Llm("model response contained no text".to_owned()))?;
        debug!(
            "model replied with {} chars in {:.2}s",
            reply.len(),
            started.elapsed().as_secs_f64()
        );
        Ok(reply)
    }
}

fn endpoint_url(api_url: &str, model: &str) -> String {
    let base = api_url.trim_end_matches('/');
    let model = model.strip_prefix("models/").unwrap_or(model);
    format!("{base}/v1beta/models/{model}:generateContent")
}

/// Concatenated text parts of the first candidate, trimmed.
fn candidate_text(value: &Value) -> Option<String> {
    let parts = value["candidates"][0]["content"]["parts"].as_array()?;
    let text: String = parts.iter().filter_map(|p| p["text"].as_str()).collect();
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_owned())
}
