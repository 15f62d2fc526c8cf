//! Chat-completions client — the remote generative text API.
//!
//! Used by: title synthesis, slot-count inference, chat replies.
//! Retry logic: 1 retry on failure. Timeout on every call.

use std::time::Duration;

use serde_json::json;

use crate::config::{CompletionsConfig, MarketConfig};
use crate::constants::COMPLETION_MAX_RETRIES;
use crate::error::{MarketError, MarketResult};

/// One request to the generative API.
#[derive(Debug, Clone)]
pub struct ChatTask {
    pub system: String,
    pub user: String,
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f64,
}

/// Seam between the enrichment/chat code and the remote API.
pub trait CompletionBackend: Send + Sync {
    /// Run one completion, returning the trimmed message content.
    fn complete(&self, task: &ChatTask) -> MarketResult<String>;
}

/// Production backend: OpenAI-shaped chat completions over HTTP.
pub struct OpenAiBackend {
    endpoint: String,
    api_key: Option<String>,
    timeout: Duration,
}

impl OpenAiBackend {
    pub fn new(config: &CompletionsConfig, api_key: Option<String>) -> Self {
        Self {
            endpoint: config.endpoint.clone(),
            api_key,
            timeout: Duration::from_secs(config.timeout_secs),
        }
    }

    pub fn from_config(config: &MarketConfig) -> Self {
        Self::new(&config.completions, config.api_key())
    }

    fn execute(&self, task: &ChatTask) -> MarketResult<String> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| MarketError::Completion("No API key configured".into()))?;

        let body = json!({
            "model": task.model,
            "messages": [
                { "role": "system", "content": task.system },
                { "role": "user", "content": task.user },
            ],
            "max_tokens": task.max_tokens,
            "temperature": task.temperature,
        });

        let mut response = ureq::post(&self.endpoint)
            .header("Authorization", &format!("Bearer {api_key}"))
            .config()
            .timeout_global(Some(self.timeout))
            .build()
            .send_json(&body)?;

        let payload: serde_json::Value = response.body_mut().read_json()?;
        let content = payload["choices"][0]["message"]["content"]
            .as_str()
            .ok_or_else(|| MarketError::Completion("Response missing message content".into()))?
            .trim()
            .to_string();

        if content.is_empty() {
            return Err(MarketError::Completion("Empty completion".into()));
        }
        Ok(content)
    }
}

impl CompletionBackend for OpenAiBackend {
    fn complete(&self, task: &ChatTask) -> MarketResult<String> {
        let mut last_err = None;

        for attempt in 0..=COMPLETION_MAX_RETRIES {
            match self.execute(task) {
                Ok(content) => return Ok(content),
                Err(e) => {
                    tracing::warn!(
                        model = %task.model,
                        attempt = attempt + 1,
                        max = COMPLETION_MAX_RETRIES + 1,
                        error = %e,
                        "Completion attempt failed"
                    );
                    last_err = Some(e);
                }
            }
        }

        Err(last_err.unwrap_or_else(|| MarketError::Completion("All retries failed".into())))
    }
}
