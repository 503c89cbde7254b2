//! Chat-completion API client with retry.

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::LlmSettings;

/// Attempts per request, including the first.
const MAX_ATTEMPTS: u32 = 4;

/// Errors from the chat-completion API.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("no API key configured")]
    MissingApiKey,

    #[error("connection failed: {0}")]
    Connection(String),

    #[error("API error (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    #[error("failed to parse response: {0}")]
    Parse(String),
}

impl LlmError {
    /// Transient errors are worth retrying; client errors are not.
    pub fn is_retryable(&self) -> bool {
        match self {
            LlmError::Connection(_) => true,
            LlmError::Api { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: String,
}

/// Client for an OpenAI-compatible chat-completions endpoint.
pub struct LlmClient {
    settings: LlmSettings,
    api_key: String,
    client: Client,
}

impl LlmClient {
    /// Create a client. Fails if no API key is available.
    pub fn new(settings: LlmSettings, api_key: Option<String>) -> Result<Self, LlmError> {
        let api_key = api_key.ok_or(LlmError::MissingApiKey)?;
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(120))
            .build()
            .map_err(|e| LlmError::Connection(e.to_string()))?;
        Ok(Self {
            settings,
            api_key,
            client,
        })
    }

    pub fn settings(&self) -> &LlmSettings {
        &self.settings
    }

    /// Send a system+user prompt pair and return the raw completion text.
    ///
    /// Retries up to [`MAX_ATTEMPTS`] times with exponential backoff
    /// (2s, 4s, 8s) on connection failures, 429s, and 5xx responses.
    /// Other 4xx responses fail immediately.
    pub async fn complete(&self, system: &str, user: &str) -> Result<String, LlmError> {
        let mut last_err = None;

        for attempt in 1..=MAX_ATTEMPTS {
            match self.call_once(system, user).await {
                Ok(text) => return Ok(text),
                Err(e) if e.is_retryable() && attempt < MAX_ATTEMPTS => {
                    let delay = std::time::Duration::from_secs(1 << attempt);
                    warn!(
                        "completion attempt {}/{} failed ({}), retrying in {:?}",
                        attempt, MAX_ATTEMPTS, e, delay
                    );
                    tokio::time::sleep(delay).await;
                    last_err = Some(e);
                }
                Err(e) => return Err(e),
            }
        }

        Err(last_err.unwrap_or_else(|| LlmError::Connection("retries exhausted".to_string())))
    }

    async fn call_once(&self, system: &str, user: &str) -> Result<String, LlmError> {
        let request = ChatRequest {
            model: &self.settings.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system,
                },
                ChatMessage {
                    role: "user",
                    content: user,
                },
            ],
            max_tokens: self.settings.max_tokens,
            temperature: self.settings.temperature,
        };

        let url = format!(
            "{}/chat/completions",
            self.settings.base_url.trim_end_matches('/')
        );
        debug!("calling {} with model {}", url, self.settings.model);

        let resp = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| LlmError::Connection(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(LlmError::Api {
                status: status.as_u16(),
                message: truncate_for_log(&body),
            });
        }

        let parsed: ChatResponse = resp
            .json()
            .await
            .map_err(|e| LlmError::Parse(e.to_string()))?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .unwrap_or_default();

        if content.trim().is_empty() {
            return Err(LlmError::Parse("empty completion".to_string()));
        }
        Ok(content)
    }
}

/// Trim error bodies so logs stay readable (UTF-8 safe).
fn truncate_for_log(body: &str) -> String {
    const MAX: usize = 500;
    if body.len() <= MAX {
        return body.to_string();
    }
    let mut end = MAX;
    while end > 0 && !body.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &body[..end])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retryable_classification() {
        assert!(LlmError::Connection("reset".to_string()).is_retryable());
        assert!(LlmError::Api {
            status: 500,
            message: String::new()
        }
        .is_retryable());
        assert!(LlmError::Api {
            status: 429,
            message: String::new()
        }
        .is_retryable());
        assert!(!LlmError::Api {
            status: 400,
            message: String::new()
        }
        .is_retryable());
        assert!(!LlmError::Api {
            status: 401,
            message: String::new()
        }
        .is_retryable());
        assert!(!LlmError::Parse("bad json".to_string()).is_retryable());
    }

    #[test]
    fn log_truncation_is_utf8_safe() {
        let body = "é".repeat(600);
        let out = truncate_for_log(&body);
        assert!(out.ends_with("..."));
        assert!(out.len() <= 504);
    }
}
