//! Ollama chat client used for commentary.
//!
//! Sends a single non-streaming chat request per attempt. Transient
//! failures (timeouts, refused connections, 5xx) are retried with a
//! linear backoff; anything else fails immediately.

use crate::config::NarrationConfig;
use crate::error::NarrationError;
use crate::narration::{NarrationPayload, Narrator};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Delay added per failed attempt.
const RETRY_BACKOFF: Duration = Duration::from_secs(2);

/// Message in the chat history.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

/// Ollama chat API request.
#[derive(Debug, Serialize)]
struct OllamaChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    stream: bool,
    options: OllamaOptions,
}

#[derive(Debug, Serialize)]
struct OllamaOptions {
    temperature: f32,
}

/// Ollama chat API response.
#[derive(Debug, Deserialize)]
struct OllamaChatResponse {
    message: ChatMessage,
}

/// Narrator backed by an Ollama server.
pub struct OllamaNarrator {
    config: NarrationConfig,
    http_client: reqwest::Client,
}

impl OllamaNarrator {
    /// Create a narrator from its configuration.
    pub fn new(config: NarrationConfig) -> Result<Self, NarrationError> {
        info!(
            "Initializing narrator with model {} at {}",
            config.model, config.ollama_url
        );

        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| NarrationError::Request(e.to_string()))?;

        Ok(Self {
            config,
            http_client,
        })
    }

    fn chat_url(&self) -> String {
        format!("{}/api/chat", self.config.ollama_url.trim_end_matches('/'))
    }

    fn build_request(&self, payload: &NarrationPayload) -> OllamaChatRequest {
        OllamaChatRequest {
            model: self.config.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: SYSTEM_PROMPT.to_string(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: payload.to_prompt(),
                },
            ],
            stream: false,
            options: OllamaOptions {
                temperature: self.config.temperature,
            },
        }
    }

    /// One request, no retries.
    async fn send_once(&self, request: &OllamaChatRequest) -> Result<String, NarrationError> {
        let response = self
            .http_client
            .post(self.chat_url())
            .json(request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    NarrationError::Timeout(self.config.timeout_seconds)
                } else if e.is_connect() {
                    NarrationError::Connect(self.config.ollama_url.clone())
                } else {
                    NarrationError::Request(e.to_string())
                }
            })?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(NarrationError::Api { status, body });
        }

        let chat_response: OllamaChatResponse = response
            .json()
            .await
            .map_err(|e| NarrationError::Decode(e.to_string()))?;

        Ok(chat_response.message.content.trim().to_string())
    }
}

impl Narrator for OllamaNarrator {
    fn model_name(&self) -> &str {
        &self.config.model
    }

    async fn narrate(&self, payload: &NarrationPayload) -> Result<String, NarrationError> {
        let request = self.build_request(payload);
        let attempts = self.config.retries.max(1);

        let mut attempt = 1;
        loop {
            debug!("Narration attempt {}/{}", attempt, attempts);
            match self.send_once(&request).await {
                Ok(text) => return Ok(text),
                Err(e) if e.is_transient() && attempt < attempts => {
                    warn!("Narration attempt {} failed: {}", attempt, e);
                    tokio::time::sleep(RETRY_BACKOFF * attempt as u32).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

/// System prompt for the commentary request.
const SYSTEM_PROMPT: &str = r#"You are an HR performance analyst.
You receive descriptive statistics of KPI scores for a team and, when present,
how one worker's score compares with the team average.
Explain the numbers plainly. Do not invent figures that are not in the input.
Keep the answer under 200 words."#;
