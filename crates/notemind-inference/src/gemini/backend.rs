//! Gemini inference backend implementation.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, info, warn};

use notemind_core::logging::SLOW_MODEL_CALL_MS;
use notemind_core::{ChatPrompt, ChatRole, Error, GenerationBackend, Result};

use super::error::{to_notemind_error, GeminiErrorCode};
use super::types::*;

/// Default Generative Language API endpoint.
pub const DEFAULT_GEMINI_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Default generation model.
pub const DEFAULT_GEN_MODEL: &str = "gemini-2.0-flash";

/// Default timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Default output token cap.
pub const DEFAULT_MAX_OUTPUT_TOKENS: u32 = 2048;

/// Configuration for the Gemini backend.
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    /// Base URL for the API endpoint.
    pub base_url: String,
    /// API key, sent as `x-goog-api-key`.
    pub api_key: Option<String>,
    /// Model to use for generation.
    pub gen_model: String,
    /// Request timeout in seconds.
    pub timeout_seconds: u64,
    /// Sampling temperature (provider default when unset).
    pub temperature: Option<f32>,
    /// Maximum output tokens.
    pub max_output_tokens: u32,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_GEMINI_URL.to_string(),
            api_key: None,
            gen_model: DEFAULT_GEN_MODEL.to_string(),
            timeout_seconds: DEFAULT_TIMEOUT_SECS,
            temperature: None,
            max_output_tokens: DEFAULT_MAX_OUTPUT_TOKENS,
        }
    }
}

impl GeminiConfig {
    /// Read configuration from `GEMINI_*` environment variables.
    pub fn from_env() -> Self {
        Self {
            base_url: std::env::var("GEMINI_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_GEMINI_URL.to_string()),
            api_key: std::env::var("GEMINI_API_KEY")
                .ok()
                .filter(|k| !k.trim().is_empty()),
            gen_model: std::env::var("GEMINI_MODEL")
                .unwrap_or_else(|_| DEFAULT_GEN_MODEL.to_string()),
            timeout_seconds: std::env::var("GEMINI_TIMEOUT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_TIMEOUT_SECS),
            temperature: std::env::var("GEMINI_TEMPERATURE")
                .ok()
                .and_then(|s| s.parse().ok()),
            max_output_tokens: std::env::var("GEMINI_MAX_OUTPUT_TOKENS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_MAX_OUTPUT_TOKENS),
        }
    }
}

/// Gemini generation backend.
pub struct GeminiBackend {
    client: Client,
    config: GeminiConfig,
}

impl GeminiBackend {
    /// Create a new Gemini backend with the given configuration.
    pub fn new(config: GeminiConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| Error::Inference(format!("Failed to create HTTP client: {}", e)))?;

        info!(
            subsystem = "inference",
            component = "gemini",
            model = %config.gen_model,
            url = %config.base_url,
            has_api_key = config.api_key.is_some(),
            "Initializing Gemini backend"
        );

        Ok(Self { client, config })
    }

    /// Create from environment variables.
    pub fn from_env() -> Result<Self> {
        Self::new(GeminiConfig::from_env())
    }

    /// Get the current configuration.
    pub fn config(&self) -> &GeminiConfig {
        &self.config
    }

    fn build_request(&self) -> reqwest::RequestBuilder {
        let url = format!(
            "{}/models/{}:generateContent",
            self.config.base_url.trim_end_matches('/'),
            self.config.gen_model
        );
        let mut req = self.client.post(&url);

        if let Some(ref api_key) = self.config.api_key {
            req = req.header("x-goog-api-key", api_key);
        }

        req.header("Content-Type", "application/json")
    }

    /// Translate a prompt into the provider's wire format.
    ///
    /// History must already start with a user turn; consecutive turns with the
    /// same role are merged because the API requires strict alternation.
    pub fn build_body(&self, prompt: &ChatPrompt) -> GenerateContentRequest {
        let mut contents: Vec<Content> = Vec::with_capacity(prompt.history.len() + 1);
        let turns = prompt
            .history
            .iter()
            .map(|t| (t.role, t.content.as_str()))
            .chain(std::iter::once((ChatRole::User, prompt.message.as_str())));

        for (role, text) in turns {
            let role = match role {
                ChatRole::User => "user",
                ChatRole::Assistant => "model",
            };
            match contents.last_mut() {
                Some(last) if last.role.as_deref() == Some(role) => {
                    last.parts.push(Part {
                        text: Some(text.to_string()),
                    });
                }
                _ => contents.push(Content::text(Some(role), text)),
            }
        }

        GenerateContentRequest {
            system_instruction: if prompt.system.is_empty() {
                None
            } else {
                Some(Content::text(None, prompt.system.clone()))
            },
            contents,
            generation_config: Some(GenerationConfig {
                temperature: self.config.temperature,
                max_output_tokens: Some(self.config.max_output_tokens),
                response_mime_type: prompt
                    .json_output
                    .then(|| "application/json".to_string()),
            }),
        }
    }
}

#[async_trait]
impl GenerationBackend for GeminiBackend {
    async fn generate_chat(&self, prompt: &ChatPrompt) -> Result<String> {
        let start = Instant::now();
        debug!(
            subsystem = "inference",
            component = "gemini",
            op = "generate",
            model = %self.config.gen_model,
            prompt_len = prompt.len(),
            history_len = prompt.history.len(),
            json_output = prompt.json_output,
            "Generating"
        );

        let response = self
            .build_request()
            .json(&self.build_body(prompt))
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    Error::Timeout(format!("Gemini request timed out: {}", e))
                } else {
                    Error::Inference(format!("Request failed: {}", e))
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body: GeminiErrorResponse =
                response.json().await.unwrap_or(GeminiErrorResponse {
                    error: GeminiError {
                        code: status.as_u16(),
                        message: "Unknown error".to_string(),
                        status: "UNKNOWN".to_string(),
                    },
                });
            let code = GeminiErrorCode::from_response(status.as_u16(), &body.error.status);
            warn!(
                subsystem = "inference",
                component = "gemini",
                op = "generate",
                status = status.as_u16(),
                retryable = code.is_retryable(),
                error = %body.error.message,
                "Gemini returned an error"
            );
            return Err(to_notemind_error(
                code,
                &format!("Gemini returned {}: {}", status, body.error.message),
            ));
        }

        let result: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| Error::Inference(format!("Failed to parse response: {}", e)))?;

        let content = match result.first_text() {
            Some(text) => text,
            None => {
                let reason = result
                    .prompt_feedback
                    .and_then(|f| f.block_reason)
                    .or_else(|| result.candidates.first().and_then(|c| c.finish_reason.clone()))
                    .unwrap_or_else(|| "no candidates".to_string());
                return Err(Error::Inference(format!(
                    "Gemini returned no text ({})",
                    reason
                )));
            }
        };

        let duration_ms = start.elapsed().as_millis() as u64;
        if duration_ms > SLOW_MODEL_CALL_MS {
            warn!(
                subsystem = "inference",
                component = "gemini",
                op = "generate",
                model = %self.config.gen_model,
                duration_ms,
                "Slow model call"
            );
        }
        debug!(
            subsystem = "inference",
            component = "gemini",
            op = "generate",
            response_len = content.len(),
            duration_ms,
            "Generation complete"
        );
        Ok(content)
    }

    fn model_name(&self) -> &str {
        &self.config.gen_model
    }
}
