pub mod openrouter;
pub mod sanitize;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub use sanitize::sanitize_json_content;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
    ImagePng,
}

/// Per-call generation options. A zero `max_tokens` leaves the provider default.
#[derive(Debug, Clone, Default)]
pub struct LlmOptions {
    pub max_tokens: u32,
    pub temperature: f32,
    pub output_format: OutputFormat,
    /// Overrides the adapter's configured model for this call.
    pub model: Option<String>,
}

impl LlmOptions {
    pub fn text(max_tokens: u32, temperature: f32) -> Self {
        Self {
            max_tokens,
            temperature,
            output_format: OutputFormat::Text,
            model: None,
        }
    }

    pub fn json(max_tokens: u32, temperature: f32) -> Self {
        Self {
            max_tokens,
            temperature,
            output_format: OutputFormat::Json,
            model: None,
        }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum LlmError {
    #[error("LLM provider is not configured")]
    NotConfigured,

    #[error("LLM provider error: {0}")]
    Provider(String),

    #[error("LLM returned an empty response")]
    EmptyResponse,

    #[error("LLM transport error: {0}")]
    Transport(#[from] reqwest::Error),
}

/// Chat-style completion provider. Implementations are stateless and shared
/// across requests.
#[async_trait]
pub trait LlmAdapter: Send + Sync {
    async fn generate(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        options: &LlmOptions,
    ) -> Result<String, LlmError>;

    /// Returns raw image bytes.
    async fn generate_image(&self, prompt: &str, options: &LlmOptions) -> Result<Vec<u8>, LlmError>;
}
