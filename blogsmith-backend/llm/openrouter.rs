use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{Value, json};

use super::{LlmAdapter, LlmError, LlmOptions, OutputFormat};

const USER_AGENT: &str = "blogsmith";

/// OpenAI-compatible chat completions client for OpenRouter.
pub struct OpenRouterAdapter {
    client: Client,
    api_key: Option<String>,
    base_url: String,
    model: String,
    image_model: String,
}

impl OpenRouterAdapter {
    pub fn new(
        client: Client,
        api_key: Option<String>,
        base_url: String,
        model: String,
        image_model: String,
    ) -> Self {
        Self {
            client,
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            model,
            image_model,
        }
    }

    fn request_body(&self, system_prompt: &str, user_prompt: &str, options: &LlmOptions) -> Value {
        let model = options.model.as_deref().unwrap_or(&self.model);
        let mut messages = Vec::new();
        if !system_prompt.trim().is_empty() {
            messages.push(json!({ "role": "system", "content": system_prompt }));
        }
        messages.push(json!({ "role": "user", "content": user_prompt }));

        let mut body = json!({
            "model": model,
            "messages": messages,
            "temperature": options.temperature,
        });
        if options.max_tokens > 0 {
            body["max_tokens"] = json!(options.max_tokens);
        }
        match options.output_format {
            OutputFormat::Json => body["response_format"] = json!({ "type": "json_object" }),
            OutputFormat::ImagePng => body["modalities"] = json!(["image", "text"]),
            OutputFormat::Text => {}
        }
        body
    }

    async fn complete(&self, body: &Value) -> Result<ChatResponse, LlmError> {
        let api_key = self.api_key.as_deref().ok_or(LlmError::NotConfigured)?;
        let url = format!("{}/chat/completions", self.base_url);

        let resp = self
            .client
            .post(&url)
            .bearer_auth(api_key)
            .header("User-Agent", USER_AGENT)
            .json(body)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(LlmError::Provider(format!("{status}: {text}")));
        }

        Ok(resp.json::<ChatResponse>().await?)
    }
}

#[async_trait]
impl LlmAdapter for OpenRouterAdapter {
    #[tracing::instrument(skip_all)]
    async fn generate(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        options: &LlmOptions,
    ) -> Result<String, LlmError> {
        let body = self.request_body(system_prompt, user_prompt, options);
        let response = self.complete(&body).await?;

        let content = response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_default();

        if content.trim().is_empty() {
            return Err(LlmError::EmptyResponse);
        }
        tracing::debug!(chars = content.len(), "llm completion received");
        Ok(content)
    }

    #[tracing::instrument(skip_all)]
    async fn generate_image(&self, prompt: &str, options: &LlmOptions) -> Result<Vec<u8>, LlmError> {
        let options = LlmOptions {
            output_format: OutputFormat::ImagePng,
            model: Some(options.model.clone().unwrap_or_else(|| self.image_model.clone())),
            ..options.clone()
        };
        let body = self.request_body("", prompt, &options);
        let response = self.complete(&body).await?;

        let data_url = response
            .choices
            .into_iter()
            .flat_map(|c| c.message.images)
            .map(|i| i.image_url.url)
            .next()
            .ok_or(LlmError::EmptyResponse)?;

        decode_data_url(&data_url)
    }
}

/// Decode `data:<mime>;base64,<payload>` into bytes.
fn decode_data_url(url: &str) -> Result<Vec<u8>, LlmError> {
    let payload = url
        .split_once("base64,")
        .map(|(_, p)| p)
        .ok_or_else(|| LlmError::Provider("image is not a base64 data URL".to_string()))?;
    let bytes = STANDARD
        .decode(payload.trim())
        .map_err(|e| LlmError::Provider(format!("invalid image payload: {e}")))?;
    if bytes.is_empty() {
        return Err(LlmError::EmptyResponse);
    }
    Ok(bytes)
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    images: Vec<ChatImage>,
}

#[derive(Debug, Deserialize)]
struct ChatImage {
    image_url: ImageUrl,
}

#[derive(Debug, Deserialize)]
struct ImageUrl {
    url: String,
}
