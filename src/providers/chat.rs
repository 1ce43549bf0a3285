use anyhow::Context;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use url::Url;

use super::{
    decode_json, endpoint, fetch_model_list, read_success_body, CompletionConfig, CompletionError,
    CompletionProvider, GenerationSettings,
};
use crate::pipeline::prompt::Prompt;

const DEFAULT_BASE_URL: &str = "https://api.groq.com/openai/v1";
const DEFAULT_MODEL: &str = "llama-3.3-70b-versatile";

#[derive(Serialize, Debug)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Serialize, Debug)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize, Debug)]
struct ChatResponse {
    #[serde(default)]
    choices: Option<Vec<ProviderChoice>>,
}

/// A completion choice. Chat-style providers fill `message`, older
/// completion endpoints fill `text`; some send both.
#[derive(Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct ProviderChoice {
    #[serde(default)]
    pub message: Option<ChoiceMessage>,
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ChoiceMessage {
    #[serde(default)]
    pub content: Option<String>,
}

impl ProviderChoice {
    /// Message content when non-empty, else the flat `text`, else `""`.
    pub fn text(&self) -> &str {
        self.message
            .as_ref()
            .and_then(|m| m.content.as_deref())
            .filter(|c| !c.is_empty())
            .or(self.text.as_deref())
            .unwrap_or_default()
    }
}

/// OpenAI-compatible `/chat/completions` backend.
#[derive(Debug, Clone)]
pub struct ChatCompletionProvider {
    completions_url: Url,
    models_url: Url,
    settings: GenerationSettings,
    client: Client,
}

impl ChatCompletionProvider {
    pub const NAME: &'static str = "groq";

    pub fn new(config: CompletionConfig) -> Result<Self, CompletionError> {
        let api_key = config
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .ok_or(CompletionError::MissingApiKey {
                provider: Self::NAME,
            })?;

        let base_url = config
            .base_url
            .clone()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let completions_url = endpoint(&base_url, "chat/completions")?;
        let models_url = endpoint(&base_url, "models")?;

        let mut headers = HeaderMap::new();
        let auth_value = HeaderValue::from_str(&format!("Bearer {}", api_key))
            .context("Invalid SATIRIST_COMPLETION_API_KEY for Authorization header")?;
        headers.insert(AUTHORIZATION, auth_value);
        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeout_secs.unwrap_or(60)))
            .build()
            .context("Failed to build chat completion HTTP client")?;

        Ok(Self {
            completions_url,
            models_url,
            settings: GenerationSettings::resolve(&config, DEFAULT_MODEL),
            client,
        })
    }

    pub fn settings(&self) -> &GenerationSettings {
        &self.settings
    }
}

#[async_trait]
impl CompletionProvider for ChatCompletionProvider {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn model(&self) -> &str {
        &self.settings.model
    }

    async fn complete(&self, prompt: &Prompt) -> Result<String, CompletionError> {
        let mut messages = Vec::with_capacity(2);
        if let Some(system) = prompt.system.as_deref() {
            messages.push(ChatMessage {
                role: "system",
                content: system,
            });
        }
        messages.push(ChatMessage {
            role: "user",
            content: &prompt.user,
        });

        let request = ChatRequest {
            model: &self.settings.model,
            messages,
            temperature: self.settings.temperature,
            max_tokens: self.settings.max_tokens,
        };
        log::debug!("chat completion request: {:?}", request);
        log::info!("asking '{}' for a response...", self.settings.model);

        let response = self
            .client
            .post(self.completions_url.clone())
            .json(&request)
            .send()
            .await
            .context("Chat completion request failed")?;
        let body = read_success_body(response, Self::NAME, &self.settings.model).await?;

        let raw: Value = decode_json(&body)?;
        let parsed: ChatResponse = serde_json::from_value(raw.clone())
            .context("Chat completion envelope")
            .map_err(CompletionError::Malformed)?;
        let choice = parsed
            .choices
            .unwrap_or_default()
            .into_iter()
            .next()
            .ok_or(CompletionError::NoChoices { raw })?;

        Ok(choice.text().to_string())
    }

    async fn list_models(&self) -> Result<Value, CompletionError> {
        fetch_model_list(&self.client, self.models_url.clone()).await
    }
}
