use anyhow::Context;
use async_trait::async_trait;
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

const DEFAULT_BASE_URL: &str = "http://localhost:11434";
const DEFAULT_MODEL: &str = "fauxybot";

#[derive(Serialize, Debug)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<&'a str>,
    stream: bool,
    options: GenerateOptions,
}

#[derive(Serialize, Debug)]
struct GenerateOptions {
    temperature: f32,
    num_predict: u32,
}

#[derive(Deserialize, Debug)]
struct GenerateResponse {
    #[serde(default)]
    response: Option<String>,
}

/// Local Ollama `/api/generate` backend.
#[derive(Debug, Clone)]
pub struct OllamaProvider {
    generate_url: Url,
    tags_url: Url,
    settings: GenerationSettings,
    client: Client,
}

impl OllamaProvider {
    pub const NAME: &'static str = "ollama";

    pub fn new(config: CompletionConfig) -> Result<Self, CompletionError> {
        let base_url = config
            .base_url
            .clone()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let generate_url = endpoint(&base_url, "api/generate")?;
        let tags_url = endpoint(&base_url, "api/tags")?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs.unwrap_or(60)))
            .build()
            .context("Failed to build Ollama HTTP client")?;

        Ok(Self {
            generate_url,
            tags_url,
            settings: GenerationSettings::resolve(&config, DEFAULT_MODEL),
            client,
        })
    }

    pub fn settings(&self) -> &GenerationSettings {
        &self.settings
    }
}

#[async_trait]
impl CompletionProvider for OllamaProvider {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn model(&self) -> &str {
        &self.settings.model
    }

    async fn complete(&self, prompt: &Prompt) -> Result<String, CompletionError> {
        let request = GenerateRequest {
            model: &self.settings.model,
            prompt: &prompt.user,
            system: prompt.system.as_deref(),
            stream: false,
            options: GenerateOptions {
                temperature: self.settings.temperature,
                num_predict: self.settings.max_tokens,
            },
        };
        log::debug!("ollama generate request: {:?}", request);
        log::info!("asking '{}' for a response...", self.settings.model);

        let response = self
            .client
            .post(self.generate_url.clone())
            .json(&request)
            .send()
            .await
            .context("Ollama request failed")?;
        let body = read_success_body(response, Self::NAME, &self.settings.model).await?;

        let raw: Value = decode_json(&body)?;
        let parsed: GenerateResponse = serde_json::from_value(raw.clone())
            .context("Ollama generate envelope")
            .map_err(CompletionError::Malformed)?;

        parsed.response.ok_or(CompletionError::NoChoices { raw })
    }

    async fn list_models(&self) -> Result<Value, CompletionError> {
        fetch_model_list(&self.client, self.tags_url.clone()).await
    }
}
