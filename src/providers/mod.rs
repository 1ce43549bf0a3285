pub mod chat;
pub mod ollama;

use anyhow::Context;
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use url::Url;

use crate::config::deserialize_option_parsed;
use crate::pipeline::prompt::Prompt;

pub use chat::ChatCompletionProvider;
pub use ollama::OllamaProvider;

pub const DECOMMISSIONED_CODE: &str = "model_decommissioned";

#[derive(Debug, thiserror::Error)]
pub enum CompletionError {
    #[error("{provider} requires SATIRIST_COMPLETION_API_KEY to be set")]
    MissingApiKey { provider: &'static str },
    #[error("Invalid completion provider URL: {0}")]
    InvalidUrl(String),
    #[error("Model '{model}' has been decommissioned: {message}")]
    ModelDecommissioned { model: String, message: String },
    #[error("Completion provider rejected the request: {details}")]
    Rejected { details: ProviderErrorBody },
    #[error("Completion provider returned HTTP {status}: {body}")]
    Gateway { status: u16, body: String },
    #[error("Completion provider returned no choices")]
    NoChoices { raw: Value },
    #[error("Malformed completion response: {0:#}")]
    Malformed(anyhow::Error),
    #[error("Failed to reach completion provider: {0:#}")]
    Request(#[from] anyhow::Error),
}

/// Error payload of a rejected request: structured JSON if it parses, the raw
/// response text otherwise.
#[derive(Debug, Clone, PartialEq)]
pub enum ProviderErrorBody {
    Json(Value),
    Raw(String),
}

impl ProviderErrorBody {
    pub fn decode(text: &str) -> Self {
        serde_json::from_str(text)
            .map(Self::Json)
            .unwrap_or_else(|_| Self::Raw(text.to_string()))
    }

    pub fn code(&self) -> Option<&str> {
        match self {
            Self::Json(value) => value.pointer("/error/code").and_then(Value::as_str),
            Self::Raw(_) => None,
        }
    }

    /// OpenAI-style `{"error": {"message": ..}}` or Ollama-style `{"error": ".."}`.
    pub fn message(&self) -> Option<&str> {
        match self {
            Self::Json(value) => value
                .pointer("/error/message")
                .and_then(Value::as_str)
                .or_else(|| value.get("error").and_then(Value::as_str)),
            Self::Raw(_) => None,
        }
    }

    pub fn is_decommissioned(&self) -> bool {
        self.code() == Some(DECOMMISSIONED_CODE)
            || self
                .message()
                .is_some_and(|m| m.to_lowercase().contains("decommissioned"))
    }

    pub fn to_json(&self) -> Value {
        match self {
            Self::Json(value) => value.clone(),
            Self::Raw(text) => Value::String(text.clone()),
        }
    }
}

impl fmt::Display for ProviderErrorBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Json(value) => write!(f, "{}", value),
            Self::Raw(text) => f.write_str(text),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ProviderKind {
    /// Hosted OpenAI-compatible chat completions (Groq by default).
    #[default]
    Groq,
    /// Locally hosted Ollama runtime.
    Ollama,
}

impl FromStr for ProviderKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "groq" => Ok(Self::Groq),
            "ollama" => Ok(Self::Ollama),
            other => Err(format!(
                "unknown completion provider '{}': expected 'groq' or 'ollama'",
                other
            )),
        }
    }
}

#[derive(Deserialize, Debug, Clone, Default)]
pub struct CompletionConfig {
    #[serde(
        rename = "completion_provider",
        default,
        deserialize_with = "deserialize_option_parsed"
    )]
    pub provider: Option<ProviderKind>,
    #[serde(rename = "completion_api_key")]
    pub api_key: Option<String>,
    #[serde(rename = "completion_base_url")]
    pub base_url: Option<String>,
    #[serde(rename = "completion_model")]
    pub model: Option<String>,
    #[serde(
        rename = "completion_temperature",
        default,
        deserialize_with = "deserialize_option_parsed"
    )]
    pub temperature: Option<f32>,
    #[serde(
        rename = "completion_max_tokens",
        default,
        deserialize_with = "deserialize_option_parsed"
    )]
    pub max_tokens: Option<u32>,
    #[serde(
        rename = "completion_timeout_secs",
        default,
        deserialize_with = "deserialize_option_parsed"
    )]
    pub timeout_secs: Option<u64>,
}

impl CompletionConfig {
    pub fn kind(&self) -> ProviderKind {
        self.provider.unwrap_or_default()
    }
}

/// Fixed generation parameters, resolved once from configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationSettings {
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl GenerationSettings {
    fn resolve(config: &CompletionConfig, default_model: &str) -> Self {
        Self {
            model: config
                .model
                .clone()
                .filter(|m| !m.trim().is_empty())
                .unwrap_or_else(|| default_model.to_string()),
            temperature: config.temperature.unwrap_or(0.8),
            max_tokens: config.max_tokens.unwrap_or(250),
        }
    }
}

#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Provider name for logging.
    fn name(&self) -> &'static str;

    fn model(&self) -> &str;

    /// Sends `prompt` and returns the generated text, untrimmed.
    async fn complete(&self, prompt: &Prompt) -> Result<String, CompletionError>;

    /// Relays the provider's model listing verbatim.
    async fn list_models(&self) -> Result<Value, CompletionError>;
}

pub fn build_provider(
    config: &CompletionConfig,
) -> Result<Arc<dyn CompletionProvider>, CompletionError> {
    let provider: Arc<dyn CompletionProvider> = match config.kind() {
        ProviderKind::Groq => Arc::new(ChatCompletionProvider::new(config.clone())?),
        ProviderKind::Ollama => Arc::new(OllamaProvider::new(config.clone())?),
    };
    log::info!(
        "using {} completion provider (model: {})",
        provider.name(),
        provider.model()
    );
    Ok(provider)
}

pub(crate) fn endpoint(base_url: &str, path: &str) -> Result<Url, CompletionError> {
    Url::parse(&format!("{}/{}", base_url.trim_end_matches('/'), path))
        .map_err(|_| CompletionError::InvalidUrl(base_url.to_string()))
}

/// Returns the body of a successful response, or translates the failure.
pub(crate) async fn read_success_body(
    response: reqwest::Response,
    provider: &str,
    model: &str,
) -> Result<String, CompletionError> {
    let status = response.status();
    let body = response.text().await.context("Completion response body")?;
    if status.is_success() {
        return Ok(body);
    }

    log::warn!("{} returned status {}: {}", provider, status.as_u16(), body);

    if status == StatusCode::BAD_REQUEST {
        let details = ProviderErrorBody::decode(&body);
        if details.is_decommissioned() {
            let message = details.message().unwrap_or_default().to_string();
            log::warn!("model '{}' decommissioned: {}", model, message);
            return Err(CompletionError::ModelDecommissioned {
                model: model.to_string(),
                message,
            });
        }
        return Err(CompletionError::Rejected { details });
    }

    Err(CompletionError::Gateway {
        status: status.as_u16(),
        body,
    })
}

pub(crate) fn decode_json(body: &str) -> Result<Value, CompletionError> {
    serde_json::from_str(body)
        .context("Completion response JSON")
        .map_err(CompletionError::Malformed)
}

pub(crate) async fn fetch_model_list(
    client: &reqwest::Client,
    url: Url,
) -> Result<Value, CompletionError> {
    log::info!("listing models from {}", url);
    let response = client
        .get(url)
        .send()
        .await
        .context("Model listing request failed")?;
    let status = response.status();
    let body = response.text().await.context("Model listing body")?;
    if !status.is_success() {
        return Err(CompletionError::Gateway {
            status: status.as_u16(),
            body,
        });
    }
    decode_json(&body)
}
