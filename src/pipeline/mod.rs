pub mod prompt;

use anyhow::Error;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

use prompt::{build_prompt, Persona};

use crate::config::AppConfig;
use crate::providers::{build_provider, CompletionError, CompletionProvider};
use crate::tools::news::{NewsSearchTool, NewsSearchToolError};

#[derive(Debug, thiserror::Error)]
pub enum SatireError {
    #[error(transparent)]
    News(#[from] NewsSearchToolError),
    #[error(transparent)]
    Completion(#[from] CompletionError),
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct Satire {
    pub topic: String,
    pub satire: String,
}

/// News lookup, prompt build and completion, in that order.
pub struct Satirist {
    news: NewsSearchTool,
    provider: Arc<dyn CompletionProvider>,
    persona: Persona,
}

impl Satirist {
    pub fn new(
        news: NewsSearchTool,
        provider: Arc<dyn CompletionProvider>,
        persona: Persona,
    ) -> Self {
        Self {
            news,
            provider,
            persona,
        }
    }

    pub fn from_config(config: &AppConfig) -> Result<Self, Error> {
        let news = NewsSearchTool::new(config.news.clone())?;
        let provider = build_provider(&config.completion)?;
        let persona = Persona::from_config(
            &config.persona,
            Persona::for_provider(config.completion.kind()),
        )?;
        Ok(Self::new(news, provider, persona))
    }

    /// Searches with the trimmed topic; the response echoes it as given.
    pub async fn satirize(&self, topic: &str) -> Result<Satire, SatireError> {
        let snippet = self
            .news
            .lookup(topic.trim())
            .await
            .inspect_err(|err| log::error!("news lookup failed for '{}': {}", topic, err))?;

        let prompt = build_prompt(&self.persona, &snippet);
        log::info!(
            "sending prompt to {} (model: {})",
            self.provider.name(),
            self.provider.model()
        );

        let text = self.provider.complete(&prompt).await.inspect_err(|err| {
            log::error!(
                "{} completion failed for '{}': {}",
                self.provider.name(),
                topic,
                err
            )
        })?;
        log::info!("generated satire for '{}'", topic);

        Ok(Satire {
            topic: topic.to_string(),
            satire: text.trim().to_string(),
        })
    }

    pub async fn list_models(&self) -> Result<Value, CompletionError> {
        self.provider
            .list_models()
            .await
            .inspect_err(|err| log::error!("error listing models: {}", err))
    }
}
