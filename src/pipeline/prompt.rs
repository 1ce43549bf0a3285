use anyhow::Context;
use serde::Deserialize;
use std::fs;

use crate::providers::ProviderKind;
use crate::tools::news::Snippet;

pub const SNIPPET_PLACEHOLDER: &str = "{snippet}";

pub const FAUXY_CHAT_SYSTEM: &str = "You are 'The Fauxy' satire writer with sharp wit.";

pub const FAUXY_CHAT_TEMPLATE: &str = r#"
You are a news correspondent for 'The Fauxy', India's top satirical news source.
Your tone is witty, sarcastic, and darkly humorous. Keep your report short (under 1 paragraph).
Each paragraph should be concise, punchy, and comedic. End with a clever line or fake quote.
REAL NEWS: {snippet}
Now, your satirical version:
"#;

pub const FAUXY_REPORT_TEMPLATE: &str = r#"You are a news correspondent for 'The Fauxy', India's premier satirical news source. Your tone is witty, extremely sarcastic, and satirical. Your job is to read a real news summary and provide the real, darkly humorous, and ironic story behind the story. Use a mix of sharp English and common Indian slang or phrases where it feels natural. Be cynical, find the absurdity, and be satirically optimistic.

Here is today's boring, official news summary:
REAL NEWS: {snippet}

Now, here is your Fauxy report:
THE FAUXY REPORT:"#;

#[derive(Debug, thiserror::Error)]
pub enum PersonaError {
    #[error("Persona template from {0} is missing the {{snippet}} placeholder")]
    MissingPlaceholder(String),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

#[derive(Deserialize, Debug, Clone, Default)]
pub struct PersonaConfig {
    /// Path to a file holding a replacement prompt template.
    #[serde(rename = "persona_file")]
    pub file: Option<String>,
    #[serde(rename = "persona_system")]
    pub system: Option<String>,
}

/// The satirical voice: an optional system message plus a template with a
/// `{snippet}` placeholder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Persona {
    system: Option<String>,
    template: String,
}

impl Persona {
    pub fn new(system: Option<String>, template: impl Into<String>) -> Result<Self, PersonaError> {
        let template = template.into();
        if !template.contains(SNIPPET_PLACEHOLDER) {
            return Err(PersonaError::MissingPlaceholder("inline template".to_string()));
        }
        Ok(Self { system, template })
    }

    /// Persona tuned for hosted chat models.
    pub fn fauxy_chat() -> Self {
        Self {
            system: Some(FAUXY_CHAT_SYSTEM.to_string()),
            template: FAUXY_CHAT_TEMPLATE.to_string(),
        }
    }

    /// Persona tuned for the locally hosted fauxybot model.
    pub fn fauxy_report() -> Self {
        Self {
            system: None,
            template: FAUXY_REPORT_TEMPLATE.to_string(),
        }
    }

    pub fn for_provider(kind: ProviderKind) -> Self {
        match kind {
            ProviderKind::Groq => Self::fauxy_chat(),
            ProviderKind::Ollama => Self::fauxy_report(),
        }
    }

    /// Starts from `default` and applies any template file or system message
    /// overrides from the environment.
    pub fn from_config(config: &PersonaConfig, default: Persona) -> Result<Self, PersonaError> {
        let mut persona = default;

        if let Some(path) = config.file.as_deref().filter(|p| !p.trim().is_empty()) {
            log::info!("loading persona template from '{}'", path);
            let template = fs::read_to_string(path)
                .with_context(|| format!("Reading persona template {}", path))?;
            if !template.contains(SNIPPET_PLACEHOLDER) {
                return Err(PersonaError::MissingPlaceholder(path.to_string()));
            }
            persona.template = template;
        }

        if let Some(system) = config.system.as_deref().filter(|s| !s.trim().is_empty()) {
            persona.system = Some(system.trim().to_string());
        }

        Ok(persona)
    }
}

/// A rendered prompt ready to hand to a completion provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    pub system: Option<String>,
    pub user: String,
}

pub fn build_prompt(persona: &Persona, snippet: &Snippet) -> Prompt {
    Prompt {
        system: persona.system.clone(),
        user: persona.template.replace(SNIPPET_PLACEHOLDER, snippet.as_str()),
    }
}
