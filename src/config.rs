use crate::pipeline::prompt::PersonaConfig;
use crate::providers::CompletionConfig;
use crate::server::ServerConfig;
use crate::tools::news::NewsConfig;
use serde::{Deserialize, Deserializer};
use std::fmt::Display;
use std::str::FromStr;

#[derive(Deserialize, Debug, Clone)]
pub struct AppConfig {
    #[serde(flatten)]
    pub news: NewsConfig,
    #[serde(flatten)]
    pub completion: CompletionConfig,
    #[serde(flatten)]
    pub persona: PersonaConfig,
    #[serde(flatten)]
    pub server: ServerConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Ok(envy::prefixed("SATIRIST_").from_env::<AppConfig>()?)
    }
}

/// Flattened structs reach envy as plain strings, so typed values are parsed
/// by hand.
pub(crate) fn deserialize_option_parsed<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
    T::Err: Display,
{
    let s: Option<String> = Option::deserialize(deserializer)?;
    match s.filter(|v| !v.trim().is_empty()) {
        Some(s) => s
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(serde::de::Error::custom),
        None => Ok(None),
    }
}
