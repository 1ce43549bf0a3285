use anyhow::Context;
use reqwest::header::{HeaderMap, HeaderValue};
use serde::Deserialize;
use std::fmt;
use std::time::Duration;
use url::Url;

use crate::config::deserialize_option_parsed;

const DEFAULT_BASE_URL: &str = "https://newsapi.org/v2";

#[derive(Debug, thiserror::Error)]
pub enum NewsSearchToolError {
    #[error("Invalid news API URL: {0}")]
    InvalidUrl(String),
    #[error("No articles found for '{topic}'")]
    NoArticles { topic: String },
    #[error("Found an article for '{topic}' but it has no description or title")]
    EmptyArticle { topic: String },
    #[error("Failed to fetch news: {0:#}")]
    Request(#[from] anyhow::Error),
}

#[derive(Deserialize, Debug, Clone)]
pub struct NewsConfig {
    #[serde(rename = "news_api_key")]
    pub api_key: String,
    #[serde(rename = "news_base_url")]
    pub base_url: Option<String>,
    #[serde(rename = "news_language")]
    pub language: Option<String>,
    #[serde(
        rename = "news_timeout_secs",
        default,
        deserialize_with = "deserialize_option_parsed"
    )]
    pub timeout_secs: Option<u64>,
}

/// Factual seed text taken from a single news article.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snippet(String);

impl Snippet {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Snippet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Deserialize, Debug)]
struct SearchResponse {
    #[serde(default)]
    articles: Option<Vec<Article>>,
}

#[derive(Deserialize, Debug)]
pub struct Article {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

impl Article {
    /// Description if present, title otherwise. Blank strings count as absent.
    pub fn snippet(&self) -> Option<Snippet> {
        let pick = |field: &Option<String>| {
            field
                .as_deref()
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(Snippet::new)
        };
        pick(&self.description).or_else(|| pick(&self.title))
    }
}

#[derive(Debug, Clone)]
pub struct NewsSearchTool {
    endpoint: Url,
    language: String,
    client: reqwest::Client,
}

impl NewsSearchTool {
    pub fn new(config: NewsConfig) -> Result<Self, NewsSearchToolError> {
        let base_url = config
            .base_url
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let endpoint = Url::parse(&format!("{}/everything", base_url.trim_end_matches('/')))
            .map_err(|_| NewsSearchToolError::InvalidUrl(base_url.clone()))?;

        let language = config
            .language
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| "en".to_string());
        let timeout_secs = config.timeout_secs.unwrap_or(10);

        let mut headers = HeaderMap::new();
        let key_value = HeaderValue::from_str(&config.api_key)
            .context("Invalid SATIRIST_NEWS_API_KEY for X-Api-Key header")?;
        headers.insert("x-api-key", key_value);
        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .context("Failed to build news HTTP client")?;

        Ok(Self {
            endpoint,
            language,
            client,
        })
    }

    /// Fetches the single best match for `topic` and extracts its snippet.
    pub async fn lookup(&self, topic: &str) -> Result<Snippet, NewsSearchToolError> {
        log::info!("searching news for '{}'...", topic);

        let response = self
            .client
            .get(self.search_url(topic))
            .send()
            .await
            .context("News request failed")?;

        let status = response.status();
        let body = response.text().await.context("News response body")?;
        if !status.is_success() {
            log::error!("news API returned status {}: {}", status.as_u16(), body);
            return Err(anyhow::anyhow!("News API returned status {}: {}", status, body).into());
        }

        let search: SearchResponse = serde_json::from_str(&body).context("News response JSON")?;
        let article = search
            .articles
            .unwrap_or_default()
            .into_iter()
            .next()
            .ok_or_else(|| NewsSearchToolError::NoArticles {
                topic: topic.to_string(),
            })?;

        let snippet = article
            .snippet()
            .ok_or_else(|| NewsSearchToolError::EmptyArticle {
                topic: topic.to_string(),
            })?;
        log::info!("found news snippet: {}", snippet);
        Ok(snippet)
    }

    fn search_url(&self, topic: &str) -> Url {
        let mut url = self.endpoint.clone();
        url.query_pairs_mut()
            .append_pair("q", topic)
            .append_pair("language", &self.language)
            .append_pair("pageSize", "1");
        url
    }
}
