use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::{json, Value};

use crate::pipeline::SatireError;
use crate::providers::{CompletionError, DECOMMISSIONED_CODE};
use crate::tools::news::NewsSearchToolError;

pub const DECOMMISSIONED_SUGGESTION: &str = concat!(
    "Pick a supported model (e.g. 'llama-3.3-70b-versatile' or 'llama-3.1-8b-instant') ",
    "via SATIRIST_COMPLETION_MODEL, or list available models via the GET /models endpoint. ",
    "See GROQ deprecations: https://console.groq.com/docs/deprecations"
);

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    InvalidRequest(String),
    #[error(transparent)]
    Satire(#[from] SatireError),
    #[error("Could not list models: {0}")]
    ModelListing(CompletionError),
}

impl ApiError {
    fn parts(&self) -> (StatusCode, Value) {
        match self {
            Self::InvalidRequest(message) => {
                (StatusCode::BAD_REQUEST, json!({ "error": message }))
            }
            Self::Satire(SatireError::News(err)) => news_error_parts(err),
            Self::Satire(SatireError::Completion(err)) => completion_error_parts(err),
            Self::ModelListing(err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({ "error": "Could not list models", "details": err.to_string() }),
            ),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = self.parts();
        (status, Json(body)).into_response()
    }
}

fn news_error_parts(err: &NewsSearchToolError) -> (StatusCode, Value) {
    let status = match err {
        NewsSearchToolError::NoArticles { .. } | NewsSearchToolError::EmptyArticle { .. } => {
            StatusCode::NOT_FOUND
        }
        NewsSearchToolError::InvalidUrl(_) | NewsSearchToolError::Request(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    (status, json!({ "error": err.to_string() }))
}

fn completion_error_parts(err: &CompletionError) -> (StatusCode, Value) {
    match err {
        CompletionError::ModelDecommissioned { model, message } => (
            StatusCode::BAD_REQUEST,
            json!({
                "error": DECOMMISSIONED_CODE,
                "model": model,
                "message": message,
                "suggested_action": DECOMMISSIONED_SUGGESTION,
            }),
        ),
        CompletionError::Rejected { details } => (
            StatusCode::BAD_REQUEST,
            json!({
                "error": "Completion provider returned 400",
                "details": details.to_json(),
            }),
        ),
        CompletionError::Gateway { status, body } => (
            StatusCode::BAD_GATEWAY,
            json!({
                "error": "Completion provider HTTP error",
                "status": status,
                "details": body,
            }),
        ),
        CompletionError::NoChoices { raw } => (
            StatusCode::INTERNAL_SERVER_ERROR,
            json!({
                "error": "Completion provider returned no choices",
                "raw": raw,
            }),
        ),
        CompletionError::MissingApiKey { .. }
        | CompletionError::InvalidUrl(_)
        | CompletionError::Malformed(_)
        | CompletionError::Request(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            json!({ "error": err.to_string() }),
        ),
    }
}
