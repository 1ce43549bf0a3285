use axum::body::Bytes;
use axum::extract::State;
use axum::Json;
use serde_json::{json, Value};

use super::error::ApiError;
use super::AppState;
use crate::pipeline::Satire;

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// The body is read as JSON whatever its content type; anything without a
/// usable `topic` is rejected before any outbound call.
pub async fn generate_satire(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<Satire>, ApiError> {
    let topic = parse_topic(&body).inspect_err(|err| log::warn!("rejected request: {}", err))?;
    log::info!("received topic: {}", topic);

    let satire = state.satirist.satirize(&topic).await?;
    Ok(Json(satire))
}

pub async fn list_models(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let models = state
        .satirist
        .list_models()
        .await
        .map_err(ApiError::ModelListing)?;
    Ok(Json(models))
}

const MISSING_TOPIC: &str = "Please provide JSON with a 'topic' field.";

pub fn parse_topic(body: &[u8]) -> Result<String, ApiError> {
    let missing = || ApiError::InvalidRequest(MISSING_TOPIC.to_string());

    let value: Value = serde_json::from_slice(body).map_err(|_| missing())?;
    match value.get("topic") {
        Some(Value::String(topic)) if !topic.trim().is_empty() => Ok(topic.clone()),
        Some(_) => Err(ApiError::InvalidRequest(
            "The 'topic' field must be a non-empty string.".to_string(),
        )),
        None => Err(missing()),
    }
}
