use satirist::pipeline::prompt::Prompt;
use satirist::providers::{
    ChatCompletionProvider, CompletionConfig, CompletionError, CompletionProvider,
    ProviderErrorBody, ProviderKind,
};
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn chat_config(base_url: String) -> CompletionConfig {
    CompletionConfig {
        provider: Some(ProviderKind::Groq),
        api_key: Some("groq-key".to_string()),
        base_url: Some(base_url),
        model: Some("test-model".to_string()),
        temperature: None,
        max_tokens: None,
        timeout_secs: Some(5),
    }
}

fn prompt() -> Prompt {
    Prompt {
        system: Some("You are a satirist.".to_string()),
        user: "REAL NEWS: India wins match".to_string(),
    }
}

async fn respond_with(server: &MockServer, template: ResponseTemplate) {
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(template)
        .mount(server)
        .await;
}

async fn complete_err(server: &MockServer) -> CompletionError {
    let provider =
        ChatCompletionProvider::new(chat_config(server.uri())).expect("Failed to create provider");
    provider
        .complete(&prompt())
        .await
        .expect_err("Expected completion error")
}

#[tokio::test]
async fn sends_chat_request_and_returns_message_content() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(header("authorization", "Bearer groq-key"))
        .and(body_partial_json(serde_json::json!({
            "model": "test-model",
            "messages": [
                {"role": "system", "content": "You are a satirist."},
                {"role": "user", "content": "REAL NEWS: India wins match"}
            ],
            "temperature": 0.8,
            "max_tokens": 250
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "id": "chatcmpl-1",
            "choices": [
                {"index": 0, "message": {"role": "assistant", "content": " Some satire. "}}
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let provider =
        ChatCompletionProvider::new(chat_config(server.uri())).expect("Failed to create provider");
    let text = provider.complete(&prompt()).await.expect("Completion failed");

    assert_eq!(text, " Some satire. ");
}

#[tokio::test]
async fn omits_system_message_when_persona_has_none() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(body_partial_json(serde_json::json!({
            "messages": [{"role": "user", "content": "just the user"}]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "choices": [{"message": {"content": "ok"}}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let provider =
        ChatCompletionProvider::new(chat_config(server.uri())).expect("Failed to create provider");
    let text = provider
        .complete(&Prompt {
            system: None,
            user: "just the user".to_string(),
        })
        .await
        .expect("Completion failed");

    assert_eq!(text, "ok");
}

#[tokio::test]
async fn accepts_flat_text_choice() {
    let server = MockServer::start().await;
    respond_with(
        &server,
        ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "choices": [{"index": 0, "text": "flat satire"}]
        })),
    )
    .await;

    let provider =
        ChatCompletionProvider::new(chat_config(server.uri())).expect("Failed to create provider");
    let text = provider.complete(&prompt()).await.expect("Completion failed");

    assert_eq!(text, "flat satire");
}

#[tokio::test]
async fn falls_back_to_text_when_message_content_is_empty() {
    for message in [serde_json::json!({"content": null}), serde_json::json!({"content": ""})] {
        let server = MockServer::start().await;
        respond_with(
            &server,
            ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [{"message": message, "text": "flat fallback"}]
            })),
        )
        .await;

        let provider = ChatCompletionProvider::new(chat_config(server.uri()))
            .expect("Failed to create provider");
        let text = provider.complete(&prompt()).await.expect("Completion failed");

        assert_eq!(text, "flat fallback");
    }
}

#[tokio::test]
async fn choice_without_content_yields_empty_text() {
    let server = MockServer::start().await;
    respond_with(
        &server,
        ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "choices": [{"index": 0, "finish_reason": "length"}]
        })),
    )
    .await;

    let provider =
        ChatCompletionProvider::new(chat_config(server.uri())).expect("Failed to create provider");
    let text = provider.complete(&prompt()).await.expect("Completion failed");

    assert_eq!(text, "");
}

#[tokio::test]
async fn decommissioned_model_by_code() {
    let server = MockServer::start().await;
    respond_with(
        &server,
        ResponseTemplate::new(400).set_body_json(serde_json::json!({
            "error": {
                "message": "The model `llama3-70b-8192` has been decommissioned and is no longer supported.",
                "type": "invalid_request_error",
                "code": "model_decommissioned"
            }
        })),
    )
    .await;

    match complete_err(&server).await {
        CompletionError::ModelDecommissioned { model, message } => {
            assert_eq!(model, "test-model");
            assert!(message.starts_with("The model `llama3-70b-8192` has been decommissioned"));
        }
        other => panic!("Unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn decommissioned_model_by_message() {
    let server = MockServer::start().await;
    respond_with(
        &server,
        ResponseTemplate::new(400).set_body_json(serde_json::json!({
            "error": {
                "message": "This model was Decommissioned last week.",
                "code": "invalid_request"
            }
        })),
    )
    .await;

    assert!(matches!(
        complete_err(&server).await,
        CompletionError::ModelDecommissioned { .. }
    ));
}

#[tokio::test]
async fn other_bad_request_keeps_structured_details() {
    let server = MockServer::start().await;
    let payload = serde_json::json!({
        "error": {"message": "max_tokens is too large", "code": "invalid_value"}
    });
    respond_with(&server, ResponseTemplate::new(400).set_body_json(payload.clone())).await;

    match complete_err(&server).await {
        CompletionError::Rejected { details } => {
            assert_eq!(details.code(), Some("invalid_value"));
            assert_eq!(details, ProviderErrorBody::Json(payload));
        }
        other => panic!("Unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn unparseable_bad_request_keeps_raw_text() {
    let server = MockServer::start().await;
    respond_with(
        &server,
        ResponseTemplate::new(400).set_body_string("upstream said no"),
    )
    .await;

    match complete_err(&server).await {
        CompletionError::Rejected { details } => {
            assert_eq!(details, ProviderErrorBody::Raw("upstream said no".to_string()));
        }
        other => panic!("Unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn other_error_status_is_gateway_error() {
    let server = MockServer::start().await;
    respond_with(&server, ResponseTemplate::new(503).set_body_string("overloaded")).await;

    match complete_err(&server).await {
        CompletionError::Gateway { status, body } => {
            assert_eq!(status, 503);
            assert_eq!(body, "overloaded");
        }
        other => panic!("Unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn empty_choices_is_logic_error() {
    let server = MockServer::start().await;
    respond_with(
        &server,
        ResponseTemplate::new(200).set_body_json(serde_json::json!({"id": "x", "choices": []})),
    )
    .await;

    match complete_err(&server).await {
        CompletionError::NoChoices { raw } => {
            assert_eq!(raw["id"], "x");
            assert_eq!(raw["choices"], serde_json::json!([]));
        }
        other => panic!("Unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn non_json_success_is_malformed() {
    let server = MockServer::start().await;
    respond_with(&server, ResponseTemplate::new(200).set_body_string("not json")).await;

    assert!(matches!(
        complete_err(&server).await,
        CompletionError::Malformed(_)
    ));
}

#[test]
fn requires_api_key() {
    let err = ChatCompletionProvider::new(CompletionConfig {
        api_key: Some("   ".to_string()),
        ..chat_config("http://localhost".to_string())
    })
    .expect_err("Expected missing api key error");

    assert!(matches!(err, CompletionError::MissingApiKey { .. }));
}

#[test]
fn applies_default_generation_settings() {
    let provider = ChatCompletionProvider::new(CompletionConfig {
        api_key: Some("groq-key".to_string()),
        ..CompletionConfig::default()
    })
    .expect("Failed to create provider");

    assert_eq!(provider.model(), "llama-3.3-70b-versatile");
    assert_eq!(provider.settings().temperature, 0.8);
    assert_eq!(provider.settings().max_tokens, 250);
}

#[tokio::test]
async fn lists_models_verbatim() {
    let server = MockServer::start().await;
    let models = serde_json::json!({
        "object": "list",
        "data": [{"id": "llama-3.3-70b-versatile", "object": "model", "active": true}]
    });

    Mock::given(method("GET"))
        .and(path("/models"))
        .and(header("authorization", "Bearer groq-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(models.clone()))
        .mount(&server)
        .await;

    let provider =
        ChatCompletionProvider::new(chat_config(server.uri())).expect("Failed to create provider");
    let listed = provider.list_models().await.expect("Listing failed");

    assert_eq!(listed, models);
}

#[tokio::test]
async fn model_listing_failure_is_reported() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/models"))
        .respond_with(ResponseTemplate::new(401).set_body_string("invalid key"))
        .mount(&server)
        .await;

    let provider =
        ChatCompletionProvider::new(chat_config(server.uri())).expect("Failed to create provider");
    let err = provider.list_models().await.expect_err("Expected listing error");

    assert!(matches!(err, CompletionError::Gateway { status: 401, .. }));
}
