use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use vegapunk::config::GeminiConfig;
use vegapunk::dispatch::{ChatDispatcher, IMAGE_APOLOGY, PERSONA_REPLY, TEXT_APOLOGY};
use vegapunk::providers::{GeminiProvider, Provider};

const GENERATE_PATH: &str = "/v1beta/models/gemini-1.5-flash:generateContent";

fn provider_for(server: &MockServer) -> GeminiProvider {
    let config = GeminiConfig {
        api_base: Some(server.uri()),
        model: "gemini-1.5-flash".to_string(),
        api_key: Some("test-key".to_string()),
    };
    GeminiProvider::new(config).unwrap()
}

fn candidates_body(text: &str) -> serde_json::Value {
    serde_json::json!({
        "candidates": [{
            "content": {
                "parts": [{"text": text}],
                "role": "model"
            },
            "finishReason": "STOP"
        }]
    })
}

fn tiny_png() -> Vec<u8> {
    use image::{DynamicImage, ImageFormat, RgbaImage};
    use std::io::Cursor;
    let mut buffer = Cursor::new(Vec::new());
    DynamicImage::ImageRgba8(RgbaImage::new(2, 2))
        .write_to(&mut buffer, ImageFormat::Png)
        .unwrap();
    buffer.into_inner()
}

/// A stubbed successful call returns exactly the generated text
#[tokio::test]
async fn test_generate_text_returns_api_text() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .and(header("x-goog-api-key", "test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(candidates_body("Hello from the lab.")))
        .expect(1)
        .mount(&server)
        .await;

    let provider = provider_for(&server);
    let text = provider.generate_text("Say hello").await.unwrap();
    assert_eq!(text, "Hello from the lab.");
}

/// API error bodies surface status and message in the error
#[tokio::test]
async fn test_generate_text_surfaces_api_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
            "error": {
                "code": 400,
                "message": "API key not valid",
                "status": "INVALID_ARGUMENT"
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let provider = provider_for(&server);
    let error = provider.generate_text("Say hello").await.unwrap_err();
    let message = error.to_string();
    assert!(message.contains("INVALID_ARGUMENT"));
    assert!(message.contains("API key not valid"));
}

/// The trigger phrase short-circuits the dispatcher: zero provider calls
#[tokio::test]
async fn test_trigger_phrase_issues_no_external_call() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(candidates_body("unused")))
        .expect(0)
        .mount(&server)
        .await;

    let provider = provider_for(&server);
    let dispatcher = ChatDispatcher::new(Some(Box::new(provider)));

    let reply = dispatcher.respond_text("Excuse me, WHO ARE YOU?").await;
    assert_eq!(reply.text, PERSONA_REPLY);
    assert!(reply.warning.is_none());

    // Dropping the server verifies the expect(0) count.
}

/// A failing upstream degrades into the fixed apology plus a warning
#[tokio::test]
async fn test_upstream_failure_degrades_to_apology() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
        .expect(1)
        .mount(&server)
        .await;

    let provider = provider_for(&server);
    let dispatcher = ChatDispatcher::new(Some(Box::new(provider)));

    let reply = dispatcher.respond_text("Tell me about lasers").await;
    assert_eq!(reply.text, TEXT_APOLOGY);
    assert!(reply.warning.is_some());
}

/// Image dispatch sends inline base64 data, its MIME type, and the prompt
#[tokio::test]
async fn test_image_dispatch_sends_inline_data_and_default_prompt() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .and(body_string_contains("inline_data"))
        .and(body_string_contains("image/png"))
        .and(body_string_contains("What do you see in this image?"))
        .respond_with(ResponseTemplate::new(200).set_body_json(candidates_body("A tiny square.")))
        .expect(1)
        .mount(&server)
        .await;

    let provider = provider_for(&server);
    let dispatcher = ChatDispatcher::new(Some(Box::new(provider)));

    let reply = dispatcher.respond_image(&tiny_png(), "  ").await;
    assert_eq!(reply.text, "A tiny square.");
    assert!(reply.warning.is_none());
}

/// Image dispatch failure uses the image-specific apology
#[tokio::test]
async fn test_image_failure_uses_image_apology() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .expect(1)
        .mount(&server)
        .await;

    let provider = provider_for(&server);
    let dispatcher = ChatDispatcher::new(Some(Box::new(provider)));

    let reply = dispatcher.respond_image(&tiny_png(), "what is this").await;
    assert_eq!(reply.text, IMAGE_APOLOGY);
    assert!(reply.warning.is_some());
}

/// A custom prompt is forwarded instead of the default
#[tokio::test]
async fn test_image_dispatch_forwards_custom_prompt() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .and(body_string_contains("Count the pixels"))
        .respond_with(ResponseTemplate::new(200).set_body_json(candidates_body("Four.")))
        .expect(1)
        .mount(&server)
        .await;

    let provider = provider_for(&server);
    let dispatcher = ChatDispatcher::new(Some(Box::new(provider)));

    let reply = dispatcher.respond_image(&tiny_png(), "Count the pixels").await;
    assert_eq!(reply.text, "Four.");
}
