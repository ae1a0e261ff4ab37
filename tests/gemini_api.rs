//! Gemini REST 客户端与模拟服务器的集成测试

use std::io::Cursor;
use std::sync::Arc;
use std::time::Duration;

use playbot_lib::ai::{
    ApiConfig, EmbeddingConfig, GenerativeModel, ImageConfig, ModelConfig, TextEmbedder,
    VisionModel, DEFAULT_CAPTION_PROMPT,
};
use playbot_lib::{dispatch, AiError, AppConfig, AppState, Event, GeminiClient, Reply, SelectedMode};
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const CHAT_PATH: &str = "/models/gemini-2.0-flash:generateContent";
const EMBED_PATH: &str = "/models/text-embedding-004:embedContent";

fn text_response(text: &str) -> serde_json::Value {
    json!({
        "candidates": [{
            "content": {"role": "model", "parts": [{"text": text}]},
            "finishReason": "STOP"
        }],
        "usageMetadata": {"promptTokenCount": 4, "candidatesTokenCount": 6, "totalTokenCount": 10}
    })
}

fn client(server: &MockServer) -> Arc<GeminiClient> {
    Arc::new(GeminiClient::new(ApiConfig::custom(&server.uri(), Some("test-api-key"))).unwrap())
}

fn png_bytes() -> Vec<u8> {
    let img = image::RgbImage::from_pixel(32, 24, image::Rgb([10, 120, 200]));
    let mut buffer = Cursor::new(Vec::new());
    image::DynamicImage::ImageRgb8(img)
        .write_to(&mut buffer, image::ImageFormat::Png)
        .unwrap();
    buffer.into_inner()
}

#[tokio::test]
async fn test_complete_text_sends_api_key_and_prompt() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(CHAT_PATH))
        .and(header("x-goog-api-key", "test-api-key"))
        .and(body_partial_json(json!({
            "contents": [{"role": "user", "parts": [{"text": "What is 2+2?"}]}]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(text_response("4")))
        .expect(1)
        .mount(&server)
        .await;

    let model = GenerativeModel::new(client(&server), ModelConfig::chat_default());
    let answer = model.complete_text("What is 2+2?").await.unwrap();
    assert_eq!(answer, "4");
}

#[tokio::test]
async fn test_chat_session_sends_mirrored_history() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(CHAT_PATH))
        .and(body_partial_json(json!({
            "contents": [{"role": "user", "parts": [{"text": "Hello"}]}]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(text_response("Hi!")))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(CHAT_PATH))
        .and(body_partial_json(json!({
            "contents": [
                {"role": "user", "parts": [{"text": "Hello"}]},
                {"role": "model", "parts": [{"text": "Hi!"}]},
                {"role": "user", "parts": [{"text": "How are you?"}]}
            ]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(text_response("Great.")))
        .expect(1)
        .mount(&server)
        .await;

    let model = GenerativeModel::new(client(&server), ModelConfig::chat_default());
    let mut session = model.start_chat(Vec::new());
    session.send_message("Hello").await.unwrap();
    let reply = session.send_message("How are you?").await.unwrap();

    assert_eq!(reply.text(), "Great.");
    assert_eq!(session.len(), 4);
}

#[tokio::test]
async fn test_client_error_maps_to_rejected() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(CHAT_PATH))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": {"code": 400, "message": "API key not valid.", "status": "INVALID_ARGUMENT"}
        })))
        .mount(&server)
        .await;

    let model = GenerativeModel::new(client(&server), ModelConfig::chat_default());
    let mut session = model.start_chat(Vec::new());

    match session.send_message("Hello").await {
        Err(AiError::RemoteRejected { status, message }) => {
            assert_eq!(status, Some(400));
            assert_eq!(message, "API key not valid.");
        }
        other => panic!("unexpected result: {:?}", other),
    }
    assert!(session.is_empty());
}

#[tokio::test]
async fn test_server_error_maps_to_unavailable() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(CHAT_PATH))
        .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
        .expect(1)
        .mount(&server)
        .await;

    let model = GenerativeModel::new(client(&server), ModelConfig::chat_default());
    let result = model.complete_text("hello").await;
    assert!(matches!(result, Err(AiError::RemoteUnavailable(_))));
}

#[tokio::test]
async fn test_timeout_maps_to_unavailable() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(CHAT_PATH))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(text_response("late"))
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let config = ApiConfig {
        timeout_secs: 1,
        ..ApiConfig::custom(&server.uri(), None)
    };
    let model = GenerativeModel::new(
        Arc::new(GeminiClient::new(config).unwrap()),
        ModelConfig::chat_default(),
    );

    let result = model.complete_text("hello").await;
    assert!(matches!(result, Err(AiError::RemoteUnavailable(_))));
}

#[tokio::test]
async fn test_unexpected_body_is_malformed() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(EMBED_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let embedder = TextEmbedder::new(client(&server), EmbeddingConfig::default());
    let result = embedder.embed("hello").await;
    assert!(matches!(result, Err(AiError::MalformedResponse(_))));
}

#[tokio::test]
async fn test_embed_text() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(EMBED_PATH))
        .and(body_partial_json(json!({
            "model": "models/text-embedding-004",
            "content": {"parts": [{"text": "hello world"}]},
            "taskType": "RETRIEVAL_DOCUMENT"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "embedding": {"values": [0.25, -0.5, 0.125]}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let embedder = TextEmbedder::new(client(&server), EmbeddingConfig::default());
    let vector = embedder.embed("hello world").await.unwrap();
    assert_eq!(vector.values(), &[0.25, -0.5, 0.125]);
}

#[tokio::test]
async fn test_embed_empty_text_makes_no_request() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let embedder = TextEmbedder::new(client(&server), EmbeddingConfig::default());
    assert!(matches!(embedder.embed("").await, Err(AiError::EmptyInput)));
}

#[tokio::test]
async fn test_caption_sends_inline_jpeg() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(CHAT_PATH))
        .and(body_partial_json(json!({
            "contents": [{
                "role": "user",
                "parts": [
                    {"text": DEFAULT_CAPTION_PROMPT},
                    {"inlineData": {"mimeType": "image/jpeg"}}
                ]
            }]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(text_response("A blue rectangle.")))
        .expect(1)
        .mount(&server)
        .await;

    let vision = VisionModel::new(
        GenerativeModel::new(client(&server), ModelConfig::new("gemini-2.0-flash")),
        ImageConfig::default(),
    );
    let caption = vision
        .caption_image(DEFAULT_CAPTION_PROMPT, &png_bytes())
        .await
        .unwrap();
    assert_eq!(caption, "A blue rectangle.");
}

#[tokio::test]
async fn test_caption_non_image_makes_no_request() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let vision = VisionModel::new(
        GenerativeModel::new(client(&server), ModelConfig::vision_default()),
        ImageConfig::default(),
    );
    let result = vision.caption_image(DEFAULT_CAPTION_PROMPT, b"%PDF-1.7").await;
    assert!(matches!(result, Err(AiError::UnsupportedImageFormat(_))));
}

#[tokio::test]
async fn test_app_state_end_to_end() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(CHAT_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(text_response("Hello there!")))
        .mount(&server)
        .await;

    let mut config = AppConfig::default();
    config.api = ApiConfig::custom(&server.uri(), Some("test-api-key"));
    let mut state = AppState::new(config).unwrap();
    assert_eq!(state.session.selected_mode(), SelectedMode::ChatBot);

    let reply = dispatch(&mut state, Event::SubmitText("Hello".into())).await;
    assert!(matches!(reply, Reply::Chat { .. }));

    let history = state.session.chat_session().unwrap().history();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].text(), "Hello");
    assert_eq!(history[1].text(), "Hello there!");

    dispatch(&mut state, Event::ClearChat).await;
    assert!(state.session.chat_session().unwrap().is_empty());
}
