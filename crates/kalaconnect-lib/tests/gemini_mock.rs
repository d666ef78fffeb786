// End-to-end tests against a local stand-in for the Gemini generateContent endpoint

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    routing::post,
    Json, Router,
};
use serde_json::{json, Value};

use kalaconnect_lib::services::ai::create_provider;
use kalaconnect_lib::services::RequestOrchestrator;
use kalaconnect_lib::{
    AIError, AIErrorCode, AppConfig, Database, GeminiConfig, GenerationRequest, HistoryFilter,
    HistorySort, ImageSource, KalaConnect, Language, ParseOutcome,
};

const PNG: &[u8] = b"\x89PNG\r\n\x1a\n\x00\x00\x00\rIHDR";

#[derive(Clone, Debug)]
struct Captured {
    model_action: String,
    api_key: Option<String>,
    body: Value,
}

#[derive(Clone)]
struct MockState {
    status: StatusCode,
    reply: Value,
    delay: Duration,
    captured: Arc<Mutex<Vec<Captured>>>,
}

async fn generate_content(
    State(state): State<MockState>,
    Path(model_action): Path<String>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    state.captured.lock().unwrap().push(Captured {
        model_action,
        api_key: headers
            .get("x-goog-api-key")
            .and_then(|v| v.to_str().ok())
            .map(String::from),
        body,
    });
    if !state.delay.is_zero() {
        tokio::time::sleep(state.delay).await;
    }
    (state.status, Json(state.reply.clone()))
}

struct MockGemini {
    addr: SocketAddr,
    captured: Arc<Mutex<Vec<Captured>>>,
}

impl MockGemini {
    async fn start(status: StatusCode, reply: Value, delay: Duration) -> Self {
        let captured = Arc::new(Mutex::new(Vec::new()));
        let state = MockState {
            status,
            reply,
            delay,
            captured: Arc::clone(&captured),
        };
        let router = Router::new()
            .route("/v1beta/models/{model_action}", post(generate_content))
            .with_state(state);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });

        Self { addr, captured }
    }

    fn endpoint(&self) -> String {
        format!("http://{}/v1beta", self.addr)
    }

    fn captured(&self) -> Vec<Captured> {
        self.captured.lock().unwrap().clone()
    }
}

fn text_reply(text: &str) -> Value {
    json!({
        "candidates": [{
            "content": { "role": "model", "parts": [{ "text": text }] },
            "finishReason": "STOP"
        }],
        "usageMetadata": { "totalTokenCount": 321 }
    })
}

fn app(mock: &MockGemini, api_key: &str) -> KalaConnect {
    app_with_db(mock, api_key, Database::in_memory().unwrap())
}

fn app_with_db(mock: &MockGemini, api_key: &str, db: Database) -> KalaConnect {
    let gemini = GeminiConfig {
        endpoint: mock.endpoint(),
        timeout_secs: 10,
        ..GeminiConfig::default()
    };
    let config = AppConfig {
        gemini: gemini.clone(),
        api_key: Some(api_key.to_string()),
        data_dir: std::env::temp_dir(),
    };
    let backend = create_provider(gemini, Some(api_key.to_string())).unwrap();
    KalaConnect::with_parts(
        config,
        db,
        Some(backend),
        RequestOrchestrator::new(),
    )
}

fn pottery_request() -> GenerationRequest {
    GenerationRequest::new(
        ImageSource::from_bytes(PNG.to_vec(), None),
        Language::Ta,
        "terracotta, wheel thrown, glazed",
    )
}

#[tokio::test]
async fn generates_parses_and_records_content() {
    let mock = MockGemini::start(
        StatusCode::OK,
        text_reply("**STORY:** Shaped on the wheel.\n\n**SOCIAL_CAPTION:** 🏺 #Terracotta\n\n**HERITAGE_CONTEXT:** Harappan roots."),
        Duration::ZERO,
    )
    .await;
    let app = app(&mock, "test-key");

    let generated = app
        .generate_craft_content(pottery_request(), Some("Pottery"))
        .await
        .unwrap();
    assert_eq!(generated.content.result.story, "Shaped on the wheel.");
    assert_eq!(generated.content.result.social_caption, "🏺 #Terracotta");
    assert_eq!(generated.content.result.heritage_context, "Harappan roots.");
    assert_eq!(generated.content.outcome, ParseOutcome::Parsed);

    let state = app.processing_state();
    assert_eq!(state.progress, 100);
    assert_eq!(state.stage, "Content generation complete!");

    let captured = mock.captured();
    assert_eq!(captured.len(), 1);
    let request = &captured[0];
    assert_eq!(request.model_action, "gemini-2.5-pro:generateContent");
    assert_eq!(request.api_key.as_deref(), Some("test-key"));

    let parts = &request.body["contents"][0]["parts"];
    assert_eq!(parts[0]["inlineData"]["mimeType"], "image/png");
    let prompt = parts[1]["text"].as_str().unwrap();
    assert!(prompt.contains("in Tamil"));
    assert!(prompt.contains("Focus on these aspects: terracotta, wheel thrown. "));
    assert!(!prompt.contains("glazed"));
    let temperature = request.body["generationConfig"]["temperature"].as_f64().unwrap();
    assert!((temperature - 0.7).abs() < 1e-6);
    assert_eq!(request.body["generationConfig"]["maxOutputTokens"], 2048);
    assert_eq!(request.body["safetySettings"].as_array().unwrap().len(), 4);

    let history = app
        .history()
        .list(&HistoryFilter::default(), HistorySort::Newest)
        .unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].id, generated.record.as_ref().unwrap().id);
    assert_eq!(history[0].craft_type, "Pottery");
    assert_eq!(history[0].language, Language::Ta);
}

#[tokio::test]
async fn unstructured_reply_degrades_to_fallback_text() {
    let mock = MockGemini::start(
        StatusCode::OK,
        text_reply("A single paragraph about Channapatna toys."),
        Duration::ZERO,
    )
    .await;
    let app = app(&mock, "test-key");

    let generated = app.generate_craft_content(pottery_request(), None).await.unwrap();
    assert_eq!(generated.content.result.story, "A single paragraph about Channapatna toys.");
    assert!(!generated.content.is_trusted());
    assert_eq!(generated.record.unwrap().craft_type, "terracotta");
}

#[tokio::test]
async fn history_write_failure_still_returns_content() {
    let mock = MockGemini::start(
        StatusCode::OK,
        text_reply("STORY: Block printed by hand.\n\nSOCIAL_CAPTION: #Bagru\n\nHERITAGE_CONTEXT: Rajasthan."),
        Duration::ZERO,
    )
    .await;
    let db = Database::in_memory().unwrap();
    let app = app_with_db(&mock, "test-key", db.clone());
    db.with_connection_raw(|conn| conn.execute_batch("DROP TABLE content_history"))
        .unwrap();

    let generated = app
        .generate_craft_content(pottery_request(), Some("Textiles"))
        .await
        .unwrap();
    assert_eq!(generated.content.result.story, "Block printed by hand.");
    assert_eq!(generated.content.outcome, ParseOutcome::Parsed);
    assert!(generated.record.is_none());
    assert_eq!(app.processing_state().progress, 100);
}

#[tokio::test]
async fn rate_limit_is_classified() {
    let mock = MockGemini::start(
        StatusCode::TOO_MANY_REQUESTS,
        json!({ "error": { "code": 429, "message": "Resource has been exhausted", "status": "RESOURCE_EXHAUSTED" } }),
        Duration::ZERO,
    )
    .await;
    let app = app(&mock, "test-key");

    let err = app.generate_text("Write a haiku".to_string()).await.unwrap_err();
    assert_eq!(err.code(), AIErrorCode::RateLimited);
    assert_eq!(
        err.to_user_message(),
        "Rate limit exceeded. Please wait a moment before trying again."
    );
    assert_eq!(mock.captured()[0].model_action, "gemini-2.5-flash:generateContent");
    assert!(!app.orchestrator().is_busy());
}

#[tokio::test]
async fn invalid_key_is_auth_error() {
    let mock = MockGemini::start(
        StatusCode::BAD_REQUEST,
        json!({ "error": { "code": 400, "message": "API key not valid. Please pass a valid API key.", "status": "INVALID_ARGUMENT" } }),
        Duration::ZERO,
    )
    .await;
    let app = app(&mock, "bad-key");

    let err = app
        .analyze_craft_image(Some(ImageSource::from_bytes(PNG.to_vec(), None)))
        .await
        .unwrap_err();
    assert_eq!(err.code(), AIErrorCode::AuthFailed);
}

#[tokio::test]
async fn safety_block_is_classified() {
    let mock = MockGemini::start(
        StatusCode::OK,
        json!({ "promptFeedback": { "blockReason": "SAFETY" } }),
        Duration::ZERO,
    )
    .await;
    let app = app(&mock, "test-key");

    let err = app.generate_craft_content(pottery_request(), None).await.unwrap_err();
    assert_eq!(err.code(), AIErrorCode::SafetyBlocked);
    assert!(app
        .history()
        .list(&HistoryFilter::default(), HistorySort::Newest)
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn cancel_stops_waiting_on_slow_service() {
    let mock = MockGemini::start(StatusCode::OK, text_reply("late"), Duration::from_secs(30)).await;
    let app = app(&mock, "test-key");

    let task = {
        let app = app.clone();
        tokio::spawn(async move { app.generate_text("Write a haiku".to_string()).await })
    };

    // Wait until the request reaches the service
    for _ in 0..200 {
        if !mock.captured().is_empty() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert!(app.orchestrator().is_busy());

    assert!(app.cancel_request());
    let err = tokio::time::timeout(Duration::from_secs(5), task)
        .await
        .unwrap()
        .unwrap()
        .unwrap_err();
    assert_eq!(err, AIError::Cancelled);

    let state = app.processing_state();
    assert!(!state.is_processing);
    assert_eq!(state.stage, "Cancelled by user");
}

#[tokio::test]
async fn overlapping_generation_is_busy() {
    let mock = MockGemini::start(StatusCode::OK, text_reply("slow"), Duration::from_millis(500)).await;
    let app = app(&mock, "test-key");

    let first = {
        let app = app.clone();
        tokio::spawn(async move { app.generate_text("first".to_string()).await })
    };
    while !app.orchestrator().is_busy() {
        tokio::task::yield_now().await;
    }

    let err = app.generate_text("second".to_string()).await.unwrap_err();
    assert_eq!(err, AIError::Busy);
    assert_eq!(first.await.unwrap().unwrap(), "slow");
}

#[tokio::test]
async fn missing_api_key_reports_auth_error() {
    let dir = tempfile::tempdir().unwrap();
    let app = KalaConnect::open(AppConfig {
        gemini: GeminiConfig::default(),
        api_key: None,
        data_dir: dir.path().to_path_buf(),
    })
    .unwrap();

    let err = app.generate_text("hello".to_string()).await.unwrap_err();
    assert_eq!(err.code(), AIErrorCode::AuthFailed);

    // Storage still works without a key
    app.preferences().set_language(Language::Hi).unwrap();
    assert_eq!(app.preferences().language().unwrap(), Language::Hi);
}
