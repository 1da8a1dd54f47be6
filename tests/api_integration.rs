//! End-to-end tests for the REST surface.
//!
//! Each test spins up the real router on a random port backed by an
//! in-memory database and a stub LLM, then drives it over HTTP.

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use rust_decimal::Decimal;
use serde_json::{Value, json};
use tokio::net::TcpListener;

use doppel::api::{self, AppState, USER_ID_HEADER};
use doppel::dialogue::DialogueSettings;
use doppel::error::LlmError;
use doppel::llm::{
    CompletionRequest, CompletionResponse, FinishReason, LlmProvider, RetryPolicy, Role,
};
use doppel::store::{Database, LibSqlBackend, User};

const PROFILE: &str = r#"{"big5_scores":{"openness":55.4,"conscientiousness":60,"extraversion":45,"agreeableness":70,"neuroticism":30},"profile":{"description":"好奇心旺盛で穏やか","description_en":"Curious and calm"}}"#;

/// Structured calls get a profile; dialogue calls get an echo of the
/// trailing user message. Structured calls fail until `fail_first` is spent.
struct StubLlm {
    fail_first: u32,
    structured_calls: AtomicU32,
    dialogue_calls: AtomicU32,
}

impl StubLlm {
    fn new(fail_first: u32) -> Arc<Self> {
        Arc::new(Self {
            fail_first,
            structured_calls: AtomicU32::new(0),
            dialogue_calls: AtomicU32::new(0),
        })
    }
}

#[async_trait]
impl LlmProvider for StubLlm {
    fn model_name(&self) -> &str {
        "stub"
    }

    fn cost_per_token(&self) -> (Decimal, Decimal) {
        (Decimal::ZERO, Decimal::ZERO)
    }

    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        let content = if request.response_format.is_some() {
            let n = self.structured_calls.fetch_add(1, Ordering::SeqCst) + 1;
            if n <= self.fail_first {
                return Err(LlmError::RateLimited {
                    provider: "stub".into(),
                    retry_after: None,
                });
            }
            PROFILE.to_string()
        } else {
            let n = self.dialogue_calls.fetch_add(1, Ordering::SeqCst) + 1;
            let last = request
                .messages
                .iter()
                .rev()
                .find(|m| m.role == Role::User)
                .map(|m| m.content.clone())
                .unwrap_or_default();
            format!("#{n} re: {last}")
        };
        Ok(CompletionResponse {
            content,
            input_tokens: 0,
            output_tokens: 0,
            finish_reason: FinishReason::Stop,
            response_id: None,
        })
    }
}

struct TestServer {
    base: String,
    db: Arc<dyn Database>,
    llm: Arc<StubLlm>,
    client: reqwest::Client,
}

async fn start_server(llm: Arc<StubLlm>) -> TestServer {
    let db: Arc<dyn Database> = Arc::new(LibSqlBackend::new_memory().await.unwrap());
    let state = AppState::new(
        Arc::clone(&db),
        llm.clone(),
        RetryPolicy::default(),
        DialogueSettings::default(),
    );
    let app = api::router(state);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    tokio::time::sleep(Duration::from_millis(50)).await;

    let client = reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .unwrap();

    TestServer {
        base: format!("http://127.0.0.1:{port}"),
        db,
        llm,
        client,
    }
}

#[tokio::test]
async fn questionnaire_to_profile() {
    let server = start_server(StubLlm::new(0)).await;

    let questions: Value = server
        .client
        .get(format!("{}/api/questions", server.base))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let ids: Vec<String> = questions["data"]["questions"]
        .as_array()
        .unwrap()
        .iter()
        .map(|q| q["id"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(ids.len(), 5);

    let answers: Vec<Value> = ids
        .iter()
        .map(|id| json!({"uuid": id, "answer": format!("answer to {id}")}))
        .collect();
    let response = server
        .client
        .post(format!("{}/api/answers", server.base))
        .header(USER_ID_HEADER, "alice")
        .json(&answers)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let profile: Value = server
        .client
        .get(format!("{}/api/users/alice/personality", server.base))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(profile["success"], true);
    assert_eq!(profile["data"]["personality"]["openness"], 55);
    assert_eq!(profile["data"]["personality"]["description_en"], "Curious and calm");
    assert_eq!(server.llm.structured_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn transient_failures_are_absorbed() {
    let server = start_server(StubLlm::new(2)).await;

    let response = server
        .client
        .post(format!("{}/api/answers", server.base))
        .header(USER_ID_HEADER, "alice")
        .json(&json!([{"question_id": "q-openness", "answer": "yes"}]))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(server.llm.structured_calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn exhaustion_returns_500_and_stores_no_profile() {
    let server = start_server(StubLlm::new(3)).await;

    let response = server
        .client
        .post(format!("{}/api/answers", server.base))
        .header(USER_ID_HEADER, "alice")
        .json(&json!([{"uuid": "q-openness", "answer": "yes"}]))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = response.json().await.unwrap();
    assert_eq!(
        body,
        json!({"success": false, "error": ["Failed to fetch personality"]})
    );

    // Answers stay; no profile is written.
    assert_eq!(server.db.get_answers_by_user_id("alice").await.unwrap().len(), 1);
    assert!(server.db.get_latest_personality("alice").await.unwrap().is_none());
}

#[tokio::test]
async fn room_flow() {
    let server = start_server(StubLlm::new(0)).await;
    server
        .db
        .create_user(&User {
            id: "bob".into(),
            name: "Bob".into(),
            image_url: None,
        })
        .await
        .unwrap();

    // Opening the room seeds the dialogue and redirects.
    let response = server
        .client
        .get(format!("{}/api/rooms/redirect-room/bob", server.base))
        .header(USER_ID_HEADER, "alice")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    let location = response.headers()["location"].to_str().unwrap().to_string();
    let room_id = location.strip_prefix("/rooms/").unwrap().to_string();

    // Opening again reuses the room without new LLM calls.
    let again = server
        .client
        .get(format!("{}/api/rooms/redirect-room/bob", server.base))
        .header(USER_ID_HEADER, "alice")
        .send()
        .await
        .unwrap();
    assert_eq!(again.headers()["location"].to_str().unwrap(), location);
    assert_eq!(server.llm.dialogue_calls.load(Ordering::SeqCst), 6);

    let response = server
        .client
        .post(format!("{}/api/rooms/{room_id}/messages", server.base))
        .header(USER_ID_HEADER, "alice")
        .json(&json!({"message": "ありがとう"}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let room: Value = server
        .client
        .get(format!("{}/api/rooms/{room_id}", server.base))
        .header(USER_ID_HEADER, "alice")
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(room["data"]["room"]["id"], room_id.as_str());
    let messages = room["data"]["messages"].as_array().unwrap();
    assert_eq!(messages.len(), 7);

    // Counselor (member) speaks first, partner (owner) replies.
    assert_eq!(messages[0]["user_id"], "bob");
    assert_eq!(messages[0]["user"]["name"], "Bob");
    assert_eq!(messages[0]["message"], "#1 re: こんにちは");
    assert_eq!(messages[1]["user_id"], "alice");
    assert!(messages[1]["user"].is_null());
    assert_eq!(messages[1]["message"], "#2 re: #1 re: こんにちは");
    assert_eq!(messages[2]["message"], "#3 re: #2 re: #1 re: こんにちは");
    assert!(
        messages[..6]
            .iter()
            .all(|m| m["message_type"] == "autoAi")
    );
    assert_eq!(messages[6]["message_type"], "general");
    assert_eq!(messages[6]["message"], "ありがとう");
}

#[tokio::test]
async fn identity_is_required() {
    let server = start_server(StubLlm::new(0)).await;

    let response = server
        .client
        .get(format!("{}/api/rooms/redirect-room/bob", server.base))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["success"], false);
    assert_eq!(server.llm.dialogue_calls.load(Ordering::SeqCst), 0);
}
