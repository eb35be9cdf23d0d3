//! Groq client against a local event-stream stub.
#![cfg(feature = "groq")]

use std::sync::{Arc, Mutex};

use axum::http::{HeaderMap, StatusCode, header};
use axum::response::IntoResponse;
use axum::{Json, Router, extract::State, routing::post};
use futures::StreamExt;
use medgpt_model::{CompletionClient, GroqClient, GroqConfig, ModelError, PromptMessage};
use serde_json::{Value, json};

#[derive(Clone, Default)]
struct Stub {
    body: String,
    seen: Arc<Mutex<Vec<(Option<String>, Value)>>>,
}

fn sse(payloads: &[&str]) -> String {
    payloads.iter().map(|p| format!("data: {p}\n\n")).collect()
}

async fn completions(State(stub): State<Stub>, headers: HeaderMap, Json(body): Json<Value>) -> impl IntoResponse {
    let auth = headers.get(header::AUTHORIZATION).and_then(|v| v.to_str().ok()).map(String::from);
    stub.seen.lock().unwrap().push((auth, body));
    ([(header::CONTENT_TYPE, "text/event-stream")], stub.body.clone())
}

async fn unauthorized() -> (StatusCode, Json<Value>) {
    (StatusCode::UNAUTHORIZED, Json(json!({ "error": { "message": "Invalid API Key" } })))
}

async fn spawn(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind test listener");
    let addr = listener.local_addr().expect("listener addr");
    tokio::spawn(async move {
        axum::serve(listener, router).await.expect("server run");
    });
    format!("http://{addr}/openai/v1")
}

async fn client_for(stub: Stub) -> GroqClient {
    let base = spawn(
        Router::new().route("/openai/v1/chat/completions", post(completions)).with_state(stub),
    )
    .await;
    GroqClient::new(GroqConfig::new("gsk_test").with_base_url(base)).unwrap()
}

fn messages() -> Vec<PromptMessage> {
    vec![PromptMessage::system("system"), PromptMessage::user("ctx\n\nQ: What is diabetes?\nA:")]
}

#[tokio::test]
async fn fragments_arrive_in_order_and_skip_empty_deltas() {
    let stub = Stub {
        body: sse(&[
            r#"{"choices":[{"delta":{"role":"assistant"}}]}"#,
            r#"{"choices":[{"delta":{"content":"Diab"}}]}"#,
            r#"{"choices":[{"delta":{"content":""}}]}"#,
            r#"{"choices":[{"delta":{"content":"etes is"}}]}"#,
            r#"{"choices":[{"delta":{"content":" a metabolic..."}}]}"#,
            r#"{"choices":[{"delta":{},"finish_reason":"stop"}]}"#,
            "[DONE]",
        ]),
        ..Stub::default()
    };
    let client = client_for(stub).await;

    let fragments: Vec<String> =
        client.stream(messages()).await.unwrap().map(|f| f.unwrap()).collect().await;

    assert_eq!(fragments, vec!["Diab", "etes is", " a metabolic..."]);
}

#[tokio::test]
async fn request_carries_bearer_key_and_generation_settings() {
    let stub = Stub { body: sse(&["[DONE]"]), ..Stub::default() };
    let seen = stub.seen.clone();
    let client = client_for(stub).await;

    let text = client.stream(messages()).await.unwrap().collect_text().await.unwrap();

    assert!(text.is_empty());
    let (auth, body) = seen.lock().unwrap()[0].clone();
    assert_eq!(auth.as_deref(), Some("Bearer gsk_test"));
    assert_eq!(body["model"], "llama3-70b-8192");
    assert_eq!(body["max_tokens"], 3000);
    assert_eq!(body["stream"], true);
    assert!((body["temperature"].as_f64().unwrap() - 0.7).abs() < 1e-6);
    assert_eq!(body["messages"][0]["role"], "system");
    assert_eq!(body["messages"][1]["content"], "ctx\n\nQ: What is diabetes?\nA:");
}

#[tokio::test]
async fn non_success_status_is_api_error_with_detail() {
    let base =
        spawn(Router::new().route("/openai/v1/chat/completions", post(unauthorized))).await;
    let client = GroqClient::new(GroqConfig::new("bad").with_base_url(base)).unwrap();

    let err = client.stream(messages()).await.unwrap_err();

    assert_eq!(
        err,
        ModelError::Api {
            provider: "Groq".into(),
            status: Some(401),
            message: "Invalid API Key".into(),
        }
    );
}

#[tokio::test]
async fn undecodable_chunk_is_malformed_after_earlier_fragments() {
    let stub = Stub {
        body: sse(&[r#"{"choices":[{"delta":{"content":"Partial"}}]}"#, "{oops", "[DONE]"]),
        ..Stub::default()
    };
    let client = client_for(stub).await;
    let mut stream = client.stream(messages()).await.unwrap();

    assert_eq!(stream.next().await, Some(Ok("Partial".to_string())));
    let err = stream.next().await.unwrap().unwrap_err();
    assert!(err.is_malformed());
}

#[tokio::test]
async fn stream_without_done_marker_still_completes() {
    let stub = Stub {
        body: sse(&[r#"{"choices":[{"delta":{"content":"Short answer."}}]}"#]),
        ..Stub::default()
    };
    let client = client_for(stub).await;

    let text = client.stream(messages()).await.unwrap().collect_text().await.unwrap();

    assert_eq!(text, "Short answer.");
}

#[tokio::test]
async fn cancelling_stops_delivery() {
    let stub = Stub {
        body: sse(&[
            r#"{"choices":[{"delta":{"content":"one"}}]}"#,
            r#"{"choices":[{"delta":{"content":"two"}}]}"#,
            "[DONE]",
        ]),
        ..Stub::default()
    };
    let client = client_for(stub).await;
    let mut stream = client.stream(messages()).await.unwrap();
    let handle = stream.cancel_handle();

    assert_eq!(stream.next().await, Some(Ok("one".to_string())));
    handle.cancel();
    assert_eq!(stream.next().await, None);
}

#[test]
fn blank_key_is_rejected_before_any_request() {
    let err = GroqClient::new(GroqConfig::new("")).unwrap_err();
    assert!(matches!(err, ModelError::MissingCredential(_)));
}
