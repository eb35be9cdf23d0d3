//! Building the assistant from settings against an on-disk index.

use std::collections::HashMap;

use axum::{Json, Router, routing::post};
use medgpt_agent::{AnswerError, Interaction, NullRenderer, RETRIEVAL_ERROR_MESSAGE, Session};
use medgpt_cli::GlobalArgs;
use medgpt_cli::settings::{
    API_KEY_ENV, EMBEDDING_URL_ENV, FileSettings, INDEX_DIR_ENV, Settings,
};
use serde_json::{Value, json};

async fn embeddings(Json(body): Json<Value>) -> Json<Value> {
    let count = body["input"].as_array().map(Vec::len).unwrap_or(1);
    let data: Vec<Value> =
        (0..count).map(|i| json!({ "index": i, "embedding": [1.0, 0.0, 0.0] })).collect();
    Json(json!({ "data": data }))
}

async fn spawn_embedder() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind test listener");
    let addr = listener.local_addr().expect("listener addr");
    let router = Router::new().route("/v1/embeddings", post(embeddings));
    tokio::spawn(async move {
        axum::serve(listener, router).await.expect("server run");
    });
    format!("http://{addr}/v1")
}

fn settings(index_dir: &std::path::Path, embedding_url: &str) -> Settings {
    let vars = HashMap::from([
        (API_KEY_ENV.to_string(), "gsk_test".to_string()),
        (INDEX_DIR_ENV.to_string(), index_dir.display().to_string()),
        (EMBEDDING_URL_ENV.to_string(), embedding_url.to_string()),
    ]);
    Settings::resolve_with_vars(FileSettings::default(), &vars, &GlobalArgs::default()).unwrap()
}

#[tokio::test]
async fn corrupt_index_fails_queries_not_startup() {
    let index = tempfile::tempdir().unwrap();
    std::fs::write(index.path().join("medical_books.json"), "{not json").unwrap();
    let url = spawn_embedder().await;

    let assistant = medgpt_cli::build_assistant(&settings(index.path(), &url)).await.unwrap();
    let status = assistant.status().await;
    assert!(!status.index_reachable);
    assert!(status.credential_present);

    let mut session = Session::new(status);
    let interaction = session.ask(&assistant, "What is anemia?", &mut NullRenderer).await;

    match interaction {
        Interaction::Failed { error: AnswerError::RetrievalUnavailable(_), notice } => {
            assert_eq!(notice, RETRIEVAL_ERROR_MESSAGE);
        }
        other => panic!("expected retrieval failure, got {other:?}"),
    }
    assert_eq!(session.transcript().len(), 2);

    // The session keeps accepting questions.
    let again = session.ask(&assistant, "And iron deficiency?", &mut NullRenderer).await;
    assert!(matches!(again, Interaction::Failed { .. }));
    assert_eq!(session.transcript().len(), 4);
}

#[tokio::test]
async fn missing_index_is_created_empty() {
    let dir = tempfile::tempdir().unwrap();
    let index = dir.path().join("Embedded_Med_books");
    let url = spawn_embedder().await;

    let assistant = medgpt_cli::build_assistant(&settings(&index, &url)).await.unwrap();

    assert!(index.join("medical_books.json").is_file());
    assert!(assistant.status().await.index_reachable);
}
