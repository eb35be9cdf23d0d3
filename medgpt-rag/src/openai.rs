//! Embedding provider for OpenAI-compatible `/embeddings` endpoints.
//!
//! Works against OpenAI itself and against self-hosted servers that speak
//! the same protocol (Hugging Face text-embeddings-inference, Ollama, vLLM).
//! The defaults target a text-embeddings-inference server hosting
//! `BAAI/bge-large-en`, the model the medical corpus was embedded with.
//!
//! This module is only available when the `openai` feature is enabled.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, instrument};

use crate::embedding::EmbeddingProvider;
use crate::error::{RagError, Result};

/// Base URL of a locally hosted text-embeddings-inference server.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8080/v1";

/// The model the reference corpus is embedded with.
pub const DEFAULT_MODEL: &str = "BAAI/bge-large-en";

/// Output size of `BAAI/bge-large-en`.
pub const DEFAULT_DIMENSIONS: usize = 1024;

/// Retrieval prefix expected by English BGE models on the query side.
pub const BGE_QUERY_INSTRUCTION: &str = "Represent this sentence for searching relevant passages: ";

const PROVIDER: &str = "OpenAI-compatible";

/// An [`EmbeddingProvider`] backed by an OpenAI-compatible embeddings API.
///
/// # Example
///
/// ```rust,ignore
/// use medgpt_rag::openai::OpenAIEmbeddingProvider;
///
/// let provider = OpenAIEmbeddingProvider::new()
///     .with_base_url("https://api.openai.com/v1")
///     .with_api_key("sk-...")
///     .with_model("text-embedding-3-small")
///     .with_dimensions(1536)
///     .without_query_instruction();
/// let embedding = provider.embed_query("hello world").await?;
/// ```
#[derive(Debug, Clone)]
pub struct OpenAIEmbeddingProvider {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    model: String,
    dimensions: usize,
    /// If set, passed to the API for Matryoshka dimension truncation.
    request_dimensions: Option<usize>,
    query_instruction: Option<String>,
}

impl Default for OpenAIEmbeddingProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl OpenAIEmbeddingProvider {
    /// Create a provider with the BGE defaults and no API key.
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            dimensions: DEFAULT_DIMENSIONS,
            request_dimensions: None,
            query_instruction: Some(BGE_QUERY_INSTRUCTION.to_string()),
        }
    }

    /// Set the API base URL (without the trailing `/embeddings`).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Send `key` as a bearer token. Empty keys are ignored.
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        let key = key.into();
        self.api_key = if key.trim().is_empty() { None } else { Some(key) };
        self
    }

    /// Set the model name.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Declare the model's output size without asking the server to truncate.
    pub fn with_native_dimensions(mut self, dims: usize) -> Self {
        self.dimensions = dims;
        self.request_dimensions = None;
        self
    }

    /// Ask the server to truncate embeddings to `dims` (Matryoshka models).
    pub fn with_dimensions(mut self, dims: usize) -> Self {
        self.dimensions = dims;
        self.request_dimensions = Some(dims);
        self
    }

    /// Prefix queries with `instruction` before embedding them.
    pub fn with_query_instruction(mut self, instruction: impl Into<String>) -> Self {
        self.query_instruction = Some(instruction.into());
        self
    }

    /// Embed queries exactly like documents.
    pub fn without_query_instruction(mut self) -> Self {
        self.query_instruction = None;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn endpoint(&self) -> String {
        format!("{}/embeddings", self.base_url)
    }
}

// ── API request/response types ─────────────────────────────────────

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: Vec<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    dimensions: Option<usize>,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    #[serde(default)]
    index: Option<usize>,
    embedding: Vec<f32>,
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Deserialize)]
struct ErrorDetail {
    message: String,
}

fn embedding_error(message: impl Into<String>) -> RagError {
    RagError::EmbeddingError { provider: PROVIDER.into(), message: message.into() }
}

// ── EmbeddingProvider implementation ───────────────────────────────

#[async_trait]
impl EmbeddingProvider for OpenAIEmbeddingProvider {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        debug!(provider = PROVIDER, text_len = text.len(), "embedding single text");

        let results = self.embed_batch(&[text]).await?;
        results.into_iter().next().ok_or_else(|| embedding_error("API returned empty response"))
    }

    #[instrument(skip_all, fields(batch_size = texts.len(), model = %self.model))]
    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let request_body = EmbeddingRequest {
            model: &self.model,
            input: texts.to_vec(),
            dimensions: self.request_dimensions,
        };

        let mut request = self.client.post(self.endpoint()).json(&request_body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await.map_err(|e| {
            error!(provider = PROVIDER, error = %e, "request failed");
            embedding_error(format!("request failed: {e}"))
        })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            let detail = serde_json::from_str::<ErrorResponse>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);

            error!(provider = PROVIDER, %status, "API error");
            return Err(embedding_error(format!("API returned {status}: {detail}")));
        }

        let embedding_response: EmbeddingResponse = response.json().await.map_err(|e| {
            error!(provider = PROVIDER, error = %e, "failed to parse response");
            embedding_error(format!("failed to parse response: {e}"))
        })?;

        if embedding_response.data.len() != texts.len() {
            return Err(embedding_error(format!(
                "expected {} embeddings, got {}",
                texts.len(),
                embedding_response.data.len()
            )));
        }

        let mut data = embedding_response.data;
        if data.iter().all(|d| d.index.is_some()) {
            data.sort_by_key(|d| d.index);
        }
        Ok(data.into_iter().map(|d| d.embedding).collect())
    }

    async fn embed_query(&self, query: &str) -> Result<Vec<f32>> {
        match &self.query_instruction {
            Some(instruction) => self.embed(&format!("{instruction}{query}")).await,
            None => self.embed(query).await,
        }
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}
