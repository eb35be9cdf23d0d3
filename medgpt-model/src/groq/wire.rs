//! OpenAI-compatible chat-completions wire types.

use serde::{Deserialize, Serialize};

use crate::error::{ModelError, Result};
use crate::message::PromptMessage;

/// Sentinel payload that ends an OpenAI-style event stream.
pub const DONE_SENTINEL: &str = "[DONE]";

#[derive(Debug, Clone, Serialize)]
pub struct ChatCompletionRequest<'a> {
    pub model: &'a str,
    pub messages: &'a [PromptMessage],
    pub temperature: f32,
    pub max_tokens: u32,
    pub stream: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatCompletionChunk {
    #[serde(default)]
    pub choices: Vec<ChunkChoice>,
    #[serde(default)]
    pub error: Option<ApiErrorBody>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChunkChoice {
    #[serde(default)]
    pub delta: Delta,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Delta {
    #[serde(default)]
    pub content: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorBody {
    pub message: String,
}

/// Envelope used by error responses with a non-2xx status.
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorResponse {
    pub error: ApiErrorBody,
}

/// What a single event-stream payload means for the consumer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
    /// Non-empty answer text.
    Fragment(String),
    /// A keep-alive, role-only delta or finish marker with no text.
    Skip,
    /// End of stream.
    Done,
}

/// Decode one `data:` payload.
///
/// Empty deltas are skipped rather than surfaced as empty fragments.
pub fn decode_event(provider: &str, data: &str) -> Result<StreamEvent> {
    let data = data.trim();
    if data.is_empty() {
        return Ok(StreamEvent::Skip);
    }
    if data == DONE_SENTINEL {
        return Ok(StreamEvent::Done);
    }

    let chunk: ChatCompletionChunk =
        serde_json::from_str(data).map_err(|e| ModelError::MalformedResponse {
            provider: provider.to_string(),
            message: format!("undecodable stream chunk: {e}"),
        })?;

    if let Some(error) = chunk.error {
        return Err(ModelError::Api {
            provider: provider.to_string(),
            status: None,
            message: error.message,
        });
    }

    let text = chunk
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.delta.content)
        .unwrap_or_default();

    if text.is_empty() { Ok(StreamEvent::Skip) } else { Ok(StreamEvent::Fragment(text)) }
}
