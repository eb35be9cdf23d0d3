//! Streaming client for Groq chat completions.

use async_stream::try_stream;
use async_trait::async_trait;
use eventsource_stream::{EventStreamError, Eventsource};
use futures::StreamExt;
use tracing::{debug, instrument, warn};

use super::config::GroqConfig;
use super::wire::{ChatCompletionRequest, ErrorResponse, StreamEvent, decode_event};
use crate::completion::{CompletionClient, CompletionStream};
use crate::error::{ModelError, Result};
use crate::message::PromptMessage;

const PROVIDER: &str = "Groq";

/// Streams answers from Groq's OpenAI-compatible chat-completions endpoint.
///
/// ```rust,ignore
/// use medgpt_model::{CompletionClient, GroqClient, GroqConfig};
///
/// let client = GroqClient::new(GroqConfig::new(api_key))?;
/// let answer = client.stream(messages).await?.collect_text().await?;
/// ```
#[derive(Debug, Clone)]
pub struct GroqClient {
    http: reqwest::Client,
    config: GroqConfig,
}

impl GroqClient {
    /// Create a client, validating the configuration first.
    pub fn new(config: GroqConfig) -> Result<Self> {
        config.validate()?;
        let http = reqwest::Client::builder()
            .user_agent(concat!("medgpt/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ModelError::InvalidConfig(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { http, config })
    }

    /// Create a client keyed from `GROQ_API_KEY`.
    pub fn from_env() -> Result<Self> {
        Self::new(GroqConfig::from_env()?)
    }

    pub fn config(&self) -> &GroqConfig {
        &self.config
    }
}

fn request_error(e: reqwest::Error) -> ModelError {
    ModelError::Request { provider: PROVIDER.to_string(), message: e.to_string() }
}

fn event_error(e: EventStreamError<reqwest::Error>) -> ModelError {
    match e {
        EventStreamError::Transport(e) => request_error(e),
        other => ModelError::MalformedResponse {
            provider: PROVIDER.to_string(),
            message: format!("invalid event stream: {other}"),
        },
    }
}

#[async_trait]
impl CompletionClient for GroqClient {
    fn name(&self) -> &str {
        &self.config.model
    }

    #[instrument(skip_all, fields(model = %self.config.model, messages = messages.len()), err)]
    async fn stream(&self, messages: Vec<PromptMessage>) -> Result<CompletionStream> {
        let request = ChatCompletionRequest {
            model: &self.config.model,
            messages: &messages,
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens,
            stream: true,
        };

        let response = self
            .http
            .post(self.config.endpoint())
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()
            .await
            .map_err(request_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorResponse>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            return Err(ModelError::Api {
                provider: PROVIDER.to_string(),
                status: Some(status.as_u16()),
                message,
            });
        }
        debug!(status = status.as_u16(), "completion stream opened");

        let mut events = Box::pin(response.bytes_stream().eventsource());
        let fragments = try_stream! {
            let mut finished = false;
            while let Some(event) = events.next().await {
                let event = event.map_err(event_error)?;
                match decode_event(PROVIDER, &event.data)? {
                    StreamEvent::Fragment(text) => {
                        yield text;
                    }
                    StreamEvent::Skip => {}
                    StreamEvent::Done => {
                        finished = true;
                        break;
                    }
                }
            }
            if !finished {
                warn!("completion stream closed without a [DONE] marker");
            }
        };

        Ok(CompletionStream::new(fragments))
    }
}
