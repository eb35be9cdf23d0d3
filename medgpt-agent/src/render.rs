//! Incremental rendering of a streamed answer.

use futures::StreamExt;
use medgpt_model::{CancelHandle, CompletionStream, ModelError};
use serde::Serialize;
use tracing::{debug, warn};

use crate::assistant::Answer;

/// Lifecycle of one query:
/// `Idle → Retrieving → (NoContext | Assembling → Streaming) → Rendered → Idle`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryPhase {
    Idle,
    Retrieving,
    NoContext,
    Assembling,
    Streaming,
    Rendered,
}

/// Receives progress of a query as it runs.
///
/// Only `on_fragment` is required; the rest default to no-ops.
pub trait ResponseRenderer: Send {
    fn on_phase(&mut self, _phase: QueryPhase) {}

    /// Called once the completion stream is open, before the first fragment.
    fn on_stream_start(&mut self, _cancel: CancelHandle) {}

    /// Called for every fragment in delivery order with the answer so far.
    fn on_fragment(&mut self, fragment: &str, accumulated: &str);

    fn on_finish(&mut self, _answer: &Answer) {}
}

/// Discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullRenderer;

impl ResponseRenderer for NullRenderer {
    fn on_fragment(&mut self, _fragment: &str, _accumulated: &str) {}
}

/// Pull fragments until the stream ends or is cancelled, rendering each one.
///
/// Returns the concatenation of every fragment delivered. A cancelled stream
/// returns what arrived before cancellation.
pub async fn consume(
    mut stream: CompletionStream,
    renderer: &mut dyn ResponseRenderer,
) -> Result<String, ModelError> {
    let mut accumulated = String::new();
    let mut fragments = 0usize;

    while let Some(fragment) = stream.next().await {
        let fragment = fragment.inspect_err(|e| {
            warn!(error = %e, fragments, "completion stream failed");
        })?;
        accumulated.push_str(&fragment);
        fragments += 1;
        renderer.on_fragment(&fragment, &accumulated);
    }

    debug!(fragments, bytes = accumulated.len(), cancelled = stream.is_cancelled(), "stream consumed");
    Ok(accumulated)
}
