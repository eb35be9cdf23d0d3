//! The completion-client abstraction and its fragment stream.

use std::fmt;
use std::pin::Pin;
use std::task::{Context, Poll};

use async_trait::async_trait;
use futures::stream::{AbortHandle, Abortable};
use futures::{Stream, StreamExt};

use crate::error::Result;
use crate::message::PromptMessage;

/// A boxed stream of text fragments.
pub type FragmentStream = Pin<Box<dyn Stream<Item = Result<String>> + Send>>;

/// A client for a hosted chat-completion API.
///
/// # Example
///
/// ```rust,ignore
/// use futures::StreamExt;
/// use medgpt_model::{CompletionClient, PromptMessage};
///
/// let mut stream = client.stream(vec![PromptMessage::user("Define sepsis.")]).await?;
/// while let Some(fragment) = stream.next().await {
///     print!("{}", fragment?);
/// }
/// ```
#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// The model identifier requests are sent to.
    fn name(&self) -> &str;

    /// Send `messages` and return the generated answer as a fragment stream.
    ///
    /// Concatenating every fragment in delivery order yields the full answer.
    async fn stream(&self, messages: Vec<PromptMessage>) -> Result<CompletionStream>;
}

/// Cancels a [`CompletionStream`] from outside the task consuming it.
#[derive(Debug, Clone)]
pub struct CancelHandle(AbortHandle);

impl CancelHandle {
    /// End the stream; the consumer sees end-of-stream at its next poll.
    pub fn cancel(&self) {
        self.0.abort();
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.is_aborted()
    }
}

/// A finite, non-restartable stream of answer fragments that can be cancelled.
pub struct CompletionStream {
    inner: Abortable<FragmentStream>,
    handle: CancelHandle,
}

impl CompletionStream {
    /// Wrap any fragment stream.
    pub fn new(stream: impl Stream<Item = Result<String>> + Send + 'static) -> Self {
        let (handle, registration) = AbortHandle::new_pair();
        let boxed: FragmentStream = Box::pin(stream);
        Self { inner: Abortable::new(boxed, registration), handle: CancelHandle(handle) }
    }

    /// A stream that yields the given fragments and ends.
    pub fn from_fragments<I, S>(fragments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let items: Vec<Result<String>> = fragments.into_iter().map(|f| Ok(f.into())).collect();
        Self::new(futures::stream::iter(items))
    }

    pub fn cancel_handle(&self) -> CancelHandle {
        self.handle.clone()
    }

    pub fn is_cancelled(&self) -> bool {
        self.inner.is_aborted()
    }

    /// Drain the stream, concatenating fragments in order.
    pub async fn collect_text(mut self) -> Result<String> {
        let mut text = String::new();
        while let Some(fragment) = self.next().await {
            text.push_str(&fragment?);
        }
        Ok(text)
    }
}

impl fmt::Debug for CompletionStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompletionStream").field("cancelled", &self.is_cancelled()).finish()
    }
}

impl Stream for CompletionStream {
    type Item = Result<String>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.inner).poll_next(cx)
    }
}
