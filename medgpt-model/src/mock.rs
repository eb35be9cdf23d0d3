//! Scripted completion client for tests and offline runs.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::completion::{CompletionClient, CompletionStream};
use crate::error::{ModelError, Result};
use crate::message::PromptMessage;

#[derive(Debug, Clone)]
enum Script {
    Fragments(Vec<String>),
    Fail(ModelError),
    FailMidStream(Vec<String>, ModelError),
}

/// A [`CompletionClient`] that replays a fixed script and records every request.
#[derive(Debug, Clone)]
pub struct MockCompletionClient {
    name: String,
    script: Script,
    calls: Arc<Mutex<Vec<Vec<PromptMessage>>>>,
}

impl MockCompletionClient {
    /// Stream `fragments` in order for every request.
    pub fn with_fragments<I, S>(fragments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::scripted(Script::Fragments(fragments.into_iter().map(Into::into).collect()))
    }

    /// Fail every request before any fragment arrives.
    pub fn failing(error: ModelError) -> Self {
        Self::scripted(Script::Fail(error))
    }

    /// Stream `fragments`, then yield `error`.
    pub fn failing_mid_stream<I, S>(fragments: I, error: ModelError) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::scripted(Script::FailMidStream(fragments.into_iter().map(Into::into).collect(), error))
    }

    fn scripted(script: Script) -> Self {
        Self { name: "mock".to_string(), script, calls: Arc::new(Mutex::new(Vec::new())) }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Messages of every request received so far.
    pub fn calls(&self) -> Vec<Vec<PromptMessage>> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().map(|c| c.len()).unwrap_or_default()
    }
}

#[async_trait]
impl CompletionClient for MockCompletionClient {
    fn name(&self) -> &str {
        &self.name
    }

    async fn stream(&self, messages: Vec<PromptMessage>) -> Result<CompletionStream> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(messages);
        }

        match &self.script {
            Script::Fragments(fragments) => Ok(CompletionStream::from_fragments(fragments.clone())),
            Script::Fail(error) => Err(error.clone()),
            Script::FailMidStream(fragments, error) => {
                let items: Vec<Result<String>> = fragments
                    .iter()
                    .cloned()
                    .map(Ok)
                    .chain(std::iter::once(Err(error.clone())))
                    .collect();
                Ok(CompletionStream::new(futures::stream::iter(items)))
            }
        }
    }
}
