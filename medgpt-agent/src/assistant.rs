//! The retrieval-augmented answer pipeline.
//!
//! One call to [`MedicalAssistant::answer`] runs retrieve → assemble →
//! stream → render to completion. An empty retrieval short-circuits to
//! [`FALLBACK_MESSAGE`] without contacting the completion API.

use std::sync::Arc;

use medgpt_model::CompletionClient;
use medgpt_rag::{RetrievalResult, Retriever};
use serde::Serialize;
use tracing::{error, info, instrument};

use crate::error::AnswerError;
use crate::prompt::PromptAssembler;
use crate::render::{QueryPhase, ResponseRenderer, consume};
use crate::session::SystemStatus;

/// Answer given when retrieval finds nothing relevant.
pub const FALLBACK_MESSAGE: &str = "I apologize, but I couldn't find any relevant medical information in my knowledge base to answer your question accurately. Please try rephrasing your question or ask something else.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AnswerKind {
    /// Full model output.
    Generated,
    /// Fixed text for a query with no retrieved context.
    Fallback,
    /// Model output cut short by cancellation.
    Interrupted,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Answer {
    pub text: String,
    pub kind: AnswerKind,
}

impl Answer {
    pub fn fallback() -> Self {
        Self { text: FALLBACK_MESSAGE.to_string(), kind: AnswerKind::Fallback }
    }
}

/// Answers medical questions from the indexed reference corpus.
pub struct MedicalAssistant {
    retriever: Arc<Retriever>,
    completion: Option<Arc<dyn CompletionClient>>,
    assembler: PromptAssembler,
    require_nonblank_context: bool,
}

impl std::fmt::Debug for MedicalAssistant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MedicalAssistant")
            .field("retriever", &self.retriever)
            .field("model", &self.completion.as_ref().map(|c| c.name().to_string()))
            .field("require_nonblank_context", &self.require_nonblank_context)
            .finish()
    }
}

impl MedicalAssistant {
    pub fn builder() -> MedicalAssistantBuilder {
        MedicalAssistantBuilder::default()
    }

    pub fn retriever(&self) -> &Arc<Retriever> {
        &self.retriever
    }

    pub fn assembler(&self) -> &PromptAssembler {
        &self.assembler
    }

    pub fn has_credential(&self) -> bool {
        self.completion.is_some()
    }

    /// Probe the index and report what the pipeline can currently do.
    pub async fn status(&self) -> SystemStatus {
        SystemStatus {
            index_reachable: self.retriever.chunk_count().await.is_ok(),
            credential_present: self.has_credential(),
            model: self.completion.as_ref().map(|c| c.name().to_string()),
        }
    }

    /// Answer one question, reporting progress to `renderer`.
    ///
    /// A missing credential fails before retrieval starts and emits no
    /// phases. Every other path ends with `Rendered` then `Idle`.
    ///
    /// # Errors
    ///
    /// See [`AnswerError`]; the caller decides how to show each kind.
    #[instrument(skip_all, fields(query_len = query.len()))]
    pub async fn answer(
        &self,
        query: &str,
        renderer: &mut dyn ResponseRenderer,
    ) -> Result<Answer, AnswerError> {
        let Some(client) = self.completion.as_deref() else {
            return Err(AnswerError::MissingCredential);
        };

        let outcome = self.run(client, query, renderer).await;
        match &outcome {
            Ok(answer) => {
                info!(kind = ?answer.kind, chars = answer.text.len(), "answer rendered");
                renderer.on_finish(answer);
            }
            Err(e) => error!(error = %e, "query failed"),
        }
        renderer.on_phase(QueryPhase::Rendered);
        renderer.on_phase(QueryPhase::Idle);
        outcome
    }

    async fn run(
        &self,
        client: &dyn CompletionClient,
        query: &str,
        renderer: &mut dyn ResponseRenderer,
    ) -> Result<Answer, AnswerError> {
        renderer.on_phase(QueryPhase::Retrieving);
        let context = self.retriever.fetch(query).await?;

        if self.lacks_context(&context) {
            info!(results = context.len(), "no relevant context, using fallback");
            renderer.on_phase(QueryPhase::NoContext);
            return Ok(Answer::fallback());
        }

        renderer.on_phase(QueryPhase::Assembling);
        let messages = self.assembler.build(query, &context);

        renderer.on_phase(QueryPhase::Streaming);
        let stream = client.stream(messages).await?;
        let cancel = stream.cancel_handle();
        renderer.on_stream_start(cancel.clone());

        let text = consume(stream, renderer).await?;
        let kind = if cancel.is_cancelled() { AnswerKind::Interrupted } else { AnswerKind::Generated };
        Ok(Answer { text, kind })
    }

    fn lacks_context(&self, context: &RetrievalResult) -> bool {
        context.is_empty()
            || (self.require_nonblank_context && context.texts().all(|t| t.trim().is_empty()))
    }
}

/// Builder for [`MedicalAssistant`].
///
/// `retriever` is required. Without a completion client the assistant still
/// builds, and every query halts with [`AnswerError::MissingCredential`].
#[derive(Default)]
pub struct MedicalAssistantBuilder {
    retriever: Option<Arc<Retriever>>,
    completion: Option<Arc<dyn CompletionClient>>,
    assembler: Option<PromptAssembler>,
    require_nonblank_context: bool,
}

impl MedicalAssistantBuilder {
    pub fn retriever(mut self, retriever: Arc<Retriever>) -> Self {
        self.retriever = Some(retriever);
        self
    }

    pub fn completion_client(mut self, client: Arc<dyn CompletionClient>) -> Self {
        self.completion = Some(client);
        self
    }

    /// Set or clear the completion client.
    pub fn maybe_completion_client(mut self, client: Option<Arc<dyn CompletionClient>>) -> Self {
        self.completion = client;
        self
    }

    pub fn assembler(mut self, assembler: PromptAssembler) -> Self {
        self.assembler = Some(assembler);
        self
    }

    /// Treat context made only of whitespace like an empty retrieval.
    pub fn require_nonblank_context(mut self, require: bool) -> Self {
        self.require_nonblank_context = require;
        self
    }

    /// # Errors
    ///
    /// Returns [`AnswerError::RetrievalUnavailable`] when no retriever was set.
    pub fn build(self) -> Result<MedicalAssistant, AnswerError> {
        let retriever = self
            .retriever
            .ok_or_else(|| AnswerError::RetrievalUnavailable("retriever is required".to_string()))?;
        Ok(MedicalAssistant {
            retriever,
            completion: self.completion,
            assembler: self.assembler.unwrap_or_default(),
            require_nonblank_context: self.require_nonblank_context,
        })
    }
}
