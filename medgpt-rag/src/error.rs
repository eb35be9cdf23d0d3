//! Error types for the `medgpt-rag` crate.

use thiserror::Error;

/// Errors that can occur while embedding, storing, or retrieving chunks.
#[derive(Debug, Error)]
pub enum RagError {
    /// An error occurred during embedding generation.
    #[error("Embedding error ({provider}): {message}")]
    EmbeddingError {
        /// The embedding provider that produced the error.
        provider: String,
        /// A description of the failure.
        message: String,
    },

    /// An error occurred in the vector store backend.
    #[error("Vector store error ({backend}): {message}")]
    VectorStoreError {
        /// The vector store backend that produced the error.
        backend: String,
        /// A description of the failure.
        message: String,
    },

    /// An error occurred during document chunking.
    #[error("Chunking error: {0}")]
    ChunkingError(String),

    /// A configuration validation error.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// An error in retrieval or ingestion orchestration.
    #[error("Pipeline error: {0}")]
    PipelineError(String),

    /// A filesystem error from an on-disk store.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl RagError {
    pub(crate) fn store(backend: &str, message: impl Into<String>) -> Self {
        Self::VectorStoreError { backend: backend.to_string(), message: message.into() }
    }
}

/// A convenience result type for retrieval operations.
pub type Result<T> = std::result::Result<T, RagError>;
