//! Retrieval over the indexed reference corpus.
//!
//! The [`Retriever`] composes an [`EmbeddingProvider`] and a [`VectorStore`]:
//! a query is embedded, the store is searched, and the best `top_k` chunks
//! come back as a [`RetrievalResult`]. The same components also drive index
//! building (chunk → embed → store) when a [`Chunker`] is configured.
//!
//! # Example
//!
//! ```rust,ignore
//! use medgpt_rag::{Retriever, RetrievalConfig, LocalVectorStore, RecursiveChunker};
//!
//! let retriever = Retriever::builder()
//!     .config(RetrievalConfig::default())
//!     .embedding_provider(Arc::new(embedder))
//!     .vector_store(Arc::new(LocalVectorStore::open("Embedded_Med_books").await?))
//!     .chunker(Arc::new(RecursiveChunker::new(1000, 200)))
//!     .build()?;
//!
//! retriever.ensure_collection().await?;
//! let context = retriever.fetch("What are the symptoms of type 2 diabetes?").await?;
//! ```

use std::sync::Arc;

use tracing::{debug, error, info, instrument};

use crate::chunking::Chunker;
use crate::config::RetrievalConfig;
use crate::document::{Chunk, Document, RetrievalResult, SearchResult};
use crate::embedding::EmbeddingProvider;
use crate::error::{RagError, Result};
use crate::vectorstore::VectorStore;

/// Embeds queries and looks up the nearest indexed chunks.
///
/// Construct one via [`Retriever::builder()`].
pub struct Retriever {
    config: RetrievalConfig,
    embedding_provider: Arc<dyn EmbeddingProvider>,
    vector_store: Arc<dyn VectorStore>,
    chunker: Option<Arc<dyn Chunker>>,
}

impl std::fmt::Debug for Retriever {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Retriever")
            .field("config", &self.config)
            .field("dimensions", &self.embedding_provider.dimensions())
            .field("chunker", &self.chunker.is_some())
            .finish()
    }
}

impl Retriever {
    /// Create a new [`RetrieverBuilder`].
    pub fn builder() -> RetrieverBuilder {
        RetrieverBuilder::default()
    }

    /// Return a reference to the retrieval configuration.
    pub fn config(&self) -> &RetrievalConfig {
        &self.config
    }

    /// Return a reference to the vector store.
    pub fn vector_store(&self) -> &Arc<dyn VectorStore> {
        &self.vector_store
    }

    /// Return a reference to the embedding provider.
    pub fn embedding_provider(&self) -> &Arc<dyn EmbeddingProvider> {
        &self.embedding_provider
    }

    /// Fetch the chunks most relevant to `query`.
    ///
    /// Returns at most `top_k` results ordered by descending similarity.
    /// Chunks below the configured `similarity_threshold` are dropped, so the
    /// result may be empty; that means no relevant context exists and is not
    /// an error.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::PipelineError`] if the query cannot be embedded or
    /// the index cannot be searched.
    #[instrument(skip_all, fields(collection = %self.config.collection, top_k = self.config.top_k))]
    pub async fn fetch(&self, query: &str) -> Result<RetrievalResult> {
        let query_embedding = self.embedding_provider.embed_query(query).await.map_err(|e| {
            error!(error = %e, "embedding failed during fetch");
            RagError::PipelineError(format!("query embedding failed: {e}"))
        })?;

        let collection = &self.config.collection;
        let results = self
            .vector_store
            .search(collection, &query_embedding, self.config.top_k)
            .await
            .map_err(|e| {
                error!(collection = %collection, error = %e, "vector store search failed");
                RagError::PipelineError(format!("search failed in collection '{collection}': {e}"))
            })?;

        let mut results: Vec<SearchResult> = match self.config.similarity_threshold {
            Some(threshold) => results.into_iter().filter(|r| r.score >= threshold).collect(),
            None => results,
        };
        results.truncate(self.config.top_k);

        let result = RetrievalResult::new(results);
        info!(result_count = result.len(), best_score = ?result.best_score(), "fetch completed");
        Ok(result)
    }

    /// Create the configured collection if it does not exist yet.
    pub async fn ensure_collection(&self) -> Result<()> {
        let name = &self.config.collection;
        let dimensions = self.embedding_provider.dimensions();
        self.vector_store.create_collection(name, dimensions).await.map_err(|e| {
            error!(collection = %name, error = %e, "failed to create collection");
            RagError::PipelineError(format!("failed to create collection '{name}': {e}"))
        })
    }

    /// Number of chunks in the configured collection.
    pub async fn chunk_count(&self) -> Result<usize> {
        self.vector_store.count(&self.config.collection).await
    }

    /// Index a single document: chunk → embed → store.
    ///
    /// Returns the chunks that were stored (with embeddings attached).
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ConfigError`] if no chunker is configured and
    /// [`RagError::PipelineError`] if embedding or storage fails.
    pub async fn ingest(&self, document: &Document) -> Result<Vec<Chunk>> {
        let chunker = self.chunker.as_ref().ok_or_else(|| {
            RagError::ConfigError("a chunker is required for ingestion".to_string())
        })?;

        let mut chunks = chunker.chunk(document);
        if chunks.is_empty() {
            info!(document.id = %document.id, chunk_count = 0, "ingested document (empty)");
            return Ok(chunks);
        }

        let texts: Vec<&str> = chunks.iter().map(|c| c.text.as_str()).collect();
        let embeddings = self.embedding_provider.embed_batch(&texts).await.map_err(|e| {
            error!(document.id = %document.id, error = %e, "embedding failed during ingestion");
            RagError::PipelineError(format!("embedding failed for document '{}': {e}", document.id))
        })?;
        if embeddings.len() != chunks.len() {
            return Err(RagError::PipelineError(format!(
                "embedding count mismatch for document '{}': {} chunks, {} embeddings",
                document.id,
                chunks.len(),
                embeddings.len()
            )));
        }

        for (chunk, embedding) in chunks.iter_mut().zip(embeddings) {
            chunk.embedding = embedding;
        }

        self.vector_store.upsert(&self.config.collection, &chunks).await.map_err(|e| {
            error!(document.id = %document.id, error = %e, "upsert failed during ingestion");
            RagError::PipelineError(format!("upsert failed for document '{}': {e}", document.id))
        })?;

        debug!(document.id = %document.id, chunk_count = chunks.len(), "ingested document");
        Ok(chunks)
    }

    /// Index several documents, stopping at the first failure.
    pub async fn ingest_batch(&self, documents: &[Document]) -> Result<Vec<Chunk>> {
        let mut all_chunks = Vec::new();
        for document in documents {
            let chunks = self.ingest(document).await?;
            all_chunks.extend(chunks);
        }
        info!(document_count = documents.len(), chunk_count = all_chunks.len(), "ingested batch");
        Ok(all_chunks)
    }
}

/// Builder for constructing a [`Retriever`].
///
/// `embedding_provider` and `vector_store` are required. `config` defaults to
/// [`RetrievalConfig::default()`]; `chunker` is only needed for ingestion.
#[derive(Default)]
pub struct RetrieverBuilder {
    config: Option<RetrievalConfig>,
    embedding_provider: Option<Arc<dyn EmbeddingProvider>>,
    vector_store: Option<Arc<dyn VectorStore>>,
    chunker: Option<Arc<dyn Chunker>>,
}

impl RetrieverBuilder {
    /// Set the retrieval configuration.
    pub fn config(mut self, config: RetrievalConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set the embedding provider.
    pub fn embedding_provider(mut self, provider: Arc<dyn EmbeddingProvider>) -> Self {
        self.embedding_provider = Some(provider);
        self
    }

    /// Set the vector store backend.
    pub fn vector_store(mut self, store: Arc<dyn VectorStore>) -> Self {
        self.vector_store = Some(store);
        self
    }

    /// Set the chunker used by [`Retriever::ingest`].
    pub fn chunker(mut self, chunker: Arc<dyn Chunker>) -> Self {
        self.chunker = Some(chunker);
        self
    }

    /// Build the [`Retriever`], validating the configuration and required fields.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ConfigError`] if a required field is missing or the
    /// configuration is invalid.
    pub fn build(self) -> Result<Retriever> {
        let config = self.config.unwrap_or_default();
        config.validate()?;
        let embedding_provider = self
            .embedding_provider
            .ok_or_else(|| RagError::ConfigError("embedding_provider is required".to_string()))?;
        let vector_store = self
            .vector_store
            .ok_or_else(|| RagError::ConfigError("vector_store is required".to_string()))?;

        Ok(Retriever { config, embedding_provider, vector_store, chunker: self.chunker })
    }
}
