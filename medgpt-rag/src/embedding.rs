//! Embedding provider trait for turning text into vectors.

use async_trait::async_trait;

use crate::error::Result;

/// A provider that generates vector embeddings from text input.
///
/// Implementations wrap a specific embedding backend behind a unified async
/// interface. Embeddings have a fixed dimensionality for a given model and
/// are deterministic for identical input.
///
/// Document text and query text may be embedded differently: instruction
/// tuned models such as BGE expect queries to carry a retrieval prefix.
/// [`embed_query`](EmbeddingProvider::embed_query) is what the retriever
/// calls, [`embed_batch`](EmbeddingProvider::embed_batch) is what ingestion
/// calls.
///
/// # Example
///
/// ```rust,ignore
/// use medgpt_rag::EmbeddingProvider;
///
/// let embedding = provider.embed_query("symptoms of type 2 diabetes").await?;
/// assert_eq!(embedding.len(), provider.dimensions());
/// ```
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Generate an embedding vector for a single text input.
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Generate embedding vectors for a batch of text inputs.
    ///
    /// The default implementation calls [`embed`](EmbeddingProvider::embed)
    /// sequentially for each input.
    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        let mut results = Vec::with_capacity(texts.len());
        for text in texts {
            results.push(self.embed(text).await?);
        }
        Ok(results)
    }

    /// Generate the embedding used to search for a query.
    ///
    /// Defaults to [`embed`](EmbeddingProvider::embed).
    async fn embed_query(&self, query: &str) -> Result<Vec<f32>> {
        self.embed(query).await
    }

    /// Return the dimensionality of embeddings produced by this provider.
    fn dimensions(&self) -> usize;
}
