//! Vector store trait for storing and searching chunk embeddings.

use async_trait::async_trait;

use crate::document::{Chunk, SearchResult};
use crate::error::Result;

/// A storage backend for chunk embeddings with similarity search.
///
/// Implementations manage named collections of [`Chunk`]s and support
/// upserting, deleting, and searching by vector similarity.
///
/// # Example
///
/// ```rust,ignore
/// use medgpt_rag::{VectorStore, InMemoryVectorStore};
///
/// let store = InMemoryVectorStore::new();
/// store.create_collection("medical_books", 1024).await?;
/// store.upsert("medical_books", &chunks).await?;
/// let results = store.search("medical_books", &query_embedding, 1).await?;
/// ```
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Create a named collection. No-op if it already exists.
    async fn create_collection(&self, name: &str, dimensions: usize) -> Result<()>;

    /// Delete a named collection and all its data.
    async fn delete_collection(&self, name: &str) -> Result<()>;

    /// Upsert chunks into a collection. Chunks must have embeddings set.
    async fn upsert(&self, collection: &str, chunks: &[Chunk]) -> Result<()>;

    /// Delete chunks by their IDs from a collection.
    async fn delete(&self, collection: &str, ids: &[&str]) -> Result<()>;

    /// Search for the `top_k` most similar chunks to the given embedding.
    ///
    /// Returns results ordered by descending similarity score.
    async fn search(
        &self,
        collection: &str,
        embedding: &[f32],
        top_k: usize,
    ) -> Result<Vec<SearchResult>>;

    /// Number of chunks stored in a collection.
    async fn count(&self, collection: &str) -> Result<usize>;
}

/// Compute cosine similarity between two vectors.
///
/// Returns 0.0 if either vector has zero magnitude.
pub(crate) fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

/// Score every chunk against `embedding` and keep the `top_k` best, highest first.
pub(crate) fn rank<'a>(
    chunks: impl Iterator<Item = &'a Chunk>,
    embedding: &[f32],
    top_k: usize,
) -> Vec<SearchResult> {
    let mut scored: Vec<SearchResult> = chunks
        .map(|chunk| {
            let score = cosine_similarity(&chunk.embedding, embedding);
            SearchResult { chunk: chunk.clone(), score }
        })
        .collect();

    // Equal scores fall back to chunk id so results do not depend on map order.
    scored.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.chunk.id.cmp(&b.chunk.id))
    });
    scored.truncate(top_k);
    scored
}
