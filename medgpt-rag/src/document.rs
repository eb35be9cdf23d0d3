//! Data types for reference documents, indexed chunks, and retrieval results.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// A source document from the medical reference corpus.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Document {
    /// Unique identifier for the document.
    pub id: String,
    /// The text content of the document.
    pub text: String,
    /// Key-value metadata associated with the document.
    #[serde(default)]
    pub metadata: HashMap<String, String>,
    /// Optional URI pointing to the original source (a file path for ingested books).
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub source_uri: Option<String>,
}

impl Document {
    /// Create a document with no metadata and no source URI.
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self { id: id.into(), text: text.into(), metadata: HashMap::new(), source_uri: None }
    }
}

/// A unit of stored reference text with its embedding.
///
/// Chunks are immutable once indexed; queries only read them.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Chunk {
    /// Unique identifier for the chunk.
    pub id: String,
    /// The text content of the chunk.
    pub text: String,
    /// The vector embedding for this chunk's text.
    pub embedding: Vec<f32>,
    /// Metadata inherited from the parent document plus chunk-specific fields.
    #[serde(default)]
    pub metadata: HashMap<String, String>,
    /// The ID of the parent [`Document`].
    pub document_id: String,
}

/// A retrieved [`Chunk`] paired with a relevance score.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    /// The retrieved chunk.
    pub chunk: Chunk,
    /// The similarity score (higher is more relevant).
    pub score: f32,
}

/// The chunks retrieved for one query, ranked by descending similarity.
///
/// Built per query and discarded after the answer is produced. An empty
/// result is a valid outcome meaning no relevant context was found.
#[derive(Debug, Clone, Default)]
pub struct RetrievalResult {
    results: Vec<SearchResult>,
}

impl RetrievalResult {
    /// Wrap search results that are already ordered by descending score.
    pub fn new(results: Vec<SearchResult>) -> Self {
        Self { results }
    }

    /// A result with no chunks.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SearchResult> {
        self.results.iter()
    }

    /// The retrieved chunks in rank order.
    pub fn chunks(&self) -> impl Iterator<Item = &Chunk> {
        self.results.iter().map(|r| &r.chunk)
    }

    /// The text of each retrieved chunk in rank order.
    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.results.iter().map(|r| r.chunk.text.as_str())
    }

    /// The score of the top-ranked chunk, if any.
    pub fn best_score(&self) -> Option<f32> {
        self.results.first().map(|r| r.score)
    }

    pub fn into_results(self) -> Vec<SearchResult> {
        self.results
    }
}

impl From<Vec<SearchResult>> for RetrievalResult {
    fn from(results: Vec<SearchResult>) -> Self {
        Self::new(results)
    }
}
