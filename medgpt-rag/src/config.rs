//! Configuration for retrieval and index building.

use serde::{Deserialize, Serialize};

use crate::error::{RagError, Result};

/// Name of the collection the reference corpus is stored under.
pub const DEFAULT_COLLECTION: &str = "medical_books";

/// Configuration parameters for the [`Retriever`](crate::Retriever).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RetrievalConfig {
    /// Collection that holds the indexed chunks.
    pub collection: String,
    /// Number of chunks returned per query.
    pub top_k: usize,
    /// Minimum similarity score for a chunk to count as relevant.
    ///
    /// `None` returns the nearest chunks whatever their score.
    pub similarity_threshold: Option<f32>,
    /// Maximum chunk size in characters, used when ingesting.
    pub chunk_size: usize,
    /// Number of overlapping characters between consecutive chunks, used when ingesting.
    pub chunk_overlap: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            collection: DEFAULT_COLLECTION.to_string(),
            top_k: 1,
            similarity_threshold: None,
            chunk_size: 1000,
            chunk_overlap: 200,
        }
    }
}

impl RetrievalConfig {
    /// Create a new builder for constructing a [`RetrievalConfig`].
    pub fn builder() -> RetrievalConfigBuilder {
        RetrievalConfigBuilder::default()
    }

    /// Check that the parameters are consistent.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ConfigError`] if:
    /// - `collection` is empty
    /// - `top_k == 0`
    /// - `chunk_size == 0` or `chunk_overlap >= chunk_size`
    /// - `similarity_threshold` is not a finite number
    pub fn validate(&self) -> Result<()> {
        if self.collection.trim().is_empty() {
            return Err(RagError::ConfigError("collection must not be empty".to_string()));
        }
        if self.top_k == 0 {
            return Err(RagError::ConfigError("top_k must be greater than zero".to_string()));
        }
        if self.chunk_size == 0 {
            return Err(RagError::ConfigError("chunk_size must be greater than zero".to_string()));
        }
        if self.chunk_overlap >= self.chunk_size {
            return Err(RagError::ConfigError(format!(
                "chunk_overlap ({}) must be less than chunk_size ({})",
                self.chunk_overlap, self.chunk_size
            )));
        }
        if let Some(threshold) = self.similarity_threshold {
            if !threshold.is_finite() {
                return Err(RagError::ConfigError(
                    "similarity_threshold must be a finite number".to_string(),
                ));
            }
        }
        Ok(())
    }
}

/// Builder for constructing a validated [`RetrievalConfig`].
#[derive(Debug, Clone, Default)]
pub struct RetrievalConfigBuilder {
    config: RetrievalConfig,
}

impl RetrievalConfigBuilder {
    /// Set the collection name.
    pub fn collection(mut self, name: impl Into<String>) -> Self {
        self.config.collection = name.into();
        self
    }

    /// Set the number of chunks returned per query.
    pub fn top_k(mut self, k: usize) -> Self {
        self.config.top_k = k;
        self
    }

    /// Drop chunks scoring below `threshold`.
    pub fn similarity_threshold(mut self, threshold: f32) -> Self {
        self.config.similarity_threshold = Some(threshold);
        self
    }

    /// Set the maximum chunk size in characters.
    pub fn chunk_size(mut self, size: usize) -> Self {
        self.config.chunk_size = size;
        self
    }

    /// Set the overlap between consecutive chunks in characters.
    pub fn chunk_overlap(mut self, overlap: usize) -> Self {
        self.config.chunk_overlap = overlap;
        self
    }

    /// Build the [`RetrievalConfig`], validating it first.
    pub fn build(self) -> Result<RetrievalConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_retrieves_single_chunk_without_threshold() {
        let config = RetrievalConfig::default();
        assert_eq!(config.top_k, 1);
        assert_eq!(config.similarity_threshold, None);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn rejects_zero_top_k() {
        let err = RetrievalConfig::builder().top_k(0).build().unwrap_err();
        assert!(matches!(err, RagError::ConfigError(_)));
    }

    #[test]
    fn rejects_overlap_not_smaller_than_size() {
        assert!(RetrievalConfig::builder().chunk_size(100).chunk_overlap(100).build().is_err());
        assert!(RetrievalConfig::builder().chunk_size(100).chunk_overlap(99).build().is_ok());
    }

    #[test]
    fn rejects_nan_threshold() {
        assert!(RetrievalConfig::builder().similarity_threshold(f32::NAN).build().is_err());
    }

    #[test]
    fn partial_input_falls_back_to_defaults() {
        let config: RetrievalConfig = serde_json::from_str(r#"{"top_k": 3}"#).unwrap();
        assert_eq!(config.top_k, 3);
        assert_eq!(config.collection, DEFAULT_COLLECTION);
    }
}
