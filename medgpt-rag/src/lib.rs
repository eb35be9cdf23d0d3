//! # medgpt-rag
//!
//! Retrieval over an embedded medical reference corpus.
//!
//! ## Overview
//!
//! - [`EmbeddingProvider`]: maps text to a fixed-length vector
//! - [`VectorStore`]: stores chunk vectors and answers nearest-neighbour queries
//!   ([`InMemoryVectorStore`], [`LocalVectorStore`])
//! - [`Retriever`]: embeds a question and returns the top-K chunks as a
//!   [`RetrievalResult`]; also builds the index from [`Document`]s
//! - [`Chunker`]: splits reference text before indexing
//!
//! With the `openai` feature, [`openai::OpenAIEmbeddingProvider`] talks to any
//! OpenAI-compatible `/embeddings` endpoint.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use medgpt_rag::{LocalVectorStore, RetrievalConfig, Retriever};
//! use medgpt_rag::openai::OpenAIEmbeddingProvider;
//!
//! let retriever = Retriever::builder()
//!     .config(RetrievalConfig::default())
//!     .embedding_provider(Arc::new(OpenAIEmbeddingProvider::new()))
//!     .vector_store(Arc::new(LocalVectorStore::open("Embedded_Med_books").await?))
//!     .build()?;
//!
//! let context = retriever.fetch("What causes hypertension?").await?;
//! for text in context.texts() {
//!     println!("{text}");
//! }
//! ```

pub mod chunking;
pub mod config;
pub mod document;
pub mod embedding;
pub mod error;
pub mod inmemory;
pub mod local;
#[cfg(feature = "openai")]
pub mod openai;
pub mod retriever;
pub mod vectorstore;

pub use chunking::{Chunker, FixedSizeChunker, RecursiveChunker};
pub use config::{DEFAULT_COLLECTION, RetrievalConfig, RetrievalConfigBuilder};
pub use document::{Chunk, Document, RetrievalResult, SearchResult};
pub use embedding::EmbeddingProvider;
pub use error::{RagError, Result};
pub use inmemory::InMemoryVectorStore;
pub use local::LocalVectorStore;
#[cfg(feature = "openai")]
pub use openai::OpenAIEmbeddingProvider;
pub use retriever::{Retriever, RetrieverBuilder};
pub use vectorstore::VectorStore;
