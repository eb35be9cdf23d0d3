//! Retriever behaviour against in-memory and failing stores.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use medgpt_rag::{
    Chunk, Document, EmbeddingProvider, FixedSizeChunker, InMemoryVectorStore, RagError,
    RetrievalConfig, Retriever, SearchResult, VectorStore,
};
use proptest::prelude::*;

const VOCABULARY: [&str; 6] = ["diabetes", "polyuria", "thirst", "hypertension", "asthma", "insulin"];

/// Bag-of-words embedder over a tiny medical vocabulary.
#[derive(Default)]
struct KeywordEmbedder {
    query_calls: AtomicUsize,
}

#[async_trait]
impl EmbeddingProvider for KeywordEmbedder {
    async fn embed(&self, text: &str) -> medgpt_rag::Result<Vec<f32>> {
        let lower = text.to_lowercase();
        Ok(VOCABULARY.iter().map(|word| lower.matches(word).count() as f32).collect())
    }

    async fn embed_query(&self, query: &str) -> medgpt_rag::Result<Vec<f32>> {
        self.query_calls.fetch_add(1, Ordering::SeqCst);
        self.embed(query).await
    }

    fn dimensions(&self) -> usize {
        VOCABULARY.len()
    }
}

struct BrokenStore;

#[async_trait]
impl VectorStore for BrokenStore {
    async fn create_collection(&self, _name: &str, _dimensions: usize) -> medgpt_rag::Result<()> {
        Ok(())
    }
    async fn delete_collection(&self, _name: &str) -> medgpt_rag::Result<()> {
        Ok(())
    }
    async fn upsert(&self, _collection: &str, _chunks: &[Chunk]) -> medgpt_rag::Result<()> {
        Ok(())
    }
    async fn delete(&self, _collection: &str, _ids: &[&str]) -> medgpt_rag::Result<()> {
        Ok(())
    }
    async fn search(
        &self,
        _collection: &str,
        _embedding: &[f32],
        _top_k: usize,
    ) -> medgpt_rag::Result<Vec<SearchResult>> {
        Err(RagError::VectorStoreError {
            backend: "Broken".into(),
            message: "index file is corrupt".into(),
        })
    }
    async fn count(&self, _collection: &str) -> medgpt_rag::Result<usize> {
        Ok(0)
    }
}

fn chunk(id: &str, text: &str, embedding: Vec<f32>) -> Chunk {
    Chunk {
        id: id.into(),
        text: text.into(),
        embedding,
        metadata: HashMap::new(),
        document_id: "reference".into(),
    }
}

async fn seeded_retriever(config: RetrievalConfig) -> (Retriever, Arc<KeywordEmbedder>) {
    let embedder = Arc::new(KeywordEmbedder::default());
    let store = Arc::new(InMemoryVectorStore::new());
    let retriever = Retriever::builder()
        .config(config)
        .embedding_provider(embedder.clone())
        .vector_store(store.clone())
        .chunker(Arc::new(FixedSizeChunker::new(500, 50)))
        .build()
        .unwrap();
    retriever.ensure_collection().await.unwrap();

    let texts = [
        ("dm", "Type 2 diabetes presents with polyuria, polydipsia and thirst, and weight loss."),
        ("htn", "Hypertension is persistently raised arterial blood pressure."),
        ("asthma", "Asthma is chronic airway inflammation with reversible obstruction."),
    ];
    let mut chunks = Vec::new();
    for (id, text) in texts {
        chunks.push(chunk(id, text, embedder.embed(text).await.unwrap()));
    }
    store.upsert(&retriever.config().collection, &chunks).await.unwrap();
    (retriever, embedder)
}

#[tokio::test]
async fn fetch_returns_single_best_chunk_by_default() {
    let (retriever, embedder) = seeded_retriever(RetrievalConfig::default()).await;

    let result = retriever.fetch("What are the symptoms of type 2 diabetes?").await.unwrap();

    assert_eq!(result.len(), 1);
    let text = result.texts().next().unwrap();
    assert!(text.contains("polyuria, polydipsia"));
    assert_eq!(embedder.query_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn fetch_without_threshold_returns_nearest_even_if_unrelated() {
    let (retriever, _) = seeded_retriever(RetrievalConfig::default()).await;

    let result = retriever.fetch("asdkjaskjd").await.unwrap();

    assert_eq!(result.len(), 1);
    assert_eq!(result.best_score(), Some(0.0));
}

#[tokio::test]
async fn threshold_filters_out_unrelated_chunks() {
    let config = RetrievalConfig::builder().similarity_threshold(0.1).build().unwrap();
    let (retriever, _) = seeded_retriever(config).await;

    let result = retriever.fetch("asdkjaskjd").await.unwrap();

    assert!(result.is_empty());
}

#[tokio::test]
async fn empty_index_yields_empty_result() {
    let retriever = Retriever::builder()
        .embedding_provider(Arc::new(KeywordEmbedder::default()))
        .vector_store(Arc::new(InMemoryVectorStore::new()))
        .build()
        .unwrap();
    retriever.ensure_collection().await.unwrap();

    let result = retriever.fetch("What is asthma?").await.unwrap();

    assert!(result.is_empty());
    assert_eq!(retriever.chunk_count().await.unwrap(), 0);
}

#[tokio::test]
async fn broken_store_surfaces_pipeline_error() {
    let retriever = Retriever::builder()
        .embedding_provider(Arc::new(KeywordEmbedder::default()))
        .vector_store(Arc::new(BrokenStore))
        .build()
        .unwrap();

    let err = retriever.fetch("What is asthma?").await.unwrap_err();

    assert!(matches!(err, RagError::PipelineError(ref msg) if msg.contains("corrupt")));
}

#[tokio::test]
async fn larger_top_k_orders_by_score() {
    let config = RetrievalConfig::builder().top_k(3).build().unwrap();
    let (retriever, _) = seeded_retriever(config).await;

    let result = retriever.fetch("diabetes and hypertension with polyuria").await.unwrap();

    assert_eq!(result.len(), 3);
    let ids: Vec<&str> = result.chunks().map(|c| c.id.as_str()).collect();
    assert_eq!(ids[0], "dm");
    let scores: Vec<f32> = result.iter().map(|r| r.score).collect();
    assert!(scores.windows(2).all(|w| w[0] >= w[1]));
}

#[tokio::test]
async fn ingest_chunks_embeds_and_stores() {
    let (retriever, _) = seeded_retriever(RetrievalConfig::default()).await;
    let document = Document::new("endocrine", "Insulin therapy is used when oral agents fail.");

    let chunks = retriever.ingest(&document).await.unwrap();

    assert_eq!(chunks.len(), 1);
    assert_eq!(chunks[0].embedding.len(), VOCABULARY.len());
    assert_eq!(retriever.chunk_count().await.unwrap(), 4);
    let result = retriever.fetch("insulin").await.unwrap();
    assert_eq!(result.chunks().next().unwrap().document_id, "endocrine");
}

#[tokio::test]
async fn ingest_without_chunker_is_a_config_error() {
    let retriever = Retriever::builder()
        .embedding_provider(Arc::new(KeywordEmbedder::default()))
        .vector_store(Arc::new(InMemoryVectorStore::new()))
        .build()
        .unwrap();

    let err = retriever.ingest(&Document::new("d", "text")).await.unwrap_err();

    assert!(matches!(err, RagError::ConfigError(_)));
}

#[test]
fn builder_requires_store_and_embedder() {
    let err = Retriever::builder().build().unwrap_err();
    assert!(matches!(err, RagError::ConfigError(_)));
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    /// With the default K=1, any non-empty query yields at most one chunk.
    #[test]
    fn fetch_never_exceeds_top_k(query in "[a-zA-Z0-9 ?]{1,60}") {
        let rt = tokio::runtime::Runtime::new().unwrap();
        let len = rt.block_on(async {
            let (retriever, _) = seeded_retriever(RetrievalConfig::default()).await;
            retriever.fetch(&query).await.unwrap().len()
        });
        prop_assert!(len <= 1);
    }
}
