//! Property tests for in-memory vector store search ordering.

use std::collections::HashMap;

use medgpt_rag::document::Chunk;
use medgpt_rag::inmemory::InMemoryVectorStore;
use medgpt_rag::vectorstore::VectorStore;
use proptest::prelude::*;

/// Generate a non-zero L2-normalized embedding of the given dimension.
fn arb_normalized_embedding(dim: usize) -> impl Strategy<Value = Vec<f32>> {
    proptest::collection::vec(-1.0f32..1.0f32, dim).prop_filter_map(
        "non-zero embedding",
        |mut v| {
            let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
            if norm < 1e-8 {
                return None;
            }
            for val in &mut v {
                *val /= norm;
            }
            Some(v)
        },
    )
}

fn arb_chunk(dim: usize) -> impl Strategy<Value = Chunk> {
    ("[a-z]{3,8}", "[a-z ]{5,30}", arb_normalized_embedding(dim)).prop_map(
        |(id, text, embedding)| Chunk {
            id,
            text,
            embedding,
            metadata: HashMap::new(),
            document_id: "harrison".to_string(),
        },
    )
}

mod search_ordering {
    use super::*;

    const DIM: usize = 16;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// Results come back by descending cosine score and never exceed `top_k`.
        #[test]
        fn results_ordered_descending_and_bounded_by_top_k(
            chunks in proptest::collection::vec(arb_chunk(DIM), 1..20),
            query in arb_normalized_embedding(DIM),
            top_k in 1usize..25,
        ) {
            let rt = tokio::runtime::Runtime::new().unwrap();
            let (results, unique_count) = rt.block_on(async {
                let store = InMemoryVectorStore::new();
                store.create_collection("test", DIM).await.unwrap();

                let mut deduped: HashMap<String, Chunk> = HashMap::new();
                for chunk in &chunks {
                    deduped.entry(chunk.id.clone()).or_insert_with(|| chunk.clone());
                }
                let unique_chunks: Vec<Chunk> = deduped.into_values().collect();
                let count = unique_chunks.len();

                store.upsert("test", &unique_chunks).await.unwrap();
                let results = store.search("test", &query, top_k).await.unwrap();
                (results, count)
            });

            prop_assert!(results.len() <= top_k);
            prop_assert_eq!(results.len(), top_k.min(unique_count));

            for window in results.windows(2) {
                prop_assert!(
                    window[0].score >= window[1].score,
                    "results not in descending order: {} < {}",
                    window[0].score,
                    window[1].score,
                );
            }
        }
    }
}

#[tokio::test]
async fn missing_collection_is_an_error() {
    let store = InMemoryVectorStore::new();
    assert!(store.search("nope", &[1.0, 0.0], 1).await.is_err());
    assert!(store.count("nope").await.is_err());
}

#[tokio::test]
async fn delete_removes_chunks() {
    let store = InMemoryVectorStore::new();
    store.create_collection("c", 2).await.unwrap();
    let chunk = Chunk {
        id: "a".into(),
        text: "aspirin".into(),
        embedding: vec![1.0, 0.0],
        metadata: HashMap::new(),
        document_id: "d".into(),
    };
    store.upsert("c", &[chunk]).await.unwrap();
    assert_eq!(store.count("c").await.unwrap(), 1);
    store.delete("c", &["a"]).await.unwrap();
    assert_eq!(store.count("c").await.unwrap(), 0);
}

#[tokio::test]
async fn equal_scores_are_ordered_by_chunk_id() {
    let store = InMemoryVectorStore::new();
    store.create_collection("c", 2).await.unwrap();
    let chunks: Vec<Chunk> = ["delta", "alpha", "charlie", "bravo"]
        .into_iter()
        .map(|id| Chunk {
            id: id.into(),
            text: format!("{id} passage"),
            embedding: vec![1.0, 1.0],
            metadata: HashMap::new(),
            document_id: "d".into(),
        })
        .collect();
    store.upsert("c", &chunks).await.unwrap();

    let all = store.search("c", &[1.0, 1.0], 4).await.unwrap();
    let ids: Vec<&str> = all.iter().map(|r| r.chunk.id.as_str()).collect();
    assert_eq!(ids, vec!["alpha", "bravo", "charlie", "delta"]);

    for _ in 0..8 {
        let top = store.search("c", &[1.0, 1.0], 1).await.unwrap();
        assert_eq!(top[0].chunk.id, "alpha");
    }
}
