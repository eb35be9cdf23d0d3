//! Property tests for prompt assembly.

use medgpt_agent::PromptAssembler;
use medgpt_model::Role;
use medgpt_rag::{Chunk, RetrievalResult, SearchResult};
use proptest::prelude::*;

fn context(texts: &[String]) -> RetrievalResult {
    RetrievalResult::new(
        texts
            .iter()
            .enumerate()
            .map(|(i, text)| SearchResult {
                chunk: Chunk {
                    id: format!("chunk-{i}"),
                    text: text.clone(),
                    embedding: vec![0.0; 4],
                    metadata: Default::default(),
                    document_id: "book".into(),
                },
                score: 1.0 / (i as f32 + 1.0),
            })
            .collect(),
    )
}

proptest! {
    #[test]
    fn build_is_deterministic(query in "\\PC{1,80}", texts in prop::collection::vec("\\PC{0,120}", 0..3)) {
        let assembler = PromptAssembler::new();
        let ctx = context(&texts);

        let first = assembler.build(&query, &ctx);
        let second = assembler.build(&query, &ctx);

        prop_assert_eq!(first, second);
    }

    #[test]
    fn final_message_embeds_context_then_question(
        query in "[a-zA-Z0-9 ?]{1,60}",
        texts in prop::collection::vec("[a-zA-Z0-9 ,.]{0,80}", 0..3),
    ) {
        let messages = PromptAssembler::new().build(&query, &context(&texts));
        let last = messages.last().unwrap();

        prop_assert_eq!(messages.len(), 4);
        prop_assert_eq!(last.role, Role::User);
        prop_assert_eq!(&last.content, &format!("{}\n\nQ: {}\nA:", texts.join("\n"), query));
    }
}
