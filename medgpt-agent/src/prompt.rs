//! Retrieval-augmented prompt assembly.

use medgpt_model::PromptMessage;
use medgpt_rag::RetrievalResult;

/// Depth and structure requirements for medical explanations.
pub const DEPTH_INSTRUCTION: &str = concat!(
    "You are a knowledgeable medical assistant. For any medical term or disease, include comprehensive information covering: ",
    "definitions, types, historical background, major theories, known causes, and contributing risk factors. ",
    "Explain the genesis or theories on its origin, if applicable. Use a structured, thorough approach and keep language accessible. ",
    "provide symptoms, diagnosis, and treatment and post operative care , address all with indepth explanation , with specific details and step-by-step processes where relevant. ",
    "If the context does not adequately cover the user's question, respond with: 'I cannot provide an answer based on the available medical dataset.'",
);

/// Terminology fidelity.
pub const TERMINOLOGY_INSTRUCTION: &str = concat!(
    "If the user asks for a medical explanation, ensure accuracy, don't include layman's terms if complex terms are used, ",
    "and organize responses in a structured way.",
);

/// Formatting of comparisons between two conditions.
pub const COMPARISON_INSTRUCTION: &str = concat!(
    "When comparing two terms or conditions, provide a clear, concise, and structured comparison. Highlight key differences in their ",
    "definitions, symptoms, causes, diagnoses, and treatments with indepth explanation of each. If relevant, include any overlapping characteristics.",
);

/// Builds the message sequence sent to the completion API.
///
/// `build` is pure: the same question and context always produce the same
/// messages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptAssembler {
    instructions: Vec<String>,
}

impl Default for PromptAssembler {
    fn default() -> Self {
        Self::with_instructions([DEPTH_INSTRUCTION, TERMINOLOGY_INSTRUCTION, COMPARISON_INSTRUCTION])
    }
}

impl PromptAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the system instructions.
    pub fn with_instructions<I, S>(instructions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self { instructions: instructions.into_iter().map(Into::into).collect() }
    }

    pub fn instructions(&self) -> &[String] {
        &self.instructions
    }

    /// System instructions first, then one user message of the form
    /// `"{context}\n\nQ: {query}\nA:"` where `context` is the retrieved chunk
    /// texts joined by newlines in rank order.
    pub fn build(&self, query: &str, context: &RetrievalResult) -> Vec<PromptMessage> {
        let joined = context.texts().collect::<Vec<_>>().join("\n");

        self.instructions
            .iter()
            .map(|instruction| PromptMessage::system(instruction.as_str()))
            .chain(std::iter::once(PromptMessage::user(format!("{joined}\n\nQ: {query}\nA:"))))
            .collect()
    }
}
