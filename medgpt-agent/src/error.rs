use medgpt_model::ModelError;
use medgpt_rag::RagError;
use thiserror::Error;

/// Shown when no credential is configured.
pub const MISSING_CREDENTIAL_NOTICE: &str =
    "Please provide your Groq API key to continue.";

/// Shown when the reference index cannot be searched.
pub const RETRIEVAL_ERROR_MESSAGE: &str = "I encountered an error while searching the medical knowledge base. Please try again or rephrase your question.";

/// Failures of one query. None of them end the session.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum AnswerError {
    #[error("no completion API credential is configured")]
    MissingCredential,

    #[error("retrieval unavailable: {0}")]
    RetrievalUnavailable(String),

    #[error("completion unavailable: {0}")]
    CompletionUnavailable(String),

    #[error("malformed completion response: {0}")]
    MalformedResponse(String),
}

impl AnswerError {
    /// Text shown to the user in place of an answer.
    pub fn user_message(&self) -> String {
        match self {
            Self::MissingCredential => MISSING_CREDENTIAL_NOTICE.to_string(),
            Self::RetrievalUnavailable(_) => RETRIEVAL_ERROR_MESSAGE.to_string(),
            Self::CompletionUnavailable(detail) => {
                format!("An error occurred while generating the answer: {detail}. Please try again.")
            }
            Self::MalformedResponse(_) => {
                "The answer service returned a response I could not read. Please try again."
                    .to_string()
            }
        }
    }
}

impl From<RagError> for AnswerError {
    fn from(err: RagError) -> Self {
        Self::RetrievalUnavailable(err.to_string())
    }
}

impl From<ModelError> for AnswerError {
    fn from(err: ModelError) -> Self {
        match err {
            ModelError::MissingCredential(_) => Self::MissingCredential,
            ModelError::MalformedResponse { .. } => Self::MalformedResponse(err.to_string()),
            other => Self::CompletionUnavailable(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn model_errors_map_by_kind() {
        let malformed = ModelError::MalformedResponse { provider: "Groq".into(), message: "x".into() };
        assert!(matches!(AnswerError::from(malformed), AnswerError::MalformedResponse(_)));

        let api = ModelError::Api { provider: "Groq".into(), status: Some(401), message: "bad key".into() };
        let err = AnswerError::from(api);
        assert!(matches!(err, AnswerError::CompletionUnavailable(_)));
        assert!(err.user_message().contains("bad key"));

        let missing = ModelError::MissingCredential("unset".into());
        assert_eq!(AnswerError::from(missing), AnswerError::MissingCredential);
    }

    #[test]
    fn retrieval_failure_uses_fixed_message() {
        let err = AnswerError::from(RagError::PipelineError("corrupt".into()));
        assert_eq!(err.user_message(), RETRIEVAL_ERROR_MESSAGE);
    }
}
