//! # medgpt-agent
//!
//! Retrieval-augmented answering of medical questions.
//!
//! ## Overview
//!
//! - [`PromptAssembler`]: fixed system instructions plus `"{context}\n\nQ: {query}\nA:"`
//! - [`ResponseRenderer`] / [`consume`]: incremental display of a streamed answer
//! - [`MedicalAssistant`]: retrieve → assemble → stream → render for one query
//! - [`Session`]: owns the [`Transcript`] and turns outcomes into turns
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use medgpt_agent::{Interaction, MedicalAssistant, NullRenderer, Session};
//!
//! let assistant = MedicalAssistant::builder()
//!     .retriever(Arc::new(retriever))
//!     .completion_client(Arc::new(GroqClient::from_env()?))
//!     .build()?;
//!
//! let mut session = Session::new(assistant.status().await);
//! if let Interaction::Answered(answer) =
//!     session.ask(&assistant, "What is anemia?", &mut NullRenderer).await
//! {
//!     println!("{}", answer.text);
//! }
//! ```

pub mod assistant;
pub mod error;
pub mod prompt;
pub mod render;
pub mod session;
pub mod transcript;

pub use assistant::{Answer, AnswerKind, FALLBACK_MESSAGE, MedicalAssistant, MedicalAssistantBuilder};
pub use error::{AnswerError, MISSING_CREDENTIAL_NOTICE, RETRIEVAL_ERROR_MESSAGE};
pub use prompt::PromptAssembler;
pub use render::{NullRenderer, QueryPhase, ResponseRenderer, consume};
pub use session::{Interaction, Session, SystemStatus};
pub use transcript::{ConversationTurn, TIMESTAMP_FORMAT, Transcript, TurnRole};
