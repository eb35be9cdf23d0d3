//! # medgpt-model
//!
//! Streaming chat-completion clients.
//!
//! ## Overview
//!
//! - [`CompletionClient`]: sends [`PromptMessage`]s and returns a [`CompletionStream`]
//! - [`CompletionStream`]: ordered answer fragments, cancellable via [`CancelHandle`]
//! - [`MockCompletionClient`]: scripted client for tests
//!
//! With the default `groq` feature, [`GroqClient`] streams from Groq's
//! OpenAI-compatible endpoint (`llama3-70b-8192`, temperature 0.7, 3000 max tokens).
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use futures::StreamExt;
//! use medgpt_model::{CompletionClient, GroqClient, GroqConfig, PromptMessage};
//!
//! let client = GroqClient::new(GroqConfig::new(std::env::var("GROQ_API_KEY")?))?;
//! let mut stream = client
//!     .stream(vec![
//!         PromptMessage::system("You are a careful medical assistant."),
//!         PromptMessage::user("Q: What is anemia?\nA:"),
//!     ])
//!     .await?;
//!
//! while let Some(fragment) = stream.next().await {
//!     print!("{}", fragment?);
//! }
//! ```

pub mod completion;
pub mod error;
#[cfg(feature = "groq")]
pub mod groq;
pub mod message;
pub mod mock;

pub use completion::{CancelHandle, CompletionClient, CompletionStream, FragmentStream};
pub use error::{ModelError, Result};
#[cfg(feature = "groq")]
pub use groq::{GroqClient, GroqConfig};
pub use message::{PromptMessage, Role};
pub use mock::MockCompletionClient;
