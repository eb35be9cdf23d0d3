//! Groq chat-completion provider.

mod client;
mod config;
pub mod wire;

pub use client::GroqClient;
pub use config::{
    API_KEY_ENV, DEFAULT_MAX_TOKENS, DEFAULT_MODEL, DEFAULT_TEMPERATURE, GROQ_API_BASE, GroqConfig,
};
