//! Groq client configuration.

use std::fmt;

use crate::error::{ModelError, Result};

/// Base URL of Groq's OpenAI-compatible API.
pub const GROQ_API_BASE: &str = "https://api.groq.com/openai/v1";

/// Model used when none is configured.
pub const DEFAULT_MODEL: &str = "llama3-70b-8192";

pub const DEFAULT_TEMPERATURE: f32 = 0.7;

pub const DEFAULT_MAX_TOKENS: u32 = 3000;

/// Environment variable holding the API key.
pub const API_KEY_ENV: &str = "GROQ_API_KEY";

/// Configuration for [`GroqClient`](super::GroqClient).
///
/// The API key is redacted from `Debug` output.
#[derive(Clone, PartialEq)]
pub struct GroqConfig {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl GroqConfig {
    /// Create a config with the given key and default generation settings.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: DEFAULT_MODEL.to_string(),
            base_url: GROQ_API_BASE.to_string(),
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
        }
    }

    /// Read the key from `GROQ_API_KEY`.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::MissingCredential`] when the variable is unset or blank.
    pub fn from_env() -> Result<Self> {
        match std::env::var(API_KEY_ENV) {
            Ok(key) if !key.trim().is_empty() => Ok(Self::new(key)),
            _ => Err(ModelError::MissingCredential(format!("{API_KEY_ENV} is not set"))),
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Point the client at another OpenAI-compatible endpoint.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Full URL of the chat-completions endpoint.
    pub fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }

    /// Check the configuration before any request is made.
    pub fn validate(&self) -> Result<()> {
        if self.api_key.trim().is_empty() {
            return Err(ModelError::MissingCredential("Groq API key is empty".to_string()));
        }
        if self.model.trim().is_empty() {
            return Err(ModelError::InvalidConfig("model must not be empty".to_string()));
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(ModelError::InvalidConfig(format!(
                "temperature must be within 0.0..=2.0, got {}",
                self.temperature
            )));
        }
        if self.max_tokens == 0 {
            return Err(ModelError::InvalidConfig("max_tokens must be positive".to_string()));
        }
        Ok(())
    }
}

impl fmt::Debug for GroqConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GroqConfig")
            .field("api_key", &"<redacted>")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .finish()
    }
}
