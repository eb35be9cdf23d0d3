//! Layered settings: defaults < TOML file < environment (and `.env`) < flags.

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use medgpt_model::groq::{DEFAULT_MAX_TOKENS, DEFAULT_MODEL, DEFAULT_TEMPERATURE};
use medgpt_rag::RetrievalConfig;
use medgpt_rag::openai::{DEFAULT_BASE_URL, DEFAULT_DIMENSIONS, DEFAULT_MODEL as DEFAULT_EMBEDDING_MODEL};
use serde::Deserialize;
use tracing::debug;

use crate::cli::GlobalArgs;

pub const DEFAULT_CONFIG_FILE: &str = "medgpt.toml";
pub const DEFAULT_INDEX_DIR: &str = "Embedded_Med_books";

pub const API_KEY_ENV: &str = "GROQ_API_KEY";
pub const INDEX_DIR_ENV: &str = "MEDGPT_INDEX_DIR";
pub const EMBEDDING_URL_ENV: &str = "MEDGPT_EMBEDDING_URL";
pub const EMBEDDING_MODEL_ENV: &str = "MEDGPT_EMBEDDING_MODEL";
pub const EMBEDDING_API_KEY_ENV: &str = "MEDGPT_EMBEDDING_API_KEY";

/// Contents of `medgpt.toml`. Every field is optional.
///
/// ```toml
/// index_dir = "Embedded_Med_books"
/// model = "llama3-70b-8192"
///
/// [retrieval]
/// top_k = 1
///
/// [embedding]
/// url = "http://localhost:8080/v1"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileSettings {
    pub index_dir: Option<PathBuf>,
    pub api_key: Option<String>,
    pub model: Option<String>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    pub require_nonblank_context: Option<bool>,
    pub retrieval: Option<RetrievalConfig>,
    pub embedding: FileEmbeddingSettings,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileEmbeddingSettings {
    pub url: Option<String>,
    pub model: Option<String>,
    pub api_key: Option<String>,
    pub dimensions: Option<usize>,
}

impl FileSettings {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("failed to parse config file {}", path.display()))
    }
}

/// Where the completion API key came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeySource {
    Flag,
    Environment,
    ConfigFile,
}

impl fmt::Display for KeySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Flag => write!(f, "--api-key"),
            Self::Environment => write!(f, "{API_KEY_ENV}"),
            Self::ConfigFile => write!(f, "config file"),
        }
    }
}

#[derive(Clone, PartialEq)]
pub struct EmbeddingSettings {
    pub url: String,
    pub model: String,
    pub api_key: Option<String>,
    pub dimensions: usize,
}

/// Fully resolved settings for one run.
#[derive(Clone, PartialEq)]
pub struct Settings {
    pub index_dir: PathBuf,
    pub api_key: Option<String>,
    pub api_key_source: Option<KeySource>,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub require_nonblank_context: bool,
    pub retrieval: RetrievalConfig,
    pub embedding: EmbeddingSettings,
    pub config_file: Option<PathBuf>,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

impl Settings {
    /// Load `.env`, the config file and the process environment, then apply `args`.
    pub fn load(args: &GlobalArgs) -> Result<Self> {
        if let Ok(path) = dotenvy::dotenv() {
            debug!(path = %path.display(), "loaded .env");
        }

        let config_file = match &args.config {
            Some(path) if !path.exists() => bail!("config file {} does not exist", path.display()),
            Some(path) => Some(path.clone()),
            None => Some(PathBuf::from(DEFAULT_CONFIG_FILE)).filter(|p| p.exists()),
        };
        let file = match &config_file {
            Some(path) => FileSettings::load(path)?,
            None => FileSettings::default(),
        };

        let mut settings = Self::resolve(file, |name| std::env::var(name).ok(), args)?;
        settings.config_file = config_file;
        Ok(settings)
    }

    /// Merge the layers. `env` looks up one environment variable.
    pub fn resolve(
        file: FileSettings,
        env: impl Fn(&str) -> Option<String>,
        args: &GlobalArgs,
    ) -> Result<Self> {
        let env = |name: &str| non_blank(env(name));

        let (api_key, api_key_source) = if let Some(key) = non_blank(args.api_key.clone()) {
            (Some(key), Some(KeySource::Flag))
        } else if let Some(key) = env(API_KEY_ENV) {
            (Some(key), Some(KeySource::Environment))
        } else if let Some(key) = non_blank(file.api_key) {
            (Some(key), Some(KeySource::ConfigFile))
        } else {
            (None, None)
        };

        let index_dir = args
            .index_dir
            .clone()
            .or_else(|| env(INDEX_DIR_ENV).map(PathBuf::from))
            .or(file.index_dir)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_INDEX_DIR));

        let model = non_blank(args.model.clone())
            .or_else(|| non_blank(file.model))
            .unwrap_or_else(|| DEFAULT_MODEL.to_string());

        let embedding = EmbeddingSettings {
            url: env(EMBEDDING_URL_ENV)
                .or(file.embedding.url)
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            model: env(EMBEDDING_MODEL_ENV)
                .or(file.embedding.model)
                .unwrap_or_else(|| DEFAULT_EMBEDDING_MODEL.to_string()),
            api_key: env(EMBEDDING_API_KEY_ENV).or(non_blank(file.embedding.api_key)),
            dimensions: file.embedding.dimensions.unwrap_or(DEFAULT_DIMENSIONS),
        };
        if embedding.dimensions == 0 {
            bail!("embedding.dimensions must be greater than zero");
        }

        let retrieval = file.retrieval.unwrap_or_default();
        retrieval.validate().context("invalid [retrieval] settings")?;

        Ok(Self {
            index_dir,
            api_key,
            api_key_source,
            model,
            temperature: file.temperature.unwrap_or(DEFAULT_TEMPERATURE),
            max_tokens: file.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
            require_nonblank_context: file.require_nonblank_context.unwrap_or(false),
            retrieval,
            embedding,
            config_file: None,
        })
    }

    /// [`Settings::resolve`] over a fixed variable map.
    pub fn resolve_with_vars(
        file: FileSettings,
        vars: &HashMap<String, String>,
        args: &GlobalArgs,
    ) -> Result<Self> {
        Self::resolve(file, |name| vars.get(name).cloned(), args)
    }
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("index_dir", &self.index_dir)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("api_key_source", &self.api_key_source)
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("require_nonblank_context", &self.require_nonblank_context)
            .field("retrieval", &self.retrieval)
            .field("embedding", &self.embedding)
            .field("config_file", &self.config_file)
            .finish()
    }
}

impl fmt::Debug for EmbeddingSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EmbeddingSettings")
            .field("url", &self.url)
            .field("model", &self.model)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("dimensions", &self.dimensions)
            .finish()
    }
}
