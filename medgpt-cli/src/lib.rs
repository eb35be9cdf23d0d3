//! # medgpt-cli
//!
//! The `medgpt` command: ask questions against the embedded medical library,
//! chat interactively, build the index and report status.

pub mod cli;
pub mod console;
pub mod ingest;
pub mod settings;
pub mod telemetry;

use std::io::{self, Write};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use medgpt_agent::{MedicalAssistant, Session};
use medgpt_model::{CompletionClient, GroqClient, GroqConfig};
use medgpt_rag::openai::OpenAIEmbeddingProvider;
use medgpt_rag::{LocalVectorStore, RecursiveChunker, RetrievalConfig, Retriever};
use tracing::{info, warn};

pub use cli::{Cli, Command, GlobalArgs, LogFormat};
pub use settings::Settings;

fn embedding_provider(settings: &Settings) -> OpenAIEmbeddingProvider {
    let embedding = &settings.embedding;
    let provider = OpenAIEmbeddingProvider::new()
        .with_base_url(embedding.url.as_str())
        .with_model(embedding.model.as_str())
        .with_native_dimensions(embedding.dimensions);
    match &embedding.api_key {
        Some(key) => provider.with_api_key(key.as_str()),
        None => provider,
    }
}

/// Open the on-disk index, creating it empty if absent.
///
/// An unreadable collection file does not fail here: each query then reports
/// the index as unavailable while the session keeps running.
pub async fn build_retriever(settings: &Settings, config: RetrievalConfig) -> Result<Retriever> {
    let store = LocalVectorStore::open(&settings.index_dir)
        .await
        .with_context(|| format!("cannot open index at {}", settings.index_dir.display()))?;
    let chunker = RecursiveChunker::new(config.chunk_size, config.chunk_overlap);
    let retriever = Retriever::builder()
        .config(config)
        .embedding_provider(Arc::new(embedding_provider(settings)))
        .vector_store(Arc::new(store))
        .chunker(Arc::new(chunker))
        .build()?;
    if let Err(e) = retriever.ensure_collection().await {
        warn!(index_dir = %settings.index_dir.display(), error = %e, "index is not usable");
    }
    Ok(retriever)
}

/// `None` when no API key is configured.
pub fn build_completion_client(settings: &Settings) -> Result<Option<Arc<dyn CompletionClient>>> {
    let Some(key) = &settings.api_key else {
        return Ok(None);
    };
    let config = GroqConfig::new(key.as_str())
        .with_model(settings.model.as_str())
        .with_temperature(settings.temperature)
        .with_max_tokens(settings.max_tokens);
    let client: Arc<dyn CompletionClient> = Arc::new(GroqClient::new(config)?);
    Ok(Some(client))
}

pub async fn build_assistant(settings: &Settings) -> Result<MedicalAssistant> {
    let retriever = build_retriever(settings, settings.retrieval.clone()).await?;
    Ok(MedicalAssistant::builder()
        .retriever(Arc::new(retriever))
        .maybe_completion_client(build_completion_client(settings)?)
        .require_nonblank_context(settings.require_nonblank_context)
        .build()?)
}

async fn ask(settings: &Settings, question: &str) -> Result<ExitCode> {
    let assistant = build_assistant(settings).await?;
    let mut session = Session::new(assistant.status().await);

    let active = console::ActiveStream::default();
    let watcher = console::spawn_interrupt_watcher(active.clone());
    let mut renderer = console::ConsoleRenderer::stdout(active);
    let interaction = session.ask(&assistant, question, &mut renderer).await;
    watcher.abort();

    let answered = console::report(&mut io::stdout(), &interaction, session.transcript())?;
    Ok(if answered { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}

async fn status(settings: &Settings) -> Result<()> {
    let mut out = io::stdout();
    let dir = settings.index_dir.display();
    if settings.index_dir.is_dir() {
        let retriever = build_retriever(settings, settings.retrieval.clone()).await?;
        match retriever.chunk_count().await {
            Ok(count) => writeln!(out, "Vector Store: ✅ {dir} ({count} chunks)")?,
            Err(e) => writeln!(out, "Vector Store: ❌ {dir} ({e})")?,
        }
    } else {
        writeln!(out, "Vector Store: ❌ not found at {dir} (run `medgpt ingest` to create it)")?;
    }
    match settings.api_key_source {
        Some(source) => writeln!(out, "API Key:      ✅ loaded from {source}")?,
        None => writeln!(out, "API Key:      ❌ missing")?,
    }
    writeln!(out, "Model:        {}", settings.model)?;
    writeln!(out, "Embeddings:   {} at {}", settings.embedding.model, settings.embedding.url)?;
    if let Some(path) = &settings.config_file {
        writeln!(out, "Config file:  {}", path.display())?;
    }
    Ok(())
}

/// Run the parsed command line.
pub async fn run(cli: Cli) -> Result<ExitCode> {
    telemetry::init(cli.global.log_format);
    let settings = Settings::load(&cli.global)?;
    info!(index_dir = %settings.index_dir.display(), model = %settings.model, "settings loaded");

    match cli.command.unwrap_or(Command::Chat) {
        Command::Ask { question } => ask(&settings, &question.join(" ")).await,
        Command::Chat => {
            let assistant = build_assistant(&settings).await?;
            let mut session = Session::new(assistant.status().await);
            console::run_chat(&assistant, &mut session).await?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Ingest { paths, chunk_size, chunk_overlap } => {
            let mut config = settings.retrieval.clone();
            config.chunk_size = chunk_size.unwrap_or(config.chunk_size);
            config.chunk_overlap = chunk_overlap.unwrap_or(config.chunk_overlap);
            config.validate()?;

            let retriever = build_retriever(&settings, config).await?;
            retriever.ensure_collection().await?;
            let report = ingest::run(&retriever, &paths).await?;
            println!(
                "Indexed {} chunks from {} files into {}",
                report.chunks,
                report.documents,
                settings.index_dir.display()
            );
            Ok(ExitCode::SUCCESS)
        }
        Command::Status => {
            status(&settings).await?;
            Ok(ExitCode::SUCCESS)
        }
    }
}
