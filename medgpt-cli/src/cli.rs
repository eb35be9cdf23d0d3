use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

/// Ask medical questions answered from an indexed reference library.
#[derive(Debug, Parser)]
#[command(name = "medgpt", version, about, long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Clone, Default, Args)]
pub struct GlobalArgs {
    /// TOML settings file (defaults to ./medgpt.toml when present)
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Directory holding the embedded reference index
    #[arg(long, global = true, value_name = "DIR")]
    pub index_dir: Option<PathBuf>,

    /// Groq API key (overrides GROQ_API_KEY)
    #[arg(long, global = true, value_name = "KEY")]
    pub api_key: Option<String>,

    /// Completion model identifier
    #[arg(long, global = true)]
    pub model: Option<String>,

    /// Log output format
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Pretty)]
    pub log_format: LogFormat,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Answer one question and exit
    Ask {
        /// The medical question
        #[arg(required = true, num_args = 1..)]
        question: Vec<String>,
    },
    /// Interactive session (default)
    Chat,
    /// Build or extend the index from text and markdown files
    Ingest {
        /// Files or directories to index
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// Maximum chunk size in characters
        #[arg(long)]
        chunk_size: Option<usize>,

        /// Characters shared between consecutive chunks
        #[arg(long)]
        chunk_overlap: Option<usize>,
    },
    /// Show index, credential and model status
    Status,
}
