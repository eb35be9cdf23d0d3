use std::process::ExitCode;

use clap::Parser;
use medgpt_cli::Cli;

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    medgpt_cli::run(Cli::parse()).await
}
