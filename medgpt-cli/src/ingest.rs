//! Building the on-disk index from reference files.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use medgpt_rag::{Document, Retriever};
use tracing::{info, warn};

/// File extensions read as plain text.
pub const SUPPORTED_EXTENSIONS: [&str; 3] = ["txt", "md", "markdown"];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestReport {
    pub documents: usize,
    pub chunks: usize,
}

fn is_supported(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| SUPPORTED_EXTENSIONS.iter().any(|s| s.eq_ignore_ascii_case(ext)))
}

fn walk(dir: &Path, files: &mut Vec<PathBuf>) -> Result<()> {
    let entries =
        std::fs::read_dir(dir).with_context(|| format!("cannot list {}", dir.display()))?;
    for entry in entries {
        let path = entry?.path();
        if path.is_dir() {
            walk(&path, files)?;
        } else if is_supported(&path) {
            files.push(path);
        }
    }
    Ok(())
}

/// Expand directories recursively and keep supported files, sorted and deduplicated.
///
/// Files named explicitly must have a supported extension.
pub fn collect_files(paths: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for path in paths {
        if path.is_dir() {
            walk(path, &mut files)?;
        } else if !path.exists() {
            bail!("{} does not exist", path.display());
        } else if is_supported(path) {
            files.push(path.clone());
        } else {
            bail!(
                "{} is not a supported file (expected one of: {})",
                path.display(),
                SUPPORTED_EXTENSIONS.join(", ")
            );
        }
    }
    files.sort();
    files.dedup();
    Ok(files)
}

pub async fn load_document(path: &Path) -> Result<Document> {
    let text = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("cannot read {}", path.display()))?;
    let mut document = Document::new(path.display().to_string(), text);
    document.source_uri = Some(path.display().to_string());
    if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
        document.metadata.insert("file_name".to_string(), name.to_string());
    }
    Ok(document)
}

/// Chunk, embed and store every supported file under `paths`.
///
/// `retriever` must have been built with a chunker.
pub async fn run(retriever: &Retriever, paths: &[PathBuf]) -> Result<IngestReport> {
    let files = collect_files(paths)?;
    if files.is_empty() {
        warn!("no supported files found");
        return Ok(IngestReport::default());
    }

    retriever.ensure_collection().await?;

    let mut report = IngestReport::default();
    for file in &files {
        let document = load_document(file).await?;
        let chunks = retriever
            .ingest(&document)
            .await
            .with_context(|| format!("failed to index {}", file.display()))?;
        info!(file = %file.display(), chunks = chunks.len(), "indexed file");
        report.documents += 1;
        report.chunks += chunks.len();
    }
    Ok(report)
}
