//! Document chunking strategies used when building the index.
//!
//! - [`FixedSizeChunker`]: splits by character count with configurable overlap
//! - [`RecursiveChunker`]: splits hierarchically by paragraphs, sentences, then words
//!
//! Sizes are counted in characters, never bytes, so multi-byte text such as
//! drug names with diacritics is never cut inside a code point.

use crate::document::{Chunk, Document};

/// A strategy for splitting documents into chunks.
///
/// Implementations produce [`Chunk`]s with text and metadata but no embeddings.
/// Embeddings are attached later by the retriever's ingestion path.
pub trait Chunker: Send + Sync {
    /// Split a document into chunks.
    ///
    /// Returns an empty `Vec` if the document has no non-whitespace text.
    fn chunk(&self, document: &Document) -> Vec<Chunk>;
}

fn make_chunk(document: &Document, index: usize, text: String) -> Chunk {
    let mut metadata = document.metadata.clone();
    metadata.insert("chunk_index".to_string(), index.to_string());
    if let Some(uri) = &document.source_uri {
        metadata.entry("source".to_string()).or_insert_with(|| uri.clone());
    }
    Chunk {
        id: format!("{}_{index}", document.id),
        text,
        embedding: Vec::new(),
        metadata,
        document_id: document.id.clone(),
    }
}

fn into_chunks(document: &Document, texts: Vec<String>) -> Vec<Chunk> {
    texts
        .into_iter()
        .filter(|t| !t.trim().is_empty())
        .enumerate()
        .map(|(i, text)| make_chunk(document, i, text))
        .collect()
}

/// Splits text into fixed-size chunks by character count with overlap.
///
/// Chunk IDs are generated as `{document_id}_{chunk_index}`. Each chunk inherits
/// the parent document's metadata plus a `chunk_index` field.
#[derive(Debug, Clone)]
pub struct FixedSizeChunker {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl FixedSizeChunker {
    /// Create a new `FixedSizeChunker`.
    ///
    /// * `chunk_size`: maximum number of characters per chunk
    /// * `chunk_overlap`: number of overlapping characters between consecutive chunks
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Self {
        Self { chunk_size, chunk_overlap }
    }
}

impl Chunker for FixedSizeChunker {
    fn chunk(&self, document: &Document) -> Vec<Chunk> {
        if document.text.trim().is_empty() {
            return Vec::new();
        }
        into_chunks(document, split_by_size(&document.text, self.chunk_size, self.chunk_overlap))
    }
}

/// Character-window splitting with overlap.
fn split_by_size(text: &str, chunk_size: usize, chunk_overlap: usize) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    if chars.is_empty() || chunk_size == 0 {
        return Vec::new();
    }

    let mut chunks = Vec::new();
    let mut start = 0;
    while start < chars.len() {
        let end = (start + chunk_size).min(chars.len());
        chunks.push(chars[start..end].iter().collect());
        if end == chars.len() {
            break;
        }
        let step = chunk_size.saturating_sub(chunk_overlap);
        if step == 0 {
            break;
        }
        start += step;
    }
    chunks
}

/// Splits text hierarchically: paragraphs → sentences → words.
///
/// First splits by paragraph separators (`\n\n`). If a paragraph exceeds
/// `chunk_size`, splits by sentence boundaries (`. `, `! `, `? `). If a
/// sentence still exceeds `chunk_size`, splits by word boundaries, and a
/// single oversized word falls back to [`FixedSizeChunker`] windows. Each new
/// chunk starts with up to `chunk_overlap` trailing characters of the
/// previous one, cut at a word boundary.
#[derive(Debug, Clone)]
pub struct RecursiveChunker {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl RecursiveChunker {
    const SEPARATORS: [&'static str; 5] = ["\n\n", ". ", "! ", "? ", " "];

    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Self {
        Self { chunk_size, chunk_overlap }
    }
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// The last `overlap` characters of `text`, starting at a word boundary.
fn overlap_tail(text: &str, overlap: usize) -> &str {
    if overlap == 0 {
        return "";
    }
    let total = char_len(text);
    if total <= overlap {
        return text;
    }
    let cut = text.char_indices().nth(total - overlap).map(|(i, _)| i).unwrap_or(text.len());
    let tail = &text[cut..];
    match tail.find(char::is_whitespace) {
        Some(ws) => tail[ws..].trim_start(),
        None => "",
    }
}

/// Split text at a separator while keeping the separator attached to the preceding segment.
fn split_keeping_separator<'a>(text: &'a str, separator: &str) -> Vec<&'a str> {
    let mut result = Vec::new();
    let mut start = 0;

    while let Some(pos) = text[start..].find(separator) {
        let end = start + pos + separator.len();
        result.push(&text[start..end]);
        start = end;
    }

    if start < text.len() {
        result.push(&text[start..]);
    }

    result
}

fn split_and_merge(
    text: &str,
    chunk_size: usize,
    chunk_overlap: usize,
    separators: &[&str],
) -> Vec<String> {
    if char_len(text) <= chunk_size {
        return vec![text.to_string()];
    }
    let Some((separator, rest)) = separators.split_first() else {
        return split_by_size(text, chunk_size, chunk_overlap);
    };

    let mut chunks: Vec<String> = Vec::new();
    let mut current = String::new();

    for segment in split_keeping_separator(text, separator) {
        if char_len(segment) > chunk_size {
            if !current.trim().is_empty() {
                chunks.push(std::mem::take(&mut current));
            }
            current.clear();
            chunks.extend(split_and_merge(segment, chunk_size, chunk_overlap, rest));
            continue;
        }
        if char_len(&current) + char_len(segment) <= chunk_size {
            current.push_str(segment);
            continue;
        }
        let tail = overlap_tail(&current, chunk_overlap).to_string();
        chunks.push(std::mem::take(&mut current));
        if char_len(&tail) + char_len(segment) <= chunk_size {
            current = tail;
        }
        current.push_str(segment);
    }

    if !current.trim().is_empty() {
        chunks.push(current);
    }
    chunks
}

impl Chunker for RecursiveChunker {
    fn chunk(&self, document: &Document) -> Vec<Chunk> {
        if document.text.trim().is_empty() {
            return Vec::new();
        }
        let raw = split_and_merge(
            &document.text,
            self.chunk_size,
            self.chunk_overlap,
            &Self::SEPARATORS,
        );
        into_chunks(document, raw)
    }
}
