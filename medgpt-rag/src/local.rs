//! On-disk vector store for the embedded reference corpus.
//!
//! Each collection lives in `<root>/<collection>.json`. Collections are
//! loaded lazily on first use and cached; every mutation rewrites the file
//! through a temporary sibling followed by a rename, so a crash never leaves
//! a half-written index behind.

use std::collections::{BTreeMap, HashMap};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, error, info};

use crate::document::{Chunk, SearchResult};
use crate::error::{RagError, Result};
use crate::vectorstore::{VectorStore, rank};

const BACKEND: &str = "Local";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct StoredCollection {
    dimensions: usize,
    chunks: BTreeMap<String, Chunk>,
}

/// A vector store persisted as JSON files under a root directory.
///
/// # Example
///
/// ```rust,ignore
/// use medgpt_rag::{LocalVectorStore, VectorStore};
///
/// let store = LocalVectorStore::open("Embedded_Med_books").await?;
/// store.create_collection("medical_books", 1024).await?;
/// ```
#[derive(Debug)]
pub struct LocalVectorStore {
    root: PathBuf,
    collections: RwLock<HashMap<String, StoredCollection>>,
}

impl LocalVectorStore {
    /// Open the store rooted at `root`, creating the directory if it is absent.
    pub async fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        tokio::fs::create_dir_all(&root).await.map_err(|e| {
            error!(root = %root.display(), error = %e, "failed to create index directory");
            RagError::store(BACKEND, format!("cannot create '{}': {e}", root.display()))
        })?;
        info!(root = %root.display(), "opened local vector store");
        Ok(Self { root, collections: RwLock::new(HashMap::new()) })
    }

    /// The directory holding the collection files.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the file backing `collection`.
    pub fn collection_path(&self, collection: &str) -> PathBuf {
        self.root.join(format!("{collection}.json"))
    }

    async fn read_from_disk(&self, name: &str) -> Result<Option<StoredCollection>> {
        validate_name(name)?;
        let path = self.collection_path(name);
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                error!(path = %path.display(), error = %e, "failed to read collection");
                return Err(RagError::store(
                    BACKEND,
                    format!("cannot read '{}': {e}", path.display()),
                ));
            }
        };
        let stored = serde_json::from_slice::<StoredCollection>(&bytes).map_err(|e| {
            error!(path = %path.display(), error = %e, "collection file is corrupt");
            RagError::store(BACKEND, format!("collection file '{}' is corrupt: {e}", path.display()))
        })?;
        debug!(collection = name, chunk_count = stored.chunks.len(), "loaded collection");
        Ok(Some(stored))
    }

    async fn write_to_disk(&self, name: &str, stored: &StoredCollection) -> Result<()> {
        let path = self.collection_path(name);
        let tmp = self.root.join(format!("{name}.json.tmp"));
        let bytes = serde_json::to_vec(stored)
            .map_err(|e| RagError::store(BACKEND, format!("failed to serialize '{name}': {e}")))?;
        tokio::fs::write(&tmp, bytes).await?;
        tokio::fs::rename(&tmp, &path).await?;
        debug!(collection = name, chunk_count = stored.chunks.len(), "persisted collection");
        Ok(())
    }

    /// Make sure `name` is cached, loading it from disk when needed.
    ///
    /// Returns `false` if the collection exists neither in memory nor on disk.
    async fn ensure_loaded(&self, name: &str) -> Result<bool> {
        if self.collections.read().await.contains_key(name) {
            return Ok(true);
        }
        match self.read_from_disk(name).await? {
            Some(stored) => {
                self.collections.write().await.entry(name.to_string()).or_insert(stored);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Persist `updated`, then replace the cached copy. The cache is left
    /// untouched when the write fails.
    async fn commit(
        &self,
        collections: &mut HashMap<String, StoredCollection>,
        name: &str,
        updated: StoredCollection,
    ) -> Result<()> {
        if let Err(e) = self.write_to_disk(name, &updated).await {
            error!(collection = name, error = %e, "failed to persist collection");
            return Err(e);
        }
        collections.insert(name.to_string(), updated);
        Ok(())
    }

    async fn require_loaded(&self, name: &str) -> Result<()> {
        if self.ensure_loaded(name).await? {
            Ok(())
        } else {
            Err(RagError::store(BACKEND, format!("collection '{name}' does not exist")))
        }
    }
}

/// Collection names become file names, so keep them to a safe alphabet.
fn validate_name(name: &str) -> Result<()> {
    let valid = !name.is_empty()
        && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if valid {
        Ok(())
    } else {
        Err(RagError::store(BACKEND, format!("invalid collection name '{name}'")))
    }
}

fn check_dimensions(collection: &str, expected: usize, actual: usize) -> Result<()> {
    if expected != 0 && expected != actual {
        return Err(RagError::store(
            BACKEND,
            format!("dimension mismatch in '{collection}': expected {expected}, got {actual}"),
        ));
    }
    Ok(())
}

#[async_trait]
impl VectorStore for LocalVectorStore {
    async fn create_collection(&self, name: &str, dimensions: usize) -> Result<()> {
        if self.ensure_loaded(name).await? {
            return Ok(());
        }
        let stored = StoredCollection { dimensions, chunks: BTreeMap::new() };
        self.write_to_disk(name, &stored).await?;
        self.collections.write().await.insert(name.to_string(), stored);
        info!(collection = name, dimensions, "created empty collection");
        Ok(())
    }

    async fn delete_collection(&self, name: &str) -> Result<()> {
        validate_name(name)?;
        self.collections.write().await.remove(name);
        match tokio::fs::remove_file(self.collection_path(name)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    async fn upsert(&self, collection: &str, chunks: &[Chunk]) -> Result<()> {
        self.require_loaded(collection).await?;
        let mut collections = self.collections.write().await;
        let Some(stored) = collections.get(collection) else {
            return Err(RagError::store(BACKEND, format!("collection '{collection}' vanished")));
        };
        for chunk in chunks {
            check_dimensions(collection, stored.dimensions, chunk.embedding.len())?;
        }
        let mut updated = stored.clone();
        for chunk in chunks {
            if updated.dimensions == 0 {
                updated.dimensions = chunk.embedding.len();
            }
            updated.chunks.insert(chunk.id.clone(), chunk.clone());
        }
        self.commit(&mut collections, collection, updated).await
    }

    async fn delete(&self, collection: &str, ids: &[&str]) -> Result<()> {
        self.require_loaded(collection).await?;
        let mut collections = self.collections.write().await;
        let Some(stored) = collections.get(collection) else {
            return Err(RagError::store(BACKEND, format!("collection '{collection}' vanished")));
        };
        let mut updated = stored.clone();
        for id in ids {
            updated.chunks.remove(*id);
        }
        self.commit(&mut collections, collection, updated).await
    }

    async fn search(
        &self,
        collection: &str,
        embedding: &[f32],
        top_k: usize,
    ) -> Result<Vec<SearchResult>> {
        self.require_loaded(collection).await?;
        let collections = self.collections.read().await;
        let Some(stored) = collections.get(collection) else {
            return Err(RagError::store(BACKEND, format!("collection '{collection}' vanished")));
        };
        if !stored.chunks.is_empty() {
            check_dimensions(collection, stored.dimensions, embedding.len())?;
        }
        Ok(rank(stored.chunks.values(), embedding, top_k))
    }

    async fn count(&self, collection: &str) -> Result<usize> {
        self.require_loaded(collection).await?;
        let collections = self.collections.read().await;
        Ok(collections.get(collection).map(|c| c.chunks.len()).unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collection_names_are_restricted() {
        assert!(validate_name("medical_books").is_ok());
        assert!(validate_name("books-2024").is_ok());
        assert!(validate_name("").is_err());
        assert!(validate_name("../etc").is_err());
        assert!(validate_name("a b").is_err());
    }

    #[test]
    fn unset_dimensions_accept_anything() {
        assert!(check_dimensions("c", 0, 7).is_ok());
        assert!(check_dimensions("c", 3, 3).is_ok());
        assert!(check_dimensions("c", 3, 4).is_err());
    }
}
