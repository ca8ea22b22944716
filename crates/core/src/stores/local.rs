use crate::embeddings::cosine_similarity;
use crate::error::IndexError;
use crate::models::{Chunk, Metadata, ScoredChunk};
use crate::traits::VectorIndex;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct LocalCollection {
    vector_size: usize,
    entries: Vec<LocalEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct LocalEntry {
    content: String,
    metadata: Metadata,
    vector: Vec<f32>,
}

/// Single-file JSON vector store with brute-force cosine search.
pub struct LocalStore {
    path: PathBuf,
    state: Mutex<Option<LocalCollection>>,
}

impl LocalStore {
    pub fn new(dir: impl AsRef<Path>, collection: &str) -> Self {
        Self {
            path: dir.as_ref().join(format!("{collection}.json")),
            state: Mutex::new(None),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> Result<Option<LocalCollection>, IndexError> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(error) if error.kind() == ErrorKind::NotFound => Ok(None),
            Err(error) => Err(error.into()),
        }
    }

    async fn persist(&self, collection: &LocalCollection) -> Result<(), IndexError> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let bytes = serde_json::to_vec(collection)?;
        tokio::fs::write(&self.path, bytes).await?;
        Ok(())
    }
}

#[async_trait]
impl VectorIndex for LocalStore {
    async fn reset(&self, vector_size: usize) -> Result<(), IndexError> {
        let mut state = self.state.lock().await;

        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => {}
            Err(error) if error.kind() == ErrorKind::NotFound => {}
            Err(error) => return Err(error.into()),
        }

        let collection = LocalCollection {
            vector_size,
            entries: Vec::new(),
        };
        self.persist(&collection).await?;
        *state = Some(collection);

        tracing::info!(path = %self.path.display(), vector_size, "local collection recreated");
        Ok(())
    }

    async fn store(&self, chunks: &[Chunk], embeddings: &[Vec<f32>]) -> Result<(), IndexError> {
        if chunks.len() != embeddings.len() {
            return Err(IndexError::CountMismatch {
                chunks: chunks.len(),
                embeddings: embeddings.len(),
            });
        }

        let mut state = self.state.lock().await;
        if state.is_none() {
            *state = self.load().await?;
        }
        let collection = (*state).as_mut().ok_or_else(|| {
            IndexError::NotReady(format!("{} has not been created", self.path.display()))
        })?;

        for (chunk, vector) in chunks.iter().zip(embeddings) {
            if vector.len() != collection.vector_size {
                return Err(IndexError::DimensionMismatch {
                    expected: collection.vector_size,
                    actual: vector.len(),
                });
            }
            collection.entries.push(LocalEntry {
                content: chunk.content.clone(),
                metadata: chunk.metadata.clone(),
                vector: vector.clone(),
            });
        }

        self.persist(collection).await
    }

    async fn query(&self, vector: &[f32], top_k: usize) -> Result<Vec<ScoredChunk>, IndexError> {
        let mut state = self.state.lock().await;
        if state.is_none() {
            *state = self.load().await?;
        }
        let collection = (*state).as_ref().ok_or_else(|| {
            IndexError::NotReady(format!("{} does not exist, run ingest first", self.path.display()))
        })?;

        if vector.len() != collection.vector_size {
            return Err(IndexError::DimensionMismatch {
                expected: collection.vector_size,
                actual: vector.len(),
            });
        }

        let mut scored = collection
            .entries
            .iter()
            .map(|entry| ScoredChunk {
                content: entry.content.clone(),
                metadata: entry.metadata.clone(),
                score: cosine_similarity(vector, &entry.vector),
            })
            .collect::<Vec<_>>();
        scored.sort_by(|left, right| right.score.total_cmp(&left.score));
        scored.truncate(top_k);

        Ok(scored)
    }

    async fn count(&self) -> Result<Option<usize>, IndexError> {
        let mut state = self.state.lock().await;
        if state.is_none() {
            *state = self.load().await?;
        }
        Ok((*state).as_ref().map(|collection| collection.entries.len()))
    }
}
