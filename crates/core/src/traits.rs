use crate::error::{IndexError, ProviderError};
use crate::models::{Chunk, ScoredChunk};
use async_trait::async_trait;

#[async_trait]
pub trait Embedder: Send + Sync {
    /// One vector per input text, in input order.
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, ProviderError>;
}

#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Drops the collection and recreates it empty.
    async fn reset(&self, vector_size: usize) -> Result<(), IndexError>;

    async fn store(&self, chunks: &[Chunk], embeddings: &[Vec<f32>]) -> Result<(), IndexError>;

    async fn query(&self, vector: &[f32], top_k: usize) -> Result<Vec<ScoredChunk>, IndexError>;

    /// `None` when the collection does not exist.
    async fn count(&self) -> Result<Option<usize>, IndexError>;
}

#[async_trait]
pub trait Generator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, ProviderError>;
}

#[async_trait]
impl<T: Embedder + ?Sized> Embedder for Box<T> {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, ProviderError> {
        (**self).embed(texts).await
    }
}

#[async_trait]
impl<T: VectorIndex + ?Sized> VectorIndex for Box<T> {
    async fn reset(&self, vector_size: usize) -> Result<(), IndexError> {
        (**self).reset(vector_size).await
    }

    async fn store(&self, chunks: &[Chunk], embeddings: &[Vec<f32>]) -> Result<(), IndexError> {
        (**self).store(chunks, embeddings).await
    }

    async fn query(&self, vector: &[f32], top_k: usize) -> Result<Vec<ScoredChunk>, IndexError> {
        (**self).query(vector, top_k).await
    }

    async fn count(&self) -> Result<Option<usize>, IndexError> {
        (**self).count().await
    }
}

#[async_trait]
impl<T: Generator + ?Sized> Generator for Box<T> {
    async fn generate(&self, prompt: &str) -> Result<String, ProviderError> {
        (**self).generate(prompt).await
    }
}
