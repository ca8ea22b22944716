//! Grounded question answering over the Nobel Prize laureate dataset.
//!
//! Ingestion turns CSV rows into text documents, splits them into chunks and
//! stores their embeddings in a vector index. At query time a keyword
//! classifier decides whether a question gets a fixed reply or goes through
//! retrieval and generation, and a guard replaces degenerate answers.

pub mod chunking;
pub mod classifier;
pub mod config;
pub mod document;
pub mod embeddings;
pub mod error;
pub mod ingest;
pub mod loader;
pub mod models;
pub mod orchestrator;
pub mod policy;
pub mod providers;
pub mod stores;
pub mod traits;

pub use chunking::{ChunkingConfig, TextSplitter, DEFAULT_SEPARATORS};
pub use classifier::{classify, rules, Intent, Rule};
pub use config::RagConfig;
pub use document::{BuildReport, DocumentBuilder};
pub use embeddings::{cosine_similarity, HashingEmbedder, DEFAULT_EMBEDDING_DIMENSIONS};
pub use error::{
    AnswerError, ConfigError, IndexError, IngestError, ProviderError, RetrievalError,
    INTERNAL_ERROR_MESSAGE,
};
pub use ingest::{IngestionPipeline, IngestionReport, PreparedChunks};
pub use loader::{decode_text, read_table, Table, TextEncoding};
pub use models::{Chunk, Document, Metadata, Record, ScoredChunk};
pub use orchestrator::{Answer, Assistant, Retriever};
pub use policy::{guard_answer, GuardOutcome, RejectReason};
pub use providers::openai::ChatCompletionsConfig;
pub use providers::{ChatCompletionsGenerator, OllamaEmbedder, OllamaGenerator};
pub use stores::{LocalStore, QdrantStore};
pub use traits::{Embedder, Generator, VectorIndex};
