use crate::chunking::{ChunkingConfig, TextSplitter};
use crate::config::RagConfig;
use crate::document::DocumentBuilder;
use crate::error::{IngestError, ProviderError};
use crate::loader::{read_table, TextEncoding};
use crate::models::Chunk;
use crate::traits::{Embedder, VectorIndex};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::Path;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Serialize)]
pub struct IngestionReport {
    pub source: String,
    pub encoding: TextEncoding,
    pub rows: usize,
    pub documents: usize,
    pub dropped_rows: usize,
    pub chunks: usize,
    pub vector_size: usize,
    pub finished_at: DateTime<Utc>,
}

/// Chunks ready for embedding, plus the counts gathered on the way.
#[derive(Debug, Clone)]
pub struct PreparedChunks {
    pub chunks: Vec<Chunk>,
    pub encoding: TextEncoding,
    pub rows: usize,
    pub documents: usize,
    pub dropped_rows: usize,
}

/// CSV → documents → chunks → embeddings → index, as one destructive rebuild.
pub struct IngestionPipeline<E, V> {
    embedder: E,
    index: V,
    splitter: TextSplitter,
    text_columns: Vec<String>,
    metadata_columns: Vec<String>,
    batch_size: usize,
}

impl<E, V> IngestionPipeline<E, V>
where
    E: Embedder,
    V: VectorIndex,
{
    pub fn new(config: &RagConfig, embedder: E, index: V) -> Result<Self, IngestError> {
        if config.embed_batch_size == 0 {
            return Err(IngestError::InvalidChunkConfig(
                "embedding batch size must be positive".to_string(),
            ));
        }

        Ok(Self {
            embedder,
            index,
            splitter: TextSplitter::new(ChunkingConfig::try_from(config)?),
            text_columns: config.text_columns.clone(),
            metadata_columns: config.metadata_columns.clone(),
            batch_size: config.embed_batch_size,
        })
    }

    pub fn index(&self) -> &V {
        &self.index
    }

    pub fn prepare_chunks(&self, csv_path: &Path) -> Result<PreparedChunks, IngestError> {
        let source = csv_path.display().to_string();
        let table = read_table(csv_path)?;

        let builder = DocumentBuilder::new(&self.text_columns, &self.metadata_columns, &source);
        let built = builder.build_all(&table);
        if !built.dropped_rows.is_empty() {
            warn!(dropped = built.dropped_rows.len(), "rows without any text field were skipped");
        }
        if built.documents.is_empty() {
            return Err(IngestError::EmptySource(source));
        }

        let chunks = self.splitter.chunk_documents(&built.documents);
        if chunks.is_empty() {
            return Err(IngestError::NoChunks(source));
        }

        info!(
            documents = built.documents.len(),
            chunks = chunks.len(),
            "split documents into chunks"
        );

        Ok(PreparedChunks {
            chunks,
            encoding: table.encoding,
            rows: table.records.len(),
            documents: built.documents.len(),
            dropped_rows: built.dropped_rows.len(),
        })
    }

    pub async fn run(&self, csv_path: &Path) -> Result<IngestionReport, IngestError> {
        info!(path = %csv_path.display(), "running ingestion");
        let prepared = self.prepare_chunks(csv_path)?;

        let mut vector_size = 0usize;
        let batches = prepared.chunks.chunks(self.batch_size);
        let batch_count = batches.len();

        for (position, batch) in batches.enumerate() {
            let texts = batch
                .iter()
                .map(|chunk| chunk.content.clone())
                .collect::<Vec<_>>();
            let embeddings = self.embedder.embed(&texts).await?;

            if position == 0 {
                vector_size = embeddings
                    .first()
                    .map(Vec::len)
                    .filter(|size| *size > 0)
                    .ok_or_else(|| ProviderError::MalformedResponse {
                        provider: "embedder",
                        details: "first batch produced no usable vector".to_string(),
                    })?;
                self.index.reset(vector_size).await?;
            }

            self.index.store(batch, &embeddings).await?;
            debug!(batch = position + 1, of = batch_count, size = batch.len(), "stored batch");
        }

        let report = IngestionReport {
            source: csv_path.display().to_string(),
            encoding: prepared.encoding,
            rows: prepared.rows,
            documents: prepared.documents,
            dropped_rows: prepared.dropped_rows,
            chunks: prepared.chunks.len(),
            vector_size,
            finished_at: Utc::now(),
        };
        info!(chunks = report.chunks, vector_size, "ingestion finished");

        Ok(report)
    }
}
