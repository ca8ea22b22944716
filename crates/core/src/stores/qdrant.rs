use crate::error::IndexError;
use crate::models::{Chunk, Metadata, ScoredChunk};
use crate::traits::VectorIndex;
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde_json::{json, Value};
use std::time::Duration;
use uuid::Uuid;

const BACKEND: &str = "qdrant";

pub struct QdrantStore {
    endpoint: String,
    collection: String,
    api_key: Option<String>,
    client: Client,
}

impl QdrantStore {
    /// Every request, including searches, is bounded by `timeout`.
    pub fn new(
        endpoint: impl Into<String>,
        collection: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, IndexError> {
        Ok(Self {
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            collection: collection.into(),
            api_key: None,
            client: Client::builder().timeout(timeout).build()?,
        })
    }

    pub fn with_api_key(mut self, api_key: Option<String>) -> Self {
        self.api_key = api_key.filter(|key| !key.trim().is_empty());
        self
    }

    fn collection_url(&self) -> String {
        format!("{}/collections/{}", self.endpoint, self.collection)
    }

    fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        match &self.api_key {
            Some(key) => builder.header("api-key", key),
            None => builder,
        }
    }

    async fn check(response: Response) -> Result<Response, IndexError> {
        if response.status().is_success() {
            return Ok(response);
        }

        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        Err(IndexError::BackendResponse {
            backend: BACKEND.to_string(),
            details: format!("{status}: {body}"),
        })
    }
}

#[async_trait]
impl VectorIndex for QdrantStore {
    async fn reset(&self, vector_size: usize) -> Result<(), IndexError> {
        let response = self
            .authorized(self.client.delete(self.collection_url()))
            .send()
            .await?;
        if response.status() != StatusCode::NOT_FOUND {
            Self::check(response).await?;
        }

        let response = self
            .authorized(self.client.put(self.collection_url()))
            .json(&json!({
                "vectors": {
                    "size": vector_size,
                    "distance": "Cosine",
                }
            }))
            .send()
            .await?;
        Self::check(response).await?;

        tracing::info!(collection = %self.collection, vector_size, "qdrant collection recreated");
        Ok(())
    }

    async fn store(&self, chunks: &[Chunk], embeddings: &[Vec<f32>]) -> Result<(), IndexError> {
        if chunks.len() != embeddings.len() {
            return Err(IndexError::CountMismatch {
                chunks: chunks.len(),
                embeddings: embeddings.len(),
            });
        }

        let expected = embeddings.first().map(Vec::len).unwrap_or_default();
        let points = chunks
            .iter()
            .zip(embeddings.iter())
            .map(|(chunk, embedding)| {
                if embedding.len() != expected {
                    return Err(IndexError::DimensionMismatch {
                        expected,
                        actual: embedding.len(),
                    });
                }

                Ok(json!({
                    "id": Uuid::new_v4().to_string(),
                    "vector": embedding,
                    "payload": {
                        "content": chunk.content,
                        "metadata": chunk.metadata,
                    },
                }))
            })
            .collect::<Result<Vec<_>, IndexError>>()?;

        if points.is_empty() {
            return Ok(());
        }

        let response = self
            .authorized(
                self.client
                    .put(format!("{}/points?wait=true", self.collection_url())),
            )
            .json(&json!({ "points": points }))
            .send()
            .await?;
        Self::check(response).await?;

        Ok(())
    }

    async fn query(&self, vector: &[f32], top_k: usize) -> Result<Vec<ScoredChunk>, IndexError> {
        let response = self
            .authorized(
                self.client
                    .post(format!("{}/points/search", self.collection_url())),
            )
            .json(&json!({
                "vector": vector,
                "limit": top_k,
                "with_payload": true,
            }))
            .send()
            .await?;
        let parsed: Value = Self::check(response).await?.json().await?;

        let hits = parsed
            .pointer("/result")
            .and_then(Value::as_array)
            .ok_or_else(|| IndexError::BackendResponse {
                backend: BACKEND.to_string(),
                details: "search response has no result array".to_string(),
            })?;

        Ok(hits.iter().map(scored_chunk_from_hit).collect())
    }

    async fn count(&self) -> Result<Option<usize>, IndexError> {
        let response = self
            .authorized(self.client.get(self.collection_url()))
            .send()
            .await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let parsed: Value = Self::check(response).await?.json().await?;
        let points = parsed
            .pointer("/result/points_count")
            .and_then(Value::as_u64)
            .unwrap_or_default();
        Ok(Some(points as usize))
    }
}

fn scored_chunk_from_hit(hit: &Value) -> ScoredChunk {
    let content = hit
        .pointer("/payload/content")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    let metadata = hit
        .pointer("/payload/metadata")
        .and_then(Value::as_object)
        .map(|object| {
            object
                .iter()
                .map(|(key, value)| (key.clone(), value.clone()))
                .collect::<Metadata>()
        })
        .unwrap_or_default();
    let score = hit.pointer("/score").and_then(Value::as_f64).unwrap_or(0.0);

    ScoredChunk {
        content,
        metadata,
        score,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn search_hit_payload_is_unpacked() {
        let hit = json!({
            "id": "6f2c1c1e-3c1d-4d7e-9d53-0b5b3f8f0a11",
            "score": 0.82,
            "payload": {
                "content": "Laureate: Niels Bohr\nYear: 1922",
                "metadata": { "fullName": "Niels Bohr", "row_index": 181, "chunk_id": "181_0" }
            }
        });

        let chunk = scored_chunk_from_hit(&hit);
        assert_eq!(chunk.content, "Laureate: Niels Bohr\nYear: 1922");
        assert_eq!(chunk.display_name(), "Niels Bohr");
        assert_eq!(chunk.metadata["row_index"], json!(181));
        assert!((chunk.score - 0.82).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn mismatched_counts_fail_before_any_request() {
        let store =
            QdrantStore::new("http://127.0.0.1:9", "nobel", Duration::from_secs(1)).unwrap();
        let result = store.store(&[], &[vec![0.0; 4]]).await;
        assert!(matches!(
            result,
            Err(IndexError::CountMismatch {
                chunks: 0,
                embeddings: 1
            })
        ));
    }

    #[tokio::test]
    async fn stalled_server_times_out() -> Result<(), Box<dyn std::error::Error>> {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let address = listener.local_addr()?;
        let silent = tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                held.push(socket);
            }
        });

        let store = QdrantStore::new(
            format!("http://{address}"),
            "nobel",
            Duration::from_millis(300),
        )?;
        let outcome =
            tokio::time::timeout(Duration::from_secs(5), store.query(&[0.0; 4], 5)).await;
        silent.abort();

        assert!(matches!(outcome, Ok(Err(IndexError::Http(_)))));
        Ok(())
    }
}
