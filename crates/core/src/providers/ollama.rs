use super::{endpoint, ensure_success, http_client};
use crate::error::ProviderError;
use crate::traits::{Embedder, Generator};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const PROVIDER: &str = "ollama";
const PING_TIMEOUT: Duration = Duration::from_secs(2);

pub struct OllamaEmbedder {
    client: Client,
    base_url: String,
    model: String,
}

impl OllamaEmbedder {
    pub fn new(
        base_url: impl Into<String>,
        model: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, ProviderError> {
        Ok(Self {
            client: http_client(timeout)?,
            base_url: base_url.into(),
            model: model.into(),
        })
    }
}

#[async_trait]
impl Embedder for OllamaEmbedder {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, ProviderError> {
        #[derive(Serialize)]
        struct EmbedRequest<'a> {
            model: &'a str,
            input: &'a [String],
        }

        #[derive(Deserialize)]
        struct EmbedResponse {
            embeddings: Vec<Vec<f32>>,
        }

        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let response = self
            .client
            .post(endpoint(&self.base_url, "api/embed"))
            .json(&EmbedRequest {
                model: &self.model,
                input: texts,
            })
            .send()
            .await?;
        let parsed: EmbedResponse = ensure_success(PROVIDER, response).await?.json().await?;

        if parsed.embeddings.len() != texts.len() {
            return Err(ProviderError::MalformedResponse {
                provider: PROVIDER,
                details: format!(
                    "asked for {} embeddings, got {}",
                    texts.len(),
                    parsed.embeddings.len()
                ),
            });
        }

        Ok(parsed.embeddings)
    }
}

pub struct OllamaGenerator {
    client: Client,
    base_url: String,
    model: String,
    temperature: f32,
}

impl OllamaGenerator {
    pub fn new(
        base_url: impl Into<String>,
        model: impl Into<String>,
        temperature: f32,
        timeout: Duration,
    ) -> Result<Self, ProviderError> {
        Ok(Self {
            client: http_client(timeout)?,
            base_url: base_url.into(),
            model: model.into(),
            temperature,
        })
    }
}

#[async_trait]
impl Generator for OllamaGenerator {
    async fn generate(&self, prompt: &str) -> Result<String, ProviderError> {
        #[derive(Serialize)]
        struct GenerateOptions {
            temperature: f32,
        }

        #[derive(Serialize)]
        struct GenerateRequest<'a> {
            model: &'a str,
            prompt: &'a str,
            stream: bool,
            options: GenerateOptions,
        }

        #[derive(Deserialize)]
        struct GenerateResponse {
            #[serde(default)]
            response: String,
        }

        let response = self
            .client
            .post(endpoint(&self.base_url, "api/generate"))
            .json(&GenerateRequest {
                model: &self.model,
                prompt,
                stream: false,
                options: GenerateOptions {
                    temperature: self.temperature,
                },
            })
            .send()
            .await?;
        let parsed: GenerateResponse = ensure_success(PROVIDER, response).await?.json().await?;
        Ok(parsed.response)
    }
}

/// Whether an Ollama server answers on `base_url`.
pub async fn ping(base_url: &str) -> bool {
    let Ok(client) = http_client(PING_TIMEOUT) else {
        return false;
    };

    match client.get(endpoint(base_url, "api/tags")).send().await {
        Ok(response) => response.status().is_success(),
        Err(error) => {
            tracing::debug!(%error, base_url, "ollama ping failed");
            false
        }
    }
}
