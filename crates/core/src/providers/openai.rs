use super::{endpoint, ensure_success, http_client};
use crate::error::ProviderError;
use crate::traits::Generator;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const PROVIDER: &str = "chat-completions";

#[derive(Clone)]
pub struct ChatCompletionsConfig {
    pub base_url: String,
    pub api_key: String,
    pub model: String,
    pub temperature: f32,
    pub timeout: Duration,
}

/// Generator for any OpenAI-compatible `/chat/completions` endpoint (Groq by default).
pub struct ChatCompletionsGenerator {
    client: Client,
    cfg: ChatCompletionsConfig,
}

impl ChatCompletionsGenerator {
    pub fn new(cfg: ChatCompletionsConfig) -> Result<Self, ProviderError> {
        if cfg.api_key.trim().is_empty() {
            return Err(ProviderError::MissingApiKey(PROVIDER));
        }

        Ok(Self {
            client: http_client(cfg.timeout)?,
            cfg,
        })
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    temperature: f32,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: AssistantMessage,
}

#[derive(Debug, Deserialize)]
struct AssistantMessage {
    #[serde(default)]
    content: Option<String>,
}

#[async_trait]
impl Generator for ChatCompletionsGenerator {
    async fn generate(&self, prompt: &str) -> Result<String, ProviderError> {
        let body = ChatRequest {
            model: &self.cfg.model,
            temperature: self.cfg.temperature,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
        };

        let response = self
            .client
            .post(endpoint(&self.cfg.base_url, "chat/completions"))
            .bearer_auth(self.cfg.api_key.trim())
            .json(&body)
            .send()
            .await?;
        let parsed: ChatResponse = ensure_success(PROVIDER, response).await?.json().await?;

        parsed
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content.unwrap_or_default())
            .ok_or(ProviderError::MalformedResponse {
                provider: PROVIDER,
                details: "response has no choices".to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_api_key_is_rejected() {
        let result = ChatCompletionsGenerator::new(ChatCompletionsConfig {
            base_url: "https://api.groq.com/openai/v1".to_string(),
            api_key: "   ".to_string(),
            model: "llama-3.3-70b-versatile".to_string(),
            temperature: 0.7,
            timeout: Duration::from_secs(5),
        });
        assert!(matches!(result, Err(ProviderError::MissingApiKey(_))));
    }

    #[test]
    fn choice_without_content_parses() {
        let parsed: ChatResponse =
            serde_json::from_str(r#"{"choices":[{"message":{"role":"assistant"}}]}"#).unwrap();
        assert_eq!(parsed.choices[0].message.content, None);
    }
}
