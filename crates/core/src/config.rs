use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use url::Url;

pub const DEFAULT_CHUNK_SIZE: usize = 1_500;
pub const DEFAULT_CHUNK_OVERLAP: usize = 200;
pub const DEFAULT_RETRIEVAL_K: usize = 5;
pub const DEFAULT_EMBED_BATCH_SIZE: usize = 100;
pub const DEFAULT_COLLECTION: &str = "nobel_prizes_info";

pub const DEFAULT_TEXT_COLUMNS: [&str; 35] = [
    "category",
    "categoryFullName",
    "motivation",
    "categoryTopMotivation",
    "prizeAmount",
    "prizeAmountAdjusted",
    "dateAwarded",
    "awardYear",
    "fullName",
    "givenName",
    "familyName",
    "penName",
    "gender",
    "birth_date",
    "birth_city",
    "birth_country",
    "birth_continent",
    "death_date",
    "death_city",
    "death_country",
    "death_continent",
    "orgName",
    "nativeName",
    "acronym",
    "org_founded_date",
    "org_founded_city",
    "org_founded_country",
    "org_founded_continent",
    "residence_1",
    "residence_2",
    "affiliation_1",
    "affiliation_2",
    "affiliation_3",
    "affiliation_4",
    "ind_or_org",
];

pub const DEFAULT_METADATA_COLUMNS: [&str; 10] = [
    "id",
    "fullName",
    "orgName",
    "category",
    "awardYear",
    "gender",
    "ind_or_org",
    "birth_country",
    "death_country",
    "dateAwarded",
];

/// Every option the ingestion and answer paths read.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RagConfig {
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    pub retrieval_k: usize,
    pub embed_batch_size: usize,
    pub collection: String,
    pub text_columns: Vec<String>,
    pub metadata_columns: Vec<String>,
    pub csv_path: PathBuf,
    pub index_dir: PathBuf,
    pub qdrant_url: String,
    pub ollama_url: String,
    pub embedding_model: String,
    pub ollama_chat_model: String,
    pub groq_url: String,
    pub groq_model: String,
    #[serde(default, skip_serializing)]
    pub groq_api_key: String,
    pub temperature: f32,
    pub request_timeout_secs: u64,
}

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            chunk_overlap: DEFAULT_CHUNK_OVERLAP,
            retrieval_k: DEFAULT_RETRIEVAL_K,
            embed_batch_size: DEFAULT_EMBED_BATCH_SIZE,
            collection: DEFAULT_COLLECTION.to_string(),
            text_columns: DEFAULT_TEXT_COLUMNS.iter().map(|c| c.to_string()).collect(),
            metadata_columns: DEFAULT_METADATA_COLUMNS
                .iter()
                .map(|c| c.to_string())
                .collect(),
            csv_path: PathBuf::from("data/nobel.csv"),
            index_dir: PathBuf::from("index"),
            qdrant_url: "http://localhost:6333".to_string(),
            ollama_url: "http://localhost:11434".to_string(),
            embedding_model: "nomic-embed-text:latest".to_string(),
            ollama_chat_model: "mistral:latest".to_string(),
            groq_url: "https://api.groq.com/openai/v1".to_string(),
            groq_model: "llama-3.3-70b-versatile".to_string(),
            groq_api_key: String::new(),
            temperature: 0.7,
            request_timeout_secs: 60,
        }
    }
}

impl RagConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.chunk_size == 0 {
            return Err(invalid("chunk_size", "must be positive"));
        }
        if self.chunk_overlap >= self.chunk_size {
            return Err(invalid(
                "chunk_overlap",
                format!(
                    "{} must be smaller than chunk_size {}",
                    self.chunk_overlap, self.chunk_size
                ),
            ));
        }
        if self.retrieval_k == 0 {
            return Err(invalid("retrieval_k", "must be positive"));
        }
        if self.embed_batch_size == 0 {
            return Err(invalid("embed_batch_size", "must be positive"));
        }
        if self.collection.trim().is_empty() {
            return Err(invalid("collection", "must not be empty"));
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(invalid("temperature", "must be within 0.0..=2.0"));
        }

        for (option, value) in [
            ("qdrant_url", &self.qdrant_url),
            ("ollama_url", &self.ollama_url),
            ("groq_url", &self.groq_url),
        ] {
            Url::parse(value).map_err(|source| ConfigError::InvalidUrl { option, source })?;
        }

        Ok(())
    }
}

fn invalid(option: &'static str, details: impl Into<String>) -> ConfigError {
    ConfigError::InvalidOption {
        option,
        details: details.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = RagConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.chunk_size, 1_500);
        assert_eq!(config.chunk_overlap, 200);
        assert_eq!(config.retrieval_k, 5);
        assert!(config.text_columns.iter().any(|c| c == "affiliation_4"));
    }

    #[test]
    fn overlap_must_be_smaller_than_chunk_size() {
        let config = RagConfig {
            chunk_size: 100,
            chunk_overlap: 100,
            ..RagConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidOption {
                option: "chunk_overlap",
                ..
            })
        ));
    }

    #[test]
    fn unparseable_urls_are_rejected() {
        let config = RagConfig {
            ollama_url: "not a url".to_string(),
            ..RagConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidUrl {
                option: "ollama_url",
                ..
            })
        ));
    }
}
