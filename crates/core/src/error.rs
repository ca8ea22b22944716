use thiserror::Error;

/// User-facing text for any failure on the answer path.
pub const INTERNAL_ERROR_MESSAGE: &str = "An internal error occurred.";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid option {option}: {details}")]
    InvalidOption { option: &'static str, details: String },

    #[error("invalid url for {option}: {source}")]
    InvalidUrl {
        option: &'static str,
        #[source]
        source: url::ParseError,
    },
}

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{provider} returned {status}: {body}")]
    Status {
        provider: &'static str,
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("malformed response from {provider}: {details}")]
    MalformedResponse {
        provider: &'static str,
        details: String,
    },

    #[error("missing api key for {0}")]
    MissingApiKey(&'static str),
}

#[derive(Debug, Error)]
pub enum IndexError {
    #[error("invalid response from {backend}: {details}")]
    BackendResponse { backend: String, details: String },

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialize error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("embedding count {embeddings} doesn't match chunk count {chunks}")]
    CountMismatch { chunks: usize, embeddings: usize },

    #[error("vector dimension {actual} != {expected}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("index not available yet: {0}")]
    NotReady(String),
}

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("source file not found: {0}")]
    SourceNotFound(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("no documents could be built from {0}")]
    EmptySource(String),

    #[error("no chunks were created from {0}")]
    NoChunks(String),

    #[error("invalid chunking config: {0}")]
    InvalidChunkConfig(String),

    #[error("embedding failed: {0}")]
    Embedding(#[from] ProviderError),

    #[error("index error: {0}")]
    Index(#[from] IndexError),
}

#[derive(Debug, Error)]
pub enum RetrievalError {
    #[error("query embedding failed: {0}")]
    Embedding(#[from] ProviderError),

    #[error("embedder returned no vector for the query")]
    EmptyEmbedding,

    #[error(transparent)]
    Index(#[from] IndexError),
}

/// Failures on the query path. Detail is kept for logs; callers show
/// [`AnswerError::user_message`] only.
#[derive(Debug, Error)]
pub enum AnswerError {
    #[error("retrieval failed: {0}")]
    Retrieval(#[from] RetrievalError),

    #[error("generation failed: {0}")]
    Generation(#[source] ProviderError),

    #[error("configuration error: {0}")]
    Configuration(#[from] ConfigError),
}

impl AnswerError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Retrieval(_) => "retrieval",
            Self::Generation(_) => "generation",
            Self::Configuration(_) => "configuration",
        }
    }

    pub fn user_message(&self) -> &'static str {
        INTERNAL_ERROR_MESSAGE
    }
}

pub type Result<T, E = IngestError> = std::result::Result<T, E>;
