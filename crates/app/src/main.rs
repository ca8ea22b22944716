mod chat;

use anyhow::Context;
use chrono::Utc;
use clap::{Args, Parser, Subcommand, ValueEnum};
use nobel_rag_core::providers::ollama;
use nobel_rag_core::{
    classify, read_table, Assistant, ChatCompletionsConfig, ChatCompletionsGenerator, Embedder,
    Generator, HashingEmbedder, IngestionPipeline, LocalStore, OllamaEmbedder, OllamaGenerator,
    QdrantStore, RagConfig, Retriever, ScoredChunk, VectorIndex,
};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const PREVIEW_CHARS: usize = 200;

pub type DynAssistant = Assistant<Box<dyn Generator>, Box<dyn Embedder>, Box<dyn VectorIndex>>;

#[derive(Parser)]
#[command(name = "nobel-rag", version, about = "Ask grounded questions about Nobel Prize laureates")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    #[command(flatten)]
    settings: Settings,
}

#[derive(Subcommand)]
enum Command {
    /// Rebuild the vector index from the laureate CSV.
    Ingest,
    /// Answer a single question.
    Ask {
        /// Question to answer
        #[arg(long)]
        query: String,
        /// Print the retrieved source chunks after the answer.
        #[arg(long, default_value_t = false)]
        sources: bool,
        /// Print the full answer record as JSON.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Interactive question loop on stdin.
    Chat {
        /// Start with sources shown under every answer; `/sources` toggles it.
        #[arg(long, default_value_t = false)]
        sources: bool,
    },
    /// Print the intent a question is classified as. No network access.
    Classify {
        #[arg(long)]
        query: String,
    },
    /// Check the embedding service, the index and the dataset.
    Status,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum StoreKind {
    Local,
    Qdrant,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum LlmKind {
    Groq,
    Ollama,
}

#[derive(Args)]
struct Settings {
    /// Embed with the built-in hashing embedder and keep the index on disk
    #[arg(long, global = true, env = "NOBEL_RAG_OFFLINE", default_value_t = false)]
    offline: bool,

    /// Vector index backend
    #[arg(long, global = true, value_enum, env = "NOBEL_RAG_STORE", default_value_t = StoreKind::Local)]
    store: StoreKind,

    /// Generation backend
    #[arg(long, global = true, value_enum, env = "NOBEL_RAG_LLM", default_value_t = LlmKind::Groq)]
    llm: LlmKind,

    /// Laureate CSV file
    #[arg(long, global = true, env = "NOBEL_RAG_CSV")]
    csv: Option<PathBuf>,

    /// Directory of the local index
    #[arg(long, global = true, env = "NOBEL_RAG_INDEX_DIR")]
    index_dir: Option<PathBuf>,

    /// Index collection name
    #[arg(long, global = true, env = "NOBEL_RAG_COLLECTION")]
    collection: Option<String>,

    /// Maximum chunk length in characters
    #[arg(long, global = true, env = "NOBEL_RAG_CHUNK_SIZE")]
    chunk_size: Option<usize>,

    /// Characters shared between consecutive chunks
    #[arg(long, global = true, env = "NOBEL_RAG_CHUNK_OVERLAP")]
    chunk_overlap: Option<usize>,

    /// Number of chunks retrieved per question
    #[arg(long, global = true, env = "NOBEL_RAG_RETRIEVAL_K")]
    retrieval_k: Option<usize>,

    /// Chunks embedded per request during ingestion
    #[arg(long, global = true, env = "NOBEL_RAG_EMBED_BATCH_SIZE")]
    embed_batch_size: Option<usize>,

    /// Comma separated columns allowed into document text
    #[arg(long, global = true, value_delimiter = ',', env = "NOBEL_RAG_TEXT_COLUMNS")]
    text_columns: Option<Vec<String>>,

    /// Comma separated columns copied into chunk metadata
    #[arg(long, global = true, value_delimiter = ',', env = "NOBEL_RAG_METADATA_COLUMNS")]
    metadata_columns: Option<Vec<String>>,

    /// Qdrant base URL
    #[arg(long, global = true, env = "QDRANT_URL")]
    qdrant_url: Option<String>,

    /// Qdrant API key
    #[arg(long, global = true, env = "QDRANT_API_KEY", hide_env_values = true)]
    qdrant_api_key: Option<String>,

    /// Ollama base URL
    #[arg(long, global = true, env = "OLLAMA_BASE_URL")]
    ollama_url: Option<String>,

    /// Ollama embedding model
    #[arg(long, global = true, env = "OLLAMA_EMBEDDING_MODEL")]
    embedding_model: Option<String>,

    /// Ollama generation model
    #[arg(long, global = true, env = "OLLAMA_LLM_MODEL")]
    ollama_chat_model: Option<String>,

    /// OpenAI-compatible base URL used with --llm groq
    #[arg(long, global = true, env = "GROQ_BASE_URL")]
    groq_url: Option<String>,

    /// Model name used with --llm groq
    #[arg(long, global = true, env = "GROQ_MODEL")]
    groq_model: Option<String>,

    /// API key used with --llm groq
    #[arg(long, global = true, env = "GROQ_API_KEY", hide_env_values = true)]
    groq_api_key: Option<String>,

    /// Sampling temperature
    #[arg(long, global = true, env = "NOBEL_RAG_TEMPERATURE")]
    temperature: Option<f32>,

    /// Timeout for every embedding, index and generation request, in seconds
    #[arg(long, global = true, env = "NOBEL_RAG_TIMEOUT_SECS")]
    timeout_secs: Option<u64>,
}

impl Settings {
    fn to_config(&self) -> anyhow::Result<RagConfig> {
        let mut config = RagConfig::default();

        macro_rules! apply {
            ($($field:ident => $target:ident),* $(,)?) => {
                $(if let Some(value) = &self.$field {
                    config.$target = value.clone();
                })*
            };
        }

        apply!(
            csv => csv_path,
            index_dir => index_dir,
            collection => collection,
            chunk_size => chunk_size,
            chunk_overlap => chunk_overlap,
            retrieval_k => retrieval_k,
            embed_batch_size => embed_batch_size,
            text_columns => text_columns,
            metadata_columns => metadata_columns,
            qdrant_url => qdrant_url,
            ollama_url => ollama_url,
            embedding_model => embedding_model,
            ollama_chat_model => ollama_chat_model,
            groq_url => groq_url,
            groq_model => groq_model,
            groq_api_key => groq_api_key,
            temperature => temperature,
            timeout_secs => request_timeout_secs,
        );

        config.validate().context("invalid configuration")?;
        Ok(config)
    }
}

fn build_embedder(settings: &Settings, config: &RagConfig) -> anyhow::Result<Box<dyn Embedder>> {
    if settings.offline {
        return Ok(Box::new(HashingEmbedder::default()));
    }

    let embedder = OllamaEmbedder::new(
        &config.ollama_url,
        &config.embedding_model,
        Duration::from_secs(config.request_timeout_secs),
    )?;
    Ok(Box::new(embedder))
}

fn build_index(settings: &Settings, config: &RagConfig) -> anyhow::Result<Box<dyn VectorIndex>> {
    let store = if settings.offline {
        StoreKind::Local
    } else {
        settings.store
    };

    let index: Box<dyn VectorIndex> = match store {
        StoreKind::Local => Box::new(LocalStore::new(&config.index_dir, &config.collection)),
        StoreKind::Qdrant => Box::new(
            QdrantStore::new(
                &config.qdrant_url,
                &config.collection,
                Duration::from_secs(config.request_timeout_secs),
            )?
            .with_api_key(settings.qdrant_api_key.clone()),
        ),
    };
    Ok(index)
}

fn build_generator(settings: &Settings, config: &RagConfig) -> anyhow::Result<Box<dyn Generator>> {
    let timeout = Duration::from_secs(config.request_timeout_secs);
    let generator: Box<dyn Generator> = match settings.llm {
        LlmKind::Groq => Box::new(
            ChatCompletionsGenerator::new(ChatCompletionsConfig {
                base_url: config.groq_url.clone(),
                api_key: config.groq_api_key.clone(),
                model: config.groq_model.clone(),
                temperature: config.temperature,
                timeout,
            })
            .context("set GROQ_API_KEY or pass --llm ollama")?,
        ),
        LlmKind::Ollama => Box::new(OllamaGenerator::new(
            &config.ollama_url,
            &config.ollama_chat_model,
            config.temperature,
            timeout,
        )?),
    };
    Ok(generator)
}

fn build_assistant(settings: &Settings, config: &RagConfig) -> anyhow::Result<DynAssistant> {
    let retriever = Retriever::new(
        build_embedder(settings, config)?,
        build_index(settings, config)?,
    );
    let assistant = Assistant::new(build_generator(settings, config)?, retriever, config.retrieval_k)?;
    Ok(assistant)
}

pub fn preview(content: &str, limit: usize) -> String {
    let flattened = content.replace('\n', " | ");
    let mut shown: String = flattened.chars().take(limit).collect();
    if flattened.chars().count() > limit {
        shown.push_str("...");
    }
    shown
}

pub fn print_sources(sources: &[ScoredChunk]) {
    if sources.is_empty() {
        return;
    }

    println!("\nSources ({}):", sources.len());
    for (position, source) in sources.iter().enumerate() {
        println!(
            "  [{}] {} | category: {} | year: {} | score: {:.3}",
            position + 1,
            source.display_name(),
            source.metadata_str("category").unwrap_or("N/A"),
            source.metadata_str("awardYear").unwrap_or("N/A"),
            source.score
        );
        println!("      {}", preview(&source.content, PREVIEW_CHARS));
    }
}

async fn run_status(settings: &Settings, config: &RagConfig) {
    if settings.offline {
        println!("embeddings: offline hashing embedder");
    } else if ollama::ping(&config.ollama_url).await {
        println!("embeddings: ollama reachable at {}", config.ollama_url);
    } else {
        println!(
            "embeddings: ollama not reachable at {} (run `ollama serve`)",
            config.ollama_url
        );
    }

    let count = match build_index(settings, config) {
        Ok(index) => index.count().await.map_err(anyhow::Error::from),
        Err(error) => Err(error),
    };
    match count {
        Ok(Some(count)) => println!("index: ready, {count} chunks in {}", config.collection),
        Ok(None) => println!("index: not found (run `nobel-rag ingest`)"),
        Err(error) => println!("index: unavailable ({error})"),
    }

    match read_table(&config.csv_path) {
        Ok(table) => println!(
            "dataset: {} rows in {} ({})",
            table.records.len(),
            config.csv_path.display(),
            table.encoding
        ),
        Err(error) => println!("dataset: {error}"),
    }

    match settings.llm {
        LlmKind::Groq if config.groq_api_key.trim().is_empty() => {
            println!("generation: {} (GROQ_API_KEY not set)", config.groq_model)
        }
        LlmKind::Groq => println!("generation: {}", config.groq_model),
        LlmKind::Ollama => println!("generation: {} via ollama", config.ollama_chat_model),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let app_version = env!("CARGO_PKG_VERSION");

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = cli.settings.to_config()?;

    info!(
        version = app_version,
        started_at = %Utc::now().to_rfc3339(),
        "nobel-rag boot"
    );

    match cli.command {
        Command::Ingest => {
            let pipeline = IngestionPipeline::new(
                &config,
                build_embedder(&cli.settings, &config)?,
                build_index(&cli.settings, &config)?,
            )?;

            match pipeline.run(&config.csv_path).await {
                Ok(report) => {
                    println!(
                        "{} chunks from {} documents stored in {} at {}",
                        report.chunks,
                        report.documents,
                        config.collection,
                        report.finished_at.to_rfc3339()
                    );
                    println!(
                        "rows read: {} ({}), rows skipped: {}, vector size: {}",
                        report.rows, report.encoding, report.dropped_rows, report.vector_size
                    );
                }
                Err(failure) => {
                    error!(error = %failure, "ingestion aborted");
                    anyhow::bail!("ingestion aborted: {failure}");
                }
            }
        }
        Command::Ask {
            query,
            sources,
            json,
        } => {
            let assistant = build_assistant(&cli.settings, &config)?;
            let answer = assistant.ask_with_sources(&query).await;

            if json {
                println!("{}", serde_json::to_string_pretty(&answer)?);
            } else {
                println!("{}", answer.answer);
                if sources {
                    print_sources(&answer.sources);
                }
            }
        }
        Command::Chat { sources } => {
            let assistant = build_assistant(&cli.settings, &config)?;
            chat::run(&assistant, sources).await?;
        }
        Command::Classify { query } => {
            println!("{}", classify(&query));
        }
        Command::Status => {
            run_status(&cli.settings, &config).await;
        }
    }

    Ok(())
}
