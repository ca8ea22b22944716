use crate::classifier::{classify, Intent};
use crate::error::{AnswerError, ConfigError, RetrievalError};
use crate::models::ScoredChunk;
use crate::policy::{build_context, build_prompt, canned_response, guard_answer, GuardOutcome};
use crate::traits::{Embedder, Generator, VectorIndex};
use serde::Serialize;
use tracing::{error, info, warn};

/// Embeds the raw query text and asks the index for its nearest chunks.
pub struct Retriever<E, V> {
    embedder: E,
    index: V,
}

impl<E, V> Retriever<E, V>
where
    E: Embedder,
    V: VectorIndex,
{
    pub fn new(embedder: E, index: V) -> Self {
        Self { embedder, index }
    }

    pub fn index(&self) -> &V {
        &self.index
    }

    pub async fn retrieve(
        &self,
        text: &str,
        top_k: usize,
    ) -> Result<Vec<ScoredChunk>, RetrievalError> {
        let mut vectors = self.embedder.embed(&[text.to_string()]).await?;
        let vector = vectors.pop().ok_or(RetrievalError::EmptyEmbedding)?;
        Ok(self.index.query(&vector, top_k).await?)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Answer {
    pub query: String,
    pub intent: Intent,
    pub answer: String,
    /// Retrieved chunks; always empty unless the intent is `nobel`.
    pub sources: Vec<ScoredChunk>,
}

/// Classifies each question and either replies from the fixed texts or
/// answers from retrieved context. Build one per process and share it.
pub struct Assistant<G, E, V> {
    generator: G,
    retriever: Retriever<E, V>,
    top_k: usize,
}

impl<G, E, V> Assistant<G, E, V>
where
    G: Generator,
    E: Embedder,
    V: VectorIndex,
{
    pub fn new(generator: G, retriever: Retriever<E, V>, top_k: usize) -> Result<Self, ConfigError> {
        if top_k == 0 {
            return Err(ConfigError::InvalidOption {
                option: "retrieval_k",
                details: "must be positive".to_string(),
            });
        }

        Ok(Self {
            generator,
            retriever,
            top_k,
        })
    }

    pub fn retriever(&self) -> &Retriever<E, V> {
        &self.retriever
    }

    pub async fn try_answer(&self, query: &str) -> Result<Answer, AnswerError> {
        let intent = classify(query);
        info!(%intent, "classified query");

        if let Some(reply) = canned_response(intent) {
            return Ok(Answer {
                query: query.to_string(),
                intent,
                answer: reply.to_string(),
                sources: Vec::new(),
            });
        }

        let sources = self.retriever.retrieve(query, self.top_k).await?;
        let prompt = build_prompt(&build_context(&sources), query);
        let raw = self
            .generator
            .generate(&prompt)
            .await
            .map_err(AnswerError::Generation)?;

        let outcome = guard_answer(&raw);
        if let GuardOutcome::Rejected(reason) = &outcome {
            warn!(?reason, sources = sources.len(), "generated answer rejected");
        }

        Ok(Answer {
            query: query.to_string(),
            intent,
            answer: outcome.into_text(),
            sources,
        })
    }

    pub async fn ask(&self, query: &str) -> String {
        self.ask_with_sources(query).await.answer
    }

    /// Never fails: errors are logged and replaced by the generic message.
    pub async fn ask_with_sources(&self, query: &str) -> Answer {
        match self.try_answer(query).await {
            Ok(answer) => answer,
            Err(failure) => {
                error!(kind = failure.kind(), error = %failure, "answering failed");
                Answer {
                    query: query.to_string(),
                    intent: classify(query),
                    answer: failure.user_message().to_string(),
                    sources: Vec::new(),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embeddings::HashingEmbedder;
    use crate::error::{IndexError, ProviderError, INTERNAL_ERROR_MESSAGE};
    use crate::models::{Chunk, Metadata};
    use crate::policy::{GREETING_MESSAGE, NO_INFORMATION_MESSAGE, OFF_TOPIC_MESSAGE};
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Mutex;

    struct FakeGenerator {
        reply: Result<String, ()>,
        prompts: Mutex<Vec<String>>,
    }

    impl FakeGenerator {
        fn replying(reply: &str) -> Self {
            Self {
                reply: Ok(reply.to_string()),
                prompts: Mutex::new(Vec::new()),
            }
        }

        fn failing() -> Self {
            Self {
                reply: Err(()),
                prompts: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> usize {
            self.prompts.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl Generator for FakeGenerator {
        async fn generate(&self, prompt: &str) -> Result<String, ProviderError> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            self.reply
                .clone()
                .map_err(|_| ProviderError::MissingApiKey("fake"))
        }
    }

    #[derive(Default)]
    struct FakeIndex {
        hits: Vec<ScoredChunk>,
        broken: bool,
    }

    #[async_trait]
    impl VectorIndex for FakeIndex {
        async fn reset(&self, _vector_size: usize) -> Result<(), IndexError> {
            Ok(())
        }

        async fn store(&self, _chunks: &[Chunk], _embeddings: &[Vec<f32>]) -> Result<(), IndexError> {
            Ok(())
        }

        async fn query(&self, _vector: &[f32], top_k: usize) -> Result<Vec<ScoredChunk>, IndexError> {
            if self.broken {
                return Err(IndexError::NotReady("collection missing".to_string()));
            }
            Ok(self.hits.iter().take(top_k).cloned().collect())
        }

        async fn count(&self) -> Result<Option<usize>, IndexError> {
            Ok(Some(self.hits.len()))
        }
    }

    fn einstein() -> ScoredChunk {
        let mut metadata = Metadata::new();
        metadata.insert("fullName".to_string(), json!("Albert Einstein"));
        metadata.insert("chunk_id".to_string(), json!("337_0"));
        ScoredChunk {
            content: "Laureate: Albert Einstein\nYear: 1921\nCategory: Physics".to_string(),
            metadata,
            score: 0.91,
        }
    }

    fn assistant(
        generator: FakeGenerator,
        index: FakeIndex,
    ) -> Assistant<FakeGenerator, HashingEmbedder, FakeIndex> {
        let retriever = Retriever::new(HashingEmbedder::default(), index);
        Assistant::new(generator, retriever, 5).unwrap()
    }

    #[tokio::test]
    async fn canned_intents_skip_retrieval_and_generation() {
        let assistant = assistant(
            FakeGenerator::replying("unused answer text"),
            FakeIndex {
                hits: vec![einstein()],
                broken: false,
            },
        );

        let answer = assistant.ask_with_sources("  Hello ").await;
        assert_eq!(answer.intent, Intent::Greeting);
        assert_eq!(answer.answer, GREETING_MESSAGE);
        assert!(answer.sources.is_empty());

        let answer = assistant.ask_with_sources("Tell me about Marie Curie").await;
        assert_eq!(answer.intent, Intent::OffTopic);
        assert_eq!(answer.answer, OFF_TOPIC_MESSAGE);
        assert!(answer.sources.is_empty());

        assert_eq!(assistant.generator.calls(), 0);
    }

    #[tokio::test]
    async fn nobel_questions_are_answered_from_context() {
        let assistant = assistant(
            FakeGenerator::replying("\n## Physics 1921\n- Albert Einstein\n"),
            FakeIndex {
                hits: vec![einstein()],
                broken: false,
            },
        );

        let answer = assistant
            .ask_with_sources("Who won the Nobel Prize in Physics in 1921?")
            .await;
        assert_eq!(answer.intent, Intent::Nobel);
        assert_eq!(answer.answer, "## Physics 1921\n- Albert Einstein");
        assert_eq!(answer.sources.len(), 1);
        assert_eq!(answer.sources[0].display_name(), "Albert Einstein");

        let prompts = assistant.generator.prompts.lock().unwrap();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains("Laureate: Albert Einstein\nYear: 1921"));
        assert!(prompts[0].contains("Who won the Nobel Prize in Physics in 1921?"));
    }

    #[tokio::test]
    async fn degenerate_answers_become_the_refusal() {
        let assistant = assistant(
            FakeGenerator::replying("Bohr."),
            FakeIndex {
                hits: vec![einstein()],
                broken: false,
            },
        );

        let answer = assistant.ask_with_sources("Which year did Bohr win?").await;
        assert_eq!(answer.answer, NO_INFORMATION_MESSAGE);
        assert_eq!(answer.sources.len(), 1);
        assert_eq!(
            assistant.ask("Which year did Bohr win?").await,
            NO_INFORMATION_MESSAGE
        );
    }

    #[tokio::test]
    async fn generation_failures_surface_only_the_generic_message() {
        let assistant = assistant(
            FakeGenerator::failing(),
            FakeIndex {
                hits: vec![einstein()],
                broken: false,
            },
        );

        let query = "Nobel laureates in 1921";
        assert!(matches!(
            assistant.try_answer(query).await,
            Err(AnswerError::Generation(_))
        ));

        let answer = assistant.ask_with_sources(query).await;
        assert_eq!(answer.answer, INTERNAL_ERROR_MESSAGE);
        assert!(answer.sources.is_empty());
    }

    #[tokio::test]
    async fn retrieval_failures_never_reach_the_generator() {
        let assistant = assistant(
            FakeGenerator::replying("a perfectly fine answer"),
            FakeIndex {
                hits: Vec::new(),
                broken: true,
            },
        );

        let query = "Who won the peace prize?";
        assert!(matches!(
            assistant.try_answer(query).await,
            Err(AnswerError::Retrieval(RetrievalError::Index(_)))
        ));
        assert_eq!(assistant.ask(query).await, INTERNAL_ERROR_MESSAGE);
        assert_eq!(assistant.generator.calls(), 0);
    }

    #[test]
    fn zero_top_k_is_a_configuration_error() {
        let retriever = Retriever::new(HashingEmbedder::default(), FakeIndex::default());
        let result = Assistant::new(FakeGenerator::replying("x"), retriever, 0);
        assert!(matches!(result, Err(ConfigError::InvalidOption { .. })));
    }
}
