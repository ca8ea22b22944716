use crate::config::RagConfig;
use crate::error::IngestError;
use crate::models::{Chunk, Document, CHUNK_ID_KEY};
use serde_json::Value;
use std::collections::VecDeque;

/// Coarsest boundary first; `""` means split between characters.
pub const DEFAULT_SEPARATORS: [&str; 5] = ["\n\n", "\n", ". ", " ", ""];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkingConfig {
    pub chunk_size: usize,
    pub chunk_overlap: usize,
}

impl ChunkingConfig {
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Result<Self, IngestError> {
        if chunk_size == 0 {
            return Err(IngestError::InvalidChunkConfig(
                "chunk size must be positive".to_string(),
            ));
        }
        if chunk_overlap >= chunk_size {
            return Err(IngestError::InvalidChunkConfig(format!(
                "overlap {chunk_overlap} must be smaller than chunk size {chunk_size}"
            )));
        }
        Ok(Self {
            chunk_size,
            chunk_overlap,
        })
    }
}

impl TryFrom<&RagConfig> for ChunkingConfig {
    type Error = IngestError;

    fn try_from(value: &RagConfig) -> Result<Self, Self::Error> {
        Self::new(value.chunk_size, value.chunk_overlap)
    }
}

/// Recursive character splitter. Lengths are counted in chars.
#[derive(Debug, Clone)]
pub struct TextSplitter {
    config: ChunkingConfig,
    separators: Vec<&'static str>,
}

impl TextSplitter {
    pub fn new(config: ChunkingConfig) -> Self {
        Self {
            config,
            separators: DEFAULT_SEPARATORS.to_vec(),
        }
    }

    pub fn config(&self) -> ChunkingConfig {
        self.config
    }

    pub fn split_text(&self, text: &str) -> Vec<String> {
        self.split_recursive(text, &self.separators)
    }

    /// Splits one document; every chunk carries the parent metadata plus
    /// `chunk_id = "{row_index}_{sequence}"`.
    pub fn chunk_document(&self, document: &Document) -> Vec<Chunk> {
        let row_index = document.row_index();

        self.split_text(&document.content)
            .into_iter()
            .enumerate()
            .map(|(sequence, content)| {
                let chunk_id = format!("{row_index}_{sequence}");
                let mut metadata = document.metadata.clone();
                metadata.insert(CHUNK_ID_KEY.to_string(), Value::String(chunk_id.clone()));
                Chunk {
                    chunk_id,
                    content,
                    metadata,
                }
            })
            .collect()
    }

    pub fn chunk_documents(&self, documents: &[Document]) -> Vec<Chunk> {
        documents
            .iter()
            .flat_map(|document| self.chunk_document(document))
            .collect()
    }

    fn split_recursive(&self, text: &str, separators: &[&'static str]) -> Vec<String> {
        let mut separator = separators.last().copied().unwrap_or("");
        let mut finer: &[&'static str] = &[];
        for (position, candidate) in separators.iter().enumerate() {
            if candidate.is_empty() {
                separator = candidate;
                break;
            }
            if text.contains(candidate) {
                separator = candidate;
                finer = &separators[position + 1..];
                break;
            }
        }

        let mut chunks = Vec::new();
        let mut pending: Vec<&str> = Vec::new();

        for piece in split_keeping_separator(text, separator) {
            if char_len(piece) < self.config.chunk_size {
                pending.push(piece);
                continue;
            }

            if !pending.is_empty() {
                chunks.extend(self.merge(&pending));
                pending.clear();
            }

            if finer.is_empty() {
                chunks.push(piece.to_string());
            } else {
                chunks.extend(self.split_recursive(piece, finer));
            }
        }

        if !pending.is_empty() {
            chunks.extend(self.merge(&pending));
        }

        chunks
    }

    fn merge(&self, pieces: &[&str]) -> Vec<String> {
        let ChunkingConfig {
            chunk_size,
            chunk_overlap,
        } = self.config;

        let mut merged = Vec::new();
        let mut window: VecDeque<&str> = VecDeque::new();
        let mut total = 0usize;

        for piece in pieces {
            let length = char_len(piece);

            if total + length > chunk_size && !window.is_empty() {
                if let Some(chunk) = join_trimmed(&window) {
                    merged.push(chunk);
                }

                // keep a tail of at most `chunk_overlap` chars that still
                // leaves room for the next piece
                while total > chunk_overlap || (total + length > chunk_size && total > 0) {
                    match window.pop_front() {
                        Some(front) => total -= char_len(front),
                        None => break,
                    }
                }
            }

            window.push_back(piece);
            total += length;
        }

        if let Some(chunk) = join_trimmed(&window) {
            merged.push(chunk);
        }

        merged
    }
}

fn char_len(text: &str) -> usize {
    text.chars().count()
}

fn join_trimmed(pieces: &VecDeque<&str>) -> Option<String> {
    let joined = pieces.iter().copied().collect::<String>();
    let trimmed = joined.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Splits on `separator`, leaving it at the start of the following piece.
/// Empty pieces are dropped.
fn split_keeping_separator<'a>(text: &'a str, separator: &str) -> Vec<&'a str> {
    if separator.is_empty() {
        return text
            .char_indices()
            .map(|(index, ch)| &text[index..index + ch.len_utf8()])
            .collect();
    }

    let mut pieces = Vec::new();
    let mut start = 0;
    for (index, _) in text.match_indices(separator) {
        if index > start {
            pieces.push(&text[start..index]);
        }
        start = index;
    }
    if start < text.len() {
        pieces.push(&text[start..]);
    }
    pieces
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Metadata;
    use serde_json::json;

    fn splitter(size: usize, overlap: usize) -> TextSplitter {
        TextSplitter::new(ChunkingConfig::new(size, overlap).unwrap())
    }

    fn document(row_index: u64, content: &str) -> Document {
        let mut metadata = Metadata::new();
        metadata.insert("fullName".to_string(), json!("Marie Curie"));
        metadata.insert("row_index".to_string(), json!(row_index));
        Document {
            content: content.to_string(),
            metadata,
        }
    }

    #[test]
    fn overlap_must_be_smaller_than_size() {
        assert!(ChunkingConfig::new(10, 10).is_err());
        assert!(ChunkingConfig::new(0, 0).is_err());
        assert!(ChunkingConfig::new(10, 9).is_ok());
    }

    #[test]
    fn separator_stays_with_following_piece() {
        assert_eq!(
            split_keeping_separator("a\n\n\n\nb", "\n\n"),
            vec!["a", "\n\n", "\n\nb"]
        );
        assert_eq!(split_keeping_separator("\n\na", "\n\n"), vec!["\n\na"]);
        assert_eq!(split_keeping_separator("aé", ""), vec!["a", "é"]);
    }

    #[test]
    fn words_merge_with_bounded_overlap() {
        let chunks =
            splitter(10, 4).split_text("one two three four five six seven eight nine ten");
        assert_eq!(
            chunks,
            vec!["one two", "two three", "four five", "six seven", "eight", "nine ten"]
        );
    }

    #[test]
    fn line_breaks_are_preferred_over_spaces() {
        let chunks = splitter(15, 0).split_text("Laureate: A\nYear: 1901");
        assert_eq!(chunks, vec!["Laureate: A", "Year: 1901"]);
    }

    #[test]
    fn unbroken_text_falls_back_to_characters() {
        let chunks = splitter(4, 1).split_text("abcdefghij");
        assert_eq!(chunks, vec!["abcd", "defg", "ghij"]);
    }

    #[test]
    fn short_document_yields_single_chunk() {
        let chunks = splitter(1_500, 200).chunk_document(&document(7, "Laureate: Marie Curie"));
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].chunk_id, "7_0");
        assert_eq!(chunks[0].content, "Laureate: Marie Curie");
        assert_eq!(chunks[0].metadata["chunk_id"], json!("7_0"));
        assert_eq!(chunks[0].metadata["fullName"], json!("Marie Curie"));
    }

    #[test]
    fn long_document_yields_contiguous_chunk_ids() {
        let content = (1..=40)
            .map(|line| format!("Affiliation {line}: University number {line}"))
            .collect::<Vec<_>>()
            .join("\n");
        let document = document(12, &content);
        let chunks = splitter(200, 40).chunk_document(&document);

        assert!(chunks.len() >= 2);
        for (sequence, chunk) in chunks.iter().enumerate() {
            assert_eq!(chunk.chunk_id, format!("12_{sequence}"));
            assert!(chunk.content.chars().count() <= 200);
            assert_eq!(chunk.metadata["row_index"], json!(12));
        }
    }

    #[test]
    fn chunking_is_deterministic() {
        let content = "Motivation: for his services to Theoretical Physics. ".repeat(30);
        let first = splitter(120, 30).split_text(&content);
        let second = splitter(120, 30).split_text(&content);
        assert_eq!(first, second);
    }
}
