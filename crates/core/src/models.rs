use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};

pub type Metadata = BTreeMap<String, Value>;

pub const ROW_INDEX_KEY: &str = "row_index";
pub const SOURCE_KEY: &str = "source";
pub const CHUNK_ID_KEY: &str = "chunk_id";

/// One dataset row, keyed by column name. Missing cells are never stored.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Record {
    values: HashMap<String, String>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, column: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(column, value);
        self
    }

    /// Stores `value` unless it is a missing-value marker.
    pub fn insert(&mut self, column: impl Into<String>, value: impl Into<String>) {
        let value = value.into();
        if !is_missing(&value) {
            self.values.insert(column.into(), value);
        }
    }

    pub fn get(&self, column: &str) -> Option<&str> {
        self.values.get(column).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

const MISSING_MARKERS: [&str; 19] = [
    "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

/// Dataframe-style missing check: empty cells and the usual NA tokens.
pub fn is_missing(value: &str) -> bool {
    MISSING_MARKERS.contains(&value)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub content: String,
    pub metadata: Metadata,
}

impl Document {
    pub fn row_index(&self) -> u64 {
        self.metadata
            .get(ROW_INDEX_KEY)
            .and_then(Value::as_u64)
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    pub chunk_id: String,
    pub content: String,
    pub metadata: Metadata,
}

/// A chunk handed back by the vector index, best match first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredChunk {
    pub content: String,
    pub metadata: Metadata,
    pub score: f64,
}

impl ScoredChunk {
    pub fn metadata_str(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).and_then(Value::as_str)
    }

    /// Laureate or organization name, as shown next to a cited source.
    pub fn display_name(&self) -> &str {
        self.metadata_str("fullName")
            .or_else(|| self.metadata_str("orgName"))
            .unwrap_or("Unknown")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn missing_markers_are_not_stored() {
        let record = Record::new()
            .with("fullName", "Marie Curie")
            .with("orgName", "")
            .with("acronym", "NaN")
            .with("motivation", "N/A");

        assert_eq!(record.get("fullName"), Some("Marie Curie"));
        assert_eq!(record.get("orgName"), None);
        assert_eq!(record.get("acronym"), None);
        assert_eq!(record.get("motivation"), None);
    }

    #[test]
    fn display_name_prefers_full_name() {
        let mut metadata = Metadata::new();
        metadata.insert("orgName".to_string(), json!("Red Cross"));
        let mut hit = ScoredChunk {
            content: String::new(),
            metadata,
            score: 0.5,
        };
        assert_eq!(hit.display_name(), "Red Cross");

        hit.metadata
            .insert("fullName".to_string(), json!("Henry Dunant"));
        assert_eq!(hit.display_name(), "Henry Dunant");

        hit.metadata.clear();
        assert_eq!(hit.display_name(), "Unknown");
    }
}
