//! Keyword rules that sort a raw question into one of six intents before
//! anything touches the index.
//!
//! The rules form an ordered decision table: the first rule whose predicate
//! holds decides the intent. Overlapping keyword sets are resolved purely by
//! that order, e.g. a question mentioning both "math" and "first winner" is an
//! invalid category, never an ambiguous one.

use serde::{Deserialize, Serialize};
use std::fmt;

pub const GREETINGS: [&str; 5] = ["hi", "hello", "hey", "good morning", "good evening"];
pub const IDENTITY_PHRASES: [&str; 3] = ["who are you", "what are you", "introduce yourself"];
pub const CATEGORY_KEYWORDS: [&str; 6] = [
    "physics",
    "chemistry",
    "medicine",
    "literature",
    "peace",
    "economic",
];
pub const NOBEL_KEYWORDS: [&str; 5] = ["nobel", "prize", "winner", "laureate", "year"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    Greeting,
    Identity,
    InvalidCategory,
    Ambiguous,
    Nobel,
    OffTopic,
}

impl Intent {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Greeting => "greeting",
            Self::Identity => "identity",
            Self::InvalidCategory => "invalid_category",
            Self::Ambiguous => "ambiguous",
            Self::Nobel => "nobel",
            Self::OffTopic => "off_topic",
        }
    }

    pub fn needs_retrieval(self) -> bool {
        self == Self::Nobel
    }
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One row of the decision table. Predicates see the trimmed, lowercased query.
#[derive(Clone, Copy)]
pub struct Rule {
    pub priority: u8,
    pub intent: Intent,
    pub predicate: fn(&str) -> bool,
}

impl fmt::Debug for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rule")
            .field("priority", &self.priority)
            .field("intent", &self.intent)
            .finish()
    }
}

static RULES: [Rule; 5] = [
    Rule {
        priority: 1,
        intent: Intent::Greeting,
        predicate: is_greeting,
    },
    Rule {
        priority: 2,
        intent: Intent::Identity,
        predicate: asks_identity,
    },
    Rule {
        priority: 3,
        intent: Intent::InvalidCategory,
        predicate: mentions_math,
    },
    Rule {
        priority: 4,
        intent: Intent::Ambiguous,
        predicate: first_winner_without_category,
    },
    Rule {
        priority: 5,
        intent: Intent::Nobel,
        predicate: mentions_nobel_keyword,
    },
];

/// The decision table, highest precedence first. Anything unmatched is off topic.
pub fn rules() -> &'static [Rule] {
    &RULES
}

pub fn normalize(query: &str) -> String {
    query.trim().to_lowercase()
}

pub fn classify(query: &str) -> Intent {
    let normalized = normalize(query);
    rules()
        .iter()
        .find(|rule| (rule.predicate)(&normalized))
        .map(|rule| rule.intent)
        .unwrap_or(Intent::OffTopic)
}

fn contains_any(text: &str, needles: &[&str]) -> bool {
    needles.iter().any(|needle| text.contains(needle))
}

fn is_greeting(query: &str) -> bool {
    GREETINGS.contains(&query)
}

fn asks_identity(query: &str) -> bool {
    contains_any(query, &IDENTITY_PHRASES)
}

// there is no Nobel Prize in mathematics
fn mentions_math(query: &str) -> bool {
    query.contains("math")
}

fn first_winner_without_category(query: &str) -> bool {
    query.contains("first winner") && !contains_any(query, &CATEGORY_KEYWORDS)
}

fn mentions_nobel_keyword(query: &str) -> bool {
    contains_any(query, &NOBEL_KEYWORDS)
}
