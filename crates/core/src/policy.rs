use crate::classifier::Intent;
use crate::models::ScoredChunk;

pub const GREETING_MESSAGE: &str = "Hello! I'm here to help you with Nobel Prize information.";
pub const IDENTITY_MESSAGE: &str = "I am an AI assistant specialized in Nobel Prize information.";
pub const INVALID_CATEGORY_MESSAGE: &str = "There is no Nobel Prize in Mathematics.\n\n\
The Nobel Prizes are awarded in:\n\
• Physics\n\
• Chemistry\n\
• Physiology or Medicine\n\
• Literature\n\
• Peace\n\
• Economic Sciences";
pub const AMBIGUOUS_MESSAGE: &str = "Please specify the category for the first winner.\n\n\
Available categories:\n\
• Physics\n\
• Chemistry\n\
• Physiology or Medicine\n\
• Literature\n\
• Peace\n\
• Economic Sciences";
pub const OFF_TOPIC_MESSAGE: &str = "Sorry, I only answer questions related to Nobel Prizes.";
pub const NO_INFORMATION_MESSAGE: &str = "Sorry, I don't have information about that.";

pub const MIN_ANSWER_CHARS: usize = 10;
pub const SELF_FLAGGED_PHRASES: [&str; 2] = ["not included in provided context", "not applicable"];

const PROMPT_INSTRUCTIONS: &str = r#"You are a Nobel Prize information assistant.

Use only the provided context to answer the question.
Do not invent or assume information.
If the answer is not clearly present in the context, respond with:
"Sorry, I don't have information about that."
The answer should be accurate and to the point. Avoid unnecessary elaboration.
Do not include information that is not directly relevant to the question.
Don't mention the context or say "based on the provided information". Just provide the answer.
Format the answer clearly using headings and bullet points.
"#;

/// Fixed reply for every intent that never reaches the index.
pub fn canned_response(intent: Intent) -> Option<&'static str> {
    match intent {
        Intent::Greeting => Some(GREETING_MESSAGE),
        Intent::Identity => Some(IDENTITY_MESSAGE),
        Intent::InvalidCategory => Some(INVALID_CATEGORY_MESSAGE),
        Intent::Ambiguous => Some(AMBIGUOUS_MESSAGE),
        Intent::OffTopic => Some(OFF_TOPIC_MESSAGE),
        Intent::Nobel => None,
    }
}

pub fn build_context(sources: &[ScoredChunk]) -> String {
    sources
        .iter()
        .map(|source| source.content.as_str())
        .collect::<Vec<_>>()
        .join("\n\n")
}

pub fn build_prompt(context: &str, question: &str) -> String {
    format!(
        "{PROMPT_INSTRUCTIONS}\nContext:\n{context}\n\nQuestion:\n{}\n\nAnswer:\n",
        question.trim()
    )
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    Empty,
    TooShort,
    SelfFlagged,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardOutcome {
    Accepted(String),
    Rejected(RejectReason),
}

impl GuardOutcome {
    /// The text to show: the trimmed answer, or the fixed refusal.
    pub fn into_text(self) -> String {
        match self {
            Self::Accepted(answer) => answer,
            Self::Rejected(_) => NO_INFORMATION_MESSAGE.to_string(),
        }
    }
}

/// Rejects generated answers that are empty, too short, or that admit the
/// context did not contain the answer.
pub fn guard_answer(raw: &str) -> GuardOutcome {
    let answer = raw.trim();
    if answer.is_empty() {
        return GuardOutcome::Rejected(RejectReason::Empty);
    }

    let lowered = answer.to_lowercase();
    if SELF_FLAGGED_PHRASES
        .iter()
        .any(|phrase| lowered.contains(phrase))
    {
        return GuardOutcome::Rejected(RejectReason::SelfFlagged);
    }

    if answer.chars().count() < MIN_ANSWER_CHARS {
        return GuardOutcome::Rejected(RejectReason::TooShort);
    }

    GuardOutcome::Accepted(answer.to_string())
}
