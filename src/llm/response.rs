//! Extraction of generated text from completion payloads.
//!
//! Completion servers disagree on where the text lives. Each known layout is
//! an extractor; they are tried in a fixed priority order and the first match
//! wins.

use serde_json::Value;

/// Returned when no known layout matches
pub const NO_RESPONSE: &str = "Sorry, I couldn't generate a response.";

const ANSWER_LABEL: &str = "answer:";

/// Where the generated text was found
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionShape<'a> {
    /// llama.cpp server: `{"content": "..."}`
    Content(&'a str),
    /// OpenAI-style completions: `{"choices": [{"text": "..."}]}`
    Choices(&'a str),
    /// Ollama generate: `{"response": "..."}`
    Response(&'a str),
}

impl<'a> CompletionShape<'a> {
    pub const fn text(self) -> &'a str {
        match self {
            Self::Content(text) | Self::Choices(text) | Self::Response(text) => text,
        }
    }
}

type Extractor = for<'a> fn(&'a Value) -> Option<CompletionShape<'a>>;

const EXTRACTORS: [Extractor; 3] = [content_field, first_choice_text, response_field];

fn content_field(payload: &Value) -> Option<CompletionShape<'_>> {
    payload
        .get("content")
        .and_then(Value::as_str)
        .map(CompletionShape::Content)
}

fn first_choice_text(payload: &Value) -> Option<CompletionShape<'_>> {
    payload
        .get("choices")
        .and_then(|choices| choices.get(0))
        .and_then(|choice| choice.get("text"))
        .and_then(Value::as_str)
        .map(CompletionShape::Choices)
}

fn response_field(payload: &Value) -> Option<CompletionShape<'_>> {
    payload
        .get("response")
        .and_then(Value::as_str)
        .map(CompletionShape::Response)
}

/// Identify the payload layout, if any
pub fn detect_shape(payload: &Value) -> Option<CompletionShape<'_>> {
    EXTRACTORS.iter().find_map(|extract| extract(payload))
}

/// Raw generated text, or [`NO_RESPONSE`] when the payload has none
pub fn extract_text(payload: &Value) -> &str {
    detect_shape(payload).map_or(NO_RESPONSE, CompletionShape::text)
}

/// Trim and drop a leading `Answer:` label (any case, surrounding whitespace)
pub fn clean_answer(text: &str) -> String {
    let trimmed = text.trim();
    let Some(label) = trimmed.get(..ANSWER_LABEL.len()) else {
        return trimmed.to_string();
    };
    if label.eq_ignore_ascii_case(ANSWER_LABEL) {
        trimmed[ANSWER_LABEL.len()..].trim_start().to_string()
    } else {
        trimmed.to_string()
    }
}

/// Extract and clean in one step
pub fn answer_from_payload(payload: &Value) -> String {
    clean_answer(extract_text(payload))
}
