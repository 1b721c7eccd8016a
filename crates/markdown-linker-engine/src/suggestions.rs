//! # Suggestion Payloads
//!
//! A suggestion source answers with free text that usually embeds a JSON
//! object somewhere in prose or a fenced code block:
//!
//! ```text
//! Here is the JSON response:
//! {"suggestions": ["Project", "Milestone"]}
//! ```
//!
//! The `suggestions` array holds either candidate phrases or section
//! boundary objects. Parsing never panics: text with no JSON object yields
//! [`SuggestionError::NoPayload`], anything else unusable yields
//! [`SuggestionError::Malformed`].

use std::borrow::Cow;

use serde::Deserialize;

use crate::anchor::{LogicalSpan, SectionBoundary};

#[derive(Debug, thiserror::Error)]
pub enum SuggestionError {
    #[error("No JSON object found in suggestion response")]
    NoPayload,
    #[error("Malformed suggestion payload: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// The parsed `suggestions` array.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum Suggestions {
    Phrases(Vec<String>),
    Boundaries(Vec<SectionBoundary>),
}

#[derive(Deserialize)]
struct Payload {
    suggestions: Suggestions,
}

impl Suggestions {
    pub fn len(&self) -> usize {
        match self {
            Suggestions::Phrases(p) => p.len(),
            Suggestions::Boundaries(b) => b.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Converts the suggestions into logical spans for one layer.
    ///
    /// Phrases become a single phrase-set span with blanks dropped.
    /// Boundaries become one span each.
    pub fn into_spans(self, open_ended: bool) -> Vec<LogicalSpan> {
        match self {
            Suggestions::Phrases(phrases) => {
                let phrases: Vec<String> = phrases
                    .into_iter()
                    .map(|p| p.trim().to_string())
                    .filter(|p| !p.is_empty())
                    .collect();
                if phrases.is_empty() {
                    Vec::new()
                } else {
                    vec![LogicalSpan::Phrases(phrases)]
                }
            }
            Suggestions::Boundaries(boundaries) => boundaries
                .into_iter()
                .map(|b| {
                    let span = LogicalSpan::boundary(b);
                    if open_ended { span.open_ended() } else { span }
                })
                .collect(),
        }
    }
}

/// Parses a raw suggestion response.
pub fn parse(response: &str) -> Result<Suggestions, SuggestionError> {
    let text = model_text(response);
    let block = extract_json_block(&text).ok_or(SuggestionError::NoPayload)?;
    let payload: Payload = serde_json::from_str(block)?;
    log::debug!("Parsed {} suggestions", payload.suggestions.len());
    Ok(payload.suggestions)
}

/// Unwraps the generated text from a raw model API response.
///
/// Completion endpoints return `{"response": "..."}` and chat endpoints
/// return `{"choices": [{"message": {"content": "..."}}]}`. Anything else is
/// taken to be the generated text already.
pub fn model_text(response: &str) -> Cow<'_, str> {
    let Ok(value) = serde_json::from_str::<serde_json::Value>(response.trim()) else {
        return Cow::Borrowed(response);
    };
    let inner = value
        .get("response")
        .or_else(|| value.pointer("/choices/0/message/content"))
        .and_then(serde_json::Value::as_str);
    match inner {
        Some(text) => Cow::Owned(text.to_string()),
        None => Cow::Borrowed(response),
    }
}

/// The first balanced `{...}` block in `text`.
///
/// Braces inside JSON string literals do not count towards the balance.
pub fn extract_json_block(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, c) in text[start..].char_indices() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..start + i + 1]);
                }
            }
            _ => {}
        }
    }
    None
}
