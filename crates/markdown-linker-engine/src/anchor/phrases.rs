use regex::{Regex, RegexBuilder};

use crate::document::DocumentSnapshot;
use crate::links::WikiLink;
use crate::span::Span;

#[derive(Debug, thiserror::Error)]
#[error("phrase pattern rejected: {0}")]
pub struct PatternError(#[from] regex::Error);

/// A compiled, case-insensitive whole-word alternation over candidate phrases.
///
/// Phrases are escaped before joining, so metacharacters in user word
/// lists match literally. The `regex` crate runs in linear time, so no
/// phrase list can cause catastrophic backtracking.
#[derive(Debug, Clone)]
pub struct PhrasePattern {
    regex: Regex,
    phrases: usize,
}

impl PhrasePattern {
    /// Builds the alternation. Blank phrases are skipped and duplicates
    /// (ignoring case) collapse to their first spelling.
    ///
    /// Returns `Ok(None)` when nothing is left to match; an empty set must
    /// resolve to zero ranges rather than to a pattern that matches
    /// everywhere.
    pub fn build<I, S>(phrases: I) -> Result<Option<Self>, PatternError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut seen = Vec::<String>::new();
        let mut alternatives = Vec::new();
        for phrase in phrases {
            let phrase = phrase.as_ref().trim();
            if phrase.is_empty() {
                continue;
            }
            let folded = phrase.to_lowercase();
            if seen.contains(&folded) {
                continue;
            }
            seen.push(folded);
            alternatives.push(bounded(phrase));
        }

        if alternatives.is_empty() {
            return Ok(None);
        }

        let regex = RegexBuilder::new(&format!("(?:{})", alternatives.join("|")))
            .case_insensitive(true)
            .build()?;
        Ok(Some(Self {
            regex,
            phrases: alternatives.len(),
        }))
    }

    pub fn len(&self) -> usize {
        self.phrases
    }

    pub fn is_empty(&self) -> bool {
        self.phrases == 0
    }

    pub fn as_str(&self) -> &str {
        self.regex.as_str()
    }

    /// Scans the snapshot line by line, leftmost-first and non-overlapping,
    /// skipping matches that already sit inside link brackets.
    pub fn find_all(&self, snapshot: &DocumentSnapshot) -> Vec<Span> {
        let mut out = Vec::new();
        for line in snapshot.lines() {
            for m in self.regex.find_iter(line.text) {
                if m.is_empty() || WikiLink::closes_before_opening(&line.text[m.end()..]) {
                    continue;
                }
                out.push(Span::new(
                    line.span.start + m.start(),
                    line.span.start + m.end(),
                ));
            }
        }
        out
    }
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Escapes a phrase and anchors it on whole words.
///
/// A side that ends in a word character gets `\b`. A side that ends in
/// punctuation (`C++`, `#tag`) gets `\B`, which still rejects a word
/// character glued onto it.
fn bounded(phrase: &str) -> String {
    let edge = |c: Option<char>| match c {
        Some(c) if is_word_char(c) => r"\b",
        _ => r"\B",
    };
    format!(
        "{}{}{}",
        edge(phrase.chars().next()),
        regex::escape(phrase),
        edge(phrase.chars().next_back())
    )
}
