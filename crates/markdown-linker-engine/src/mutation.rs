//! # Mutation Bridge
//!
//! Turns a highlighted range into a wiki link. The target text is always
//! re-sliced from the content at invocation time, so a click on a range
//! computed against an older snapshot either edits what is there now or is
//! refused with [`MutationError::RangeInvalidated`].
//!
//! The bridge does not touch layers. The edit it writes is an ordinary
//! change notification and the reconciler handles it like any other.

use crate::document::{ContentProvider, EditError, Patch};
use crate::links::WikiLink;
use crate::span::Span;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum MutationError {
    #[error("Range {start}..{end} is no longer valid for a document of {len} bytes")]
    RangeInvalidated { start: usize, end: usize, len: usize },
    #[error("Edit rejected: {0}")]
    Edit(#[from] EditError),
}

/// One replacement to apply atomically.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextEdit {
    pub range: Span,
    pub text: String,
}

/// Builds the edit that wraps `content[range]` as `[[...]]`.
pub fn convert(content: &str, range: Span) -> Result<TextEdit, MutationError> {
    let invalidated = || MutationError::RangeInvalidated {
        start: range.start,
        end: range.end,
        len: content.len(),
    };
    if range.is_empty() {
        return Err(invalidated());
    }
    let Some(target) = content.get(range.start..range.end) else {
        log::warn!(
            "Refusing to convert {}..{}: outside current text of {} bytes",
            range.start,
            range.end,
            content.len()
        );
        return Err(invalidated());
    };
    Ok(TextEdit {
        range,
        text: WikiLink::wrap(target),
    })
}

/// Converts `range` against the provider's current text and writes it.
pub fn convert_to_link<P>(provider: &mut P, range: Span) -> Result<Patch, MutationError>
where
    P: ContentProvider + ?Sized,
{
    let snapshot = provider.snapshot();
    let edit = convert(snapshot.text(), range)?;
    let patch = provider.write(edit.range, &edit.text)?;
    log::debug!(
        "Converted {}..{} to a link at version {}",
        range.start,
        range.end,
        patch.version
    );
    Ok(patch)
}
