use xi_rope::delta::DeltaElement;
use xi_rope::{Delta, RopeInfo};

use crate::span::Span;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EditError {
    #[error("edit range {start}..{end} is outside the document (length {len})")]
    OutOfBounds { start: usize, end: usize, len: usize },
    #[error("edit boundary {offset} is not on a character boundary")]
    NotCharBoundary { offset: usize },
}

/// A contiguous edit expressed in old and new document coordinates.
///
/// `start..old_end` is the replaced region of the old text and
/// `start..new_end` is the inserted region of the new text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EditDelta {
    pub start: usize,
    pub old_end: usize,
    pub new_end: usize,
}

impl EditDelta {
    pub fn insertion(at: usize, len: usize) -> Self {
        Self {
            start: at,
            old_end: at,
            new_end: at + len,
        }
    }

    pub fn deletion(range: Span) -> Self {
        Self {
            start: range.start,
            old_end: range.end,
            new_end: range.start,
        }
    }

    pub fn replacement(range: Span, new_len: usize) -> Self {
        Self {
            start: range.start,
            old_end: range.end,
            new_end: range.start + new_len,
        }
    }

    /// Signed change in document length.
    pub fn net(&self) -> isize {
        self.new_end as isize - self.old_end as isize
    }

    /// The replaced region in old coordinates.
    pub fn old_span(&self) -> Span {
        Span::new(self.start, self.old_end)
    }

    /// The inserted region in new coordinates.
    pub fn new_span(&self) -> Span {
        Span::new(self.start, self.new_end)
    }

    /// Collapses an xi-rope delta into the smallest window that contains
    /// every change. Returns `None` for an identity delta.
    ///
    /// The delta is a sequence of `Copy(from, to)` and `Insert(text)` ops;
    /// the untouched prefix is a leading `Copy(0, n)` and the untouched
    /// suffix a trailing `Copy(m, base_len)`.
    pub fn from_delta(delta: &Delta<RopeInfo>) -> Option<Self> {
        if delta.is_identity() {
            return None;
        }
        let old_len = delta.base_len;
        let new_len = delta.new_document_len();

        let prefix = match delta.els.first() {
            Some(DeltaElement::Copy(0, to)) => *to,
            _ => 0,
        };
        let suffix = match delta.els.last() {
            Some(DeltaElement::Copy(from, to)) if *to == old_len => old_len - *from,
            _ => 0,
        };
        // A lone Copy can be both prefix and suffix; keep the window ordered.
        let suffix = suffix.min(old_len - prefix).min(new_len - prefix);

        Some(Self {
            start: prefix,
            old_end: old_len - suffix,
            new_end: new_len - suffix,
        })
    }
}

/// Result of applying an edit to a [`Document`](super::Document).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Patch {
    pub delta: EditDelta,
    pub version: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use xi_rope::Rope;
    use xi_rope::delta::Builder;

    fn replace(text: &str, range: std::ops::Range<usize>, with: &str) -> Delta<RopeInfo> {
        let mut builder = Builder::new(text.len());
        builder.replace(range, Rope::from(with));
        builder.build()
    }

    #[test]
    fn insertion_at_start() {
        let delta = replace("AAAA BBBB", 0..0, "xx");
        assert_eq!(
            EditDelta::from_delta(&delta),
            Some(EditDelta::insertion(0, 2))
        );
    }

    #[test]
    fn insertion_at_end() {
        let delta = replace("AAAA", 4..4, "!");
        assert_eq!(
            EditDelta::from_delta(&delta),
            Some(EditDelta::insertion(4, 1))
        );
    }

    #[test]
    fn deletion_in_middle() {
        let delta = replace("Hello World", 5..11, "");
        assert_eq!(
            EditDelta::from_delta(&delta),
            Some(EditDelta::deletion(Span::new(5, 11)))
        );
    }

    #[test]
    fn replacement_reports_both_ends() {
        let delta = replace("Hello BBBB world", 6..10, "[[BBBB]]");
        let d = EditDelta::from_delta(&delta).unwrap();
        assert_eq!(d.start, 6);
        assert_eq!(d.old_end, 10);
        assert_eq!(d.new_end, 14);
        assert_eq!(d.net(), 4);
    }

    #[test]
    fn whole_document_replacement() {
        let delta = replace("abc", 0..3, "xyz!");
        assert_eq!(
            EditDelta::from_delta(&delta),
            Some(EditDelta::replacement(Span::new(0, 3), 4))
        );
    }
}
