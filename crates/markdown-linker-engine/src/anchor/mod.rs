//! # Anchor Resolution
//!
//! Turns offset-free [`LogicalSpan`]s into concrete [`ResolvedRange`]s
//! against one [`DocumentSnapshot`].
//!
//! ## Span kinds
//!
//! - **Marker pair**: a section opened by the first line containing the
//!   start marker and closed by the next line containing the end marker
//! - **Boundary**: a marker pair that also carries a title and a reason,
//!   kept on the range for click-to-inspect
//! - **Phrases**: whole-word, case-insensitive occurrences of any candidate
//!   phrase that are not already inside `[[...]]`
//!
//! Both marker kinds share one line-scanning algorithm in [`markers`];
//! phrase matching lives in [`phrases`]. Unresolvable spans simply
//! produce no ranges.

pub mod markers;
pub mod phrases;

use serde::{Deserialize, Serialize};

use crate::document::DocumentSnapshot;
use crate::layers::LayerId;
use crate::span::Span;

pub use markers::resolve_markers;
pub use phrases::{PatternError, PhrasePattern};

/// A section suggested by the suggestion source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionBoundary {
    pub section_start: String,
    pub section_end: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub reason: String,
}

/// Where an annotation belongs, described by text rather than offsets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogicalSpan {
    MarkerPair {
        start_marker: String,
        end_marker: String,
        open_ended: bool,
    },
    Boundary {
        boundary: SectionBoundary,
        open_ended: bool,
    },
    Phrases(Vec<String>),
}

impl LogicalSpan {
    pub fn markers(start_marker: impl Into<String>, end_marker: impl Into<String>) -> Self {
        LogicalSpan::MarkerPair {
            start_marker: start_marker.into(),
            end_marker: end_marker.into(),
            open_ended: false,
        }
    }

    pub fn boundary(boundary: SectionBoundary) -> Self {
        LogicalSpan::Boundary {
            boundary,
            open_ended: false,
        }
    }

    pub fn phrases<I, S>(phrases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        LogicalSpan::Phrases(phrases.into_iter().map(Into::into).collect())
    }

    /// Allows a marker span with no closing line to run to end of document.
    #[must_use]
    pub fn open_ended(mut self) -> Self {
        match &mut self {
            LogicalSpan::MarkerPair { open_ended, .. } | LogicalSpan::Boundary { open_ended, .. } => {
                *open_ended = true;
            }
            LogicalSpan::Phrases(_) => {}
        }
        self
    }

    /// True for line-anchored spans, whose ranges can be shifted through
    /// edits instead of re-resolved.
    pub fn is_anchored(&self) -> bool {
        !matches!(self, LogicalSpan::Phrases(_))
    }

    pub fn is_open_ended(&self) -> bool {
        match self {
            LogicalSpan::MarkerPair { open_ended, .. } | LogicalSpan::Boundary { open_ended, .. } => {
                *open_ended
            }
            LogicalSpan::Phrases(_) => false,
        }
    }

    /// The start and end marker text of an anchored span.
    pub fn marker_texts(&self) -> Option<(&str, &str)> {
        match self {
            LogicalSpan::MarkerPair {
                start_marker,
                end_marker,
                ..
            } => Some((start_marker, end_marker)),
            LogicalSpan::Boundary { boundary, .. } => {
                Some((&boundary.section_start, &boundary.section_end))
            }
            LogicalSpan::Phrases(_) => None,
        }
    }
}

/// Display metadata carried by boundary ranges.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RangeMeta {
    pub title: String,
    pub reason: String,
}

/// A concrete `[from, to)` interval derived from a logical span.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedRange {
    pub span: Span,
    pub layer: LayerId,
    pub meta: Option<RangeMeta>,
}

impl ResolvedRange {
    pub fn new(span: Span, layer: LayerId) -> Self {
        Self {
            span,
            layer,
            meta: None,
        }
    }

    pub fn from(&self) -> usize {
        self.span.start
    }

    pub fn to(&self) -> usize {
        self.span.end
    }
}

/// Resolves one logical span. Never fails: anything that cannot be found,
/// or a phrase list the regex engine rejects, yields no ranges.
pub fn resolve(
    snapshot: &DocumentSnapshot,
    span: &LogicalSpan,
    layer: LayerId,
) -> Vec<ResolvedRange> {
    match span {
        LogicalSpan::MarkerPair {
            start_marker,
            end_marker,
            open_ended,
        } => resolve_markers(snapshot, start_marker, end_marker, *open_ended)
            .map(|sp| ResolvedRange::new(sp, layer))
            .into_iter()
            .collect(),
        LogicalSpan::Boundary {
            boundary,
            open_ended,
        } => resolve_markers(
            snapshot,
            &boundary.section_start,
            &boundary.section_end,
            *open_ended,
        )
        .map(|sp| ResolvedRange {
            span: sp,
            layer,
            meta: Some(RangeMeta {
                title: boundary.title.clone(),
                reason: boundary.reason.clone(),
            }),
        })
        .into_iter()
        .collect(),
        LogicalSpan::Phrases(phrases) => match PhrasePattern::build(phrases) {
            Ok(Some(pattern)) => pattern
                .find_all(snapshot)
                .into_iter()
                .map(|sp| ResolvedRange::new(sp, layer))
                .collect(),
            Ok(None) => Vec::new(),
            Err(e) => {
                log::warn!("Skipping {} candidate phrases: {e}", phrases.len());
                Vec::new()
            }
        },
    }
}

/// Resolves every span of a layer in order. The result may overlap; the
/// range set trims it.
pub fn resolve_all(
    snapshot: &DocumentSnapshot,
    spans: &[LogicalSpan],
    layer: LayerId,
) -> Vec<ResolvedRange> {
    let ranges: Vec<_> = spans
        .iter()
        .flat_map(|span| resolve(snapshot, span, layer))
        .collect();
    log::debug!(
        "Resolved {} spans into {} ranges for layer {:?} at version {}",
        spans.len(),
        ranges.len(),
        layer,
        snapshot.version()
    );
    ranges
}
