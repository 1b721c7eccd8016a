//! # Change Reconciliation
//!
//! Decides, per layer, what a document change means for its ranges:
//!
//! - **Full replacement / viewport change**: the layer goes stale
//! - **Edit on a phrase layer**: the layer goes stale; any keystroke can
//!   create or break a whole-word match
//! - **Edit on a marker layer**: ranges before the edit stay, ranges after
//!   it shift by the net length change, and a range overlapping the edit
//!   makes the layer stale. An edit on a line that contains one of the
//!   layer's markers also makes it stale, since it may move or complete a
//!   section boundary.
//! - **Append to an open-ended section**: a range that ran to the old end of
//!   the text must grow with it, so the layer goes stale.
//!
//! Reconciliation never resolves anything itself. Stale layers are resolved
//! later, once per settled burst of edits, by the session.

use crate::anchor::LogicalSpan;
use crate::document::{Change, DocumentSnapshot, EditDelta};
use crate::layers::{Layer, LayerCoordinator, LayerId};

/// Why a layer was sent back for re-resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StaleReason {
    FullReplace,
    Viewport,
    PhraseLayer,
    MarkerTouched,
    OpenEndedTail,
    RangeOverlap,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    /// Layers whose ranges were mapped through the edit and stay fresh.
    pub shifted: Vec<LayerId>,
    pub stale: Vec<(LayerId, StaleReason)>,
}

impl ReconcileReport {
    pub fn is_noop(&self) -> bool {
        self.shifted.is_empty() && self.stale.is_empty()
    }
}

/// Applies one change to every layer. `after` is the snapshot produced by
/// the change.
pub fn reconcile(
    coordinator: &mut LayerCoordinator,
    change: &Change,
    after: &DocumentSnapshot,
) -> ReconcileReport {
    let mut report = ReconcileReport::default();
    let ids: Vec<LayerId> = coordinator.layers().map(Layer::id).collect();

    for id in ids {
        let reason = match change {
            Change::FullReplace => Some(StaleReason::FullReplace),
            Change::Viewport(_) => Some(StaleReason::Viewport),
            Change::Edit(edit) => {
                let Some(layer) = coordinator.layer(id) else {
                    continue;
                };
                if !layer.is_anchored() {
                    Some(StaleReason::PhraseLayer)
                } else if touches_markers(layer, edit, after) {
                    Some(StaleReason::MarkerTouched)
                } else if extends_open_tail(layer, edit, after) {
                    Some(StaleReason::OpenEndedTail)
                } else {
                    match coordinator.map_through(id, edit) {
                        Some(mapping) if mapping.invalidated > 0 => Some(StaleReason::RangeOverlap),
                        Some(mapping) => {
                            if mapping.shifted > 0 {
                                report.shifted.push(id);
                            }
                            None
                        }
                        None => None,
                    }
                }
            }
        };

        if let Some(reason) = reason {
            coordinator.invalidate(id);
            report.stale.push((id, reason));
        }
    }

    log::debug!(
        "Reconciled {:?} at version {}: {} shifted, {} stale",
        change,
        after.version(),
        report.shifted.len(),
        report.stale.len()
    );
    report
}

/// True if any line touched by the edit, in the new text, contains one of
/// the layer's markers.
fn touches_markers(layer: &Layer, edit: &EditDelta, after: &DocumentSnapshot) -> bool {
    let markers: Vec<&str> = layer
        .spans()
        .iter()
        .filter_map(|s| s.marker_texts())
        .flat_map(|(start, end)| [start, end])
        .filter(|m| !m.is_empty())
        .collect();
    if markers.is_empty() {
        return false;
    }
    after
        .lines_touching(edit.new_span())
        .any(|line| markers.iter().any(|m| line.text.contains(m)))
}

/// True if the edit lands at the old end of the text and the layer has an
/// open-ended range reaching that end.
fn extends_open_tail(layer: &Layer, edit: &EditDelta, after: &DocumentSnapshot) -> bool {
    if !layer.spans().iter().any(LogicalSpan::is_open_ended) {
        return false;
    }
    let old_len = after.len().saturating_add_signed(-edit.net());
    layer
        .ranges()
        .iter()
        .any(|r| r.span.end == old_len && edit.start >= r.span.end)
}
