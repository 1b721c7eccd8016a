//! # Layers
//!
//! A layer is an independently sourced group of resolved ranges with one
//! rendering style. The [`LayerCoordinator`] owns every layer of a session,
//! drives each through `Fresh → Stale → Resolving → Fresh`, and merges them
//! into one decoration list for the rendering host.
//!
//! Resolution is split into [`LayerCoordinator::begin_resolution`] and
//! [`LayerCoordinator::complete_resolution`] so the work can be deferred.
//! Every invalidation bumps the layer's generation; a result carrying an
//! older generation is discarded whole, never merged.

use std::sync::Arc;

use serde::Serialize;

use crate::anchor::{self, LogicalSpan, RangeMeta, ResolvedRange};
use crate::document::{DocumentSnapshot, EditDelta};
use crate::range_set::{EditMapping, RangeSet};
use crate::span::Span;

/// Identifies a layer within one coordinator. Ids follow registration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct LayerId(pub u32);

/// How the host should paint a decoration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DecorationKind {
    /// Inline mark over exactly the range.
    Mark,
    /// Whole-line background over every line the range touches.
    Line,
}

/// What a click on a layer's decoration does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ClickAction {
    None,
    /// Replace the range with a wiki link.
    ConvertToLink,
    /// Show the range's title and reason.
    Inspect,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayerStyle {
    pub class: String,
    pub kind: DecorationKind,
    pub tooltip: Option<String>,
    pub action: ClickAction,
}

impl LayerStyle {
    pub fn mark(class: impl Into<String>) -> Self {
        Self {
            class: class.into(),
            kind: DecorationKind::Mark,
            tooltip: None,
            action: ClickAction::None,
        }
    }

    pub fn line(class: impl Into<String>) -> Self {
        Self {
            kind: DecorationKind::Line,
            ..Self::mark(class)
        }
    }

    #[must_use]
    pub fn with_tooltip(mut self, tooltip: impl Into<String>) -> Self {
        self.tooltip = Some(tooltip.into());
        self
    }

    #[must_use]
    pub fn with_action(mut self, action: ClickAction) -> Self {
        self.action = action;
        self
    }

    /// Underlined link candidates that turn into links when clicked.
    pub fn link_candidates() -> Self {
        Self::mark("cm-underline")
            .with_tooltip("Click to convert to link")
            .with_action(ClickAction::ConvertToLink)
    }

    /// Line-highlighted sections that show their title and reason when clicked.
    pub fn sections() -> Self {
        Self::line("section-highlight").with_action(ClickAction::Inspect)
    }
}

/// One renderable mark: a range plus everything the host needs to paint it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Decoration {
    pub span: Span,
    pub layer: LayerId,
    pub class: String,
    pub kind: DecorationKind,
    pub tooltip: Option<String>,
    pub meta: Option<RangeMeta>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayerState {
    /// Ranges match the current snapshot.
    Fresh,
    /// Inputs changed; ranges must be re-resolved before the next render.
    Stale,
    /// A resolution has been handed out and not yet completed.
    Resolving,
}

#[derive(Debug, Clone)]
pub struct Layer {
    id: LayerId,
    name: String,
    style: LayerStyle,
    spans: Vec<LogicalSpan>,
    ranges: RangeSet,
    state: LayerState,
    generation: u64,
    suspended: bool,
}

impl Layer {
    pub fn id(&self) -> LayerId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn style(&self) -> &LayerStyle {
        &self.style
    }

    pub fn spans(&self) -> &[LogicalSpan] {
        &self.spans
    }

    pub fn ranges(&self) -> &RangeSet {
        &self.ranges
    }

    pub fn state(&self) -> LayerState {
        self.state
    }

    pub fn is_suspended(&self) -> bool {
        self.suspended
    }

    /// True if every span is line-anchored, so edits can shift ranges
    /// instead of forcing a full re-resolution.
    pub fn is_anchored(&self) -> bool {
        self.spans.iter().all(LogicalSpan::is_anchored)
    }

    fn invalidate(&mut self) {
        self.generation += 1;
        self.state = LayerState::Stale;
    }
}

/// Proof that a resolution was started for a layer at a given generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolutionTicket {
    pub layer: LayerId,
    pub generation: u64,
}

/// Everything needed to resolve one layer, detached from the coordinator.
#[derive(Debug, Clone)]
pub struct ResolutionJob {
    pub ticket: ResolutionTicket,
    pub snapshot: Arc<DocumentSnapshot>,
    pub spans: Vec<LogicalSpan>,
}

impl ResolutionJob {
    pub fn run(&self) -> ResolutionResult {
        ResolutionResult {
            ticket: self.ticket,
            version: self.snapshot.version(),
            ranges: anchor::resolve_all(&self.snapshot, &self.spans, self.ticket.layer),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ResolutionResult {
    pub ticket: ResolutionTicket,
    /// Snapshot version the ranges were computed against.
    pub version: u64,
    pub ranges: Vec<ResolvedRange>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    /// Ranges were swapped in; the layer is fresh.
    Applied { ranges: usize },
    /// A newer invalidation or resolution exists; the result was dropped.
    Superseded,
}

#[derive(Debug, Clone, Default)]
pub struct LayerCoordinator {
    layers: Vec<Layer>,
}

impl LayerCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a layer. Later layers paint on top of earlier ones.
    pub fn register(&mut self, name: impl Into<String>, style: LayerStyle) -> LayerId {
        let id = LayerId(self.layers.len() as u32);
        self.layers.push(Layer {
            id,
            name: name.into(),
            style,
            spans: Vec::new(),
            ranges: RangeSet::new(),
            state: LayerState::Fresh,
            generation: 0,
            suspended: false,
        });
        id
    }

    pub fn layer(&self, id: LayerId) -> Option<&Layer> {
        self.layers.get(id.0 as usize)
    }

    fn layer_mut(&mut self, id: LayerId) -> Option<&mut Layer> {
        self.layers.get_mut(id.0 as usize)
    }

    pub fn layers(&self) -> impl Iterator<Item = &Layer> {
        self.layers.iter()
    }

    pub fn find(&self, name: &str) -> Option<LayerId> {
        self.layers.iter().find(|l| l.name == name).map(|l| l.id)
    }

    /// Replaces a layer's logical spans and marks it stale.
    pub fn set_spans(&mut self, id: LayerId, spans: Vec<LogicalSpan>) -> bool {
        let Some(layer) = self.layer_mut(id) else {
            return false;
        };
        layer.spans = spans;
        layer.invalidate();
        true
    }

    /// Marks a layer stale, superseding any resolution in flight.
    pub fn invalidate(&mut self, id: LayerId) {
        if let Some(layer) = self.layer_mut(id) {
            layer.invalidate();
        }
    }

    pub fn invalidate_all(&mut self) {
        for layer in &mut self.layers {
            layer.invalidate();
        }
    }

    /// Layers that need a resolution pass, in registration order.
    pub fn stale_layers(&self) -> Vec<LayerId> {
        self.layers
            .iter()
            .filter(|l| l.state == LayerState::Stale)
            .map(|l| l.id)
            .collect()
    }

    /// Hands out a resolution for `id` against `snapshot`.
    ///
    /// Starting a new resolution supersedes any earlier one for the layer.
    pub fn begin_resolution(
        &mut self,
        id: LayerId,
        snapshot: &Arc<DocumentSnapshot>,
    ) -> Option<ResolutionJob> {
        let layer = self.layer_mut(id)?;
        layer.generation += 1;
        layer.state = LayerState::Resolving;
        Some(ResolutionJob {
            ticket: ResolutionTicket {
                layer: id,
                generation: layer.generation,
            },
            snapshot: Arc::clone(snapshot),
            spans: layer.spans.clone(),
        })
    }

    /// Swaps in a finished resolution if nothing superseded it.
    pub fn complete_resolution(&mut self, result: ResolutionResult) -> Completion {
        let Some(layer) = self.layer_mut(result.ticket.layer) else {
            return Completion::Superseded;
        };
        if layer.state != LayerState::Resolving || layer.generation != result.ticket.generation {
            log::trace!(
                "Discarding resolution for layer {:?} (generation {} is not current {})",
                result.ticket.layer,
                result.ticket.generation,
                layer.generation
            );
            return Completion::Superseded;
        }
        layer.ranges.rebuild(result.ranges);
        layer.state = LayerState::Fresh;
        Completion::Applied {
            ranges: layer.ranges.len(),
        }
    }

    /// Resolves a layer's current spans immediately.
    pub fn refresh(&mut self, id: LayerId, snapshot: &Arc<DocumentSnapshot>) -> Completion {
        match self.begin_resolution(id, snapshot) {
            Some(job) => {
                let result = job.run();
                self.complete_resolution(result)
            }
            None => Completion::Superseded,
        }
    }

    /// Sets a layer's spans and resolves them immediately.
    pub fn refresh_layer(
        &mut self,
        id: LayerId,
        snapshot: &Arc<DocumentSnapshot>,
        spans: Vec<LogicalSpan>,
    ) -> Completion {
        if !self.set_spans(id, spans) {
            return Completion::Superseded;
        }
        self.refresh(id, snapshot)
    }

    /// Shifts a layer's ranges through an edit. A layer caught mid-resolution
    /// is invalidated instead, since its pending result predates the edit.
    pub fn map_through(&mut self, id: LayerId, edit: &EditDelta) -> Option<EditMapping> {
        let layer = self.layer_mut(id)?;
        if layer.state == LayerState::Resolving {
            layer.invalidate();
        }
        let mapping = layer.ranges.map_through(edit);
        if mapping.invalidated > 0 {
            layer.invalidate();
        }
        Some(mapping)
    }

    pub fn set_suspended(&mut self, id: LayerId, suspended: bool) {
        if let Some(layer) = self.layer_mut(id) {
            layer.suspended = suspended;
        }
    }

    pub fn set_all_suspended(&mut self, suspended: bool) {
        for layer in &mut self.layers {
            layer.suspended = suspended;
        }
    }

    /// All visible decorations ordered by start. Ties keep registration
    /// order, so later layers come last and paint on top.
    pub fn composite(&self) -> Vec<Decoration> {
        let mut out: Vec<Decoration> = self
            .layers
            .iter()
            .filter(|l| !l.suspended)
            .flat_map(|l| l.ranges.to_decorations(&l.style))
            .collect();
        out.sort_by_key(|d| d.span.start);
        out
    }

    /// The topmost visible range under `offset` and its layer.
    pub fn hit_test(&self, offset: usize) -> Option<(&Layer, &ResolvedRange)> {
        self.layers
            .iter()
            .rev()
            .filter(|l| !l.suspended)
            .find_map(|l| l.ranges.query_at(offset).map(|r| (l, r)))
    }

    /// Drops every layer.
    pub fn clear(&mut self) {
        self.layers.clear();
    }
}
