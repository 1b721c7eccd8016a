//! # Annotation Session
//!
//! Per-view state tying a content provider to a set of layers.
//!
//! ## Lifecycle
//!
//! 1. [`AnnotationSession::attach`] subscribes to the provider's change
//!    notifications and takes the first snapshot
//! 2. The host calls [`AnnotationSession::sync`] after it hands control back
//!    from an edit burst, then [`AnnotationSession::render`] to paint
//! 3. [`AnnotationSession::detach`] unsubscribes and drops every layer
//!
//! Change notifications only queue events. Reconciliation happens in `sync`
//! and resolution of stale layers in `settle`, which `render` always runs
//! first, so a burst of keystrokes costs one resolution pass.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use std::sync::Arc;

use crate::anchor::{LogicalSpan, RangeMeta};
use crate::document::{Change, ChangeEvent, ContentProvider, DocumentSnapshot, ListenerId, Patch};
use crate::layers::{
    ClickAction, Completion, Decoration, LayerCoordinator, LayerId, LayerStyle, ResolutionJob,
    ResolutionResult,
};
use crate::mutation::{self, MutationError};
use crate::reconcile::{self, ReconcileReport};
use crate::span::Span;
use crate::suggestions::{self, SuggestionError};

/// Receives the composite decoration list.
pub trait RenderHost {
    fn paint(&mut self, decorations: &[Decoration]);
}

/// Result of a click on the document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Activation {
    /// Nothing clickable under the offset.
    Nothing,
    /// The range was replaced with a wiki link.
    Converted { range: Span, patch: Patch },
    /// The range's section metadata, for a tooltip or status line.
    Inspect {
        range: Span,
        meta: Option<RangeMeta>,
    },
}

/// Identifies one outstanding suggestion request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SuggestionTicket {
    pub layer: LayerId,
    seq: u64,
}

/// What to send to the suggestion source.
#[derive(Debug, Clone)]
pub struct SuggestionRequest {
    pub ticket: SuggestionTicket,
    pub text: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuggestionOutcome {
    /// The layer's spans were replaced; it resolves on the next settle.
    Applied { spans: usize },
    /// A newer request for the layer exists, or the session was detached.
    Superseded,
}

type Inbox = Rc<RefCell<Vec<ChangeEvent>>>;

pub struct AnnotationSession {
    coordinator: LayerCoordinator,
    snapshot: Arc<DocumentSnapshot>,
    inbox: Inbox,
    listener: Option<ListenerId>,
    dirty: bool,
    open_ended_sections: bool,
    pending_suggestions: HashMap<LayerId, u64>,
    next_suggestion: u64,
}

impl AnnotationSession {
    /// Subscribes to `provider` and snapshots its current text.
    pub fn attach<P>(provider: &mut P) -> Self
    where
        P: ContentProvider + ?Sized,
    {
        let inbox: Inbox = Rc::default();
        let sink = Rc::downgrade(&inbox);
        let listener = provider.on_change(Box::new(move |event| {
            // A session dropped without detaching leaves a no-op listener.
            if let Some(sink) = sink.upgrade() {
                sink.borrow_mut().push(*event);
            }
        }));
        let snapshot = provider.snapshot();
        log::debug!(
            "Attached session at version {} ({} bytes)",
            snapshot.version(),
            snapshot.len()
        );

        Self {
            coordinator: LayerCoordinator::new(),
            snapshot,
            inbox,
            listener: Some(listener),
            dirty: true,
            open_ended_sections: false,
            pending_suggestions: HashMap::new(),
            next_suggestion: 0,
        }
    }

    /// Unsubscribes from `provider` and drops every layer.
    pub fn detach<P>(&mut self, provider: &mut P)
    where
        P: ContentProvider + ?Sized,
    {
        if let Some(id) = self.listener.take()
            && !provider.remove_listener(id)
        {
            log::warn!("Listener {id:?} was already removed from the provider");
        }
        self.coordinator.clear();
        self.inbox.borrow_mut().clear();
        self.pending_suggestions.clear();
        self.dirty = true;
        log::debug!("Detached session");
    }

    pub fn is_attached(&self) -> bool {
        self.listener.is_some()
    }

    pub fn snapshot(&self) -> &Arc<DocumentSnapshot> {
        &self.snapshot
    }

    pub fn coordinator(&self) -> &LayerCoordinator {
        &self.coordinator
    }

    /// True when the next render would paint.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Lets sections suggested from now on run to end of document when their
    /// end marker is missing.
    pub fn set_open_ended_sections(&mut self, open_ended: bool) {
        self.open_ended_sections = open_ended;
    }

    pub fn register_layer(&mut self, name: impl Into<String>, style: LayerStyle) -> LayerId {
        self.dirty = true;
        self.coordinator.register(name, style)
    }

    /// Replaces a layer's spans. They resolve on the next settle.
    pub fn set_spans(&mut self, layer: LayerId, spans: Vec<LogicalSpan>) -> bool {
        let updated = self.coordinator.set_spans(layer, spans);
        self.dirty |= updated;
        updated
    }

    pub fn set_suspended(&mut self, layer: LayerId, suspended: bool) {
        self.coordinator.set_suspended(layer, suspended);
        self.dirty = true;
    }

    pub fn set_all_suspended(&mut self, suspended: bool) {
        self.coordinator.set_all_suspended(suspended);
        self.dirty = true;
    }

    /// Reconciles every queued change notification against the provider's
    /// current text.
    ///
    /// A single queued text change is reconciled precisely. Several text
    /// changes are coalesced into a full re-resolution, since only the final
    /// snapshot is available to check them against.
    pub fn sync<P>(&mut self, provider: &P) -> ReconcileReport
    where
        P: ContentProvider + ?Sized,
    {
        let events: Vec<ChangeEvent> = self.inbox.borrow_mut().drain(..).collect();
        if events.is_empty() {
            return ReconcileReport::default();
        }
        self.snapshot = provider.snapshot();

        let text_changes = events
            .iter()
            .filter(|e| !matches!(e.change, Change::Viewport(_)))
            .count();
        let report = if text_changes > 1 {
            log::debug!("Coalescing {text_changes} edits into one re-resolution");
            reconcile::reconcile(&mut self.coordinator, &Change::FullReplace, &self.snapshot)
        } else {
            let mut report = ReconcileReport::default();
            for event in &events {
                let step = reconcile::reconcile(&mut self.coordinator, &event.change, &self.snapshot);
                report.shifted.extend(step.shifted);
                report.stale.extend(step.stale);
            }
            report
        };

        self.dirty |= !report.is_noop();
        report
    }

    /// Hands out resolution jobs for every stale layer, for hosts that run
    /// resolution outside the session. Completing a job after a later edit
    /// is a no-op.
    pub fn begin_resolutions(&mut self) -> Vec<ResolutionJob> {
        self.coordinator
            .stale_layers()
            .into_iter()
            .filter_map(|id| self.coordinator.begin_resolution(id, &self.snapshot))
            .collect()
    }

    pub fn complete_resolution(&mut self, result: ResolutionResult) -> Completion {
        let completion = self.coordinator.complete_resolution(result);
        if let Completion::Applied { .. } = completion {
            self.dirty = true;
        }
        completion
    }

    /// Resolves every stale layer against the current snapshot. Returns the
    /// number of layers resolved.
    pub fn settle(&mut self) -> usize {
        let mut applied = 0;
        for job in self.begin_resolutions() {
            let result = job.run();
            if let Completion::Applied { .. } = self.complete_resolution(result) {
                applied += 1;
            }
        }
        applied
    }

    /// The composite decorations as of the last settle.
    pub fn decorations(&self) -> Vec<Decoration> {
        self.coordinator.composite()
    }

    /// Settles and paints if anything changed since the last paint.
    pub fn render<H>(&mut self, host: &mut H) -> bool
    where
        H: RenderHost + ?Sized,
    {
        self.settle();
        if !self.dirty {
            return false;
        }
        let decorations = self.coordinator.composite();
        log::trace!(
            "Painting {} decorations at version {}",
            decorations.len(),
            self.snapshot.version()
        );
        host.paint(&decorations);
        self.dirty = false;
        true
    }

    /// Handles a click at `offset` on the topmost visible decoration there.
    pub fn activate<P>(&mut self, provider: &mut P, offset: usize) -> Result<Activation, MutationError>
    where
        P: ContentProvider + ?Sized,
    {
        self.sync(&*provider);
        self.settle();

        let Some((layer, range)) = self.coordinator.hit_test(offset) else {
            return Ok(Activation::Nothing);
        };
        let (action, span, meta) = (layer.style().action, range.span, range.meta.clone());
        match action {
            ClickAction::None => Ok(Activation::Nothing),
            ClickAction::Inspect => Ok(Activation::Inspect { range: span, meta }),
            ClickAction::ConvertToLink => {
                let patch = self.convert_to_link(provider, span)?;
                Ok(Activation::Converted { range: span, patch })
            }
        }
    }

    /// Wraps `range` of the current text as a wiki link and reconciles the
    /// resulting edit.
    pub fn convert_to_link<P>(&mut self, provider: &mut P, range: Span) -> Result<Patch, MutationError>
    where
        P: ContentProvider + ?Sized,
    {
        let patch = mutation::convert_to_link(provider, range)?;
        self.sync(&*provider);
        Ok(patch)
    }

    /// Starts a suggestion request for `layer`, superseding any earlier one.
    pub fn request_suggestions(&mut self, layer: LayerId) -> Option<SuggestionRequest> {
        self.coordinator.layer(layer)?;
        let seq = self.next_suggestion;
        self.next_suggestion += 1;
        self.pending_suggestions.insert(layer, seq);
        Some(SuggestionRequest {
            ticket: SuggestionTicket { layer, seq },
            text: self.snapshot.text().to_string(),
        })
    }

    /// Applies a suggestion source's answer to the ticket's layer.
    ///
    /// A malformed answer leaves the layer's spans as they were and reports
    /// the failure. The ticket is spent either way.
    pub fn accept_suggestions(
        &mut self,
        ticket: SuggestionTicket,
        response: &str,
    ) -> Result<SuggestionOutcome, SuggestionError> {
        if self.pending_suggestions.get(&ticket.layer) != Some(&ticket.seq) {
            log::trace!("Dropping superseded suggestions for layer {:?}", ticket.layer);
            return Ok(SuggestionOutcome::Superseded);
        }
        self.pending_suggestions.remove(&ticket.layer);

        let suggestions = suggestions::parse(response).inspect_err(|e| {
            log::warn!("Ignoring suggestions for layer {:?}: {e}", ticket.layer);
        })?;
        let spans = suggestions.into_spans(self.open_ended_sections);
        let count = spans.len();
        self.set_spans(ticket.layer, spans);
        Ok(SuggestionOutcome::Applied { spans: count })
    }
}

impl std::fmt::Debug for AnnotationSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnnotationSession")
            .field("version", &self.snapshot.version())
            .field("attached", &self.listener.is_some())
            .field("dirty", &self.dirty)
            .field("layers", &self.coordinator.layers().count())
            .finish()
    }
}
