//! # Document
//!
//! The content provider side of the engine: an xi-rope text buffer that
//! applies edits as deltas, hands out immutable [`DocumentSnapshot`]s and
//! notifies registered listeners of every change.
//!
//! The annotation engine only ever *reads* snapshots. The single writer is
//! the mutation bridge, which goes through [`ContentProvider::write`] like
//! any other edit so the change notification reaches every listener.

pub mod edit;
pub mod snapshot;

use std::sync::Arc;

use xi_rope::delta::Builder;
use xi_rope::{Delta, Rope, RopeInfo};

pub use edit::{EditDelta, EditError, Patch};
pub use snapshot::{DocumentSnapshot, LineIndex, LineRef, Pos};

use crate::span::Span;

/// What changed in the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Change {
    /// A contiguous edit at a known range.
    Edit(EditDelta),
    /// The whole text was replaced (file reload, external write).
    FullReplace,
    /// Only the visible window moved; the text is unchanged.
    Viewport(Span),
}

/// A change notification delivered to listeners.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChangeEvent {
    /// Document version after the change.
    pub version: u64,
    pub change: Change,
}

/// Handle returned by [`ContentProvider::on_change`], used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(pub u64);

pub type ChangeListener = Box<dyn FnMut(&ChangeEvent)>;

/// The host's view of a live document.
pub trait ContentProvider {
    /// Full current text.
    fn read(&self) -> String;

    /// Current text as an immutable snapshot.
    fn snapshot(&self) -> Arc<DocumentSnapshot>;

    /// Replaces `range` with `text` as one atomic edit.
    fn write(&mut self, range: Span, text: &str) -> Result<Patch, EditError>;

    fn on_change(&mut self, listener: ChangeListener) -> ListenerId;

    /// Returns false if the listener was not registered.
    fn remove_listener(&mut self, id: ListenerId) -> bool;

    fn pos_to_offset(&self, pos: Pos) -> Option<usize>;

    fn offset_to_pos(&self, offset: usize) -> Option<Pos>;
}

/// Rope-backed document.
///
/// - **Lossless storage**: `text()` returns exactly what was loaded plus edits
/// - **Delta edits**: every write compiles to an xi-rope `Delta`
/// - **Version counter**: incremented on each text change, never on viewport moves
pub struct Document {
    buffer: Rope,
    version: u64,
    viewport: Option<Span>,
    listeners: Vec<(ListenerId, ChangeListener)>,
    next_listener: u64,
    /// Cached snapshot of the current version.
    snapshot: Arc<DocumentSnapshot>,
}

impl Document {
    pub fn new(text: &str) -> Self {
        let buffer = Rope::from(text);
        let snapshot = Arc::new(DocumentSnapshot::from_rope(0, &buffer));
        Self {
            buffer,
            version: 0,
            viewport: None,
            listeners: Vec::new(),
            next_listener: 0,
            snapshot,
        }
    }

    /// Create a new document from raw bytes
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, std::str::Utf8Error> {
        let text = std::str::from_utf8(bytes)?;
        Ok(Self::new(text))
    }

    /// Get the document's content as raw bytes (exact round-trip)
    pub fn to_bytes(&self) -> Vec<u8> {
        self.buffer.to_string().into_bytes()
    }

    pub fn text(&self) -> String {
        self.buffer.to_string()
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn viewport(&self) -> Option<Span> {
        self.viewport
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Replaces the whole text, e.g. after reloading the file from disk.
    pub fn replace_all(&mut self, text: &str) {
        self.buffer = Rope::from(text);
        self.commit(Change::FullReplace);
    }

    /// Records a viewport move. The text and version are unchanged.
    pub fn set_viewport(&mut self, viewport: Span) {
        self.viewport = Some(viewport);
        self.notify(ChangeEvent {
            version: self.version,
            change: Change::Viewport(viewport),
        });
    }

    fn compile_replace(&self, range: Span, text: &str) -> Result<Delta<RopeInfo>, EditError> {
        let len = self.buffer.len();
        if range.start > range.end || range.end > len {
            return Err(EditError::OutOfBounds {
                start: range.start,
                end: range.end,
                len,
            });
        }
        let current = self.snapshot.text();
        for offset in [range.start, range.end] {
            if !current.is_char_boundary(offset) {
                return Err(EditError::NotCharBoundary { offset });
            }
        }

        let mut builder = Builder::new(len);
        builder.replace(range.start..range.end, Rope::from(text));
        Ok(builder.build())
    }

    fn commit(&mut self, change: Change) {
        self.version += 1;
        self.snapshot = Arc::new(DocumentSnapshot::from_rope(self.version, &self.buffer));
        self.notify(ChangeEvent {
            version: self.version,
            change,
        });
    }

    fn notify(&mut self, event: ChangeEvent) {
        for (_, listener) in &mut self.listeners {
            listener(&event);
        }
    }
}

impl ContentProvider for Document {
    fn read(&self) -> String {
        self.text()
    }

    fn snapshot(&self) -> Arc<DocumentSnapshot> {
        Arc::clone(&self.snapshot)
    }

    fn write(&mut self, range: Span, text: &str) -> Result<Patch, EditError> {
        let delta = self.compile_replace(range, text)?;
        let edit = match EditDelta::from_delta(&delta) {
            Some(edit) => {
                self.buffer = delta.apply(&self.buffer);
                edit
            }
            // An empty insertion still commits so listeners observe the write.
            None => EditDelta::replacement(range, text.len()),
        };
        self.commit(Change::Edit(edit));

        Ok(Patch {
            delta: edit,
            version: self.version,
        })
    }

    fn on_change(&mut self, listener: ChangeListener) -> ListenerId {
        let id = ListenerId(self.next_listener);
        self.next_listener += 1;
        self.listeners.push((id, listener));
        id
    }

    fn remove_listener(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(lid, _)| *lid != id);
        self.listeners.len() != before
    }

    fn pos_to_offset(&self, pos: Pos) -> Option<usize> {
        self.snapshot.line_index().pos_to_offset(pos)
    }

    fn offset_to_pos(&self, offset: usize) -> Option<Pos> {
        self.snapshot.line_index().offset_to_pos(offset)
    }
}

impl std::fmt::Debug for Document {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Document")
            .field("version", &self.version)
            .field("len", &self.buffer.len())
            .field("viewport", &self.viewport)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}
