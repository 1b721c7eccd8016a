pub mod anchor;
pub mod document;
pub mod io;
pub mod layers;
pub mod links;
pub mod mutation;
pub mod range_set;
pub mod reconcile;
pub mod session;
pub mod span;
pub mod suggestions;

// Re-export key types for easier usage
pub use anchor::{LogicalSpan, RangeMeta, ResolvedRange, SectionBoundary};
pub use document::{
    Change, ChangeEvent, ContentProvider, Document, DocumentSnapshot, EditDelta, EditError, Patch,
    Pos,
};
pub use io::*;
pub use layers::{
    ClickAction, Decoration, DecorationKind, LayerCoordinator, LayerId, LayerState, LayerStyle,
};
pub use mutation::{MutationError, TextEdit};
pub use range_set::RangeSet;
pub use session::{
    Activation, AnnotationSession, RenderHost, SuggestionOutcome, SuggestionRequest,
    SuggestionTicket,
};
pub use span::Span;
pub use suggestions::{SuggestionError, Suggestions};
