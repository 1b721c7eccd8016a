use anyhow::{Context, Result};
use markdown_linker_config::Config;
use markdown_linker_engine::{
    Activation, AnnotationSession, ContentProvider, Decoration, DecorationKind, Document, LayerId,
    LayerStyle, LogicalSpan, RenderHost, Span, SuggestionOutcome, io,
};
use std::path::{Path, PathBuf};

/// Holds the last painted frame.
#[derive(Debug, Default)]
pub struct Canvas {
    pub decorations: Vec<Decoration>,
}

impl RenderHost for Canvas {
    fn paint(&mut self, decorations: &[Decoration]) {
        self.decorations = decorations.to_vec();
    }
}

/// Which layer a suggestion response file feeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuggestionTarget {
    Links,
    Sections,
}

pub struct App {
    pub path: PathBuf,
    pub document: Document,
    session: AnnotationSession,
    links: LayerId,
    sections: LayerId,
    pub canvas: Canvas,
    /// Byte offset of the cursor.
    pub cursor: usize,
    /// First visible line.
    pub scroll: usize,
    pub highlights: bool,
    pub modified: bool,
    pub status: String,
}

impl App {
    pub fn open(path: PathBuf, config: &Config) -> Result<Self> {
        let document = io::load_document(&path)
            .with_context(|| format!("Failed to open {}", path.display()))?;
        Ok(Self::new(path, document, config))
    }

    pub fn new(path: PathBuf, mut document: Document, config: &Config) -> Self {
        let mut session = AnnotationSession::attach(&mut document);
        session.set_open_ended_sections(config.open_ended_sections);
        // Sections first: underlines paint above them and take clicks.
        let sections = session.register_layer("sections", LayerStyle::sections());
        let links = session.register_layer("links", LayerStyle::link_candidates());
        session.set_spans(links, vec![LogicalSpan::phrases(config.candidate_phrases())]);
        if !config.highlights_enabled {
            session.set_all_suspended(true);
        }

        let mut app = Self {
            path,
            document,
            session,
            links,
            sections,
            canvas: Canvas::default(),
            cursor: 0,
            scroll: 0,
            highlights: config.highlights_enabled,
            modified: false,
            status: String::new(),
        };
        app.refresh();
        app
    }

    /// Reconciles pending changes and repaints the canvas if needed.
    pub fn refresh(&mut self) {
        self.session.sync(&self.document);
        self.session.render(&mut self.canvas);
    }

    /// Feeds a suggestion source's saved response into a layer.
    pub fn load_suggestions(&mut self, target: SuggestionTarget, path: &Path) -> Result<usize> {
        let layer = match target {
            SuggestionTarget::Links => self.links,
            SuggestionTarget::Sections => self.sections,
        };
        let response = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read suggestions from {}", path.display()))?;
        let request = self
            .session
            .request_suggestions(layer)
            .context("Suggestion layer is not registered")?;
        let outcome = self
            .session
            .accept_suggestions(request.ticket, &response)
            .with_context(|| format!("Unusable suggestions in {}", path.display()))?;
        self.refresh();

        match outcome {
            SuggestionOutcome::Applied { spans } => {
                self.status = format!("Loaded {spans} suggestions from {}", path.display());
                Ok(spans)
            }
            SuggestionOutcome::Superseded => Ok(0),
        }
    }

    pub fn decorations(&self) -> &[Decoration] {
        &self.canvas.decorations
    }

    /// Clicks at the cursor.
    pub fn activate(&mut self) {
        match self.session.activate(&mut self.document, self.cursor) {
            Ok(Activation::Converted { range, .. }) => {
                self.modified = true;
                self.status = format!("Linked {}..{}", range.start, range.end);
            }
            Ok(Activation::Inspect { meta: Some(meta), .. }) => {
                self.status = format!("{}: {}", meta.title, meta.reason);
            }
            Ok(Activation::Inspect { meta: None, range }) => {
                self.status = format!("Section {}..{}", range.start, range.end);
            }
            Ok(Activation::Nothing) => {
                self.status = "Nothing to activate here".to_string();
            }
            Err(e) => {
                self.status = format!("Error: {e}");
            }
        }
        self.refresh();
    }

    pub fn toggle_highlights(&mut self) {
        self.highlights = !self.highlights;
        self.session.set_all_suspended(!self.highlights);
        self.status = if self.highlights {
            "Highlights shown".to_string()
        } else {
            "Highlights hidden".to_string()
        };
        self.refresh();
    }

    pub fn save(&mut self) {
        match io::save_document(&self.path, &self.document) {
            Ok(()) => {
                self.modified = false;
                self.status = format!("Saved {}", self.path.display());
            }
            Err(e) => self.status = format!("Error saving: {e}"),
        }
    }

    pub fn move_left(&mut self) {
        let text = self.document.snapshot();
        if let Some(c) = text.text()[..self.cursor].chars().next_back() {
            self.cursor -= c.len_utf8();
        }
    }

    pub fn move_right(&mut self) {
        let text = self.document.snapshot();
        if let Some(c) = text.text()[self.cursor..].chars().next() {
            self.cursor += c.len_utf8();
        }
    }

    /// Moves the cursor `lines` up (negative) or down, keeping the column
    /// where the target line is long enough.
    pub fn move_vertical(&mut self, lines: isize) {
        let snapshot = self.document.snapshot();
        let index = snapshot.line_index();
        let Some(pos) = index.offset_to_pos(self.cursor) else {
            return;
        };
        let last = index.line_count().saturating_sub(1);
        let target = pos.line.saturating_add_signed(lines).min(last);
        let Some(span) = index.line_span(target) else {
            return;
        };
        let mut offset = span.start + pos.column.min(span.len());
        while !snapshot.text().is_char_boundary(offset) {
            offset -= 1;
        }
        self.cursor = offset;
    }

    /// Jumps to the next (or previous) link candidate.
    pub fn jump_to_candidate(&mut self, forward: bool) {
        let mut marks = self
            .canvas
            .decorations
            .iter()
            .filter(|d| d.kind == DecorationKind::Mark)
            .map(|d| d.span.start);
        let target = if forward {
            marks.find(|&start| start > self.cursor)
        } else {
            marks.filter(|&start| start < self.cursor).last()
        };
        match target {
            Some(start) => self.cursor = start,
            None => self.status = "No more link candidates".to_string(),
        }
    }

    pub fn cursor_line(&self) -> usize {
        self.document.snapshot().line_index().line_of(self.cursor)
    }

    /// Scrolls so the cursor line is visible in `height` rows and reports
    /// the visible text as the document viewport.
    pub fn follow_cursor(&mut self, height: usize) {
        let height = height.max(1);
        let line = self.cursor_line();
        if line < self.scroll {
            self.scroll = line;
        } else if line >= self.scroll + height {
            self.scroll = line + 1 - height;
        }

        let snapshot = self.document.snapshot();
        let index = snapshot.line_index();
        let last = (self.scroll + height - 1).min(index.line_count().saturating_sub(1));
        if let (Some(first), Some(end)) = (index.line_span(self.scroll), index.line_span(last)) {
            let viewport = Span::new(first.start, end.end);
            if self.document.viewport() != Some(viewport) {
                self.document.set_viewport(viewport);
                self.refresh();
            }
        }
    }
}
