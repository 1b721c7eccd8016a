use xi_rope::Rope;

use crate::span::Span;

/// A `(line, column)` position. Both are 0-based; the column counts bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Pos {
    pub line: usize,
    pub column: usize,
}

impl Pos {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

/// A reference to a single line of a snapshot.
#[derive(Debug, Clone, Copy)]
pub struct LineRef<'a> {
    /// 0-based line number.
    pub index: usize,
    /// Byte span of the line content, excluding the `\n` or `\r\n` terminator.
    pub span: Span,
    pub text: &'a str,
}

/// Line-start table for one text snapshot.
///
/// Built once in O(n); offset lookups are a binary search over line starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineIndex {
    lines: Vec<Span>,
    len: usize,
}

impl LineIndex {
    pub fn new(text: &str) -> Self {
        let mut lines = Vec::new();
        let mut start = 0;
        for (i, b) in text.bytes().enumerate() {
            if b == b'\n' {
                let end = if i > start && text.as_bytes()[i - 1] == b'\r' {
                    i - 1
                } else {
                    i
                };
                lines.push(Span { start, end });
                start = i + 1;
            }
        }
        // Text after the last newline is always a line, possibly empty.
        lines.push(Span {
            start,
            end: text.len(),
        });

        Self {
            lines,
            len: text.len(),
        }
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// Content span of a line, excluding its terminator.
    pub fn line_span(&self, line: usize) -> Option<Span> {
        self.lines.get(line).copied()
    }

    pub fn line_start(&self, line: usize) -> Option<usize> {
        self.lines.get(line).map(|sp| sp.start)
    }

    /// Returns the line containing `offset`. Offsets inside a terminator
    /// belong to the line they terminate.
    pub fn line_of(&self, offset: usize) -> usize {
        self.lines
            .partition_point(|sp| sp.start <= offset)
            .saturating_sub(1)
    }

    pub fn pos_to_offset(&self, pos: Pos) -> Option<usize> {
        let line = self.lines.get(pos.line)?;
        let offset = line.start + pos.column;
        (offset <= line.end).then_some(offset)
    }

    pub fn offset_to_pos(&self, offset: usize) -> Option<Pos> {
        if offset > self.len {
            return None;
        }
        let line = self.line_of(offset);
        let start = self.lines[line].start;
        Some(Pos {
            line,
            column: offset - start,
        })
    }
}

/// An immutable view of the document text at one version.
///
/// The engine derives every resolved range from a snapshot and never
/// mutates it; edits produce a new snapshot with a higher version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentSnapshot {
    version: u64,
    text: String,
    lines: LineIndex,
}

impl DocumentSnapshot {
    pub fn new(version: u64, text: impl Into<String>) -> Self {
        let text = text.into();
        let lines = LineIndex::new(&text);
        Self {
            version,
            text,
            lines,
        }
    }

    pub fn from_rope(version: u64, rope: &Rope) -> Self {
        Self::new(version, rope.to_string())
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn len(&self) -> usize {
        self.text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    pub fn line_index(&self) -> &LineIndex {
        &self.lines
    }

    /// Slices the text, returning `None` for spans that are out of bounds
    /// or do not fall on UTF-8 character boundaries.
    pub fn slice(&self, span: Span) -> Option<&str> {
        self.text.get(span.start..span.end)
    }

    /// Iterates over all lines with their content spans.
    pub fn lines(&self) -> impl Iterator<Item = LineRef<'_>> + '_ {
        self.lines
            .lines
            .iter()
            .enumerate()
            .map(move |(index, &span)| LineRef {
                index,
                span,
                text: &self.text[span.start..span.end],
            })
    }

    /// Lines whose content (or terminator) intersects `span`.
    pub fn lines_touching(&self, span: Span) -> impl Iterator<Item = LineRef<'_>> + '_ {
        let first = self.lines.line_of(span.start);
        let last = self.lines.line_of(span.end);
        self.lines().skip(first).take(last + 1 - first)
    }
}
