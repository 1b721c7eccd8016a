use crate::document::DocumentSnapshot;
use crate::span::Span;

/// Finds the line range opened by `start_marker` and closed by `end_marker`.
///
/// The range starts at the beginning of the first line containing
/// `start_marker` and ends at the end of the first line, at or after it,
/// containing `end_marker`. Without a closing line the span only resolves
/// when `open_ended` is set, in which case it runs to the end of the text.
/// Empty markers never resolve.
pub fn resolve_markers(
    snapshot: &DocumentSnapshot,
    start_marker: &str,
    end_marker: &str,
    open_ended: bool,
) -> Option<Span> {
    if start_marker.is_empty() || end_marker.is_empty() {
        return None;
    }

    let mut start = None;
    for line in snapshot.lines() {
        if start.is_none() && line.text.contains(start_marker) {
            start = Some(line.span.start);
        }
        if let Some(from) = start
            && line.text.contains(end_marker)
        {
            return Some(Span::new(from, line.span.end));
        }
    }

    match start {
        Some(from) if open_ended && from < snapshot.len() => Some(Span::new(from, snapshot.len())),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn snap(lines: &[&str]) -> DocumentSnapshot {
        DocumentSnapshot::new(0, lines.join("\n"))
    }

    #[test]
    fn workflow_section_covers_all_four_lines() {
        let doc = snap(&["### Workflow", "step one", "step two", "Done evolving."]);
        let span = resolve_markers(&doc, "### Workflow", "Done evolving.", false);
        assert_eq!(span, Some(Span::new(0, doc.len())));
    }

    #[test]
    fn range_starts_at_line_start_and_ends_at_line_end() {
        let doc = snap(&["intro", "a **Hufflepuff** was one", "middle", "loyal in its members!", "outro"]);
        let span = resolve_markers(&doc, "**Hufflepuff** was one", "in its members", false).unwrap();
        assert_eq!(
            doc.slice(span),
            Some("a **Hufflepuff** was one\nmiddle\nloyal in its members!")
        );
    }

    #[test]
    fn end_marker_before_start_is_ignored() {
        let doc = snap(&["END", "START", "body", "END"]);
        let span = resolve_markers(&doc, "START", "END", false).unwrap();
        assert_eq!(doc.slice(span), Some("START\nbody\nEND"));
    }

    #[test]
    fn single_line_section() {
        let doc = snap(&["before", "START and END together", "after"]);
        let span = resolve_markers(&doc, "START", "END", false).unwrap();
        assert_eq!(doc.slice(span), Some("START and END together"));
    }

    #[test]
    fn first_end_marker_wins() {
        let doc = snap(&["START", "END one", "END two"]);
        let span = resolve_markers(&doc, "START", "END", false).unwrap();
        assert_eq!(doc.slice(span), Some("START\nEND one"));
    }

    #[test]
    fn missing_end_marker_is_unresolved() {
        let doc = snap(&["START", "body"]);
        assert_eq!(resolve_markers(&doc, "START", "END", false), None);
    }

    #[test]
    fn missing_end_marker_runs_to_eof_when_open_ended() {
        let doc = snap(&["intro", "START", "body"]);
        let span = resolve_markers(&doc, "START", "END", true).unwrap();
        assert_eq!(doc.slice(span), Some("START\nbody"));
    }

    #[test]
    fn missing_start_marker_is_unresolved() {
        let doc = snap(&["body", "END"]);
        assert_eq!(resolve_markers(&doc, "START", "END", true), None);
    }

    #[test]
    fn empty_markers_never_resolve() {
        let doc = snap(&["anything"]);
        assert_eq!(resolve_markers(&doc, "", "anything", true), None);
        assert_eq!(resolve_markers(&doc, "anything", "", true), None);
    }

    #[test]
    fn crlf_lines_exclude_terminator() {
        let doc = DocumentSnapshot::new(0, "START\r\nEND\r\nafter");
        let span = resolve_markers(&doc, "START", "END", false).unwrap();
        assert_eq!(span, Span::new(0, 10));
    }
}
