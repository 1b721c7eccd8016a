use markdown_linker_engine::{
    Activation, AnnotationSession, ContentProvider, Decoration, DecorationKind, Document, LayerId,
    LayerStyle, LogicalSpan, RenderHost, Span, SuggestionOutcome,
};
use pretty_assertions::assert_eq;
use rstest::rstest;

const LINK_CANDIDATES: [&str; 12] = [
    "Project", "Task", "Meeting", "Document", "Note", "Person", "Team", "Goal", "HCAI",
    "Milestone", "Deadline", "serves",
];

const SECTION_RESPONSE: &str = r####"Here are the sections I found:
```json
{"suggestions": [
  {"section_start": "### Workflow", "section_end": "Done evolving.",
   "title": "Workflow", "reason": "Procedure"}
]}
```"####;

/// Keeps the last frame as readable text, one decoration per line.
#[derive(Default)]
struct TextHost {
    text: String,
    frame: Vec<String>,
    paints: usize,
}

impl RenderHost for TextHost {
    fn paint(&mut self, decorations: &[Decoration]) {
        self.paints += 1;
        self.frame = decorations.iter().map(|d| self.describe(d)).collect();
    }
}

impl TextHost {
    fn describe(&self, d: &Decoration) -> String {
        match d.kind {
            DecorationKind::Mark => format!(
                "{}..{} {} {}",
                d.span.start,
                d.span.end,
                d.class,
                &self.text[d.span.start..d.span.end]
            ),
            DecorationKind::Line => {
                let line_of = |offset: usize| self.text[..offset].matches('\n').count();
                let meta = d
                    .meta
                    .as_ref()
                    .map(|m| format!(" {}: {}", m.title, m.reason))
                    .unwrap_or_default();
                format!(
                    "{}..{} {} lines {}..={}{}",
                    d.span.start,
                    d.span.end,
                    d.class,
                    line_of(d.span.start),
                    line_of(d.span.end),
                    meta
                )
            }
        }
    }

    fn render(&mut self, session: &mut AnnotationSession, doc: &Document) -> String {
        self.text = doc.text();
        session.render(self);
        self.frame.join("\n")
    }
}

fn fixture(name: &str) -> String {
    std::fs::read_to_string(format!(
        "{}/tests/fixtures/{name}.md",
        env!("CARGO_MANIFEST_DIR")
    ))
    .unwrap()
}

fn open_with_layers(text: &str) -> (Document, AnnotationSession, LayerId, LayerId) {
    let mut doc = Document::new(text);
    let mut session = AnnotationSession::attach(&mut doc);
    // Underlines register last so they paint, and take clicks, above sections.
    let sections = session.register_layer("sections", LayerStyle::sections());
    let links = session.register_layer("links", LayerStyle::link_candidates());
    session.set_spans(links, vec![LogicalSpan::phrases(LINK_CANDIDATES)]);
    (doc, session, links, sections)
}

#[test]
fn team_notes_highlights_then_converts() {
    let (mut doc, mut session, _, sections) = open_with_layers(&fixture("team_notes"));
    let mut host = TextHost::default();

    let request = session.request_suggestions(sections).unwrap();
    assert_eq!(
        session.accept_suggestions(request.ticket, SECTION_RESPONSE).unwrap(),
        SuggestionOutcome::Applied { spans: 1 }
    );

    insta::assert_snapshot!(host.render(&mut session, &doc), @r"
    2..6 cm-underline Team
    14..100 section-highlight lines 2..=5 Workflow: Procedure
    32..39 cm-underline Project
    46..50 cm-underline Task
    129..133 cm-underline Note
    ");

    let activation = session.activate(&mut doc, 47).unwrap();
    assert!(matches!(activation, Activation::Converted { range, .. } if range == Span::new(46, 50)));

    insta::assert_snapshot!(host.render(&mut session, &doc), @r"
    2..6 cm-underline Team
    14..104 section-highlight lines 2..=5 Workflow: Procedure
    32..39 cm-underline Project
    133..137 cm-underline Note
    ");
    assert!(doc.text().contains("a [[Task]] list."));
    assert_eq!(host.paints, 2);
}

#[test]
fn inspecting_a_section_reports_its_reason() {
    let (mut doc, mut session, _, sections) = open_with_layers(&fixture("team_notes"));
    let request = session.request_suggestions(sections).unwrap();
    session.accept_suggestions(request.ticket, SECTION_RESPONSE).unwrap();

    // "Done evolving." has no link candidate, so the section is topmost.
    let Activation::Inspect { range, meta } = session.activate(&mut doc, 90).unwrap() else {
        panic!("expected the section to be inspected");
    };
    assert_eq!(range, Span::new(14, 100));
    assert_eq!(meta.unwrap().reason, "Procedure");
    assert_eq!(doc.version(), 0);
}

#[test]
fn hiding_highlights_keeps_ranges() {
    let (doc, mut session, links, _) = open_with_layers("A Task and a Goal");
    let mut host = TextHost::default();
    assert_eq!(host.render(&mut session, &doc).lines().count(), 2);

    session.set_all_suspended(true);
    assert_eq!(host.render(&mut session, &doc), "");
    assert_eq!(session.coordinator().layer(links).unwrap().ranges().len(), 2);

    session.set_all_suspended(false);
    assert_eq!(host.render(&mut session, &doc).lines().count(), 2);
}

#[rstest]
#[case::newest_first(true)]
#[case::oldest_first(false)]
fn only_the_latest_resolution_is_visible(#[case] newest_first: bool) {
    let (mut doc, mut session, links, _) = open_with_layers("Task one");
    session.settle();

    doc.write(Span::new(0, 0), "xx ").unwrap();
    session.sync(&doc);
    let r1 = session.begin_resolutions().remove(0);

    doc.write(Span::new(0, 0), "yy ").unwrap();
    session.sync(&doc);
    let r2 = session.begin_resolutions().remove(0);

    let (first, second) = if newest_first { (r2, r1) } else { (r1, r2) };
    session.complete_resolution(first.run());
    session.complete_resolution(second.run());

    let spans: Vec<_> = session
        .coordinator()
        .layer(links)
        .unwrap()
        .ranges()
        .iter()
        .map(|r| r.span)
        .collect();
    assert_eq!(spans, vec![Span::new(6, 10)]);
    assert_eq!(doc.text(), "yy xx Task one");
}

#[test]
fn layers_never_overlap_internally() {
    let text = "New York City. Project Task Project-Task. [[Task]] new york";
    let mut doc = Document::new(text);
    let mut session = AnnotationSession::attach(&mut doc);
    let links = session.register_layer("links", LayerStyle::link_candidates());
    session.set_spans(
        links,
        vec![
            LogicalSpan::phrases(["New York", "York City", "New"]),
            LogicalSpan::phrases(["Project Task", "Task"]),
            LogicalSpan::phrases(["Task Project"]),
        ],
    );
    session.settle();

    let ranges = session.coordinator().layer(links).unwrap().ranges();
    assert!(ranges.is_well_formed(text.len()));
    let found: Vec<_> = ranges.iter().map(|r| &text[r.from()..r.to()]).collect();
    assert_eq!(
        found,
        vec!["New York", "Project Task", "Task", "new york"]
    );
}

#[test]
fn detached_session_ignores_later_edits() {
    let (mut doc, mut session, _, _) = open_with_layers("Task");
    session.settle();
    session.detach(&mut doc);

    doc.write(Span::new(0, 0), "Goal ").unwrap();

    assert_eq!(doc.listener_count(), 0);
    assert!(session.sync(&doc).is_noop());
    assert!(session.decorations().is_empty());
}
