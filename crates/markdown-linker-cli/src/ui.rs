use markdown_linker_engine::{ContentProvider, Decoration, DecorationKind, DocumentSnapshot};
use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
};

use crate::app::App;

const SECTION_STYLE: Style = Style::new().bg(Color::DarkGray);
const CANDIDATE_STYLE: Style = Style::new().fg(Color::Cyan).add_modifier(Modifier::UNDERLINED);
const CURSOR_STYLE: Style = Style::new().add_modifier(Modifier::REVERSED);

pub fn ui(f: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([Constraint::Min(0), Constraint::Length(3)].as_ref())
        .split(f.area());

    // Content panel, minus its borders
    app.follow_cursor(chunks[0].height.saturating_sub(2) as usize);

    let snapshot = app.document.snapshot();
    let lines = styled_lines(&snapshot, app.decorations(), app.cursor);
    let title = format!(
        "{}{}",
        app.path.display(),
        if app.modified { " [+]" } else { "" }
    );
    let content = Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL).title(title))
        .scroll((u16::try_from(app.scroll).unwrap_or(u16::MAX), 0));
    f.render_widget(content, chunks[0]);

    let help_text = Line::from(vec![
        Span::raw("q: Quit | "),
        Span::raw("←↑↓→: Move | "),
        Span::raw("n/p: Next/Prev candidate | "),
        Span::raw("Enter: Link/Inspect | "),
        Span::raw("t: Toggle highlights | "),
        Span::raw("s: Save"),
    ]);
    let status = Paragraph::new(vec![Line::from(app.status.clone()), help_text])
        .block(Block::default());
    f.render_widget(status, chunks[1]);
}

/// One styled line per document line. Section lines get a background,
/// link candidates an underline, and the cursor is drawn reversed.
pub fn styled_lines(
    snapshot: &DocumentSnapshot,
    decorations: &[Decoration],
    cursor: usize,
) -> Vec<Line<'static>> {
    snapshot
        .lines()
        .map(|line| {
            let start = line.span.start;
            let end = line.span.end;
            let in_section = decorations.iter().any(|d| {
                d.kind == DecorationKind::Line && d.span.start <= end && start < d.span.end
            });
            let base = if in_section { SECTION_STYLE } else { Style::new() };
            let marks: Vec<_> = decorations
                .iter()
                .filter(|d| d.kind == DecorationKind::Mark && d.span.start < end && start < d.span.end)
                .map(|d| d.span)
                .collect();

            let mut spans: Vec<Span<'static>> = Vec::new();
            let mut run = String::new();
            let mut run_style = base;
            for (i, c) in line.text.char_indices() {
                let offset = start + i;
                let mut style = base;
                if marks.iter().any(|m| m.contains(offset)) {
                    style = style.patch(CANDIDATE_STYLE);
                }
                if offset == cursor {
                    style = style.patch(CURSOR_STYLE);
                }
                if style != run_style && !run.is_empty() {
                    spans.push(Span::styled(std::mem::take(&mut run), run_style));
                }
                run_style = style;
                run.push(c);
            }
            if !run.is_empty() {
                spans.push(Span::styled(run, run_style));
            }
            if cursor == end {
                spans.push(Span::styled(" ", base.patch(CURSOR_STYLE)));
            }
            Line::from(spans).style(base)
        })
        .collect()
}
