use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Paragraph, Scrollbar, ScrollbarOrientation, ScrollbarState, Wrap};
use ratatui::Frame;

use crate::ansi::{StyledSegment, TextStyle};
use crate::search::SearchMatch;
use crate::session::LogSession;
use crate::ui::log_line::{split_runs, Highlight};

use super::super::state::ViewerState;
use super::super::view_model::{wrapped_rows, LogViewModel};
use super::header::panel_block;

const SPINNER_FRAMES: [&str; 10] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

pub(super) fn render_log_pane(
    frame: &mut Frame<'_>,
    area: Rect,
    session: &LogSession,
    state: &ViewerState,
    view: &LogViewModel,
) {
    let output_height = area.height.saturating_sub(2) as usize;
    let output_width = area.width.saturating_sub(2) as usize;
    let search = session.search();
    let stored = session.store().lines();
    let visible = search.visible_lines(stored.len());
    let current = search.current_match();

    if visible.is_empty() {
        let placeholder = if stored.is_empty() && session.is_running() {
            let spinner = SPINNER_FRAMES[state.spinner_tick % SPINNER_FRAMES.len()];
            Line::from(vec![
                Span::styled(spinner, Style::default().fg(Color::Yellow)),
                Span::styled(
                    " waiting for first output...",
                    Style::default().fg(Color::DarkGray),
                ),
            ])
        } else if search.is_grep_active() {
            Line::from(Span::styled(
                format!("no lines match `{}`", search.query()),
                Style::default().fg(Color::DarkGray),
            ))
        } else {
            Line::from(Span::styled(
                "no output",
                Style::default().fg(Color::DarkGray),
            ))
        };
        frame.render_widget(
            Paragraph::new(placeholder).block(panel_block(None, false)),
            area,
        );
        return;
    }

    let mut lines = Vec::with_capacity(output_height);
    let mut used_rows = 0usize;
    let mut position = view.scroll_offset;
    while used_rows < output_height {
        let Some(line) = visible
            .get(position)
            .and_then(|sequence| stored.get(sequence))
        else {
            break;
        };
        lines.push(log_line(
            &line.segments,
            search.matches_in_line(line.sequence),
            current,
        ));
        used_rows += if state.wrap {
            wrapped_rows(&line.plain_text, output_width)
        } else {
            1
        };
        position += 1;
    }

    let mut logs = Paragraph::new(lines).block(panel_block(None, false));
    if state.wrap {
        logs = logs.wrap(Wrap { trim: false });
    }
    frame.render_widget(logs, area);

    let mut scrollbar_state = ScrollbarState::new(view.scrollbar_total.max(1))
        .viewport_content_length(output_height.max(1))
        .position(view.scroll_offset.min(view.max_offset));
    frame.render_stateful_widget(
        Scrollbar::default().orientation(ScrollbarOrientation::VerticalRight),
        area,
        &mut scrollbar_state,
    );
}

fn log_line<'a>(
    segments: &'a [StyledSegment],
    matches: &[SearchMatch],
    current: Option<SearchMatch>,
) -> Line<'a> {
    Line::from(
        split_runs(segments, matches, current)
            .into_iter()
            .map(|run| Span::styled(run.text, span_style(&run.style, run.highlight)))
            .collect::<Vec<Span<'a>>>(),
    )
}

fn span_style(style: &TextStyle, highlight: Highlight) -> Style {
    let mut rendered = Style::default().fg(style.foreground);
    if let Some(background) = style.background {
        rendered = rendered.bg(background);
    }
    if style.bold {
        rendered = rendered.add_modifier(Modifier::BOLD);
    }
    if style.italic {
        rendered = rendered.add_modifier(Modifier::ITALIC);
    }
    match highlight {
        Highlight::None => rendered,
        Highlight::Match => rendered.fg(Color::Black).bg(Color::Yellow),
        Highlight::Current => rendered
            .fg(Color::Black)
            .bg(Color::LightRed)
            .add_modifier(Modifier::BOLD),
    }
}

pub(super) fn render_query_pane(frame: &mut Frame<'_>, area: Rect, query: &str) {
    let spans = vec![
        Span::styled("/ ", Style::default().fg(Color::Yellow)),
        Span::styled(query.to_owned(), Style::default().fg(Color::Gray)),
        Span::styled("▏", Style::default().fg(Color::Yellow)),
    ];
    let input = Paragraph::new(Line::from(spans)).block(panel_block(
        Some(" Search (Esc browse, Enter next match) "),
        false,
    ));
    frame.render_widget(input, area);
}
