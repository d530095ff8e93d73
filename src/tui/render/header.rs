use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::symbols::border;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::Frame;

use crate::capture::CaptureState;
use crate::session::LogSession;

const SPINNER_FRAMES: [&str; 10] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

pub(super) fn render_header(
    frame: &mut Frame<'_>,
    area: Rect,
    session: &LogSession,
    spinner_tick: usize,
) {
    let muted = Style::default().fg(Color::DarkGray);
    let separator = || Span::styled("  │  ", muted);

    let mut spans = vec![status_span(session, spinner_tick)];
    spans.push(separator());
    spans.push(Span::styled(
        format!("lines {}", session.store().len()),
        Style::default().fg(Color::Gray),
    ));
    spans.push(separator());
    spans.push(Span::styled(
        format!("noise {}", session.dropped_noise()),
        muted,
    ));

    let search = session.search();
    if !search.query().is_empty() {
        let (current, total) = search.counter();
        spans.push(separator());
        spans.push(Span::styled(
            format!("/{}", search.query()),
            Style::default().fg(Color::Yellow),
        ));
        spans.push(Span::styled(
            format!(" {current}/{total}"),
            Style::default()
                .fg(if total == 0 { Color::Red } else { Color::Gray })
                .add_modifier(Modifier::BOLD),
        ));
        if search.case_sensitive() {
            spans.push(Span::styled(" [case]", muted));
        }
        if search.grep_mode() {
            spans.push(Span::styled(" [grep]", muted));
        }
    }

    if let Some(launch) = session.launch() {
        spans.push(separator());
        spans.push(Span::styled(launch.display_command(), muted));
    }

    let header = Paragraph::new(Line::from(spans)).block(panel_block(Some(" PIDVIEW "), true));
    frame.render_widget(header, area);
}

fn status_span(session: &LogSession, spinner_tick: usize) -> Span<'static> {
    if session.is_restart_pending() {
        let spinner = SPINNER_FRAMES[spinner_tick % SPINNER_FRAMES.len()];
        return Span::styled(
            format!("{spinner} restarting"),
            Style::default().fg(Color::Yellow),
        );
    }
    match session.capture_state() {
        CaptureState::Running => {
            let source = session
                .source_kind()
                .map(|kind| kind.label())
                .unwrap_or("?");
            let pid = session
                .pid()
                .map(|pid| format!(" pid {pid}"))
                .unwrap_or_default();
            Span::styled(
                format!("● running{pid} ({source})"),
                Style::default()
                    .fg(Color::Green)
                    .add_modifier(Modifier::BOLD),
            )
        }
        CaptureState::Stopping => {
            Span::styled("◌ stopping", Style::default().fg(Color::Yellow))
        }
        CaptureState::Idle | CaptureState::Stopped => match session.last_termination() {
            Some(termination) if termination.abnormal => Span::styled(
                format!("✗ {}", termination.diagnostic),
                Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
            ),
            Some(termination) => Span::styled(
                format!("○ {}", termination.diagnostic),
                Style::default().fg(Color::Gray),
            ),
            None => Span::styled("○ idle", Style::default().fg(Color::DarkGray)),
        },
    }
}

pub(super) fn panel_block<'a>(title: Option<&'a str>, show_version: bool) -> Block<'a> {
    let mut block = Block::default()
        .borders(Borders::ALL)
        .border_set(border::ROUNDED)
        .border_style(Style::default().fg(if title.is_some() {
            Color::Cyan
        } else {
            Color::DarkGray
        }));
    if let Some(title) = title {
        block = block.title_top(
            Line::from(Span::styled(
                title,
                Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            ))
            .left_aligned(),
        );
    }
    if show_version {
        block = block.title_bottom(
            Line::from(Span::styled(
                format!(" v{} ", env!("CARGO_PKG_VERSION")),
                Style::default().fg(Color::LightCyan),
            ))
            .right_aligned(),
        );
    }
    block
}
