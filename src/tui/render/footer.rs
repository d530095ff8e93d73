use ratatui::layout::Rect;
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use ratatui::Frame;

use crate::ui::NoticeLevel;

use super::super::state::{InputMode, ViewerState};

pub(super) fn render_footer(frame: &mut Frame<'_>, area: Rect, state: &ViewerState) {
    let muted = Style::default().fg(Color::DarkGray);
    let active = Style::default().fg(Color::Yellow);
    let flag = |enabled: bool| if enabled { active } else { muted };

    let mut spans = vec![
        Span::styled(
            match state.input_mode {
                InputMode::Browse => "mode:browse (/ search)",
                InputMode::Query => "mode:search (esc browse)",
            },
            flag(state.input_mode == InputMode::Query),
        ),
        Span::styled("  |  ", muted),
        Span::styled("follow (f)", flag(state.follow)),
        Span::styled("  |  ", muted),
        Span::styled("wrap (w)", flag(state.wrap)),
        Span::styled("  |  ", muted),
        Span::styled("help (h)", flag(state.show_help)),
    ];
    if let Some(status) = &state.status {
        let color = match status.level {
            NoticeLevel::Info => Color::Gray,
            NoticeLevel::Success => Color::Green,
            NoticeLevel::Warning => Color::Yellow,
            NoticeLevel::Error => Color::Red,
        };
        spans.push(Span::styled("  |  ", muted));
        spans.push(Span::styled(
            status.text.clone(),
            Style::default().fg(color),
        ));
    }
    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}
