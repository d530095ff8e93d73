use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use ratatui::Frame;

use super::header::panel_block;

pub(super) fn render_help_overlay(frame: &mut Frame<'_>, area: Rect) {
    let heading = |text: &'static str| {
        Line::from(Span::styled(
            text,
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ))
    };
    let help_lines = vec![
        heading("Browse"),
        Line::from("/               edit the search query"),
        Line::from("n / N           next / previous match"),
        Line::from("c               toggle case-sensitive search"),
        Line::from("g               toggle grep view (matching lines only)"),
        Line::from("f               toggle follow (auto-scroll)"),
        Line::from("w               toggle line wrap"),
        Line::from("up/down         scroll line-by-line"),
        Line::from("pgup/pgdn       scroll by page"),
        Line::from("home/end        jump to top/bottom (end re-enables follow)"),
        Line::from("ctrl+l          clear captured lines"),
        Line::from("s               export to pidview-<timestamp>.txt"),
        Line::from("r               restart the command"),
        Line::from("x               stop the command"),
        Line::from("h               toggle this help"),
        Line::from("q / ctrl+c      quit (stops the command)"),
        Line::from(""),
        heading("Search"),
        Line::from("type            edit the query (applied after a short pause)"),
        Line::from("enter           search now and jump to the next match"),
        Line::from("esc             return to browse mode"),
    ];
    let help = Paragraph::new(help_lines).block(panel_block(Some(" Help "), false));
    frame.render_widget(help, area);
}
