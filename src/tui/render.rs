use std::rc::Rc;

use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::Frame;

use crate::session::LogSession;

use super::config::{FOOTER_HEIGHT, HEADER_HEIGHT, QUERY_HEIGHT};
use super::state::{InputMode, ViewerState};
use super::view_model::LogViewModel;

mod footer;
mod header;
mod help_overlay;
mod panes;

use footer::render_footer;
use header::render_header;
use help_overlay::render_help_overlay;
use panes::{render_log_pane, render_query_pane};

fn split_screen(area: Rect, query_open: bool) -> Rc<[Rect]> {
    let query_height = if query_open { QUERY_HEIGHT } else { 0 };
    Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(HEADER_HEIGHT),
            Constraint::Min(1),
            Constraint::Length(query_height),
            Constraint::Length(FOOTER_HEIGHT),
        ])
        .split(area)
}

/// Inner `(rows, columns)` available to log text inside the bordered pane.
pub(super) fn log_area_size(area: Rect, query_open: bool) -> (usize, usize) {
    let log_area = split_screen(area, query_open)[1];
    (
        log_area.height.saturating_sub(2) as usize,
        log_area.width.saturating_sub(2) as usize,
    )
}

pub(super) fn render_ui(
    frame: &mut Frame<'_>,
    session: &LogSession,
    state: &ViewerState,
    view: &LogViewModel,
) {
    let query_open = state.input_mode == InputMode::Query;
    let chunks = split_screen(frame.area(), query_open);

    render_header(frame, chunks[0], session, state.spinner_tick);
    if state.show_help {
        render_help_overlay(frame, chunks[1]);
    } else {
        render_log_pane(frame, chunks[1], session, state, view);
    }
    if query_open {
        render_query_pane(frame, chunks[2], &state.query_input);
    }
    render_footer(frame, chunks[3], state);
}
