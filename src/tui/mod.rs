//! Interactive viewer: a ratatui front end over a `LogSession`.

use std::io;

use crossterm::event::{self, Event, KeyEventKind};
use ratatui::layout::Rect;

use crate::capture::{CaptureError, LaunchSpec};
use crate::export::ExportError;
use crate::session::LogSession;
use crate::ui::{NoticeLevel, SessionSummary, UiError};

mod config;
mod events;
mod lifecycle;
mod render;
mod state;
mod view_model;

use config::{EVENT_DRAIN_WAIT, INPUT_POLL_WAIT};
use events::{handle_key_event, LoopControl};
use lifecycle::{
    init_terminal, render_summary, restore_terminal, session_summary, stop_session, TuiTerminal,
};
use render::{log_area_size, render_ui};
use state::{InputMode, ViewerState};
use view_model::{build_log_view_model, reveal_position, wrapped_rows};

#[derive(Debug)]
pub enum TuiError {
    Io(io::Error),
    Ui(UiError),
    Capture(CaptureError),
    Export(ExportError),
}

impl std::fmt::Display for TuiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TuiError::Io(err) => write!(f, "{err}"),
            TuiError::Ui(err) => write!(f, "{err}"),
            TuiError::Capture(err) => write!(f, "{err}"),
            TuiError::Export(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for TuiError {}

impl From<io::Error> for TuiError {
    fn from(value: io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<UiError> for TuiError {
    fn from(value: UiError) -> Self {
        Self::Ui(value)
    }
}

impl From<CaptureError> for TuiError {
    fn from(value: CaptureError) -> Self {
        Self::Capture(value)
    }
}

impl From<ExportError> for TuiError {
    fn from(value: ExportError) -> Self {
        Self::Export(value)
    }
}

/// Starts `spec` and runs the viewer until the user quits. The command is
/// spawned before the terminal switches to the alternate screen, so a spawn
/// failure is reported on the normal terminal.
pub fn run_viewer(session: &mut LogSession, spec: LaunchSpec) -> Result<SessionSummary, TuiError> {
    session.start(spec)?;
    let mut terminal = init_terminal()?;
    let mut state = ViewerState::new(session.search().pending_query());

    let result = event_loop(&mut terminal, session, &mut state);
    let stopped = stop_session(&mut terminal, session);
    restore_terminal(&mut terminal)?;
    result?;
    stopped?;

    let summary = session_summary(session);
    render_summary(&summary)?;
    Ok(summary)
}

fn event_loop(
    terminal: &mut TuiTerminal,
    session: &mut LogSession,
    state: &mut ViewerState,
) -> Result<(), TuiError> {
    loop {
        match session.pump(EVENT_DRAIN_WAIT) {
            Ok(pumped) if pumped.terminated && !pumped.restarted => {
                if let Some(termination) = session.last_termination() {
                    let level = if termination.abnormal {
                        NoticeLevel::Error
                    } else {
                        NoticeLevel::Info
                    };
                    state.set_status(level, format!("command ended: {}", termination.diagnostic));
                }
            }
            Ok(_) => {}
            Err(err) => state.set_status(NoticeLevel::Error, format!("restart failed: {err}")),
        }

        let size = terminal.size()?;
        let (output_height, output_width) = log_area_size(
            Rect::new(0, 0, size.width, size.height),
            state.input_mode == InputMode::Query,
        );

        if state.jump_to_current {
            state.jump_to_current = false;
            let search = session.search();
            if let Some(found) = search.current_match() {
                let visible = search.visible_lines(session.store().len());
                if let Some(position) = visible.position_of(found.line) {
                    reveal_position(state, position, output_height);
                }
            }
        }

        let view = {
            let stored = session.store().lines();
            let visible = session.search().visible_lines(stored.len());
            let wrap = state.wrap;
            build_log_view_model(state, visible.len(), output_height, |position| {
                if !wrap {
                    return 1;
                }
                visible
                    .get(position)
                    .and_then(|sequence| stored.get(sequence))
                    .map_or(1, |line| wrapped_rows(&line.plain_text, output_width))
            })
        };

        terminal.draw(|frame| render_ui(frame, &*session, &*state, &view))?;
        state.spinner_tick = state.spinner_tick.wrapping_add(1);

        if event::poll(INPUT_POLL_WAIT)? {
            if let Event::Key(key) = event::read()? {
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                if let LoopControl::Quit = handle_key_event(&key, session, state, view.max_offset)
                {
                    return Ok(());
                }
            }
        }
    }
}
