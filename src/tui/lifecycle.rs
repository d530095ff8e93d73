use std::io;
use std::time::{Duration, Instant};

use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnableLineWrap, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::style::{Color, Style};
use ratatui::widgets::Paragraph;
use ratatui::Terminal;

use crate::session::LogSession;
use crate::ui::{OutputMode, PlainRenderer, Renderer, SessionSummary};

use super::config::SHUTDOWN_GRACE_TIMEOUT;
use super::TuiError;

pub(super) type TuiTerminal = Terminal<CrosstermBackend<io::Stdout>>;

const SHUTDOWN_PUMP_WAIT: Duration = Duration::from_millis(50);

pub(super) fn init_terminal() -> Result<TuiTerminal, io::Error> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;
    Ok(terminal)
}

/// Sends the stop request and keeps draining until the terminated event
/// arrives or the grace period runs out.
pub(super) fn stop_session(
    terminal: &mut TuiTerminal,
    session: &mut LogSession,
) -> Result<(), TuiError> {
    if !session.is_running() {
        return Ok(());
    }
    session.stop();
    let _ = draw_shutdown_status(terminal, "Shutdown: waiting for the command to exit...");
    let deadline = Instant::now() + SHUTDOWN_GRACE_TIMEOUT;
    while session.is_running() && Instant::now() < deadline {
        session.pump(SHUTDOWN_PUMP_WAIT)?;
    }
    if session.is_running() {
        tracing::warn!(pid = ?session.pid(), "command still running after shutdown grace period");
    }
    Ok(())
}

pub(super) fn restore_terminal(terminal: &mut TuiTerminal) -> Result<(), io::Error> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen, EnableLineWrap)?;
    terminal.show_cursor()?;
    Ok(())
}

pub(super) fn session_summary(session: &LogSession) -> SessionSummary {
    let (diagnostic, abnormal) = match session.last_termination() {
        Some(termination) => (termination.diagnostic.clone(), termination.abnormal),
        None => (session.capture_state().label().to_owned(), false),
    };
    SessionSummary {
        lines: session.store().len(),
        shown: session.store().len(),
        dropped_noise: session.dropped_noise(),
        diagnostic,
        abnormal,
    }
}

pub(super) fn render_summary(summary: &SessionSummary) -> Result<(), TuiError> {
    let mut renderer = PlainRenderer::stdout(OutputMode::from_env());
    renderer.section("Session")?;
    renderer.session_summary(summary)?;
    renderer.flush()?;
    Ok(())
}

fn draw_shutdown_status(terminal: &mut TuiTerminal, status: &str) -> Result<(), io::Error> {
    terminal.draw(|frame| {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(1), Constraint::Length(1)])
            .split(frame.area());
        let footer = Paragraph::new(status.to_owned()).style(Style::default().fg(Color::Yellow));
        frame.render_widget(footer, chunks[1]);
    })?;
    Ok(())
}
