//! `--plain` mode: stream decoded lines to a writer until the child exits.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use crate::capture::{CaptureError, LaunchSpec};
use crate::export::ExportError;
use crate::session::LogSession;
use crate::ui::{Renderer, SessionSummary, UiError};

const PUMP_WAIT: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct HeadlessOptions {
    /// Print only lines containing this query.
    pub grep: Option<String>,
    /// Overrides a case-sensitive `[search]` config.
    pub ignore_case: bool,
    /// Written once the child has terminated.
    pub export: Option<PathBuf>,
}

#[derive(Debug)]
pub enum HeadlessError {
    Capture(CaptureError),
    Ui(UiError),
    Export(ExportError),
}

impl std::fmt::Display for HeadlessError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HeadlessError::Capture(err) => write!(f, "{err}"),
            HeadlessError::Ui(err) => write!(f, "{err}"),
            HeadlessError::Export(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for HeadlessError {}

impl From<CaptureError> for HeadlessError {
    fn from(value: CaptureError) -> Self {
        Self::Capture(value)
    }
}

impl From<UiError> for HeadlessError {
    fn from(value: UiError) -> Self {
        Self::Ui(value)
    }
}

impl From<ExportError> for HeadlessError {
    fn from(value: ExportError) -> Self {
        Self::Export(value)
    }
}

pub fn run_headless<R: Renderer>(
    session: &mut LogSession,
    spec: LaunchSpec,
    options: &HeadlessOptions,
    renderer: &mut R,
) -> Result<SessionSummary, HeadlessError> {
    if let Some(query) = options.grep.as_deref() {
        if options.ignore_case {
            session.set_case_sensitive(false);
        }
        session.set_query(query, Instant::now());
        session.commit_query();
        session.set_grep_mode(true);
    }

    session.start(spec)?;
    let mut shown = 0usize;
    loop {
        let pumped = session.pump(PUMP_WAIT)?;
        for sequence in pumped.appended.clone() {
            let Some(line) = session.store().line(sequence) else {
                continue;
            };
            let matches = session.search().matches_in_line(sequence);
            if session.search().is_grep_active() && matches.is_empty() {
                continue;
            }
            renderer.log_line(&line, matches)?;
            shown += 1;
        }
        if pumped.terminated {
            break;
        }
    }

    if let Some(path) = options.export.as_deref() {
        session.export(path)?;
    }

    let (diagnostic, abnormal) = session
        .last_termination()
        .map(|termination| (termination.diagnostic.clone(), termination.abnormal))
        .unwrap_or_else(|| ("exit=unknown".to_owned(), true));
    Ok(SessionSummary {
        lines: session.store().len(),
        shown,
        dropped_noise: session.dropped_noise(),
        diagnostic,
        abnormal,
    })
}
