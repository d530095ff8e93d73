use std::fmt::{Display, Formatter};

use crate::search::SearchMatch;
use crate::store::DecodedLine;
use crate::ui::widgets::{MessageBlock, SessionSummary};

pub type UiResult<T> = Result<T, UiError>;

#[derive(Debug)]
pub enum UiError {
    Io(std::io::Error),
}

impl Display for UiError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            UiError::Io(error) => write!(f, "{error}"),
        }
    }
}

impl std::error::Error for UiError {}

impl From<std::io::Error> for UiError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

pub trait Renderer {
    fn section(&mut self, title: &str) -> UiResult<()>;

    fn error_block(&mut self, block: &MessageBlock) -> UiResult<()>;
    fn warning_block(&mut self, block: &MessageBlock) -> UiResult<()>;

    /// One captured line with its original styling; `matches` are painted
    /// with the theme's highlight.
    fn log_line(&mut self, line: &DecodedLine, matches: &[SearchMatch]) -> UiResult<()>;
    fn session_summary(&mut self, summary: &SessionSummary) -> UiResult<()>;
}
