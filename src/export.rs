use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::ansi::StyledSegment;
use crate::store::LogStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    /// Plain text of every line joined by `\n`, escapes stripped.
    PlainText,
    /// One JSON object per line with its sequence number and styled segments.
    JsonLines,
}

impl ExportFormat {
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("jsonl") => ExportFormat::JsonLines,
            _ => ExportFormat::PlainText,
        }
    }
}

#[derive(Debug)]
pub enum ExportError {
    Io { path: PathBuf, error: io::Error },
    Json {
        path: PathBuf,
        error: serde_json::Error,
    },
}

impl std::fmt::Display for ExportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExportError::Io { path, error } => {
                write!(f, "failed writing export {}: {error}", path.display())
            }
            ExportError::Json { path, error } => {
                write!(f, "failed encoding export {}: {error}", path.display())
            }
        }
    }
}

impl std::error::Error for ExportError {}

#[derive(Serialize)]
struct ExportRecord<'a> {
    sequence: usize,
    text: &'a str,
    segments: &'a [StyledSegment],
}

/// Writes the store to `path` in the format implied by its extension and
/// returns the number of lines written.
pub fn export_to_path(store: &LogStore, path: &Path) -> Result<usize, ExportError> {
    let io_error = |error: io::Error| ExportError::Io {
        path: path.to_path_buf(),
        error,
    };
    let file = File::create(path).map_err(io_error)?;
    let mut out = BufWriter::new(file);
    let written = match ExportFormat::from_path(path) {
        ExportFormat::PlainText => write_plain_text(store, &mut out).map_err(io_error)?,
        ExportFormat::JsonLines => {
            write_json_lines(store, &mut out).map_err(|error| ExportError::Json {
                path: path.to_path_buf(),
                error,
            })?
        }
    };
    out.flush().map_err(io_error)?;
    tracing::info!(path = %path.display(), lines = written, "session exported");
    Ok(written)
}

pub fn write_plain_text<W: Write>(store: &LogStore, out: &mut W) -> io::Result<usize> {
    let plain = store.snapshot_plain_text();
    if plain.line_count() == 0 {
        return Ok(0);
    }
    out.write_all(plain.as_str().as_bytes())?;
    out.write_all(b"\n")?;
    Ok(plain.line_count())
}

pub fn write_json_lines<W: Write>(store: &LogStore, out: &mut W) -> serde_json::Result<usize> {
    let lines = store.lines();
    for line in lines.iter() {
        let record = ExportRecord {
            sequence: line.sequence,
            text: &line.plain_text,
            segments: &line.segments,
        };
        serde_json::to_writer(&mut *out, &record)?;
        out.write_all(b"\n").map_err(serde_json::Error::io)?;
    }
    Ok(lines.len())
}
