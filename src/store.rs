use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;

use parking_lot::{MappedRwLockReadGuard, RwLock, RwLockReadGuard};

use crate::ansi::{StyledLine, StyledSegment};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedLine {
    pub sequence: usize,
    pub segments: Vec<StyledSegment>,
    pub plain_text: String,
}

/// The whole buffer's plain text, joined by `\n`, with the byte offset at
/// which every line starts.
///
/// Snapshots are shared through `Arc`; the store extends its copy in place
/// when nobody else holds one, and copies on write otherwise.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlainText {
    generation: u64,
    text: String,
    line_starts: Vec<usize>,
}

impl PlainText {
    fn empty(generation: u64) -> Self {
        Self {
            generation,
            ..Self::default()
        }
    }

    fn push_line(&mut self, line: &str) {
        if !self.line_starts.is_empty() {
            self.text.push('\n');
        }
        self.line_starts.push(self.text.len());
        self.text.push_str(line);
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Bumped every time the store is cleared.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }

    pub fn line_start(&self, index: usize) -> Option<usize> {
        self.line_starts.get(index).copied()
    }

    pub fn line(&self, index: usize) -> Option<&str> {
        let start = *self.line_starts.get(index)?;
        let end = match self.line_starts.get(index + 1) {
            Some(next) => next - 1,
            None => self.text.len(),
        };
        Some(&self.text[start..end])
    }

    /// Maps a byte offset in the joined text to `(line, offset within line)`.
    pub fn locate(&self, offset: usize) -> Option<(usize, usize)> {
        if self.line_starts.is_empty() || offset > self.text.len() {
            return None;
        }
        let line = self
            .line_starts
            .partition_point(|start| *start <= offset)
            .saturating_sub(1);
        Some((line, offset - self.line_starts[line]))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreEvent {
    Appended(usize),
    Cleared,
}

#[derive(Debug, Default)]
struct LogBuffer {
    lines: Vec<Arc<DecodedLine>>,
    plain: Arc<PlainText>,
    generation: u64,
    subscribers: Vec<Sender<StoreEvent>>,
}

impl LogBuffer {
    fn notify(&mut self, event: StoreEvent) {
        self.subscribers.retain(|tx| tx.send(event).is_ok());
    }
}

/// Append-only record of the session's decoded lines.
///
/// Cloning the store clones the handle; all clones see the same buffer.
/// Appends and clears take the write lock, readers share the read lock.
#[derive(Debug, Clone, Default)]
pub struct LogStore {
    inner: Arc<RwLock<LogBuffer>>,
}

impl LogStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&self, line: StyledLine) -> Arc<DecodedLine> {
        let mut buffer = self.inner.write();
        let sequence = buffer.lines.len();
        Arc::make_mut(&mut buffer.plain).push_line(&line.plain_text);
        let decoded = Arc::new(DecodedLine {
            sequence,
            segments: line.segments,
            plain_text: line.plain_text,
        });
        buffer.lines.push(decoded.clone());
        buffer.notify(StoreEvent::Appended(sequence));
        decoded
    }

    pub fn clear(&self) {
        let mut buffer = self.inner.write();
        buffer.generation = buffer.generation.wrapping_add(1);
        buffer.lines = Vec::new();
        buffer.plain = Arc::new(PlainText::empty(buffer.generation));
        buffer.notify(StoreEvent::Cleared);
    }

    pub fn len(&self) -> usize {
        self.inner.read().lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn line(&self, sequence: usize) -> Option<Arc<DecodedLine>> {
        self.inner.read().lines.get(sequence).cloned()
    }

    /// Read access to every line in sequence order. Appends wait until the
    /// guard is dropped.
    pub fn lines(&self) -> MappedRwLockReadGuard<'_, [Arc<DecodedLine>]> {
        RwLockReadGuard::map(self.inner.read(), |buffer| buffer.lines.as_slice())
    }

    pub fn snapshot_plain_text(&self) -> Arc<PlainText> {
        self.inner.read().plain.clone()
    }

    pub fn subscribe(&self) -> Receiver<StoreEvent> {
        let (tx, rx) = mpsc::channel();
        self.inner.write().subscribers.push(tx);
        rx
    }
}

#[cfg(test)]
#[path = "tests/store_tests.rs"]
mod tests;
