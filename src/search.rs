//! Incremental search and grep filtering over the store's plain text.
//!
//! Matches never span a line break: every line is scanned on its own, so a
//! query containing `\n` finds nothing.

use std::time::{Duration, Instant};

use crate::store::PlainText;

pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(250);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct SearchMatch {
    /// Sequence number of the owning line.
    pub line: usize,
    /// Byte offset within the line's plain text.
    pub start: usize,
    /// Byte length in the original (unfolded) text.
    pub len: usize,
}

impl SearchMatch {
    pub fn end(&self) -> usize {
        self.start + self.len
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchStatus {
    Empty,
    Searching,
}

/// Coalesces bursts of edits into one action fired `delay` after the last.
#[derive(Debug, Clone)]
pub struct Debouncer {
    delay: Duration,
    deadline: Option<Instant>,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            deadline: None,
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    pub fn schedule(&mut self, now: Instant) {
        self.deadline = Some(now + self.delay);
    }

    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Returns true exactly once per schedule, when the deadline has passed.
    pub fn take_due(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }
}

/// Which store lines the view should show, in sequence order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisibleLines<'a> {
    All(usize),
    Only(&'a [usize]),
}

impl VisibleLines<'_> {
    pub fn len(&self) -> usize {
        match self {
            VisibleLines::All(total) => *total,
            VisibleLines::Only(lines) => lines.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Store sequence number of the `index`-th visible row.
    pub fn get(&self, index: usize) -> Option<usize> {
        match self {
            VisibleLines::All(total) => (index < *total).then_some(index),
            VisibleLines::Only(lines) => lines.get(index).copied(),
        }
    }

    /// Row index at which `sequence` is shown, if it is shown at all.
    pub fn position_of(&self, sequence: usize) -> Option<usize> {
        match self {
            VisibleLines::All(total) => (sequence < *total).then_some(sequence),
            VisibleLines::Only(lines) => lines.binary_search(&sequence).ok(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SearchEngine {
    query: String,
    pending_query: String,
    needle: String,
    case_sensitive: bool,
    grep_mode: bool,
    debouncer: Debouncer,
    matches: Vec<SearchMatch>,
    grep_lines: Vec<usize>,
    current: Option<usize>,
    scanned_lines: usize,
    generation: u64,
}

impl Default for SearchEngine {
    fn default() -> Self {
        Self::new(DEFAULT_DEBOUNCE)
    }
}

impl SearchEngine {
    pub fn new(debounce: Duration) -> Self {
        Self {
            query: String::new(),
            pending_query: String::new(),
            needle: String::new(),
            case_sensitive: false,
            grep_mode: false,
            debouncer: Debouncer::new(debounce),
            matches: Vec::new(),
            grep_lines: Vec::new(),
            current: None,
            scanned_lines: 0,
            generation: 0,
        }
    }

    pub fn with_case_sensitive(mut self, case_sensitive: bool) -> Self {
        self.case_sensitive = case_sensitive;
        self
    }

    /// The query the current matches were computed for.
    pub fn query(&self) -> &str {
        &self.query
    }

    /// The most recently typed query, possibly not applied yet.
    pub fn pending_query(&self) -> &str {
        &self.pending_query
    }

    pub fn case_sensitive(&self) -> bool {
        self.case_sensitive
    }

    pub fn grep_mode(&self) -> bool {
        self.grep_mode
    }

    pub fn status(&self) -> SearchStatus {
        if self.query.is_empty() {
            SearchStatus::Empty
        } else {
            SearchStatus::Searching
        }
    }

    pub fn is_debounce_pending(&self) -> bool {
        self.debouncer.is_pending()
    }

    pub fn debounce_deadline(&self) -> Option<Instant> {
        self.debouncer.deadline()
    }

    /// Records a query edit. The recomputation runs from `poll` once the
    /// debounce window has passed without further edits.
    pub fn set_query(&mut self, query: &str, now: Instant) {
        if query == self.pending_query {
            return;
        }
        self.pending_query = query.to_owned();
        self.debouncer.schedule(now);
    }

    /// Applies a pending query edit if its debounce window has elapsed.
    pub fn poll(&mut self, now: Instant, plain: &PlainText) -> bool {
        if !self.debouncer.take_due(now) {
            return false;
        }
        self.apply_pending(plain);
        true
    }

    /// Applies any pending query edit right away.
    pub fn flush_pending(&mut self, plain: &PlainText) {
        self.debouncer.cancel();
        self.apply_pending(plain);
    }

    fn apply_pending(&mut self, plain: &PlainText) {
        if self.pending_query != self.query {
            self.query = self.pending_query.clone();
            self.current = None;
        }
        self.recompute(plain);
    }

    pub fn set_case_sensitive(&mut self, case_sensitive: bool, plain: &PlainText) {
        if self.case_sensitive == case_sensitive {
            return;
        }
        self.case_sensitive = case_sensitive;
        self.current = None;
        self.recompute(plain);
    }

    pub fn set_grep_mode(&mut self, grep_mode: bool, plain: &PlainText) {
        if self.grep_mode == grep_mode {
            return;
        }
        self.grep_mode = grep_mode;
        self.recompute(plain);
    }

    /// Recomputes every match against `plain` from scratch. The current
    /// selection survives when it is still in range.
    pub fn recompute(&mut self, plain: &PlainText) {
        self.matches.clear();
        self.grep_lines.clear();
        self.scanned_lines = 0;
        self.generation = plain.generation();
        self.needle = if self.case_sensitive {
            self.query.clone()
        } else {
            self.query.to_lowercase()
        };
        if self.query.is_empty() {
            self.current = None;
            self.scanned_lines = plain.line_count();
            return;
        }
        self.scan_new_lines(plain);
        self.current = match self.current {
            _ if self.matches.is_empty() => None,
            Some(index) => Some(index.min(self.matches.len() - 1)),
            None => None,
        };
        tracing::debug!(
            query = %self.query,
            case_sensitive = self.case_sensitive,
            matches = self.matches.len(),
            lines = plain.line_count(),
            "search recomputed"
        );
    }

    /// Extends matches and the grep view with lines appended since the last
    /// scan. Returns the number of lines newly scanned.
    pub fn sync(&mut self, plain: &PlainText) -> usize {
        if plain.generation() != self.generation {
            self.matches.clear();
            self.grep_lines.clear();
            self.current = None;
            self.scanned_lines = 0;
            self.generation = plain.generation();
        }
        if self.query.is_empty() {
            self.scanned_lines = plain.line_count();
            return 0;
        }
        self.scan_new_lines(plain)
    }

    fn scan_new_lines(&mut self, plain: &PlainText) -> usize {
        let first = self.scanned_lines;
        for index in first..plain.line_count() {
            let Some(text) = plain.line(index) else {
                break;
            };
            let before = self.matches.len();
            let matches = &mut self.matches;
            find_in_line(text, &self.needle, self.case_sensitive, |start, len| {
                matches.push(SearchMatch {
                    line: index,
                    start,
                    len,
                });
            });
            if self.matches.len() > before {
                self.grep_lines.push(index);
            }
            self.scanned_lines = index + 1;
        }
        self.scanned_lines.saturating_sub(first)
    }

    pub fn next(&mut self) {
        if self.matches.is_empty() {
            return;
        }
        let len = self.matches.len();
        self.current = Some(match self.current {
            Some(index) => (index + 1) % len,
            None => 0,
        });
    }

    pub fn prev(&mut self) {
        if self.matches.is_empty() {
            return;
        }
        let len = self.matches.len();
        self.current = Some(match self.current {
            Some(0) | None => len - 1,
            Some(index) => index - 1,
        });
    }

    pub fn matches(&self) -> &[SearchMatch] {
        &self.matches
    }

    pub fn current_index(&self) -> Option<usize> {
        self.current
    }

    pub fn current_match(&self) -> Option<SearchMatch> {
        self.current.and_then(|index| self.matches.get(index).copied())
    }

    /// `(current, total)` for a `current/total` label; current is 1-based
    /// and 0 when nothing is selected.
    pub fn counter(&self) -> (usize, usize) {
        let current = self.current.map_or(0, |index| index + 1);
        (current, self.matches.len())
    }

    pub fn matches_in_line(&self, line: usize) -> &[SearchMatch] {
        let start = self.matches.partition_point(|found| found.line < line);
        let end = self.matches.partition_point(|found| found.line <= line);
        &self.matches[start..end]
    }

    pub fn is_grep_active(&self) -> bool {
        self.grep_mode && !self.query.is_empty()
    }

    pub fn visible_lines(&self, total: usize) -> VisibleLines<'_> {
        if self.is_grep_active() {
            VisibleLines::Only(&self.grep_lines)
        } else {
            VisibleLines::All(total)
        }
    }

    /// Drops all matches (used when the store is cleared); the query and
    /// flags are kept.
    pub fn reset_matches(&mut self, plain: &PlainText) {
        self.matches.clear();
        self.grep_lines.clear();
        self.current = None;
        self.scanned_lines = 0;
        self.generation = plain.generation();
        self.scan_new_lines(plain);
    }
}

/// Reports every non-overlapping occurrence of `needle` in `line`, left to
/// right. With `case_sensitive == false`, `needle` must already be lowercased;
/// offsets are reported against the original `line`.
pub fn find_in_line<F>(line: &str, needle: &str, case_sensitive: bool, mut emit: F)
where
    F: FnMut(usize, usize),
{
    if needle.is_empty() || line.is_empty() {
        return;
    }
    if case_sensitive {
        scan(line, needle, |start, len| emit(start, len));
        return;
    }
    if line.is_ascii() {
        let lowered = line.to_ascii_lowercase();
        scan(&lowered, needle, |start, len| emit(start, len));
        return;
    }
    let folded = FoldedText::new(line);
    scan(&folded.text, needle, |start, len| {
        // A match that covers only part of a char's folded form still
        // reports the whole original char.
        let (original_start, _) = folded.origin[start];
        let (_, original_end) = folded.origin[start + len - 1];
        emit(original_start, original_end - original_start);
    });
}

fn scan<F>(haystack: &str, needle: &str, mut emit: F)
where
    F: FnMut(usize, usize),
{
    let step = needle.len().max(1);
    let mut pos = 0usize;
    while pos <= haystack.len() {
        let Some(found) = haystack[pos..].find(needle) else {
            break;
        };
        let start = pos + found;
        emit(start, needle.len());
        pos = start + step;
    }
}

// Lowercasing can change byte lengths outside ASCII, so every folded byte
// remembers the byte range of the original char it came from.
struct FoldedText {
    text: String,
    origin: Vec<(usize, usize)>,
}

impl FoldedText {
    fn new(original: &str) -> Self {
        let mut text = String::with_capacity(original.len());
        let mut origin = Vec::with_capacity(original.len());
        for (offset, ch) in original.char_indices() {
            for lower in ch.to_lowercase() {
                let before = text.len();
                text.push(lower);
                let span = (offset, offset + ch.len_utf8());
                origin.resize(origin.len() + (text.len() - before), span);
            }
        }
        Self { text, origin }
    }
}

#[cfg(test)]
#[path = "tests/search_tests.rs"]
mod tests;
