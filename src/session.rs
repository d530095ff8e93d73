//! The foreground controller: drains capture events into the store, keeps
//! search in step with new lines and exposes the query interface.

use std::ops::Range;
use std::path::Path;
use std::time::{Duration, Instant};

use crate::ansi::StyledLine;
use crate::capture::source::SourceKind;
use crate::capture::{
    CaptureError, CaptureEvent, CaptureState, LaunchSpec, ProcessCapture, Termination,
};
use crate::export::{export_to_path, ExportError};
use crate::noise::NoiseFilter;
use crate::search::SearchEngine;
use crate::store::LogStore;

/// Upper bound on events handled per `pump`, so a flooding child cannot
/// starve the caller's redraws.
pub const MAX_EVENTS_PER_PUMP: usize = 4096;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PumpSummary {
    /// Sequence numbers appended during this pump.
    pub appended: Range<usize>,
    pub dropped: usize,
    pub terminated: bool,
    pub restarted: bool,
}

pub struct LogSession {
    capture: ProcessCapture,
    store: LogStore,
    noise: NoiseFilter,
    search: SearchEngine,
    launch: Option<LaunchSpec>,
    dropped_noise: usize,
    last_termination: Option<Termination>,
    restart_pending: bool,
}

impl LogSession {
    pub fn new(capture: ProcessCapture, noise: NoiseFilter, search: SearchEngine) -> Self {
        Self {
            capture,
            store: LogStore::new(),
            noise,
            search,
            launch: None,
            dropped_noise: 0,
            last_termination: None,
            restart_pending: false,
        }
    }

    pub fn store(&self) -> &LogStore {
        &self.store
    }

    pub fn search(&self) -> &SearchEngine {
        &self.search
    }

    pub fn launch(&self) -> Option<&LaunchSpec> {
        self.launch.as_ref()
    }

    pub fn capture_state(&self) -> CaptureState {
        self.capture.state()
    }

    pub fn is_running(&self) -> bool {
        self.capture.is_running()
    }

    pub fn pid(&self) -> Option<u32> {
        self.capture.pid()
    }

    pub fn source_kind(&self) -> Option<SourceKind> {
        self.capture.source_kind()
    }

    pub fn dropped_noise(&self) -> usize {
        self.dropped_noise
    }

    pub fn last_termination(&self) -> Option<&Termination> {
        self.last_termination.as_ref()
    }

    pub fn is_restart_pending(&self) -> bool {
        self.restart_pending
    }

    pub fn start(&mut self, spec: LaunchSpec) -> Result<(), CaptureError> {
        self.capture.start(&spec)?;
        self.launch = Some(spec);
        self.last_termination = None;
        Ok(())
    }

    pub fn stop(&mut self) {
        self.restart_pending = false;
        self.capture.stop();
    }

    /// Stops the running child and starts the same launch again once its
    /// termination has been observed. Starts right away when idle.
    pub fn restart(&mut self) -> Result<(), CaptureError> {
        if self.capture.is_running() {
            self.capture.stop();
            self.restart_pending = true;
            return Ok(());
        }
        self.relaunch()
    }

    fn relaunch(&mut self) -> Result<(), CaptureError> {
        self.restart_pending = false;
        let Some(spec) = self.launch.clone() else {
            return Ok(());
        };
        tracing::info!(command = %spec.display_command(), "restarting capture");
        self.start(spec)
    }

    /// Handles capture events for up to `timeout`, then brings search up to
    /// date with everything appended and applies a due query edit.
    pub fn pump(&mut self, timeout: Duration) -> Result<PumpSummary, CaptureError> {
        let first = self.store.len();
        let mut summary = PumpSummary::default();
        let mut next = self.capture.next_event_timeout(timeout);
        let mut handled = 0usize;
        while let Some(event) = next {
            match event {
                CaptureEvent::Line(line) => {
                    if !self.ingest_line(line) {
                        summary.dropped += 1;
                    }
                }
                CaptureEvent::Terminated(termination) => {
                    summary.terminated = true;
                    self.last_termination = Some(termination);
                    if self.restart_pending {
                        self.relaunch()?;
                        summary.restarted = true;
                    }
                    break;
                }
            }
            handled += 1;
            if handled >= MAX_EVENTS_PER_PUMP {
                break;
            }
            next = self.capture.try_next_event();
        }
        self.refresh_search(Instant::now());
        let last = self.store.len();
        summary.appended = first.min(last)..last;
        Ok(summary)
    }

    /// Appends a decoded line unless it is noise. Returns whether it was kept.
    pub fn ingest_line(&mut self, line: StyledLine) -> bool {
        if self.noise.is_noise(&line.plain_text) {
            self.dropped_noise += 1;
            tracing::trace!(text = %line.plain_text, "noise line dropped");
            return false;
        }
        self.store.append(line);
        true
    }

    /// Applies a query edit whose debounce window has passed and extends
    /// matches over newly appended lines.
    pub fn refresh_search(&mut self, now: Instant) {
        let plain = self.store.snapshot_plain_text();
        if !self.search.poll(now, &plain) {
            self.search.sync(&plain);
        }
    }

    pub fn set_query(&mut self, query: &str, now: Instant) {
        self.search.set_query(query, now);
    }

    /// Applies the typed query immediately, skipping the debounce window.
    pub fn commit_query(&mut self) {
        let plain = self.store.snapshot_plain_text();
        self.search.flush_pending(&plain);
    }

    pub fn set_case_sensitive(&mut self, case_sensitive: bool) {
        let plain = self.store.snapshot_plain_text();
        self.search.set_case_sensitive(case_sensitive, &plain);
    }

    pub fn set_grep_mode(&mut self, grep_mode: bool) {
        let plain = self.store.snapshot_plain_text();
        self.search.set_grep_mode(grep_mode, &plain);
    }

    pub fn next(&mut self) {
        self.search.next();
    }

    pub fn prev(&mut self) {
        self.search.prev();
    }

    /// Moves to the next match; with no matches yet, runs the search first.
    pub fn search_next_or_refresh(&mut self) {
        if self.search.matches().is_empty() || self.search.is_debounce_pending() {
            self.commit_query();
        }
        self.search.next();
    }

    /// Drops every captured line. The query and search flags are kept.
    pub fn clear(&mut self) {
        self.store.clear();
        self.dropped_noise = 0;
        let plain = self.store.snapshot_plain_text();
        self.search.reset_matches(&plain);
        tracing::info!("log cleared");
    }

    pub fn export(&self, path: &Path) -> Result<usize, ExportError> {
        export_to_path(&self.store, path)
    }
}

#[cfg(test)]
#[path = "tests/session_tests.rs"]
mod tests;
