//! Child process capture.
//!
//! One `ProcessCapture` runs at most one child at a time. A dedicated reader
//! thread frames and decodes the child's output and hands every line to the
//! owner over a channel, ending each session with a single `Terminated`
//! event.

pub mod source;

use std::io::{self, ErrorKind, Read};
use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender, TryRecvError};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use indexmap::IndexMap;
use parking_lot::Mutex;
use serde::Deserialize;

use crate::ansi::{AnsiDecoder, StyledLine};
use crate::framer::LineFramer;

use self::source::{ChildSource, SourceKind};

pub const DEFAULT_TERMINAL_SIZE: u16 = 2000;
pub const DEFAULT_READ_CHUNK_BYTES: usize = 4096;

const EXIT_POLL_INTERVAL: Duration = Duration::from_millis(40);
const STREAM_ERROR_REAP_TIMEOUT: Duration = Duration::from_secs(2);

/// Command, environment and working directory for one child.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LaunchSpec {
    pub program: String,
    pub args: Vec<String>,
    pub env: IndexMap<String, String>,
    pub cwd: Option<PathBuf>,
}

impl LaunchSpec {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            ..Self::default()
        }
    }

    /// Splits `command[0]` off as the program; `None` for an empty command.
    pub fn from_command(command: &[String]) -> Option<Self> {
        let (program, args) = command.split_first()?;
        Some(Self::new(program.clone()).with_args(args.iter().cloned()))
    }

    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    pub fn with_cwd(mut self, cwd: impl Into<PathBuf>) -> Self {
        self.cwd = Some(cwd.into());
        self
    }

    pub fn display_command(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<&str>>()
            .join(" ")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CaptureMode {
    /// A pty on unix, a pipe elsewhere.
    #[default]
    Auto,
    Pty,
    Pipe,
}

impl CaptureMode {
    pub fn resolve(self) -> SourceKind {
        match self {
            CaptureMode::Auto if cfg!(unix) => SourceKind::Pty,
            CaptureMode::Auto => SourceKind::Pipe,
            CaptureMode::Pty => SourceKind::Pty,
            CaptureMode::Pipe => SourceKind::Pipe,
        }
    }

    pub fn is_explicit(self) -> bool {
        self != CaptureMode::Auto
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureOptions {
    pub mode: CaptureMode,
    pub columns: u16,
    pub rows: u16,
    pub read_chunk_bytes: usize,
}

impl Default for CaptureOptions {
    fn default() -> Self {
        Self {
            mode: CaptureMode::Auto,
            columns: DEFAULT_TERMINAL_SIZE,
            rows: DEFAULT_TERMINAL_SIZE,
            read_chunk_bytes: DEFAULT_READ_CHUNK_BYTES,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureState {
    Idle,
    Running,
    Stopping,
    Stopped,
}

impl CaptureState {
    pub fn label(self) -> &'static str {
        match self {
            CaptureState::Idle => "idle",
            CaptureState::Running => "running",
            CaptureState::Stopping => "stopping",
            CaptureState::Stopped => "stopped",
        }
    }
}

#[derive(Debug)]
pub enum CaptureError {
    SpawnFailed { command: String, error: io::Error },
    AlreadyRunning,
    StreamIo(io::Error),
}

impl std::fmt::Display for CaptureError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CaptureError::SpawnFailed { command, error } => {
                write!(f, "failed to spawn `{command}`: {error}")
            }
            CaptureError::AlreadyRunning => write!(f, "a capture session is already running"),
            CaptureError::StreamIo(error) => write!(f, "failed reading child output: {error}"),
        }
    }
}

impl std::error::Error for CaptureError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CaptureError::SpawnFailed { error, .. } | CaptureError::StreamIo(error) => Some(error),
            CaptureError::AlreadyRunning => None,
        }
    }
}

#[derive(Debug)]
pub struct Termination {
    /// `exit=N`, `signal=N`, or `wait-error=...`.
    pub diagnostic: String,
    /// Set when the stream or the wait failed rather than the child ending.
    pub abnormal: bool,
    pub error: Option<CaptureError>,
}

#[derive(Debug)]
pub enum CaptureEvent {
    Line(StyledLine),
    Terminated(Termination),
}

struct ActiveChild {
    source: Arc<Mutex<Box<dyn ChildSource>>>,
    pid: Option<u32>,
    kind: SourceKind,
    command: String,
}

pub struct ProcessCapture {
    decoder: AnsiDecoder,
    options: CaptureOptions,
    state: CaptureState,
    active: Option<ActiveChild>,
    events_tx: Sender<CaptureEvent>,
    events_rx: Receiver<CaptureEvent>,
}

impl ProcessCapture {
    pub fn new(decoder: AnsiDecoder, options: CaptureOptions) -> Self {
        let (events_tx, events_rx) = mpsc::channel::<CaptureEvent>();
        Self {
            decoder,
            options,
            state: CaptureState::Idle,
            active: None,
            events_tx,
            events_rx,
        }
    }

    pub fn options(&self) -> &CaptureOptions {
        &self.options
    }

    pub fn state(&self) -> CaptureState {
        self.state
    }

    /// True from `start` until the `Terminated` event has been delivered.
    pub fn is_running(&self) -> bool {
        matches!(self.state, CaptureState::Running | CaptureState::Stopping)
    }

    pub fn pid(&self) -> Option<u32> {
        self.active.as_ref().and_then(|active| active.pid)
    }

    pub fn source_kind(&self) -> Option<SourceKind> {
        self.active.as_ref().map(|active| active.kind)
    }

    pub fn command(&self) -> Option<&str> {
        self.active.as_ref().map(|active| active.command.as_str())
    }

    pub fn start(&mut self, spec: &LaunchSpec) -> Result<(), CaptureError> {
        if self.is_running() {
            return Err(CaptureError::AlreadyRunning);
        }
        let command = spec.display_command();
        let mut child = match source::open_source(spec, &self.options) {
            Ok(child) => child,
            Err(error) => {
                tracing::error!(%command, %error, "spawn failed");
                self.state = CaptureState::Stopped;
                return Err(error);
            }
        };
        let kind = child.kind();
        let pid = child.process_id();
        let Some(reader) = child.take_reader() else {
            let _ = child.request_terminate();
            self.state = CaptureState::Stopped;
            return Err(CaptureError::SpawnFailed {
                command,
                error: io::Error::new(ErrorKind::BrokenPipe, "child output stream missing"),
            });
        };
        let source = Arc::new(Mutex::new(child));

        {
            let source = source.clone();
            let decoder = self.decoder.clone();
            let chunk = self.options.read_chunk_bytes.max(1);
            let tx = self.events_tx.clone();
            thread::spawn(move || {
                let termination = read_until_exit(reader, &source, &decoder, chunk, &tx);
                let _ = tx.send(CaptureEvent::Terminated(termination));
            });
        }

        tracing::info!(%command, source = kind.label(), pid = ?pid, "capture started");
        self.active = Some(ActiveChild {
            source,
            pid,
            kind,
            command,
        });
        self.state = CaptureState::Running;
        Ok(())
    }

    /// Requests graceful termination. Never blocks and never force-kills;
    /// completion is reported by the `Terminated` event.
    pub fn stop(&mut self) {
        if self.state != CaptureState::Running {
            return;
        }
        let Some(active) = self.active.as_ref() else {
            return;
        };
        tracing::info!(pid = ?active.pid, "stop requested");
        if let Err(error) = active.source.lock().request_terminate() {
            tracing::warn!(pid = ?active.pid, %error, "termination request failed");
        }
        self.state = CaptureState::Stopping;
    }

    pub fn next_event_timeout(&mut self, timeout: Duration) -> Option<CaptureEvent> {
        match self.events_rx.recv_timeout(timeout) {
            Ok(event) => Some(self.observe(event)),
            Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => None,
        }
    }

    pub fn try_next_event(&mut self) -> Option<CaptureEvent> {
        match self.events_rx.try_recv() {
            Ok(event) => Some(self.observe(event)),
            Err(TryRecvError::Empty | TryRecvError::Disconnected) => None,
        }
    }

    fn observe(&mut self, event: CaptureEvent) -> CaptureEvent {
        if let CaptureEvent::Terminated(termination) = &event {
            tracing::info!(
                diagnostic = %termination.diagnostic,
                abnormal = termination.abnormal,
                "capture terminated"
            );
            self.active = None;
            self.state = CaptureState::Stopped;
        }
        event
    }
}

impl Drop for ProcessCapture {
    fn drop(&mut self) {
        self.stop();
    }
}

fn read_until_exit(
    mut reader: Box<dyn Read + Send>,
    source: &Mutex<Box<dyn ChildSource>>,
    decoder: &AnsiDecoder,
    chunk: usize,
    tx: &Sender<CaptureEvent>,
) -> Termination {
    let mut framer = LineFramer::new();
    let mut buf = vec![0u8; chunk];
    let mut stream_error = None;
    loop {
        match reader.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => {
                for line in framer.feed(&buf[..n]) {
                    let _ = tx.send(CaptureEvent::Line(decoder.decode_line(&line)));
                }
            }
            Err(error) if error.kind() == ErrorKind::Interrupted => continue,
            Err(error) if source::is_end_of_stream(&error) => break,
            Err(error) => {
                tracing::warn!(%error, "reading child output failed");
                stream_error = Some(error);
                break;
            }
        }
    }
    if let Some(line) = framer.flush() {
        let _ = tx.send(CaptureEvent::Line(decoder.decode_line(&line)));
    }
    drop(reader);
    tracing::debug!("child output closed");

    match stream_error {
        None => wait_for_exit(source),
        Some(error) => Termination {
            diagnostic: reap_after_stream_error(source),
            abnormal: true,
            error: Some(CaptureError::StreamIo(error)),
        },
    }
}

// A child that outlives its output stream is asked to terminate and then
// polled for a bounded time so it does not linger as a zombie.
fn reap_after_stream_error(source: &Mutex<Box<dyn ChildSource>>) -> String {
    let status = source.lock().try_wait();
    match status {
        Ok(Some(status)) => return status.to_string(),
        Ok(None) => {}
        Err(error) => return format!("wait-error={error}"),
    }
    if let Err(error) = source.lock().request_terminate() {
        tracing::warn!(%error, "termination request after stream error failed");
    }
    let deadline = Instant::now() + STREAM_ERROR_REAP_TIMEOUT;
    while Instant::now() < deadline {
        thread::sleep(EXIT_POLL_INTERVAL);
        let status = source.lock().try_wait();
        match status {
            Ok(Some(status)) => return status.to_string(),
            Ok(None) => {}
            Err(_) => break,
        }
    }
    "stream-error".to_owned()
}

// The lock is only held for each `try_wait` so `stop` can still reach the
// child while this thread waits.
fn wait_for_exit(source: &Mutex<Box<dyn ChildSource>>) -> Termination {
    loop {
        let status = source.lock().try_wait();
        match status {
            Ok(Some(status)) => {
                return Termination {
                    diagnostic: status.to_string(),
                    abnormal: false,
                    error: None,
                }
            }
            Ok(None) => thread::sleep(EXIT_POLL_INTERVAL),
            Err(error) => {
                return Termination {
                    diagnostic: format!("wait-error={error}"),
                    abnormal: true,
                    error: None,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    use super::source::ExitSummary;
    use super::*;

    struct BrokenReader {
        reads: usize,
    }

    impl Read for BrokenReader {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            self.reads += 1;
            if self.reads > 1 {
                return Err(io::Error::other("device went away"));
            }
            let data = b"A\npart";
            buf[..data.len()].copy_from_slice(data);
            Ok(data.len())
        }
    }

    struct StubChild {
        exit_after_terminate: bool,
        terminated: Arc<AtomicBool>,
        waits: Arc<AtomicUsize>,
    }

    impl ChildSource for StubChild {
        fn kind(&self) -> SourceKind {
            SourceKind::Pipe
        }

        fn process_id(&self) -> Option<u32> {
            None
        }

        fn take_reader(&mut self) -> Option<Box<dyn Read + Send>> {
            None
        }

        fn request_terminate(&mut self) -> io::Result<()> {
            self.terminated.store(true, Ordering::SeqCst);
            Ok(())
        }

        fn try_wait(&mut self) -> io::Result<Option<ExitSummary>> {
            self.waits.fetch_add(1, Ordering::SeqCst);
            if self.exit_after_terminate && self.terminated.load(Ordering::SeqCst) {
                return Ok(Some(ExitSummary {
                    code: None,
                    signal: Some(15),
                }));
            }
            Ok(None)
        }
    }

    fn run_broken_stream(
        exit_after_terminate: bool,
    ) -> (Vec<String>, Termination, Arc<AtomicBool>, Arc<AtomicUsize>) {
        let terminated = Arc::new(AtomicBool::new(false));
        let waits = Arc::new(AtomicUsize::new(0));
        let child: Box<dyn ChildSource> = Box::new(StubChild {
            exit_after_terminate,
            terminated: Arc::clone(&terminated),
            waits: Arc::clone(&waits),
        });
        let source = Mutex::new(child);
        let (tx, rx) = mpsc::channel();
        let termination = read_until_exit(
            Box::new(BrokenReader { reads: 0 }),
            &source,
            &AnsiDecoder::default(),
            64,
            &tx,
        );
        let lines = rx
            .try_iter()
            .filter_map(|event| match event {
                CaptureEvent::Line(line) => Some(line.plain_text),
                CaptureEvent::Terminated(_) => None,
            })
            .collect();
        (lines, termination, terminated, waits)
    }

    #[test]
    fn stream_error_flushes_partial_line_and_reports_abnormal_end() {
        let (lines, termination, terminated, _) = run_broken_stream(true);

        assert_eq!(lines, vec!["A".to_owned(), "part".to_owned()]);
        assert!(termination.abnormal);
        assert!(matches!(termination.error, Some(CaptureError::StreamIo(_))));
        assert!(terminated.load(Ordering::SeqCst));
    }

    #[test]
    fn stream_error_reaps_child_after_terminate_request() {
        let (_, termination, _, waits) = run_broken_stream(true);

        assert_eq!(termination.diagnostic, "signal=15");
        assert!(waits.load(Ordering::SeqCst) >= 2);
    }

    #[test]
    fn stream_error_gives_up_on_child_that_ignores_terminate() {
        let (_, termination, terminated, _) = run_broken_stream(false);

        assert_eq!(termination.diagnostic, "stream-error");
        assert!(terminated.load(Ordering::SeqCst));
        assert!(termination.abnormal);
    }
}
