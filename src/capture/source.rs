//! Byte sources a capture session reads from.
//!
//! A source owns the spawned child and hands out one blocking reader over its
//! merged output. Everything above this module (framing, decoding, events)
//! only sees `dyn ChildSource`.

use std::io::{self, Read};
#[cfg(unix)]
use std::os::unix::process::{CommandExt, ExitStatusExt};
use std::process::{Child, Command as ProcessCommand, Stdio};

use indexmap::IndexMap;
#[cfg(unix)]
use nix::sys::signal::{kill, Signal};
#[cfg(unix)]
use nix::unistd::{setpgid, Pid};
use portable_pty::{native_pty_system, CommandBuilder, MasterPty, PtySize};

use super::{CaptureError, CaptureOptions, LaunchSpec};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    Pty,
    Pipe,
}

impl SourceKind {
    pub fn label(self) -> &'static str {
        match self {
            SourceKind::Pty => "pty",
            SourceKind::Pipe => "pipe",
        }
    }
}

/// How a child ended, formatted as `exit=N` or `signal=N`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitSummary {
    pub code: Option<i32>,
    pub signal: Option<i32>,
}

impl ExitSummary {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

impl std::fmt::Display for ExitSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (self.code, self.signal) {
            (Some(code), _) => write!(f, "exit={code}"),
            (None, Some(signal)) => write!(f, "signal={signal}"),
            (None, None) => write!(f, "exit=unknown"),
        }
    }
}

impl From<std::process::ExitStatus> for ExitSummary {
    fn from(status: std::process::ExitStatus) -> Self {
        #[cfg(unix)]
        let signal = status.signal();
        #[cfg(not(unix))]
        let signal = None;
        Self {
            code: status.code(),
            signal,
        }
    }
}

pub trait ChildSource: Send {
    fn kind(&self) -> SourceKind;

    fn process_id(&self) -> Option<u32>;

    /// The merged stdout/stderr stream. Yields `Some` exactly once.
    fn take_reader(&mut self) -> Option<Box<dyn Read + Send>>;

    /// Sends a graceful termination request to the child's process group.
    fn request_terminate(&mut self) -> io::Result<()>;

    fn try_wait(&mut self) -> io::Result<Option<ExitSummary>>;
}

/// Opens the source selected by `options.mode`. In `Auto` mode a pty that
/// cannot be allocated falls back to a pipe.
pub fn open_source(
    spec: &LaunchSpec,
    options: &CaptureOptions,
) -> Result<Box<dyn ChildSource>, CaptureError> {
    match options.mode.resolve() {
        SourceKind::Pipe => Ok(Box::new(PipeChildSource::spawn(spec, options)?)),
        SourceKind::Pty if options.mode.is_explicit() => {
            Ok(Box::new(PtyChildSource::spawn(spec, options)?))
        }
        SourceKind::Pty => match PtyChildSource::open(options) {
            Ok(pair) => Ok(Box::new(PtyChildSource::spawn_on(pair, spec, options)?)),
            Err(error) => {
                tracing::warn!(%error, "pty unavailable, capturing through a pipe");
                Ok(Box::new(PipeChildSource::spawn(spec, options)?))
            }
        },
    }
}

/// Launch environment for a given source: the spec's own variables first,
/// then defaults for keys the spec leaves unset.
pub fn launch_environment(
    spec: &LaunchSpec,
    kind: SourceKind,
    options: &CaptureOptions,
) -> IndexMap<String, String> {
    let mut env = spec.env.clone();
    let mut default = |key: &str, value: String| {
        env.entry(key.to_owned()).or_insert(value);
    };
    default("PYTHONUNBUFFERED", "1".to_owned());
    default("COLUMNS", options.columns.to_string());
    default("LINES", options.rows.to_string());
    match kind {
        SourceKind::Pty => {
            default("TERM", "xterm-256color".to_owned());
            default("FORCE_COLOR", "1".to_owned());
        }
        SourceKind::Pipe => default("TERM", "dumb".to_owned()),
    }
    env
}

pub struct PtyChildSource {
    // Held so the pty stays allocated until the source is dropped.
    _master: Box<dyn MasterPty + Send>,
    child: Box<dyn portable_pty::Child + Send + Sync>,
    reader: Option<Box<dyn Read + Send>>,
}

impl PtyChildSource {
    pub fn spawn(spec: &LaunchSpec, options: &CaptureOptions) -> Result<Self, CaptureError> {
        let pair = Self::open(options).map_err(|error| CaptureError::SpawnFailed {
            command: spec.display_command(),
            error,
        })?;
        Self::spawn_on(pair, spec, options)
    }

    fn open(options: &CaptureOptions) -> io::Result<portable_pty::PtyPair> {
        native_pty_system()
            .openpty(PtySize {
                rows: options.rows,
                cols: options.columns,
                pixel_width: 0,
                pixel_height: 0,
            })
            .map_err(|error| io::Error::other(error.to_string()))
    }

    fn spawn_on(
        pair: portable_pty::PtyPair,
        spec: &LaunchSpec,
        options: &CaptureOptions,
    ) -> Result<Self, CaptureError> {
        let spawn_failed = |error: io::Error| CaptureError::SpawnFailed {
            command: spec.display_command(),
            error,
        };

        let mut builder = CommandBuilder::new(&spec.program);
        builder.args(&spec.args);
        for (key, value) in launch_environment(spec, SourceKind::Pty, options) {
            builder.env(key, value);
        }
        if let Some(cwd) = &spec.cwd {
            builder.cwd(cwd);
        }

        let child = pair
            .slave
            .spawn_command(builder)
            .map_err(|error| match error.downcast::<io::Error>() {
                Ok(error) => error,
                Err(error) => io::Error::other(error.to_string()),
            })
            .map_err(spawn_failed)?;
        // The master only reports end of stream once every slave handle is
        // closed, ours included.
        drop(pair.slave);

        let reader = pair
            .master
            .try_clone_reader()
            .map_err(|error| io::Error::other(error.to_string()))
            .map_err(spawn_failed)?;

        Ok(Self {
            _master: pair.master,
            child,
            reader: Some(reader),
        })
    }
}

impl ChildSource for PtyChildSource {
    fn kind(&self) -> SourceKind {
        SourceKind::Pty
    }

    fn process_id(&self) -> Option<u32> {
        self.child.process_id()
    }

    fn take_reader(&mut self) -> Option<Box<dyn Read + Send>> {
        self.reader.take()
    }

    fn request_terminate(&mut self) -> io::Result<()> {
        #[cfg(unix)]
        {
            // The pty child leads its own session, so its pid is also its
            // process group id.
            match self.child.process_id() {
                Some(pid) => signal_process_group(pid, Signal::SIGTERM),
                None => Ok(()),
            }
        }
        #[cfg(not(unix))]
        {
            self.child.kill()
        }
    }

    fn try_wait(&mut self) -> io::Result<Option<ExitSummary>> {
        Ok(self.child.try_wait()?.map(|status| ExitSummary {
            code: i32::try_from(status.exit_code()).ok(),
            signal: None,
        }))
    }
}

pub struct PipeChildSource {
    child: Child,
    reader: Option<io::PipeReader>,
}

impl PipeChildSource {
    pub fn spawn(spec: &LaunchSpec, options: &CaptureOptions) -> Result<Self, CaptureError> {
        let spawn_failed = |error: io::Error| CaptureError::SpawnFailed {
            command: spec.display_command(),
            error,
        };
        let (reader, writer) = io::pipe().map_err(spawn_failed)?;
        let stderr = writer.try_clone().map_err(spawn_failed)?;

        let mut process = ProcessCommand::new(&spec.program);
        process
            .args(&spec.args)
            .envs(launch_environment(spec, SourceKind::Pipe, options))
            .stdin(Stdio::null())
            .stdout(writer)
            .stderr(stderr);
        if let Some(cwd) = &spec.cwd {
            process.current_dir(cwd);
        }
        #[cfg(unix)]
        unsafe {
            process.pre_exec(|| {
                setpgid(Pid::from_raw(0), Pid::from_raw(0)).map_err(io::Error::from)
            });
        }
        let child = process.spawn().map_err(spawn_failed)?;
        // `process` still owns the write ends; closing them lets the reader
        // see end of stream once the child exits.
        drop(process);

        Ok(Self {
            child,
            reader: Some(reader),
        })
    }
}

impl ChildSource for PipeChildSource {
    fn kind(&self) -> SourceKind {
        SourceKind::Pipe
    }

    fn process_id(&self) -> Option<u32> {
        Some(self.child.id())
    }

    fn take_reader(&mut self) -> Option<Box<dyn Read + Send>> {
        self.reader
            .take()
            .map(|reader| Box::new(reader) as Box<dyn Read + Send>)
    }

    fn request_terminate(&mut self) -> io::Result<()> {
        #[cfg(unix)]
        {
            signal_process_group(self.child.id(), Signal::SIGTERM)
        }
        #[cfg(not(unix))]
        {
            self.child.kill()
        }
    }

    fn try_wait(&mut self) -> io::Result<Option<ExitSummary>> {
        Ok(self.child.try_wait()?.map(ExitSummary::from))
    }
}

#[cfg(unix)]
fn signal_process_group(pid: u32, signal: Signal) -> io::Result<()> {
    let Ok(pid) = i32::try_from(pid) else {
        return Ok(());
    };
    if pid <= 0 {
        return Ok(());
    }
    match kill(Pid::from_raw(-pid), signal) {
        Ok(()) | Err(nix::errno::Errno::ESRCH) => Ok(()),
        Err(errno) => Err(io::Error::from(errno)),
    }
}

/// A pty master reports `EIO` instead of a zero-length read once the child
/// side has closed.
pub(super) fn is_end_of_stream(error: &io::Error) -> bool {
    #[cfg(unix)]
    {
        error.raw_os_error() == Some(nix::errno::Errno::EIO as i32)
    }
    #[cfg(not(unix))]
    {
        error.kind() == io::ErrorKind::BrokenPipe
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options() -> CaptureOptions {
        CaptureOptions::default()
    }

    #[test]
    fn defaults_fill_only_missing_keys() {
        let spec = LaunchSpec::new("pidcat")
            .with_env("TERM", "vt100")
            .with_env("ANDROID_SERIAL", "emulator-5554");
        let env = launch_environment(&spec, SourceKind::Pty, &options());
        assert_eq!(env.get("TERM").map(String::as_str), Some("vt100"));
        assert_eq!(
            env.get("ANDROID_SERIAL").map(String::as_str),
            Some("emulator-5554")
        );
        assert_eq!(env.get("PYTHONUNBUFFERED").map(String::as_str), Some("1"));
        assert_eq!(env.get("COLUMNS").map(String::as_str), Some("2000"));
        assert_eq!(env.get("LINES").map(String::as_str), Some("2000"));
        assert_eq!(env.get("FORCE_COLOR").map(String::as_str), Some("1"));
    }

    #[test]
    fn pipe_environment_marks_output_as_non_interactive() {
        let spec = LaunchSpec::new("pidcat");
        let env = launch_environment(&spec, SourceKind::Pipe, &options());
        assert_eq!(env.get("TERM").map(String::as_str), Some("dumb"));
        assert!(!env.contains_key("FORCE_COLOR"));
    }

    #[test]
    fn declared_environment_order_is_kept() {
        let spec = LaunchSpec::new("pidcat")
            .with_env("B", "2")
            .with_env("A", "1");
        let env = launch_environment(&spec, SourceKind::Pipe, &options());
        let keys = env.keys().take(2).cloned().collect::<Vec<String>>();
        assert_eq!(keys, vec!["B".to_owned(), "A".to_owned()]);
    }

    #[test]
    fn exit_summary_formats_like_a_diagnostic() {
        let exited = ExitSummary {
            code: Some(3),
            signal: None,
        };
        let signalled = ExitSummary {
            code: None,
            signal: Some(15),
        };
        assert_eq!(exited.to_string(), "exit=3");
        assert_eq!(signalled.to_string(), "signal=15");
        assert!(!exited.success());
    }
}
