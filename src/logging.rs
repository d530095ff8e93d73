//! Diagnostic logging to a file.
//!
//! The viewer owns the terminal, so events never go to stdout/stderr. With
//! `PIDVIEW_LOG` unset no subscriber is installed and events are discarded.

use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

pub const LOG_FILE_ENV: &str = "PIDVIEW_LOG";
const DEFAULT_DIRECTIVE: &str = "pidview=debug";

pub fn log_path_from_env() -> Option<PathBuf> {
    std::env::var_os(LOG_FILE_ENV)
        .filter(|value| !value.is_empty())
        .map(PathBuf::from)
}

/// Installs the global subscriber writing to `path`. Filtering follows
/// `RUST_LOG`, defaulting to debug for this crate.
pub fn init_file_logging(path: &Path) -> std::io::Result<()> {
    let file = File::create(path)?;
    build_subscriber(file)
        .try_init()
        .map_err(|error| std::io::Error::other(error.to_string()))
}

pub fn build_subscriber(log_file: File) -> impl tracing::Subscriber + Send + Sync {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVE));
    let fmt_layer = fmt::layer()
        .with_ansi(false)
        .with_writer(Arc::new(log_file));

    tracing_subscriber::registry().with(fmt_layer).with(env_filter)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{SystemTime, UNIX_EPOCH};

    #[test]
    fn subscriber_writes_events_to_the_log_file() {
        let ts = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("time")
            .as_nanos();
        let path = std::env::temp_dir().join(format!("pidview-log-{ts}.log"));
        let file = File::create(&path).expect("create log");

        tracing::subscriber::with_default(build_subscriber(file), || {
            tracing::warn!(target: "pidview::capture", "child output closed early");
        });

        let contents = std::fs::read_to_string(&path).expect("read log");
        assert!(contents.contains("WARN"));
        assert!(contents.contains("child output closed early"));
        let _ = std::fs::remove_file(path);
    }
}
