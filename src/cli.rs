use std::path::PathBuf;

use crate::capture::{CaptureMode, LaunchSpec};
use crate::config::PidviewConfig;

pub const DEVICE_ENV: &str = "ANDROID_SERIAL";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Run(RunArgs),
    Help,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RunArgs {
    /// Program and arguments; empty means "use `[launch].command`".
    pub command: Vec<String>,
    pub config: Option<PathBuf>,
    pub device: Option<String>,
    pub env: Vec<(String, String)>,
    pub cwd: Option<PathBuf>,
    pub mode: Option<CaptureMode>,
    pub plain: bool,
    pub grep: Option<String>,
    pub ignore_case: bool,
    pub export: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CliParseError {
    MissingValue(&'static str),
    InvalidValue { flag: &'static str, value: String },
    InvalidEnv(String),
    UnknownArgument(String),
    MissingCommand,
}

impl std::fmt::Display for CliParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CliParseError::MissingValue(flag) => write!(f, "{flag} requires a value"),
            CliParseError::InvalidValue { flag, value } => {
                write!(f, "invalid value for {flag}: {value}")
            }
            CliParseError::InvalidEnv(raw) => {
                write!(f, "--env expects KEY=VALUE, got `{raw}`")
            }
            CliParseError::UnknownArgument(arg) => write!(f, "unknown argument: {arg}"),
            CliParseError::MissingCommand => write!(
                f,
                "no command to capture; pass one after the options or set [launch].command"
            ),
        }
    }
}

impl std::error::Error for CliParseError {}

pub fn parse_command<I>(args: I) -> Result<Command, CliParseError>
where
    I: IntoIterator<Item = String>,
{
    let mut args = args.into_iter();
    let mut run = RunArgs::default();

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--help" | "-h" => return Ok(Command::Help),
            "--config" => run.config = Some(PathBuf::from(value_for(&mut args, "--config")?)),
            "--device" | "-s" => run.device = Some(value_for(&mut args, "--device")?),
            "--env" | "-e" => {
                let raw = value_for(&mut args, "--env")?;
                let Some((key, value)) = raw.split_once('=').filter(|(key, _)| !key.is_empty())
                else {
                    return Err(CliParseError::InvalidEnv(raw));
                };
                run.env.push((key.to_owned(), value.to_owned()));
            }
            "--cwd" => run.cwd = Some(PathBuf::from(value_for(&mut args, "--cwd")?)),
            "--mode" => {
                let value = value_for(&mut args, "--mode")?;
                run.mode = Some(match value.as_str() {
                    "auto" => CaptureMode::Auto,
                    "pty" => CaptureMode::Pty,
                    "pipe" => CaptureMode::Pipe,
                    _ => {
                        return Err(CliParseError::InvalidValue {
                            flag: "--mode",
                            value,
                        })
                    }
                });
            }
            "--plain" => run.plain = true,
            "--grep" => run.grep = Some(value_for(&mut args, "--grep")?),
            "--ignore-case" | "-i" => run.ignore_case = true,
            "--export" => run.export = Some(PathBuf::from(value_for(&mut args, "--export")?)),
            "--" => {
                run.command.extend(args.by_ref());
                break;
            }
            other if other.starts_with('-') && other.len() > 1 => {
                return Err(CliParseError::UnknownArgument(other.to_owned()))
            }
            _ => {
                run.command.push(arg);
                run.command.extend(args.by_ref());
                break;
            }
        }
    }

    Ok(Command::Run(run))
}

fn value_for<I>(args: &mut I, flag: &'static str) -> Result<String, CliParseError>
where
    I: Iterator<Item = String>,
{
    args.next().ok_or(CliParseError::MissingValue(flag))
}

impl RunArgs {
    /// Builds the launch from the command line, falling back to the config's
    /// `[launch]` table. Command-line values win key by key.
    pub fn launch_spec(&self, config: &PidviewConfig) -> Result<LaunchSpec, CliParseError> {
        let command = if self.command.is_empty() {
            &config.launch.command
        } else {
            &self.command
        };
        let mut spec = LaunchSpec::from_command(command).ok_or(CliParseError::MissingCommand)?;
        for (key, value) in &config.capture.env {
            spec.env.insert(key.clone(), value.clone());
        }
        if let Some(device) = self.device.as_ref().or(config.launch.device.as_ref()) {
            spec.env.insert(DEVICE_ENV.to_owned(), device.clone());
        }
        for (key, value) in &self.env {
            spec.env.insert(key.clone(), value.clone());
        }
        spec.cwd = self.cwd.clone().or_else(|| config.launch.cwd.clone());
        Ok(spec)
    }
}

pub fn print_usage() {
    eprintln!(
        "pidview\n\nUSAGE:\n  pidview [OPTIONS] [--] <command> [args...]\n  pidview [OPTIONS]                  (uses [launch].command from the config)\n\nOPTIONS:\n  --config <PATH>      Config file (default: $PIDVIEW_CONFIG, then ~/.pidview.toml)\n  -s, --device <ID>    Device serial, exported to the child as ANDROID_SERIAL\n  -e, --env <K=V>      Extra environment variable for the child (repeatable)\n  --cwd <PATH>         Working directory for the child\n  --mode <MODE>        Capture through auto | pty | pipe\n  --plain              Stream lines to stdout instead of opening the viewer\n  --grep <QUERY>       Initial search; with --plain, print only matching lines\n  -i, --ignore-case    Match case-insensitively\n  --export <PATH>      With --plain, write the session to PATH on exit (.jsonl for JSON lines)\n\nVIEWER KEYS:\n  /  search   n/N  next/prev   c  case   g  grep   f  follow   w  wrap\n  ctrl+l  clear   s  export   r  restart   x  stop   h  help   q  quit\n\nENVIRONMENT:\n  PIDVIEW_LOG          Write diagnostic logs to this file (filter with RUST_LOG)\n\nGENERAL:\n  -h, --help           Print help\n"
    );
}

#[cfg(test)]
#[path = "tests/cli_tests.rs"]
mod tests;
