pub mod ansi;
pub mod capture;
pub mod cli;
pub mod config;
pub mod export;
pub mod framer;
pub mod headless;
pub mod logging;
pub mod noise;
pub mod search;
pub mod session;
pub mod store;
pub mod tui;
pub mod ui;

pub use cli::{parse_command, print_usage, CliParseError, Command, RunArgs};
