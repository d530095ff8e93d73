use std::path::{Path, PathBuf};
use std::time::Duration;

use indexmap::IndexMap;
use ratatui::style::Color;

use crate::ansi::Palette;
use crate::capture::{
    CaptureMode, CaptureOptions, DEFAULT_READ_CHUNK_BYTES, DEFAULT_TERMINAL_SIZE,
};
use crate::noise::{NoiseFilter, DEFAULT_NOISE_PATTERNS};
use crate::search::{SearchEngine, DEFAULT_DEBOUNCE};

pub const CONFIG_ENV: &str = "PIDVIEW_CONFIG";
pub const CONFIG_FILE_NAME: &str = ".pidview.toml";

#[derive(Debug)]
pub enum ConfigError {
    Read {
        path: PathBuf,
        error: std::io::Error,
    },
    Parse {
        path: PathBuf,
        error: toml::de::Error,
    },
    Invalid(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Read { path, error } => {
                write!(f, "failed to read config {}: {error}", path.display())
            }
            ConfigError::Parse { path, error } => {
                write!(f, "failed to parse config {}: {error}", path.display())
            }
            ConfigError::Invalid(message) => write!(f, "invalid config: {message}"),
        }
    }
}

impl std::error::Error for ConfigError {}

#[derive(Debug, Clone, Default, PartialEq, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PidviewConfig {
    #[serde(default)]
    pub capture: CaptureConfig,
    #[serde(default)]
    pub filter: FilterConfig,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub palette: PaletteConfig,
    #[serde(default)]
    pub launch: LaunchConfig,
}

#[derive(Debug, Clone, PartialEq, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CaptureConfig {
    #[serde(default)]
    pub mode: CaptureMode,
    #[serde(default = "default_terminal_size")]
    pub columns: u16,
    #[serde(default = "default_terminal_size")]
    pub rows: u16,
    #[serde(default = "default_read_chunk_bytes")]
    pub read_chunk_bytes: usize,
    #[serde(default)]
    pub env: IndexMap<String, String>,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            mode: CaptureMode::Auto,
            columns: DEFAULT_TERMINAL_SIZE,
            rows: DEFAULT_TERMINAL_SIZE,
            read_chunk_bytes: DEFAULT_READ_CHUNK_BYTES,
            env: IndexMap::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FilterConfig {
    #[serde(default = "default_noise")]
    pub noise: Vec<String>,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            noise: default_noise(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SearchConfig {
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
    #[serde(default)]
    pub case_sensitive: bool,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
            case_sensitive: false,
        }
    }
}

/// Color overrides; any string ratatui parses as a `Color`.
#[derive(Debug, Clone, Default, PartialEq, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PaletteConfig {
    #[serde(default)]
    pub foreground: Option<Vec<Color>>,
    #[serde(default)]
    pub background: Option<Vec<Color>>,
    #[serde(default)]
    pub bright_background: Option<Vec<Color>>,
    #[serde(default)]
    pub default_foreground: Option<Color>,
    #[serde(default)]
    pub default_background: Option<Color>,
}

#[derive(Debug, Clone, Default, PartialEq, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LaunchConfig {
    #[serde(default)]
    pub command: Vec<String>,
    #[serde(default)]
    pub device: Option<String>,
    #[serde(default)]
    pub cwd: Option<PathBuf>,
}

fn default_terminal_size() -> u16 {
    DEFAULT_TERMINAL_SIZE
}

fn default_read_chunk_bytes() -> usize {
    DEFAULT_READ_CHUNK_BYTES
}

fn default_noise() -> Vec<String> {
    DEFAULT_NOISE_PATTERNS
        .iter()
        .map(|pattern| (*pattern).to_owned())
        .collect()
}

fn default_debounce_ms() -> u64 {
    u64::try_from(DEFAULT_DEBOUNCE.as_millis()).unwrap_or(250)
}

impl PidviewConfig {
    pub fn parse(source: &str, path: &Path) -> Result<Self, ConfigError> {
        let config = toml::from_str::<PidviewConfig>(source).map_err(|error| {
            ConfigError::Parse {
                path: path.to_path_buf(),
                error,
            }
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.capture.columns == 0 || self.capture.rows == 0 {
            return Err(ConfigError::Invalid(
                "capture.columns and capture.rows must be positive".to_owned(),
            ));
        }
        if self.capture.read_chunk_bytes == 0 {
            return Err(ConfigError::Invalid(
                "capture.read_chunk_bytes must be positive".to_owned(),
            ));
        }
        check_len("palette.foreground", self.palette.foreground.as_deref(), 16)?;
        check_len("palette.background", self.palette.background.as_deref(), 8)?;
        check_len(
            "palette.bright_background",
            self.palette.bright_background.as_deref(),
            8,
        )?;
        Ok(())
    }

    pub fn capture_options(&self) -> CaptureOptions {
        CaptureOptions {
            mode: self.capture.mode,
            columns: self.capture.columns,
            rows: self.capture.rows,
            read_chunk_bytes: self.capture.read_chunk_bytes,
        }
    }

    pub fn noise_filter(&self) -> NoiseFilter {
        NoiseFilter::new(&self.filter.noise)
    }

    pub fn search_engine(&self) -> SearchEngine {
        SearchEngine::new(Duration::from_millis(self.search.debounce_ms))
            .with_case_sensitive(self.search.case_sensitive)
    }

    pub fn palette(&self) -> Palette {
        let mut palette = Palette::default();
        let overrides = &self.palette;
        if let Some(colors) = overrides.foreground.as_deref() {
            copy_colors(&mut palette.foreground, colors);
        }
        if let Some(colors) = overrides.background.as_deref() {
            copy_colors(&mut palette.background, colors);
        }
        if let Some(colors) = overrides.bright_background.as_deref() {
            copy_colors(&mut palette.bright_background, colors);
        }
        if let Some(color) = overrides.default_foreground {
            palette.default_foreground = color;
        }
        if overrides.default_background.is_some() {
            palette.default_background = overrides.default_background;
        }
        palette
    }
}

fn check_len(field: &str, colors: Option<&[Color]>, expected: usize) -> Result<(), ConfigError> {
    match colors {
        Some(colors) if colors.len() != expected => Err(ConfigError::Invalid(format!(
            "{field} needs exactly {expected} colors, found {}",
            colors.len()
        ))),
        _ => Ok(()),
    }
}

fn copy_colors(target: &mut [Color], colors: &[Color]) {
    for (slot, color) in target.iter_mut().zip(colors) {
        *slot = *color;
    }
}

/// Where the config comes from: an explicit path must exist, the implicit
/// home file is optional.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    Explicit(PathBuf),
    Implicit(PathBuf),
    Defaults,
}

pub fn resolve_config_source(explicit: Option<&Path>) -> ConfigSource {
    if let Some(path) = explicit {
        return ConfigSource::Explicit(path.to_path_buf());
    }
    if let Some(path) = std::env::var_os(CONFIG_ENV).filter(|value| !value.is_empty()) {
        return ConfigSource::Explicit(PathBuf::from(path));
    }
    match std::env::var_os("HOME").filter(|value| !value.is_empty()) {
        Some(home) => ConfigSource::Implicit(PathBuf::from(home).join(CONFIG_FILE_NAME)),
        None => ConfigSource::Defaults,
    }
}

pub fn load_config(source: &ConfigSource) -> Result<PidviewConfig, ConfigError> {
    let path = match source {
        ConfigSource::Defaults => return Ok(PidviewConfig::default()),
        ConfigSource::Implicit(path) if !path.is_file() => return Ok(PidviewConfig::default()),
        ConfigSource::Explicit(path) | ConfigSource::Implicit(path) => path,
    };
    let source = std::fs::read_to_string(path).map_err(|error| ConfigError::Read {
        path: path.clone(),
        error,
    })?;
    let config = PidviewConfig::parse(&source, path)?;
    tracing::debug!(path = %path.display(), "config loaded");
    Ok(config)
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
