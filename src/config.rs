//! Run configuration.
//!
//! Loaded from a TOML file (default `homogeneity.toml`). A few values can
//! be overridden from the environment, which `main` populates from `.env`
//! via `dotenv` first:
//!
//! - `HOMOGENEITY_CONFIG`      path of the TOML file
//! - `HOMOGENEITY_STORE_PATH`  series store to analyze
//! - `HOMOGENEITY_EVAL_START`  first day of the evaluation month
//!
//! Dates are quoted `YYYY-MM-DD` strings.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::Deserialize;

use crate::logging::LogLevel;
use crate::model::{BoundsError, WindowBounds};

pub const DEFAULT_CONFIG_PATH: &str = "homogeneity.toml";

/// Training baseline used when the file does not name one.
pub const DEFAULT_TRAINING_START: &str = "2024-01-01";

// ---------------------------------------------------------------------------
// File layout
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct ConfigFile {
    store_path: String,
    evaluation_start_date: String,
    training_start_date: Option<String>,
    plot_dir: Option<String>,
    #[serde(default)]
    report_format: ReportFormat,
    #[serde(default)]
    logging: LoggingSection,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingSection {
    level: Option<String>,
    file: Option<String>,
    #[serde(default)]
    timestamps: bool,
}

// ---------------------------------------------------------------------------
// Resolved configuration
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LoggingConfig {
    pub level: LogLevel,
    pub file: Option<String>,
    pub timestamps: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub store_path: PathBuf,
    pub training_start_date: NaiveDate,
    pub evaluation_start_date: NaiveDate,
    /// Where plot data is exported; `None` disables the visualization hook.
    pub plot_dir: Option<PathBuf>,
    pub report_format: ReportFormat,
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Training from `training_start_date` to the day before evaluation;
    /// evaluation for the calendar month starting at `evaluation_start_date`.
    pub fn window_bounds(&self) -> Result<WindowBounds, BoundsError> {
        WindowBounds::for_evaluation_month(self.training_start_date, self.evaluation_start_date)
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    Io { path: String, message: String },
    Parse(String),
    InvalidDate { field: &'static str, value: String },
    InvalidValue { field: &'static str, message: String },
    Bounds(BoundsError),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io { path, message } => {
                write!(f, "Cannot read config {}: {}", path, message)
            }
            ConfigError::Parse(msg) => write!(f, "Config parse error: {}", msg),
            ConfigError::InvalidDate { field, value } => {
                write!(f, "Invalid date for {}: '{}' (expected YYYY-MM-DD)", field, value)
            }
            ConfigError::InvalidValue { field, message } => {
                write!(f, "Invalid value for {}: {}", field, message)
            }
            ConfigError::Bounds(err) => write!(f, "Invalid analysis windows: {}", err),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<BoundsError> for ConfigError {
    fn from(err: BoundsError) -> Self {
        ConfigError::Bounds(err)
    }
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

/// Path of the config file: explicit argument, then `HOMOGENEITY_CONFIG`,
/// then the default.
pub fn config_path(cli_arg: Option<String>) -> PathBuf {
    cli_arg
        .or_else(|| std::env::var("HOMOGENEITY_CONFIG").ok())
        .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string())
        .into()
}

/// Reads the file, applies environment overrides and validates the result.
pub fn load_config(path: &Path) -> Result<AppConfig, ConfigError> {
    let text = fs::read_to_string(path).map_err(|e| ConfigError::Io {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;
    parse_config_with(&text, |key| std::env::var(key).ok())
}

/// Parses config text without consulting the environment.
pub fn parse_config(text: &str) -> Result<AppConfig, ConfigError> {
    parse_config_with(text, |_| None)
}

/// Parses config text, taking overrides from `env`.
pub fn parse_config_with(
    text: &str,
    env: impl Fn(&str) -> Option<String>,
) -> Result<AppConfig, ConfigError> {
    let file: ConfigFile = toml::from_str(text).map_err(|e| ConfigError::Parse(e.to_string()))?;

    let store_path = env("HOMOGENEITY_STORE_PATH").unwrap_or(file.store_path);
    let eval_start = env("HOMOGENEITY_EVAL_START").unwrap_or(file.evaluation_start_date);
    let train_start = file
        .training_start_date
        .unwrap_or_else(|| DEFAULT_TRAINING_START.to_string());

    let level = match file.logging.level {
        Some(level) => level.parse::<LogLevel>().map_err(|message| ConfigError::InvalidValue {
            field: "logging.level",
            message,
        })?,
        None => LogLevel::Info,
    };

    let config = AppConfig {
        store_path: PathBuf::from(store_path),
        training_start_date: parse_date_field("training_start_date", &train_start)?,
        evaluation_start_date: parse_date_field("evaluation_start_date", &eval_start)?,
        plot_dir: file.plot_dir.map(PathBuf::from),
        report_format: file.report_format,
        logging: LoggingConfig {
            level,
            file: file.logging.file,
            timestamps: file.logging.timestamps,
        },
    };

    // Reject boundaries the partitioner could not use.
    config.window_bounds()?;
    Ok(config)
}

fn parse_date_field(field: &'static str, value: &str) -> Result<NaiveDate, ConfigError> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").map_err(|_| ConfigError::InvalidDate {
        field,
        value: value.to_string(),
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
