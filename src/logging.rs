/// Structured logging for the homogeneity check
///
/// Provides context-rich logging with pipeline stage and category
/// identifiers, timestamps, and severity levels. Supports both console
/// output and an append-only log file for batch runs.

use chrono::Utc;
use std::fmt;
use std::fs::OpenOptions;
use std::io::Write;
use std::str::FromStr;
use std::sync::Mutex;

use crate::model::SeriesError;

// ---------------------------------------------------------------------------
// Log Levels
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Debug,
    Info,
    Warning,
    Error,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogLevel::Debug => write!(f, "DEBUG"),
            LogLevel::Info => write!(f, "INFO"),
            LogLevel::Warning => write!(f, "WARN"),
            LogLevel::Error => write!(f, "ERROR"),
        }
    }
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" | "warning" => Ok(LogLevel::Warning),
            "error" => Ok(LogLevel::Error),
            other => Err(format!("unknown log level '{}'", other)),
        }
    }
}

// ---------------------------------------------------------------------------
// Pipeline Stages
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Store,
    Normalize,
    Partition,
    Analyze,
    Render,
    System,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Store => write!(f, "STORE"),
            Stage::Normalize => write!(f, "NORM"),
            Stage::Partition => write!(f, "SPLIT"),
            Stage::Analyze => write!(f, "STATS"),
            Stage::Render => write!(f, "PLOT"),
            Stage::System => write!(f, "SYS"),
        }
    }
}

// ---------------------------------------------------------------------------
// Failure Classification
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureType {
    /// Expected failure - the category simply has nothing usable to analyze
    Expected,
    /// Unexpected failure - stored data is malformed or configuration is wrong
    Unexpected,
    /// Unknown - cannot determine if this is expected or not
    Unknown,
}

impl fmt::Display for FailureType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureType::Expected => write!(f, "EXPECTED"),
            FailureType::Unexpected => write!(f, "UNEXPECTED"),
            FailureType::Unknown => write!(f, "UNKNOWN"),
        }
    }
}

// ---------------------------------------------------------------------------
// Logger Configuration
// ---------------------------------------------------------------------------

/// Global logger instance
static LOGGER: Mutex<Option<Logger>> = Mutex::new(None);

pub struct Logger {
    /// Minimum log level to display
    min_level: LogLevel,
    /// Optional file path for logging
    log_file: Option<String>,
    /// Whether to include timestamps in console output
    console_timestamps: bool,
}

impl Logger {
    /// Initialize the global logger
    pub fn init(min_level: LogLevel, log_file: Option<String>, console_timestamps: bool) {
        let logger = Logger {
            min_level,
            log_file,
            console_timestamps,
        };

        // A poisoned lock only means an earlier holder panicked mid-write.
        let mut slot = LOGGER.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        *slot = Some(logger);
    }

    fn log(&self, level: LogLevel, stage: Stage, category: Option<&str>, message: &str) {
        if level < self.min_level {
            return;
        }

        let timestamp = Utc::now().format("%Y-%m-%d %H:%M:%S UTC");

        let category_part = category.map(|c| format!(" [{}]", c)).unwrap_or_default();
        let log_entry = format!(
            "{} {} {}{}: {}",
            timestamp, level, stage, category_part, message
        );

        // Console output
        if self.console_timestamps {
            match level {
                LogLevel::Error => eprintln!("{}", log_entry),
                LogLevel::Warning => eprintln!("   {}", log_entry),
                LogLevel::Info => println!("   {}", message),
                LogLevel::Debug => println!("   [DEBUG] {}", message),
            }
        } else {
            match level {
                LogLevel::Error => eprintln!("   ✗ {}{}: {}", stage, category_part, message),
                LogLevel::Warning => eprintln!("   ⚠ {}{}: {}", stage, category_part, message),
                LogLevel::Info => println!("   {}", message),
                LogLevel::Debug => {} // Skip debug in non-timestamp mode
            }
        }

        // File output
        if let Some(ref path) = self.log_file {
            if let Err(e) = Self::append_to_file(path, &log_entry) {
                eprintln!("Failed to write to log file {}: {}", path, e);
            }
        }
    }

    fn append_to_file(path: &str, entry: &str) -> std::io::Result<()> {
        let mut file = OpenOptions::new().create(true).append(true).open(path)?;
        writeln!(file, "{}", entry)?;
        Ok(())
    }
}

fn dispatch(level: LogLevel, stage: Stage, category: Option<&str>, message: &str) {
    if let Ok(guard) = LOGGER.lock() {
        if let Some(logger) = guard.as_ref() {
            logger.log(level, stage, category, message);
        }
    }
}

// ---------------------------------------------------------------------------
// Public Logging Functions
// ---------------------------------------------------------------------------

/// Initialize the global logger
pub fn init_logger(min_level: LogLevel, log_file: Option<&str>, console_timestamps: bool) {
    Logger::init(min_level, log_file.map(String::from), console_timestamps);
}

/// Log a general informational message
pub fn info(stage: Stage, category: Option<&str>, message: &str) {
    dispatch(LogLevel::Info, stage, category, message);
}

/// Log a warning message
pub fn warn(stage: Stage, category: Option<&str>, message: &str) {
    dispatch(LogLevel::Warning, stage, category, message);
}

/// Log an error message
pub fn error(stage: Stage, category: Option<&str>, message: &str) {
    dispatch(LogLevel::Error, stage, category, message);
}

/// Log a debug message
pub fn debug(stage: Stage, category: Option<&str>, message: &str) {
    dispatch(LogLevel::Debug, stage, category, message);
}

// ---------------------------------------------------------------------------
// Failure Classification Helpers
// ---------------------------------------------------------------------------

/// Classify a skipped category by what made its stored series unusable.
pub fn classify_series_failure(err: &SeriesError) -> FailureType {
    match err {
        // A null entry is how the exporter writes a category with no data.
        SeriesError::UnsupportedShape(kind) if kind == "null" => FailureType::Expected,
        SeriesError::UnsupportedShape(_) => FailureType::Unexpected,
    }
}

/// Level a classified failure is logged at. A skipped category is never
/// quieter than a warning.
pub fn failure_level(failure_type: FailureType) -> LogLevel {
    match failure_type {
        FailureType::Expected | FailureType::Unknown => LogLevel::Warning,
        FailureType::Unexpected => LogLevel::Error,
    }
}

// ---------------------------------------------------------------------------
// Structured Failure Logging
// ---------------------------------------------------------------------------

/// Log a category whose series could not be normalized
pub fn log_skipped_category(category: &str, err: &SeriesError) {
    let failure_type = classify_series_failure(err);
    log_category_failure(category, Stage::Normalize, "Normalization", failure_type, err);
}

/// Log a failed side step (or a skipped category) for one category
pub fn log_category_failure(
    category: &str,
    stage: Stage,
    operation: &str,
    failure_type: FailureType,
    err: &dyn std::error::Error,
) {
    let message = format!("{} failed [{}]: {}", operation, failure_type, err);
    dispatch(failure_level(failure_type), stage, Some(category), &message);
}

// ---------------------------------------------------------------------------
// Run Summary Logging
// ---------------------------------------------------------------------------

/// Log a summary of one analysis run
pub fn log_run_summary(total: usize, analyzed: usize, skipped: usize) {
    let message = format!(
        "Analysis complete: {}/{} categories analyzed, {} skipped",
        analyzed, total, skipped
    );

    if skipped == 0 {
        info(Stage::System, None, &message);
    } else if analyzed == 0 {
        error(Stage::System, None, &message);
    } else {
        warn(Stage::System, None, &message);
    }
}
