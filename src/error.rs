//! Error types for ultra-audit
//!
//! Configuration errors abort a run before any check executes. Check errors
//! are recorded as skips or findings and never abort the run. Report errors
//! are printed but do not change the exit code.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Main error type for ultra-audit
#[derive(Error, Debug)]
pub enum AuditError {
    /// Configuration-related errors (fatal, exit code 10)
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Report rendering or writing errors
    #[error("Report error: {0}")]
    Report(#[from] ReportError),
}

/// Errors detected while loading configuration or resolving the run
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read the configuration file
    #[error("Failed to read config file '{path}': {source}")]
    FileRead {
        /// Path of the configuration file
        path: String,
        /// The underlying I/O error
        source: std::io::Error,
    },

    /// Failed to parse the configuration file
    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    /// `--category` named a category that does not exist
    #[error("Unknown category '{name}'. Available categories: {available}")]
    UnknownCategory {
        /// The requested category
        name: String,
        /// Comma separated list of valid ids
        available: String,
    },

    /// Unknown scoring preset in the configuration file
    #[error("Unknown scoring preset '{0}' (expected: standard, swiss)")]
    UnknownPreset(String),

    /// Invalid value in the configuration file or on the command line
    #[error("Invalid value for '{field}': {message}")]
    InvalidValue {
        /// The offending field
        field: &'static str,
        /// What is wrong with it
        message: String,
    },

    /// Invalid glob pattern in `[scan] exclude`
    #[error("Invalid exclude pattern '{pattern}': {source}")]
    Glob {
        /// The pattern as written
        pattern: String,
        /// The underlying glob error
        source: globset::Error,
    },

    /// The project root does not exist or is not a directory
    #[error("Project directory '{}' does not exist", .0.display())]
    MissingProject(PathBuf),

    /// The reports directory cannot be created or written
    #[error("Reports directory '{}' is not writable: {source}", path.display())]
    UnwritableReportDir {
        /// Reports directory
        path: PathBuf,
        /// The underlying I/O error
        source: std::io::Error,
    },
}

/// Conditions a check raises instead of returning findings
#[derive(Error, Debug)]
pub enum CheckError {
    /// A required external tool is not installed (or disabled)
    #[error("{tool} is not available")]
    ToolUnavailable {
        /// Name of the missing tool
        tool: String,
    },

    /// The check or one of its commands exceeded its time budget
    #[error("timed out after {}s", .0.as_secs())]
    TimedOut(Duration),

    /// The check itself failed to execute
    #[error("{0}")]
    Execution(String),
}

impl CheckError {
    /// Whether this condition is recorded as a skip rather than a finding
    pub fn is_skip(&self) -> bool {
        matches!(
            self,
            CheckError::ToolUnavailable { .. } | CheckError::TimedOut(_)
        )
    }
}

impl From<std::io::Error> for CheckError {
    fn from(err: std::io::Error) -> Self {
        CheckError::Execution(err.to_string())
    }
}

/// Errors raised while rendering or persisting a report
#[derive(Error, Debug)]
pub enum ReportError {
    /// A renderer failed to produce output
    #[error("Failed to render {format} report: {message}")]
    Render {
        /// Output format
        format: &'static str,
        /// Underlying error message
        message: String,
    },

    /// The rendered report could not be written
    #[error("Failed to write report '{}': {source}", path.display())]
    FileWrite {
        /// Target path
        path: PathBuf,
        /// The underlying I/O error
        source: std::io::Error,
    },
}

impl From<minijinja::Error> for ReportError {
    fn from(err: minijinja::Error) -> Self {
        ReportError::Render {
            format: "html",
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_error_skip_classification() {
        assert!(CheckError::ToolUnavailable {
            tool: "cargo".to_string()
        }
        .is_skip());
        assert!(CheckError::TimedOut(Duration::from_secs(5)).is_skip());
        assert!(!CheckError::Execution("boom".to_string()).is_skip());
    }

    #[test]
    fn test_unknown_category_message_lists_available() {
        let err = ConfigError::UnknownCategory {
            name: "nope".to_string(),
            available: "infrastructure, security".to_string(),
        };
        let message = err.to_string();
        assert!(message.contains("nope"));
        assert!(message.contains("infrastructure, security"));
    }

    #[test]
    fn test_timed_out_message() {
        let err = CheckError::TimedOut(Duration::from_secs(30));
        assert_eq!(err.to_string(), "timed out after 30s");
    }
}
