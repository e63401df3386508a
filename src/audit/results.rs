//! # Audit Findings
//!
//! This module defines the data structures for representing audit findings.
//!
//! ## Overview
//!
//! - [`Severity`] - Finding severity levels, ordered by impact
//! - [`Finding`] - Individual audit finding with location and remediation
//!
//! ## Examples
//!
//! ```rust
//! use ultra_audit::audit::{Finding, Severity};
//!
//! let finding = Finding::new("infrastructure", "schema", Severity::Critical, "schema.rs not found")
//!     .with_location("server/src/schema.rs")
//!     .with_remediation("Run `diesel print-schema > server/src/schema.rs`");
//!
//! assert_eq!(finding.location_or_na(), "server/src/schema.rs");
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Severity levels for audit findings.
///
/// Variants are declared by impact, so the derived ordering sorts
/// `Critical` first:
///
/// - **Critical** - Blocks deployment (exposed secrets, missing schema)
/// - **High** - Must be fixed before release
/// - **Medium** - Should be fixed
/// - **Low** - Cosmetic or minor quality issue
/// - **Info** - Informational, never penalized
/// - **Pass** / **Skip** - Check outcomes, shown only in verbose output
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Critical,
    High,
    Medium,
    Low,
    Info,
    Pass,
    Skip,
}

impl Severity {
    /// Severities that contribute to the score, in impact order
    pub const PENALIZED: [Severity; 4] = [
        Severity::Critical,
        Severity::High,
        Severity::Medium,
        Severity::Low,
    ];

    /// Severities that appear as findings in reports, in impact order
    pub const REPORTED: [Severity; 5] = [
        Severity::Critical,
        Severity::High,
        Severity::Medium,
        Severity::Low,
        Severity::Info,
    ];

    /// Upper-case label used in banners
    pub fn label(&self) -> &'static str {
        match self {
            Self::Critical => "CRITICAL",
            Self::High => "HIGH",
            Self::Medium => "MEDIUM",
            Self::Low => "LOW",
            Self::Info => "INFO",
            Self::Pass => "PASS",
            Self::Skip => "SKIP",
        }
    }

    /// Lower-case key used in JSON and CSS classes
    pub fn key(&self) -> &'static str {
        match self {
            Self::Critical => "critical",
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
            Self::Info => "info",
            Self::Pass => "pass",
            Self::Skip => "skip",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A single audit finding representing an issue detected in the project.
///
/// Findings are immutable once built: fields are only readable, and the
/// builder methods consume the value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Finding {
    severity: Severity,

    /// Id of the category that produced the finding (e.g. "security").
    category: String,

    /// Name of the check inside the category (e.g. "hardcoded-credentials").
    check: String,

    message: String,

    /// File/line or command reference, absent when not applicable.
    location: Option<String>,

    remediation: Option<String>,

    timestamp: DateTime<Utc>,
}

impl Finding {
    /// Create a new finding
    pub fn new(
        category: impl Into<String>,
        check: impl Into<String>,
        severity: Severity,
        message: impl Into<String>,
    ) -> Self {
        Self {
            severity,
            category: category.into(),
            check: check.into(),
            message: message.into(),
            location: None,
            remediation: None,
            timestamp: Utc::now(),
        }
    }

    /// Set the location
    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    /// Set the remediation hint
    pub fn with_remediation(mut self, remediation: impl Into<String>) -> Self {
        self.remediation = Some(remediation.into());
        self
    }

    pub fn severity(&self) -> Severity {
        self.severity
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn check(&self) -> &str {
        &self.check
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn location(&self) -> Option<&str> {
        self.location.as_deref()
    }

    /// Location, or `"N/A"` when the finding has none
    pub fn location_or_na(&self) -> &str {
        self.location.as_deref().unwrap_or("N/A")
    }

    pub fn remediation(&self) -> Option<&str> {
        self.remediation.as_deref()
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// Qualified check id (`category/check`)
    pub fn check_id(&self) -> String {
        format!("{}/{}", self.category, self.check)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_finding_builder() {
        let finding = Finding::new("security", "unsafe-code", Severity::Medium, "unsafe block")
            .with_location("src/lib.rs:42")
            .with_remediation("Wrap the block in a safe abstraction");

        assert_eq!(finding.category(), "security");
        assert_eq!(finding.check(), "unsafe-code");
        assert_eq!(finding.location(), Some("src/lib.rs:42"));
        assert_eq!(
            finding.remediation(),
            Some("Wrap the block in a safe abstraction")
        );
        assert_eq!(finding.check_id(), "security/unsafe-code");
    }

    #[test]
    fn test_location_defaults_to_na() {
        let finding = Finding::new("build", "tests", Severity::High, "cargo test failed");
        assert!(finding.location().is_none());
        assert_eq!(finding.location_or_na(), "N/A");
    }

    #[test]
    fn test_severity_ordering_by_impact() {
        assert!(Severity::Critical < Severity::High);
        assert!(Severity::High < Severity::Medium);
        assert!(Severity::Medium < Severity::Low);
        assert!(Severity::Low < Severity::Info);
        assert!(Severity::Info < Severity::Pass);
        assert!(Severity::Pass < Severity::Skip);
    }

    #[test]
    fn test_severity_serializes_lowercase() {
        let json = serde_json::to_string(&Severity::Critical).unwrap();
        assert_eq!(json, "\"critical\"");
        let parsed: Severity = serde_json::from_str("\"medium\"").unwrap();
        assert_eq!(parsed, Severity::Medium);
    }
}
