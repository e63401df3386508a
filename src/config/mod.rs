//! Configuration module

pub mod loader;
pub mod presets;

pub use loader::Config;
pub use presets::Preset;

use serde::{Deserialize, Serialize};

use crate::audit::scoring::{GradeThresholds, ScoringWeights};

/// Scoring configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoringConfig {
    /// Scoring preset (standard, swiss)
    #[serde(default = "default_preset")]
    pub preset: String,

    /// Weight overrides on top of the preset
    #[serde(default)]
    pub weights: WeightOverrides,

    /// Grade threshold overrides on top of the preset
    #[serde(default)]
    pub thresholds: ThresholdOverrides,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            preset: default_preset(),
            weights: WeightOverrides::default(),
            thresholds: ThresholdOverrides::default(),
        }
    }
}

/// `[scoring.weights]`: only the listed severities replace the preset's
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeightOverrides {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub critical: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub high: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub medium: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub low: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub info: Option<u32>,
}

impl WeightOverrides {
    pub fn apply(&self, base: ScoringWeights) -> ScoringWeights {
        ScoringWeights {
            critical: self.critical.unwrap_or(base.critical),
            high: self.high.unwrap_or(base.high),
            medium: self.medium.unwrap_or(base.medium),
            low: self.low.unwrap_or(base.low),
            info: self.info.unwrap_or(base.info),
        }
    }
}

/// `[scoring.thresholds]`, merged over the preset the same way
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThresholdOverrides {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub a_plus: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub a: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub b: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub c: Option<u32>,
}

impl ThresholdOverrides {
    pub fn apply(&self, base: GradeThresholds) -> GradeThresholds {
        GradeThresholds {
            a_plus: self.a_plus.unwrap_or(base.a_plus),
            a: self.a.unwrap_or(base.a),
            b: self.b.unwrap_or(base.b),
            c: self.c.unwrap_or(base.c),
        }
    }
}

fn default_preset() -> String {
    "standard".to_string()
}

/// Execution configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionConfig {
    /// Run independent checks of a category concurrently
    #[serde(default)]
    pub parallel: bool,

    /// Maximum number of concurrently running checks
    #[serde(default = "default_jobs")]
    pub jobs: usize,

    /// Time budget for one check, in seconds
    #[serde(default = "default_check_timeout")]
    pub check_timeout_secs: u64,

    /// Time budget for one external command, in seconds
    #[serde(default = "default_command_timeout")]
    pub command_timeout_secs: u64,

    /// Global deadline for the whole run, in seconds
    #[serde(default)]
    pub deadline_secs: Option<u64>,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            parallel: false,
            jobs: default_jobs(),
            check_timeout_secs: default_check_timeout(),
            command_timeout_secs: default_command_timeout(),
            deadline_secs: None,
        }
    }
}

fn default_jobs() -> usize {
    4
}

fn default_check_timeout() -> u64 {
    600
}

fn default_command_timeout() -> u64 {
    300
}

/// External tool configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ToolsConfig {
    /// Tools treated as not installed (e.g. "curl" on offline CI runners)
    #[serde(default)]
    pub disabled: Vec<String>,
}

/// Check selection configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ChecksConfig {
    /// Checks to leave out, as `category/check`
    #[serde(default)]
    pub disabled: Vec<String>,
}

/// File scanning configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ScanConfig {
    /// Glob patterns (relative to the project root) excluded from scanning
    #[serde(default)]
    pub exclude: Vec<String>,
}

/// Report output configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportsConfig {
    /// Directory for log and report files, relative to the project root
    #[serde(default = "default_reports_dir")]
    pub directory: String,

    /// Whether to write a timestamped log file
    #[serde(default = "default_true")]
    pub log_file: bool,

    /// Number of issues listed in the "Top issues" section
    #[serde(default = "default_top_issues")]
    pub top_issues: usize,
}

impl Default for ReportsConfig {
    fn default() -> Self {
        Self {
            directory: default_reports_dir(),
            log_file: true,
            top_issues: default_top_issues(),
        }
    }
}

fn default_reports_dir() -> String {
    "audit-reports".to_string()
}

fn default_top_issues() -> usize {
    10
}

fn default_true() -> bool {
    true
}

/// `--quick` configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct QuickConfig {
    /// Category ids run by `--quick`; empty means the built-in quick set
    #[serde(default)]
    pub categories: Vec<String>,
}
