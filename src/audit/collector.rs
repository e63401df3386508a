//! Run-scoped accumulation of findings and check counters.
//!
//! A [`Collector`] lives for exactly one audit run. It is only ever written
//! by the runner; concurrently executed checks hand their outcomes back over
//! a channel so the collector itself needs no locking.

use serde::{Deserialize, Serialize};

use super::results::{Finding, Severity};

/// Snapshot of finding counts per reported severity
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeverityCounts {
    pub critical: usize,
    pub high: usize,
    pub medium: usize,
    pub low: usize,
    pub info: usize,
}

impl SeverityCounts {
    /// Count for a single severity (Pass and Skip are not findings and count 0)
    pub fn get(&self, severity: Severity) -> usize {
        match severity {
            Severity::Critical => self.critical,
            Severity::High => self.high,
            Severity::Medium => self.medium,
            Severity::Low => self.low,
            Severity::Info => self.info,
            Severity::Pass | Severity::Skip => 0,
        }
    }

    fn increment(&mut self, severity: Severity) {
        match severity {
            Severity::Critical => self.critical += 1,
            Severity::High => self.high += 1,
            Severity::Medium => self.medium += 1,
            Severity::Low => self.low += 1,
            Severity::Info => self.info += 1,
            Severity::Pass | Severity::Skip => {}
        }
    }

    /// Total number of reported findings
    pub fn total(&self) -> usize {
        self.critical + self.high + self.medium + self.low + self.info
    }

    /// Whether any finding carries a score penalty
    pub fn has_penalized(&self) -> bool {
        Severity::PENALIZED.iter().any(|s| self.get(*s) > 0)
    }
}

/// Outcome of one executed check, kept for verbose output
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum CheckStatus {
    Passed,
    Skipped { reason: String },
    Failed { findings: usize },
}

/// Per-check record in execution order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckEntry {
    /// Qualified check id (`category/check`)
    pub check: String,
    #[serde(flatten)]
    pub status: CheckStatus,
}

/// Accumulates findings and counters for one audit run
#[derive(Debug, Default)]
pub struct Collector {
    findings: Vec<Finding>,
    counts: SeverityCounts,
    entries: Vec<CheckEntry>,
    total_checks: usize,
    passed_checks: usize,
    skipped_checks: usize,
}

impl Collector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a finding and bump its severity counter.
    ///
    /// # Panics
    ///
    /// Pass and Skip are check outcomes, not findings; recording them here
    /// is a programming error. Use [`Collector::record_pass`] and
    /// [`Collector::record_skip`] instead.
    pub fn record(&mut self, finding: Finding) {
        assert!(
            !matches!(finding.severity(), Severity::Pass | Severity::Skip),
            "{} is a check outcome, not a finding severity",
            finding.severity()
        );
        self.counts.increment(finding.severity());
        self.findings.push(finding);
    }

    /// Count one executed check that produced no findings
    pub fn record_pass(&mut self, check_name: &str) {
        self.total_checks += 1;
        self.passed_checks += 1;
        self.entries.push(CheckEntry {
            check: check_name.to_string(),
            status: CheckStatus::Passed,
        });
    }

    /// Count one check that could not run
    pub fn record_skip(&mut self, check_name: &str, reason: impl Into<String>) {
        self.total_checks += 1;
        self.skipped_checks += 1;
        self.entries.push(CheckEntry {
            check: check_name.to_string(),
            status: CheckStatus::Skipped {
                reason: reason.into(),
            },
        });
    }

    /// Count one executed check together with its findings.
    ///
    /// An empty list is recorded as a pass.
    pub fn record_findings(&mut self, check_name: &str, findings: Vec<Finding>) {
        if findings.is_empty() {
            self.record_pass(check_name);
            return;
        }

        self.total_checks += 1;
        self.entries.push(CheckEntry {
            check: check_name.to_string(),
            status: CheckStatus::Failed {
                findings: findings.len(),
            },
        });
        for finding in findings {
            self.record(finding);
        }
    }

    pub fn severity_counts(&self) -> SeverityCounts {
        self.counts
    }

    /// All findings, in insertion order
    pub fn all_findings(&self) -> &[Finding] {
        &self.findings
    }

    /// Per-check outcomes, in execution order
    pub fn entries(&self) -> &[CheckEntry] {
        &self.entries
    }

    pub fn total_checks(&self) -> usize {
        self.total_checks
    }

    pub fn passed_checks(&self) -> usize {
        self.passed_checks
    }

    pub fn skipped_checks(&self) -> usize {
        self.skipped_checks
    }
}
