//! Immutable snapshot of a finished run, consumed by the output renderers.

use chrono::{DateTime, Utc};
use std::time::Duration;

use super::collector::{CheckEntry, Collector, SeverityCounts};
use super::results::{Finding, Severity};
use super::scoring::{Score, Scorer};
use crate::utils::timing::RunTiming;

/// Category that took part in the run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategorySummary {
    pub id: String,
    pub title: String,
}

/// Deployment recommendation derived from the counts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recommendation {
    /// Critical findings present
    Blocked,
    /// High findings present
    Caution,
    /// Nothing above Medium
    Ready,
}

impl Recommendation {
    pub fn from_counts(counts: &SeverityCounts) -> Self {
        if counts.critical > 0 {
            Recommendation::Blocked
        } else if counts.high > 0 {
            Recommendation::Caution
        } else {
            Recommendation::Ready
        }
    }

    pub fn banner(&self) -> &'static str {
        match self {
            Recommendation::Blocked => "DO NOT DEPLOY - critical issues must be fixed first",
            Recommendation::Caution => "DEPLOY WITH CAUTION - high severity issues remain",
            Recommendation::Ready => "READY FOR DEPLOYMENT",
        }
    }
}

/// Everything a renderer needs to know about one run
#[derive(Debug, Clone)]
pub struct AuditReport {
    pub project: String,
    pub started_at: DateTime<Utc>,
    pub duration: Duration,
    pub categories: Vec<CategorySummary>,
    pub findings: Vec<Finding>,
    pub entries: Vec<CheckEntry>,
    pub counts: SeverityCounts,
    pub total_checks: usize,
    pub passed_checks: usize,
    pub skipped_checks: usize,
    pub score: Score,
    pub strict: bool,
    /// The run was cancelled or hit its deadline before every check ran
    pub incomplete: bool,
    pub timing: RunTiming,
}

impl AuditReport {
    /// Snapshot the collector and score it. The collector is only read.
    #[allow(clippy::too_many_arguments)]
    pub fn from_collector(
        project: impl Into<String>,
        started_at: DateTime<Utc>,
        categories: Vec<CategorySummary>,
        collector: &Collector,
        scorer: &Scorer,
        strict: bool,
        incomplete: bool,
        timing: RunTiming,
    ) -> Self {
        let counts = collector.severity_counts();

        Self {
            project: project.into(),
            started_at,
            duration: timing.total(),
            categories,
            findings: collector.all_findings().to_vec(),
            entries: collector.entries().to_vec(),
            counts,
            total_checks: collector.total_checks(),
            passed_checks: collector.passed_checks(),
            skipped_checks: collector.skipped_checks(),
            score: scorer.score(&counts),
            strict,
            incomplete,
            timing,
        }
    }

    pub fn findings_by_category<'a>(
        &'a self,
        category: &'a str,
    ) -> impl Iterator<Item = &'a Finding> {
        self.findings.iter().filter(move |f| f.category() == category)
    }

    pub fn findings_by_severity(&self, severity: Severity) -> impl Iterator<Item = &Finding> {
        self.findings.iter().filter(move |f| f.severity() == severity)
    }

    pub fn entries_by_category<'a>(
        &'a self,
        category: &'a str,
    ) -> impl Iterator<Item = &'a CheckEntry> {
        let prefix = format!("{}/", category);
        self.entries
            .iter()
            .filter(move |e| e.check.starts_with(&prefix))
    }

    /// The `n` most severe penalized findings, ties kept in insertion order
    pub fn top_issues(&self, n: usize) -> Vec<&Finding> {
        let mut issues: Vec<&Finding> = self
            .findings
            .iter()
            .filter(|f| Severity::PENALIZED.contains(&f.severity()))
            .collect();
        issues.sort_by_key(|f| f.severity());
        issues.truncate(n);
        issues
    }

    pub fn recommendation(&self) -> Recommendation {
        Recommendation::from_counts(&self.counts)
    }

    /// No finding of any reported severity
    pub fn is_clean(&self) -> bool {
        self.counts.total() == 0
    }
}
