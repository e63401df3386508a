//! Terminal output formatting with colors

use colored::{ColoredString, Colorize};

use super::ReportRenderer;
use crate::audit::collector::{CheckEntry, CheckStatus};
use crate::audit::report::Recommendation;
use crate::audit::{AuditReport, Finding, Severity};
use crate::error::ReportError;
use crate::utils::timing::format_duration;

pub struct TerminalOutput {
    verbose: bool,
    top_issues: usize,
}

impl TerminalOutput {
    pub fn new(verbose: bool, top_issues: usize) -> Self {
        Self {
            verbose,
            top_issues,
        }
    }

    fn severity_tag(severity: Severity) -> ColoredString {
        let label = format!("[{}]", severity.label());
        match severity {
            Severity::Critical => label.red().bold(),
            Severity::High => label.red(),
            Severity::Medium => label.yellow(),
            Severity::Low => label.blue(),
            Severity::Info => label.cyan(),
            Severity::Pass => label.green(),
            Severity::Skip => label.dimmed(),
        }
    }

    fn rule(title: &str) -> String {
        format!("\n{}\n{}\n\n", "━".repeat(60).dimmed(), title.bold())
    }

    fn format_header(&self, report: &AuditReport) -> String {
        format!(
            "\n{} v{}\n\n{} {}\n{} {}\n",
            "ultra-audit".cyan().bold(),
            env!("CARGO_PKG_VERSION"),
            "Project:".dimmed(),
            report.project.white().bold(),
            "Started:".dimmed(),
            report.started_at.format("%Y-%m-%d %H:%M:%S UTC"),
        )
    }

    fn format_finding(&self, finding: &Finding) -> String {
        let mut output = format!(
            "  {} {} {}\n",
            Self::severity_tag(finding.severity()),
            finding.check().cyan(),
            finding.message()
        );

        if let Some(location) = finding.location() {
            output.push_str(&format!("      {} {}\n", "└─".dimmed(), location.dimmed()));
        }
        if self.verbose {
            if let Some(remediation) = finding.remediation() {
                output.push_str(&format!("      {} {}\n", "fix:".dimmed(), remediation));
            }
        }

        output
    }

    fn format_entry(&self, entry: &CheckEntry) -> Option<String> {
        let name = entry
            .check
            .split_once('/')
            .map_or(entry.check.as_str(), |(_, n)| n);
        match &entry.status {
            CheckStatus::Passed => Some(format!(
                "  {} {}\n",
                Self::severity_tag(Severity::Pass),
                name.dimmed()
            )),
            CheckStatus::Skipped { reason } => Some(format!(
                "  {} {} {}\n",
                Self::severity_tag(Severity::Skip),
                name.dimmed(),
                format!("({})", reason).dimmed()
            )),
            CheckStatus::Failed { .. } => None,
        }
    }

    fn format_categories(&self, report: &AuditReport) -> String {
        let mut output = Self::rule("  AUDIT RESULTS");

        for category in &report.categories {
            let findings: Vec<&Finding> = report.findings_by_category(&category.id).collect();
            let entries: Vec<String> = if self.verbose {
                report
                    .entries_by_category(&category.id)
                    .filter_map(|e| self.format_entry(e))
                    .collect()
            } else {
                Vec::new()
            };

            let status = if findings.is_empty() {
                "✓".green()
            } else {
                format!("{}", findings.len()).yellow()
            };
            let timing = match report.timing.category(&category.id) {
                Some(t) if self.verbose => format!(
                    " {}",
                    format!("({} checks, {})", t.checks, format_duration(t.duration())).dimmed()
                ),
                _ => String::new(),
            };
            output.push_str(&format!("{} {}{}\n", status, category.title.bold(), timing));

            for finding in findings {
                output.push_str(&self.format_finding(finding));
            }
            for entry in entries {
                output.push_str(&entry);
            }
            output.push('\n');
        }

        output
    }

    fn format_top_issues(&self, report: &AuditReport) -> String {
        let top = report.top_issues(self.top_issues);
        if top.is_empty() {
            return String::new();
        }

        let mut output = Self::rule(&format!("  TOP {} ISSUES", top.len()));
        for (idx, finding) in top.iter().enumerate() {
            output.push_str(&format!(
                "{:>3}. {} {} ({})\n",
                idx + 1,
                Self::severity_tag(finding.severity()),
                finding.message(),
                finding.location_or_na().dimmed()
            ));
        }
        output
    }

    fn format_summary(&self, report: &AuditReport) -> String {
        let mut output = Self::rule("  SUMMARY");
        let counts = &report.counts;

        output.push_str(&format!(
            "Critical: {} │ High: {} │ Medium: {} │ Low: {} │ Info: {}\n",
            counts.critical.to_string().red().bold(),
            counts.high.to_string().red(),
            counts.medium.to_string().yellow(),
            counts.low.to_string().blue(),
            counts.info.to_string().cyan()
        ));
        output.push_str(&format!(
            "Checks: {} total, {} passed, {} skipped ({})\n",
            report.total_checks,
            report.passed_checks,
            report.skipped_checks,
            format_duration(report.duration)
        ));

        let score = format!("{}/100", report.score.value);
        let grade = report.score.grade.as_str();
        let (score, grade) = match report.recommendation() {
            Recommendation::Blocked => (score.red().bold(), grade.red().bold()),
            Recommendation::Caution => (score.yellow().bold(), grade.yellow().bold()),
            Recommendation::Ready => (score.green().bold(), grade.green().bold()),
        };
        output.push_str(&format!("Score: {}   Grade: {}\n", score, grade));

        if report.is_clean() {
            output.push_str(&format!("\n{}\n", "✓ No issues found".green().bold()));
        }

        let banner = report.recommendation().banner();
        output.push_str(&format!(
            "\n{}\n",
            match report.recommendation() {
                Recommendation::Blocked => banner.red().bold(),
                Recommendation::Caution => banner.yellow().bold(),
                Recommendation::Ready => banner.green().bold(),
            }
        ));

        if report.incomplete {
            output.push_str(&format!(
                "\n{}\n",
                "INCOMPLETE: the run was cancelled before every check finished"
                    .yellow()
                    .bold()
            ));
        }

        output
    }
}

impl Default for TerminalOutput {
    fn default() -> Self {
        Self::new(false, 10)
    }
}

impl ReportRenderer for TerminalOutput {
    fn render_report(&self, report: &AuditReport) -> Result<String, ReportError> {
        let mut output = String::new();

        output.push_str(&self.format_header(report));
        output.push_str(&self.format_categories(report));
        output.push_str(&self.format_top_issues(report));
        output.push_str(&self.format_summary(report));

        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::report::CategorySummary;
    use crate::audit::{Collector, Scorer};
    use crate::utils::timing::{CategoryTiming, RunTiming};
    use chrono::Utc;
    use std::time::Duration;

    fn report(collector: &Collector, incomplete: bool) -> AuditReport {
        let mut timing = RunTiming::new();
        timing.record(CategoryTiming::new(
            "infrastructure",
            3,
            1,
            Duration::from_millis(45),
        ));
        AuditReport::from_collector(
            "market",
            Utc::now(),
            vec![
                CategorySummary {
                    id: "infrastructure".to_string(),
                    title: "Infrastructure".to_string(),
                },
                CategorySummary {
                    id: "quality".to_string(),
                    title: "Code Quality".to_string(),
                },
            ],
            collector,
            &Scorer::default(),
            false,
            incomplete,
            timing,
        )
    }

    fn create_test_collector() -> Collector {
        let mut collector = Collector::new();
        collector.record_findings(
            "infrastructure/schema",
            vec![Finding::new(
                "infrastructure",
                "schema",
                Severity::Critical,
                "Database schema file schema.rs not found",
            )],
        );
        collector.record_pass("infrastructure/migrations");
        collector.record_skip("infrastructure/pending-migrations", "diesel is not available");
        collector.record_findings(
            "quality/todo-markers",
            vec![Finding::new("quality", "todo-markers", Severity::Info, "2 TODO/FIXME marker(s)")
                .with_location("src/escrow.rs:4")],
        );
        collector
    }

    #[test]
    fn test_render_groups_by_category() {
        colored::control::set_override(false);
        let rendered = TerminalOutput::default()
            .render_report(&report(&create_test_collector(), false))
            .unwrap();

        let infra = rendered.find("Infrastructure").unwrap();
        let quality = rendered.find("Code Quality").unwrap();
        let schema = rendered.find("schema.rs not found").unwrap();
        let todo = rendered.find("TODO/FIXME").unwrap();
        assert!(infra < schema && schema < quality && quality < todo);
        assert!(rendered.contains("src/escrow.rs:4"));
        assert!(rendered.contains("Score: 80/100"));
        assert!(rendered.contains("Grade: A"));
        assert!(rendered.contains("DO NOT DEPLOY"));
        assert!(!rendered.contains("[PASS]"), "pass entries only in verbose mode");
        assert!(!rendered.contains("3 checks"), "timings only in verbose mode");
    }

    #[test]
    fn test_verbose_shows_pass_and_skip() {
        colored::control::set_override(false);
        let rendered = TerminalOutput::new(true, 10)
            .render_report(&report(&create_test_collector(), false))
            .unwrap();

        assert!(rendered.contains("Infrastructure (3 checks, 45ms)"));
        assert!(rendered.contains("[PASS] migrations"));
        assert!(rendered.contains("[SKIP] pending-migrations (diesel is not available)"));
    }

    #[test]
    fn test_top_issues_limit() {
        colored::control::set_override(false);
        let mut collector = Collector::new();
        collector.record_findings(
            "quality/unwrap-usage",
            (0..5)
                .map(|i| {
                    Finding::new("quality", "unwrap-usage", Severity::Low, format!("issue {}", i))
                })
                .collect(),
        );

        let rendered = TerminalOutput::new(false, 2)
            .render_report(&report(&collector, false))
            .unwrap();
        assert!(rendered.contains("TOP 2 ISSUES"));
        assert!(rendered.contains("  2. [LOW] issue 1"));
        assert!(!rendered.contains("  3. [LOW]"));
    }

    #[test]
    fn test_clean_run_banner() {
        colored::control::set_override(false);
        let rendered = TerminalOutput::default()
            .render_report(&report(&Collector::new(), false))
            .unwrap();
        assert!(rendered.contains("No issues found"));
        assert!(rendered.contains("Score: 100/100"));
        assert!(rendered.contains("READY FOR DEPLOYMENT"));
        assert!(!rendered.contains("TOP"));
    }

    #[test]
    fn test_incomplete_banner() {
        colored::control::set_override(false);
        let rendered = TerminalOutput::default()
            .render_report(&report(&Collector::new(), true))
            .unwrap();
        assert!(rendered.contains("INCOMPLETE"));
    }
}
