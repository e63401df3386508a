//! JSON output formatting

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ReportRenderer;
use crate::audit::collector::{CheckEntry, SeverityCounts};
use crate::audit::scoring::Grade;
use crate::audit::{AuditReport, Finding, Severity};
use crate::error::ReportError;
use crate::utils::timing::CategoryTiming;

pub struct JsonOutput;

impl JsonOutput {
    pub fn new() -> Self {
        Self
    }
}

impl Default for JsonOutput {
    fn default() -> Self {
        Self::new()
    }
}

/// Machine-readable report document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonReport {
    pub version: String,
    pub project: String,
    pub summary: JsonSummary,
    /// Findings in insertion order
    pub results: Vec<JsonFinding>,
    pub checks: Vec<CheckEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonSummary {
    pub score: u32,
    pub grade: Grade,
    pub counts: SeverityCounts,
    pub total_checks: usize,
    pub passed_checks: usize,
    pub skipped_checks: usize,
    pub incomplete: bool,
    pub strict: bool,
    pub categories: Vec<String>,
    pub started_at: String,
    pub duration_ms: u64,
    /// Per-category cost, in execution order
    pub timings: Vec<CategoryTiming>,
}

/// One finding as written to JSON; a missing location reads `"N/A"`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonFinding {
    pub severity: Severity,
    pub category: String,
    pub check: String,
    pub message: String,
    pub location: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remediation: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl From<&Finding> for JsonFinding {
    fn from(finding: &Finding) -> Self {
        Self {
            severity: finding.severity(),
            category: finding.category().to_string(),
            check: finding.check().to_string(),
            message: finding.message().to_string(),
            location: finding.location_or_na().to_string(),
            remediation: finding.remediation().map(str::to_string),
            timestamp: finding.timestamp(),
        }
    }
}

impl From<&AuditReport> for JsonReport {
    fn from(report: &AuditReport) -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            project: report.project.clone(),
            summary: JsonSummary {
                score: report.score.value,
                grade: report.score.grade,
                counts: report.counts,
                total_checks: report.total_checks,
                passed_checks: report.passed_checks,
                skipped_checks: report.skipped_checks,
                incomplete: report.incomplete,
                strict: report.strict,
                categories: report.categories.iter().map(|c| c.id.clone()).collect(),
                started_at: report.started_at.to_rfc3339(),
                duration_ms: report.duration.as_millis() as u64,
                timings: report.timing.categories().to_vec(),
            },
            results: report.findings.iter().map(JsonFinding::from).collect(),
            checks: report.entries.clone(),
        }
    }
}

impl ReportRenderer for JsonOutput {
    fn render_report(&self, report: &AuditReport) -> Result<String, ReportError> {
        serde_json::to_string_pretty(&JsonReport::from(report)).map_err(|e| ReportError::Render {
            format: "json",
            message: e.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::report::CategorySummary;
    use crate::audit::{Collector, Scorer, Severity};
    use crate::utils::timing::RunTiming;
    use chrono::Utc;
    use pretty_assertions::assert_eq;
    use std::time::Duration;

    fn create_test_report() -> AuditReport {
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
        collector.record_findings(
            "quality/unwrap-usage",
            vec![Finding::new(
                "quality",
                "unwrap-usage",
                Severity::Low,
                "3 unwrap()/expect() call(s) in production code",
            )
            .with_location("src/orders.rs:12")],
        );
        collector.record_skip("build/cargo-check", "cargo is not available");

        let mut timing = RunTiming::new();
        timing.record(CategoryTiming::new(
            "infrastructure",
            1,
            1,
            Duration::from_millis(12),
        ));
        timing.record(CategoryTiming::new("quality", 2, 1, Duration::from_millis(30)));
        timing.finish(Duration::from_millis(42));

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
            &collector,
            &Scorer::default(),
            false,
            false,
            timing,
        )
    }

    #[test]
    fn test_render_report_shape() {
        let rendered = JsonOutput::new()
            .render_report(&create_test_report())
            .unwrap();
        let json: serde_json::Value = serde_json::from_str(&rendered).unwrap();

        assert_eq!(json["summary"]["score"], 79);
        assert_eq!(json["summary"]["grade"], "B");
        assert_eq!(json["summary"]["counts"]["critical"], 1);
        assert_eq!(json["summary"]["counts"]["low"], 1);
        assert_eq!(json["summary"]["total_checks"], 3);
        assert_eq!(json["summary"]["skipped_checks"], 1);
        assert_eq!(json["summary"]["incomplete"], false);
        assert_eq!(json["summary"]["duration_ms"], 42);
        assert_eq!(json["summary"]["timings"][1]["category"], "quality");
        assert_eq!(json["summary"]["timings"][1]["checks"], 2);
        assert_eq!(json["summary"]["timings"][1]["duration_ms"], 30);

        let first = &json["results"][0];
        assert_eq!(first["severity"], "critical");
        assert_eq!(first["category"], "infrastructure");
        assert_eq!(first["check"], "schema");
        assert_eq!(first["location"], "N/A");
        assert!(first["timestamp"].is_string());
        assert_eq!(json["results"][1]["location"], "src/orders.rs:12");

        assert_eq!(json["checks"][2]["status"], "skipped");
        assert_eq!(json["checks"][2]["reason"], "cargo is not available");
    }

    #[test]
    fn test_round_trip_preserves_counts() {
        let report = create_test_report();
        let rendered = JsonOutput::new().render_report(&report).unwrap();
        let parsed: JsonReport = serde_json::from_str(&rendered).unwrap();

        assert_eq!(parsed.summary.counts, report.counts);
        assert_eq!(parsed.results.len(), report.findings.len());
        assert_eq!(parsed.results[0].location, "N/A");
        assert_eq!(parsed.results[1].location, "src/orders.rs:12");
        assert_eq!(parsed, JsonReport::from(&report));
    }
}
