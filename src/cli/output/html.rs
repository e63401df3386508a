//! HTML report output
//!
//! Rendered with minijinja. The template is registered under a `.html`
//! name so every interpolated value is HTML-escaped.

use chrono::Local;
use minijinja::{context, Environment};
use serde::Serialize;

use super::ReportRenderer;
use crate::audit::report::Recommendation;
use crate::audit::{AuditReport, Severity};
use crate::error::ReportError;
use crate::utils::timing::format_duration;

const TEMPLATE_NAME: &str = "report.html";
const TEMPLATE: &str = include_str!("../../../templates/report.html");

pub struct HtmlReport;

impl HtmlReport {
    pub fn new() -> Self {
        Self
    }
}

impl Default for HtmlReport {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Serialize)]
struct CountItem {
    label: &'static str,
    count: usize,
}

#[derive(Serialize)]
struct FindingView<'a> {
    check: String,
    message: &'a str,
    location: Option<&'a str>,
    remediation: Option<&'a str>,
}

#[derive(Serialize)]
struct SeverityGroup<'a> {
    key: &'static str,
    label: &'static str,
    findings: Vec<FindingView<'a>>,
}

fn recommendation_class(recommendation: Recommendation) -> &'static str {
    match recommendation {
        Recommendation::Blocked => "blocked",
        Recommendation::Caution => "caution",
        Recommendation::Ready => "ready",
    }
}

impl ReportRenderer for HtmlReport {
    fn render_report(&self, report: &AuditReport) -> Result<String, ReportError> {
        let mut env = Environment::new();
        env.add_template(TEMPLATE_NAME, TEMPLATE)?;
        let template = env.get_template(TEMPLATE_NAME)?;

        let counts: Vec<CountItem> = Severity::REPORTED
            .iter()
            .map(|s| CountItem {
                label: s.label(),
                count: report.counts.get(*s),
            })
            .collect();

        let groups: Vec<SeverityGroup> = Severity::REPORTED
            .iter()
            .map(|s| SeverityGroup {
                key: s.key(),
                label: s.label(),
                findings: report
                    .findings_by_severity(*s)
                    .map(|f| FindingView {
                        check: f.check_id(),
                        message: f.message(),
                        location: f.location(),
                        remediation: f.remediation(),
                    })
                    .collect(),
            })
            .filter(|g| !g.findings.is_empty())
            .collect();

        let recommendation = report.recommendation();

        let rendered = template.render(context! {
            project => &report.project,
            version => env!("CARGO_PKG_VERSION"),
            generated_at => Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            duration => format_duration(report.duration),
            strict => report.strict,
            incomplete => report.incomplete,
            recommendation => recommendation.banner(),
            recommendation_class => recommendation_class(recommendation),
            score => report.score.value,
            grade => report.score.grade.as_str(),
            counts => counts,
            total_checks => report.total_checks,
            passed_checks => report.passed_checks,
            skipped_checks => report.skipped_checks,
            groups => groups,
        })?;

        Ok(rendered)
    }
}
