//! Code quality checks

use super::patterns::{DEBUG_OUTPUT, TODO_MARKER, UNWRAP_CALL};
use super::{code_only, group_by_file};
use crate::audit::{Category, Check, CheckContext, Finding, Remediation, Severity};
use crate::error::CheckError;
use crate::scanner::LineMatch;
use crate::tools::Tool;

const CATEGORY: &str = "quality";

pub fn category() -> Category {
    Category::new(CATEGORY, "Code Quality")
        .with_check(UnwrapUsageCheck)
        .with_check(DebugOutputCheck)
        .with_check(TodoMarkersCheck)
        .with_check(FormattingCheck)
}

/// One finding per file, located at the first match
fn per_file(
    check: &'static str,
    severity: Severity,
    matches: Vec<LineMatch>,
    describe: impl Fn(usize) -> String,
) -> Vec<Finding> {
    group_by_file(matches)
        .into_iter()
        .map(|group| {
            Finding::new(CATEGORY, check, severity, describe(group.len()))
                .with_location(group[0].location())
        })
        .collect()
}

/// Binaries and build scripts may print to stdout
fn is_binary_entry(path: &str) -> bool {
    path == "build.rs"
        || path.ends_with("/build.rs")
        || path.ends_with("src/main.rs")
        || path.contains("src/bin/")
}

pub struct UnwrapUsageCheck;

#[async_trait::async_trait]
impl Check for UnwrapUsageCheck {
    fn name(&self) -> &'static str {
        "unwrap-usage"
    }

    fn description(&self) -> &'static str {
        "No unwrap()/expect() in production code"
    }

    fn failure_severity(&self) -> Severity {
        Severity::Low
    }

    async fn run(&self, ctx: &CheckContext) -> Result<Vec<Finding>, CheckError> {
        let matches = code_only(ctx.scanner.search_production(&UNWRAP_CALL, &["rs"]));

        Ok(per_file(self.name(), Severity::Low, matches, |n| {
            format!("{} unwrap()/expect() call(s) in production code", n)
        }))
    }
}

pub struct DebugOutputCheck;

#[async_trait::async_trait]
impl Check for DebugOutputCheck {
    fn name(&self) -> &'static str {
        "debug-output"
    }

    fn description(&self) -> &'static str {
        "No println!/dbg! in library and server code"
    }

    fn failure_severity(&self) -> Severity {
        Severity::Low
    }

    async fn run(&self, ctx: &CheckContext) -> Result<Vec<Finding>, CheckError> {
        let matches: Vec<LineMatch> =
            code_only(ctx.scanner.search_production(&DEBUG_OUTPUT, &["rs"]))
                .into_iter()
                .filter(|m| !is_binary_entry(&m.path))
                .collect();

        Ok(per_file(self.name(), Severity::Low, matches, |n| {
            format!("{} println!/dbg! statement(s); use tracing instead", n)
        }))
    }
}

pub struct TodoMarkersCheck;

#[async_trait::async_trait]
impl Check for TodoMarkersCheck {
    fn name(&self) -> &'static str {
        "todo-markers"
    }

    fn description(&self) -> &'static str {
        "TODO/FIXME markers in production code"
    }

    fn failure_severity(&self) -> Severity {
        Severity::Info
    }

    async fn run(&self, ctx: &CheckContext) -> Result<Vec<Finding>, CheckError> {
        let matches = ctx.scanner.search_production(&TODO_MARKER, &["rs"]);

        Ok(per_file(self.name(), Severity::Info, matches, |n| {
            format!("{} TODO/FIXME marker(s)", n)
        }))
    }
}

/// `cargo fmt --check`
pub struct FormattingCheck;

#[async_trait::async_trait]
impl Check for FormattingCheck {
    fn name(&self) -> &'static str {
        "formatting"
    }

    fn description(&self) -> &'static str {
        "Sources are rustfmt-clean (cargo fmt)"
    }

    fn failure_severity(&self) -> Severity {
        Severity::Low
    }

    fn remediation(&self, _ctx: &CheckContext) -> Option<Remediation> {
        Some(Remediation::new(Tool::CargoFmt, &[]))
    }

    async fn run(&self, ctx: &CheckContext) -> Result<Vec<Finding>, CheckError> {
        if !ctx.scanner.file_exists("Cargo.toml") {
            return Ok(Vec::new());
        }

        let result = ctx
            .tools
            .require(Tool::CargoFmt, &["--check"], ctx.root())
            .await?;

        if result.success() {
            return Ok(Vec::new());
        }

        let files = result
            .stdout
            .lines()
            .filter(|l| l.starts_with("Diff in"))
            .filter_map(|l| l.split_whitespace().nth(2))
            .map(|p| p.trim_end_matches(':').rsplit_once(':').map_or(p, |(f, _)| f))
            .collect::<std::collections::BTreeSet<_>>()
            .len();

        let message = if files > 0 {
            format!("{} file(s) are not rustfmt-formatted", files)
        } else {
            format!("cargo fmt --check failed: {}", result.summary_line())
        };

        Ok(vec![Finding::new(CATEGORY, self.name(), Severity::Low, message)
            .with_remediation("Run `cargo fmt`")])
    }
}
