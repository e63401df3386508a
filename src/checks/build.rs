//! Build and test checks, driven through cargo

use crate::audit::{Category, Check, CheckContext, Finding, Severity};
use crate::error::CheckError;
use crate::tools::{CommandResult, Tool};

const CATEGORY: &str = "build";

pub fn category() -> Category {
    Category::new(CATEGORY, "Build & Tests")
        .with_check(CargoCheck)
        .with_check(ClippyCheck)
        .with_check(TestsCheck)
}

/// Number of `error` diagnostics in cargo output
fn error_count(result: &CommandResult) -> usize {
    result
        .combined()
        .lines()
        .filter(|l| l.starts_with("error[") || l.starts_with("error:"))
        .filter(|l| !l.starts_with("error: could not compile"))
        .count()
}

pub struct CargoCheck;

#[async_trait::async_trait]
impl Check for CargoCheck {
    fn name(&self) -> &'static str {
        "cargo-check"
    }

    fn description(&self) -> &'static str {
        "Project compiles (cargo check)"
    }

    fn failure_severity(&self) -> Severity {
        Severity::Critical
    }

    async fn run(&self, ctx: &CheckContext) -> Result<Vec<Finding>, CheckError> {
        if !ctx.scanner.file_exists("Cargo.toml") {
            return Ok(Vec::new());
        }

        let result = ctx
            .tools
            .require(Tool::Cargo, &["check", "--all-targets", "--quiet"], ctx.root())
            .await?;

        if result.success() {
            return Ok(Vec::new());
        }

        Ok(vec![Finding::new(
            CATEGORY,
            self.name(),
            Severity::Critical,
            format!(
                "Compilation failed with {} error(s): {}",
                error_count(&result),
                result.summary_line()
            ),
        )
        .with_remediation("Run `cargo check` and fix the reported errors")])
    }
}

pub struct ClippyCheck;

#[async_trait::async_trait]
impl Check for ClippyCheck {
    fn name(&self) -> &'static str {
        "clippy"
    }

    fn description(&self) -> &'static str {
        "No clippy warnings (cargo clippy -- -D warnings)"
    }

    fn failure_severity(&self) -> Severity {
        Severity::Medium
    }

    fn depends_on(&self) -> &'static [&'static str] {
        &["cargo-check"]
    }

    async fn run(&self, ctx: &CheckContext) -> Result<Vec<Finding>, CheckError> {
        if !ctx.scanner.file_exists("Cargo.toml") {
            return Ok(Vec::new());
        }

        let result = ctx
            .tools
            .require(
                Tool::CargoClippy,
                &["--quiet", "--", "-D", "warnings"],
                ctx.root(),
            )
            .await?;

        if result.success() {
            return Ok(Vec::new());
        }

        Ok(vec![Finding::new(
            CATEGORY,
            self.name(),
            Severity::Medium,
            format!("clippy reported {} issue(s)", error_count(&result)),
        )
        .with_remediation("Run `cargo clippy` and address the lints")])
    }
}

pub struct TestsCheck;

#[async_trait::async_trait]
impl Check for TestsCheck {
    fn name(&self) -> &'static str {
        "tests"
    }

    fn description(&self) -> &'static str {
        "Test suite passes (cargo test)"
    }

    fn depends_on(&self) -> &'static [&'static str] {
        &["cargo-check"]
    }

    async fn run(&self, ctx: &CheckContext) -> Result<Vec<Finding>, CheckError> {
        if !ctx.scanner.file_exists("Cargo.toml") {
            return Ok(Vec::new());
        }

        let result = ctx
            .tools
            .require(Tool::Cargo, &["test", "--quiet"], ctx.root())
            .await?;

        if result.success() {
            return Ok(Vec::new());
        }

        let failed: Vec<&str> = result
            .stdout
            .lines()
            .map(str::trim)
            .filter(|l| l.starts_with("test ") && l.ends_with("FAILED"))
            .collect();

        let message = if failed.is_empty() {
            format!("Test suite failed: {}", result.summary_line())
        } else {
            format!("{} test(s) failed", failed.len())
        };

        Ok(vec![Finding::new(CATEGORY, self.name(), Severity::High, message)
            .with_remediation("Run `cargo test` and fix the failing tests")])
    }
}
