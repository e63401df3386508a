//! Check and category abstractions

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::Config;
use crate::error::CheckError;
use crate::scanner::Scanner;
use crate::tools::{Tool, ToolRunner};

use super::results::{Finding, Severity};

/// Everything a check may inspect. Shared read-only between checks.
pub struct CheckContext {
    pub scanner: Scanner,
    pub tools: ToolRunner,
    pub config: Config,
}

impl CheckContext {
    pub fn new(scanner: Scanner, tools: ToolRunner, config: Config) -> Self {
        Self {
            scanner,
            tools,
            config,
        }
    }

    /// Project root being audited
    pub fn root(&self) -> &Path {
        self.scanner.root()
    }
}

/// Command a check can run to fix its own findings (`--fix`)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Remediation {
    pub tool: Tool,
    pub args: Vec<String>,
    /// Working directory relative to the project root
    pub working_dir: Option<PathBuf>,
}

impl Remediation {
    pub fn new(tool: Tool, args: &[&str]) -> Self {
        Self {
            tool,
            args: args.iter().map(|a| a.to_string()).collect(),
            working_dir: None,
        }
    }

    /// Human readable command line
    pub fn command_line(&self) -> String {
        let mut line = self.tool.invocation().join(" ");
        for arg in &self.args {
            line.push(' ');
            line.push_str(arg);
        }
        line
    }
}

/// A named unit of inspection
#[async_trait::async_trait]
pub trait Check: Send + Sync {
    /// Name, unique within the owning category
    fn name(&self) -> &'static str;

    /// One-line description for `--list`
    fn description(&self) -> &'static str;

    /// Severity recorded when the check itself fails to execute
    fn failure_severity(&self) -> Severity {
        Severity::High
    }

    /// Sibling checks that must finish before this one starts
    fn depends_on(&self) -> &'static [&'static str] {
        &[]
    }

    /// Command that fixes this check's findings, if any
    fn remediation(&self, _ctx: &CheckContext) -> Option<Remediation> {
        None
    }

    async fn run(&self, ctx: &CheckContext) -> Result<Vec<Finding>, CheckError>;
}

/// An ordered group of related checks
pub struct Category {
    id: &'static str,
    title: &'static str,
    quick: bool,
    checks: Vec<Arc<dyn Check>>,
}

impl Category {
    pub fn new(id: &'static str, title: &'static str) -> Self {
        Self {
            id,
            title,
            quick: false,
            checks: Vec::new(),
        }
    }

    /// Mark the category as part of the `--quick` subset
    pub fn quick(mut self) -> Self {
        self.quick = true;
        self
    }

    pub fn with_check(mut self, check: impl Check + 'static) -> Self {
        self.checks.push(Arc::new(check));
        self
    }

    pub fn id(&self) -> &'static str {
        self.id
    }

    pub fn title(&self) -> &'static str {
        self.title
    }

    pub fn is_quick(&self) -> bool {
        self.quick
    }

    pub fn checks(&self) -> &[Arc<dyn Check>] {
        &self.checks
    }

    /// Whether `name` refers to this category (id or title, case-insensitive)
    pub fn matches(&self, name: &str) -> bool {
        self.id.eq_ignore_ascii_case(name) || self.title.eq_ignore_ascii_case(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Noop;

    #[async_trait::async_trait]
    impl Check for Noop {
        fn name(&self) -> &'static str {
            "noop"
        }

        fn description(&self) -> &'static str {
            "Does nothing"
        }

        async fn run(&self, _ctx: &CheckContext) -> Result<Vec<Finding>, CheckError> {
            Ok(Vec::new())
        }
    }

    #[test]
    fn test_category_builder() {
        let category = Category::new("monero", "Monero Crypto")
            .quick()
            .with_check(Noop);

        assert_eq!(category.id(), "monero");
        assert!(category.is_quick());
        assert_eq!(category.checks().len(), 1);
        assert_eq!(category.checks()[0].name(), "noop");
        assert_eq!(category.checks()[0].failure_severity(), Severity::High);
    }

    #[test]
    fn test_category_matches_id_and_title() {
        let category = Category::new("monero", "Monero Crypto");
        assert!(category.matches("monero"));
        assert!(category.matches("MONERO"));
        assert!(category.matches("monero crypto"));
        assert!(!category.matches("tor"));
    }

    #[test]
    fn test_remediation_command_line() {
        let fix = Remediation::new(Tool::Cargo, &["generate-lockfile"]);
        assert_eq!(fix.command_line(), "cargo generate-lockfile");

        let fmt = Remediation::new(Tool::CargoFmt, &[]);
        assert_eq!(fmt.command_line(), "cargo fmt");
    }
}
