//! External tool execution
//!
//! Every shell-out made by a check goes through [`ToolRunner`], which
//! distinguishes three outcomes:
//!
//! - the tool is not installed (or disabled in configuration),
//! - the tool did not finish within its time budget,
//! - the tool ran to completion (successfully or not).
//!
//! Checks turn the first two into skips and the last one into findings.

use std::collections::HashSet;
use std::fmt;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;
use tracing::debug;

use crate::error::CheckError;

/// Default time budget for a single external command
pub const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_secs(300);

/// External tools checks may depend on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tool {
    Cargo,
    CargoAudit,
    CargoClippy,
    CargoFmt,
    Diesel,
    Sqlite3,
    Curl,
    Git,
    Ss,
    Netstat,
}

impl Tool {
    pub const ALL: [Tool; 10] = [
        Tool::Cargo,
        Tool::CargoAudit,
        Tool::CargoClippy,
        Tool::CargoFmt,
        Tool::Diesel,
        Tool::Sqlite3,
        Tool::Curl,
        Tool::Git,
        Tool::Ss,
        Tool::Netstat,
    ];

    /// Name used in configuration and messages
    pub fn name(&self) -> &'static str {
        match self {
            Tool::Cargo => "cargo",
            Tool::CargoAudit => "cargo-audit",
            Tool::CargoClippy => "cargo-clippy",
            Tool::CargoFmt => "cargo-fmt",
            Tool::Diesel => "diesel",
            Tool::Sqlite3 => "sqlite3",
            Tool::Curl => "curl",
            Tool::Git => "git",
            Tool::Ss => "ss",
            Tool::Netstat => "netstat",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Tool::ALL
            .iter()
            .copied()
            .find(|t| t.name().eq_ignore_ascii_case(name.trim()))
    }

    /// Binary whose presence on `PATH` means the tool is installed
    pub fn probe_binary(&self) -> &'static str {
        self.name()
    }

    /// Program and leading arguments used to invoke the tool
    pub fn invocation(&self) -> &'static [&'static str] {
        match self {
            Tool::Cargo => &["cargo"],
            Tool::CargoAudit => &["cargo", "audit"],
            Tool::CargoClippy => &["cargo", "clippy"],
            Tool::CargoFmt => &["cargo", "fmt"],
            Tool::Diesel => &["diesel"],
            Tool::Sqlite3 => &["sqlite3"],
            Tool::Curl => &["curl"],
            Tool::Git => &["git"],
            Tool::Ss => &["ss"],
            Tool::Netstat => &["netstat"],
        }
    }

    /// Cargo subcommands also need cargo itself
    fn requires(&self) -> Option<Tool> {
        match self {
            Tool::CargoAudit | Tool::CargoClippy | Tool::CargoFmt => Some(Tool::Cargo),
            _ => None,
        }
    }
}

impl fmt::Display for Tool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Result of a command execution
#[derive(Debug, Clone)]
pub struct CommandResult {
    /// Exit code of the command (-1 when killed by a signal)
    pub exit_code: i32,
    /// Standard output (stdout)
    pub stdout: String,
    /// Standard error (stderr)
    pub stderr: String,
}

impl CommandResult {
    /// Check if the command succeeded (exit code 0)
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }

    /// stdout followed by stderr
    pub fn combined(&self) -> String {
        match (self.stdout.is_empty(), self.stderr.is_empty()) {
            (true, _) => self.stderr.clone(),
            (false, true) => self.stdout.clone(),
            (false, false) => format!("{}\n{}", self.stdout, self.stderr),
        }
    }

    /// Last non-empty line of combined output, for short messages
    pub fn summary_line(&self) -> String {
        self.combined()
            .lines()
            .rev()
            .map(str::trim)
            .find(|l| !l.is_empty())
            .unwrap_or("no output")
            .to_string()
    }
}

/// Outcome of running an external tool
#[derive(Debug, Clone)]
pub enum ToolOutcome {
    Completed(CommandResult),
    Unavailable,
    TimedOut(Duration),
}

/// Runs external tools with a bounded time budget
#[derive(Debug, Clone)]
pub struct ToolRunner {
    disabled: HashSet<Tool>,
    command_timeout: Duration,
}

impl Default for ToolRunner {
    fn default() -> Self {
        Self::new(DEFAULT_COMMAND_TIMEOUT)
    }
}

impl ToolRunner {
    pub fn new(command_timeout: Duration) -> Self {
        Self {
            disabled: HashSet::new(),
            command_timeout,
        }
    }

    /// Treat the given tools as not installed
    pub fn with_disabled(mut self, tools: impl IntoIterator<Item = Tool>) -> Self {
        self.disabled.extend(tools);
        self
    }

    pub fn command_timeout(&self) -> Duration {
        self.command_timeout
    }

    /// Whether the tool (and whatever it builds on) is installed and enabled
    pub fn is_available(&self, tool: Tool) -> bool {
        if self.disabled.contains(&tool) {
            return false;
        }
        if let Some(base) = tool.requires() {
            if !self.is_available(base) {
                return false;
            }
        }
        which::which(tool.probe_binary()).is_ok()
    }

    /// Run a tool with the default command timeout
    pub async fn run(&self, tool: Tool, args: &[&str], working_dir: &Path) -> ToolOutcome {
        self.run_with_timeout(tool, args, working_dir, self.command_timeout)
            .await
    }

    pub async fn run_with_timeout(
        &self,
        tool: Tool,
        args: &[&str],
        working_dir: &Path,
        timeout: Duration,
    ) -> ToolOutcome {
        if !self.is_available(tool) {
            debug!(tool = tool.name(), "Tool unavailable");
            return ToolOutcome::Unavailable;
        }

        let invocation = tool.invocation();
        let mut full_args: Vec<&str> = invocation[1..].to_vec();
        full_args.extend_from_slice(args);

        run_program(invocation[0], &full_args, working_dir, timeout).await
    }

    /// Run a tool and turn "unavailable" and "timed out" into check errors
    pub async fn require(
        &self,
        tool: Tool,
        args: &[&str],
        working_dir: &Path,
    ) -> Result<CommandResult, CheckError> {
        match self.run(tool, args, working_dir).await {
            ToolOutcome::Completed(result) => Ok(result),
            ToolOutcome::Unavailable => Err(CheckError::ToolUnavailable {
                tool: tool.name().to_string(),
            }),
            ToolOutcome::TimedOut(limit) => Err(CheckError::TimedOut(limit)),
        }
    }
}

/// Spawn a program and capture its output.
///
/// The child is killed when the timeout expires or when the returned future
/// is dropped (e.g. on cancellation).
pub(crate) async fn run_program(
    program: &str,
    args: &[&str],
    working_dir: &Path,
    timeout: Duration,
) -> ToolOutcome {
    let mut cmd = Command::new(program);
    cmd.args(args)
        .current_dir(working_dir)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    debug!(program, ?args, "Running external command");

    let child = match cmd.spawn() {
        Ok(child) => child,
        Err(e) => {
            debug!(program, error = %e, "Failed to spawn command");
            return ToolOutcome::Unavailable;
        }
    };

    match tokio::time::timeout(timeout, child.wait_with_output()).await {
        Ok(Ok(output)) => ToolOutcome::Completed(CommandResult {
            exit_code: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).trim().to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        }),
        Ok(Err(e)) => {
            debug!(program, error = %e, "Failed to collect command output");
            ToolOutcome::Unavailable
        }
        Err(_) => ToolOutcome::TimedOut(timeout),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cwd() -> std::path::PathBuf {
        std::env::current_dir().unwrap()
    }

    #[tokio::test]
    async fn test_run_program_success() {
        let outcome = run_program("echo", &["hello"], &cwd(), Duration::from_secs(5)).await;
        match outcome {
            ToolOutcome::Completed(result) => {
                assert!(result.success());
                assert_eq!(result.stdout, "hello");
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_run_program_failure_is_completed() {
        let outcome = run_program("false", &[], &cwd(), Duration::from_secs(5)).await;
        match outcome {
            ToolOutcome::Completed(result) => {
                assert!(!result.success());
                assert_eq!(result.exit_code, 1);
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_run_program_not_found_is_unavailable() {
        let outcome = run_program(
            "nonexistent_command_xyz",
            &[],
            &cwd(),
            Duration::from_secs(5),
        )
        .await;
        assert!(matches!(outcome, ToolOutcome::Unavailable));
    }

    #[tokio::test]
    async fn test_run_program_timeout() {
        let outcome = run_program("sleep", &["5"], &cwd(), Duration::from_millis(100)).await;
        assert!(matches!(outcome, ToolOutcome::TimedOut(_)));
    }

    #[tokio::test]
    async fn test_disabled_tool_is_unavailable() {
        let runner = ToolRunner::default().with_disabled([Tool::Git]);
        assert!(!runner.is_available(Tool::Git));

        let err = runner
            .require(Tool::Git, &["--version"], &cwd())
            .await
            .unwrap_err();
        assert!(err.is_skip());
        assert_eq!(err.to_string(), "git is not available");
    }

    #[test]
    fn test_cargo_subcommands_require_cargo() {
        let runner = ToolRunner::default().with_disabled([Tool::Cargo]);
        assert!(!runner.is_available(Tool::CargoAudit));
        assert!(!runner.is_available(Tool::CargoFmt));
    }

    #[test]
    fn test_tool_from_name() {
        assert_eq!(Tool::from_name("cargo-audit"), Some(Tool::CargoAudit));
        assert_eq!(Tool::from_name("SQLITE3"), Some(Tool::Sqlite3));
        assert_eq!(Tool::from_name("nmap"), None);
    }

    #[test]
    fn test_command_result_summary_line() {
        let result = CommandResult {
            exit_code: 101,
            stdout: String::new(),
            stderr: "warning: x\nerror: could not compile `server`\n".to_string(),
        };
        assert_eq!(result.summary_line(), "error: could not compile `server`");
    }
}
