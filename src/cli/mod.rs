//! # CLI Module
//!
//! Command-line interface for ultra-audit, defined with `clap`.
//!
//! The interface is flat: a single invocation runs an audit of the project
//! in the current directory (or `-C DIR`) and exits with a code derived from
//! the findings.
//!
//! ## Submodules
//!
//! - [`commands`] - Audit and catalog listing
//! - [`exit_codes`] - Standardized exit codes
//! - [`output`] - Report output formatters (Terminal, JSON, HTML)
//!
//! ## Examples
//!
//! ```bash
//! # Full audit
//! ultra-audit
//!
//! # Quick pre-commit audit, failing on High findings too
//! ultra-audit --quick --strict
//!
//! # Only the Monero checks, with JSON and HTML reports
//! ultra-audit --category monero --json --html
//! ```

pub mod commands;
pub mod exit_codes;
pub mod output;

use clap::Parser;
use std::path::PathBuf;

/// ultra-audit - Production readiness audit for Rust marketplace services
#[derive(Parser, Debug)]
#[command(name = "ultra-audit")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v shows passed/skipped checks, -vv and up raise log level)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Fail on High (exit 2) and Medium (exit 3) findings, not only Critical
    #[arg(long)]
    pub strict: bool,

    /// Write a JSON report to the reports directory
    #[arg(long)]
    pub json: bool,

    /// Write an HTML report to the reports directory
    #[arg(long)]
    pub html: bool,

    /// Run only the quick subset of categories
    #[arg(long, conflicts_with = "category")]
    pub quick: bool,

    /// Run a single category, by number (see --list), id or title
    #[arg(long, value_name = "N")]
    pub category: Option<String>,

    /// Apply automatic fixes where a check provides one
    #[arg(long)]
    pub fix: bool,

    /// Project directory (defaults to current directory)
    #[arg(short = 'C', long, value_name = "DIR")]
    pub directory: Option<PathBuf>,

    /// Path to configuration file (defaults to .ultra-audit.toml in the project)
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Directory for log and report files
    #[arg(long, value_name = "DIR")]
    pub reports_dir: Option<PathBuf>,

    /// Run independent checks of a category concurrently
    #[arg(long)]
    pub parallel: bool,

    /// Maximum number of concurrently running checks
    #[arg(long, value_name = "N", value_parser = clap::value_parser!(u16).range(1..))]
    pub jobs: Option<u16>,

    /// Per-check timeout in seconds
    #[arg(long, value_name = "SECS", value_parser = clap::value_parser!(u64).range(1..))]
    pub timeout: Option<u64>,

    /// Global deadline in seconds; partial results are reported
    #[arg(long, value_name = "SECS", value_parser = clap::value_parser!(u64).range(1..))]
    pub deadline: Option<u64>,

    /// List categories and checks, then exit
    #[arg(long)]
    pub list: bool,

    /// Do not write a log file
    #[arg(long)]
    pub no_log: bool,
}
