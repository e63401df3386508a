//! Audit engine: findings, collection, scoring and the runner that drives
//! categories of checks against a project.

pub mod check;
pub mod collector;
pub mod report;
pub mod results;
pub mod runner;
pub mod scoring;

pub use check::{Category, Check, CheckContext, Remediation};
pub use collector::{Collector, SeverityCounts};
pub use report::AuditReport;
pub use results::{Finding, Severity};
pub use runner::{RunOptions, Runner, RunnerState, Selection};
pub use scoring::{Grade, Score, Scorer};
