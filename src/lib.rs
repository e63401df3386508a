//! ultra-audit library
//!
//! Scored production-readiness audits for Rust marketplace workspaces:
//! infrastructure, security, Monero RPC hygiene, Tor/network exposure,
//! code quality and build health.

pub mod audit;
pub mod checks;
pub mod cli;
pub mod config;
pub mod error;
pub mod scanner;
pub mod tools;
pub mod utils;

pub use error::AuditError;
