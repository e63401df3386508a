//! CLI commands module

pub mod audit;
pub mod list;
