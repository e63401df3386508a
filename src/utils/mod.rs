//! Utility modules for ultra-audit

pub mod timing;
