//! Exit codes for the CLI
//!
//! The exit code is derived from severity counts only; whether report files
//! could be written never changes it.
//!
//! # Exit Code Reference
//!
//! | Code | Constant | Meaning |
//! |------|----------|---------|
//! | 0 | `SUCCESS` | No blocking findings |
//! | 1 | `CRITICAL_ISSUES` | At least one Critical finding (always, strict or not) |
//! | 2 | `HIGH_ISSUES` | High findings under `--strict` |
//! | 3 | `MEDIUM_ISSUES` | Medium findings under `--strict` |
//! | 10 | `CONFIG_ERROR` | Bad flags, unknown category, unusable configuration |

use crate::audit::collector::SeverityCounts;

/// No blocking findings.
pub const SUCCESS: i32 = 0;

/// At least one Critical finding. Not affected by `--strict`.
pub const CRITICAL_ISSUES: i32 = 1;

/// High findings present and `--strict` given.
pub const HIGH_ISSUES: i32 = 2;

/// Medium findings present and `--strict` given.
pub const MEDIUM_ISSUES: i32 = 3;

/// Configuration or startup error. No check was run.
pub const CONFIG_ERROR: i32 = 10;

/// Map final severity counts to the process exit code
pub fn from_counts(counts: &SeverityCounts, strict: bool) -> i32 {
    if counts.critical > 0 {
        CRITICAL_ISSUES
    } else if strict && counts.high > 0 {
        HIGH_ISSUES
    } else if strict && counts.medium > 0 {
        MEDIUM_ISSUES
    } else {
        SUCCESS
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counts(critical: usize, high: usize, medium: usize, low: usize) -> SeverityCounts {
        SeverityCounts {
            critical,
            high,
            medium,
            low,
            info: 0,
        }
    }

    #[test]
    fn test_exit_codes_are_distinct() {
        let codes = [
            SUCCESS,
            CRITICAL_ISSUES,
            HIGH_ISSUES,
            MEDIUM_ISSUES,
            CONFIG_ERROR,
        ];
        for i in 0..codes.len() {
            for j in (i + 1)..codes.len() {
                assert_ne!(codes[i], codes[j]);
            }
        }
    }

    #[test]
    fn test_critical_overrides_strictness() {
        assert_eq!(from_counts(&counts(1, 0, 0, 0), false), CRITICAL_ISSUES);
        assert_eq!(from_counts(&counts(1, 0, 0, 0), true), CRITICAL_ISSUES);
        assert_eq!(from_counts(&counts(1, 3, 3, 0), true), CRITICAL_ISSUES);
    }

    #[test]
    fn test_high_only_fails_under_strict() {
        assert_eq!(from_counts(&counts(0, 1, 0, 0), true), HIGH_ISSUES);
        assert_eq!(from_counts(&counts(0, 1, 0, 0), false), SUCCESS);
    }

    #[test]
    fn test_medium_only_fails_under_strict() {
        assert_eq!(from_counts(&counts(0, 0, 2, 0), true), MEDIUM_ISSUES);
        assert_eq!(from_counts(&counts(0, 0, 2, 0), false), SUCCESS);
        assert_eq!(from_counts(&counts(0, 1, 2, 0), true), HIGH_ISSUES);
    }

    #[test]
    fn test_low_never_fails() {
        assert_eq!(from_counts(&counts(0, 0, 0, 9), true), SUCCESS);
        assert_eq!(from_counts(&SeverityCounts::default(), true), SUCCESS);
    }
}
