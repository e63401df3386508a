//! Score and grade computation.
//!
//! `score = max(0, 100 - Σ count[severity] * weight[severity])`, mapped to a
//! letter grade through inclusive lower bounds.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::collector::SeverityCounts;

/// Maximum (and starting) score
pub const MAX_SCORE: u32 = 100;

/// Penalty points per finding of each severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringWeights {
    pub critical: u32,
    pub high: u32,
    pub medium: u32,
    pub low: u32,
    pub info: u32,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            critical: 20,
            high: 10,
            medium: 3,
            low: 1,
            info: 0,
        }
    }
}

/// Inclusive lower bounds for each grade
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GradeThresholds {
    pub a_plus: u32,
    pub a: u32,
    pub b: u32,
    pub c: u32,
}

impl Default for GradeThresholds {
    fn default() -> Self {
        Self {
            a_plus: 90,
            a: 80,
            b: 70,
            c: 60,
        }
    }
}

impl GradeThresholds {
    /// Thresholds must be non-increasing from A+ down to C
    pub fn is_ordered(&self) -> bool {
        self.a_plus >= self.a && self.a >= self.b && self.b >= self.c && self.a_plus <= MAX_SCORE
    }
}

/// Letter grade
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Grade {
    #[serde(rename = "A+")]
    APlus,
    A,
    B,
    C,
    F,
}

impl Grade {
    pub fn as_str(&self) -> &'static str {
        match self {
            Grade::APlus => "A+",
            Grade::A => "A",
            Grade::B => "B",
            Grade::C => "C",
            Grade::F => "F",
        }
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Computed score for one run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Score {
    pub value: u32,
    pub grade: Grade,
}

/// Maps severity counts to a score and grade
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Scorer {
    weights: ScoringWeights,
    thresholds: GradeThresholds,
}

impl Scorer {
    pub fn new(weights: ScoringWeights, thresholds: GradeThresholds) -> Self {
        Self {
            weights,
            thresholds,
        }
    }

    pub fn weights(&self) -> &ScoringWeights {
        &self.weights
    }

    /// Total penalty for the given counts, saturating instead of overflowing
    pub fn penalty(&self, counts: &SeverityCounts) -> u64 {
        [
            (counts.critical, self.weights.critical),
            (counts.high, self.weights.high),
            (counts.medium, self.weights.medium),
            (counts.low, self.weights.low),
            (counts.info, self.weights.info),
        ]
        .iter()
        .fold(0u64, |acc, (count, weight)| {
            acc.saturating_add((*count as u64).saturating_mul(u64::from(*weight)))
        })
    }

    pub fn score(&self, counts: &SeverityCounts) -> Score {
        let penalty = self.penalty(counts);
        let value = u64::from(MAX_SCORE).saturating_sub(penalty) as u32;

        Score {
            value,
            grade: self.grade(value),
        }
    }

    pub fn grade(&self, value: u32) -> Grade {
        let t = &self.thresholds;
        if value >= t.a_plus {
            Grade::APlus
        } else if value >= t.a {
            Grade::A
        } else if value >= t.b {
            Grade::B
        } else if value >= t.c {
            Grade::C
        } else {
            Grade::F
        }
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
    fn test_clean_run_scores_100() {
        let score = Scorer::default().score(&SeverityCounts::default());
        assert_eq!(score.value, 100);
        assert_eq!(score.grade, Grade::APlus);
    }

    #[test]
    fn test_info_is_free() {
        let counts = SeverityCounts {
            info: 50,
            ..Default::default()
        };
        assert_eq!(Scorer::default().score(&counts).value, 100);
    }

    #[test]
    fn test_single_critical_is_grade_a() {
        let score = Scorer::default().score(&counts(1, 0, 0, 0));
        assert_eq!(score.value, 80);
        assert_eq!(score.grade, Grade::A);
    }

    #[test]
    fn test_mixed_penalties_are_additive() {
        // 20 + 2*10 + 3*3 + 4*1 = 53
        let score = Scorer::default().score(&counts(1, 2, 3, 4));
        assert_eq!(score.value, 47);
        assert_eq!(score.grade, Grade::F);
    }

    #[test]
    fn test_score_clamps_at_zero() {
        let score = Scorer::default().score(&counts(10, 10, 0, 0));
        assert_eq!(score.value, 0);
        assert_eq!(score.grade, Grade::F);

        let huge = Scorer::default().score(&counts(usize::MAX, usize::MAX, 0, 0));
        assert_eq!(huge.value, 0);
    }

    #[test]
    fn test_grade_boundaries_inclusive() {
        let scorer = Scorer::default();
        assert_eq!(scorer.grade(90), Grade::APlus);
        assert_eq!(scorer.grade(89), Grade::A);
        assert_eq!(scorer.grade(80), Grade::A);
        assert_eq!(scorer.grade(79), Grade::B);
        assert_eq!(scorer.grade(70), Grade::B);
        assert_eq!(scorer.grade(60), Grade::C);
        assert_eq!(scorer.grade(59), Grade::F);
        assert_eq!(scorer.grade(0), Grade::F);
    }

    #[test]
    fn test_score_monotonic_in_every_severity() {
        let scorer = Scorer::default();
        for base in 0..6 {
            let start = counts(base % 2, base % 3, base, base);
            let mut previous = scorer.score(&start).value;
            for step in 1..40 {
                let bumped = [
                    SeverityCounts {
                        critical: start.critical + step,
                        ..start
                    },
                    SeverityCounts {
                        high: start.high + step,
                        ..start
                    },
                    SeverityCounts {
                        medium: start.medium + step,
                        ..start
                    },
                    SeverityCounts {
                        low: start.low + step,
                        ..start
                    },
                ];
                let current_low = scorer.score(&bumped[3]).value;
                assert!(current_low <= previous);
                for candidate in &bumped {
                    assert!(scorer.score(candidate).value <= scorer.score(&start).value);
                }
                previous = current_low;
            }
        }
    }

    #[test]
    fn test_custom_weights() {
        let weights = ScoringWeights {
            critical: 25,
            ..Default::default()
        };
        let scorer = Scorer::new(weights, GradeThresholds::default());
        let score = scorer.score(&counts(1, 0, 0, 0));
        assert_eq!(score.value, 75);
        assert_eq!(score.grade, Grade::B);
    }

    #[test]
    fn test_thresholds_ordering() {
        assert!(GradeThresholds::default().is_ordered());
        let broken = GradeThresholds {
            a: 95,
            ..Default::default()
        };
        assert!(!broken.is_ordered());
    }

    #[test]
    fn test_grade_serializes_as_letter() {
        assert_eq!(serde_json::to_string(&Grade::APlus).unwrap(), "\"A+\"");
        assert_eq!(Grade::APlus.to_string(), "A+");
    }
}
