//! Wall-clock measurements for a run

use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy)]
pub struct Timer(Instant);

impl Timer {
    pub fn start() -> Self {
        Self(Instant::now())
    }

    pub fn elapsed(&self) -> Duration {
        self.0.elapsed()
    }
}

/// Short human form: `< 1ms`, `456ms`, `1.23s`, or `2m 05s` once a run
/// reaches a minute (cargo builds and tests routinely do).
pub fn format_duration(duration: Duration) -> String {
    let millis = duration.as_millis();
    let secs = duration.as_secs();

    match millis {
        0 => "< 1ms".to_string(),
        1..=999 => format!("{}ms", millis),
        _ if secs < 60 => format!("{:.2}s", duration.as_secs_f64()),
        _ => format!("{}m {:02}s", secs / 60, secs % 60),
    }
}

/// What one category cost: checks recorded, findings produced, elapsed time
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryTiming {
    pub category: String,
    pub checks: usize,
    pub findings: usize,
    pub duration_ms: u64,
}

impl CategoryTiming {
    pub fn new(category: &str, checks: usize, findings: usize, duration: Duration) -> Self {
        Self {
            category: category.to_string(),
            checks,
            findings,
            duration_ms: u64::try_from(duration.as_millis()).unwrap_or(u64::MAX),
        }
    }

    pub fn duration(&self) -> Duration {
        Duration::from_millis(self.duration_ms)
    }
}

/// Per-category timings in execution order, plus the total
#[derive(Debug, Clone, Default)]
pub struct RunTiming {
    categories: Vec<CategoryTiming>,
    total: Duration,
}

impl RunTiming {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, timing: CategoryTiming) {
        self.categories.push(timing);
    }

    pub fn finish(&mut self, total: Duration) {
        self.total = total;
    }

    pub fn total(&self) -> Duration {
        self.total
    }

    pub fn categories(&self) -> &[CategoryTiming] {
        &self.categories
    }

    /// Timing of a category that ran; categories cut off by cancellation
    /// before starting have none
    pub fn category(&self, id: &str) -> Option<&CategoryTiming> {
        self.categories.iter().find(|t| t.category == id)
    }
}
