//! Score aggregation: path compliance, safety, accuracy, stability
//!
//! Category weights (defaults):
//! - Path compliance 40: share of accepted ticks spent on-path
//! - Safety 30: maximum minus accumulated deductions, floored at 0
//! - Accuracy 20: share of checkpoints passed
//! - Stability 10: completed hold time against the target hold time

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::session::hold::HoldTracker;
use crate::session::matcher::PathMatcher;
use crate::session::safety::SafetyMonitor;

/// Maximum score per category
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CategoryMaxima {
    pub path_compliance: f32,
    pub safety: f32,
    pub accuracy: f32,
    pub stability: f32,
}

impl Default for CategoryMaxima {
    fn default() -> Self {
        CategoryMaxima {
            path_compliance: 40.0,
            safety: 30.0,
            accuracy: 20.0,
            stability: 10.0,
        }
    }
}

impl CategoryMaxima {
    pub fn total(&self) -> f32 {
        self.path_compliance + self.safety + self.accuracy + self.stability
    }
}

/// Lowest percentage that earns a grade
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GradeCutoff {
    pub grade: String,
    pub min_percentage: f32,
}

/// Ordered percentage cutoffs, highest first, plus a grade for everything below
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GradeTable {
    pub cutoffs: Vec<GradeCutoff>,
    pub fallback: String,
}

impl Default for GradeTable {
    fn default() -> Self {
        let cutoffs = [
            ("A+", 95.0),
            ("A", 90.0),
            ("B+", 85.0),
            ("B", 80.0),
            ("C+", 70.0),
            ("C", 60.0),
            ("D", 50.0),
        ]
        .into_iter()
        .map(|(grade, min_percentage)| GradeCutoff {
            grade: grade.to_string(),
            min_percentage,
        })
        .collect();

        GradeTable {
            cutoffs,
            fallback: "F".to_string(),
        }
    }
}

impl GradeTable {
    /// Cutoffs must be finite and strictly descending; the fallback makes the
    /// mapping total, the ordering makes it monotonic
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.fallback.is_empty() || self.cutoffs.iter().any(|c| c.grade.is_empty()) {
            return Err(ConfigError::GradeTable("grade names must not be empty".into()));
        }
        if self.cutoffs.iter().any(|c| !c.min_percentage.is_finite()) {
            return Err(ConfigError::GradeTable("cutoffs must be finite".into()));
        }
        if !self
            .cutoffs
            .windows(2)
            .all(|pair| pair[0].min_percentage > pair[1].min_percentage)
        {
            return Err(ConfigError::GradeTable(
                "cutoffs must be strictly descending".into(),
            ));
        }
        Ok(())
    }

    pub fn grade(&self, percentage: f32) -> &str {
        self.cutoffs
            .iter()
            .find(|c| percentage >= c.min_percentage)
            .map(|c| c.grade.as_str())
            .unwrap_or(self.fallback.as_str())
    }

    /// Position of a grade from the top (0 = best), fallback last
    pub fn rank(&self, grade: &str) -> usize {
        self.cutoffs
            .iter()
            .position(|c| c.grade == grade)
            .unwrap_or(self.cutoffs.len())
    }
}

/// Engine-level scoring configuration
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    pub maxima: CategoryMaxima,
    /// Completed hold time that earns the full stability score
    pub target_hold_secs: f32,
    pub grades: GradeTable,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        ScoringConfig {
            maxima: CategoryMaxima::default(),
            target_hold_secs: 3.0,
            grades: GradeTable::default(),
        }
    }
}

impl ScoringConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let m = &self.maxima;
        for (field, value) in [
            ("maxima.path_compliance", m.path_compliance),
            ("maxima.safety", m.safety),
            ("maxima.accuracy", m.accuracy),
            ("maxima.stability", m.stability),
        ] {
            if !(value.is_finite() && value >= 0.0) {
                return Err(ConfigError::OutOfRange { field, value });
            }
        }
        if m.total() <= 0.0 {
            return Err(ConfigError::OutOfRange {
                field: "maxima",
                value: m.total(),
            });
        }
        if !(self.target_hold_secs.is_finite() && self.target_hold_secs > 0.0) {
            return Err(ConfigError::OutOfRange {
                field: "target_hold_secs",
                value: self.target_hold_secs,
            });
        }
        self.grades.validate()
    }
}

/// Category scores; totals and percentage are derived
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct ScoreBreakdown {
    pub path_compliance: f32,
    pub safety: f32,
    pub accuracy: f32,
    pub stability: f32,
    pub maxima: CategoryMaxima,
}

impl ScoreBreakdown {
    pub fn total(&self) -> f32 {
        self.path_compliance + self.safety + self.accuracy + self.stability
    }

    pub fn max_total(&self) -> f32 {
        self.maxima.total()
    }

    pub fn percentage(&self) -> f32 {
        100.0 * self.total() / self.max_total()
    }

    pub fn grade<'a>(&self, table: &'a GradeTable) -> &'a str {
        table.grade(self.percentage())
    }
}

/// Combines component state into a bounded composite score
#[derive(Clone, Debug)]
pub struct ScoreAggregator {
    config: ScoringConfig,
    ticks_evaluated: u64,
    ticks_on_path: u64,
}

impl ScoreAggregator {
    pub fn new(config: ScoringConfig) -> Self {
        ScoreAggregator {
            config,
            ticks_evaluated: 0,
            ticks_on_path: 0,
        }
    }

    /// Count one accepted tick
    pub fn record_tick(&mut self, on_path: bool) {
        self.ticks_evaluated += 1;
        if on_path {
            self.ticks_on_path += 1;
        }
    }

    pub fn compute(
        &self,
        matcher: &PathMatcher,
        safety: &SafetyMonitor,
        hold: &HoldTracker,
    ) -> ScoreBreakdown {
        let maxima = self.config.maxima;

        let on_path_share = if self.ticks_evaluated == 0 {
            0.0
        } else {
            self.ticks_on_path as f32 / self.ticks_evaluated as f32
        };

        let accuracy_share = match matcher.total_checkpoints() {
            0 => 1.0,
            total => matcher.checkpoints_passed() as f32 / total as f32,
        };

        let hold_share = (hold.total_hold_time() / self.config.target_hold_secs).min(1.0);

        ScoreBreakdown {
            path_compliance: maxima.path_compliance * on_path_share.clamp(0.0, 1.0),
            safety: safety.score(maxima.safety),
            accuracy: maxima.accuracy * accuracy_share.clamp(0.0, 1.0),
            stability: maxima.stability * hold_share.max(0.0),
            maxima,
        }
    }

    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    pub fn ticks_evaluated(&self) -> u64 {
        self.ticks_evaluated
    }

    pub fn ticks_on_path(&self) -> u64 {
        self.ticks_on_path
    }

    pub fn reset(&mut self) {
        self.ticks_evaluated = 0;
        self.ticks_on_path = 0;
    }
}
