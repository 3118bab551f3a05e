//! Hold tracking: time-integrated dwell on a qualifying pose
//!
//! - Accumulates `dt` while the predicate holds, resets to 0 when it breaks
//! - Completes once, then freezes at the required time until re-armed
//! - Keeps the total completed-hold time across re-arms

use crate::session::events::HoldProgress;

/// What a single update did
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HoldUpdate {
    pub progress: HoldProgress,
    /// Current time differs from the previous update
    pub changed: bool,
    /// Set only on the update that completed the hold
    pub just_completed: bool,
}

/// Dwell timer for one target state
#[derive(Clone, Debug)]
pub struct HoldTracker {
    current: f32,
    required: f32,
    completed: bool,
    completed_holds: u32,
}

impl HoldTracker {
    /// `required` must be > 0
    pub fn new(required: f32) -> Self {
        HoldTracker {
            current: 0.0,
            required,
            completed: false,
            completed_holds: 0,
        }
    }

    pub fn update(&mut self, predicate_satisfied: bool, dt: f32) -> HoldUpdate {
        let before = self.current;
        let mut just_completed = false;

        if !self.completed {
            if predicate_satisfied {
                self.current += dt;
                if self.current >= self.required {
                    self.current = self.required;
                    self.completed = true;
                    self.completed_holds += 1;
                    just_completed = true;
                    tracing::debug!(required = self.required, "hold completed");
                }
            } else {
                self.current = 0.0;
            }
        }

        HoldUpdate {
            progress: self.progress(),
            changed: self.current != before,
            just_completed,
        }
    }

    /// Start a fresh hold, keeping the completed-hold total
    pub fn rearm(&mut self) {
        self.current = 0.0;
        self.completed = false;
    }

    /// Clear everything, including completed-hold totals
    pub fn reset(&mut self) {
        self.rearm();
        self.completed_holds = 0;
    }

    pub fn progress(&self) -> HoldProgress {
        HoldProgress {
            current: self.current,
            required: self.required,
        }
    }

    pub fn is_completed(&self) -> bool {
        self.completed
    }

    pub fn completed_holds(&self) -> u32 {
        self.completed_holds
    }

    /// Seconds of hold credited by completed holds
    pub fn total_hold_time(&self) -> f32 {
        self.completed_holds as f32 * self.required
    }
}
