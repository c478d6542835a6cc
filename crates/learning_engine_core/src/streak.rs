//! crates/learning_engine_core/src/streak.rs
//!
//! Consecutive-correct tracking with one-shot milestones.

use crate::evaluator::Verdict;

/// The effect of one verdict on the streak.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreakUpdate {
    pub streak: u32,
    /// Set only on the answer that crosses a milestone.
    pub milestone: bool,
}

#[derive(Debug, Clone)]
pub struct StreakTracker {
    streak: u32,
    threshold: u32,
}

impl StreakTracker {
    pub fn new(threshold: u32) -> Self {
        Self {
            streak: 0,
            threshold: threshold.max(1),
        }
    }

    pub fn streak(&self) -> u32 {
        self.streak
    }

    pub fn threshold(&self) -> u32 {
        self.threshold
    }

    pub fn record(&mut self, verdict: Verdict) -> StreakUpdate {
        if !verdict.is_correct() {
            self.streak = 0;
            return StreakUpdate {
                streak: 0,
                milestone: false,
            };
        }

        // A run only climbs, so each multiple is crossed exactly once per run.
        self.streak += 1;
        StreakUpdate {
            streak: self.streak,
            milestone: self.streak % self.threshold == 0,
        }
    }
}
