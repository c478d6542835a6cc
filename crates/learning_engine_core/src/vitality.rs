//! crates/learning_engine_core/src/vitality.rs
//!
//! The bounded "hearts" counter.

/// Hearts remaining in a session, always within `0..=max`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Vitality {
    hearts: u32,
    max: u32,
}

impl Vitality {
    /// Starts full.
    pub fn new(max: u32) -> Self {
        Self { hearts: max, max }
    }

    pub fn hearts(&self) -> u32 {
        self.hearts
    }

    pub fn max(&self) -> u32 {
        self.max
    }

    /// Removes one heart, floored at zero, and returns what is left.
    pub fn lose_heart(&mut self) -> u32 {
        self.hearts = self.hearts.saturating_sub(1);
        self.hearts
    }

    pub fn is_depleted(&self) -> bool {
        self.hearts == 0
    }
}
