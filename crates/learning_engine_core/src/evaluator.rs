//! crates/learning_engine_core/src/evaluator.rs
//!
//! Answer evaluation for multiple-choice items.

/// The outcome of evaluating one answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Correct,
    Wrong,
}

impl Verdict {
    pub fn is_correct(self) -> bool {
        matches!(self, Verdict::Correct)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Verdict::Correct => "correct",
            Verdict::Wrong => "wrong",
        }
    }
}

/// Compares the selected choice with the canonical one. No partial credit.
pub fn evaluate(selected_index: usize, correct_index: usize) -> Verdict {
    if selected_index == correct_index {
        Verdict::Correct
    } else {
        Verdict::Wrong
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_index_match_is_correct() {
        assert_eq!(evaluate(2, 2), Verdict::Correct);
        assert!(evaluate(0, 0).is_correct());
    }

    #[test]
    fn any_other_index_is_wrong() {
        assert_eq!(evaluate(1, 2), Verdict::Wrong);
        assert_eq!(evaluate(3, 2), Verdict::Wrong);
        assert!(!evaluate(1, 0).is_correct());
    }
}
