//! crates/learning_engine_core/src/remedial.rs
//!
//! The lesson's step list and remedial injection.

use crate::domain::{ContentOrigin, ContentStep, QuizStep, Step};

/// An ordered list of steps that can only grow during a session.
#[derive(Debug, Clone)]
pub struct StepSequence {
    steps: Vec<Step>,
    original_len: usize,
}

impl StepSequence {
    pub fn new(steps: Vec<Step>) -> Self {
        let original_len = steps.len();
        Self {
            steps,
            original_len,
        }
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Step> {
        self.steps.get(index)
    }

    pub fn original_len(&self) -> usize {
        self.original_len
    }

    /// Number of steps inserted since the session started.
    pub fn remedial_count(&self) -> usize {
        self.steps.len() - self.original_len
    }

    /// Splices an explanation of `quiz` right after `current`.
    /// Returns the index of the inserted step.
    pub fn insert_remedial(&mut self, current: usize, quiz: &QuizStep) -> usize {
        let at = (current + 1).min(self.steps.len());
        self.steps.insert(at, Step::Content(remedial_step(quiz)));
        at
    }
}

fn remedial_step(quiz: &QuizStep) -> ContentStep {
    let body = if quiz.explanation.trim().is_empty() {
        match quiz.choices.get(quiz.correct_index) {
            Some(answer) => format!("The correct answer is: {}", answer),
            None => quiz.stem.clone(),
        }
    } else {
        quiz.explanation.clone()
    };

    ContentStep {
        body,
        item_id: Some(quiz.item_id.clone()),
        kc_id: Some(quiz.kc_id.clone()),
        origin: ContentOrigin::Remedial {
            item_id: quiz.item_id.clone(),
        },
    }
}
