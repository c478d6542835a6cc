//! crates/learning_engine_core/src/diagnostic.rs
//!
//! The diagnostic assessment controller.
//!
//! Answers are graded locally for immediate feedback and buffered in memory.
//! Nothing is sent per answer; the whole buffer goes to the backend as one
//! batch after the last item, and the backend's report drives the results view.

use tracing::{info, warn};
use uuid::Uuid;

use crate::domain::{
    DiagnosticBatch, DiagnosticItem, DiagnosticReport, DiagnosticResult, DiagnosticTest,
};
use crate::error::{EngineError, EngineResult};
use crate::evaluator::{evaluate, Verdict};
use crate::interaction::ResponseTimer;
use crate::ports::DiagnosticService;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticPhase {
    Answering { index: usize },
    Answered { index: usize, verdict: Verdict },
    /// Every item is answered; the batch has not been accepted yet.
    ReadyToSubmit,
    /// The batch was rejected or never arrived. The buffer is still held.
    SubmissionFailed,
    Completed,
}

impl DiagnosticPhase {
    pub fn name(&self) -> &'static str {
        match self {
            DiagnosticPhase::Answering { .. } => "answering",
            DiagnosticPhase::Answered { .. } => "showing feedback",
            DiagnosticPhase::ReadyToSubmit => "ready to submit",
            DiagnosticPhase::SubmissionFailed => "after a failed submission",
            DiagnosticPhase::Completed => "completed",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticAction {
    Submit,
    Continue,
    Finish,
}

impl DiagnosticAction {
    fn name(&self) -> &'static str {
        match self {
            DiagnosticAction::Submit => "submit an answer",
            DiagnosticAction::Continue => "continue",
            DiagnosticAction::Finish => "submit the diagnostic",
        }
    }
}

/// Immediate, local feedback for one answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiagnosticFeedback {
    pub verdict: Verdict,
    pub correct_index: usize,
    pub answered: usize,
    pub total: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticEvent {
    ItemPresented { index: usize },
    ReadyToSubmit,
}

pub struct DiagnosticSession {
    session_id: Uuid,
    learner_id: Uuid,
    test_id: String,
    items: Vec<DiagnosticItem>,
    phase: DiagnosticPhase,
    results: Vec<DiagnosticResult>,
    timer: ResponseTimer,
    report: Option<DiagnosticReport>,
}

impl DiagnosticSession {
    pub async fn start(service: &dyn DiagnosticService, learner_id: Uuid) -> EngineResult<Self> {
        let test = service.start_diagnostic(learner_id).await?;
        info!(
            test_id = %test.test_id,
            %learner_id,
            "Diagnostic started with {} items.",
            test.items.len()
        );
        Self::new(learner_id, test)
    }

    pub fn new(learner_id: Uuid, test: DiagnosticTest) -> EngineResult<Self> {
        if test.items.is_empty() {
            return Err(EngineError::EmptyDiagnostic);
        }
        let capacity = test.items.len();
        Ok(Self {
            session_id: Uuid::new_v4(),
            learner_id,
            test_id: test.test_id,
            items: test.items,
            phase: DiagnosticPhase::Answering { index: 0 },
            results: Vec::with_capacity(capacity),
            timer: ResponseTimer::start(),
            report: None,
        })
    }

    fn rejected(&self, action: DiagnosticAction) -> EngineError {
        EngineError::InvalidTransition {
            action: action.name(),
            phase: self.phase.name(),
        }
    }

    /// Grades the current item locally and buffers the result.
    pub fn submit_answer(&mut self, choice_index: usize) -> EngineResult<DiagnosticFeedback> {
        let DiagnosticPhase::Answering { index } = self.phase else {
            return Err(self.rejected(DiagnosticAction::Submit));
        };
        let item = &self.items[index];
        if choice_index >= item.choices.len() {
            return Err(EngineError::ChoiceOutOfRange {
                index: choice_index,
                choices: item.choices.len(),
            });
        }

        let verdict = evaluate(choice_index, item.correct_answer);
        self.results.push(DiagnosticResult {
            item_id: item.item_id.clone(),
            kc_id: item.kc_id.clone(),
            domain: item.kc_domain.clone(),
            is_correct: verdict.is_correct(),
            response_time_ms: self.timer.elapsed_ms(),
            selected_choice: choice_index,
        });
        let correct_index = item.correct_answer;
        self.phase = DiagnosticPhase::Answered { index, verdict };

        Ok(DiagnosticFeedback {
            verdict,
            correct_index,
            answered: self.results.len(),
            total: self.items.len(),
        })
    }

    pub fn advance(&mut self) -> EngineResult<DiagnosticEvent> {
        let DiagnosticPhase::Answered { index, .. } = self.phase else {
            return Err(self.rejected(DiagnosticAction::Continue));
        };

        let next = index + 1;
        if next >= self.items.len() {
            self.phase = DiagnosticPhase::ReadyToSubmit;
            return Ok(DiagnosticEvent::ReadyToSubmit);
        }
        self.phase = DiagnosticPhase::Answering { index: next };
        self.timer.restart();
        Ok(DiagnosticEvent::ItemPresented { index: next })
    }

    /// Submits the buffered results as one batch.
    ///
    /// A failure keeps the buffer so the learner can trigger another attempt;
    /// nothing is retried automatically.
    pub async fn finish(
        &mut self,
        service: &dyn DiagnosticService,
    ) -> EngineResult<&DiagnosticReport> {
        if !matches!(
            self.phase,
            DiagnosticPhase::ReadyToSubmit | DiagnosticPhase::SubmissionFailed
        ) {
            return Err(self.rejected(DiagnosticAction::Finish));
        }
        let batch = self.batch();

        match service.complete_diagnostic(&batch).await {
            Ok(report) => {
                info!(
                    test_id = %self.test_id,
                    correct = report.correct_count,
                    total = report.total_items,
                    "Diagnostic scored."
                );
                self.phase = DiagnosticPhase::Completed;
                Ok(self.report.insert(report))
            }
            Err(e) => {
                warn!(
                    test_id = %self.test_id,
                    buffered = self.results.len(),
                    "Diagnostic submission failed: {}",
                    e
                );
                self.phase = DiagnosticPhase::SubmissionFailed;
                Err(e.into())
            }
        }
    }

    pub fn batch(&self) -> DiagnosticBatch {
        DiagnosticBatch {
            learner_id: self.learner_id,
            test_id: self.test_id.clone(),
            results: self.results.clone(),
        }
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    pub fn test_id(&self) -> &str {
        &self.test_id
    }

    pub fn phase(&self) -> DiagnosticPhase {
        self.phase
    }

    pub fn current_item(&self) -> Option<(usize, &DiagnosticItem)> {
        match self.phase {
            DiagnosticPhase::Answering { index } | DiagnosticPhase::Answered { index, .. } => {
                self.items.get(index).map(|item| (index, item))
            }
            _ => None,
        }
    }

    pub fn total_items(&self) -> usize {
        self.items.len()
    }

    pub fn results(&self) -> &[DiagnosticResult] {
        &self.results
    }

    pub fn report(&self) -> Option<&DiagnosticReport> {
        self.report.as_ref()
    }
}
