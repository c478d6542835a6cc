//! crates/learning_engine_core/src/review.rs
//!
//! The spaced-repetition review controller.
//!
//! The backend decides what is due and why; this controller only walks the
//! queue once, grading and logging each answer and showing the item's own
//! explanation inline. There is no remedial insertion here.

use tracing::{info, warn};
use uuid::Uuid;

use crate::commands::{EngineCommand, FlowKind};
use crate::context::SessionContext;
use crate::domain::{
    InputMode, InteractionRecord, QueueStats, ReviewItem, ReviewQueue, ReviewReason,
};
use crate::error::{EngineError, EngineResult};
use crate::evaluator::{evaluate, Verdict};
use crate::interaction::ResponseTimer;
use crate::ports::ReviewService;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewPhase {
    Answering { index: usize },
    /// Feedback and the explanation panel are showing.
    Evaluated { index: usize, verdict: Verdict },
    Complete,
}

impl ReviewPhase {
    pub fn name(&self) -> &'static str {
        match self {
            ReviewPhase::Answering { .. } => "answering",
            ReviewPhase::Evaluated { .. } => "evaluated",
            ReviewPhase::Complete => "complete",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewAction {
    Submit,
    Continue,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReviewFeedback {
    pub verdict: Verdict,
    pub correct_index: usize,
    pub explanation: String,
    pub reason: ReviewReason,
    pub correct: u32,
    pub total: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReviewSummary {
    pub session_id: Uuid,
    pub correct: u32,
    pub total: u32,
    pub accuracy: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ReviewEvent {
    ItemPresented { index: usize },
    Completed(ReviewSummary),
}

pub struct ReviewSession {
    session_id: Uuid,
    context: SessionContext,
    items: Vec<ReviewItem>,
    stats: QueueStats,
    phase: ReviewPhase,
    correct: u32,
    total: u32,
    timer: ResponseTimer,
}

impl ReviewSession {
    pub async fn start(service: &dyn ReviewService, context: SessionContext) -> EngineResult<Self> {
        let queue = service.fetch_review_queue(context.learner_id).await?;
        info!(
            learner_id = %context.learner_id,
            due = queue.stats.due_reviews,
            mistakes = queue.stats.mistake_reviews,
            low_mastery = queue.stats.low_mastery_reviews,
            "Fetched review queue with {} items.",
            queue.items.len()
        );
        Ok(Self::new(context, queue))
    }

    /// An empty queue yields a session that is already complete.
    pub fn new(context: SessionContext, queue: ReviewQueue) -> Self {
        let stats = queue.stats;
        let supplied = u64::from(stats.due_reviews)
            + u64::from(stats.mistake_reviews)
            + u64::from(stats.low_mastery_reviews);
        if supplied != u64::from(stats.total) {
            warn!(
                supplied,
                total = stats.total,
                "Review queue stats do not add up; showing them as supplied."
            );
        }

        let phase = if queue.items.is_empty() {
            ReviewPhase::Complete
        } else {
            ReviewPhase::Answering { index: 0 }
        };
        Self {
            session_id: Uuid::new_v4(),
            context,
            items: queue.items,
            stats,
            phase,
            correct: 0,
            total: 0,
            timer: ResponseTimer::start(),
        }
    }

    fn rejected(&self, action: ReviewAction) -> EngineError {
        EngineError::InvalidTransition {
            action: match action {
                ReviewAction::Submit => "submit an answer",
                ReviewAction::Continue => "continue",
            },
            phase: self.phase.name(),
        }
    }

    pub fn submit_answer(&mut self, choice_index: usize) -> EngineResult<ReviewFeedback> {
        let ReviewPhase::Answering { index } = self.phase else {
            return Err(self.rejected(ReviewAction::Submit));
        };
        let item = &self.items[index];
        if choice_index >= item.choices.len() {
            return Err(EngineError::ChoiceOutOfRange {
                index: choice_index,
                choices: item.choices.len(),
            });
        }

        let verdict = evaluate(choice_index, item.correct_answer_index);
        self.total += 1;
        if verdict.is_correct() {
            self.correct += 1;
        }

        self.context.logger.log(InteractionRecord {
            learner_id: self.context.learner_id,
            item_id: item.item_id.clone(),
            kc_id: item.kc_id.clone(),
            session_id: self.session_id,
            is_correct: verdict.is_correct(),
            response_value: item.choices[choice_index].clone(),
            response_time_ms: self.timer.elapsed_ms(),
            hint_used: false,
            input_mode: InputMode::Choice,
        });

        let feedback = ReviewFeedback {
            verdict,
            correct_index: item.correct_answer_index,
            explanation: item.explanation.clone(),
            reason: item.reason,
            correct: self.correct,
            total: self.total,
        };
        self.phase = ReviewPhase::Evaluated { index, verdict };
        Ok(feedback)
    }

    pub fn advance(&mut self) -> EngineResult<ReviewEvent> {
        let ReviewPhase::Evaluated { index, .. } = self.phase else {
            return Err(self.rejected(ReviewAction::Continue));
        };

        let next = index + 1;
        if next >= self.items.len() {
            self.phase = ReviewPhase::Complete;
            let summary = self.summary();
            info!(
                session_id = %self.session_id,
                correct = summary.correct,
                total = summary.total,
                "Review session complete."
            );
            return Ok(ReviewEvent::Completed(summary));
        }
        self.phase = ReviewPhase::Answering { index: next };
        self.timer.restart();
        Ok(ReviewEvent::ItemPresented { index: next })
    }

    /// Replaces this session with a fresh queue under a new session id.
    /// On failure the current session is left as it was.
    pub async fn restart(&mut self, service: &dyn ReviewService) -> EngineResult<()> {
        let fresh = Self::start(service, self.context.clone()).await?;
        info!(
            previous = %self.session_id,
            next = %fresh.session_id,
            "Review session restarted."
        );
        *self = fresh;
        Ok(())
    }

    pub fn request_support(&self) {
        let item = self.current_item().map(|(_, item)| item);
        self.context.commands.dispatch(EngineCommand::OpenSupportChat {
            session_id: self.session_id,
            flow: FlowKind::Review,
            item_id: item.map(|i| i.item_id.clone()),
            kc_id: item.map(|i| i.kc_id.clone()),
        });
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    pub fn phase(&self) -> ReviewPhase {
        self.phase
    }

    /// The stats exactly as the backend supplied them.
    pub fn stats(&self) -> QueueStats {
        self.stats
    }

    pub fn items(&self) -> &[ReviewItem] {
        &self.items
    }

    pub fn current_item(&self) -> Option<(usize, &ReviewItem)> {
        match self.phase {
            ReviewPhase::Answering { index } | ReviewPhase::Evaluated { index, .. } => {
                self.items.get(index).map(|item| (index, item))
            }
            ReviewPhase::Complete => None,
        }
    }

    /// Items in one display category, in queue order.
    pub fn items_with_reason(
        &self,
        reason: ReviewReason,
    ) -> impl Iterator<Item = &ReviewItem> + '_ {
        self.items.iter().filter(move |item| item.reason == reason)
    }

    pub fn correct_count(&self) -> u32 {
        self.correct
    }

    pub fn total_answered(&self) -> u32 {
        self.total
    }

    pub fn accuracy(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        self.correct as f64 / self.total as f64
    }

    pub fn is_complete(&self) -> bool {
        self.phase == ReviewPhase::Complete
    }

    pub fn summary(&self) -> ReviewSummary {
        ReviewSummary {
            session_id: self.session_id,
            correct: self.correct,
            total: self.total,
            accuracy: self.accuracy(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::CommandBus;
    use crate::interaction::InteractionLogger;
    use crate::ports::{PortError, PortResult};
    use async_trait::async_trait;
    use std::sync::Mutex;
    use tokio::sync::mpsc::{self, UnboundedReceiver};

    fn review_item(id: &str, reason: ReviewReason) -> ReviewItem {
        ReviewItem {
            item_id: id.to_string(),
            stem: "What raises a credit score?".to_string(),
            choices: vec!["Paying on time".into(), "Opening many cards".into()],
            correct_answer_index: 0,
            explanation: "Payment history is the largest factor.".to_string(),
            kc_id: "kc-credit-score".to_string(),
            kc_name: "Credit scores".to_string(),
            domain: "credit".to_string(),
            reason,
            mastery_probability: 0.42,
            times_wrong: 2,
        }
    }

    fn queue(items: Vec<ReviewItem>, stats: QueueStats) -> ReviewQueue {
        ReviewQueue { items, stats }
    }

    fn context() -> (SessionContext, UnboundedReceiver<InteractionRecord>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let (commands, _) = CommandBus::channel();
        (
            SessionContext {
                learner_id: Uuid::new_v4(),
                logger: InteractionLogger::from_sender(tx),
                commands,
            },
            rx,
        )
    }

    #[test]
    fn extreme_stats_are_passed_through_unchanged() {
        let (ctx, _records) = context();
        let stats = QueueStats {
            due_reviews: u32::MAX,
            mistake_reviews: 1,
            low_mastery_reviews: u32::MAX,
            total: u32::MAX,
        };
        let session = ReviewSession::new(
            ctx,
            queue(vec![review_item("r1", ReviewReason::LowMastery)], stats),
        );

        assert_eq!(session.stats(), stats);
        assert_eq!(session.phase(), ReviewPhase::Answering { index: 0 });
    }

    #[test]
    fn counts_and_logs_every_answer() {
        let (ctx, mut records) = context();
        let items = vec![
            review_item("r1", ReviewReason::DueForReview),
            review_item("r2", ReviewReason::PastMistake),
        ];
        let mut session = ReviewSession::new(ctx, queue(items, QueueStats::default()));

        let feedback = session.submit_answer(0).unwrap();
        assert_eq!(feedback.verdict, Verdict::Correct);
        assert_eq!(feedback.explanation, "Payment history is the largest factor.");
        assert_eq!(session.advance().unwrap(), ReviewEvent::ItemPresented { index: 1 });

        let feedback = session.submit_answer(1).unwrap();
        assert_eq!(feedback.verdict, Verdict::Wrong);
        assert_eq!(feedback.reason, ReviewReason::PastMistake);
        assert_eq!((feedback.correct, feedback.total), (1, 2));

        match session.advance().unwrap() {
            ReviewEvent::Completed(summary) => assert_eq!(summary.accuracy, 0.5),
            other => panic!("expected completion, got {:?}", other),
        }
        // No remedial steps: the queue is walked exactly once.
        assert_eq!(session.items().len(), 2);

        let logged: Vec<_> = std::iter::from_fn(|| records.try_recv().ok()).collect();
        assert_eq!(logged.len(), 2);
        assert!(logged[0].is_correct);
        assert_eq!(logged[1].response_value, "Opening many cards");
    }

    #[test]
    fn stats_are_passed_through_untouched() {
        let (ctx, _records) = context();
        let stats = QueueStats {
            due_reviews: 4,
            mistake_reviews: 3,
            low_mastery_reviews: 1,
            total: 8,
        };
        let session = ReviewSession::new(
            ctx,
            queue(vec![review_item("r1", ReviewReason::LowMastery)], stats),
        );
        assert_eq!(session.stats(), stats);
        assert_eq!(session.items_with_reason(ReviewReason::LowMastery).count(), 1);
        assert_eq!(session.items_with_reason(ReviewReason::PastMistake).count(), 0);
    }

    #[test]
    fn empty_queue_is_already_complete() {
        let (ctx, _records) = context();
        let mut session = ReviewSession::new(ctx, queue(Vec::new(), QueueStats::default()));
        assert!(session.is_complete());
        assert_eq!(session.accuracy(), 0.0);
        assert!(session.submit_answer(0).is_err());
    }

    #[test]
    fn continuing_before_answering_is_rejected() {
        let (ctx, _records) = context();
        let mut session = ReviewSession::new(
            ctx,
            queue(vec![review_item("r1", ReviewReason::DueForReview)], QueueStats::default()),
        );
        assert!(matches!(
            session.advance(),
            Err(EngineError::InvalidTransition { .. })
        ));
    }

    struct FlakyQueue {
        fail: Mutex<bool>,
    }

    #[async_trait]
    impl ReviewService for FlakyQueue {
        async fn fetch_review_queue(&self, _learner_id: Uuid) -> PortResult<ReviewQueue> {
            if *self.fail.lock().unwrap() {
                return Err(PortError::Unavailable("offline".to_string()));
            }
            Ok(queue(
                vec![
                    review_item("fresh-1", ReviewReason::DueForReview),
                    review_item("fresh-2", ReviewReason::LowMastery),
                ],
                QueueStats {
                    due_reviews: 1,
                    mistake_reviews: 0,
                    low_mastery_reviews: 1,
                    total: 2,
                },
            ))
        }
    }

    #[tokio::test]
    async fn restart_resets_counters_under_a_new_session() {
        let (ctx, _records) = context();
        let service = FlakyQueue {
            fail: Mutex::new(false),
        };
        let mut session = ReviewSession::start(&service, ctx).await.unwrap();
        session.submit_answer(0).unwrap();
        let first_id = session.session_id();

        *service.fail.lock().unwrap() = true;
        assert!(session.restart(&service).await.is_err());
        assert_eq!(session.session_id(), first_id);
        assert_eq!(session.total_answered(), 1);

        *service.fail.lock().unwrap() = false;
        session.restart(&service).await.unwrap();
        assert_ne!(session.session_id(), first_id);
        assert_eq!(session.total_answered(), 0);
        assert_eq!(session.correct_count(), 0);
        assert_eq!(session.phase(), ReviewPhase::Answering { index: 0 });
    }
}
