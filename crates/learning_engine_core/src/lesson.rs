//! crates/learning_engine_core/src/lesson.rs
//!
//! The guided lesson controller.
//!
//! A lesson walks through content and quiz steps. Wrong answers cost a heart and
//! splice an explanation in right after the current step; correct answers build
//! a streak whose milestones get a one-off interstitial. Finishing the lesson
//! pays a flat reward exactly once.

use tracing::{debug, info};
use uuid::Uuid;

use crate::commands::{EngineCommand, FlowKind};
use crate::context::SessionContext;
use crate::domain::{
    InputMode, InteractionRecord, LessonItem, QuizStep, Reward, RewardGrant, Step, StepKind,
};
use crate::error::{EngineError, EngineResult};
use crate::evaluator::{evaluate, Verdict};
use crate::interaction::ResponseTimer;
use crate::ports::LessonService;
use crate::remedial::StepSequence;
use crate::streak::StreakTracker;
use crate::vitality::Vitality;

//=========================================================================================
// Configuration
//=========================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LessonConfig {
    pub max_hearts: u32,
    pub milestone_every: u32,
    pub reward: Reward,
}

impl Default for LessonConfig {
    fn default() -> Self {
        Self {
            max_hearts: 5,
            milestone_every: 3,
            reward: Reward { xp: 10, coins: 5 },
        }
    }
}

//=========================================================================================
// Phases, Actions and Events
//=========================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LessonPhase {
    /// Waiting for the learner to pick a choice (or acknowledge content).
    Idle { selected: Option<usize> },
    /// The current step has been checked.
    Evaluated { verdict: Verdict },
    /// The streak interstitial is showing; the step index has not moved.
    StreakMilestone { streak: u32 },
    Complete,
}

impl LessonPhase {
    pub fn name(&self) -> &'static str {
        match self {
            LessonPhase::Idle { .. } => "idle",
            LessonPhase::Evaluated { .. } => "evaluated",
            LessonPhase::StreakMilestone { .. } => "showing a streak milestone",
            LessonPhase::Complete => "complete",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LessonAction {
    Select { index: usize, input_mode: InputMode },
    UseHint,
    Check,
    Continue,
}

impl LessonAction {
    pub fn name(&self) -> &'static str {
        match self {
            LessonAction::Select { .. } => "select a choice",
            LessonAction::UseHint => "use a hint",
            LessonAction::Check => "check",
            LessonAction::Continue => "continue",
        }
    }
}

/// What the learner sees right after checking a step.
#[derive(Debug, Clone, PartialEq)]
pub struct LessonFeedback {
    pub verdict: Verdict,
    pub step_kind: StepKind,
    pub correct_index: Option<usize>,
    pub explanation: Option<String>,
    /// Index of the explanation step inserted for a wrong answer.
    pub remedial_index: Option<usize>,
    pub hearts: u32,
    pub out_of_hearts: bool,
    pub streak: u32,
    /// A milestone interstitial will show on the next continue.
    pub milestone: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LessonSummary {
    pub session_id: Uuid,
    pub correct: u32,
    pub answered: u32,
    pub accuracy: f64,
    pub reward: Reward,
    pub hearts_remaining: u32,
    pub total_steps: usize,
    pub remedial_steps: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub enum LessonEvent {
    /// The action had no effect in the current phase.
    Ignored,
    ChoiceSelected { index: usize },
    HintNoted,
    Checked(LessonFeedback),
    StepPresented { index: usize },
    MilestoneShown { streak: u32 },
    Completed(LessonSummary),
}

//=========================================================================================
// Lesson Session
//=========================================================================================

pub struct LessonSession {
    session_id: Uuid,
    lesson_id: String,
    context: SessionContext,
    config: LessonConfig,
    steps: StepSequence,
    index: usize,
    phase: LessonPhase,
    vitality: Vitality,
    streak: StreakTracker,
    milestone_pending: bool,
    correct: u32,
    answered: u32,
    input_mode: InputMode,
    hint_used: bool,
    timer: ResponseTimer,
    summary: Option<LessonSummary>,
}

impl LessonSession {
    /// Fetches the lesson's items and starts a session over them.
    pub async fn start(
        service: &dyn LessonService,
        context: SessionContext,
        lesson_id: &str,
        config: LessonConfig,
    ) -> EngineResult<Self> {
        let items = service.fetch_lesson_items(lesson_id).await?;
        info!(
            lesson_id,
            learner_id = %context.learner_id,
            "Fetched {} lesson items.",
            items.len()
        );
        Self::new(context, lesson_id, items, config)
    }

    pub fn new(
        context: SessionContext,
        lesson_id: impl Into<String>,
        items: Vec<LessonItem>,
        config: LessonConfig,
    ) -> EngineResult<Self> {
        if items.is_empty() {
            return Err(EngineError::EmptyLesson);
        }
        let steps = StepSequence::new(items.into_iter().map(Step::from_item).collect());

        Ok(Self {
            session_id: Uuid::new_v4(),
            lesson_id: lesson_id.into(),
            context,
            config,
            steps,
            index: 0,
            phase: LessonPhase::Idle { selected: None },
            vitality: Vitality::new(config.max_hearts),
            streak: StreakTracker::new(config.milestone_every),
            milestone_pending: false,
            correct: 0,
            answered: 0,
            input_mode: InputMode::default(),
            hint_used: false,
            timer: ResponseTimer::start(),
            summary: None,
        })
    }

    /// Applies one learner action. This match is the controller's transition table.
    pub fn dispatch(&mut self, action: LessonAction) -> EngineResult<LessonEvent> {
        match (self.phase, action) {
            (LessonPhase::Idle { .. }, LessonAction::Select { index, input_mode }) => {
                Ok(self.select(index, input_mode))
            }
            (LessonPhase::Idle { .. }, LessonAction::UseHint) => Ok(self.note_hint()),
            (_, LessonAction::Select { .. }) | (_, LessonAction::UseHint) => {
                Ok(LessonEvent::Ignored)
            }
            (LessonPhase::Idle { selected }, LessonAction::Check) => {
                self.check_current(selected).map(LessonEvent::Checked)
            }
            (LessonPhase::Evaluated { .. }, LessonAction::Continue) => Ok(self.leave_evaluated()),
            (LessonPhase::StreakMilestone { .. }, LessonAction::Continue) => Ok(self.next_step()),
            (phase, action) => Err(EngineError::InvalidTransition {
                action: action.name(),
                phase: phase.name(),
            }),
        }
    }

    /// Selects a choice on the current quiz step. Returns false when ignored.
    pub fn select_choice(&mut self, index: usize) -> bool {
        self.select_choice_with(index, InputMode::Choice)
    }

    pub fn select_choice_with(&mut self, index: usize, input_mode: InputMode) -> bool {
        matches!(
            self.dispatch(LessonAction::Select { index, input_mode }),
            Ok(LessonEvent::ChoiceSelected { .. })
        )
    }

    pub fn note_hint_used(&mut self) -> bool {
        matches!(
            self.dispatch(LessonAction::UseHint),
            Ok(LessonEvent::HintNoted)
        )
    }

    pub fn check(&mut self) -> EngineResult<LessonEvent> {
        self.dispatch(LessonAction::Check)
    }

    pub fn advance(&mut self) -> EngineResult<LessonEvent> {
        self.dispatch(LessonAction::Continue)
    }

    /// Selects `index` and checks it as one action.
    ///
    /// On a quiz step an index outside the choices is rejected and any earlier
    /// selection stays ungraded.
    pub fn submit_answer(
        &mut self,
        index: usize,
        input_mode: InputMode,
    ) -> EngineResult<LessonEvent> {
        if let (LessonPhase::Idle { .. }, Some(Step::Quiz(quiz))) =
            (self.phase, self.steps.get(self.index))
        {
            if index >= quiz.choices.len() {
                return Err(EngineError::ChoiceOutOfRange {
                    index,
                    choices: quiz.choices.len(),
                });
            }
        }
        self.dispatch(LessonAction::Select { index, input_mode })?;
        self.check()
    }

    /// Asks the host to open support chat about the current step.
    pub fn request_support(&self) {
        let step = self.current_step();
        self.context.commands.dispatch(EngineCommand::OpenSupportChat {
            session_id: self.session_id,
            flow: FlowKind::Lesson,
            item_id: step.and_then(|s| s.item_id()).map(str::to_string),
            kc_id: step.and_then(|s| s.kc_id()).map(str::to_string),
        });
    }

    //-------------------------------------------------------------------------------------
    // Transitions
    //-------------------------------------------------------------------------------------

    fn select(&mut self, index: usize, input_mode: InputMode) -> LessonEvent {
        match self.steps.get(self.index) {
            Some(Step::Quiz(quiz)) if index < quiz.choices.len() => {
                self.phase = LessonPhase::Idle {
                    selected: Some(index),
                };
                self.input_mode = input_mode;
                LessonEvent::ChoiceSelected { index }
            }
            _ => LessonEvent::Ignored,
        }
    }

    fn note_hint(&mut self) -> LessonEvent {
        match self.steps.get(self.index) {
            Some(Step::Quiz(_)) => {
                self.hint_used = true;
                LessonEvent::HintNoted
            }
            _ => LessonEvent::Ignored,
        }
    }

    fn check_current(&mut self, selected: Option<usize>) -> EngineResult<LessonFeedback> {
        let quiz = match self.steps.get(self.index) {
            Some(Step::Quiz(quiz)) => quiz.clone(),
            Some(Step::Content(_)) => return Ok(self.acknowledge_content()),
            None => {
                return Err(EngineError::InvalidTransition {
                    action: "check",
                    phase: "past the last step",
                })
            }
        };
        let selected = selected.ok_or(EngineError::NoChoiceSelected)?;
        Ok(self.grade_quiz(&quiz, selected))
    }

    fn acknowledge_content(&mut self) -> LessonFeedback {
        self.phase = LessonPhase::Evaluated {
            verdict: Verdict::Correct,
        };
        LessonFeedback {
            verdict: Verdict::Correct,
            step_kind: StepKind::Content,
            correct_index: None,
            explanation: None,
            remedial_index: None,
            hearts: self.vitality.hearts(),
            out_of_hearts: self.vitality.is_depleted(),
            streak: self.streak.streak(),
            milestone: false,
        }
    }

    fn grade_quiz(&mut self, quiz: &QuizStep, selected: usize) -> LessonFeedback {
        let verdict = evaluate(selected, quiz.correct_index);
        let update = self.streak.record(verdict);
        self.answered += 1;

        let mut remedial_index = None;
        if verdict.is_correct() {
            self.correct += 1;
        } else {
            remedial_index = Some(self.steps.insert_remedial(self.index, quiz));
            let had_hearts = !self.vitality.is_depleted();
            self.vitality.lose_heart();
            if had_hearts && self.vitality.is_depleted() {
                info!(session_id = %self.session_id, "Learner is out of hearts.");
                self.context.commands.dispatch(EngineCommand::HeartsDepleted {
                    session_id: self.session_id,
                });
            }
        }
        self.milestone_pending = update.milestone;

        self.context.logger.log(InteractionRecord {
            learner_id: self.context.learner_id,
            item_id: quiz.item_id.clone(),
            kc_id: quiz.kc_id.clone(),
            session_id: self.session_id,
            is_correct: verdict.is_correct(),
            response_value: quiz.choices.get(selected).cloned().unwrap_or_default(),
            response_time_ms: self.timer.elapsed_ms(),
            hint_used: self.hint_used,
            input_mode: self.input_mode,
        });

        debug!(
            session_id = %self.session_id,
            item_id = %quiz.item_id,
            verdict = verdict.as_str(),
            streak = update.streak,
            hearts = self.vitality.hearts(),
            "Quiz step checked."
        );

        self.phase = LessonPhase::Evaluated { verdict };
        LessonFeedback {
            verdict,
            step_kind: StepKind::Quiz,
            correct_index: Some(quiz.correct_index),
            explanation: Some(quiz.explanation.clone()),
            remedial_index,
            hearts: self.vitality.hearts(),
            out_of_hearts: self.vitality.is_depleted(),
            streak: update.streak,
            milestone: update.milestone,
        }
    }

    fn leave_evaluated(&mut self) -> LessonEvent {
        if self.milestone_pending {
            self.milestone_pending = false;
            let streak = self.streak.streak();
            self.phase = LessonPhase::StreakMilestone { streak };
            return LessonEvent::MilestoneShown { streak };
        }
        self.next_step()
    }

    fn next_step(&mut self) -> LessonEvent {
        self.index += 1;
        self.input_mode = InputMode::default();
        self.hint_used = false;
        self.timer.restart();

        if self.index >= self.steps.len() {
            return LessonEvent::Completed(self.complete());
        }
        self.phase = LessonPhase::Idle { selected: None };
        LessonEvent::StepPresented { index: self.index }
    }

    fn complete(&mut self) -> LessonSummary {
        self.phase = LessonPhase::Complete;
        let reward = self.config.reward;
        let summary = LessonSummary {
            session_id: self.session_id,
            correct: self.correct,
            answered: self.answered,
            accuracy: self.accuracy(),
            reward,
            hearts_remaining: self.vitality.hearts(),
            total_steps: self.steps.len(),
            remedial_steps: self.steps.remedial_count(),
        };

        // `Complete` has no outgoing transitions, so this runs once per session.
        self.context
            .commands
            .dispatch(EngineCommand::GrantReward(RewardGrant {
                learner_id: self.context.learner_id,
                session_id: self.session_id,
                reward,
            }));
        info!(
            session_id = %self.session_id,
            lesson_id = %self.lesson_id,
            correct = self.correct,
            answered = self.answered,
            "Lesson complete."
        );

        self.summary = Some(summary.clone());
        summary
    }

    //-------------------------------------------------------------------------------------
    // Accessors
    //-------------------------------------------------------------------------------------

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    pub fn lesson_id(&self) -> &str {
        &self.lesson_id
    }

    pub fn phase(&self) -> LessonPhase {
        self.phase
    }

    pub fn current_index(&self) -> usize {
        self.index
    }

    /// The step being shown, or `None` once the lesson is complete.
    pub fn current_step(&self) -> Option<&Step> {
        match self.phase {
            LessonPhase::Complete => None,
            _ => self.steps.get(self.index),
        }
    }

    pub fn step_count(&self) -> usize {
        self.steps.len()
    }

    pub fn remedial_count(&self) -> usize {
        self.steps.remedial_count()
    }

    pub fn hearts(&self) -> u32 {
        self.vitality.hearts()
    }

    pub fn max_hearts(&self) -> u32 {
        self.vitality.max()
    }

    pub fn streak(&self) -> u32 {
        self.streak.streak()
    }

    pub fn correct_count(&self) -> u32 {
        self.correct
    }

    pub fn answered_count(&self) -> u32 {
        self.answered
    }

    /// Correct over quiz steps answered; 0 before any answer.
    pub fn accuracy(&self) -> f64 {
        if self.answered == 0 {
            return 0.0;
        }
        self.correct as f64 / self.answered as f64
    }

    /// Position against the current, possibly extended, step count.
    pub fn progress_percent(&self) -> f64 {
        if self.phase == LessonPhase::Complete {
            return 100.0;
        }
        self.index as f64 / self.steps.len() as f64 * 100.0
    }

    pub fn is_complete(&self) -> bool {
        self.phase == LessonPhase::Complete
    }

    pub fn summary(&self) -> Option<&LessonSummary> {
        self.summary.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::{CommandBus, CommandReceiver};
    use crate::interaction::InteractionLogger;
    use crate::ports::{PortError, PortResult};
    use async_trait::async_trait;
    use tokio::sync::mpsc::{self, UnboundedReceiver};

    struct Harness {
        records: UnboundedReceiver<InteractionRecord>,
        commands: CommandReceiver,
    }

    impl Harness {
        fn drain_records(&mut self) -> Vec<InteractionRecord> {
            std::iter::from_fn(|| self.records.try_recv().ok()).collect()
        }

        fn drain_commands(&mut self) -> Vec<EngineCommand> {
            std::iter::from_fn(|| self.commands.try_recv().ok()).collect()
        }
    }

    fn context() -> (SessionContext, Harness) {
        let (tx, records) = mpsc::unbounded_channel();
        let (commands, command_rx) = CommandBus::channel();
        let context = SessionContext {
            learner_id: Uuid::new_v4(),
            logger: InteractionLogger::from_sender(tx),
            commands,
        };
        (
            context,
            Harness {
                records,
                commands: command_rx,
            },
        )
    }

    fn quiz_item(id: &str) -> LessonItem {
        LessonItem {
            id: id.to_string(),
            stem: format!("Question {}", id),
            choices: vec!["A".to_string(), "B".to_string(), "C".to_string()],
            correct_answer_index: 1,
            explanation: format!("Why {} is B", id),
            kc_id: "kc-interest".to_string(),
        }
    }

    fn content_item(id: &str) -> LessonItem {
        LessonItem {
            id: id.to_string(),
            stem: "Interest is the price of money.".to_string(),
            choices: Vec::new(),
            correct_answer_index: 0,
            explanation: String::new(),
            kc_id: "kc-interest".to_string(),
        }
    }

    #[test]
    fn out_of_range_submission_leaves_the_earlier_selection_ungraded() {
        let (ctx, mut harness) = context();
        let mut session =
            LessonSession::new(ctx, "l1", vec![quiz_item("q1")], LessonConfig::default()).unwrap();

        assert!(session.select_choice(1));
        let err = session.submit_answer(99, InputMode::Choice).unwrap_err();

        assert_eq!(
            err,
            EngineError::ChoiceOutOfRange {
                index: 99,
                choices: 3
            }
        );
        assert_eq!(session.phase(), LessonPhase::Idle { selected: Some(1) });
        assert_eq!(session.hearts(), 5);
        assert_eq!(session.streak(), 0);
        assert_eq!(session.answered_count(), 0);
        assert!(harness.drain_records().is_empty());

        match session.submit_answer(0, InputMode::Choice).unwrap() {
            LessonEvent::Checked(feedback) => assert_eq!(feedback.verdict, Verdict::Wrong),
            other => panic!("expected feedback, got {:?}", other),
        }
        assert_eq!(harness.drain_records()[0].response_value, "A");
    }

    #[test]
    fn milestone_interstitial_does_not_consume_a_step() {
        let (ctx, _harness) = context();
        let items = (1..=4).map(|n| quiz_item(&format!("q{}", n))).collect();
        let mut session = LessonSession::new(ctx, "l1", items, LessonConfig::default()).unwrap();

        for _ in 0..2 {
            answer(&mut session, 1);
            session.advance().unwrap();
        }
        let feedback = answer(&mut session, 1);
        assert!(feedback.milestone);
        let index = session.current_index();
        let percent = session.progress_percent();

        assert_eq!(session.advance().unwrap(), LessonEvent::MilestoneShown { streak: 3 });
        assert_eq!(session.current_index(), index);
        assert_eq!(session.progress_percent(), percent);

        assert_eq!(session.advance().unwrap(), LessonEvent::StepPresented { index: index + 1 });
    }

    fn answer(session: &mut LessonSession, index: usize) -> LessonFeedback {
        assert!(session.select_choice(index));
        match session.check().unwrap() {
            LessonEvent::Checked(feedback) => feedback,
            other => panic!("expected feedback, got {:?}", other),
        }
    }

    #[test]
    fn empty_lessons_do_not_start() {
        let (ctx, _h) = context();
        let result = LessonSession::new(ctx, "l1", Vec::new(), LessonConfig::default());
        assert!(matches!(result, Err(EngineError::EmptyLesson)));
    }

    #[test]
    fn continue_while_idle_is_rejected() {
        let (ctx, _h) = context();
        let mut session =
            LessonSession::new(ctx, "l1", vec![quiz_item("q1")], LessonConfig::default()).unwrap();

        let err = session.advance().unwrap_err();
        assert_eq!(
            err,
            EngineError::InvalidTransition {
                action: "continue",
                phase: "idle"
            }
        );
        assert_eq!(session.phase(), LessonPhase::Idle { selected: None });
    }

    #[test]
    fn checking_a_quiz_without_a_selection_is_an_error() {
        let (ctx, mut h) = context();
        let mut session =
            LessonSession::new(ctx, "l1", vec![quiz_item("q1")], LessonConfig::default()).unwrap();

        assert_eq!(session.check().unwrap_err(), EngineError::NoChoiceSelected);
        assert_eq!(session.phase(), LessonPhase::Idle { selected: None });
        assert!(h.drain_records().is_empty());
    }

    #[test]
    fn selection_outside_idle_or_on_content_is_ignored() {
        let (ctx, _h) = context();
        let items = vec![content_item("c1"), quiz_item("q1")];
        let mut session = LessonSession::new(ctx, "l1", items, LessonConfig::default()).unwrap();

        assert!(!session.select_choice(0));
        session.check().unwrap();
        assert!(!session.select_choice(0));
        session.advance().unwrap();

        assert!(!session.select_choice(7));
        assert!(session.select_choice(2));
        assert_eq!(session.phase(), LessonPhase::Idle { selected: Some(2) });
    }

    #[test]
    fn content_steps_are_acknowledged_without_side_effects() {
        let (ctx, mut h) = context();
        let items = vec![content_item("c1"), quiz_item("q1")];
        let mut session = LessonSession::new(ctx, "l1", items, LessonConfig::default()).unwrap();

        let feedback = match session.check().unwrap() {
            LessonEvent::Checked(feedback) => feedback,
            other => panic!("expected feedback, got {:?}", other),
        };
        assert_eq!(feedback.verdict, Verdict::Correct);
        assert_eq!(feedback.step_kind, StepKind::Content);
        assert_eq!(session.answered_count(), 0);
        assert_eq!(session.streak(), 0);
        assert!(h.drain_records().is_empty());
    }

    #[test]
    fn wrong_answers_extend_the_lesson_and_the_progress_denominator() {
        let (ctx, _h) = context();
        let items = vec![quiz_item("q1"), quiz_item("q2")];
        let mut session = LessonSession::new(ctx, "l1", items, LessonConfig::default()).unwrap();

        let feedback = answer(&mut session, 0);
        assert_eq!(feedback.verdict, Verdict::Wrong);
        assert_eq!(feedback.remedial_index, Some(1));
        assert_eq!(session.step_count(), 3);

        assert_eq!(session.advance().unwrap(), LessonEvent::StepPresented { index: 1 });
        assert!(matches!(session.current_step(), Some(Step::Content(_))));
        let expected = 1.0 / 3.0 * 100.0;
        assert!((session.progress_percent() - expected).abs() < 1e-9);
    }

    #[test]
    fn running_out_of_hearts_does_not_end_the_lesson() {
        let (ctx, mut h) = context();
        let items = (0..4).map(|i| quiz_item(&format!("q{}", i))).collect();
        let config = LessonConfig {
            max_hearts: 2,
            ..LessonConfig::default()
        };
        let mut session = LessonSession::new(ctx, "l1", items, config).unwrap();

        for _ in 0..4 {
            let feedback = answer(&mut session, 0);
            session.advance().unwrap(); // onto the remedial step
            session.check().unwrap();
            session.advance().unwrap();
            assert!(feedback.hearts <= 2);
        }

        assert!(session.is_complete());
        assert_eq!(session.hearts(), 0);
        let depleted = h
            .drain_commands()
            .into_iter()
            .filter(|c| matches!(c, EngineCommand::HeartsDepleted { .. }))
            .count();
        assert_eq!(depleted, 1);
    }

    #[test]
    fn reward_is_flat_and_granted_once() {
        let (ctx, mut h) = context();
        let mut session =
            LessonSession::new(ctx, "l1", vec![quiz_item("q1")], LessonConfig::default()).unwrap();

        answer(&mut session, 0);
        session.advance().unwrap();
        session.check().unwrap();
        let summary = match session.advance().unwrap() {
            LessonEvent::Completed(summary) => summary,
            other => panic!("expected completion, got {:?}", other),
        };
        assert_eq!(summary.reward, LessonConfig::default().reward);
        assert_eq!(summary.accuracy, 0.0);
        assert_eq!(session.progress_percent(), 100.0);

        assert!(session.advance().is_err());
        assert!(session.check().is_err());
        let grants = h
            .drain_commands()
            .into_iter()
            .filter(|c| matches!(c, EngineCommand::GrantReward(_)))
            .count();
        assert_eq!(grants, 1);
    }

    #[test]
    fn records_carry_hint_and_input_mode_for_one_step_only() {
        let (ctx, mut h) = context();
        let learner_id = ctx.learner_id;
        let items = vec![quiz_item("q1"), quiz_item("q2")];
        let mut session = LessonSession::new(ctx, "l1", items, LessonConfig::default()).unwrap();

        assert!(session.note_hint_used());
        assert!(session.select_choice_with(1, InputMode::Voice));
        session.check().unwrap();
        session.advance().unwrap();
        answer(&mut session, 1);

        let records = h.drain_records();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].learner_id, learner_id);
        assert_eq!(records[0].session_id, session.session_id());
        assert_eq!(records[0].response_value, "B");
        assert!(records[0].hint_used);
        assert_eq!(records[0].input_mode, InputMode::Voice);
        assert!(!records[1].hint_used);
        assert_eq!(records[1].input_mode, InputMode::Choice);
    }

    #[test]
    fn support_requests_name_the_current_item() {
        let (ctx, mut h) = context();
        let session =
            LessonSession::new(ctx, "l1", vec![quiz_item("q1")], LessonConfig::default()).unwrap();

        session.request_support();
        match h.drain_commands().as_slice() {
            [EngineCommand::OpenSupportChat { flow, item_id, .. }] => {
                assert_eq!(*flow, FlowKind::Lesson);
                assert_eq!(item_id.as_deref(), Some("q1"));
            }
            other => panic!("unexpected commands {:?}", other),
        }
    }

    struct DownLessons;

    #[async_trait]
    impl LessonService for DownLessons {
        async fn fetch_lesson_items(&self, _lesson_id: &str) -> PortResult<Vec<LessonItem>> {
            Err(PortError::Unavailable("timeout".to_string()))
        }
    }

    #[tokio::test]
    async fn failed_fetch_starts_no_session() {
        let (ctx, _h) = context();
        let result =
            LessonSession::start(&DownLessons, ctx, "l1", LessonConfig::default()).await;
        assert!(matches!(result, Err(EngineError::Port(PortError::Unavailable(_)))));
    }
}
