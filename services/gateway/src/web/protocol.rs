//! services/gateway/src/web/protocol.rs
//!
//! Defines the WebSocket message protocol between the learning UI and the gateway.
//!
//! Every frame is a JSON text message tagged by `type`. The UI renders what it is
//! sent and forwards learner actions; all session rules run server-side.

use learning_engine_core::{
    DiagnosticFeedback, DiagnosticItem, DiagnosticReport, FlowKind, InputMode, LessonFeedback,
    LessonSummary, ProgressSnapshot, QueueStats, ReviewFeedback, ReviewItem, ReviewSummary, Step,
    StepKind, SyncStatus,
};
use learning_engine_core::domain::ContentOrigin;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

//=========================================================================================
// Messages Sent FROM the Client (Browser) TO the Server
//=========================================================================================

/// Represents the structured text messages a client can send to the server.
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Identifies the learner. This must be the first message sent on the connection.
    Init { learner_id: Uuid },

    StartLesson { lesson_id: String },
    StartDiagnostic,
    StartReview,

    /// Picks a choice on the current lesson step without checking it.
    SelectChoice {
        index: usize,
        #[serde(default)]
        input_mode: InputModeDto,
    },
    UseHint,
    /// Checks the selected choice, or acknowledges a content step.
    Check,
    /// Answers the current diagnostic or review item in one go.
    SubmitAnswer { index: usize },
    Continue,

    /// Re-sends a diagnostic batch that failed to submit.
    RetrySubmission,
    RestartReview,
    RequestSupport,
    /// Writes any pending rewards through to the backend.
    SyncProgress,
    /// Abandons the active flow. Unsubmitted diagnostic answers are lost.
    LeaveFlow,
}

#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum InputModeDto {
    #[default]
    Choice,
    Voice,
}

impl InputModeDto {
    pub fn to_domain(self) -> InputMode {
        match self {
            InputModeDto::Choice => InputMode::Choice,
            InputModeDto::Voice => InputMode::Voice,
        }
    }
}

//=========================================================================================
// Messages Sent FROM the Server TO the Client (Browser)
//=========================================================================================

/// Represents the structured text messages the server can send to the client.
#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Confirms the learner was accepted.
    SessionInitialized { learner_id: Uuid },

    ProgressUpdated { progress: ProgressView },

    // --- Lesson ---
    LessonStarted {
        session_id: Uuid,
        lesson_id: String,
        total_steps: usize,
        hearts: u32,
        max_hearts: u32,
    },
    StepPresented {
        index: usize,
        total_steps: usize,
        progress_percent: f64,
        step: StepView,
    },
    ChoiceSelected { index: usize },
    AnswerChecked { feedback: LessonFeedbackView },
    StreakMilestone { streak: u32 },
    LessonCompleted { summary: LessonSummaryView },

    // --- Diagnostic ---
    DiagnosticStarted {
        session_id: Uuid,
        test_id: String,
        total_items: usize,
    },
    DiagnosticItemPresented {
        index: usize,
        total_items: usize,
        item: DiagnosticItemView,
    },
    DiagnosticAnswered {
        is_correct: bool,
        correct_index: usize,
        answered: usize,
        total: usize,
    },
    DiagnosticCompleted { report: DiagnosticReportView },
    /// The batch did not go through; answers are still held for a retry.
    DiagnosticSubmissionFailed { message: String, buffered: usize },

    // --- Review ---
    ReviewStarted {
        session_id: Uuid,
        total_items: usize,
        stats: QueueStatsView,
    },
    ReviewItemPresented {
        index: usize,
        total_items: usize,
        item: ReviewItemView,
    },
    ReviewAnswered { feedback: ReviewFeedbackView },
    ReviewCompleted {
        session_id: Uuid,
        correct: u32,
        total: u32,
        accuracy: f64,
    },

    // --- Host Commands ---
    OpenSupportChat {
        flow: &'static str,
        session_id: Uuid,
        item_id: Option<String>,
        kc_id: Option<String>,
    },
    HeartsDepleted { session_id: Uuid },

    /// A flow could not be loaded. The UI shows a blocking error view.
    LoadFailed {
        flow: &'static str,
        message: String,
        retryable: bool,
    },

    /// Reports a rejected action. The connection stays open.
    Error { message: String },
}

impl ServerMessage {
    pub fn error(message: impl Into<String>) -> Self {
        ServerMessage::Error {
            message: message.into(),
        }
    }

    pub fn load_failed(flow: FlowKind, message: impl Into<String>, retryable: bool) -> Self {
        ServerMessage::LoadFailed {
            flow: flow.as_str(),
            message: message.into(),
            retryable,
        }
    }
}

//=========================================================================================
// Views
//=========================================================================================

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct ProgressView {
    pub total_xp: u64,
    pub coins: u64,
    pub lessons_completed: u32,
    pub pending_grants: usize,
    pub sync_status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sync_error: Option<String>,
}

impl From<&ProgressSnapshot> for ProgressView {
    fn from(snapshot: &ProgressSnapshot) -> Self {
        let sync_error = match &snapshot.status {
            SyncStatus::Failed(reason) => Some(reason.clone()),
            _ => None,
        };
        Self {
            total_xp: snapshot.progress.total_xp,
            coins: snapshot.progress.coins,
            lessons_completed: snapshot.progress.lessons_completed,
            pending_grants: snapshot.pending_grants,
            sync_status: snapshot.status.as_str(),
            sync_error,
        }
    }
}

/// A lesson step as shown before it is checked. The answer is never included.
#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StepView {
    Content {
        body: String,
        remedial: bool,
    },
    Quiz {
        item_id: String,
        stem: String,
        choices: Vec<String>,
    },
}

impl From<&Step> for StepView {
    fn from(step: &Step) -> Self {
        match step {
            Step::Content(content) => StepView::Content {
                body: content.body.clone(),
                remedial: matches!(content.origin, ContentOrigin::Remedial { .. }),
            },
            Step::Quiz(quiz) => StepView::Quiz {
                item_id: quiz.item_id.clone(),
                stem: quiz.stem.clone(),
                choices: quiz.choices.clone(),
            },
        }
    }
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct LessonFeedbackView {
    pub is_correct: bool,
    pub step_kind: &'static str,
    pub correct_index: Option<usize>,
    pub explanation: Option<String>,
    pub remedial_index: Option<usize>,
    pub hearts: u32,
    pub out_of_hearts: bool,
    pub streak: u32,
    /// A streak interstitial follows on the next `continue`.
    pub milestone: bool,
}

impl From<&LessonFeedback> for LessonFeedbackView {
    fn from(feedback: &LessonFeedback) -> Self {
        Self {
            is_correct: feedback.verdict.is_correct(),
            step_kind: match feedback.step_kind {
                StepKind::Content => "content",
                StepKind::Quiz => "quiz",
            },
            correct_index: feedback.correct_index,
            explanation: feedback.explanation.clone(),
            remedial_index: feedback.remedial_index,
            hearts: feedback.hearts,
            out_of_hearts: feedback.out_of_hearts,
            streak: feedback.streak,
            milestone: feedback.milestone,
        }
    }
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct LessonSummaryView {
    pub session_id: Uuid,
    pub correct: u32,
    pub answered: u32,
    pub accuracy: f64,
    pub xp: u32,
    pub coins: u32,
    pub hearts_remaining: u32,
    pub total_steps: usize,
    pub remedial_steps: usize,
}

impl From<&LessonSummary> for LessonSummaryView {
    fn from(summary: &LessonSummary) -> Self {
        Self {
            session_id: summary.session_id,
            correct: summary.correct,
            answered: summary.answered,
            accuracy: summary.accuracy,
            xp: summary.reward.xp,
            coins: summary.reward.coins,
            hearts_remaining: summary.hearts_remaining,
            total_steps: summary.total_steps,
            remedial_steps: summary.remedial_steps,
        }
    }
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct DiagnosticItemView {
    pub item_id: String,
    pub domain: String,
    pub stem: String,
    pub choices: Vec<String>,
}

impl From<&DiagnosticItem> for DiagnosticItemView {
    fn from(item: &DiagnosticItem) -> Self {
        Self {
            item_id: item.item_id.clone(),
            domain: item.kc_domain.clone(),
            stem: item.stem.clone(),
            choices: item.choices.clone(),
        }
    }
}

impl From<&DiagnosticFeedback> for ServerMessage {
    fn from(feedback: &DiagnosticFeedback) -> Self {
        ServerMessage::DiagnosticAnswered {
            is_correct: feedback.verdict.is_correct(),
            correct_index: feedback.correct_index,
            answered: feedback.answered,
            total: feedback.total,
        }
    }
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct DomainScoreView {
    pub domain: String,
    pub score: f64,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct RecommendationView {
    pub domain: String,
    pub message: String,
}

/// Scores and recommendations arrive weakest domain first.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct DiagnosticReportView {
    pub correct_count: u32,
    pub total_items: u32,
    pub overall_score: f64,
    pub focus_area: Option<String>,
    pub domain_scores: Vec<DomainScoreView>,
    pub recommendations: Vec<RecommendationView>,
}

impl From<&DiagnosticReport> for DiagnosticReportView {
    fn from(report: &DiagnosticReport) -> Self {
        Self {
            correct_count: report.correct_count,
            total_items: report.total_items,
            overall_score: report.overall_score,
            focus_area: report.focus_area().map(|s| s.domain.clone()),
            domain_scores: report
                .domain_scores()
                .iter()
                .map(|s| DomainScoreView {
                    domain: s.domain.clone(),
                    score: s.score,
                })
                .collect(),
            recommendations: report
                .recommendations()
                .iter()
                .map(|r| RecommendationView {
                    domain: r.domain.clone(),
                    message: r.message.clone(),
                })
                .collect(),
        }
    }
}

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueStatsView {
    pub due_reviews: u32,
    pub mistake_reviews: u32,
    pub low_mastery_reviews: u32,
    pub total: u32,
}

impl From<QueueStats> for QueueStatsView {
    fn from(stats: QueueStats) -> Self {
        Self {
            due_reviews: stats.due_reviews,
            mistake_reviews: stats.mistake_reviews,
            low_mastery_reviews: stats.low_mastery_reviews,
            total: stats.total,
        }
    }
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct ReviewItemView {
    pub item_id: String,
    pub stem: String,
    pub choices: Vec<String>,
    pub kc_name: String,
    pub domain: String,
    pub reason: &'static str,
    pub reason_label: &'static str,
    pub mastery_probability: f64,
    pub times_wrong: u32,
}

impl From<&ReviewItem> for ReviewItemView {
    fn from(item: &ReviewItem) -> Self {
        Self {
            item_id: item.item_id.clone(),
            stem: item.stem.clone(),
            choices: item.choices.clone(),
            kc_name: item.kc_name.clone(),
            domain: item.domain.clone(),
            reason: item.reason.as_str(),
            reason_label: item.reason.label(),
            mastery_probability: item.mastery_probability,
            times_wrong: item.times_wrong,
        }
    }
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct ReviewFeedbackView {
    pub is_correct: bool,
    pub correct_index: usize,
    pub explanation: String,
    pub reason: &'static str,
    pub correct: u32,
    pub total: u32,
}

impl From<&ReviewFeedback> for ReviewFeedbackView {
    fn from(feedback: &ReviewFeedback) -> Self {
        Self {
            is_correct: feedback.verdict.is_correct(),
            correct_index: feedback.correct_index,
            explanation: feedback.explanation.clone(),
            reason: feedback.reason.as_str(),
            correct: feedback.correct,
            total: feedback.total,
        }
    }
}

impl From<&ReviewSummary> for ServerMessage {
    fn from(summary: &ReviewSummary) -> Self {
        ServerMessage::ReviewCompleted {
            session_id: summary.session_id,
            correct: summary.correct,
            total: summary.total,
            accuracy: summary.accuracy,
        }
    }
}
