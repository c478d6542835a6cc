//! crates/learning_engine_core/src/domain.rs
//!
//! Defines the pure, core data structures for the learning session engine.
//! These structs are independent of any transport or serialization format.

use std::collections::HashMap;

use uuid::Uuid;

//=========================================================================================
// Lesson Content
//=========================================================================================

/// A single item as fetched for a guided lesson.
#[derive(Debug, Clone, PartialEq)]
pub struct LessonItem {
    pub id: String,
    pub stem: String,
    pub choices: Vec<String>,
    pub correct_answer_index: usize,
    pub explanation: String,
    pub kc_id: String,
}

/// Where a content step came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentOrigin {
    /// Part of the fetched lesson.
    Lesson,
    /// Inserted after a wrong answer to the given item.
    Remedial { item_id: String },
}

/// An instructional step; checking it only acknowledges it.
#[derive(Debug, Clone, PartialEq)]
pub struct ContentStep {
    pub body: String,
    pub item_id: Option<String>,
    pub kc_id: Option<String>,
    pub origin: ContentOrigin,
}

/// An assessed multiple-choice step.
#[derive(Debug, Clone, PartialEq)]
pub struct QuizStep {
    pub item_id: String,
    pub kc_id: String,
    pub stem: String,
    pub choices: Vec<String>,
    pub correct_index: usize,
    pub explanation: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepKind {
    Content,
    Quiz,
}

/// One unit of a lesson sequence.
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    Content(ContentStep),
    Quiz(QuizStep),
}

impl Step {
    /// Builds a step from a fetched item. Items without choices are instructional.
    pub fn from_item(item: LessonItem) -> Self {
        if item.choices.is_empty() {
            Step::Content(ContentStep {
                body: item.stem,
                item_id: Some(item.id),
                kc_id: Some(item.kc_id),
                origin: ContentOrigin::Lesson,
            })
        } else {
            Step::Quiz(QuizStep {
                item_id: item.id,
                kc_id: item.kc_id,
                stem: item.stem,
                choices: item.choices,
                correct_index: item.correct_answer_index,
                explanation: item.explanation,
            })
        }
    }

    pub fn kind(&self) -> StepKind {
        match self {
            Step::Content(_) => StepKind::Content,
            Step::Quiz(_) => StepKind::Quiz,
        }
    }

    pub fn item_id(&self) -> Option<&str> {
        match self {
            Step::Content(content) => content.item_id.as_deref(),
            Step::Quiz(quiz) => Some(&quiz.item_id),
        }
    }

    pub fn kc_id(&self) -> Option<&str> {
        match self {
            Step::Content(content) => content.kc_id.as_deref(),
            Step::Quiz(quiz) => Some(&quiz.kc_id),
        }
    }
}

//=========================================================================================
// Interaction Logging
//=========================================================================================

/// How the learner produced an answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InputMode {
    #[default]
    Choice,
    Voice,
}

impl InputMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            InputMode::Choice => "choice",
            InputMode::Voice => "voice",
        }
    }
}

/// One answered item, as reported to the mastery engine.
#[derive(Debug, Clone, PartialEq)]
pub struct InteractionRecord {
    pub learner_id: Uuid,
    pub item_id: String,
    pub kc_id: String,
    pub session_id: Uuid,
    pub is_correct: bool,
    pub response_value: String,
    pub response_time_ms: u64,
    pub hint_used: bool,
    pub input_mode: InputMode,
}

//=========================================================================================
// Diagnostic Assessment
//=========================================================================================

/// A diagnostic test as handed out by the backend.
#[derive(Debug, Clone, PartialEq)]
pub struct DiagnosticTest {
    pub test_id: String,
    pub items: Vec<DiagnosticItem>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DiagnosticItem {
    pub item_id: String,
    pub kc_id: String,
    pub kc_domain: String,
    pub stem: String,
    pub choices: Vec<String>,
    pub correct_answer: usize,
}

/// One buffered diagnostic answer.
#[derive(Debug, Clone, PartialEq)]
pub struct DiagnosticResult {
    pub item_id: String,
    pub kc_id: String,
    pub domain: String,
    pub is_correct: bool,
    pub response_time_ms: u64,
    pub selected_choice: usize,
}

/// The batch submitted when a diagnostic ends.
#[derive(Debug, Clone, PartialEq)]
pub struct DiagnosticBatch {
    pub learner_id: Uuid,
    pub test_id: String,
    pub results: Vec<DiagnosticResult>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DomainScore {
    pub domain: String,
    pub score: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Recommendation {
    pub domain: String,
    pub message: String,
}

/// The server's verdict on a diagnostic.
///
/// Domain scores are kept weakest first and recommendations follow the same
/// order, so every view built from a report shows focus areas first.
#[derive(Debug, Clone, PartialEq)]
pub struct DiagnosticReport {
    pub correct_count: u32,
    pub total_items: u32,
    pub overall_score: f64,
    domain_scores: Vec<DomainScore>,
    recommendations: Vec<Recommendation>,
}

impl DiagnosticReport {
    pub fn new(
        correct_count: u32,
        total_items: u32,
        overall_score: f64,
        domain_scores: HashMap<String, f64>,
        recommendations: Vec<Recommendation>,
    ) -> Self {
        let mut domain_scores: Vec<DomainScore> = domain_scores
            .into_iter()
            .map(|(domain, score)| DomainScore { domain, score })
            .collect();
        // Ties fall back to the domain name so the order is stable across runs.
        domain_scores.sort_by(|a, b| {
            a.score
                .total_cmp(&b.score)
                .then_with(|| a.domain.cmp(&b.domain))
        });

        let rank = |domain: &str| {
            domain_scores
                .iter()
                .position(|s| s.domain == domain)
                .unwrap_or(usize::MAX)
        };
        let mut recommendations = recommendations;
        recommendations.sort_by_key(|r| rank(&r.domain));

        Self {
            correct_count,
            total_items,
            overall_score,
            domain_scores,
            recommendations,
        }
    }

    /// Domain scores, weakest first.
    pub fn domain_scores(&self) -> &[DomainScore] {
        &self.domain_scores
    }

    /// Recommendations ordered by their domain's score, weakest first.
    pub fn recommendations(&self) -> &[Recommendation] {
        &self.recommendations
    }

    /// The weakest domain, if any were scored.
    pub fn focus_area(&self) -> Option<&DomainScore> {
        self.domain_scores.first()
    }
}

//=========================================================================================
// Spaced-Repetition Review
//=========================================================================================

/// Why the backend put an item in the review queue. Exactly one per item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReviewReason {
    DueForReview,
    PastMistake,
    LowMastery,
}

impl ReviewReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReviewReason::DueForReview => "due_for_review",
            ReviewReason::PastMistake => "past_mistake",
            ReviewReason::LowMastery => "low_mastery",
        }
    }

    /// Human-readable category heading.
    pub fn label(&self) -> &'static str {
        match self {
            ReviewReason::DueForReview => "Due for review",
            ReviewReason::PastMistake => "Past mistake",
            ReviewReason::LowMastery => "Needs practice",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReviewItem {
    pub item_id: String,
    pub stem: String,
    pub choices: Vec<String>,
    pub correct_answer_index: usize,
    pub explanation: String,
    pub kc_id: String,
    pub kc_name: String,
    pub domain: String,
    pub reason: ReviewReason,
    pub mastery_probability: f64,
    pub times_wrong: u32,
}

/// Counts supplied alongside a review queue. Informational; never recomputed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct QueueStats {
    pub due_reviews: u32,
    pub mistake_reviews: u32,
    pub low_mastery_reviews: u32,
    pub total: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReviewQueue {
    pub items: Vec<ReviewItem>,
    pub stats: QueueStats,
}

//=========================================================================================
// Rewards and Progress
//=========================================================================================

/// The flat reward for finishing a lesson.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reward {
    pub xp: u32,
    pub coins: u32,
}

/// A reward addressed to one learner for one finished session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewardGrant {
    pub learner_id: Uuid,
    pub session_id: Uuid,
    pub reward: Reward,
}

/// Learner totals as confirmed by the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LearnerProgress {
    pub learner_id: Uuid,
    pub total_xp: u64,
    pub coins: u64,
    pub lessons_completed: u32,
}

impl LearnerProgress {
    pub fn empty(learner_id: Uuid) -> Self {
        Self {
            learner_id,
            total_xp: 0,
            coins: 0,
            lessons_completed: 0,
        }
    }
}
