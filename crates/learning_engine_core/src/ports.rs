//! crates/learning_engine_core/src/ports.rs
//!
//! Defines the service contracts (traits) the engine relies on.
//! These traits form the boundary of the hexagonal architecture: the backend
//! mastery engine is only ever reached through them, so the engine stays
//! independent of HTTP clients or any other transport.

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::{
    DiagnosticBatch, DiagnosticReport, DiagnosticTest, InteractionRecord, LearnerProgress,
    LessonItem, ReviewQueue, RewardGrant,
};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (e.g., network).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("Backend unavailable: {0}")]
    Unavailable(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

#[async_trait]
pub trait LessonService: Send + Sync {
    /// Fetches the ordered items of a lesson.
    async fn fetch_lesson_items(&self, lesson_id: &str) -> PortResult<Vec<LessonItem>>;
}

#[async_trait]
pub trait InteractionLogService: Send + Sync {
    /// Records one answered item. Callers ignore the outcome beyond logging it.
    async fn log_interaction(&self, record: &InteractionRecord) -> PortResult<()>;
}

#[async_trait]
pub trait DiagnosticService: Send + Sync {
    /// Hands out a fixed, ordered diagnostic test for a learner.
    async fn start_diagnostic(&self, learner_id: Uuid) -> PortResult<DiagnosticTest>;

    /// Scores a full batch of answers.
    async fn complete_diagnostic(&self, batch: &DiagnosticBatch) -> PortResult<DiagnosticReport>;
}

#[async_trait]
pub trait ReviewService: Send + Sync {
    /// Fetches the learner's pre-classified review queue.
    async fn fetch_review_queue(&self, learner_id: Uuid) -> PortResult<ReviewQueue>;
}

#[async_trait]
pub trait ProgressService: Send + Sync {
    async fn fetch_progress(&self, learner_id: Uuid) -> PortResult<LearnerProgress>;

    /// Writes a reward through to the backend and returns the updated totals.
    async fn record_reward(&self, grant: &RewardGrant) -> PortResult<LearnerProgress>;
}
