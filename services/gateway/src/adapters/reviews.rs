//! services/gateway/src/adapters/reviews.rs
//!
//! Implements the `ReviewService` port. Items arrive already classified; the
//! adapter maps them one to one and passes the queue stats through untouched.

use async_trait::async_trait;
use learning_engine_core::domain::{QueueStats, ReviewItem, ReviewQueue, ReviewReason};
use learning_engine_core::ports::{PortResult, ReviewService};
use serde::Deserialize;
use uuid::Uuid;

use super::http::BackendClient;

#[derive(Clone)]
pub struct HttpReviewAdapter {
    client: BackendClient,
}

impl HttpReviewAdapter {
    pub fn new(client: BackendClient) -> Self {
        Self { client }
    }
}

//=========================================================================================
// Wire Records
//=========================================================================================

#[derive(Deserialize)]
struct ReviewQueueRecord {
    review_items: Vec<ReviewItemRecord>,
    #[serde(default)]
    queue_stats: QueueStatsRecord,
}

#[derive(Deserialize, Clone, Copy)]
#[serde(rename_all = "snake_case")]
enum ReviewReasonRecord {
    DueForReview,
    PastMistake,
    LowMastery,
}

/// Question fields arrive either flat on the item or nested under `content`,
/// the way diagnostic items carry them. The nested form wins when both are sent.
#[derive(Deserialize)]
struct ReviewItemRecord {
    item_id: String,
    #[serde(default)]
    content: Option<ReviewContentRecord>,
    #[serde(default)]
    stem: String,
    #[serde(default)]
    choices: Vec<String>,
    #[serde(default)]
    correct_answer_index: usize,
    #[serde(default)]
    explanation: String,
    kc_id: String,
    #[serde(default)]
    kc_name: String,
    #[serde(default)]
    domain: String,
    reason: ReviewReasonRecord,
    #[serde(default)]
    mastery_probability: f64,
    #[serde(default)]
    times_wrong: u32,
}

#[derive(Deserialize)]
struct ReviewContentRecord {
    stem: String,
    #[serde(default)]
    choices: Vec<String>,
    #[serde(alias = "correct_answer_index")]
    correct_answer: usize,
    #[serde(default)]
    explanation: Option<String>,
}

#[derive(Deserialize, Default)]
struct QueueStatsRecord {
    #[serde(default)]
    due_reviews: u32,
    #[serde(default)]
    mistake_reviews: u32,
    #[serde(default)]
    low_mastery_reviews: u32,
    #[serde(default)]
    total: u32,
}

impl ReviewReasonRecord {
    fn to_domain(self) -> ReviewReason {
        match self {
            ReviewReasonRecord::DueForReview => ReviewReason::DueForReview,
            ReviewReasonRecord::PastMistake => ReviewReason::PastMistake,
            ReviewReasonRecord::LowMastery => ReviewReason::LowMastery,
        }
    }
}

impl ReviewItemRecord {
    fn to_domain(self) -> ReviewItem {
        let (stem, choices, correct_answer_index, explanation) = match self.content {
            Some(content) => (
                content.stem,
                content.choices,
                content.correct_answer,
                content.explanation.unwrap_or(self.explanation),
            ),
            None => (
                self.stem,
                self.choices,
                self.correct_answer_index,
                self.explanation,
            ),
        };
        ReviewItem {
            item_id: self.item_id,
            stem,
            choices,
            correct_answer_index,
            explanation,
            kc_id: self.kc_id,
            kc_name: self.kc_name,
            domain: self.domain,
            reason: self.reason.to_domain(),
            mastery_probability: self.mastery_probability,
            times_wrong: self.times_wrong,
        }
    }
}

impl ReviewQueueRecord {
    fn to_domain(self) -> ReviewQueue {
        let items = self
            .review_items
            .into_iter()
            .map(ReviewItemRecord::to_domain)
            .collect();
        let stats = QueueStats {
            due_reviews: self.queue_stats.due_reviews,
            mistake_reviews: self.queue_stats.mistake_reviews,
            low_mastery_reviews: self.queue_stats.low_mastery_reviews,
            total: self.queue_stats.total,
        };
        ReviewQueue { items, stats }
    }
}

//=========================================================================================
// Port Implementation
//=========================================================================================

#[async_trait]
impl ReviewService for HttpReviewAdapter {
    async fn fetch_review_queue(&self, learner_id: Uuid) -> PortResult<ReviewQueue> {
        let record: ReviewQueueRecord = self
            .client
            .get_json(&format!("/review/queue?learner_id={}", learner_id))
            .await?;
        Ok(record.to_domain())
    }
}
