//! services/gateway/src/adapters/progress.rs
//!
//! Implements the `ProgressService` port: reading learner totals and writing
//! lesson rewards through to the backend.

use async_trait::async_trait;
use learning_engine_core::domain::{LearnerProgress, RewardGrant};
use learning_engine_core::ports::{ProgressService, PortResult};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::http::BackendClient;

#[derive(Clone)]
pub struct HttpProgressAdapter {
    client: BackendClient,
}

impl HttpProgressAdapter {
    pub fn new(client: BackendClient) -> Self {
        Self { client }
    }
}

#[derive(Deserialize)]
struct ProgressRecord {
    learner_id: Uuid,
    #[serde(default)]
    total_xp: u64,
    #[serde(default)]
    coins: u64,
    #[serde(default)]
    lessons_completed: u32,
}

impl ProgressRecord {
    fn to_domain(self) -> LearnerProgress {
        LearnerProgress {
            learner_id: self.learner_id,
            total_xp: self.total_xp,
            coins: self.coins,
            lessons_completed: self.lessons_completed,
        }
    }
}

#[derive(Serialize)]
struct RewardRequest {
    session_id: Uuid,
    xp: u32,
    coins: u32,
}

#[async_trait]
impl ProgressService for HttpProgressAdapter {
    async fn fetch_progress(&self, learner_id: Uuid) -> PortResult<LearnerProgress> {
        let record: ProgressRecord = self
            .client
            .get_json(&format!("/learners/{}/progress", learner_id))
            .await?;
        Ok(record.to_domain())
    }

    async fn record_reward(&self, grant: &RewardGrant) -> PortResult<LearnerProgress> {
        let request = RewardRequest {
            session_id: grant.session_id,
            xp: grant.reward.xp,
            coins: grant.reward.coins,
        };
        let record: ProgressRecord = self
            .client
            .post_json(&format!("/learners/{}/rewards", grant.learner_id), &request)
            .await?;
        Ok(record.to_domain())
    }
}
