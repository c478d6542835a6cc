//! services/gateway/src/adapters/interactions.rs
//!
//! Implements the `InteractionLogService` port. The backend's reply carries
//! nothing the engine needs, so only the status is checked.

use async_trait::async_trait;
use learning_engine_core::domain::InteractionRecord;
use learning_engine_core::ports::{InteractionLogService, PortResult};
use serde::Serialize;
use uuid::Uuid;

use super::http::BackendClient;

#[derive(Clone)]
pub struct HttpInteractionAdapter {
    client: BackendClient,
}

impl HttpInteractionAdapter {
    pub fn new(client: BackendClient) -> Self {
        Self { client }
    }
}

#[derive(Serialize)]
struct InteractionPayload<'a> {
    learner_id: Uuid,
    item_id: &'a str,
    kc_id: &'a str,
    session_id: Uuid,
    is_correct: bool,
    response_value: &'a str,
    response_time_ms: u64,
    hint_used: bool,
    input_mode: &'static str,
}

impl<'a> From<&'a InteractionRecord> for InteractionPayload<'a> {
    fn from(record: &'a InteractionRecord) -> Self {
        Self {
            learner_id: record.learner_id,
            item_id: &record.item_id,
            kc_id: &record.kc_id,
            session_id: record.session_id,
            is_correct: record.is_correct,
            response_value: &record.response_value,
            response_time_ms: record.response_time_ms,
            hint_used: record.hint_used,
            input_mode: record.input_mode.as_str(),
        }
    }
}

#[async_trait]
impl InteractionLogService for HttpInteractionAdapter {
    async fn log_interaction(&self, record: &InteractionRecord) -> PortResult<()> {
        self.client
            .post_ignoring_body("/interactions", &InteractionPayload::from(record))
            .await
    }
}
