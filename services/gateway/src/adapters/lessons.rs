//! services/gateway/src/adapters/lessons.rs
//!
//! Implements the `LessonService` port against the backend's lesson endpoint.

use async_trait::async_trait;
use learning_engine_core::domain::LessonItem;
use learning_engine_core::ports::{LessonService, PortResult};
use serde::Deserialize;

use super::http::{path_segment, BackendClient};

#[derive(Clone)]
pub struct HttpLessonAdapter {
    client: BackendClient,
}

impl HttpLessonAdapter {
    pub fn new(client: BackendClient) -> Self {
        Self { client }
    }
}

//=========================================================================================
// Wire Records
//=========================================================================================

#[derive(Deserialize)]
struct LessonItemRecord {
    id: String,
    #[serde(default)]
    stem: String,
    #[serde(default)]
    choices: Vec<String>,
    #[serde(default)]
    correct_answer_index: usize,
    #[serde(default)]
    explanation: String,
    kc_id: String,
}

impl LessonItemRecord {
    fn to_domain(self) -> LessonItem {
        LessonItem {
            id: self.id,
            stem: self.stem,
            choices: self.choices,
            correct_answer_index: self.correct_answer_index,
            explanation: self.explanation,
            kc_id: self.kc_id,
        }
    }
}

//=========================================================================================
// Port Implementation
//=========================================================================================

#[async_trait]
impl LessonService for HttpLessonAdapter {
    async fn fetch_lesson_items(&self, lesson_id: &str) -> PortResult<Vec<LessonItem>> {
        let path = format!("/lessons/{}/items", path_segment(lesson_id)?);
        let records: Vec<LessonItemRecord> = self.client.get_json(&path).await?;
        Ok(records.into_iter().map(LessonItemRecord::to_domain).collect())
    }
}
