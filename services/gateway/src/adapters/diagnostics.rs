//! services/gateway/src/adapters/diagnostics.rs
//!
//! Implements the `DiagnosticService` port: handing out a test and scoring the
//! submitted batch.

use std::collections::HashMap;

use async_trait::async_trait;
use learning_engine_core::domain::{
    DiagnosticBatch, DiagnosticItem, DiagnosticReport, DiagnosticResult, DiagnosticTest,
    Recommendation,
};
use learning_engine_core::ports::{DiagnosticService, PortResult};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::http::BackendClient;

#[derive(Clone)]
pub struct HttpDiagnosticAdapter {
    client: BackendClient,
}

impl HttpDiagnosticAdapter {
    pub fn new(client: BackendClient) -> Self {
        Self { client }
    }
}

//=========================================================================================
// Wire Records
//=========================================================================================

#[derive(Serialize)]
struct StartRequest {
    learner_id: Uuid,
}

#[derive(Deserialize)]
struct DiagnosticTestRecord {
    test_id: String,
    items: Vec<DiagnosticItemRecord>,
}

#[derive(Deserialize)]
struct DiagnosticItemRecord {
    item_id: String,
    kc_id: String,
    kc_domain: String,
    content: ItemContentRecord,
}

#[derive(Deserialize)]
struct ItemContentRecord {
    stem: String,
    choices: Vec<String>,
    correct_answer: usize,
}

impl DiagnosticTestRecord {
    fn to_domain(self) -> DiagnosticTest {
        DiagnosticTest {
            test_id: self.test_id,
            items: self
                .items
                .into_iter()
                .map(|item| DiagnosticItem {
                    item_id: item.item_id,
                    kc_id: item.kc_id,
                    kc_domain: item.kc_domain,
                    stem: item.content.stem,
                    choices: item.content.choices,
                    correct_answer: item.content.correct_answer,
                })
                .collect(),
        }
    }
}

#[derive(Serialize)]
struct CompleteRequest<'a> {
    learner_id: Uuid,
    test_id: &'a str,
    results: Vec<ResultRecord<'a>>,
}

#[derive(Serialize)]
struct ResultRecord<'a> {
    item_id: &'a str,
    kc_id: &'a str,
    domain: &'a str,
    is_correct: bool,
    response_time_ms: u64,
    selected_choice: usize,
}

impl<'a> From<&'a DiagnosticResult> for ResultRecord<'a> {
    fn from(result: &'a DiagnosticResult) -> Self {
        Self {
            item_id: &result.item_id,
            kc_id: &result.kc_id,
            domain: &result.domain,
            is_correct: result.is_correct,
            response_time_ms: result.response_time_ms,
            selected_choice: result.selected_choice,
        }
    }
}

/// The scoring response. Fields beyond these are ignored.
#[derive(Deserialize)]
struct ReportRecord {
    correct_count: u32,
    total_items: u32,
    overall_score: f64,
    #[serde(default)]
    domain_scores: HashMap<String, f64>,
    #[serde(default)]
    recommendations: Vec<RecommendationRecord>,
}

#[derive(Deserialize)]
struct RecommendationRecord {
    domain: String,
    message: String,
}

impl ReportRecord {
    fn to_domain(self) -> DiagnosticReport {
        let recommendations = self
            .recommendations
            .into_iter()
            .map(|r| Recommendation {
                domain: r.domain,
                message: r.message,
            })
            .collect();
        DiagnosticReport::new(
            self.correct_count,
            self.total_items,
            self.overall_score,
            self.domain_scores,
            recommendations,
        )
    }
}

//=========================================================================================
// Port Implementation
//=========================================================================================

#[async_trait]
impl DiagnosticService for HttpDiagnosticAdapter {
    async fn start_diagnostic(&self, learner_id: Uuid) -> PortResult<DiagnosticTest> {
        let record: DiagnosticTestRecord = self
            .client
            .post_json("/diagnostic/start", &StartRequest { learner_id })
            .await?;
        Ok(record.to_domain())
    }

    async fn complete_diagnostic(&self, batch: &DiagnosticBatch) -> PortResult<DiagnosticReport> {
        let request = CompleteRequest {
            learner_id: batch.learner_id,
            test_id: &batch.test_id,
            results: batch.results.iter().map(ResultRecord::from).collect(),
        };
        let record: ReportRecord = self
            .client
            .post_json("/diagnostic/complete", &request)
            .await?;
        Ok(record.to_domain())
    }
}
