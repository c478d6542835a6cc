//! An in-memory backend for exercising the gateway without HTTP.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use gateway_lib::config::Config;
use gateway_lib::web::state::{AppState, ConnectionState};
use learning_engine_core::{
    CommandBus, CommandReceiver, DiagnosticBatch, DiagnosticItem, DiagnosticReport,
    DiagnosticService, DiagnosticTest, InteractionLogService, InteractionLogger,
    InteractionRecord, LearnerProgress, LessonItem, LessonService, PortError, PortResult,
    ProgressLedger, ProgressService, QueueStats, Recommendation, ReviewItem, ReviewQueue,
    ReviewReason, ReviewService, RewardGrant, SessionContext,
};
use tokio::sync::mpsc;
use uuid::Uuid;

#[derive(Default)]
pub struct FakeBackend {
    pub lesson_items: Mutex<Vec<LessonItem>>,
    pub review_items: Mutex<Vec<ReviewItem>>,
    pub progress: Mutex<HashMap<Uuid, LearnerProgress>>,
    pub interactions: Mutex<Vec<InteractionRecord>>,
    pub submissions: Mutex<Vec<DiagnosticBatch>>,
    /// Makes every call fail with `Unavailable` while set.
    pub offline: Mutex<bool>,
}

impl FakeBackend {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn set_offline(&self, offline: bool) {
        *self.offline.lock().unwrap() = offline;
    }

    fn check_online(&self) -> PortResult<()> {
        if *self.offline.lock().unwrap() {
            return Err(PortError::Unavailable("backend offline".to_string()));
        }
        Ok(())
    }
}

pub fn quiz_item(id: &str, correct: usize) -> LessonItem {
    LessonItem {
        id: id.to_string(),
        stem: format!("Question {}", id),
        choices: vec!["a".into(), "b".into(), "c".into()],
        correct_answer_index: correct,
        explanation: format!("Explanation for {}", id),
        kc_id: format!("kc-{}", id),
    }
}

pub fn review_item(id: &str, reason: ReviewReason) -> ReviewItem {
    ReviewItem {
        item_id: id.to_string(),
        stem: format!("Review {}", id),
        choices: vec!["yes".into(), "no".into()],
        correct_answer_index: 0,
        explanation: "Because yes.".into(),
        kc_id: format!("kc-{}", id),
        kc_name: "Savings".into(),
        domain: "banking".into(),
        reason,
        mastery_probability: 0.4,
        times_wrong: 1,
    }
}

#[async_trait]
impl LessonService for FakeBackend {
    async fn fetch_lesson_items(&self, _lesson_id: &str) -> PortResult<Vec<LessonItem>> {
        self.check_online()?;
        Ok(self.lesson_items.lock().unwrap().clone())
    }
}

#[async_trait]
impl InteractionLogService for FakeBackend {
    async fn log_interaction(&self, record: &InteractionRecord) -> PortResult<()> {
        self.check_online()?;
        self.interactions.lock().unwrap().push(record.clone());
        Ok(())
    }
}

#[async_trait]
impl DiagnosticService for FakeBackend {
    async fn start_diagnostic(&self, _learner_id: Uuid) -> PortResult<DiagnosticTest> {
        self.check_online()?;
        let items = ["banking", "credit"]
            .iter()
            .enumerate()
            .map(|(n, domain)| DiagnosticItem {
                item_id: format!("d{}", n),
                kc_id: format!("kc-{}", domain),
                kc_domain: domain.to_string(),
                stem: format!("About {}", domain),
                choices: vec!["right".into(), "wrong".into()],
                correct_answer: 0,
            })
            .collect();
        Ok(DiagnosticTest {
            test_id: "dx-fake".into(),
            items,
        })
    }

    async fn complete_diagnostic(&self, batch: &DiagnosticBatch) -> PortResult<DiagnosticReport> {
        self.check_online()?;
        self.submissions.lock().unwrap().push(batch.clone());
        let correct = batch.results.iter().filter(|r| r.is_correct).count() as u32;
        Ok(DiagnosticReport::new(
            correct,
            batch.results.len() as u32,
            0.5,
            HashMap::from([("banking".to_string(), 1.0), ("credit".to_string(), 0.0)]),
            vec![Recommendation {
                domain: "credit".into(),
                message: "Study credit.".into(),
            }],
        ))
    }
}

#[async_trait]
impl ReviewService for FakeBackend {
    async fn fetch_review_queue(&self, _learner_id: Uuid) -> PortResult<ReviewQueue> {
        self.check_online()?;
        let items = self.review_items.lock().unwrap().clone();
        Ok(ReviewQueue {
            stats: QueueStats {
                due_reviews: 0,
                mistake_reviews: items.len() as u32,
                low_mastery_reviews: 0,
                total: items.len() as u32,
            },
            items,
        })
    }
}

#[async_trait]
impl ProgressService for FakeBackend {
    async fn fetch_progress(&self, learner_id: Uuid) -> PortResult<LearnerProgress> {
        self.check_online()?;
        self.progress
            .lock()
            .unwrap()
            .get(&learner_id)
            .cloned()
            .ok_or_else(|| PortError::NotFound(learner_id.to_string()))
    }

    async fn record_reward(&self, grant: &RewardGrant) -> PortResult<LearnerProgress> {
        self.check_online()?;
        let mut progress = self.progress.lock().unwrap();
        let entry = progress
            .entry(grant.learner_id)
            .or_insert_with(|| LearnerProgress::empty(grant.learner_id));
        entry.total_xp += u64::from(grant.reward.xp);
        entry.coins += u64::from(grant.reward.coins);
        entry.lessons_completed += 1;
        Ok(entry.clone())
    }
}

pub fn app_state(backend: &Arc<FakeBackend>) -> AppState {
    let config = Config::from_lookup(|key| match key {
        "BACKEND_URL" => Some("http://backend.invalid".to_string()),
        _ => None,
    })
    .unwrap();
    AppState {
        config: Arc::new(config),
        lessons: backend.clone(),
        interactions: backend.clone(),
        diagnostics: backend.clone(),
        reviews: backend.clone(),
        progress: backend.clone(),
    }
}

/// A connection whose interaction records and commands land in test channels.
pub struct TestConnection {
    pub conn: ConnectionState,
    pub records: mpsc::UnboundedReceiver<InteractionRecord>,
    pub commands: CommandReceiver,
}

pub fn connection(learner_id: Uuid) -> TestConnection {
    let (log_tx, records) = mpsc::unbounded_channel();
    let (bus, commands) = CommandBus::channel();
    let context = SessionContext {
        learner_id,
        logger: InteractionLogger::from_sender(log_tx),
        commands: bus,
    };
    TestConnection {
        conn: ConnectionState::new(
            context,
            ProgressLedger::new(LearnerProgress::empty(learner_id)),
        ),
        records,
        commands,
    }
}
