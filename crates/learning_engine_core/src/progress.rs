//! crates/learning_engine_core/src/progress.rs
//!
//! The learner's progress ledger: one authoritative store with write-through
//! to the backend.
//!
//! Rewards are applied locally straight away and queued. `reconcile` writes the
//! queue through in order and adopts the backend's totals after each accepted
//! grant. Every change is published on a `watch` channel, so the sync state is
//! observable instead of implied.

use std::collections::VecDeque;

use tokio::sync::watch;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::domain::{LearnerProgress, RewardGrant};
use crate::ports::{PortError, PortResult, ProgressService};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncStatus {
    Synced,
    /// Local grants are waiting to be written through.
    Pending,
    /// The last reconciliation failed; pending grants are kept.
    Failed(String),
}

impl SyncStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncStatus::Synced => "synced",
            SyncStatus::Pending => "pending",
            SyncStatus::Failed(_) => "failed",
        }
    }
}

/// What the ledger currently shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressSnapshot {
    /// Backend totals plus every grant not yet written through.
    pub progress: LearnerProgress,
    pub pending_grants: usize,
    pub status: SyncStatus,
}

pub struct ProgressLedger {
    confirmed: LearnerProgress,
    pending: VecDeque<RewardGrant>,
    status: SyncStatus,
    tx: watch::Sender<ProgressSnapshot>,
}

impl ProgressLedger {
    pub fn new(confirmed: LearnerProgress) -> Self {
        Self::with_status(confirmed, SyncStatus::Synced)
    }

    /// Seeds the ledger from the backend.
    pub async fn load(service: &dyn ProgressService, learner_id: Uuid) -> PortResult<Self> {
        let confirmed = service.fetch_progress(learner_id).await?;
        debug!(%learner_id, xp = confirmed.total_xp, "Progress loaded.");
        Ok(Self::new(confirmed))
    }

    /// A ledger that could not be seeded; it starts from zero until reconciled.
    pub fn unsynced(learner_id: Uuid, reason: &PortError) -> Self {
        Self::with_status(
            LearnerProgress::empty(learner_id),
            SyncStatus::Failed(reason.to_string()),
        )
    }

    fn with_status(confirmed: LearnerProgress, status: SyncStatus) -> Self {
        let snapshot = ProgressSnapshot {
            progress: confirmed.clone(),
            pending_grants: 0,
            status: status.clone(),
        };
        let (tx, _) = watch::channel(snapshot);
        Self {
            confirmed,
            pending: VecDeque::new(),
            status,
            tx,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<ProgressSnapshot> {
        self.tx.subscribe()
    }

    pub fn snapshot(&self) -> ProgressSnapshot {
        let mut progress = self.confirmed.clone();
        for grant in &self.pending {
            progress.total_xp += u64::from(grant.reward.xp);
            progress.coins += u64::from(grant.reward.coins);
            progress.lessons_completed += 1;
        }
        ProgressSnapshot {
            progress,
            pending_grants: self.pending.len(),
            status: self.status.clone(),
        }
    }

    pub fn pending(&self) -> impl Iterator<Item = &RewardGrant> + '_ {
        self.pending.iter()
    }

    /// Applies a grant locally and queues it. A session is only ever paid once.
    pub fn apply(&mut self, grant: RewardGrant) {
        if self.pending.iter().any(|g| g.session_id == grant.session_id) {
            debug!(session_id = %grant.session_id, "Grant already queued; ignoring.");
            return;
        }
        self.pending.push_back(grant);
        self.status = SyncStatus::Pending;
        self.publish();
    }

    /// Writes queued grants through to the backend, oldest first.
    ///
    /// With nothing queued this refreshes the confirmed totals instead.
    pub async fn reconcile(&mut self, service: &dyn ProgressService) -> PortResult<()> {
        if self.pending.is_empty() {
            let learner_id = self.confirmed.learner_id;
            return match service.fetch_progress(learner_id).await {
                Ok(progress) => {
                    self.confirmed = progress;
                    self.status = SyncStatus::Synced;
                    self.publish();
                    Ok(())
                }
                Err(e) => Err(self.fail(e)),
            };
        }

        while let Some(grant) = self.pending.front().cloned() {
            match service.record_reward(&grant).await {
                Ok(progress) => {
                    self.confirmed = progress;
                    self.pending.pop_front();
                    self.publish();
                }
                Err(e) => return Err(self.fail(e)),
            }
        }

        self.status = SyncStatus::Synced;
        self.publish();
        info!(
            learner_id = %self.confirmed.learner_id,
            xp = self.confirmed.total_xp,
            "Progress reconciled."
        );
        Ok(())
    }

    fn fail(&mut self, error: PortError) -> PortError {
        warn!(
            learner_id = %self.confirmed.learner_id,
            pending = self.pending.len(),
            "Progress reconciliation failed: {}",
            error
        );
        self.status = SyncStatus::Failed(error.to_string());
        self.publish();
        error
    }

    fn publish(&self) {
        self.tx.send_replace(self.snapshot());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Reward;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// A backend that already holds some progress and adds each grant to it.
    struct Backend {
        progress: Mutex<LearnerProgress>,
        down: Mutex<bool>,
        writes: Mutex<u32>,
    }

    impl Backend {
        fn with_xp(learner_id: Uuid, xp: u64) -> Self {
            Self {
                progress: Mutex::new(LearnerProgress {
                    learner_id,
                    total_xp: xp,
                    coins: 0,
                    lessons_completed: 0,
                }),
                down: Mutex::new(false),
                writes: Mutex::new(0),
            }
        }
    }

    #[async_trait]
    impl ProgressService for Backend {
        async fn fetch_progress(&self, _learner_id: Uuid) -> PortResult<LearnerProgress> {
            if *self.down.lock().unwrap() {
                return Err(PortError::Unavailable("down".into()));
            }
            Ok(self.progress.lock().unwrap().clone())
        }

        async fn record_reward(&self, grant: &RewardGrant) -> PortResult<LearnerProgress> {
            if *self.down.lock().unwrap() {
                return Err(PortError::Unavailable("down".into()));
            }
            *self.writes.lock().unwrap() += 1;
            let mut progress = self.progress.lock().unwrap();
            progress.total_xp += u64::from(grant.reward.xp);
            progress.coins += u64::from(grant.reward.coins);
            progress.lessons_completed += 1;
            Ok(progress.clone())
        }
    }

    fn grant(learner_id: Uuid) -> RewardGrant {
        RewardGrant {
            learner_id,
            session_id: Uuid::new_v4(),
            reward: Reward { xp: 10, coins: 5 },
        }
    }

    #[test]
    fn apply_is_optimistic_and_idempotent_per_session() {
        let learner_id = Uuid::new_v4();
        let mut ledger = ProgressLedger::new(LearnerProgress::empty(learner_id));
        let mut rx = ledger.subscribe();

        let g = grant(learner_id);
        ledger.apply(g.clone());
        ledger.apply(g);

        let snapshot = ledger.snapshot();
        assert_eq!(snapshot.progress.total_xp, 10);
        assert_eq!(snapshot.progress.coins, 5);
        assert_eq!(snapshot.pending_grants, 1);
        assert_eq!(snapshot.status, SyncStatus::Pending);
        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow_and_update().status, SyncStatus::Pending);
    }

    #[tokio::test]
    async fn reconcile_adopts_backend_totals() {
        let learner_id = Uuid::new_v4();
        let backend = Backend::with_xp(learner_id, 100);
        let mut ledger = ProgressLedger::load(&backend, learner_id).await.unwrap();

        ledger.apply(grant(learner_id));
        ledger.apply(grant(learner_id));
        ledger.reconcile(&backend).await.unwrap();

        let snapshot = ledger.snapshot();
        assert_eq!(snapshot.status, SyncStatus::Synced);
        assert_eq!(snapshot.pending_grants, 0);
        assert_eq!(snapshot.progress.total_xp, 120);
        assert_eq!(snapshot.progress.lessons_completed, 2);
        assert_eq!(*backend.writes.lock().unwrap(), 2);
    }

    #[tokio::test]
    async fn failed_reconcile_keeps_grants_until_a_later_pass() {
        let learner_id = Uuid::new_v4();
        let backend = Backend::with_xp(learner_id, 0);
        let mut ledger = ProgressLedger::new(LearnerProgress::empty(learner_id));
        let rx = ledger.subscribe();

        *backend.down.lock().unwrap() = true;
        ledger.apply(grant(learner_id));
        assert!(ledger.reconcile(&backend).await.is_err());

        let snapshot = rx.borrow().clone();
        assert!(matches!(snapshot.status, SyncStatus::Failed(_)));
        assert_eq!(snapshot.pending_grants, 1);
        assert_eq!(snapshot.progress.total_xp, 10);
        assert_eq!(*backend.writes.lock().unwrap(), 0);

        *backend.down.lock().unwrap() = false;
        ledger.reconcile(&backend).await.unwrap();
        assert_eq!(rx.borrow().status, SyncStatus::Synced);
        assert_eq!(*backend.writes.lock().unwrap(), 1);
    }

    #[tokio::test]
    async fn unsynced_ledger_recovers_on_refresh() {
        let learner_id = Uuid::new_v4();
        let backend = Backend::with_xp(learner_id, 40);
        let mut ledger =
            ProgressLedger::unsynced(learner_id, &PortError::Unavailable("boot".into()));
        assert_eq!(ledger.snapshot().status.as_str(), "failed");

        ledger.reconcile(&backend).await.unwrap();
        assert_eq!(ledger.snapshot().progress.total_xp, 40);
        assert_eq!(ledger.snapshot().status, SyncStatus::Synced);
    }
}
