//! crates/learning_engine_core/src/interaction.rs
//!
//! Best-effort interaction logging and response timing.
//!
//! Records are handed to an unbounded channel and drained by a background task,
//! so logging never blocks a session and never fails it. Backend failures are
//! reported to the diagnostics log and otherwise dropped.

use std::sync::Arc;
use std::time::Instant;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::domain::InteractionRecord;
use crate::ports::InteractionLogService;

//=========================================================================================
// Interaction Logger
//=========================================================================================

/// A cloneable, fire-and-forget handle for interaction records.
#[derive(Debug, Clone)]
pub struct InteractionLogger {
    tx: mpsc::UnboundedSender<InteractionRecord>,
}

impl InteractionLogger {
    /// Starts the background task that forwards records to `service`.
    ///
    /// The task ends once every logger clone has been dropped and the
    /// remaining records have been sent.
    pub fn spawn(service: Arc<dyn InteractionLogService>) -> (Self, JoinHandle<()>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let handle = tokio::spawn(forward_records(rx, service));
        (Self { tx }, handle)
    }

    /// Wraps an existing channel; whoever holds the receiver consumes the records.
    pub fn from_sender(tx: mpsc::UnboundedSender<InteractionRecord>) -> Self {
        Self { tx }
    }

    pub fn log(&self, record: InteractionRecord) {
        if self.tx.send(record).is_err() {
            debug!("Interaction log channel closed; record dropped.");
        }
    }
}

async fn forward_records(
    mut rx: mpsc::UnboundedReceiver<InteractionRecord>,
    service: Arc<dyn InteractionLogService>,
) {
    while let Some(record) = rx.recv().await {
        if let Err(e) = service.log_interaction(&record).await {
            warn!(
                item_id = %record.item_id,
                session_id = %record.session_id,
                "Failed to log interaction: {}",
                e
            );
        }
    }
    debug!("Interaction log channel drained.");
}

//=========================================================================================
// Response Timer
//=========================================================================================

/// Wall-clock time since the current step was presented.
#[derive(Debug, Clone, Copy)]
pub struct ResponseTimer {
    presented_at: Instant,
}

impl ResponseTimer {
    pub fn start() -> Self {
        Self {
            presented_at: Instant::now(),
        }
    }

    pub fn restart(&mut self) {
        self.presented_at = Instant::now();
    }

    pub fn elapsed_ms(&self) -> u64 {
        self.presented_at.elapsed().as_millis() as u64
    }
}

impl Default for ResponseTimer {
    fn default() -> Self {
        Self::start()
    }
}
