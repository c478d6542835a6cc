//! services/gateway/src/web/state.rs
//!
//! Defines the application's shared and connection-specific states.

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use futures::stream::SplitSink;
use learning_engine_core::{
    DiagnosticService, DiagnosticSession, FlowKind, InteractionLogService, LessonService,
    LessonSession, ProgressLedger, ProgressService, ReviewService, ReviewSession, SessionContext,
};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::adapters::{
    BackendClient, HttpDiagnosticAdapter, HttpInteractionAdapter, HttpLessonAdapter,
    HttpProgressAdapter, HttpReviewAdapter,
};
use crate::config::Config;

/// The WebSocket sink, shared by the message loop and the command pump.
pub type WsSender = Arc<Mutex<SplitSink<WebSocket, Message>>>;

//=========================================================================================
// AppState (Shared Across All Connections)
//=========================================================================================

/// The shared application state, created once at startup and passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub lessons: Arc<dyn LessonService>,
    pub interactions: Arc<dyn InteractionLogService>,
    pub diagnostics: Arc<dyn DiagnosticService>,
    pub reviews: Arc<dyn ReviewService>,
    pub progress: Arc<dyn ProgressService>,
}

impl AppState {
    /// Wires every port to the HTTP adapters of one backend.
    pub fn with_backend(config: Arc<Config>, client: BackendClient) -> Self {
        Self {
            config,
            lessons: Arc::new(HttpLessonAdapter::new(client.clone())),
            interactions: Arc::new(HttpInteractionAdapter::new(client.clone())),
            diagnostics: Arc::new(HttpDiagnosticAdapter::new(client.clone())),
            reviews: Arc::new(HttpReviewAdapter::new(client.clone())),
            progress: Arc::new(HttpProgressAdapter::new(client)),
        }
    }
}

//=========================================================================================
// ConnectionState (Specific to One WebSocket Connection)
//=========================================================================================

/// The flow currently owned by a connection. Replacing it drops the old one.
pub enum ActiveFlow {
    Idle,
    Lesson(LessonSession),
    Diagnostic(DiagnosticSession),
    Review(ReviewSession),
}

impl ActiveFlow {
    pub fn kind(&self) -> Option<FlowKind> {
        match self {
            ActiveFlow::Idle => None,
            ActiveFlow::Lesson(_) => Some(FlowKind::Lesson),
            ActiveFlow::Diagnostic(_) => Some(FlowKind::Diagnostic),
            ActiveFlow::Review(_) => Some(FlowKind::Review),
        }
    }
}

/// The state for a single, active WebSocket connection.
pub struct ConnectionState {
    pub learner_id: Uuid,
    pub context: SessionContext,
    pub ledger: Arc<Mutex<ProgressLedger>>,
    pub flow: ActiveFlow,
}

impl ConnectionState {
    pub fn new(context: SessionContext, ledger: ProgressLedger) -> Self {
        Self {
            learner_id: context.learner_id,
            context,
            ledger: Arc::new(Mutex::new(ledger)),
            flow: ActiveFlow::Idle,
        }
    }
}
