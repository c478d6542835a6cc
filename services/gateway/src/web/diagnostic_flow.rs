//! services/gateway/src/web/diagnostic_flow.rs
//!
//! Drives a `DiagnosticSession`. The batch goes out as soon as the last item is
//! continued past; a failed submission waits for the learner to retry.

use learning_engine_core::{
    CommandBus, DiagnosticEvent, DiagnosticSession, EngineCommand, EngineError, FlowKind,
};
use tracing::{info, warn};

use crate::web::protocol::{DiagnosticItemView, DiagnosticReportView, ServerMessage};
use crate::web::state::{ActiveFlow, AppState, ConnectionState};

pub async fn start(app: &AppState, conn: &mut ConnectionState) -> Vec<ServerMessage> {
    match DiagnosticSession::start(app.diagnostics.as_ref(), conn.learner_id).await {
        Ok(session) => {
            info!(
                learner_id = %conn.learner_id,
                test_id = %session.test_id(),
                "Diagnostic session started."
            );
            let mut out = vec![ServerMessage::DiagnosticStarted {
                session_id: session.session_id(),
                test_id: session.test_id().to_string(),
                total_items: session.total_items(),
            }];
            out.extend(present_item(&session));
            conn.flow = ActiveFlow::Diagnostic(session);
            out
        }
        Err(EngineError::EmptyDiagnostic) => vec![ServerMessage::load_failed(
            FlowKind::Diagnostic,
            "The diagnostic has no items.",
            false,
        )],
        Err(e) => {
            warn!(learner_id = %conn.learner_id, "Failed to start diagnostic: {}", e);
            vec![ServerMessage::load_failed(FlowKind::Diagnostic, e.to_string(), true)]
        }
    }
}

pub fn submit(session: &mut DiagnosticSession, index: usize) -> Vec<ServerMessage> {
    match session.submit_answer(index) {
        Ok(feedback) => vec![ServerMessage::from(&feedback)],
        Err(e) => vec![ServerMessage::error(e.to_string())],
    }
}

pub async fn advance(app: &AppState, session: &mut DiagnosticSession) -> Vec<ServerMessage> {
    match session.advance() {
        Ok(DiagnosticEvent::ItemPresented { .. }) => present_item(session).into_iter().collect(),
        Ok(DiagnosticEvent::ReadyToSubmit) => finish(app, session).await,
        Err(e) => vec![ServerMessage::error(e.to_string())],
    }
}

/// Submits the buffered answers. Also serves learner-triggered retries.
pub async fn finish(app: &AppState, session: &mut DiagnosticSession) -> Vec<ServerMessage> {
    let buffered = session.results().len();
    match session.finish(app.diagnostics.as_ref()).await {
        Ok(report) => vec![ServerMessage::DiagnosticCompleted {
            report: DiagnosticReportView::from(report),
        }],
        Err(EngineError::Port(e)) => vec![ServerMessage::DiagnosticSubmissionFailed {
            message: e.to_string(),
            buffered,
        }],
        Err(e) => vec![ServerMessage::error(e.to_string())],
    }
}

pub fn request_support(session: &DiagnosticSession, commands: &CommandBus) {
    let item = session.current_item().map(|(_, item)| item);
    commands.dispatch(EngineCommand::OpenSupportChat {
        session_id: session.session_id(),
        flow: FlowKind::Diagnostic,
        item_id: item.map(|i| i.item_id.clone()),
        kc_id: item.map(|i| i.kc_id.clone()),
    });
}

fn present_item(session: &DiagnosticSession) -> Option<ServerMessage> {
    let (index, item) = session.current_item()?;
    Some(ServerMessage::DiagnosticItemPresented {
        index,
        total_items: session.total_items(),
        item: DiagnosticItemView::from(item),
    })
}
