//! services/gateway/src/web/review_flow.rs
//!
//! Drives a `ReviewSession` over the backend's pre-classified queue.

use learning_engine_core::{FlowKind, ReviewEvent, ReviewSession};
use tracing::{info, warn};

use crate::web::protocol::{QueueStatsView, ReviewFeedbackView, ReviewItemView, ServerMessage};
use crate::web::state::{ActiveFlow, AppState, ConnectionState};

pub async fn start(app: &AppState, conn: &mut ConnectionState) -> Vec<ServerMessage> {
    match ReviewSession::start(app.reviews.as_ref(), conn.context.clone()).await {
        Ok(session) => {
            info!(
                learner_id = %conn.learner_id,
                session_id = %session.session_id(),
                "Review session started."
            );
            let out = opening(&session);
            conn.flow = ActiveFlow::Review(session);
            out
        }
        Err(e) => {
            warn!(learner_id = %conn.learner_id, "Failed to load review queue: {}", e);
            vec![ServerMessage::load_failed(FlowKind::Review, e.to_string(), true)]
        }
    }
}

/// Fetches a fresh queue. A failed fetch leaves the current session as it was.
pub async fn restart(app: &AppState, session: &mut ReviewSession) -> Vec<ServerMessage> {
    match session.restart(app.reviews.as_ref()).await {
        Ok(()) => opening(session),
        Err(e) => {
            warn!(session_id = %session.session_id(), "Review restart failed: {}", e);
            vec![ServerMessage::load_failed(FlowKind::Review, e.to_string(), true)]
        }
    }
}

pub fn submit(session: &mut ReviewSession, index: usize) -> Vec<ServerMessage> {
    match session.submit_answer(index) {
        Ok(feedback) => vec![ServerMessage::ReviewAnswered {
            feedback: ReviewFeedbackView::from(&feedback),
        }],
        Err(e) => vec![ServerMessage::error(e.to_string())],
    }
}

pub fn advance(session: &mut ReviewSession) -> Vec<ServerMessage> {
    match session.advance() {
        Ok(ReviewEvent::ItemPresented { .. }) => present_item(session).into_iter().collect(),
        Ok(ReviewEvent::Completed(summary)) => vec![ServerMessage::from(&summary)],
        Err(e) => vec![ServerMessage::error(e.to_string())],
    }
}

fn opening(session: &ReviewSession) -> Vec<ServerMessage> {
    let mut out = vec![ServerMessage::ReviewStarted {
        session_id: session.session_id(),
        total_items: session.items().len(),
        stats: QueueStatsView::from(session.stats()),
    }];
    if session.is_complete() {
        out.push(ServerMessage::from(&session.summary()));
    } else {
        out.extend(present_item(session));
    }
    out
}

fn present_item(session: &ReviewSession) -> Option<ServerMessage> {
    let (index, item) = session.current_item()?;
    Some(ServerMessage::ReviewItemPresented {
        index,
        total_items: session.items().len(),
        item: ReviewItemView::from(item),
    })
}
