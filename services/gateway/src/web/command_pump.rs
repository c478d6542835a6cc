//! services/gateway/src/web/command_pump.rs
//!
//! The per-connection task that drains the engine's command channel.
//!
//! Rewards are applied to the connection's progress ledger and written through to
//! the backend; every other command becomes a message for the UI.

use std::sync::Arc;

use learning_engine_core::{CommandReceiver, EngineCommand, ProgressLedger};
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::web::protocol::{ProgressView, ServerMessage};
use crate::web::state::{AppState, WsSender};
use crate::web::ws_handler::send_message;

/// Runs until the token is cancelled, the channel closes or the socket goes away.
pub async fn command_pump(
    app_state: Arc<AppState>,
    ledger: Arc<Mutex<ProgressLedger>>,
    mut commands: CommandReceiver,
    ws_sender: WsSender,
    token: CancellationToken,
) {
    loop {
        let command = tokio::select! {
            _ = token.cancelled() => break,
            command = commands.recv() => command,
        };
        let Some(command) = command else {
            break;
        };

        for message in handle_command(&app_state, &ledger, command).await {
            if let Err(e) = send_message(&ws_sender, &message).await {
                debug!("Command pump stopping; socket unavailable: {}", e);
                return;
            }
        }
    }
    debug!("Command pump stopped.");
}

/// Carries out one command and returns what the UI should be told.
pub async fn handle_command(
    app_state: &AppState,
    ledger: &Mutex<ProgressLedger>,
    command: EngineCommand,
) -> Vec<ServerMessage> {
    match command {
        EngineCommand::GrantReward(grant) => {
            info!(
                learner_id = %grant.learner_id,
                session_id = %grant.session_id,
                xp = grant.reward.xp,
                "Granting lesson reward."
            );
            let mut ledger = ledger.lock().await;
            ledger.apply(grant);
            let optimistic = progress_updated(&ledger);
            // A failure is recorded on the ledger; the next sync picks it up.
            let _ = ledger.reconcile(app_state.progress.as_ref()).await;
            vec![optimistic, progress_updated(&ledger)]
        }
        EngineCommand::OpenSupportChat {
            session_id,
            flow,
            item_id,
            kc_id,
        } => vec![ServerMessage::OpenSupportChat {
            flow: flow.as_str(),
            session_id,
            item_id,
            kc_id,
        }],
        EngineCommand::HeartsDepleted { session_id } => {
            vec![ServerMessage::HeartsDepleted { session_id }]
        }
    }
}

pub fn progress_updated(ledger: &ProgressLedger) -> ServerMessage {
    ServerMessage::ProgressUpdated {
        progress: ProgressView::from(&ledger.snapshot()),
    }
}
