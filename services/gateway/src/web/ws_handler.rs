//! services/gateway/src/web/ws_handler.rs
//!
//! This is the main entry point and control loop for a WebSocket connection.
//! The loop owns the connection's active flow; interaction logging and engine
//! commands are handled by their own background tasks.

use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    response::Response,
};
use futures::{SinkExt, StreamExt};
use learning_engine_core::{CommandBus, InteractionLogger, ProgressLedger, SessionContext};
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::error::ApiError;
use crate::web::{
    command_pump::{command_pump, progress_updated},
    diagnostic_flow, lesson_flow,
    protocol::{ClientMessage, ServerMessage},
    review_flow,
    state::{ActiveFlow, AppState, ConnectionState, WsSender},
};

/// The handler for upgrading HTTP requests to WebSocket connections.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(app_state): State<Arc<AppState>>,
) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, app_state))
}

async fn handle_socket(socket: WebSocket, app_state: Arc<AppState>) {
    info!("New WebSocket connection established.");

    // The sender is wrapped in an Arc<Mutex<>> to allow for shared mutable access across tasks.
    let (sender, mut receiver) = socket.split();
    let ws_sender: WsSender = Arc::new(Mutex::new(sender));

    // --- 1. Initialization Phase ---
    let learner_id = match receiver.next().await {
        Some(Ok(Message::Text(init_json))) => {
            match serde_json::from_str::<ClientMessage>(init_json.as_str()) {
                Ok(ClientMessage::Init { learner_id }) => learner_id,
                _ => {
                    error!("First message was not a valid Init message.");
                    let reply = ServerMessage::error("The first message must be init.");
                    let _ = send_message(&ws_sender, &reply).await;
                    return;
                }
            }
        }
        _ => {
            error!("Client disconnected before sending Init message.");
            return;
        }
    };
    info!(%learner_id, "Initializing connection.");

    let (logger, _log_task) = InteractionLogger::spawn(app_state.interactions.clone());
    let (commands, command_rx) = CommandBus::channel();
    let ledger = load_ledger(&app_state, learner_id).await;
    let context = SessionContext {
        learner_id,
        logger,
        commands,
    };
    let mut conn = ConnectionState::new(context, ledger);

    let initial = vec![
        ServerMessage::SessionInitialized { learner_id },
        progress_updated(&*conn.ledger.lock().await),
    ];
    if let Err(e) = send_all(&ws_sender, &initial).await {
        error!("Failed to send session initialized message: {}", e);
        return;
    }

    let shutdown = CancellationToken::new();
    let pump_task = tokio::spawn(command_pump(
        app_state.clone(),
        conn.ledger.clone(),
        command_rx,
        ws_sender.clone(),
        shutdown.clone(),
    ));

    // --- 2. Main Message Loop ---
    loop {
        let Some(Ok(msg)) = receiver.next().await else {
            info!("Client disconnected.");
            break;
        };
        match msg {
            Message::Text(text) => {
                let replies = match serde_json::from_str::<ClientMessage>(text.as_str()) {
                    Ok(client_msg) => {
                        handle_client_message(&app_state, &mut conn, client_msg).await
                    }
                    Err(e) => {
                        warn!("Failed to deserialize client message: {}", e);
                        vec![ServerMessage::error(format!("Unrecognized message: {}", e))]
                    }
                };
                if let Err(e) = send_all(&ws_sender, &replies).await {
                    error!("Failed to send reply: {}", e);
                    break;
                }
            }
            Message::Close(_) => {
                info!("Client sent close message.");
                break;
            }
            _ => {}
        }
    }

    // --- 3. Cleanup ---
    // Dropping the connection drops the active flow and closes both channels.
    drop(conn);
    shutdown.cancel();
    if let Err(e) = pump_task.await {
        error!("Command pump task failed: {}", e);
    }
    info!(%learner_id, "WebSocket connection closed.");
}

/// Seeds the connection's ledger. A failed preload starts from zero, marked failed.
async fn load_ledger(app_state: &AppState, learner_id: Uuid) -> ProgressLedger {
    match ProgressLedger::load(app_state.progress.as_ref(), learner_id).await {
        Ok(ledger) => ledger,
        Err(e) => {
            warn!(%learner_id, "Failed to load learner progress: {}", e);
            ProgressLedger::unsynced(learner_id, &e)
        }
    }
}

/// Routes one client message to the active flow and returns the replies.
pub async fn handle_client_message(
    app_state: &AppState,
    conn: &mut ConnectionState,
    message: ClientMessage,
) -> Vec<ServerMessage> {
    match message {
        ClientMessage::Init { .. } => {
            warn!("Received subsequent Init message, which is ignored.");
            Vec::new()
        }
        ClientMessage::StartLesson { lesson_id } => {
            lesson_flow::start(app_state, conn, &lesson_id).await
        }
        ClientMessage::StartDiagnostic => diagnostic_flow::start(app_state, conn).await,
        ClientMessage::StartReview => review_flow::start(app_state, conn).await,

        ClientMessage::SelectChoice { index, input_mode } => match &mut conn.flow {
            ActiveFlow::Lesson(session) => {
                lesson_flow::select(session, index, input_mode.to_domain())
            }
            flow => not_available("select_choice", flow),
        },
        ClientMessage::UseHint => match &mut conn.flow {
            ActiveFlow::Lesson(session) => lesson_flow::use_hint(session),
            flow => not_available("use_hint", flow),
        },
        ClientMessage::Check => match &mut conn.flow {
            ActiveFlow::Lesson(session) => lesson_flow::check(session),
            flow => not_available("check", flow),
        },
        ClientMessage::SubmitAnswer { index } => match &mut conn.flow {
            ActiveFlow::Lesson(session) => lesson_flow::submit(session, index),
            ActiveFlow::Diagnostic(session) => diagnostic_flow::submit(session, index),
            ActiveFlow::Review(session) => review_flow::submit(session, index),
            flow => not_available("submit_answer", flow),
        },
        ClientMessage::Continue => match &mut conn.flow {
            ActiveFlow::Lesson(session) => lesson_flow::advance(session),
            ActiveFlow::Diagnostic(session) => diagnostic_flow::advance(app_state, session).await,
            ActiveFlow::Review(session) => review_flow::advance(session),
            flow => not_available("continue", flow),
        },

        ClientMessage::RetrySubmission => match &mut conn.flow {
            ActiveFlow::Diagnostic(session) => diagnostic_flow::finish(app_state, session).await,
            flow => not_available("retry_submission", flow),
        },
        ClientMessage::RestartReview => {
            if let ActiveFlow::Review(session) = &mut conn.flow {
                return review_flow::restart(app_state, session).await;
            }
            review_flow::start(app_state, conn).await
        }
        ClientMessage::RequestSupport => {
            match &conn.flow {
                ActiveFlow::Lesson(session) => session.request_support(),
                ActiveFlow::Review(session) => session.request_support(),
                ActiveFlow::Diagnostic(session) => {
                    diagnostic_flow::request_support(session, &conn.context.commands)
                }
                flow => return not_available("request_support", flow),
            }
            Vec::new()
        }
        ClientMessage::SyncProgress => {
            let mut ledger = conn.ledger.lock().await;
            // The outcome is carried by the snapshot's sync status.
            let _ = ledger.reconcile(app_state.progress.as_ref()).await;
            vec![progress_updated(&ledger)]
        }
        ClientMessage::LeaveFlow => {
            if let Some(kind) = conn.flow.kind() {
                info!(
                    learner_id = %conn.learner_id,
                    flow = kind.as_str(),
                    "Learner left the flow."
                );
            }
            conn.flow = ActiveFlow::Idle;
            Vec::new()
        }
    }
}

fn not_available(action: &str, flow: &ActiveFlow) -> Vec<ServerMessage> {
    let message = match flow.kind() {
        Some(kind) => format!("'{}' is not available during a {}.", action, kind.as_str()),
        None => format!("'{}' needs an active flow.", action),
    };
    vec![ServerMessage::error(message)]
}

/// Serializes and sends one message on the shared sink.
pub async fn send_message(ws_sender: &WsSender, message: &ServerMessage) -> Result<(), ApiError> {
    let json = serde_json::to_string(message)?;
    ws_sender.lock().await.send(Message::Text(json.into())).await?;
    Ok(())
}

async fn send_all(ws_sender: &WsSender, messages: &[ServerMessage]) -> Result<(), ApiError> {
    for message in messages {
        send_message(ws_sender, message).await?;
    }
    Ok(())
}
