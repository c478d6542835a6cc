//! services/gateway/src/web/lesson_flow.rs
//!
//! Drives a `LessonSession` on behalf of a connection and turns its events into
//! protocol messages.

use learning_engine_core::{
    EngineError, EngineResult, FlowKind, InputMode, LessonEvent, LessonSession, StepKind,
};
use tracing::{info, warn};

use crate::web::protocol::{LessonFeedbackView, LessonSummaryView, ServerMessage, StepView};
use crate::web::state::{ActiveFlow, AppState, ConnectionState};

pub async fn start(
    app: &AppState,
    conn: &mut ConnectionState,
    lesson_id: &str,
) -> Vec<ServerMessage> {
    let started = LessonSession::start(
        app.lessons.as_ref(),
        conn.context.clone(),
        lesson_id,
        app.config.lesson,
    )
    .await;

    match started {
        Ok(session) => {
            info!(
                learner_id = %conn.learner_id,
                session_id = %session.session_id(),
                lesson_id,
                "Lesson session started."
            );
            let mut out = vec![ServerMessage::LessonStarted {
                session_id: session.session_id(),
                lesson_id: session.lesson_id().to_string(),
                total_steps: session.step_count(),
                hearts: session.hearts(),
                max_hearts: session.max_hearts(),
            }];
            out.extend(present_step(&session));
            conn.flow = ActiveFlow::Lesson(session);
            out
        }
        Err(EngineError::EmptyLesson) => {
            warn!(lesson_id, "Lesson has no items.");
            vec![ServerMessage::load_failed(
                FlowKind::Lesson,
                "This lesson has no items yet.",
                false,
            )]
        }
        Err(e) => {
            warn!(lesson_id, "Failed to load lesson: {}", e);
            vec![ServerMessage::load_failed(FlowKind::Lesson, e.to_string(), true)]
        }
    }
}

pub fn select(
    session: &mut LessonSession,
    index: usize,
    input_mode: InputMode,
) -> Vec<ServerMessage> {
    if session.select_choice_with(index, input_mode) {
        vec![ServerMessage::ChoiceSelected { index }]
    } else {
        Vec::new()
    }
}

pub fn use_hint(session: &mut LessonSession) -> Vec<ServerMessage> {
    session.note_hint_used();
    Vec::new()
}

pub fn check(session: &mut LessonSession) -> Vec<ServerMessage> {
    let result = session.check();
    render(session, result)
}

/// Selects and checks in one step. An index outside the choices is rejected.
pub fn submit(session: &mut LessonSession, index: usize) -> Vec<ServerMessage> {
    let result = session.submit_answer(index, InputMode::Choice);
    let mut out = Vec::new();
    if matches!(&result, Ok(LessonEvent::Checked(f)) if f.step_kind == StepKind::Quiz) {
        out.push(ServerMessage::ChoiceSelected { index });
    }
    out.extend(render(session, result));
    out
}

pub fn advance(session: &mut LessonSession) -> Vec<ServerMessage> {
    let result = session.advance();
    render(session, result)
}

fn render(session: &LessonSession, result: EngineResult<LessonEvent>) -> Vec<ServerMessage> {
    let event = match result {
        Ok(event) => event,
        Err(e) => return vec![ServerMessage::error(e.to_string())],
    };
    match event {
        LessonEvent::Ignored | LessonEvent::HintNoted => Vec::new(),
        LessonEvent::ChoiceSelected { index } => vec![ServerMessage::ChoiceSelected { index }],
        LessonEvent::Checked(feedback) => vec![ServerMessage::AnswerChecked {
            feedback: LessonFeedbackView::from(&feedback),
        }],
        LessonEvent::StepPresented { .. } => present_step(session).into_iter().collect(),
        LessonEvent::MilestoneShown { streak } => vec![ServerMessage::StreakMilestone { streak }],
        LessonEvent::Completed(summary) => vec![ServerMessage::LessonCompleted {
            summary: LessonSummaryView::from(&summary),
        }],
    }
}

fn present_step(session: &LessonSession) -> Option<ServerMessage> {
    let step = session.current_step()?;
    Some(ServerMessage::StepPresented {
        index: session.current_index(),
        total_steps: session.step_count(),
        progress_percent: session.progress_percent(),
        step: StepView::from(step),
    })
}
