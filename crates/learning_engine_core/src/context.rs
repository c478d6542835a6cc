//! crates/learning_engine_core/src/context.rs

use uuid::Uuid;

use crate::commands::CommandBus;
use crate::interaction::InteractionLogger;

/// The handles every controller needs from its host.
#[derive(Debug, Clone)]
pub struct SessionContext {
    pub learner_id: Uuid,
    pub logger: InteractionLogger,
    pub commands: CommandBus,
}
