//! crates/learning_engine_core/src/commands.rs
//!
//! The typed channel through which controllers ask their host to act.
//!
//! Controllers never reach into other flows directly. Anything that crosses a
//! flow boundary (opening support chat, paying out a reward, reacting to an
//! empty heart bar) is an `EngineCommand` sent over a `CommandBus`.

use tokio::sync::mpsc;
use tracing::debug;
use uuid::Uuid;

use crate::domain::RewardGrant;

/// Which controller a command originates from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowKind {
    Lesson,
    Diagnostic,
    Review,
}

impl FlowKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FlowKind::Lesson => "lesson",
            FlowKind::Diagnostic => "diagnostic",
            FlowKind::Review => "review",
        }
    }
}

/// The closed set of commands a controller can emit.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineCommand {
    /// The learner asked for help on the current item.
    OpenSupportChat {
        session_id: Uuid,
        flow: FlowKind,
        item_id: Option<String>,
        kc_id: Option<String>,
    },
    /// A lesson finished; pay out its reward.
    GrantReward(RewardGrant),
    /// The learner just lost their last heart.
    HeartsDepleted { session_id: Uuid },
}

pub type CommandReceiver = mpsc::UnboundedReceiver<EngineCommand>;

/// The sending half of the command channel.
#[derive(Debug, Clone)]
pub struct CommandBus {
    tx: mpsc::UnboundedSender<EngineCommand>,
}

impl CommandBus {
    pub fn channel() -> (Self, CommandReceiver) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    /// Sends a command. Commands sent after the host has gone away are dropped.
    pub fn dispatch(&self, command: EngineCommand) {
        if let Err(e) = self.tx.send(command) {
            debug!("Command bus closed; dropping {:?}.", e.0);
        }
    }
}
