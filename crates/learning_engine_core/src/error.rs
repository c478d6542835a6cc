//! crates/learning_engine_core/src/error.rs
//!
//! Errors raised by the session controllers.

use crate::ports::PortError;

/// The error type for controller operations.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EngineError {
    /// The action is not accepted in the controller's current phase.
    #[error("cannot {action} while {phase}")]
    InvalidTransition {
        action: &'static str,
        phase: &'static str,
    },

    #[error("no choice has been selected")]
    NoChoiceSelected,

    #[error("choice {index} is out of range for {choices} choices")]
    ChoiceOutOfRange { index: usize, choices: usize },

    #[error("the lesson has no items")]
    EmptyLesson,

    #[error("the diagnostic has no items")]
    EmptyDiagnostic,

    /// An error that propagated up from one of the backend ports.
    #[error("Service Port Error: {0}")]
    Port(#[from] PortError),
}

/// A convenience type alias for `Result<T, EngineError>`.
pub type EngineResult<T> = Result<T, EngineError>;
