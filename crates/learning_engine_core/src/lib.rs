pub mod commands;
pub mod context;
pub mod diagnostic;
pub mod domain;
pub mod error;
pub mod evaluator;
pub mod interaction;
pub mod lesson;
pub mod ports;
pub mod progress;
pub mod remedial;
pub mod review;
pub mod streak;
pub mod vitality;

pub use commands::{CommandBus, CommandReceiver, EngineCommand, FlowKind};
pub use context::SessionContext;
pub use diagnostic::{DiagnosticEvent, DiagnosticFeedback, DiagnosticPhase, DiagnosticSession};
pub use domain::{
    ContentOrigin, ContentStep, DiagnosticBatch, DiagnosticItem, DiagnosticReport,
    DiagnosticResult, DiagnosticTest, DomainScore, InputMode, InteractionRecord, LearnerProgress,
    LessonItem, QueueStats, QuizStep, Recommendation, ReviewItem, ReviewQueue, ReviewReason,
    Reward, RewardGrant, Step, StepKind,
};
pub use error::{EngineError, EngineResult};
pub use evaluator::{evaluate, Verdict};
pub use interaction::InteractionLogger;
pub use lesson::{
    LessonConfig, LessonEvent, LessonFeedback, LessonPhase, LessonSession, LessonSummary,
};
pub use ports::{
    DiagnosticService, InteractionLogService, LessonService, PortError, PortResult,
    ProgressService, ReviewService,
};
pub use progress::{ProgressLedger, ProgressSnapshot, SyncStatus};
pub use review::{ReviewEvent, ReviewFeedback, ReviewPhase, ReviewSession, ReviewSummary};
