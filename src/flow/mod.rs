//! Invite flow persistence core
//!
//! Persists a user's progress through the multi-step invite flow and
//! decides where a returning user resumes. The UI calls the mutators on
//! [`ProgressTracker`], holds the returned record as the canonical state,
//! and routes with [`resume_step`] after each load.

mod cleanup;
mod progress;
mod record;
mod resume;
mod storage;

pub use cleanup::CleanupScheduler;
pub use progress::{AnswerInput, ProgressTracker};
pub use record::{
    AnsweredQuestion, EducationState, FlowStep, InvalidationReason, LastError, ProgressRecord,
    QuestionsScore, SocialEntry, SocialVerification, SCHEMA_VERSION,
};
pub use resume::{is_flow_complete, resume_step};
pub use storage::FlowStorage;
