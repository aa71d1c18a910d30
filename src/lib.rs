pub mod config;
pub mod flow;
pub mod store;
pub mod util;

pub use config::Config;
pub use flow::{
    is_flow_complete, resume_step, AnswerInput, CleanupScheduler, FlowStep, FlowStorage,
    ProgressRecord, ProgressTracker, QuestionsScore, SCHEMA_VERSION,
};
pub use store::{KeyValueStore, MemoryStore, SqliteStore, StoreError};
