//! Progress record model
//!
//! The persisted snapshot of one user's progress through the invite flow,
//! plus the predicates that decide whether a stored record is still
//! usable. Serde renames keep the persisted JSON camelCased, so records
//! written by earlier deployments of the flow stay readable.

use serde::{Deserialize, Serialize};

use crate::util::time::now_millis;

/// Persisted schema version. Bumping this invalidates every stored record.
pub const SCHEMA_VERSION: u32 = 3;

/// One discrete stage of the guided onboarding flow.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FlowStep {
    Welcome,
    Password,
    Education,
    Connect,
    Delegate,
    Complete,
}

impl FlowStep {
    pub fn as_str(&self) -> &'static str {
        match self {
            FlowStep::Welcome => "welcome",
            FlowStep::Password => "password",
            FlowStep::Education => "education",
            FlowStep::Connect => "connect",
            FlowStep::Delegate => "delegate",
            FlowStep::Complete => "complete",
        }
    }
}

/// Aggregate quiz score. Recomputed from the answered questions after
/// every accepted answer; `education_completed` may later overwrite it
/// with the caller-reported aggregate.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct QuestionsScore {
    pub correct: u32,
    pub total: u32,
}

/// One recorded quiz answer. At most one per block id.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AnsweredQuestion {
    pub block_id: String,
    pub question_text: String,
    pub selected_answer: String,
    pub correct_answer: String,
    pub is_correct: bool,
    /// When the answer was recorded (milliseconds since epoch)
    pub answered_at: i64,
}

/// Nested education progress. Created lazily on the first
/// education-related mutation, never pre-allocated.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EducationState {
    pub current_block_index: u32,
    pub intro_video_completed: bool,
    pub outro_video_completed: bool,
    /// De-duplicated block ids; insertion order carries no meaning
    pub completed_blocks: Vec<String>,
    pub questions_answered: Vec<AnsweredQuestion>,
}

/// Verification state for one social platform.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SocialEntry {
    pub verified: bool,
    pub username: Option<String>,
    pub user_id: Option<String>,
    pub verified_at: Option<i64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SocialVerification {
    pub twitter: SocialEntry,
    pub discord: SocialEntry,
}

/// Diagnostic error breadcrumb. Never drives control flow.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LastError {
    pub step: String,
    pub message: String,
    pub timestamp: i64,
}

/// Snapshot of one user's progress through the invite flow, keyed by
/// invite code.
///
/// Mutated only through [`crate::flow::ProgressTracker`]; read back
/// through [`crate::flow::FlowStorage`], which erases records that fail
/// the [`ProgressRecord::invalidation`] predicates.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProgressRecord {
    pub version: u32,
    pub invite_code: String,
    pub is_permanent: bool,
    pub current_step: FlowStep,
    pub password_validated: bool,
    pub education_completed: bool,
    pub questions_score: QuestionsScore,
    pub education_state: Option<EducationState>,
    pub selected_path: Option<String>,
    pub verified_email: Option<String>,
    pub calendar_booked: bool,
    pub social_verification: Option<SocialVerification>,
    pub wallet_address: Option<String>,
    pub claim_attempted: bool,
    pub claim_successful: bool,
    pub started_at: i64,
    pub last_updated_at: i64,
    pub completed_at: Option<i64>,
    pub last_error: Option<LastError>,
}

impl ProgressRecord {
    /// Fresh record at the welcome step.
    pub fn new(invite_code: impl Into<String>, is_permanent: bool) -> Self {
        let now = now_millis();
        Self {
            version: SCHEMA_VERSION,
            invite_code: invite_code.into(),
            is_permanent,
            current_step: FlowStep::Welcome,
            password_validated: false,
            education_completed: false,
            questions_score: QuestionsScore::default(),
            education_state: None,
            selected_path: None,
            verified_email: None,
            calendar_booked: false,
            social_verification: None,
            wallet_address: None,
            claim_attempted: false,
            claim_successful: false,
            started_at: now,
            last_updated_at: now,
            completed_at: None,
            last_error: None,
        }
    }

    /// Education sub-state, created on first use.
    pub fn education_state_mut(&mut self) -> &mut EducationState {
        self.education_state.get_or_insert_with(EducationState::default)
    }

    /// Applies the read-time invalidation predicates: schema version,
    /// then expiry, then identity. The order is part of the contract —
    /// a version mismatch always wins over a stale-but-matching record.
    pub fn invalidation(
        &self,
        requested_code: &str,
        ttl_millis: i64,
        now: i64,
    ) -> Option<InvalidationReason> {
        if self.version != SCHEMA_VERSION {
            return Some(InvalidationReason::VersionMismatch);
        }
        if now > self.started_at + ttl_millis {
            return Some(InvalidationReason::Expired);
        }
        if self.invite_code != requested_code {
            return Some(InvalidationReason::InviteCodeMismatch);
        }
        None
    }
}

/// Why a stored record was treated as absent on read. Surfaced through
/// logging only; callers just see the record as missing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvalidationReason {
    VersionMismatch,
    Expired,
    InviteCodeMismatch,
}

impl InvalidationReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            InvalidationReason::VersionMismatch => "version mismatch",
            InvalidationReason::Expired => "expired",
            InvalidationReason::InviteCodeMismatch => "invite code mismatch",
        }
    }
}
