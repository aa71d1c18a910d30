//! Flow progress mutators
//!
//! Every mutator takes the caller's current record and returns the new
//! canonical one, persisting it as a side effect. The persistence layer
//! stays dumb on purpose: `set_step` records whatever the caller decided,
//! and the legality of step transitions lives with the flow UI.

use std::time::Duration;

use tracing::debug;

use crate::config::Config;
use crate::flow::cleanup::CleanupScheduler;
use crate::flow::record::{
    AnsweredQuestion, EducationState, FlowStep, LastError, ProgressRecord, QuestionsScore,
    SocialEntry, SocialVerification,
};
use crate::flow::storage::FlowStorage;
use crate::util::time::now_millis;

/// A quiz answer as reported by the education step.
#[derive(Debug, Clone)]
pub struct AnswerInput {
    pub block_id: String,
    pub question_text: String,
    pub selected_answer: String,
    pub correct_answer: String,
    pub is_correct: bool,
}

/// Mutation surface for persisted flow progress.
pub struct ProgressTracker {
    storage: FlowStorage,
    cleanup: CleanupScheduler,
    cleanup_delay: Duration,
}

impl ProgressTracker {
    pub fn new(storage: FlowStorage, cleanup_delay: Duration) -> Self {
        Self {
            storage,
            cleanup: CleanupScheduler::new(),
            cleanup_delay,
        }
    }

    /// Tracker over the default on-disk storage.
    pub fn with_config(config: &Config) -> Self {
        Self::new(FlowStorage::open(config), config.cleanup_delay)
    }

    pub fn storage(&self) -> &FlowStorage {
        &self.storage
    }

    /// Loads the validated record for an invite code.
    pub fn load(&self, invite_code: &str) -> Option<ProgressRecord> {
        self.storage.read(invite_code)
    }

    fn persist(&self, mut record: ProgressRecord) -> ProgressRecord {
        self.storage.write(&mut record);
        record
    }

    /// Starts a fresh flow for an invite code at the welcome step.
    pub fn initialize(&self, invite_code: &str, is_permanent: bool) -> ProgressRecord {
        self.persist(ProgressRecord::new(invite_code, is_permanent))
    }

    /// Replaces education progress with an empty sub-state. Callers only
    /// reach for this when `education_state` is absent; calling it on a
    /// populated record discards that progress.
    pub fn initialize_education_state(&self, record: &ProgressRecord) -> ProgressRecord {
        let mut next = record.clone();
        next.education_state = Some(EducationState::default());
        self.persist(next)
    }

    /// Marks the intro video watched. Safe to call repeatedly; repeat
    /// calls only refresh the timestamp.
    pub fn intro_video_completed(&self, record: &ProgressRecord) -> ProgressRecord {
        let mut next = record.clone();
        next.education_state_mut().intro_video_completed = true;
        self.persist(next)
    }

    /// Marks the outro video watched. Same idempotence as the intro flag.
    pub fn outro_video_completed(&self, record: &ProgressRecord) -> ProgressRecord {
        let mut next = record.clone();
        next.education_state_mut().outro_video_completed = true;
        self.persist(next)
    }

    /// Advances the education block cursor.
    ///
    /// TODO: product call on whether advancing past a block should record
    /// `block_id` in `completed_blocks`; today only an answered question
    /// marks a block completed.
    pub fn education_block(
        &self,
        record: &ProgressRecord,
        block_index: u32,
        _block_id: &str,
    ) -> ProgressRecord {
        let mut next = record.clone();
        next.education_state_mut().current_block_index = block_index;
        self.persist(next)
    }

    /// Records a quiz answer. A second answer for the same block id is
    /// rejected: the original record comes back untouched, with no
    /// re-persist and no timestamp bump. Accepted answers recompute the
    /// score from the full answered sequence.
    pub fn question_answered(
        &self,
        record: &ProgressRecord,
        answer: AnswerInput,
    ) -> ProgressRecord {
        if let Some(education) = &record.education_state {
            if education
                .questions_answered
                .iter()
                .any(|q| q.block_id == answer.block_id)
            {
                debug!(
                    invite_code = %record.invite_code,
                    block_id = %answer.block_id,
                    "Duplicate answer rejected"
                );
                return record.clone();
            }
        }

        let AnswerInput {
            block_id,
            question_text,
            selected_answer,
            correct_answer,
            is_correct,
        } = answer;

        let mut next = record.clone();
        let education = next.education_state_mut();
        education.questions_answered.push(AnsweredQuestion {
            block_id: block_id.clone(),
            question_text,
            selected_answer,
            correct_answer,
            is_correct,
            answered_at: now_millis(),
        });
        if !education.completed_blocks.contains(&block_id) {
            education.completed_blocks.push(block_id);
        }
        let correct = education
            .questions_answered
            .iter()
            .filter(|q| q.is_correct)
            .count() as u32;
        let total = education.questions_answered.len() as u32;
        next.questions_score = QuestionsScore { correct, total };
        self.persist(next)
    }

    /// Overwrites the current step. No transition validation here: the
    /// flow UI owns which transitions are legal.
    pub fn set_step(&self, record: &ProgressRecord, step: FlowStep) -> ProgressRecord {
        let mut next = record.clone();
        next.current_step = step;
        self.persist(next)
    }

    /// Marks the password gate passed and advances straight to education.
    /// The one mutator that records a fact and moves the step atomically.
    pub fn password_validated(&self, record: &ProgressRecord) -> ProgressRecord {
        let mut next = record.clone();
        next.password_validated = true;
        next.current_step = FlowStep::Education;
        self.persist(next)
    }

    /// Marks education finished with the score the caller reports and
    /// advances to the connect step. The supplied score is taken as-is;
    /// it is not reconciled against the answered-question aggregate.
    pub fn education_completed(
        &self,
        record: &ProgressRecord,
        score: QuestionsScore,
    ) -> ProgressRecord {
        let mut next = record.clone();
        next.education_completed = true;
        next.questions_score = score;
        next.current_step = FlowStep::Connect;
        self.persist(next)
    }

    pub fn email_verified(&self, record: &ProgressRecord, email: &str) -> ProgressRecord {
        let mut next = record.clone();
        next.verified_email = Some(email.to_string());
        self.persist(next)
    }

    pub fn calendar_booked(&self, record: &ProgressRecord) -> ProgressRecord {
        let mut next = record.clone();
        next.calendar_booked = true;
        self.persist(next)
    }

    pub fn selected_path(&self, record: &ProgressRecord, path: &str) -> ProgressRecord {
        let mut next = record.clone();
        next.selected_path = Some(path.to_string());
        self.persist(next)
    }

    pub fn wallet_connected(&self, record: &ProgressRecord, address: &str) -> ProgressRecord {
        let mut next = record.clone();
        next.wallet_address = Some(address.to_string());
        self.persist(next)
    }

    /// Marks the Twitter account verified, replacing any earlier entry.
    pub fn twitter_verified(
        &self,
        record: &ProgressRecord,
        username: Option<String>,
        user_id: Option<String>,
    ) -> ProgressRecord {
        let mut next = record.clone();
        next.social_verification
            .get_or_insert_with(SocialVerification::default)
            .twitter = verified_entry(username, user_id);
        self.persist(next)
    }

    /// Marks the Discord account verified, replacing any earlier entry.
    pub fn discord_verified(
        &self,
        record: &ProgressRecord,
        username: Option<String>,
        user_id: Option<String>,
    ) -> ProgressRecord {
        let mut next = record.clone();
        next.social_verification
            .get_or_insert_with(SocialVerification::default)
            .discord = verified_entry(username, user_id);
        self.persist(next)
    }

    /// Records a claim attempt. A successful claim advances to the
    /// delegate step; a failed one leaves the step where it was.
    pub fn claim_attempted(&self, record: &ProgressRecord, successful: bool) -> ProgressRecord {
        let mut next = record.clone();
        next.claim_attempted = true;
        next.claim_successful = successful;
        if successful {
            next.current_step = FlowStep::Delegate;
        }
        self.persist(next)
    }

    /// Marks the flow complete and arms the deferred deletion: after the
    /// configured delay the record is erased, but only if it is still on
    /// the complete step at that point.
    pub fn mark_completed(&self, record: &ProgressRecord) -> ProgressRecord {
        let mut next = record.clone();
        next.current_step = FlowStep::Complete;
        next.completed_at = Some(now_millis());
        let next = self.persist(next);
        self.cleanup
            .schedule(self.storage.clone(), &next.invite_code, self.cleanup_delay);
        next
    }

    /// Cancels a pending deferred deletion for an invite code, if any.
    pub fn cancel_cleanup(&self, invite_code: &str) {
        self.cleanup.cancel(invite_code);
    }

    /// Records a diagnostic error breadcrumb. Never consulted by the
    /// resume resolver and never blocks later mutations.
    pub fn record_error(
        &self,
        record: &ProgressRecord,
        step: &str,
        message: &str,
    ) -> ProgressRecord {
        let mut next = record.clone();
        next.last_error = Some(LastError {
            step: step.to_string(),
            message: message.to_string(),
            timestamp: now_millis(),
        });
        self.persist(next)
    }
}

fn verified_entry(username: Option<String>, user_id: Option<String>) -> SocialEntry {
    SocialEntry {
        verified: true,
        username,
        user_id,
        verified_at: Some(now_millis()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use std::sync::Arc;

    fn tracker() -> ProgressTracker {
        let storage = FlowStorage::new(
            Arc::new(MemoryStore::new()),
            Arc::new(MemoryStore::new()),
            Duration::from_secs(30 * 24 * 60 * 60),
        );
        ProgressTracker::new(storage, Duration::from_secs(3600))
    }

    #[test]
    fn test_initialize_starts_at_welcome() {
        let tracker = tracker();
        let record = tracker.initialize("abc", true);

        assert_eq!(record.current_step, FlowStep::Welcome);
        assert!(record.is_permanent);
        assert!(record.education_state.is_none());
        assert_eq!(tracker.load("abc").unwrap().invite_code, "abc");
    }

    #[test]
    fn test_education_state_created_lazily() {
        let tracker = tracker();
        let record = tracker.initialize("abc", false);

        let record = tracker.intro_video_completed(&record);
        let education = record.education_state.as_ref().unwrap();
        assert!(education.intro_video_completed);
        assert!(!education.outro_video_completed);
        assert_eq!(education.current_block_index, 0);
    }

    #[test]
    fn test_password_validated_advances_to_education() {
        let tracker = tracker();
        let record = tracker.initialize("abc", false);

        let record = tracker.password_validated(&record);
        assert!(record.password_validated);
        assert_eq!(record.current_step, FlowStep::Education);
    }

    #[test]
    fn test_education_block_does_not_touch_completed_blocks() {
        let tracker = tracker();
        let record = tracker.initialize("abc", false);

        let record = tracker.education_block(&record, 2, "b2");
        let education = record.education_state.as_ref().unwrap();
        assert_eq!(education.current_block_index, 2);
        assert!(education.completed_blocks.is_empty());
    }

    #[test]
    fn test_social_reverification_replaces_entry() {
        let tracker = tracker();
        let record = tracker.initialize("abc", false);

        let record =
            tracker.twitter_verified(&record, Some("old".to_string()), Some("1".to_string()));
        let record =
            tracker.twitter_verified(&record, Some("new".to_string()), Some("2".to_string()));

        let social = record.social_verification.as_ref().unwrap();
        assert!(social.twitter.verified);
        assert_eq!(social.twitter.username.as_deref(), Some("new"));
        assert_eq!(social.twitter.user_id.as_deref(), Some("2"));
        assert!(!social.discord.verified);
    }
}
