//! Resume resolution
//!
//! Decides which step a returning user lands on. The rules are evaluated
//! top to bottom and the first match wins; that ordering is the core
//! contract of the module. A successful claim or completed education
//! always outranks the literal stored step, which heals stale or partial
//! writes, and a user still sitting on the welcome step is never
//! auto-advanced, even when no password gate exists.

use crate::flow::record::{FlowStep, ProgressRecord};

/// The step a returning user should land on.
pub fn resume_step(record: &ProgressRecord, has_password_gate: bool) -> FlowStep {
    if record.current_step == FlowStep::Complete {
        return FlowStep::Complete;
    }
    if record.claim_successful {
        return FlowStep::Delegate;
    }
    if record.education_completed {
        return FlowStep::Connect;
    }
    if record.current_step == FlowStep::Welcome {
        return FlowStep::Welcome;
    }
    if record.password_validated || !has_password_gate {
        return FlowStep::Education;
    }
    if has_password_gate {
        return FlowStep::Password;
    }
    record.current_step
}

/// True only for a record sitting on the terminal complete step.
pub fn is_flow_complete(record: Option<&ProgressRecord>) -> bool {
    record.map_or(false, |r| r.current_step == FlowStep::Complete)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> ProgressRecord {
        ProgressRecord::new("abc", false)
    }

    #[test]
    fn test_complete_step_wins_over_everything() {
        let mut r = record();
        r.current_step = FlowStep::Complete;
        r.claim_successful = true;
        r.education_completed = true;

        assert_eq!(resume_step(&r, true), FlowStep::Complete);
    }

    #[test]
    fn test_successful_claim_outranks_stored_step() {
        let mut r = record();
        r.current_step = FlowStep::Password;
        r.claim_successful = true;
        r.education_completed = false;

        assert_eq!(resume_step(&r, true), FlowStep::Delegate);
    }

    #[test]
    fn test_completed_education_outranks_stored_step() {
        let mut r = record();
        r.current_step = FlowStep::Password;
        r.education_completed = true;

        assert_eq!(resume_step(&r, true), FlowStep::Connect);
    }

    #[test]
    fn test_welcome_is_never_auto_advanced() {
        let r = record();
        assert_eq!(r.current_step, FlowStep::Welcome);

        assert_eq!(resume_step(&r, false), FlowStep::Welcome);
        assert_eq!(resume_step(&r, true), FlowStep::Welcome);
    }

    #[test]
    fn test_validated_password_resumes_education() {
        let mut r = record();
        r.current_step = FlowStep::Password;
        r.password_validated = true;

        assert_eq!(resume_step(&r, true), FlowStep::Education);
    }

    #[test]
    fn test_no_gate_skips_password_mid_flow() {
        let mut r = record();
        r.current_step = FlowStep::Password;

        assert_eq!(resume_step(&r, false), FlowStep::Education);
    }

    #[test]
    fn test_gate_sends_unvalidated_user_to_password() {
        let mut r = record();
        r.current_step = FlowStep::Connect;
        r.password_validated = false;

        assert_eq!(resume_step(&r, true), FlowStep::Password);
    }

    #[test]
    fn test_is_flow_complete_null_safe() {
        assert!(!is_flow_complete(None));

        let mut r = record();
        assert!(!is_flow_complete(Some(&r)));
        r.current_step = FlowStep::Complete;
        assert!(is_flow_complete(Some(&r)));
    }
}
