//! Deferred record deletion
//!
//! Completing the flow arms a per-invite-code timer; when it fires, the
//! record is erased only if it is still on the complete step, so a reused
//! invite code is never clobbered. Timers are not persisted: a process
//! restart before one fires leaves removal to the read-time expiry check.

use std::collections::HashMap;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::flow::record::FlowStep;
use crate::flow::storage::FlowStorage;

/// Schedules and cancels deferred deletions, one pending task per invite
/// code. Scheduling again for the same code replaces the pending task.
#[derive(Default)]
pub struct CleanupScheduler {
    tasks: Mutex<HashMap<String, JoinHandle<()>>>,
}

impl CleanupScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arms a deferred deletion for an invite code.
    ///
    /// Outside an async runtime this degrades to a logged no-op; the
    /// read-time expiry check reclaims the record eventually.
    pub fn schedule(&self, storage: FlowStorage, invite_code: &str, delay: Duration) {
        if tokio::runtime::Handle::try_current().is_err() {
            warn!(
                invite_code = %invite_code,
                "No async runtime, skipping deferred cleanup"
            );
            return;
        }

        let code = invite_code.to_string();
        let task_code = code.clone();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            match storage.read(&task_code) {
                Some(record) if record.current_step == FlowStep::Complete => {
                    debug!(invite_code = %task_code, "Erasing completed flow record");
                    storage.erase(&task_code);
                }
                Some(_) => {
                    debug!(invite_code = %task_code, "Record no longer complete, keeping it");
                }
                None => {}
            }
        });

        if let Some(previous) = self.tasks.lock().insert(code, handle) {
            previous.abort();
        }
    }

    /// Aborts the pending deletion for an invite code, if any.
    pub fn cancel(&self, invite_code: &str) {
        if let Some(handle) = self.tasks.lock().remove(invite_code) {
            handle.abort();
        }
    }
}

impl Drop for CleanupScheduler {
    fn drop(&mut self) {
        // Pending deletions do not outlive their tracker
        for (_, handle) in self.tasks.lock().drain() {
            handle.abort();
        }
    }
}
