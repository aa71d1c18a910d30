//! Dual-store persistence adapter
//!
//! Composes a durable store with a session-scoped backup. Writes go to
//! both; reads prefer the durable store and fall back to the backup.
//! Every failure mode degrades to "operation had no effect": callers
//! never see an error, they see an absent record, and the reason lands
//! in the log.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use crate::config::Config;
use crate::flow::record::{ProgressRecord, SCHEMA_VERSION};
use crate::store::{KeyValueStore, MemoryStore, SqliteStore};
use crate::util::paths::database_path;
use crate::util::time::now_millis;

/// Namespace prefix for all persisted flow records.
const KEY_PREFIX: &str = "invite_flow_progress_";

/// Storage adapter over a durable store and a session-scoped backup.
#[derive(Clone)]
pub struct FlowStorage {
    stores: Option<Arc<StorePair>>,
    record_ttl: Duration,
}

struct StorePair {
    durable: Arc<dyn KeyValueStore>,
    session: Arc<dyn KeyValueStore>,
}

impl FlowStorage {
    /// Adapter over an explicit store pair. Used by embedders and tests;
    /// production code goes through [`FlowStorage::open`].
    pub fn new(
        durable: Arc<dyn KeyValueStore>,
        session: Arc<dyn KeyValueStore>,
        record_ttl: Duration,
    ) -> Self {
        Self {
            stores: Some(Arc::new(StorePair { durable, session })),
            record_ttl,
        }
    }

    /// Adapter with no backing stores; every operation is a no-op.
    pub fn unavailable(record_ttl: Duration) -> Self {
        Self {
            stores: None,
            record_ttl,
        }
    }

    /// Default setup: SQLite under the data directory plus an in-memory
    /// backup. Degrades to an unavailable adapter if the database cannot
    /// be opened; callers then start every flow fresh.
    pub fn open(config: &Config) -> Self {
        match SqliteStore::open(database_path()) {
            Ok(durable) => Self::new(
                Arc::new(durable),
                Arc::new(MemoryStore::new()),
                config.record_ttl,
            ),
            Err(e) => {
                warn!(error = %e, "Flow storage unavailable, persistence disabled");
                Self::unavailable(config.record_ttl)
            }
        }
    }

    /// True only when both backing stores are present.
    pub fn is_available(&self) -> bool {
        self.stores.is_some()
    }

    /// Deterministic namespaced key for an invite code.
    pub fn key_for(invite_code: &str) -> String {
        format!("{KEY_PREFIX}{invite_code}")
    }

    /// Stamps the schema version and `last_updated_at`, serializes, and
    /// writes the record to both stores. Returns whether every write
    /// landed; failures are logged, never raised.
    pub fn write(&self, record: &mut ProgressRecord) -> bool {
        let Some(stores) = &self.stores else {
            return false;
        };

        record.version = SCHEMA_VERSION;
        record.last_updated_at = now_millis();

        let json = match serde_json::to_string(record) {
            Ok(json) => json,
            Err(e) => {
                warn!(
                    invite_code = %record.invite_code,
                    error = %e,
                    "Failed to serialize progress record"
                );
                return false;
            }
        };

        let key = Self::key_for(&record.invite_code);
        let mut ok = true;
        if let Err(e) = stores.durable.set(&key, &json) {
            warn!(key = %key, error = %e, "Durable store write failed");
            ok = false;
        }
        if let Err(e) = stores.session.set(&key, &json) {
            warn!(key = %key, error = %e, "Session store write failed");
            ok = false;
        }
        ok
    }

    /// Reads and validates the record for an invite code.
    ///
    /// Corrupt payloads read as absent. Records failing validation
    /// (schema version, expiry, or stored under a mismatched code) are
    /// erased from both stores and read as absent.
    pub fn read(&self, invite_code: &str) -> Option<ProgressRecord> {
        let stores = self.stores.as_ref()?;
        let key = Self::key_for(invite_code);

        let json = match stores.durable.get(&key) {
            Ok(Some(json)) => Some(json),
            Ok(None) => self.read_session(stores, &key),
            Err(e) => {
                warn!(key = %key, error = %e, "Durable store read failed");
                self.read_session(stores, &key)
            }
        }?;

        let record: ProgressRecord = match serde_json::from_str(&json) {
            Ok(record) => record,
            Err(e) => {
                warn!(key = %key, error = %e, "Corrupt progress record, treating as absent");
                return None;
            }
        };

        let ttl = self.record_ttl.as_millis() as i64;
        if let Some(reason) = record.invalidation(invite_code, ttl, now_millis()) {
            debug!(
                invite_code = %invite_code,
                reason = reason.as_str(),
                "Stored record invalidated"
            );
            self.erase(invite_code);
            return None;
        }

        Some(record)
    }

    fn read_session(&self, stores: &StorePair, key: &str) -> Option<String> {
        match stores.session.get(key) {
            Ok(found) => found,
            Err(e) => {
                warn!(key = %key, error = %e, "Session store read failed");
                None
            }
        }
    }

    /// Removes the record for an invite code from both stores. Idempotent.
    pub fn erase(&self, invite_code: &str) {
        let Some(stores) = &self.stores else {
            return;
        };
        let key = Self::key_for(invite_code);
        if let Err(e) = stores.durable.remove(&key) {
            warn!(key = %key, error = %e, "Durable store remove failed");
        }
        if let Err(e) = stores.session.remove(&key) {
            warn!(key = %key, error = %e, "Session store remove failed");
        }
    }

    /// Removes every record under the namespace prefix from both stores.
    /// Diagnostics/reset utility, not part of the per-user lifecycle.
    /// Returns how many keys were removed.
    pub fn erase_all(&self) -> usize {
        let Some(stores) = &self.stores else {
            return 0;
        };
        let keys = match stores.durable.keys_with_prefix(KEY_PREFIX) {
            Ok(keys) => keys,
            Err(e) => {
                warn!(error = %e, "Failed to enumerate stored records");
                return 0;
            }
        };
        for key in &keys {
            if let Err(e) = stores.durable.remove(key) {
                warn!(key = %key, error = %e, "Durable store remove failed");
            }
            if let Err(e) = stores.session.remove(key) {
                warn!(key = %key, error = %e, "Session store remove failed");
            }
        }
        keys.len()
    }

    /// Every valid record under the namespace. Records failing validation
    /// are erased as a side effect, exactly as a direct read would.
    pub fn records(&self) -> Vec<ProgressRecord> {
        let Some(stores) = &self.stores else {
            return Vec::new();
        };
        let keys = match stores.durable.keys_with_prefix(KEY_PREFIX) {
            Ok(keys) => keys,
            Err(e) => {
                warn!(error = %e, "Failed to enumerate stored records");
                return Vec::new();
            }
        };
        keys.iter()
            .filter_map(|key| key.strip_prefix(KEY_PREFIX))
            .filter_map(|code| self.read(code))
            .collect()
    }
}
