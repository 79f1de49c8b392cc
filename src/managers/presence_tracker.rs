//! Presence Tracker for tabsync.
//!
//! Keeps this tab's heartbeat fresh in the shared store and counts the tabs
//! whose heartbeats are still inside the liveness window. Stale entries are
//! never deleted by other tabs; they simply stop counting.

use std::sync::Arc;

use tracing::debug;

use crate::clock::Clock;
use crate::store::SharedStore;
use crate::types::errors::StoreError;
use crate::types::presence::{HeartbeatEntry, TabId};
use crate::types::settings::SyncSettings;

/// Trait defining the presence tracking interface.
pub trait PresenceTrackerTrait {
    fn refresh_liveness(&self) -> Result<(), StoreError>;
    fn list_live_tabs(&self) -> Result<Vec<HeartbeatEntry>, StoreError>;
    fn release_liveness(&self) -> Result<(), StoreError>;
    fn live_tab_count(&self) -> Result<usize, StoreError>;
}

/// Heartbeat-based presence tracking for one tab.
pub struct PresenceTracker {
    store: Arc<dyn SharedStore>,
    clock: Arc<dyn Clock>,
    tab_id: TabId,
    prefix: String,
    window_ms: i64,
}

impl PresenceTracker {
    pub fn new(
        store: Arc<dyn SharedStore>,
        clock: Arc<dyn Clock>,
        tab_id: TabId,
        settings: &SyncSettings,
    ) -> Self {
        Self {
            store,
            clock,
            tab_id,
            prefix: settings.keys.heartbeat_prefix.clone(),
            window_ms: settings.timing.liveness_window_millis(),
        }
    }

    pub fn tab_id(&self) -> &TabId {
        &self.tab_id
    }

    /// Store key of this tab's heartbeat.
    pub fn heartbeat_key(&self) -> String {
        format!("{}{}", self.prefix, self.tab_id)
    }

    pub fn is_heartbeat_key(&self, key: &str) -> bool {
        key.starts_with(&self.prefix)
    }
}

impl PresenceTrackerTrait for PresenceTracker {
    /// Writes the current timestamp under this tab's heartbeat key.
    fn refresh_liveness(&self) -> Result<(), StoreError> {
        let now = self.clock.now_millis();
        self.store.set(&self.heartbeat_key(), &now.to_string())?;
        debug!(tab_id = %self.tab_id, now, "Heartbeat refreshed");
        Ok(())
    }

    /// Scans the store for heartbeats younger than the liveness window.
    ///
    /// Entries with unparseable timestamps are skipped. Order is unspecified.
    fn list_live_tabs(&self) -> Result<Vec<HeartbeatEntry>, StoreError> {
        let now = self.clock.now_millis();
        let live = self
            .store
            .entries()?
            .into_iter()
            .filter_map(|(key, value)| HeartbeatEntry::parse(&self.prefix, &key, &value))
            .filter(|entry| entry.is_live_at(now, self.window_ms))
            .collect();
        Ok(live)
    }

    /// Removes this tab's heartbeat. Best-effort: if it never runs, the entry ages out.
    fn release_liveness(&self) -> Result<(), StoreError> {
        self.store.remove(&self.heartbeat_key())?;
        debug!(tab_id = %self.tab_id, "Heartbeat released");
        Ok(())
    }

    fn live_tab_count(&self) -> Result<usize, StoreError> {
        Ok(self.list_live_tabs()?.len())
    }
}
