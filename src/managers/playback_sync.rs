//! Playback Synchronizer for tabsync.
//!
//! Publishes local play/pause transitions to the global pause flag while two
//! or more tabs are live, and applies the flag to the local video when it
//! diverges. Local transitions, periodic ticks and store notifications all
//! funnel into [`PlaybackSynchronizer::sync_playback`].

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::managers::presence_tracker::{PresenceTracker, PresenceTrackerTrait};
use crate::player::{Page, VideoElement};
use crate::store::{SharedStore, StoreChange};
use crate::types::errors::StoreError;
use crate::types::playback::{PlaybackState, SyncOutcome};
use crate::types::settings::SyncSettings;

/// Keeps one tab's video consistent with the global pause flag.
pub struct PlaybackSynchronizer {
    store: Arc<dyn SharedStore>,
    presence: PresenceTracker,
    pause_key: String,
}

impl PlaybackSynchronizer {
    pub fn new(store: Arc<dyn SharedStore>, presence: PresenceTracker, settings: &SyncSettings) -> Self {
        Self {
            store,
            presence,
            pause_key: settings.keys.pause_key.clone(),
        }
    }

    pub fn presence(&self) -> &PresenceTracker {
        &self.presence
    }

    pub fn pause_key(&self) -> &str {
        &self.pause_key
    }

    /// Reads the global pause flag. Only the exact string `"true"` means paused.
    pub fn read_global_pause_flag(&self) -> Result<bool, StoreError> {
        Ok(self.store.get(&self.pause_key)?.as_deref() == Some("true"))
    }

    /// Brings the local video in line with the global flag.
    ///
    /// Does nothing without a video or with fewer than two live tabs. The
    /// state comparison guards against commanding a video into the state it
    /// is already in: a commanded pause fires the same event as a user pause,
    /// so a redundant command would echo back through `on_local_transition`.
    pub fn sync_playback<P: Page>(&self, page: &P) -> SyncOutcome {
        let Some(video) = page.video() else {
            return SyncOutcome::NoVideo;
        };

        let live = match self.presence.live_tab_count() {
            Ok(n) => n,
            Err(e) => {
                warn!("Sync skipped, live tabs unavailable: {}", e);
                return SyncOutcome::StoreUnavailable;
            }
        };
        if live <= 1 {
            return SyncOutcome::SingleTab;
        }

        let desired_paused = match self.read_global_pause_flag() {
            Ok(paused) => paused,
            Err(e) => {
                warn!("Sync skipped, pause flag unavailable: {}", e);
                return SyncOutcome::StoreUnavailable;
            }
        };

        if video.is_paused() == desired_paused {
            return SyncOutcome::InSync;
        }
        if desired_paused {
            video.pause();
            info!(live_tabs = live, "Paused video to match global state");
            SyncOutcome::Paused
        } else {
            video.play();
            info!(live_tabs = live, "Played video to match global state");
            SyncOutcome::Played
        }
    }

    /// Publishes a local transition to the global flag when multiple tabs are live.
    ///
    /// Returns whether the flag was written.
    pub fn on_local_transition(&self, state: PlaybackState) -> Result<bool, StoreError> {
        if self.presence.live_tab_count()? <= 1 {
            return Ok(false);
        }
        self.store.set(&self.pause_key, state.as_flag())?;
        debug!(?state, "Published local playback state");
        Ok(true)
    }

    /// Notifications that can change the outcome of a sync: the flag itself or any heartbeat.
    pub fn is_relevant_key(&self, key: &str) -> bool {
        key == self.pause_key || self.presence.is_heartbeat_key(key)
    }

    /// Runs a sync for relevant notifications; `None` when the change was filtered out.
    pub fn on_store_change<P: Page>(&self, change: &StoreChange, page: &P) -> Option<SyncOutcome> {
        if !self.is_relevant_key(&change.key) {
            debug!(key = %change.key, "Ignoring unrelated store change");
            return None;
        }
        Some(self.sync_playback(page))
    }
}
