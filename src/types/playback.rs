use serde::{Deserialize, Serialize};

/// Play/pause state of the local video element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaybackState {
    Playing,
    Paused,
}

impl PlaybackState {
    pub fn from_paused(paused: bool) -> Self {
        if paused {
            PlaybackState::Paused
        } else {
            PlaybackState::Playing
        }
    }

    pub fn is_paused(self) -> bool {
        self == PlaybackState::Paused
    }

    /// Value stored under the global pause key for this state.
    pub fn as_flag(self) -> &'static str {
        if self.is_paused() {
            "true"
        } else {
            "false"
        }
    }
}

/// What a single synchronization check did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncOutcome {
    /// The page has no video element yet.
    NoVideo,
    /// Fewer than two live tabs; syncing is inactive.
    SingleTab,
    /// Local state already matches the global flag.
    InSync,
    /// The video was paused to match the flag.
    Paused,
    /// The video was resumed to match the flag.
    Played,
    /// The store could not be read; nothing was done.
    StoreUnavailable,
}

impl SyncOutcome {
    /// True when the check issued a pause or play command.
    pub fn commanded(self) -> bool {
        matches!(self, SyncOutcome::Paused | SyncOutcome::Played)
    }
}
