// tabsync state managers
// Managers own the per-tab coordination logic: presence and playback sync.

pub mod playback_sync;
pub mod presence_tracker;
