//! Property-based tests for heartbeat liveness.
//!
//! A tab counts as live exactly when its heartbeat is strictly younger than
//! the liveness window; unparseable heartbeats never count.

use std::sync::Arc;

use proptest::prelude::*;
use tabsync::clock::ManualClock;
use tabsync::managers::presence_tracker::{PresenceTracker, PresenceTrackerTrait};
use tabsync::store::{MemoryStore, SharedStore};
use tabsync::types::presence::TabId;
use tabsync::types::settings::SyncSettings;

const NOW: i64 = 1_700_000_000_000;

#[derive(Debug, Clone)]
enum Heartbeat {
    Age(i64),
    Garbage(String),
}

fn arb_heartbeat() -> impl Strategy<Value = Heartbeat> {
    prop_oneof![
        4 => (0i64..20_000).prop_map(Heartbeat::Age),
        1 => "[a-z ]{0,6}".prop_map(Heartbeat::Garbage),
    ]
}

fn tracker(store: &MemoryStore, window_ms: u64) -> PresenceTracker {
    let mut settings = SyncSettings::default();
    settings.timing.liveness_window_ms = window_ms;
    PresenceTracker::new(
        Arc::new(store.handle()),
        Arc::new(ManualClock::new(NOW)),
        TabId::from("observer"),
        &settings,
    )
}

proptest! {
    #[test]
    fn live_count_matches_fresh_entries(
        beats in prop::collection::vec(arb_heartbeat(), 0..12),
        window_ms in 1u64..15_000,
    ) {
        let store = MemoryStore::new();
        let writer = store.handle();
        for (i, beat) in beats.iter().enumerate() {
            let value = match beat {
                Heartbeat::Age(age) => (NOW - age).to_string(),
                Heartbeat::Garbage(text) => text.clone(),
            };
            writer.set(&format!("yt_tab_{}", i), &value).unwrap();
        }

        let expected = beats
            .iter()
            .filter(|b| matches!(b, Heartbeat::Age(age) if *age < window_ms as i64))
            .count();

        let tracker = tracker(&store, window_ms);
        let live = tracker.list_live_tabs().unwrap();
        prop_assert_eq!(live.len(), expected);
        prop_assert_eq!(tracker.live_tab_count().unwrap(), expected);
        for entry in &live {
            prop_assert!(NOW - entry.last_seen < window_ms as i64);
        }
    }

    #[test]
    fn own_refresh_always_counts(window_ms in 1u64..15_000) {
        let store = MemoryStore::new();
        let tracker = tracker(&store, window_ms);

        tracker.refresh_liveness().unwrap();
        prop_assert_eq!(tracker.live_tab_count().unwrap(), 1);

        tracker.release_liveness().unwrap();
        prop_assert_eq!(tracker.live_tab_count().unwrap(), 0);
    }

    #[test]
    fn non_heartbeat_keys_are_ignored(key in "[a-z_]{1,12}", age in 0i64..1_000) {
        prop_assume!(!key.starts_with("yt_tab_"));
        let store = MemoryStore::new();
        store.handle().set(&key, &(NOW - age).to_string()).unwrap();

        prop_assert_eq!(tracker(&store, 5000).live_tab_count().unwrap(), 0);
    }
}
