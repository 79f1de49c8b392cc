//! Property-based tests for the playback synchronizer.
//!
//! Whatever the flag value and video state, repeated syncs issue at most one
//! command, a lone tab is never touched, and syncing never writes the flag.

use std::sync::Arc;

use proptest::prelude::*;
use tabsync::clock::ManualClock;
use tabsync::managers::playback_sync::PlaybackSynchronizer;
use tabsync::managers::presence_tracker::{PresenceTracker, PresenceTrackerTrait};
use tabsync::player::{SimulatedPage, SimulatedVideo, VideoElement};
use tabsync::store::{MemoryStore, SharedStore};
use tabsync::types::playback::{PlaybackState, SyncOutcome};
use tabsync::types::presence::TabId;
use tabsync::types::settings::SyncSettings;

const NOW: i64 = 1_700_000_000_000;
const URL: &str = "https://www.youtube.com/watch?v=prop";

fn arb_flag() -> impl Strategy<Value = Option<String>> {
    prop_oneof![
        Just(None),
        Just(Some("true".to_string())),
        Just(Some("false".to_string())),
        Just(Some("TRUE".to_string())),
        Just(Some("1".to_string())),
        "[a-z]{0,5}".prop_map(Some),
    ]
}

fn arb_state() -> impl Strategy<Value = PlaybackState> {
    prop_oneof![Just(PlaybackState::Playing), Just(PlaybackState::Paused)]
}

proptest! {
    #[test]
    fn repeated_sync_is_idempotent(
        flag in arb_flag(),
        initial in arb_state(),
        others in 0usize..4,
        repeats in 1usize..6,
    ) {
        let store = MemoryStore::new();
        let handle: Arc<dyn SharedStore> = Arc::new(store.handle());
        let settings = SyncSettings::default();

        if let Some(value) = &flag {
            handle.set("yt_global_paused", value).unwrap();
        }
        for i in 0..others {
            handle.set(&format!("yt_tab_other{}", i), &(NOW - 100).to_string()).unwrap();
        }

        let presence = PresenceTracker::new(
            handle.clone(),
            Arc::new(ManualClock::new(NOW)),
            TabId::from("self"),
            &settings,
        );
        presence.refresh_liveness().unwrap();
        let sync = PlaybackSynchronizer::new(handle.clone(), presence, &settings);
        let video = SimulatedVideo::new(initial);
        let page = SimulatedPage::with_video(URL, video.clone());

        let mut outcomes = Vec::new();
        for _ in 0..repeats {
            outcomes.push(sync.sync_playback(&page));
        }

        let commands = video.pause_calls() + video.play_calls();
        prop_assert!(commands <= 1);
        prop_assert!(outcomes.iter().filter(|o| o.commanded()).count() <= 1);
        prop_assert_eq!(handle.get("yt_global_paused").unwrap(), flag.clone());

        if others == 0 {
            prop_assert_eq!(commands, 0);
            prop_assert_eq!(video.state(), initial);
            prop_assert!(outcomes.iter().all(|o| *o == SyncOutcome::SingleTab));
        } else {
            let desired = flag.as_deref() == Some("true");
            prop_assert_eq!(video.is_paused(), desired);
            prop_assert_eq!(commands, usize::from(initial.is_paused() != desired));
            if repeats > 1 || commands == 0 {
                prop_assert_eq!(*outcomes.last().unwrap(), SyncOutcome::InSync);
            }
        }
    }

    #[test]
    fn local_transition_writes_only_with_company(
        state in arb_state(),
        others in 0usize..3,
    ) {
        let store = MemoryStore::new();
        let handle: Arc<dyn SharedStore> = Arc::new(store.handle());
        let settings = SyncSettings::default();
        for i in 0..others {
            handle.set(&format!("yt_tab_other{}", i), &NOW.to_string()).unwrap();
        }
        let presence = PresenceTracker::new(
            handle.clone(),
            Arc::new(ManualClock::new(NOW)),
            TabId::from("self"),
            &settings,
        );
        presence.refresh_liveness().unwrap();
        let sync = PlaybackSynchronizer::new(handle.clone(), presence, &settings);

        let wrote = sync.on_local_transition(state).unwrap();

        prop_assert_eq!(wrote, others > 0);
        let expected = (others > 0).then(|| state.as_flag().to_string());
        prop_assert_eq!(handle.get("yt_global_paused").unwrap(), expected);
    }
}
