//! Property-based tests for SyncSettings persistence.
//!
//! Valid settings survive a JSON round-trip and a save/load cycle through
//! the SettingsEngine unchanged.

use proptest::prelude::*;
use tabsync::services::settings_engine::{SettingsEngine, SettingsEngineTrait};
use tabsync::types::settings::{ActivationSettings, KeySettings, SyncSettings, TimingSettings};

fn arb_keys() -> impl Strategy<Value = KeySettings> {
    ("p[a-z]{0,6}_", "k[a-z_]{0,12}").prop_map(|(heartbeat_prefix, pause_key)| KeySettings {
        heartbeat_prefix,
        pause_key,
    })
}

fn arb_timing() -> impl Strategy<Value = TimingSettings> {
    (1u64..10_000, 1u64..10_000, 1u64..1_000).prop_map(|(refresh, extra, poll)| TimingSettings {
        liveness_window_ms: refresh + extra,
        refresh_interval_ms: refresh,
        store_poll_interval_ms: poll,
    })
}

fn arb_activation() -> impl Strategy<Value = ActivationSettings> {
    prop::collection::vec("https://[a-z]{1,8}\\.com/[a-z*]{0,6}", 0..4)
        .prop_map(|url_patterns| ActivationSettings { url_patterns })
}

fn arb_settings() -> impl Strategy<Value = SyncSettings> {
    (arb_keys(), arb_timing(), arb_activation()).prop_map(|(keys, timing, activation)| {
        SyncSettings {
            keys,
            timing,
            activation,
        }
    })
}

proptest! {
    #[test]
    fn generated_settings_are_valid(settings in arb_settings()) {
        prop_assert!(settings.validate().is_ok());
    }

    #[test]
    fn json_roundtrip_preserves_settings(settings in arb_settings()) {
        let json = serde_json::to_string(&settings).unwrap();
        let back: SyncSettings = serde_json::from_str(&json).unwrap();
        prop_assert_eq!(back, settings);
    }

    #[test]
    fn save_then_load_preserves_settings(settings in arb_settings()) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json").to_string_lossy().to_string();
        std::fs::write(&path, serde_json::to_string_pretty(&settings).unwrap()).unwrap();

        let mut engine = SettingsEngine::new(Some(path.clone()));
        let loaded = engine.load().unwrap();
        prop_assert_eq!(&loaded, &settings);

        engine.save().unwrap();
        let mut reopened = SettingsEngine::new(Some(path));
        prop_assert_eq!(reopened.load().unwrap(), settings);
    }
}
