//! Tests for the per-tab event loop running on a real Tokio runtime.

use std::sync::Arc;
use std::time::Duration;

use tabsync::clock::{Clock, SystemClock};
use tabsync::player::{SimulatedPage, SimulatedVideo, VideoElement};
use tabsync::session::TabSession;
use tabsync::store::{MemoryStore, SharedStore};
use tabsync::types::errors::SessionError;
use tabsync::types::playback::{PlaybackState, SyncOutcome};
use tabsync::types::settings::SyncSettings;

const URL: &str = "https://www.youtube.com/watch?v=abc";

fn fast_settings() -> SyncSettings {
    let mut settings = SyncSettings::default();
    settings.timing.refresh_interval_ms = 50;
    settings.timing.liveness_window_ms = 1000;
    settings
}

fn open_tab(store: &MemoryStore, settings: &SyncSettings) -> (TabSession, SimulatedVideo) {
    let video = SimulatedVideo::new(PlaybackState::Playing);
    let page = SimulatedPage::with_video(URL, video.clone());
    let session = TabSession::start(Arc::new(store.handle()), page, Arc::new(SystemClock), settings)
        .expect("session starts");
    (session, video)
}

/// Polls `cond` until it holds or two seconds pass.
async fn eventually(cond: impl Fn() -> bool) -> bool {
    for _ in 0..200 {
        if cond() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    cond()
}

#[tokio::test]
async fn test_start_registers_heartbeat() {
    let store = MemoryStore::new();
    let (session, _video) = open_tab(&store, &fast_settings());

    let key = format!("yt_tab_{}", session.tab_id());
    assert!(store.handle().get(&key).unwrap().is_some());
    assert!(session.is_running());
    assert_eq!(session.live_tabs().await.map(|t| t.len()), Some(1));
}

#[tokio::test]
async fn test_pause_in_one_tab_pauses_the_other() {
    let store = MemoryStore::new();
    let settings = fast_settings();
    let (_tab1, video1) = open_tab(&store, &settings);
    let (_tab2, video2) = open_tab(&store, &settings);

    video1.user_pause();

    assert!(eventually(|| video2.is_paused()).await);
    assert_eq!(store.handle().get("yt_global_paused").unwrap().as_deref(), Some("true"));
    assert_eq!(video2.pause_calls(), 1);
}

#[tokio::test]
async fn test_resume_propagates_back() {
    let store = MemoryStore::new();
    let settings = fast_settings();
    let (_tab1, video1) = open_tab(&store, &settings);
    let (_tab2, video2) = open_tab(&store, &settings);

    video1.user_pause();
    assert!(eventually(|| video2.is_paused()).await);
    video2.user_play();

    assert!(eventually(|| !video1.is_paused()).await);
    assert_eq!(store.handle().get("yt_global_paused").unwrap().as_deref(), Some("false"));
}

#[tokio::test]
async fn test_single_tab_is_unconstrained() {
    let store = MemoryStore::new();
    store.handle().set("yt_global_paused", "true").unwrap();
    let (session, video) = open_tab(&store, &fast_settings());

    assert_eq!(session.sync_now().await, Some(SyncOutcome::SingleTab));
    video.user_pause();
    video.user_play();
    tokio::time::sleep(Duration::from_millis(120)).await;

    assert!(!video.is_paused());
    assert_eq!(video.pause_calls() + video.play_calls(), 0);
    assert_eq!(store.handle().get("yt_global_paused").unwrap().as_deref(), Some("true"));
}

#[tokio::test]
async fn test_shutdown_releases_heartbeat_and_subscription() {
    let store = MemoryStore::new();
    let settings = fast_settings();
    let (tab1, _video1) = open_tab(&store, &settings);
    let (tab2, _video2) = open_tab(&store, &settings);
    assert_eq!(store.subscriber_count(), 2);

    tab1.shutdown().await;

    assert_eq!(tab2.live_tabs().await.map(|t| t.len()), Some(1));
    assert_eq!(store.subscriber_count(), 1);
}

#[tokio::test]
async fn test_drop_releases_heartbeat() {
    let store = MemoryStore::new();
    let settings = fast_settings();
    let (tab1, _video1) = open_tab(&store, &settings);
    let key = format!("yt_tab_{}", tab1.tab_id());

    drop(tab1);

    let handle = store.handle();
    assert!(eventually(|| handle.get(&key).unwrap().is_none()).await);
}

#[tokio::test]
async fn test_closing_tab_leaves_survivor_free() {
    let store = MemoryStore::new();
    let settings = fast_settings();
    let (tab1, video1) = open_tab(&store, &settings);
    let (tab2, video2) = open_tab(&store, &settings);
    video1.user_pause();
    assert!(eventually(|| video2.is_paused()).await);

    tab1.shutdown().await;
    video2.user_play();
    tokio::time::sleep(Duration::from_millis(150)).await;

    assert!(!video2.is_paused());
    assert_eq!(tab2.sync_now().await, Some(SyncOutcome::SingleTab));
}

#[tokio::test]
async fn test_late_video_is_attached_on_tick() {
    let store = MemoryStore::new();
    let settings = fast_settings();
    let page = SimulatedPage::new(URL);
    let late = TabSession::start(Arc::new(store.handle()), page.clone(), Arc::new(SystemClock), &settings)
        .unwrap();
    let (_other, other_video) = open_tab(&store, &settings);

    assert_eq!(late.sync_now().await, Some(SyncOutcome::NoVideo));

    let video = SimulatedVideo::new(PlaybackState::Playing);
    page.attach(video.clone());
    tokio::time::sleep(Duration::from_millis(150)).await;
    video.user_pause();

    assert!(eventually(|| other_video.is_paused()).await);
}

#[tokio::test]
async fn test_local_transition_beats_queued_notification() {
    let store = MemoryStore::new();
    let settings = SyncSettings::default();
    let (_tab1, video1) = open_tab(&store, &settings);
    let (tab2, video2) = open_tab(&store, &settings);
    let other_heartbeat = format!("yt_tab_{}", tab2.tab_id());
    let writer = store.handle();

    for _ in 0..20 {
        video1.user_pause();
        writer
            .set(&other_heartbeat, &(SystemClock.now_millis() + 1).to_string())
            .unwrap();
        assert!(eventually(|| video2.is_paused()).await);
        assert!(video1.is_paused());
        assert_eq!(writer.get("yt_global_paused").unwrap().as_deref(), Some("true"));

        video1.user_play();
        writer
            .set(&other_heartbeat, &(SystemClock.now_millis() + 2).to_string())
            .unwrap();
        assert!(eventually(|| !video2.is_paused()).await);
        assert!(!video1.is_paused());
        assert_eq!(writer.get("yt_global_paused").unwrap().as_deref(), Some("false"));
    }
    assert_eq!(video1.pause_calls() + video1.play_calls(), 0);
}

#[tokio::test]
async fn test_local_transition_beats_sync_now() {
    let store = MemoryStore::new();
    let settings = SyncSettings::default();
    let (tab1, video1) = open_tab(&store, &settings);
    let (_tab2, video2) = open_tab(&store, &settings);

    video1.user_pause();
    assert_eq!(tab1.sync_now().await, Some(SyncOutcome::InSync));

    assert!(video1.is_paused());
    assert!(eventually(|| video2.is_paused()).await);
}

#[tokio::test]
async fn test_replaced_video_is_followed() {
    let store = MemoryStore::new();
    let settings = fast_settings();
    let first = SimulatedVideo::new(PlaybackState::Playing);
    let page = SimulatedPage::with_video(URL, first.clone());
    let _session = TabSession::start(Arc::new(store.handle()), page.clone(), Arc::new(SystemClock), &settings)
        .unwrap();
    let (_other, other_video) = open_tab(&store, &settings);

    let replacement = SimulatedVideo::new(PlaybackState::Playing);
    page.attach(replacement.clone());
    tokio::time::sleep(Duration::from_millis(150)).await;
    replacement.user_pause();

    assert!(eventually(|| other_video.is_paused()).await);
    assert_eq!(store.handle().get("yt_global_paused").unwrap().as_deref(), Some("true"));
}

#[tokio::test]
async fn test_inactive_page_is_refused() {
    let store = MemoryStore::new();
    let page = SimulatedPage::with_video("https://example.com/video", SimulatedVideo::default());
    let result = TabSession::start(Arc::new(store.handle()), page, Arc::new(SystemClock), &fast_settings());

    assert!(matches!(result, Err(SessionError::InactivePage(_))));
    assert!(store.is_empty());
}

#[tokio::test]
async fn test_invalid_settings_are_refused() {
    let store = MemoryStore::new();
    let mut settings = fast_settings();
    settings.timing.liveness_window_ms = settings.timing.refresh_interval_ms;
    let page = SimulatedPage::with_video(URL, SimulatedVideo::default());

    let result = TabSession::start(Arc::new(store.handle()), page, Arc::new(SystemClock), &settings);
    assert!(matches!(result, Err(SessionError::Settings(_))));
}

#[test]
fn test_start_without_runtime_fails() {
    let store = MemoryStore::new();
    let page = SimulatedPage::with_video(URL, SimulatedVideo::default());
    let result = TabSession::start(Arc::new(store.handle()), page, Arc::new(SystemClock), &fast_settings());

    assert!(matches!(result, Err(SessionError::NoRuntime)));
}
