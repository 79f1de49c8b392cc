//! tabsync demo: two tabs in one process sharing an in-memory store.
//!
//! Walks through pausing one tab, watching the other follow, and closing a
//! tab so the survivor is no longer constrained.

use std::sync::Arc;
use std::time::Duration;

use tabsync::clock::SystemClock;
use tabsync::player::{SimulatedPage, SimulatedVideo};
use tabsync::session::TabSession;
use tabsync::store::MemoryStore;
use tabsync::types::playback::PlaybackState;
use tabsync::types::settings::SyncSettings;
use tracing_subscriber::EnvFilter;

const PAGE_URL: &str = "https://www.youtube.com/watch?v=demo";

fn section(name: &str) {
    println!("───────────────────────────────────────────────────────────────");
    println!("  {}", name);
    println!("───────────────────────────────────────────────────────────────");
}

fn open_tab(store: &MemoryStore, settings: &SyncSettings) -> Result<(TabSession, SimulatedVideo), Box<dyn std::error::Error>> {
    let video = SimulatedVideo::new(PlaybackState::Playing);
    let page = SimulatedPage::with_video(PAGE_URL, video.clone());
    let session = TabSession::start(Arc::new(store.handle()), page, Arc::new(SystemClock), settings)?;
    Ok((session, video))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let mut settings = SyncSettings::default();
    settings.timing.refresh_interval_ms = 200;
    settings.timing.liveness_window_ms = 500;

    let store = MemoryStore::new();

    section("Two tabs open");
    let (tab1, video1) = open_tab(&store, &settings)?;
    let (tab2, video2) = open_tab(&store, &settings)?;
    println!("  tab 1 = {}", tab1.tab_id());
    println!("  tab 2 = {}", tab2.tab_id());
    let live = tab1.live_tabs().await.map(|t| t.len()).unwrap_or(0);
    println!("  live tabs: {}", live);

    section("Tab 1 pauses");
    video1.user_pause();
    tokio::time::sleep(Duration::from_millis(50)).await;
    println!("  tab 1: {:?}, tab 2: {:?}", video1.state(), video2.state());

    section("Tab 2 resumes");
    video2.user_play();
    tokio::time::sleep(Duration::from_millis(50)).await;
    println!("  tab 1: {:?}, tab 2: {:?}", video1.state(), video2.state());

    section("Tab 1 closes");
    video2.user_pause();
    tokio::time::sleep(Duration::from_millis(50)).await;
    tab1.shutdown().await;
    video2.user_play();
    tokio::time::sleep(Duration::from_millis(400)).await;
    let live = tab2.live_tabs().await.map(|t| t.len()).unwrap_or(0);
    println!("  live tabs: {}, tab 2 plays freely: {:?}", live, video2.state());

    tab2.shutdown().await;
    println!();
    println!("  store entries left: {}", store.len());
    Ok(())
}
