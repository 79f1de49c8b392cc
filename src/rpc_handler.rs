//! RPC method handler for the tabsync driver protocol.
//!
//! Kept apart from `rpc_server.rs` so it can be tested without stdin/stdout.
//! One [`RpcContext`] is one tab: a simulated page and video plus the
//! running [`TabSession`].

use std::sync::Arc;

use serde_json::{json, Value};

use crate::clock::{Clock, SystemClock};
use crate::player::{SimulatedPage, SimulatedVideo};
use crate::session::TabSession;
use crate::store::SharedStore;
use crate::types::errors::SessionError;
use crate::types::playback::PlaybackState;
use crate::types::settings::SyncSettings;

/// Method that ends the session; handled by the server loop itself.
pub const STOP_METHOD: &str = "session.stop";

/// State behind one driver process.
pub struct RpcContext {
    pub session: TabSession,
    pub page: SimulatedPage,
    pub video: SimulatedVideo,
}

impl RpcContext {
    /// Builds a page with a video in `initial` state and starts its session.
    pub fn start(
        store: Arc<dyn SharedStore>,
        settings: &SyncSettings,
        url: &str,
        initial: PlaybackState,
    ) -> Result<Self, SessionError> {
        Self::start_with_clock(store, Arc::new(SystemClock), settings, url, initial)
    }

    pub fn start_with_clock(
        store: Arc<dyn SharedStore>,
        clock: Arc<dyn Clock>,
        settings: &SyncSettings,
        url: &str,
        initial: PlaybackState,
    ) -> Result<Self, SessionError> {
        let video = SimulatedVideo::new(initial);
        let page = SimulatedPage::with_video(url, video.clone());
        let session = TabSession::start(store, page.clone(), clock, settings)?;
        Ok(Self { session, page, video })
    }
}

fn video_status(video: &SimulatedVideo) -> Value {
    json!({
        "state": video.state(),
        "pause_calls": video.pause_calls(),
        "play_calls": video.play_calls(),
    })
}

/// Dispatch a method call.
///
/// Returns `Ok(Value)` on success or `Err(String)` with an error message.
pub async fn handle_method(ctx: &RpcContext, method: &str, params: &Value) -> Result<Value, String> {
    match method {
        "ping" => Ok(json!({"pong": true})),

        // ─── Video ───
        "video.pause" => {
            ctx.video.user_pause();
            Ok(video_status(&ctx.video))
        }
        "video.play" => {
            ctx.video.user_play();
            Ok(video_status(&ctx.video))
        }
        "video.status" => Ok(video_status(&ctx.video)),
        "video.detach" => {
            ctx.page.detach();
            Ok(json!({"attached": false}))
        }
        "video.attach" => {
            match params.get("paused").and_then(|v| v.as_bool()) {
                Some(true) => ctx.video.user_pause(),
                Some(false) => ctx.video.user_play(),
                None => {}
            }
            ctx.page.attach(ctx.video.clone());
            Ok(json!({"attached": true}))
        }

        // ─── Tabs ───
        "tabs.self" => Ok(json!({"tab_id": ctx.session.tab_id().as_str()})),
        "tabs.live" => {
            let tabs = ctx
                .session
                .live_tabs()
                .await
                .ok_or("session unavailable")?;
            let ids: Vec<&str> = tabs.iter().map(|t| t.tab_id.as_str()).collect();
            Ok(json!({"count": tabs.len(), "tabs": ids}))
        }

        // ─── Sync ───
        "sync.now" => {
            let outcome = ctx.session.sync_now().await.ok_or("session unavailable")?;
            Ok(json!({"outcome": outcome, "video": video_status(&ctx.video)}))
        }

        _ => Err(format!("unknown method: {}", method)),
    }
}
