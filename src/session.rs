//! Tab session: the event loop one tab runs for its lifetime.
//!
//! Owns the refresh timer, the store subscription and the video listener.
//! All of them are released when the session is shut down or dropped, and
//! the heartbeat is removed on the way out.

use std::sync::Arc;

use tokio::runtime::Handle;
use tokio::sync::mpsc::error::TryRecvError;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{self, Duration, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::clock::Clock;
use crate::managers::playback_sync::PlaybackSynchronizer;
use crate::managers::presence_tracker::{PresenceTracker, PresenceTrackerTrait};
use crate::player::{Page, PlaybackEvents, VideoElement};
use crate::store::{SharedStore, StoreSubscription};
use crate::types::errors::SessionError;
use crate::types::playback::{PlaybackState, SyncOutcome};
use crate::types::presence::{HeartbeatEntry, TabId};
use crate::types::settings::SyncSettings;

/// Requests served by the session loop between events.
enum SessionCommand {
    SyncNow(oneshot::Sender<SyncOutcome>),
    LiveTabs(oneshot::Sender<Vec<HeartbeatEntry>>),
}

/// A running tab session.
pub struct TabSession {
    tab_id: TabId,
    commands: mpsc::UnboundedSender<SessionCommand>,
    shutdown: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl TabSession {
    /// Registers the tab and starts its event loop on the current Tokio runtime.
    ///
    /// Refreshes the heartbeat and runs one sync before returning, so the tab
    /// is visible to others as soon as this succeeds.
    pub fn start<P: Page>(
        store: Arc<dyn SharedStore>,
        page: P,
        clock: Arc<dyn Clock>,
        settings: &SyncSettings,
    ) -> Result<Self, SessionError> {
        settings.validate()?;
        let url = page.url();
        if !settings.matches_url(&url) {
            return Err(SessionError::InactivePage(url));
        }
        let runtime = Handle::try_current().map_err(|_| SessionError::NoRuntime)?;

        let tab_id = TabId::generate(clock.as_ref());
        let presence = PresenceTracker::new(store.clone(), clock, tab_id.clone(), settings);
        let sync = PlaybackSynchronizer::new(store.clone(), presence, settings);
        let changes = store.subscribe()?;

        let mut session_loop = SessionLoop {
            sync,
            page,
            changes,
            video: None,
            playback: None,
            refresh: settings.timing.refresh_interval(),
        };
        session_loop.refresh_and_sync();
        session_loop.attach_video();

        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let task = runtime.spawn(session_loop.run(command_rx, shutdown_rx));

        info!(tab_id = %tab_id, url = %url, "Tab session started");
        Ok(Self {
            tab_id,
            commands: command_tx,
            shutdown: Some(shutdown_tx),
            task: Some(task),
        })
    }

    pub fn tab_id(&self) -> &TabId {
        &self.tab_id
    }

    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|t| !t.is_finished())
    }

    /// Runs a sync check inside the loop. `None` once the loop has stopped.
    pub async fn sync_now(&self) -> Option<SyncOutcome> {
        let (tx, rx) = oneshot::channel();
        self.commands.send(SessionCommand::SyncNow(tx)).ok()?;
        rx.await.ok()
    }

    /// Currently live tabs as seen by this session, this tab included.
    pub async fn live_tabs(&self) -> Option<Vec<HeartbeatEntry>> {
        let (tx, rx) = oneshot::channel();
        self.commands.send(SessionCommand::LiveTabs(tx)).ok()?;
        rx.await.ok()
    }

    /// Stops the loop and waits for it to release the heartbeat.
    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                warn!("Tab session task failed: {}", e);
            }
        }
    }
}

impl Drop for TabSession {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
    }
}

struct SessionLoop<P: Page> {
    sync: PlaybackSynchronizer,
    page: P,
    changes: StoreSubscription,
    video: Option<P::Video>,
    playback: Option<PlaybackEvents>,
    refresh: Duration,
}

impl<P: Page> SessionLoop<P> {
    async fn run(
        mut self,
        mut commands: mpsc::UnboundedReceiver<SessionCommand>,
        mut shutdown: oneshot::Receiver<()>,
    ) {
        let mut ticker = time::interval_at(Instant::now() + self.refresh, self.refresh);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;

                _ = &mut shutdown => break,
                event = next_playback(&mut self.playback) => match event {
                    Some(state) => self.publish_transition(state),
                    None => {
                        debug!("Video listener closed");
                        self.playback = None;
                        self.video = None;
                    }
                },
                Some(change) = self.changes.recv() => {
                    self.publish_pending_transitions();
                    let outcome = self.sync.on_store_change(&change, &self.page);
                    if outcome.is_some_and(SyncOutcome::commanded) {
                        self.publish_pending_transitions();
                    }
                }
                _ = ticker.tick() => {
                    self.attach_video();
                    self.refresh_and_sync();
                }
                Some(command) = commands.recv() => self.handle_command(command),
            }
        }

        if let Err(e) = self.sync.presence().release_liveness() {
            warn!("Failed to release heartbeat: {}", e);
        }
        info!(tab_id = %self.sync.presence().tab_id(), "Tab session stopped");
    }

    fn refresh_and_sync(&mut self) {
        if let Err(e) = self.sync.presence().refresh_liveness() {
            warn!("Failed to refresh heartbeat: {}", e);
        }
        self.sync_playback();
    }

    /// Syncs with queued transitions published first, and the echo of any
    /// command published before the loop yields.
    fn sync_playback(&mut self) -> SyncOutcome {
        self.publish_pending_transitions();
        let outcome = self.sync.sync_playback(&self.page);
        if outcome.commanded() {
            self.publish_pending_transitions();
        }
        outcome
    }

    fn publish_transition(&self, state: PlaybackState) {
        if let Err(e) = self.sync.on_local_transition(state) {
            warn!("Failed to publish playback state: {}", e);
        }
    }

    /// Publishes transitions already queued by the video. Must run before any
    /// sync, otherwise a sync against the old flag reverts them.
    fn publish_pending_transitions(&mut self) {
        let Some(events) = self.playback.as_mut() else {
            return;
        };
        let mut pending = Vec::new();
        let mut closed = false;
        loop {
            match events.try_recv() {
                Ok(state) => pending.push(state),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    closed = true;
                    break;
                }
            }
        }
        for state in pending {
            self.publish_transition(state);
        }
        if closed {
            debug!("Video listener closed");
            self.playback = None;
            self.video = None;
        }
    }

    /// Listens to the page's current video, switching over when the page
    /// replaces its element.
    fn attach_video(&mut self) {
        let Some(video) = self.page.video() else {
            return;
        };
        if self.playback.is_some()
            && self.video.as_ref().is_some_and(|current| current.same_element(&video))
        {
            return;
        }
        self.publish_pending_transitions();
        self.playback = Some(video.subscribe());
        self.video = Some(video);
        debug!("Attached to video element");
    }

    fn handle_command(&mut self, command: SessionCommand) {
        match command {
            SessionCommand::SyncNow(reply) => {
                let outcome = self.sync_playback();
                let _ = reply.send(outcome);
            }
            SessionCommand::LiveTabs(reply) => match self.sync.presence().list_live_tabs() {
                Ok(tabs) => {
                    let _ = reply.send(tabs);
                }
                Err(e) => warn!("Failed to list live tabs: {}", e),
            },
        }
    }
}

async fn next_playback(events: &mut Option<PlaybackEvents>) -> Option<PlaybackState> {
    match events {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}
