//! Page and video element abstraction.
//!
//! A [`VideoElement`] behaves like a DOM media element: `pause()` and `play()`
//! fire the same transition events a user interaction would, and only when
//! the state actually changes.

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::mpsc;

use crate::types::playback::PlaybackState;

/// Receiver of a video's play/pause transitions.
pub type PlaybackEvents = mpsc::UnboundedReceiver<PlaybackState>;

/// Handle to a page's video element.
pub trait VideoElement: Send + Sync {
    fn is_paused(&self) -> bool;
    fn pause(&self);
    fn play(&self);
    /// Attaches a listener for state transitions.
    fn subscribe(&self) -> PlaybackEvents;
    /// True when both handles refer to the same underlying element.
    fn same_element(&self, other: &Self) -> bool;
}

/// The page a tab session runs in.
pub trait Page: Send + 'static {
    type Video: VideoElement;

    fn url(&self) -> String;
    /// First video element on the page, if one exists yet.
    fn video(&self) -> Option<Self::Video>;
}

#[derive(Default)]
struct VideoInner {
    paused: bool,
    pause_calls: usize,
    play_calls: usize,
    listeners: Vec<mpsc::UnboundedSender<PlaybackState>>,
}

impl VideoInner {
    fn transition(&mut self, paused: bool) {
        if self.paused == paused {
            return;
        }
        self.paused = paused;
        let state = PlaybackState::from_paused(paused);
        self.listeners.retain(|tx| tx.send(state).is_ok());
    }
}

/// In-memory video element. Clones are handles to the same element.
#[derive(Clone, Default)]
pub struct SimulatedVideo {
    inner: Arc<Mutex<VideoInner>>,
}

impl SimulatedVideo {
    pub fn new(state: PlaybackState) -> Self {
        let video = Self::default();
        video.inner.lock().paused = state.is_paused();
        video
    }

    pub fn state(&self) -> PlaybackState {
        PlaybackState::from_paused(self.is_paused())
    }

    /// A pause made by the user; not counted as a command.
    pub fn user_pause(&self) {
        self.inner.lock().transition(true);
    }

    pub fn user_play(&self) {
        self.inner.lock().transition(false);
    }

    /// Number of `pause()` commands received.
    pub fn pause_calls(&self) -> usize {
        self.inner.lock().pause_calls
    }

    pub fn play_calls(&self) -> usize {
        self.inner.lock().play_calls
    }
}

impl VideoElement for SimulatedVideo {
    fn is_paused(&self) -> bool {
        self.inner.lock().paused
    }

    fn pause(&self) {
        let mut inner = self.inner.lock();
        inner.pause_calls += 1;
        inner.transition(true);
    }

    fn play(&self) {
        let mut inner = self.inner.lock();
        inner.play_calls += 1;
        inner.transition(false);
    }

    fn subscribe(&self) -> PlaybackEvents {
        let (tx, rx) = mpsc::unbounded_channel();
        self.inner.lock().listeners.push(tx);
        rx
    }

    fn same_element(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

/// In-memory page whose video can be attached after load.
#[derive(Clone)]
pub struct SimulatedPage {
    url: String,
    video: Arc<Mutex<Option<SimulatedVideo>>>,
}

impl SimulatedPage {
    pub fn new(url: &str) -> Self {
        Self {
            url: url.to_string(),
            video: Arc::new(Mutex::new(None)),
        }
    }

    pub fn with_video(url: &str, video: SimulatedVideo) -> Self {
        let page = Self::new(url);
        page.attach(video);
        page
    }

    pub fn attach(&self, video: SimulatedVideo) {
        *self.video.lock() = Some(video);
    }

    pub fn detach(&self) {
        *self.video.lock() = None;
    }
}

impl Page for SimulatedPage {
    type Video = SimulatedVideo;

    fn url(&self) -> String {
        self.url.clone()
    }

    fn video(&self) -> Option<SimulatedVideo> {
        self.video.lock().clone()
    }
}
