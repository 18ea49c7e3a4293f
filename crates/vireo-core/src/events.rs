//! Change-notification bus shared by the session and its controllers
//!
//! Notifications are delivered synchronously, in subscription order, within
//! the same turn as the mutation that produced them. This is the only
//! channel through which controllers observe each other's effects; there
//! are no direct controller-to-controller calls.

use crate::types::QualitySelection;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tracing::trace;

/// Events broadcast on the session bus.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum PlaybackEvent {
    /// Playback started
    Play { position: f64 },
    /// Playback paused
    Pause { position: f64 },
    /// Playback position moved
    TimeUpdate { position: f64 },
    /// Playback speed changed
    SpeedChange { old: f64, new: f64 },
    /// Quality selection changed
    QualityChange { selection: QualitySelection },
    /// The backend published its quality ladder (possibly late)
    QualityLevelsAvailable { count: usize },
    /// Volume changed
    VolumeChange { volume: f64 },
    /// Captions visibility toggled
    CaptionsToggled { visible: bool },
    /// Poster overlay dismissed by the first explicit play
    PosterDismissed,
    /// Streaming client bound to the media element
    MediaAttached,
    /// Source negotiated; playback may begin
    SourceReady,
    /// Backend released from the media element
    Detached,
    /// Asynchronous transport failure
    Error { code: String, message: String, fatal: bool },
}

/// Handle returned by [`EventBus::subscribe`]; required for unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Handler = Arc<dyn Fn(&PlaybackEvent) + Send + Sync>;

struct Subscription {
    id: SubscriptionId,
    name: String,
    handler: Handler,
}

/// Synchronous, ordered event bus.
#[derive(Default)]
pub struct EventBus {
    subscriptions: Mutex<Vec<Subscription>>,
    next_id: AtomicU64,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler; handlers run in subscription order on every emit.
    pub fn subscribe(&self, name: impl Into<String>, handler: Handler) -> SubscriptionId {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.subscriptions.lock().unwrap().push(Subscription {
            id,
            name: name.into(),
            handler,
        });
        id
    }

    /// Remove a handler. Returns false if the id was already gone.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut subs = self.subscriptions.lock().unwrap();
        let before = subs.len();
        subs.retain(|s| s.id != id);
        subs.len() != before
    }

    /// Deliver `event` to every handler, synchronously and in order.
    ///
    /// The subscription list is snapshotted first so a handler may subscribe
    /// or unsubscribe without deadlocking; such changes take effect on the
    /// next emit.
    pub fn emit(&self, event: &PlaybackEvent) {
        let handlers: Vec<(String, Handler)> = {
            let subs = self.subscriptions.lock().unwrap();
            subs.iter().map(|s| (s.name.clone(), Arc::clone(&s.handler))).collect()
        };

        for (name, handler) in handlers {
            trace!(subscriber = %name, ?event, "Delivering event");
            handler(event);
        }
    }

    /// Number of live subscriptions.
    pub fn subscriber_count(&self) -> usize {
        self.subscriptions.lock().unwrap().len()
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}
