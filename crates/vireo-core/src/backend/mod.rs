//! Playback backend abstraction
//!
//! A uniform player interface over two transports: a native progressive
//! backend whose source is assigned directly, and an adaptive (HLS) backend
//! that negotiates manifest and quality-level loading through a streaming
//! client. The session must behave identically against either.

mod hls;
mod native;

pub use hls::HlsBackend;
pub use native::NativeBackend;

use crate::error::{Error, Result};
use crate::events::EventBus;
use crate::media::MediaElement;
use crate::types::{BackendKind, BackendState, PlayerConfig, QualityLevel, QualitySelection};
use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use tracing::info;

/// Uniform surface both backends expose to the session.
#[async_trait]
pub trait PlaybackBackend: Send + Sync {
    /// Which transport this backend drives
    fn kind(&self) -> BackendKind;

    /// Current state-machine state
    fn state(&self) -> BackendState;

    /// Bind to the media element and negotiate the source.
    ///
    /// Fails fast with `DoubleAttachment` if this backend, or another one,
    /// already holds the element. An asynchronous manifest failure leaves
    /// the backend in the terminal `Failed` state and surfaces an error
    /// event instead of returning `Err`.
    async fn attach(&self, media: Arc<MediaElement>, config: &PlayerConfig) -> Result<()>;

    /// Release the media element. Idempotent; safe on a detached backend.
    fn detach(&self);

    /// Start or resume playback
    fn play(&self) -> Result<()>;

    /// Pause playback
    fn pause(&self) -> Result<()>;

    /// Current playback position in seconds
    fn current_time(&self) -> f64;

    /// Move the playback position
    fn seek(&self, position: f64);

    /// Quality ladder; empty when the transport offers no switching
    fn available_quality_levels(&self) -> Vec<QualityLevel>;

    /// Select a ladder entry, or return to automatic selection
    fn set_quality_level(&self, selection: QualitySelection) -> Result<()>;
}

/// Construct the backend for a configuration's transport kind.
pub fn create_backend(kind: BackendKind, bus: Arc<EventBus>) -> Box<dyn PlaybackBackend> {
    match kind {
        BackendKind::Native => Box::new(NativeBackend::new(bus)),
        BackendKind::Hls => Box::new(HlsBackend::new(bus)),
    }
}

/// Guarded state transition shared by both backends.
pub(crate) fn advance(state: &Mutex<BackendState>, target: BackendState) -> Result<()> {
    let mut current = state.lock().unwrap();
    if !current.can_transition_to(target) {
        return Err(Error::InvalidStateTransition {
            from: current.to_string(),
            to: target.to_string(),
        });
    }
    info!(from = %current, to = %target, "Backend state transition");
    *current = target;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn advance_rejects_invalid_transition() {
        let state = Mutex::new(BackendState::Uninitialized);
        advance(&state, BackendState::Attached).unwrap();
        let err = advance(&state, BackendState::Playing).unwrap_err();
        assert!(matches!(err, Error::InvalidStateTransition { .. }));
        assert_eq!(*state.lock().unwrap(), BackendState::Attached);
    }
}
