//! Media element handle with a single-owner attachment guard
//!
//! The element and its attached backend are the one resource in the runtime
//! requiring single-ownership discipline. The claim guard turns the rule
//! "detach fully before the next attach" into a mechanical check: a second
//! backend attaching before the first released its claim fails fast with
//! `DoubleAttachment` instead of silently replacing it.

use crate::error::{Error, Result};
use crate::types::BackendKind;
use std::sync::Mutex;
use tracing::debug;
use url::Url;

#[derive(Debug, Default)]
struct MediaState {
    src: Option<Url>,
    current_time: f64,
    playback_rate: f64,
    volume: f64,
    paused: bool,
}

/// The underlying media element, shared by reference across the session.
#[derive(Debug)]
pub struct MediaElement {
    state: Mutex<MediaState>,
    attachment: Mutex<Option<BackendKind>>,
}

impl Default for MediaElement {
    fn default() -> Self {
        Self::new()
    }
}

impl MediaElement {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(MediaState {
                playback_rate: 1.0,
                volume: 1.0,
                paused: true,
                ..MediaState::default()
            }),
            attachment: Mutex::new(None),
        }
    }

    /// Claim exclusive ownership for a backend.
    pub fn claim(&self, kind: BackendKind) -> Result<()> {
        let mut attachment = self.attachment.lock().unwrap();
        if let Some(owner) = *attachment {
            return Err(Error::DoubleAttachment { kind: owner });
        }
        *attachment = Some(kind);
        debug!(backend = %kind, "Media element claimed");
        Ok(())
    }

    /// Release the claim. Idempotent.
    pub fn release(&self) {
        let mut attachment = self.attachment.lock().unwrap();
        if attachment.take().is_some() {
            debug!("Media element released");
        }
    }

    /// True iff a backend currently owns the element.
    pub fn is_attached(&self) -> bool {
        self.attachment.lock().unwrap().is_some()
    }

    /// The backend kind holding the claim, if any.
    pub fn attached_by(&self) -> Option<BackendKind> {
        *self.attachment.lock().unwrap()
    }

    pub fn set_src(&self, src: Url) {
        self.state.lock().unwrap().src = Some(src);
    }

    pub fn src(&self) -> Option<Url> {
        self.state.lock().unwrap().src.clone()
    }

    pub fn set_current_time(&self, position: f64) {
        self.state.lock().unwrap().current_time = position.max(0.0);
    }

    pub fn current_time(&self) -> f64 {
        self.state.lock().unwrap().current_time
    }

    pub fn set_playback_rate(&self, rate: f64) {
        self.state.lock().unwrap().playback_rate = rate;
    }

    pub fn playback_rate(&self) -> f64 {
        self.state.lock().unwrap().playback_rate
    }

    pub fn set_volume(&self, volume: f64) {
        self.state.lock().unwrap().volume = volume.clamp(0.0, 1.0);
    }

    pub fn volume(&self) -> f64 {
        self.state.lock().unwrap().volume
    }

    pub fn set_paused(&self, paused: bool) {
        self.state.lock().unwrap().paused = paused;
    }

    pub fn is_paused(&self) -> bool {
        self.state.lock().unwrap().paused
    }
}
