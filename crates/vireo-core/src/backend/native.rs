//! Native progressive-download backend
//!
//! The source URL is assigned to the media element directly, so `Attached`
//! and `SourceReady` collapse into one step. The native transport offers no
//! quality switching; its ladder is always empty.

use super::{advance, PlaybackBackend};
use crate::error::{Error, Result};
use crate::events::{EventBus, PlaybackEvent};
use crate::media::MediaElement;
use crate::types::{BackendKind, BackendState, PlayerConfig, QualityLevel, QualitySelection};
use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use tracing::{debug, instrument};

pub struct NativeBackend {
    state: Mutex<BackendState>,
    media: Mutex<Option<Arc<MediaElement>>>,
    bus: Arc<EventBus>,
}

impl NativeBackend {
    pub fn new(bus: Arc<EventBus>) -> Self {
        Self {
            state: Mutex::new(BackendState::Uninitialized),
            media: Mutex::new(None),
            bus,
        }
    }

    fn media(&self) -> Option<Arc<MediaElement>> {
        self.media.lock().unwrap().clone()
    }
}

#[async_trait]
impl PlaybackBackend for NativeBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Native
    }

    fn state(&self) -> BackendState {
        *self.state.lock().unwrap()
    }

    #[instrument(skip(self, media, config))]
    async fn attach(&self, media: Arc<MediaElement>, config: &PlayerConfig) -> Result<()> {
        if self.state().is_attached() {
            return Err(Error::DoubleAttachment { kind: self.kind() });
        }

        let source = config
            .sources
            .first()
            .cloned()
            .ok_or_else(|| Error::InvalidArgument("no video sources configured".to_string()))?;

        media.claim(BackendKind::Native)?;
        media.set_src(source);
        *self.media.lock().unwrap() = Some(media);

        advance(&self.state, BackendState::SourceReady)?;
        self.bus.emit(&PlaybackEvent::SourceReady);

        Ok(())
    }

    fn detach(&self) {
        if !self.state().is_attached() {
            return;
        }

        if let Some(media) = self.media.lock().unwrap().take() {
            media.set_paused(true);
            media.release();
        }

        *self.state.lock().unwrap() = BackendState::Detached;
        debug!("Native backend detached");
        self.bus.emit(&PlaybackEvent::Detached);
    }

    fn play(&self) -> Result<()> {
        advance(&self.state, BackendState::Playing)?;
        let position = self.current_time();
        if let Some(media) = self.media() {
            media.set_paused(false);
        }
        self.bus.emit(&PlaybackEvent::Play { position });
        Ok(())
    }

    fn pause(&self) -> Result<()> {
        advance(&self.state, BackendState::Paused)?;
        let position = self.current_time();
        if let Some(media) = self.media() {
            media.set_paused(true);
        }
        self.bus.emit(&PlaybackEvent::Pause { position });
        Ok(())
    }

    fn current_time(&self) -> f64 {
        self.media().map(|m| m.current_time()).unwrap_or(0.0)
    }

    fn seek(&self, position: f64) {
        if let Some(media) = self.media() {
            media.set_current_time(position);
        }
    }

    fn available_quality_levels(&self) -> Vec<QualityLevel> {
        // The in-browser native player does not support quality control.
        Vec::new()
    }

    fn set_quality_level(&self, selection: QualitySelection) -> Result<()> {
        match selection {
            QualitySelection::Auto => Ok(()),
            QualitySelection::Level(i) => Err(Error::ValidationFailure(format!(
                "native backend has no quality level {}",
                i
            ))),
        }
    }
}
