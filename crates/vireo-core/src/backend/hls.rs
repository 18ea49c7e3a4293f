//! Adaptive (HLS) backend
//!
//! On attach, a streaming client is bound to the media element; only after
//! the client signals media-attached is the master playlist loaded, and
//! only after the manifest parses does the backend report `SourceReady` and
//! expose its quality ladder. A manifest failure is terminal: the backend
//! moves to `Failed`, surfaces an error event, and never retries locally.
//!
//! If the platform plays HLS natively, the client is bypassed and the
//! source is assigned directly; from then on the backend behaves like the
//! native one (including an empty quality ladder).

use super::{advance, PlaybackBackend};
use crate::error::{Error, Result};
use crate::events::{EventBus, PlaybackEvent};
use crate::media::MediaElement;
use crate::types::{BackendKind, BackendState, PlayerConfig, QualityLevel, QualitySelection};
use async_trait::async_trait;
use reqwest::Client;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{debug, instrument, warn};
use url::Url;

/// Client-side streaming attachment, created per playback.
struct StreamingClient {
    #[allow(dead_code)]
    media: Arc<MediaElement>,
}

impl StreamingClient {
    /// Bind to the media element; the media-attached signal fires once the
    /// binding is complete.
    fn bind(media: Arc<MediaElement>, bus: &EventBus) -> Self {
        let client = Self { media };
        bus.emit(&PlaybackEvent::MediaAttached);
        client
    }
}

/// Parse a master playlist into the quality ladder, sorted by bandwidth.
fn parse_master_playlist(content: &str) -> Result<Vec<QualityLevel>> {
    let parsed = m3u8_rs::parse_master_playlist_res(content.as_bytes())
        .map_err(|e| Error::ManifestLoadFailure(format!("failed to parse HLS master: {:?}", e)))?;

    let mut levels: Vec<QualityLevel> = parsed
        .variants
        .iter()
        .enumerate()
        .map(|(idx, variant)| QualityLevel {
            id: format!("variant_{}", idx),
            bandwidth: variant.bandwidth,
            width: variant.resolution.map(|r| r.width as u32),
            height: variant.resolution.map(|r| r.height as u32),
        })
        .collect();

    levels.sort_by_key(|l| l.bandwidth);

    if levels.is_empty() {
        return Err(Error::ManifestLoadFailure("master playlist lists no variants".to_string()));
    }

    Ok(levels)
}

pub struct HlsBackend {
    state: Mutex<BackendState>,
    media: Mutex<Option<Arc<MediaElement>>>,
    client: Mutex<Option<StreamingClient>>,
    levels: Mutex<Vec<QualityLevel>>,
    selection: Mutex<QualitySelection>,
    http: Client,
    bus: Arc<EventBus>,
}

impl HlsBackend {
    pub fn new(bus: Arc<EventBus>) -> Self {
        Self {
            state: Mutex::new(BackendState::Uninitialized),
            media: Mutex::new(None),
            client: Mutex::new(None),
            levels: Mutex::new(Vec::new()),
            selection: Mutex::new(QualitySelection::Auto),
            http: Client::builder()
                .timeout(Duration::from_secs(30))
                .build()
                .unwrap_or_default(),
            bus,
        }
    }

    fn media(&self) -> Option<Arc<MediaElement>> {
        self.media.lock().unwrap().clone()
    }

    /// Terminal manifest failure: `Failed` state plus an error event.
    fn fail(&self, error: Error) {
        warn!(%error, "HLS manifest load failed");
        if let Err(transition) = advance(&self.state, BackendState::Failed) {
            warn!(%transition, "Could not mark backend failed");
        }
        self.bus.emit(&PlaybackEvent::Error {
            code: error.error_code().to_string(),
            message: error.to_string(),
            fatal: true,
        });
    }

    /// Apply a fetched master playlist: populate the ladder and report
    /// `SourceReady`, or fail terminally.
    fn apply_master_playlist(&self, content: &str) -> Result<()> {
        match parse_master_playlist(content) {
            Ok(levels) => {
                let count = levels.len();
                *self.levels.lock().unwrap() = levels;
                advance(&self.state, BackendState::SourceReady)?;
                self.bus.emit(&PlaybackEvent::QualityLevelsAvailable { count });
                self.bus.emit(&PlaybackEvent::SourceReady);
                debug!(levels = count, "HLS manifest parsed");
                Ok(())
            }
            Err(e) => {
                let message = e.to_string();
                self.fail(e);
                Err(Error::ManifestLoadFailure(message))
            }
        }
    }

    async fn load_manifest(&self, url: &Url) {
        let response = match self.http.get(url.clone()).send().await {
            Ok(r) => r,
            Err(e) => {
                self.fail(Error::ManifestLoadFailure(format!("manifest fetch failed: {}", e)));
                return;
            }
        };

        match response.text().await {
            Ok(text) => {
                // apply_master_playlist already surfaced any failure.
                let _ = self.apply_master_playlist(&text);
            }
            Err(e) => {
                self.fail(Error::ManifestLoadFailure(format!("manifest read failed: {}", e)));
            }
        }
    }
}

#[async_trait]
impl PlaybackBackend for HlsBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Hls
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
            .hls_sources()
            .first()
            .cloned()
            .cloned()
            .ok_or_else(|| Error::InvalidArgument("no HLS sources configured".to_string()))?;

        media.claim(BackendKind::Hls)?;
        *self.media.lock().unwrap() = Some(Arc::clone(&media));

        if config.native_hls_support {
            // Platform plays HLS natively: skip the client, assign directly.
            media.set_src(source);
            advance(&self.state, BackendState::SourceReady)?;
            self.bus.emit(&PlaybackEvent::SourceReady);
            return Ok(());
        }

        let client = StreamingClient::bind(Arc::clone(&media), &self.bus);
        *self.client.lock().unwrap() = Some(client);
        advance(&self.state, BackendState::Attached)?;

        // A stalled load is surfaced only by the transport's own failure
        // signal; there is deliberately no local timer here.
        self.load_manifest(&source).await;

        Ok(())
    }

    fn detach(&self) {
        if !self.state().is_attached() {
            return;
        }

        self.client.lock().unwrap().take();
        if let Some(media) = self.media.lock().unwrap().take() {
            media.set_paused(true);
            media.release();
        }
        self.levels.lock().unwrap().clear();

        *self.state.lock().unwrap() = BackendState::Detached;
        debug!("HLS backend detached");
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
        self.levels.lock().unwrap().clone()
    }

    fn set_quality_level(&self, selection: QualitySelection) -> Result<()> {
        if let QualitySelection::Level(i) = selection {
            let levels = self.levels.lock().unwrap();
            if i >= levels.len() {
                return Err(Error::ValidationFailure(format!(
                    "quality level {} out of range ({} available)",
                    i,
                    levels.len()
                )));
            }
        }
        *self.selection.lock().unwrap() = selection;
        debug!(%selection, "Quality selection applied");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MASTER: &str = "#EXTM3U\n\
#EXT-X-STREAM-INF:BANDWIDTH=2400000,RESOLUTION=1280x720\n\
mid/playlist.m3u8\n\
#EXT-X-STREAM-INF:BANDWIDTH=800000,RESOLUTION=640x360\n\
low/playlist.m3u8\n\
#EXT-X-STREAM-INF:BANDWIDTH=5000000,RESOLUTION=1920x1080\n\
high/playlist.m3u8\n";

    fn hls_config(native_support: bool) -> PlayerConfig {
        PlayerConfig {
            sources: vec![Url::parse("https://cdn.example.com/unit.m3u8").unwrap()],
            native_hls_support: native_support,
            ..PlayerConfig::default()
        }
    }

    #[test]
    fn master_playlist_parses_into_sorted_ladder() {
        let levels = parse_master_playlist(MASTER).unwrap();
        assert_eq!(levels.len(), 3);
        assert_eq!(levels[0].bandwidth, 800_000);
        assert_eq!(levels[2].height, Some(1080));
        assert_eq!(levels[1].label(), "720p");
    }

    #[test]
    fn garbage_manifest_is_rejected() {
        assert!(matches!(
            parse_master_playlist("not a playlist"),
            Err(Error::ManifestLoadFailure(_))
        ));
    }

    #[tokio::test]
    async fn native_support_bypasses_the_client() {
        let bus = Arc::new(EventBus::new());
        let backend = HlsBackend::new(Arc::clone(&bus));
        let media = Arc::new(MediaElement::new());

        backend.attach(Arc::clone(&media), &hls_config(true)).await.unwrap();

        assert_eq!(backend.state(), BackendState::SourceReady);
        assert!(backend.client.lock().unwrap().is_none());
        assert!(backend.available_quality_levels().is_empty());
        assert!(media.src().unwrap().path().ends_with("unit.m3u8"));
    }

    #[tokio::test]
    async fn manifest_applies_after_client_attachment() {
        let bus = Arc::new(EventBus::new());
        let backend = HlsBackend::new(Arc::clone(&bus));
        let media = Arc::new(MediaElement::new());

        media.claim(BackendKind::Hls).unwrap();
        *backend.media.lock().unwrap() = Some(Arc::clone(&media));
        *backend.client.lock().unwrap() = Some(StreamingClient::bind(Arc::clone(&media), &bus));
        advance(&backend.state, BackendState::Attached).unwrap();

        backend.apply_master_playlist(MASTER).unwrap();

        assert_eq!(backend.state(), BackendState::SourceReady);
        assert_eq!(backend.available_quality_levels().len(), 3);
        backend.set_quality_level(QualitySelection::Level(2)).unwrap();
        assert!(backend.set_quality_level(QualitySelection::Level(9)).is_err());
    }

    #[tokio::test]
    async fn manifest_failure_is_terminal() {
        let bus = Arc::new(EventBus::new());
        let errors = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&errors);
        bus.subscribe(
            "error-sink",
            Arc::new(move |event| {
                if let PlaybackEvent::Error { code, fatal, .. } = event {
                    sink.lock().unwrap().push((code.clone(), *fatal));
                }
            }),
        );

        let backend = HlsBackend::new(Arc::clone(&bus));
        let media = Arc::new(MediaElement::new());
        media.claim(BackendKind::Hls).unwrap();
        *backend.media.lock().unwrap() = Some(Arc::clone(&media));
        *backend.client.lock().unwrap() = Some(StreamingClient::bind(Arc::clone(&media), &bus));
        advance(&backend.state, BackendState::Attached).unwrap();

        assert!(backend.apply_master_playlist("#EXTM3U garbage").is_err());
        assert_eq!(backend.state(), BackendState::Failed);

        let seen = errors.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0], ("MANIFEST_LOAD".to_string(), true));

        // Terminal: detach is still allowed, playback is not.
        drop(seen);
        assert!(backend.play().is_err());
        backend.detach();
        assert_eq!(backend.state(), BackendState::Detached);
    }
}
