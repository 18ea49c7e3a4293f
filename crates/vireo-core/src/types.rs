//! Core types for the playback runtime

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use url::Url;
use uuid::Uuid;

/// Unique identifier for a playback session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Which playback backend drives the media element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    /// Progressive download, source assigned directly
    Native,
    /// Adaptive streaming driven by a streaming client
    Hls,
}

impl std::fmt::Display for BackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BackendKind::Native => write!(f, "native"),
            BackendKind::Hls => write!(f, "hls"),
        }
    }
}

/// Playback backend state machine states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BackendState {
    /// No media element bound yet
    Uninitialized,
    /// Bound to a media element, source not yet negotiated
    Attached,
    /// Source (or parsed manifest) is ready for playback
    SourceReady,
    /// Content is playing
    Playing,
    /// Playback paused
    Paused,
    /// Released from the media element
    Detached,
    /// Terminal failure (e.g. manifest load failed); never retried
    Failed,
}

impl BackendState {
    /// Check if transition to target state is valid
    pub fn can_transition_to(&self, target: BackendState) -> bool {
        use BackendState::*;
        matches!(
            (self, target),
            // From Uninitialized; the native backend collapses Attached and
            // SourceReady into one step.
            (Uninitialized, Attached) | (Uninitialized, SourceReady) |
            // From Attached
            (Attached, SourceReady) | (Attached, Failed) | (Attached, Detached) |
            // From SourceReady
            (SourceReady, Playing) | (SourceReady, Paused) | (SourceReady, Detached) |
            // From Playing
            (Playing, Paused) | (Playing, Detached) |
            // From Paused
            (Paused, Playing) | (Paused, Detached) |
            // From Failed
            (Failed, Detached) |
            // A detached backend may be bound again
            (Detached, Attached) | (Detached, SourceReady)
        )
    }

    /// Backend holds a claim on the media element in these states
    pub fn is_attached(&self) -> bool {
        !matches!(self, BackendState::Uninitialized | BackendState::Detached)
    }
}

impl std::fmt::Display for BackendState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BackendState::Uninitialized => write!(f, "uninitialized"),
            BackendState::Attached => write!(f, "attached"),
            BackendState::SourceReady => write!(f, "source_ready"),
            BackendState::Playing => write!(f, "playing"),
            BackendState::Paused => write!(f, "paused"),
            BackendState::Detached => write!(f, "detached"),
            BackendState::Failed => write!(f, "failed"),
        }
    }
}

/// Session lifecycle states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LifecycleState {
    /// No session active for the display slot
    Idle,
    /// Backend attaching and controllers being constructed
    Initializing,
    /// Session is live; setters mutate and notify
    Active,
    /// Controllers and backend being torn down
    TearingDown,
}

impl LifecycleState {
    /// Check if transition to target state is valid
    pub fn can_transition_to(&self, target: LifecycleState) -> bool {
        use LifecycleState::*;
        matches!(
            (self, target),
            (Idle, Initializing)
                | (Initializing, Active)
                | (Initializing, TearingDown)
                | (Active, TearingDown)
                | (TearingDown, Idle)
        )
    }
}

impl std::fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LifecycleState::Idle => write!(f, "idle"),
            LifecycleState::Initializing => write!(f, "initializing"),
            LifecycleState::Active => write!(f, "active"),
            LifecycleState::TearingDown => write!(f, "tearing_down"),
        }
    }
}

/// Quality selection: a specific level of the ladder, or automatic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QualitySelection {
    Auto,
    Level(usize),
}

impl std::fmt::Display for QualitySelection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            QualitySelection::Auto => write!(f, "auto"),
            QualitySelection::Level(i) => write!(f, "level {}", i),
        }
    }
}

/// One entry of the quality ladder reported by a backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QualityLevel {
    /// Stable identifier within the ladder
    pub id: String,
    /// Bandwidth in bits per second
    pub bandwidth: u64,
    /// Video width, if known
    pub width: Option<u32>,
    /// Video height, if known
    pub height: Option<u32>,
}

impl QualityLevel {
    /// Human-readable tier label
    pub fn label(&self) -> String {
        match self.height {
            Some(h) => format!("{}p", h),
            None => format!("{} kbps", self.bandwidth / 1000),
        }
    }
}

/// Pre-roll poster overlay state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PosterState {
    Shown,
    Dismissed,
    NotConfigured,
}

/// Configuration supplied by the host page for one video unit
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    /// Available video source URLs; any `.m3u8` source selects the HLS backend
    pub sources: Vec<Url>,
    /// Ordered set of playback speeds offered to the user
    pub available_speeds: Vec<f64>,
    /// Speed applied when the session initializes
    pub initial_speed: f64,
    /// Initial volume, clamped to [0, 1]
    pub initial_volume: f64,
    /// Whether the captions controller starts visible
    pub captions_enabled: bool,
    /// Poster image shown until the first explicit play
    pub poster_url: Option<Url>,
    /// Endpoint for the best-effort transcript preference save
    pub save_preference_url: Option<Url>,
    /// Endpoint transcripts are downloaded from
    pub transcript_url: Option<Url>,
    /// Transcript formats the download menu offers
    pub transcript_formats: Vec<String>,
    /// Platform capability: the media element can play HLS without a client
    pub native_hls_support: bool,
    /// Per-controller option overrides, keyed by controller name
    pub controller_options: BTreeMap<String, serde_json::Value>,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            sources: Vec::new(),
            available_speeds: vec![0.75, 1.0, 1.25, 1.5, 2.0],
            initial_speed: 1.0,
            initial_volume: 1.0,
            captions_enabled: true,
            poster_url: None,
            save_preference_url: None,
            transcript_url: None,
            transcript_formats: vec!["srt".to_string(), "txt".to_string()],
            native_hls_support: false,
            controller_options: BTreeMap::new(),
        }
    }
}

impl PlayerConfig {
    /// Returns true for URLs that require the adaptive backend
    pub fn is_hls_source(url: &Url) -> bool {
        url.path().to_lowercase().ends_with(".m3u8")
    }

    /// Adaptive sources among the configured URLs
    pub fn hls_sources(&self) -> Vec<&Url> {
        self.sources.iter().filter(|s| Self::is_hls_source(s)).collect()
    }

    /// Backend selected for this configuration
    pub fn backend_kind(&self) -> BackendKind {
        if self.hls_sources().is_empty() {
            BackendKind::Native
        } else {
            BackendKind::Hls
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backend_state_transitions() {
        assert!(BackendState::Uninitialized.can_transition_to(BackendState::Attached));
        assert!(BackendState::Attached.can_transition_to(BackendState::SourceReady));
        assert!(BackendState::SourceReady.can_transition_to(BackendState::Playing));
        assert!(BackendState::Playing.can_transition_to(BackendState::Paused));
        assert!(BackendState::Failed.can_transition_to(BackendState::Detached));

        assert!(!BackendState::Uninitialized.can_transition_to(BackendState::Playing));
        assert!(!BackendState::Failed.can_transition_to(BackendState::Playing));
        assert!(!BackendState::Detached.can_transition_to(BackendState::Playing));
    }

    #[test]
    fn lifecycle_transitions() {
        assert!(LifecycleState::Idle.can_transition_to(LifecycleState::Initializing));
        assert!(LifecycleState::Initializing.can_transition_to(LifecycleState::Active));
        assert!(LifecycleState::Active.can_transition_to(LifecycleState::TearingDown));
        assert!(LifecycleState::TearingDown.can_transition_to(LifecycleState::Idle));

        assert!(!LifecycleState::Idle.can_transition_to(LifecycleState::Active));
        assert!(!LifecycleState::Active.can_transition_to(LifecycleState::Initializing));
    }

    #[test]
    fn backend_kind_from_sources() {
        let mut config = PlayerConfig::default();
        config.sources = vec![Url::parse("https://cdn.example.com/unit.mp4").unwrap()];
        assert_eq!(config.backend_kind(), BackendKind::Native);

        config.sources.push(Url::parse("https://cdn.example.com/unit.m3u8").unwrap());
        assert_eq!(config.backend_kind(), BackendKind::Hls);
        assert_eq!(config.hls_sources().len(), 1);
    }

    #[test]
    fn quality_level_label() {
        let level = QualityLevel { id: "variant_0".into(), bandwidth: 2_400_000, width: Some(1280), height: Some(720) };
        assert_eq!(level.label(), "720p");

        let audio_only = QualityLevel { id: "variant_1".into(), bandwidth: 96_000, width: None, height: None };
        assert_eq!(audio_only.label(), "96 kbps");
    }
}
