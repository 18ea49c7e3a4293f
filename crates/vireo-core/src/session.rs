//! Session state and lifecycle
//!
//! One `Session` exists per active video unit. It owns the playback backend
//! and the feature controllers, and exposes the shared mutable state bag
//! every controller reads and writes through validating setters. Each
//! setter mutates, then emits a change notification delivered synchronously
//! to controllers in their registration order - the only channel through
//! which controllers communicate.
//!
//! Teardown is synchronous and runs to completion before the next session
//! may attach: pause if playing, destroy controllers in reverse
//! registration order, then detach the backend. The media element's
//! attachment guard makes overlapping backends impossible rather than
//! merely discouraged.

use crate::backend::{self, PlaybackBackend};
use crate::controllers::{self, Controller};
use crate::dom::DomRoot;
use crate::error::{Error, Result};
use crate::events::{EventBus, PlaybackEvent};
use crate::media::MediaElement;
use crate::types::{
    BackendState, LifecycleState, PlayerConfig, PosterState, QualityLevel, QualitySelection,
    SessionId,
};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tracing::{info, instrument, warn};

/// Speeds are configuration constants, so exact comparison modulo float
/// noise is sufficient.
pub(crate) fn speed_eq(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

/// The shared mutable state bag handed to every feature controller.
pub struct SessionShared {
    id: SessionId,
    config: PlayerConfig,
    media: Arc<MediaElement>,
    bus: Arc<EventBus>,
    backend: Box<dyn PlaybackBackend>,
    lifecycle: Mutex<LifecycleState>,
    speed: Mutex<f64>,
    quality: Mutex<QualitySelection>,
    quality_levels: Mutex<Vec<QualityLevel>>,
    volume: Mutex<f64>,
    captions_visible: AtomicBool,
    poster: Mutex<PosterState>,
}

impl SessionShared {
    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn config(&self) -> &PlayerConfig {
        &self.config
    }

    pub fn bus(&self) -> &Arc<EventBus> {
        &self.bus
    }

    pub fn media(&self) -> &Arc<MediaElement> {
        &self.media
    }

    pub fn backend(&self) -> &dyn PlaybackBackend {
        self.backend.as_ref()
    }

    pub fn lifecycle(&self) -> LifecycleState {
        *self.lifecycle.lock().unwrap()
    }

    pub fn current_speed(&self) -> f64 {
        *self.speed.lock().unwrap()
    }

    pub fn available_speeds(&self) -> &[f64] {
        &self.config.available_speeds
    }

    pub fn current_quality(&self) -> QualitySelection {
        *self.quality.lock().unwrap()
    }

    pub fn quality_levels(&self) -> Vec<QualityLevel> {
        self.quality_levels.lock().unwrap().clone()
    }

    pub fn volume(&self) -> f64 {
        *self.volume.lock().unwrap()
    }

    pub fn captions_visible(&self) -> bool {
        self.captions_visible.load(Ordering::Relaxed)
    }

    pub fn poster_state(&self) -> PosterState {
        *self.poster.lock().unwrap()
    }

    fn transition_lifecycle(&self, target: LifecycleState) -> Result<()> {
        let mut current = self.lifecycle.lock().unwrap();
        if !current.can_transition_to(target) {
            return Err(Error::InvalidStateTransition {
                from: current.to_string(),
                to: target.to_string(),
            });
        }
        info!(session_id = %self.id, from = %current, to = %target, "Lifecycle transition");
        *current = target;
        Ok(())
    }

    /// Change playback speed. The value must be a member of the configured
    /// speed set; rejection leaves state untouched.
    pub fn set_speed(&self, new: f64) -> Result<()> {
        if !new.is_finite() || new <= 0.0 {
            return Err(Error::ValidationFailure(format!("speed must be positive, got {}", new)));
        }
        if !self.config.available_speeds.is_empty()
            && !self.config.available_speeds.iter().any(|s| speed_eq(*s, new))
        {
            return Err(Error::ValidationFailure(format!("speed {} is not an available speed", new)));
        }

        let old = {
            let mut speed = self.speed.lock().unwrap();
            std::mem::replace(&mut *speed, new)
        };
        self.media.set_playback_rate(new);
        self.bus.emit(&PlaybackEvent::SpeedChange { old, new });
        Ok(())
    }

    /// Select a quality level or return to automatic selection. Delegates to
    /// the active backend; an out-of-range level is rejected without any
    /// partial update.
    pub fn set_quality_level(&self, selection: QualitySelection) -> Result<()> {
        if let QualitySelection::Level(i) = selection {
            let levels = self.quality_levels.lock().unwrap();
            if i >= levels.len() {
                return Err(Error::ValidationFailure(format!(
                    "quality level {} out of range ({} available)",
                    i,
                    levels.len()
                )));
            }
        }

        self.backend.set_quality_level(selection)?;
        *self.quality.lock().unwrap() = selection;
        self.bus.emit(&PlaybackEvent::QualityChange { selection });
        Ok(())
    }

    /// Set the volume, clamped to [0, 1]. Only non-finite input is rejected.
    pub fn set_volume(&self, volume: f64) -> Result<()> {
        if !volume.is_finite() {
            return Err(Error::ValidationFailure(format!("volume must be finite, got {}", volume)));
        }
        let clamped = volume.clamp(0.0, 1.0);
        *self.volume.lock().unwrap() = clamped;
        self.media.set_volume(clamped);
        self.bus.emit(&PlaybackEvent::VolumeChange { volume: clamped });
        Ok(())
    }

    /// Toggle captions visibility.
    pub fn set_captions_visible(&self, visible: bool) {
        self.captions_visible.store(visible, Ordering::Relaxed);
        self.bus.emit(&PlaybackEvent::CaptionsToggled { visible });
    }

    pub(crate) fn set_poster_state(&self, state: PosterState) {
        *self.poster.lock().unwrap() = state;
    }

    pub(crate) fn refresh_quality_levels(&self) {
        let levels = self.backend.available_quality_levels();
        let count = levels.len();
        *self.quality_levels.lock().unwrap() = levels;
        if count > 0 {
            self.bus.emit(&PlaybackEvent::QualityLevelsAvailable { count });
        }
    }

    /// Start or resume playback on the active backend.
    pub fn play(&self) -> Result<()> {
        self.backend.play()
    }

    /// Pause playback on the active backend.
    pub fn pause(&self) -> Result<()> {
        self.backend.pause()
    }

    /// Host-reported position update (the renderer drives this).
    pub fn update_position(&self, position: f64) {
        self.media.set_current_time(position);
        self.bus.emit(&PlaybackEvent::TimeUpdate { position: position.max(0.0) });
    }
}

impl std::fmt::Debug for SessionShared {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionShared")
            .field("id", &self.id)
            .field("lifecycle", &self.lifecycle())
            .field("backend", &self.backend.kind())
            .finish()
    }
}

/// A live playback session for one video unit.
pub struct Session {
    shared: Arc<SessionShared>,
    controllers: Vec<Box<dyn Controller>>,
    root: DomRoot,
}

impl Session {
    /// Create a session: attach the backend to the media element, then
    /// initialize every feature controller in registration order.
    ///
    /// A controller that fails to initialize is skipped with a warning; it
    /// never prevents the others from coming up.
    #[instrument(skip_all)]
    pub async fn initialize(root: DomRoot, media: Arc<MediaElement>, config: PlayerConfig) -> Result<Self> {
        let bus = Arc::new(EventBus::new());
        let kind = config.backend_kind();
        let backend = backend::create_backend(kind, Arc::clone(&bus));

        let initial_speed = resolve_initial_speed(&config);
        let initial_volume = config.initial_volume.clamp(0.0, 1.0);
        let poster = if config.poster_url.is_some() {
            PosterState::Shown
        } else {
            PosterState::NotConfigured
        };
        let captions_visible = config.captions_enabled;

        let shared = Arc::new(SessionShared {
            id: SessionId::new(),
            config,
            media: Arc::clone(&media),
            bus,
            backend,
            lifecycle: Mutex::new(LifecycleState::Idle),
            speed: Mutex::new(initial_speed),
            quality: Mutex::new(QualitySelection::Auto),
            quality_levels: Mutex::new(Vec::new()),
            volume: Mutex::new(initial_volume),
            captions_visible: AtomicBool::new(captions_visible),
            poster: Mutex::new(poster),
        });

        shared.transition_lifecycle(LifecycleState::Initializing)?;
        info!(session_id = %shared.id, backend = %kind, "Initializing session");

        shared.backend.attach(media, &shared.config).await?;
        shared.refresh_quality_levels();
        shared.media.set_playback_rate(initial_speed);
        shared.media.set_volume(initial_volume);

        let controllers = controllers::build(&shared, &root);
        shared.transition_lifecycle(LifecycleState::Active)?;

        info!(
            session_id = %shared.id,
            controllers = controllers.len(),
            "Session active"
        );

        Ok(Self { shared, controllers, root })
    }

    /// The shared state bag, for host coordination and inspection.
    pub fn shared(&self) -> &Arc<SessionShared> {
        &self.shared
    }

    /// The root the controllers render under.
    pub fn root(&self) -> &DomRoot {
        &self.root
    }

    pub fn lifecycle(&self) -> LifecycleState {
        self.shared.lifecycle()
    }

    pub fn backend_state(&self) -> BackendState {
        self.shared.backend.state()
    }

    /// Registered controller names, in initialization order.
    pub fn controller_names(&self) -> Vec<&'static str> {
        self.controllers.iter().map(|c| c.name()).collect()
    }

    /// Borrow a controller by name and concrete type.
    pub fn controller<T: 'static>(&self, name: &str) -> Option<&T> {
        self.controllers
            .iter()
            .find(|c| c.name() == name)
            .and_then(|c| c.as_any().downcast_ref())
    }

    /// Mutably borrow a controller by name and concrete type.
    pub fn controller_mut<T: 'static>(&mut self, name: &str) -> Option<&mut T> {
        self.controllers
            .iter_mut()
            .find(|c| c.name() == name)
            .and_then(|c| c.as_any_mut().downcast_mut())
    }

    // Host-facing delegates.

    pub fn set_speed(&self, speed: f64) -> Result<()> {
        self.shared.set_speed(speed)
    }

    pub fn set_quality_level(&self, selection: QualitySelection) -> Result<()> {
        self.shared.set_quality_level(selection)
    }

    pub fn set_volume(&self, volume: f64) -> Result<()> {
        self.shared.set_volume(volume)
    }

    pub fn set_captions_visible(&self, visible: bool) {
        self.shared.set_captions_visible(visible)
    }

    pub fn play(&self) -> Result<()> {
        self.shared.play()
    }

    pub fn pause(&self) -> Result<()> {
        self.shared.pause()
    }

    /// Tear the session down: pause if playing, destroy controllers in
    /// reverse registration order, detach the backend. Idempotent, and
    /// synchronous - it completes before any next session can attach.
    ///
    /// A panicking controller is isolated; it cannot block the teardown of
    /// the others or of the backend.
    pub fn destroy(&mut self) {
        match self.shared.lifecycle() {
            LifecycleState::Idle | LifecycleState::TearingDown => return,
            LifecycleState::Initializing | LifecycleState::Active => {}
        }

        if self.shared.transition_lifecycle(LifecycleState::TearingDown).is_err() {
            return;
        }

        if self.shared.backend.state() == BackendState::Playing {
            if let Err(e) = self.shared.backend.pause() {
                warn!(error = %e, "Pause during teardown failed");
            }
        }

        for mut controller in self.controllers.drain(..).rev() {
            let name = controller.name();
            if catch_unwind(AssertUnwindSafe(|| controller.destroy())).is_err() {
                warn!(controller = name, "Controller panicked during teardown");
            }
        }

        self.shared.backend.detach();

        if let Err(e) = self.shared.transition_lifecycle(LifecycleState::Idle) {
            warn!(error = %e, "Teardown finished in unexpected lifecycle state");
        }
        info!(session_id = %self.shared.id, "Session destroyed");
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.destroy();
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("shared", &self.shared)
            .field("controllers", &self.controller_names())
            .finish()
    }
}

/// Pick the speed the session starts at: the configured initial speed if it
/// is offered, falling back to 1.0, then to the first offered speed.
fn resolve_initial_speed(config: &PlayerConfig) -> f64 {
    let speeds = &config.available_speeds;
    if speeds.is_empty() || speeds.iter().any(|s| speed_eq(*s, config.initial_speed)) {
        return config.initial_speed;
    }
    if speeds.iter().any(|s| speed_eq(*s, 1.0)) {
        return 1.0;
    }
    speeds[0]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initial_speed_resolution() {
        let mut config = PlayerConfig::default();
        config.initial_speed = 1.5;
        assert!(speed_eq(resolve_initial_speed(&config), 1.5));

        config.initial_speed = 3.7;
        assert!(speed_eq(resolve_initial_speed(&config), 1.0));

        config.available_speeds = vec![0.5, 0.75];
        assert!(speed_eq(resolve_initial_speed(&config), 0.5));

        config.available_speeds = Vec::new();
        assert!(speed_eq(resolve_initial_speed(&config), 3.7));
    }
}
