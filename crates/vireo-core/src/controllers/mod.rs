//! Feature controllers
//!
//! Independently-initialized modules composed around the shared session
//! state. Each controller subscribes to the session bus, owns a bounded
//! fragment it mounts under the supplied root, and is destroyed (handlers
//! unsubscribed, fragments unmounted) during session teardown. Controllers
//! are independent: they communicate only through change notifications,
//! and a failure in one never blocks another.

mod captions;
mod poster;
mod quality;
mod speed;
mod transcript;
mod volume;

pub use captions::CaptionsController;
pub use poster::PosterController;
pub use quality::QualityController;
pub use speed::SpeedController;
pub use transcript::{TranscriptController, TranscriptDownload};
pub use volume::VolumeController;

use crate::component::{members_from_value, Descriptor, Member, Members};
use crate::dom::DomRoot;
use crate::error::Result;
use crate::session::SessionShared;
use crate::types::PlayerConfig;
use serde_json::{json, Value};
use std::any::Any;
use std::sync::Arc;
use tracing::{debug, warn};

/// One playback feature bound to a session.
pub trait Controller: Send {
    /// Registration name, also used as the options key
    fn name(&self) -> &'static str;

    /// Detach listeners and unmount fragments. Terminal.
    fn destroy(&mut self);

    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// Construct every applicable controller in registration order. A failed
/// controller is skipped with a warning; the rest still initialize.
pub(crate) fn build(shared: &Arc<SessionShared>, root: &DomRoot) -> Vec<Box<dyn Controller>> {
    let mut out: Vec<Box<dyn Controller>> = Vec::new();
    let mut register = |name: &'static str, result: Result<Box<dyn Controller>>| match result {
        Ok(controller) => out.push(controller),
        Err(e) => warn!(controller = name, error = %e, "Controller failed to initialize; skipping"),
    };

    register("speed", SpeedController::new(shared, root).map(|c| Box::new(c) as _));
    register("quality", QualityController::new(shared, root).map(|c| Box::new(c) as _));
    register("volume", VolumeController::new(shared, root).map(|c| Box::new(c) as _));
    register("captions", CaptionsController::new(shared, root).map(|c| Box::new(c) as _));
    if shared.config().poster_url.is_some() {
        register("poster", PosterController::new(shared, root).map(|c| Box::new(c) as _));
    }
    if shared.config().transcript_url.is_some() {
        register("transcript", TranscriptController::new(shared, root).map(|c| Box::new(c) as _));
    }

    debug!(count = out.len(), "Controllers initialized");
    out
}

/// Effective options for a controller: its defaults extended by the
/// host-supplied overrides for that controller name.
pub fn options_for(config: &PlayerConfig, name: &str) -> Descriptor {
    let overrides = config
        .controller_options
        .get(name)
        .map(members_from_value)
        .unwrap_or_default();

    Descriptor::base()
        .extend(default_options(name), Members::new())
        .extend(overrides, Members::new())
}

fn default_options(name: &str) -> Members {
    let defaults: Value = match name {
        "speed" => json!({ "show_menu": true }),
        "quality" => json!({ "auto_label": "auto" }),
        "volume" => json!({ "step": 0.2 }),
        "captions" => json!({ "freeze_time_ms": 10_000 }),
        "poster" => json!({ "dismiss_on_play": true }),
        "transcript" => json!({ "default_format": "srt" }),
        _ => json!({}),
    };
    members_from_value(&defaults)
}

pub(crate) fn option_bool(options: &Descriptor, name: &str) -> Option<bool> {
    match options.member(name)? {
        Member::Data(Value::Bool(b)) => Some(*b),
        _ => None,
    }
}

pub(crate) fn option_f64(options: &Descriptor, name: &str) -> Option<f64> {
    match options.member(name)? {
        Member::Data(v) => v.as_f64(),
        _ => None,
    }
}

pub(crate) fn option_str(options: &Descriptor, name: &str) -> Option<String> {
    match options.member(name)? {
        Member::Data(Value::String(s)) => Some(s.clone()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overrides_extend_defaults() {
        let mut config = PlayerConfig::default();
        config
            .controller_options
            .insert("volume".to_string(), json!({ "step": 0.1 }));

        let options = options_for(&config, "volume");
        assert_eq!(option_f64(&options, "step"), Some(0.1));

        // Defaults survive when not overridden.
        let speed = options_for(&config, "speed");
        assert_eq!(option_bool(&speed, "show_menu"), Some(true));
    }

    #[test]
    fn unknown_controller_gets_empty_options() {
        let options = options_for(&PlayerConfig::default(), "nonexistent");
        assert!(options.is_empty());
    }
}
