//! Volume controller

use super::{option_f64, options_for, Controller};
use crate::dom::{DomRoot, Fragment};
use crate::error::Result;
use crate::events::{PlaybackEvent, SubscriptionId};
use crate::session::SessionShared;
use std::any::Any;
use std::sync::{Arc, Mutex};

const FRAGMENT: &str = "volume-slider";

pub struct VolumeController {
    shared: Arc<SessionShared>,
    root: DomRoot,
    step: f64,
    previous_level: Mutex<f64>,
    subscription: Option<SubscriptionId>,
}

impl VolumeController {
    pub(crate) fn new(shared: &Arc<SessionShared>, root: &DomRoot) -> Result<Self> {
        let options = options_for(shared.config(), "volume");
        let step = option_f64(&options, "step").unwrap_or(0.2);
        let level = shared.volume();

        root.mount(
            FRAGMENT,
            Fragment::new("slider")
                .with_attr("level", format!("{:.2}", level))
                .with_attr("muted", (level == 0.0).to_string()),
        );

        let handler_root = root.clone();
        let subscription = shared.bus().subscribe(
            "volume",
            Arc::new(move |event| {
                if let PlaybackEvent::VolumeChange { volume } = event {
                    let volume = *volume;
                    handler_root.update(FRAGMENT, |f| {
                        f.attrs.insert("level".to_string(), format!("{:.2}", volume));
                        f.attrs.insert("muted".to_string(), (volume == 0.0).to_string());
                    });
                }
            }),
        );

        Ok(Self {
            shared: Arc::clone(shared),
            root: root.clone(),
            step,
            previous_level: Mutex::new(if level > 0.0 { level } else { 1.0 }),
            subscription: Some(subscription),
        })
    }

    pub fn set_volume(&self, volume: f64) -> Result<()> {
        self.shared.set_volume(volume)
    }

    /// Raise the volume by one step, clamped by the session setter.
    pub fn step_up(&self) -> Result<()> {
        self.shared.set_volume(self.shared.volume() + self.step)
    }

    /// Lower the volume by one step.
    pub fn step_down(&self) -> Result<()> {
        self.shared.set_volume(self.shared.volume() - self.step)
    }

    /// Mute, remembering the pre-mute level for unmute.
    pub fn mute(&self) -> Result<()> {
        let current = self.shared.volume();
        if current > 0.0 {
            *self.previous_level.lock().unwrap() = current;
        }
        self.shared.set_volume(0.0)
    }

    /// Restore the level that was active before the last mute.
    pub fn unmute(&self) -> Result<()> {
        let level = *self.previous_level.lock().unwrap();
        self.shared.set_volume(level)
    }
}

impl Controller for VolumeController {
    fn name(&self) -> &'static str {
        "volume"
    }

    fn destroy(&mut self) {
        if let Some(id) = self.subscription.take() {
            self.shared.bus().unsubscribe(id);
        }
        self.root.unmount(FRAGMENT);
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
