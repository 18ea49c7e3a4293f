//! Playback speed controller
//!
//! Renders the speed menu and keeps the on-screen time counter consistent
//! across a speed change: the displayed position is re-normalized through
//! `time::convert` the moment the change notification arrives, instead of
//! waiting for the next time-update signal.

use super::{option_bool, options_for, Controller};
use crate::cycle::CyclicIterator;
use crate::dom::{DomRoot, Fragment};
use crate::error::Result;
use crate::events::{PlaybackEvent, SubscriptionId};
use crate::session::SessionShared;
use crate::time;
use std::any::Any;
use std::sync::{Arc, Mutex};

const FRAGMENT: &str = "speed-menu";

/// Speed label as shown in the menu: two decimals with a trailing
/// `.00` collapsed to `.0` (so `1.0`, `1.25`, `1.50`).
pub(crate) fn speed_label(speed: f64) -> String {
    let s = format!("{:.2}", speed);
    match s.strip_suffix(".00") {
        Some(prefix) => format!("{}.0", prefix),
        None => s,
    }
}

pub struct SpeedController {
    shared: Arc<SessionShared>,
    root: DomRoot,
    menu: CyclicIterator<f64>,
    displayed_position: Arc<Mutex<f64>>,
    subscription: Option<SubscriptionId>,
}

impl SpeedController {
    pub(crate) fn new(shared: &Arc<SessionShared>, root: &DomRoot) -> Result<Self> {
        let options = options_for(shared.config(), "speed");
        let speeds = shared.available_speeds().to_vec();
        let displayed_position = Arc::new(Mutex::new(shared.media().current_time()));

        if option_bool(&options, "show_menu").unwrap_or(true) {
            let labels: Vec<String> = speeds.iter().copied().map(speed_label).collect();
            root.mount(
                FRAGMENT,
                Fragment::new("menu")
                    .with_text(labels.join(" "))
                    .with_attr("selected", speed_label(shared.current_speed())),
            );
        }

        let handler_root = root.clone();
        let position = Arc::clone(&displayed_position);
        let subscription = shared.bus().subscribe(
            "speed",
            Arc::new(move |event| match event {
                PlaybackEvent::SpeedChange { old, new } => {
                    let mut displayed = position.lock().unwrap();
                    *displayed = time::convert(*displayed, *old, *new);
                    let shown = *displayed;
                    handler_root.update(FRAGMENT, |f| {
                        f.attrs.insert("selected".to_string(), speed_label(*new));
                        f.attrs.insert("position".to_string(), time::format(shown, false));
                    });
                }
                PlaybackEvent::TimeUpdate { position: p } => {
                    *position.lock().unwrap() = *p;
                    let shown = *p;
                    handler_root.update(FRAGMENT, |f| {
                        f.attrs.insert("position".to_string(), time::format(shown, false));
                    });
                }
                _ => {}
            }),
        );

        Ok(Self {
            shared: Arc::clone(shared),
            root: root.clone(),
            menu: CyclicIterator::new(speeds),
            displayed_position,
            subscription: Some(subscription),
        })
    }

    /// Validated speed change through the session.
    pub fn set_speed(&self, speed: f64) -> Result<()> {
        self.shared.set_speed(speed)
    }

    /// The position currently shown on screen, in the active speed's frame.
    pub fn displayed_position(&self) -> f64 {
        *self.displayed_position.lock().unwrap()
    }

    /// Keyboard navigation: move menu focus forward, wrapping at the end.
    pub fn focus_next(&mut self) -> Option<f64> {
        self.menu.next(None)
    }

    /// Keyboard navigation: move menu focus backward, wrapping at the start.
    pub fn focus_prev(&mut self) -> Option<f64> {
        self.menu.prev(None)
    }
}

impl Controller for SpeedController {
    fn name(&self) -> &'static str {
        "speed"
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn speed_labels() {
        assert_eq!(speed_label(1.0), "1.0");
        assert_eq!(speed_label(0.75), "0.75");
        assert_eq!(speed_label(1.25), "1.25");
        assert_eq!(speed_label(2.0), "2.0");
    }
}
