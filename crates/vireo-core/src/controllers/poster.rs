//! Pre-roll poster overlay
//!
//! Shown only until the first explicit user-initiated play; dismissal and
//! destruction are both terminal for the instance - a destroyed poster
//! never re-renders, even if `render` is invoked again.

use super::{option_bool, options_for, Controller};
use crate::dom::{DomRoot, Fragment};
use crate::error::{Error, Result};
use crate::events::{PlaybackEvent, SubscriptionId};
use crate::session::SessionShared;
use crate::types::PosterState;
use std::any::Any;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

const FRAGMENT: &str = "poster";

pub struct PosterController {
    shared: Arc<SessionShared>,
    root: DomRoot,
    destroyed: Arc<AtomicBool>,
    subscription: Option<SubscriptionId>,
}

impl PosterController {
    pub(crate) fn new(shared: &Arc<SessionShared>, root: &DomRoot) -> Result<Self> {
        let poster_url = shared
            .config()
            .poster_url
            .clone()
            .ok_or_else(|| Error::InvalidArgument("no poster configured".to_string()))?;
        let options = options_for(shared.config(), "poster");
        let dismiss_on_play = option_bool(&options, "dismiss_on_play").unwrap_or(true);

        root.mount(
            FRAGMENT,
            Fragment::new("overlay").with_attr("src", poster_url.to_string()),
        );

        let destroyed = Arc::new(AtomicBool::new(false));
        let subscription = if dismiss_on_play {
            let handler_root = root.clone();
            let weak: Weak<SessionShared> = Arc::downgrade(shared);
            let destroyed_flag = Arc::clone(&destroyed);
            Some(shared.bus().subscribe(
                "poster",
                Arc::new(move |event| {
                    if !matches!(event, PlaybackEvent::Play { .. }) {
                        return;
                    }
                    if destroyed_flag.load(Ordering::Relaxed) {
                        return;
                    }
                    let Some(shared) = weak.upgrade() else { return };
                    if shared.poster_state() != PosterState::Shown {
                        return;
                    }
                    shared.set_poster_state(PosterState::Dismissed);
                    handler_root.unmount(FRAGMENT);
                    shared.bus().emit(&PlaybackEvent::PosterDismissed);
                }),
            ))
        } else {
            None
        };

        Ok(Self {
            shared: Arc::clone(shared),
            root: root.clone(),
            destroyed,
            subscription,
        })
    }

    /// Click on the overlay: start playback. The play notification then
    /// dismisses the poster.
    pub fn on_click(&self) -> Result<()> {
        if self.destroyed.load(Ordering::Relaxed)
            || self.shared.poster_state() != PosterState::Shown
        {
            return Ok(());
        }
        self.shared.play()
    }

    /// Re-mount the overlay if it is still showing. A destroyed instance
    /// never renders again.
    pub fn render(&self) {
        if self.destroyed.load(Ordering::Relaxed) {
            return;
        }
        if self.shared.poster_state() != PosterState::Shown {
            return;
        }
        if let Some(url) = self.shared.config().poster_url.clone() {
            self.root.mount(
                FRAGMENT,
                Fragment::new("overlay").with_attr("src", url.to_string()),
            );
        }
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed.load(Ordering::Relaxed)
    }
}

impl Controller for PosterController {
    fn name(&self) -> &'static str {
        "poster"
    }

    fn destroy(&mut self) {
        self.destroyed.store(true, Ordering::Relaxed);
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
