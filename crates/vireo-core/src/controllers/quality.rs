//! Adaptive quality controller
//!
//! Delegates quality selection to the active backend. When the backend
//! reports zero available levels (native transport, or manifest not yet
//! parsed) the control hides itself and becomes a no-op instead of
//! erroring; a late quality ladder un-hides it.

use super::{option_str, options_for, Controller};
use crate::dom::{DomRoot, Fragment};
use crate::error::Result;
use crate::events::{PlaybackEvent, SubscriptionId};
use crate::session::SessionShared;
use crate::types::{QualityLevel, QualitySelection};
use std::any::Any;
use std::sync::{Arc, Weak};

const FRAGMENT: &str = "quality-control";

fn ladder_text(levels: &[QualityLevel]) -> String {
    levels.iter().map(QualityLevel::label).collect::<Vec<_>>().join(" ")
}

pub struct QualityController {
    shared: Arc<SessionShared>,
    root: DomRoot,
    subscription: Option<SubscriptionId>,
}

impl QualityController {
    pub(crate) fn new(shared: &Arc<SessionShared>, root: &DomRoot) -> Result<Self> {
        let options = options_for(shared.config(), "quality");
        let auto_label = option_str(&options, "auto_label").unwrap_or_else(|| "auto".to_string());

        let levels = shared.quality_levels();
        root.mount(
            FRAGMENT,
            Fragment {
                kind: "menu".to_string(),
                text: ladder_text(&levels),
                hidden: levels.is_empty(),
                ..Fragment::default()
            }
            .with_attr("selected", auto_label.clone()),
        );

        let handler_root = root.clone();
        let weak: Weak<SessionShared> = Arc::downgrade(shared);
        let subscription = shared.bus().subscribe(
            "quality",
            Arc::new(move |event| match event {
                PlaybackEvent::QualityLevelsAvailable { count } => {
                    let ladder = weak.upgrade().map(|s| s.quality_levels()).unwrap_or_default();
                    let hidden = *count == 0;
                    handler_root.update(FRAGMENT, |f| {
                        f.hidden = hidden;
                        f.text = ladder_text(&ladder);
                    });
                }
                PlaybackEvent::QualityChange { selection } => {
                    let label = match selection {
                        QualitySelection::Auto => auto_label.clone(),
                        QualitySelection::Level(i) => {
                            let ladder = weak.upgrade().map(|s| s.quality_levels()).unwrap_or_default();
                            ladder.get(*i).map(QualityLevel::label).unwrap_or_default()
                        }
                    };
                    handler_root.update(FRAGMENT, |f| {
                        f.attrs.insert("selected".to_string(), label);
                    });
                }
                _ => {}
            }),
        );

        Ok(Self {
            shared: Arc::clone(shared),
            root: root.clone(),
            subscription: Some(subscription),
        })
    }

    /// Select a quality level. With no levels available this is a no-op.
    pub fn set_quality_level(&self, selection: QualitySelection) -> Result<()> {
        if self.shared.quality_levels().is_empty() {
            return Ok(());
        }
        self.shared.set_quality_level(selection)
    }

    /// True iff the control is currently hidden.
    pub fn is_hidden(&self) -> bool {
        self.root.get(FRAGMENT).map(|f| f.hidden).unwrap_or(true)
    }
}

impl Controller for QualityController {
    fn name(&self) -> &'static str {
        "quality"
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
