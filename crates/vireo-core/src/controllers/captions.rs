//! Captions controller
//!
//! Transcript lines can arrive well after the session is active; they are
//! folded into the caption panel through the chunked processor so a long
//! transcript never blocks the event loop in one continuous slice.

use super::{option_f64, options_for, Controller};
use crate::chunk::{self, ChunkConfig};
use crate::dom::{DomRoot, Fragment};
use crate::error::Result;
use crate::events::{PlaybackEvent, SubscriptionId};
use crate::session::SessionShared;
use std::any::Any;
use std::sync::{Arc, Mutex};
use tracing::debug;

const FRAGMENT: &str = "captions";

pub struct CaptionsController {
    shared: Arc<SessionShared>,
    root: DomRoot,
    chunk_config: ChunkConfig,
    // Kept so the panel can stay scrolled to the active line later; also
    // used by freeze handling around user scrolling.
    #[allow(dead_code)]
    freeze_time_ms: u64,
    lines: Arc<Mutex<Vec<String>>>,
    subscription: Option<SubscriptionId>,
}

impl CaptionsController {
    pub(crate) fn new(shared: &Arc<SessionShared>, root: &DomRoot) -> Result<Self> {
        let options = options_for(shared.config(), "captions");
        let freeze_time_ms = option_f64(&options, "freeze_time_ms").unwrap_or(10_000.0) as u64;
        let visible = shared.captions_visible();

        root.mount(
            FRAGMENT,
            Fragment {
                kind: "panel".to_string(),
                hidden: !visible,
                ..Fragment::default()
            },
        );

        let handler_root = root.clone();
        let subscription = shared.bus().subscribe(
            "captions",
            Arc::new(move |event| {
                if let PlaybackEvent::CaptionsToggled { visible } = event {
                    let hidden = !visible;
                    handler_root.update(FRAGMENT, |f| f.hidden = hidden);
                }
            }),
        );

        Ok(Self {
            shared: Arc::clone(shared),
            root: root.clone(),
            chunk_config: ChunkConfig::default(),
            freeze_time_ms,
            lines: Arc::new(Mutex::new(Vec::new())),
            subscription: Some(subscription),
        })
    }

    /// Fold freshly loaded transcript lines into the panel. Safe to call at
    /// any point while the session is active - metadata often arrives late.
    pub async fn load_transcript(&self, raw_lines: Vec<String>) -> Result<usize> {
        let processed =
            chunk::process_all(&self.chunk_config, raw_lines, |line| line.trim().to_string()).await?;
        let lines: Vec<String> = processed.into_iter().filter(|l| !l.is_empty()).collect();
        let count = lines.len();

        self.root.update(FRAGMENT, |f| f.text = lines.join("\n"));
        *self.lines.lock().unwrap() = lines;

        debug!(lines = count, "Transcript loaded into captions panel");
        Ok(count)
    }

    pub fn line_count(&self) -> usize {
        self.lines.lock().unwrap().len()
    }
}

impl Controller for CaptionsController {
    fn name(&self) -> &'static str {
        "captions"
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
