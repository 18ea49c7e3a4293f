//! Display slot
//!
//! A slot owns one media element and at most one active session. Mounting
//! new content tears the previous session fully down before the next one
//! attaches, so overlapping backends on the same element are impossible by
//! construction. The previous session's state lives in the explicit handle
//! held here, never in any global.

use crate::dom::DomRoot;
use crate::error::Result;
use crate::media::MediaElement;
use crate::session::Session;
use crate::types::PlayerConfig;
use std::sync::Arc;
use tracing::info;

pub struct DisplaySlot {
    root: DomRoot,
    media: Arc<MediaElement>,
    active: Option<Session>,
}

impl DisplaySlot {
    pub fn new(root: DomRoot) -> Self {
        Self {
            root,
            media: Arc::new(MediaElement::new()),
            active: None,
        }
    }

    /// Mount `config` in this slot. Any session already mounted is torn
    /// down first; only then does the new session attach to the element.
    pub async fn mount(&mut self, config: PlayerConfig) -> Result<&mut Session> {
        if let Some(mut old) = self.active.take() {
            info!(session_id = %old.shared().id(), "Replacing mounted session");
            old.destroy();
        }

        let session =
            Session::initialize(self.root.clone(), Arc::clone(&self.media), config).await?;
        Ok(self.active.insert(session))
    }

    /// Tear down the active session, if any. Idempotent.
    pub fn unmount(&mut self) {
        if let Some(mut session) = self.active.take() {
            session.destroy();
        }
    }

    pub fn active(&self) -> Option<&Session> {
        self.active.as_ref()
    }

    pub fn active_mut(&mut self) -> Option<&mut Session> {
        self.active.as_mut()
    }

    /// The media element this slot owns across sessions.
    pub fn media(&self) -> &Arc<MediaElement> {
        &self.media
    }
}

impl std::fmt::Debug for DisplaySlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DisplaySlot")
            .field("mounted", &self.active.is_some())
            .finish()
    }
}
