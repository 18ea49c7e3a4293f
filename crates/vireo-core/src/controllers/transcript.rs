//! Transcript download menu
//!
//! Lets the viewer pick a download format and produces the final download
//! URL. The preferred format is reported back to the host service as a
//! fire-and-forget request; a failed preference save never blocks the
//! download itself.

use super::{option_str, options_for, Controller};
use crate::dom::{DomRoot, Fragment};
use crate::error::{Error, Result};
use crate::session::SessionShared;
use std::any::Any;
use std::sync::{Arc, Mutex};
use tracing::{debug, warn};
use url::Url;

const FRAGMENT: &str = "transcript-download";

/// A resolved transcript download: where to fetch it and in which format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscriptDownload {
    pub url: Url,
    pub format: String,
}

pub struct TranscriptController {
    shared: Arc<SessionShared>,
    root: DomRoot,
    transcript_url: Url,
    chosen_format: Mutex<String>,
}

impl TranscriptController {
    pub(crate) fn new(shared: &Arc<SessionShared>, root: &DomRoot) -> Result<Self> {
        let transcript_url = shared
            .config()
            .transcript_url
            .clone()
            .ok_or_else(|| Error::InvalidArgument("no transcript configured".to_string()))?;
        let options = options_for(shared.config(), "transcript");
        let default_format =
            option_str(&options, "default_format").unwrap_or_else(|| "srt".to_string());

        root.mount(
            FRAGMENT,
            Fragment::new("menu").with_attr("format", default_format.clone()),
        );

        Ok(Self {
            shared: Arc::clone(shared),
            root: root.clone(),
            transcript_url,
            chosen_format: Mutex::new(default_format),
        })
    }

    /// Currently selected download format.
    pub fn chosen_format(&self) -> String {
        self.chosen_format.lock().unwrap().clone()
    }

    /// Select `format` and resolve the download URL for it.
    ///
    /// The chosen format is pushed to the preference endpoint in the
    /// background when one is configured; the download succeeds regardless
    /// of whether that save lands.
    pub fn download(&self, format: &str) -> Result<TranscriptDownload> {
        if !self
            .shared
            .config()
            .transcript_formats
            .iter()
            .any(|f| f == format)
        {
            return Err(Error::ValidationFailure(format!(
                "unsupported transcript format: {format}"
            )));
        }

        *self.chosen_format.lock().unwrap() = format.to_string();
        let attr_format = format.to_string();
        self.root.update(FRAGMENT, |f| {
            f.attrs.insert("format".to_string(), attr_format);
        });

        self.save_preference(format);

        let mut url = self.transcript_url.clone();
        url.query_pairs_mut().append_pair("format", format);
        debug!(%url, format, "Transcript download resolved");

        Ok(TranscriptDownload { url, format: format.to_string() })
    }

    fn save_preference(&self, format: &str) {
        let Some(endpoint) = self.shared.config().save_preference_url.clone() else {
            return;
        };
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            return;
        };
        let body = serde_json::json!({ "transcript_download_format": format });
        handle.spawn(async move {
            let client = reqwest::Client::new();
            if let Err(e) = client.post(endpoint).json(&body).send().await {
                warn!(error = %e, "Failed to save transcript format preference");
            }
        });
    }
}

impl Controller for TranscriptController {
    fn name(&self) -> &'static str {
        "transcript"
    }

    fn destroy(&mut self) {
        self.root.unmount(FRAGMENT);
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
