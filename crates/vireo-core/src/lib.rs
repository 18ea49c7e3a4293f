//! Vireo Core - Video Playback Runtime
//!
//! This crate provides the client-side playback runtime:
//! - Session lifecycle with teardown-before-attach replacement
//! - Native and HLS playback backends behind one trait
//! - Feature controllers composed around shared session state
//! - A synchronous, in-order event bus
//! - Cooperative chunked processing for large transcript work
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                        Vireo Core                               │
//! ├─────────────────────────────────────────────────────────────────┤
//! │                                                                 │
//! │  ┌──────────────┐  ┌──────────────┐  ┌──────────────┐           │
//! │  │   Display    │  │   Session    │  │   Playback   │           │
//! │  │     Slot     │──│  (shared)    │──│   Backend    │           │
//! │  └──────────────┘  └──────┬───────┘  └──────────────┘           │
//! │                           │                                     │
//! │                    ┌──────┴──────┐                              │
//! │                    │    Event    │                              │
//! │                    │     Bus     │                              │
//! │                    └──────┬──────┘                              │
//! │                           │                                     │
//! │  ┌───────┐ ┌─────────┐ ┌──┴─────┐ ┌──────────┐ ┌────────┐      │
//! │  │ Speed │ │ Quality │ │ Volume │ │ Captions │ │ Poster │ ...  │
//! │  └───────┘ └─────────┘ └────────┘ └──────────┘ └────────┘      │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

pub mod backend;
pub mod chunk;
pub mod component;
pub mod controllers;
pub mod cycle;
pub mod dom;
pub mod error;
pub mod events;
pub mod media;
pub mod session;
pub mod slot;
pub mod time;
pub mod types;

pub use backend::{create_backend, HlsBackend, NativeBackend, PlaybackBackend};
pub use chunk::{process_all, process_all_or_passthrough, ChunkConfig};
pub use component::{Constructed, Descriptor, Instance, Member, Members};
pub use controllers::{
    CaptionsController, Controller, PosterController, QualityController, SpeedController,
    TranscriptController, TranscriptDownload, VolumeController,
};
pub use cycle::CyclicIterator;
pub use dom::{DomRoot, Fragment};
pub use error::{Error, Result};
pub use events::{EventBus, PlaybackEvent, SubscriptionId};
pub use media::MediaElement;
pub use session::{Session, SessionShared};
pub use slot::DisplaySlot;
pub use types::*;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initialize the playback library with default configuration
pub fn init() {
    tracing::info!(version = VERSION, "Vireo Core initialized");
}
