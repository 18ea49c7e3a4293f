//! Integration tests for Vireo Core

use std::sync::{Arc, Mutex};

use vireo_core::{
    create_backend, time, BackendKind, BackendState, CaptionsController, Controller, DisplaySlot,
    DomRoot, Error, EventBus, LifecycleState, MediaElement, PlaybackEvent, PlayerConfig,
    PosterController, PosterState, QualityController, QualitySelection, SpeedController,
    TranscriptController, VolumeController,
};

fn native_config() -> PlayerConfig {
    let mut config = PlayerConfig::default();
    config.sources = vec!["https://cdn.example.com/media/lecture.mp4".parse().unwrap()];
    config
}

// =============================================================================
// Session Lifecycle Tests
// =============================================================================

#[tokio::test]
async fn test_mount_activates_session() {
    let mut slot = DisplaySlot::new(DomRoot::new());
    let session = slot.mount(native_config()).await.unwrap();

    assert_eq!(session.lifecycle(), LifecycleState::Active);
    assert_eq!(session.backend_state(), BackendState::SourceReady);
    assert_eq!(slot.media().attached_by(), Some(BackendKind::Native));
}

#[tokio::test]
async fn test_remount_tears_down_previous_session_first() {
    let mut slot = DisplaySlot::new(DomRoot::new());

    let first = slot.mount(native_config()).await.unwrap();
    let first_shared = Arc::clone(first.shared());
    let first_id = first.shared().id();

    let second = slot.mount(native_config()).await.unwrap();

    assert_eq!(first_shared.lifecycle(), LifecycleState::Idle);
    assert_ne!(second.shared().id(), first_id);
    assert_eq!(second.lifecycle(), LifecycleState::Active);
    assert!(slot.media().is_attached());
}

#[tokio::test]
async fn test_unmount_detaches_backend() {
    let mut slot = DisplaySlot::new(DomRoot::new());
    slot.mount(native_config()).await.unwrap();
    assert!(slot.media().is_attached());

    slot.unmount();

    assert!(slot.active().is_none());
    assert!(!slot.media().is_attached());

    // Idempotent.
    slot.unmount();
}

#[tokio::test]
async fn test_mount_without_sources_fails() {
    let mut slot = DisplaySlot::new(DomRoot::new());
    let err = slot.mount(PlayerConfig::default()).await.unwrap_err();
    assert!(matches!(err, Error::InvalidArgument(_)));
}

// =============================================================================
// Attachment Exclusivity Tests
// =============================================================================

#[tokio::test]
async fn test_second_backend_cannot_claim_attached_element() {
    let media = Arc::new(MediaElement::new());
    let config = native_config();

    let first = create_backend(BackendKind::Native, Arc::new(EventBus::new()));
    first.attach(Arc::clone(&media), &config).await.unwrap();

    let second = create_backend(BackendKind::Native, Arc::new(EventBus::new()));
    let err = second.attach(Arc::clone(&media), &config).await.unwrap_err();

    assert!(matches!(err, Error::DoubleAttachment { .. }));
    assert_eq!(err.error_code(), "DOUBLE_ATTACHMENT");

    // The original attachment is untouched by the failed claim.
    assert_eq!(media.attached_by(), Some(BackendKind::Native));
    assert_eq!(first.state(), BackendState::SourceReady);
}

// =============================================================================
// Speed Tests
// =============================================================================

#[tokio::test]
async fn test_speed_change_and_position_conversion() {
    let mut slot = DisplaySlot::new(DomRoot::new());
    let session = slot.mount(native_config()).await.unwrap();

    session.set_speed(1.5).unwrap();
    assert_eq!(session.shared().current_speed(), 1.5);
    assert_eq!(session.shared().media().playback_rate(), 1.5);

    // One minute of 1.0x content passes in 40 seconds at 1.5x.
    assert_eq!(time::convert(60.0, 1.0, 1.5), 40.0);
}

#[tokio::test]
async fn test_speed_change_renormalizes_displayed_position() {
    let mut slot = DisplaySlot::new(DomRoot::new());
    let session = slot.mount(native_config()).await.unwrap();

    session.shared().update_position(60.0);
    session.set_speed(1.5).unwrap();

    // The on-screen counter is consistent immediately, without waiting for
    // the next time-update signal.
    let speed: &SpeedController = session.controller("speed").unwrap();
    assert_eq!(speed.displayed_position(), 40.0);

    let menu = session.root().get("speed-menu").unwrap();
    assert_eq!(menu.attr("selected"), Some("1.50"));
    assert_eq!(menu.attr("position"), Some("0:40"));
}

#[tokio::test]
async fn test_speed_menu_focus_wraps() {
    let mut slot = DisplaySlot::new(DomRoot::new());
    let session = slot.mount(native_config()).await.unwrap();

    // Default speed set is [0.75, 1.0, 1.25, 1.5, 2.0], cursor at 0.
    let speed: &mut SpeedController = session.controller_mut("speed").unwrap();
    assert_eq!(speed.focus_prev(), Some(2.0));
    assert_eq!(speed.focus_next(), Some(0.75));
    assert_eq!(speed.focus_next(), Some(1.0));
}

#[tokio::test]
async fn test_unlisted_speed_is_rejected_without_side_effects() {
    let mut slot = DisplaySlot::new(DomRoot::new());
    let session = slot.mount(native_config()).await.unwrap();
    session.set_speed(1.5).unwrap();

    let err = session.set_speed(3.7).unwrap_err();
    assert!(matches!(err, Error::ValidationFailure(_)));
    assert_eq!(session.shared().current_speed(), 1.5);
    assert_eq!(session.shared().media().playback_rate(), 1.5);
}

// =============================================================================
// Controller Composition Tests
// =============================================================================

#[tokio::test]
async fn test_controllers_register_in_fixed_order() {
    let mut slot = DisplaySlot::new(DomRoot::new());
    let session = slot.mount(native_config()).await.unwrap();
    assert_eq!(
        session.controller_names(),
        vec!["speed", "quality", "volume", "captions"]
    );
}

#[tokio::test]
async fn test_optional_controllers_register_when_configured() {
    let mut config = native_config();
    config.poster_url = Some("https://cdn.example.com/media/poster.jpg".parse().unwrap());
    config.transcript_url = Some("https://cdn.example.com/transcript".parse().unwrap());

    let mut slot = DisplaySlot::new(DomRoot::new());
    let session = slot.mount(config).await.unwrap();
    assert_eq!(
        session.controller_names(),
        vec!["speed", "quality", "volume", "captions", "poster", "transcript"]
    );
}

// =============================================================================
// Poster Tests
// =============================================================================

#[tokio::test]
async fn test_poster_dismissed_by_first_play() {
    let mut config = native_config();
    config.poster_url = Some("https://cdn.example.com/media/poster.jpg".parse().unwrap());

    let mut slot = DisplaySlot::new(DomRoot::new());
    let session = slot.mount(config).await.unwrap();

    let dismissals = Arc::new(Mutex::new(0usize));
    let counter = Arc::clone(&dismissals);
    session.shared().bus().subscribe(
        "test",
        Arc::new(move |event| {
            if matches!(event, PlaybackEvent::PosterDismissed) {
                *counter.lock().unwrap() += 1;
            }
        }),
    );

    assert_eq!(session.shared().poster_state(), PosterState::Shown);
    assert!(session.root().get("poster").is_some());

    let poster: &PosterController = session.controller("poster").unwrap();
    poster.on_click().unwrap();

    assert_eq!(session.shared().poster_state(), PosterState::Dismissed);
    assert!(session.root().get("poster").is_none());
    assert_eq!(*dismissals.lock().unwrap(), 1);

    // Subsequent plays never re-dismiss.
    session.pause().unwrap();
    session.play().unwrap();
    assert_eq!(*dismissals.lock().unwrap(), 1);
}

#[tokio::test]
async fn test_destroyed_poster_never_renders_again() {
    let mut config = native_config();
    config.poster_url = Some("https://cdn.example.com/media/poster.jpg".parse().unwrap());

    let mut slot = DisplaySlot::new(DomRoot::new());
    let session = slot.mount(config).await.unwrap();

    let poster: &mut PosterController = session.controller_mut("poster").unwrap();
    poster.destroy();

    let poster: &PosterController = session.controller("poster").unwrap();
    assert!(poster.is_destroyed());
    poster.render();
    assert!(session.root().get("poster").is_none());
}

// =============================================================================
// Quality Tests
// =============================================================================

#[tokio::test]
async fn test_quality_menu_hidden_without_ladder() {
    let mut slot = DisplaySlot::new(DomRoot::new());
    let session = slot.mount(native_config()).await.unwrap();

    let quality: &QualityController = session.controller("quality").unwrap();
    assert!(quality.is_hidden());

    // Selecting through the menu with no ladder is a silent no-op.
    quality.set_quality_level(QualitySelection::Level(0)).unwrap();
    assert_eq!(session.shared().current_quality(), QualitySelection::Auto);

    // Selecting through the session proper is an error.
    let err = session.set_quality_level(QualitySelection::Level(0)).unwrap_err();
    assert!(matches!(err, Error::ValidationFailure(_)));
}

// =============================================================================
// Volume Tests
// =============================================================================

#[tokio::test]
async fn test_volume_clamps_and_mute_restores() {
    let mut slot = DisplaySlot::new(DomRoot::new());
    let session = slot.mount(native_config()).await.unwrap();

    session.set_volume(1.5).unwrap();
    assert_eq!(session.shared().volume(), 1.0);

    assert!(session.set_volume(f64::NAN).is_err());
    assert_eq!(session.shared().volume(), 1.0);

    let volume: &VolumeController = session.controller("volume").unwrap();
    volume.set_volume(0.6).unwrap();
    volume.mute().unwrap();
    assert_eq!(session.shared().volume(), 0.0);
    volume.unmute().unwrap();
    assert_eq!(session.shared().volume(), 0.6);
}

// =============================================================================
// Captions Tests
// =============================================================================

#[tokio::test]
async fn test_captions_load_and_toggle() {
    let mut slot = DisplaySlot::new(DomRoot::new());
    let session = slot.mount(native_config()).await.unwrap();

    let captions: &CaptionsController = session.controller("captions").unwrap();
    let count = captions
        .load_transcript(vec![
            "  Welcome back.  ".to_string(),
            String::new(),
            "Today we cover ownership.".to_string(),
        ])
        .await
        .unwrap();

    assert_eq!(count, 2);
    assert_eq!(captions.line_count(), 2);
    let panel = session.root().get("captions").unwrap();
    assert_eq!(panel.text, "Welcome back.\nToday we cover ownership.");
    assert!(!panel.hidden);

    session.set_captions_visible(false);
    assert!(session.root().get("captions").unwrap().hidden);
}

// =============================================================================
// Transcript Tests
// =============================================================================

#[tokio::test]
async fn test_transcript_download_resolves_format() {
    let mut config = native_config();
    config.transcript_url = Some("https://cdn.example.com/transcript".parse().unwrap());

    let mut slot = DisplaySlot::new(DomRoot::new());
    let session = slot.mount(config).await.unwrap();

    let transcript: &TranscriptController = session.controller("transcript").unwrap();
    assert_eq!(transcript.chosen_format(), "srt");

    let download = transcript.download("txt").unwrap();
    assert_eq!(download.format, "txt");
    assert_eq!(download.url.query(), Some("format=txt"));
    assert_eq!(transcript.chosen_format(), "txt");

    let err = transcript.download("vtt").unwrap_err();
    assert!(matches!(err, Error::ValidationFailure(_)));
    assert_eq!(transcript.chosen_format(), "txt");
}

// =============================================================================
// Event Bus Tests
// =============================================================================

#[tokio::test]
async fn test_session_mutations_notify_in_subscription_order() {
    let mut slot = DisplaySlot::new(DomRoot::new());
    let session = slot.mount(native_config()).await.unwrap();

    let order = Arc::new(Mutex::new(Vec::new()));
    for tag in ["first", "second", "third"] {
        let log = Arc::clone(&order);
        session.shared().bus().subscribe(
            tag,
            Arc::new(move |event| {
                if matches!(event, PlaybackEvent::VolumeChange { .. }) {
                    log.lock().unwrap().push(tag);
                }
            }),
        );
    }

    session.set_volume(0.3).unwrap();
    assert_eq!(*order.lock().unwrap(), vec!["first", "second", "third"]);
}
