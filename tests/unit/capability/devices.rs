use super::*;
use crate::foundation::core::Canvas;
use crate::render::surface::surface_feed;

#[tokio::test]
async fn headless_denies_without_configuration() {
    let (_publisher, stream) = surface_feed();
    let devices = HeadlessDevices::new(None, false, stream);
    assert!(matches!(
        devices.acquire_microphone().await,
        Err(PresenterError::PermissionDenied(_))
    ));
    assert!(matches!(
        devices
            .acquire_display(MediaConstraints { video: true, audio: true })
            .await,
        Err(PresenterError::PermissionDenied(_))
    ));
}

#[tokio::test]
async fn granted_display_mirrors_surface_until_stopped() {
    let (publisher, stream) = surface_feed();
    let mic = AudioInputConfig {
        path: "mic.f32".into(),
        sample_rate: 48_000,
        channels: 1,
    };
    let devices = HeadlessDevices::new(Some(mic.clone()), true, stream);
    let mut display = devices
        .acquire_display(MediaConstraints { video: true, audio: true })
        .await
        .unwrap();
    assert_eq!(display.audio(), Some(mic));
    assert!(display.latest_frame().is_none());

    publisher.publish(FrameRGBA::blank(Canvas { width: 4, height: 2 }));
    assert_eq!(display.latest_frame().map(|f| f.width), Some(4));

    display.stop_tracks();
    display.stop_tracks();
    assert!(display.latest_frame().is_none());
}

#[tokio::test]
async fn display_without_audio_constraint_has_no_audio_track() {
    let (_publisher, stream) = surface_feed();
    let mic = AudioInputConfig {
        path: "mic.f32".into(),
        sample_rate: 48_000,
        channels: 1,
    };
    let devices = HeadlessDevices::new(Some(mic), true, stream);
    let display = devices
        .acquire_display(MediaConstraints { video: true, audio: false })
        .await
        .unwrap();
    assert!(display.audio().is_none());
}

#[test]
fn track_guard_stops_on_drop() {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};

    struct Flagged(Arc<AtomicBool>);
    impl AudioInput for Flagged {
        fn read_time_domain(&mut self, window: &mut [u8]) -> PresenterResult<()> {
            window.fill(128);
            Ok(())
        }
        fn stop(&mut self) {
            self.0.store(true, Ordering::SeqCst);
        }
    }

    let flag = Arc::new(AtomicBool::new(false));
    let mut guard = TrackGuard::new(Box::new(Flagged(Arc::clone(&flag))));
    let mut w = [0u8; 4];
    guard.input().read_time_domain(&mut w).unwrap();
    drop(guard);
    assert!(flag.load(Ordering::SeqCst));
}
