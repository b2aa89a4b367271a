use super::*;
use crate::capability::devices::HeadlessDevices;
use crate::capability::recorder::InMemoryRecorder;
use crate::render::surface::{FrameRGBA, surface_feed};

fn settings(canvas: Canvas) -> CaptureSettings {
    CaptureSettings {
        canvas,
        fps: Fps::new(10, 1).unwrap(),
        mime_type: "video/webm;codecs=vp9".to_string(),
    }
}

fn tiny() -> Canvas {
    Canvas {
        width: 4,
        height: 2,
    }
}

fn session(display_consent: bool) -> (CaptureSession, crate::render::surface::SurfacePublisher) {
    let (publisher, stream) = surface_feed();
    let devices = Arc::new(HeadlessDevices::new(None, display_consent, stream.clone()));
    let s = CaptureSession::new(devices, stream, InMemoryRecorder::factory(), settings(tiny()));
    (s, publisher)
}

#[tokio::test(start_paused = true)]
async fn canvas_capture_buffers_frames_into_one_artifact() {
    let (mut capture, publisher) = session(false);
    publisher.publish(FrameRGBA::blank(tiny()));

    capture.start(CaptureTarget::Canvas, false).await.unwrap();
    assert!(capture.is_active());
    assert_eq!(capture.target(), Some(CaptureTarget::Canvas));
    tokio::time::sleep(Duration::from_millis(450)).await;

    let artifact = capture.stop().await.unwrap().unwrap();
    assert!(!capture.is_active());
    assert!(artifact.chunk_count() >= 4);
    assert_eq!(artifact.len(), artifact.chunk_count() * tiny().rgba_len());
    assert_eq!(artifact.mime_type(), "video/webm;codecs=vp9");

    assert!(capture.stop().await.unwrap().is_none());
}

#[tokio::test(start_paused = true)]
async fn nothing_painted_yields_empty_artifact() {
    let (mut capture, _publisher) = session(false);
    capture.start(CaptureTarget::Canvas, false).await.unwrap();
    tokio::time::sleep(Duration::from_millis(200)).await;
    let artifact = capture.stop().await.unwrap().unwrap();
    assert!(artifact.is_empty());
    assert_eq!(artifact.chunk_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn tab_capture_requires_consent() {
    let (mut capture, _publisher) = session(false);
    let err = capture.start(CaptureTarget::Tab, true).await.unwrap_err();
    assert!(matches!(err, PresenterError::PermissionDenied(_)));
    assert!(!capture.is_active());

    let (mut capture, publisher) = session(true);
    publisher.publish(FrameRGBA::blank(tiny()));
    capture.start(CaptureTarget::Tab, true).await.unwrap();
    tokio::time::sleep(Duration::from_millis(150)).await;
    let artifact = capture.stop().await.unwrap().unwrap();
    assert!(artifact.chunk_count() >= 1);
}

#[tokio::test(start_paused = true)]
async fn restarting_finalizes_previous_recording() {
    let (mut capture, publisher) = session(false);
    publisher.publish(FrameRGBA::blank(tiny()));
    capture.start(CaptureTarget::Canvas, false).await.unwrap();
    tokio::time::sleep(Duration::from_millis(300)).await;

    capture.start(CaptureTarget::Canvas, false).await.unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;
    let artifact = capture.stop().await.unwrap().unwrap();
    assert!(artifact.chunk_count() <= 2);
}

#[tokio::test(start_paused = true)]
async fn mismatched_frames_fail_the_recording() {
    let (mut capture, publisher) = session(false);
    publisher.publish(FrameRGBA::blank(Canvas {
        width: 8,
        height: 8,
    }));
    capture.start(CaptureTarget::Canvas, false).await.unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(capture.stop().await.is_err());
}

/// Recorder whose `stop` blocks its thread until another task on the runtime releases it.
struct GatedStopRecorder {
    inner: InMemoryRecorder,
    release: Option<std::sync::mpsc::Receiver<()>>,
}

impl MediaRecorder for GatedStopRecorder {
    fn start(
        &mut self,
        cfg: RecorderConfig,
        chunks: crate::capability::recorder::ChunkSender,
    ) -> PresenterResult<()> {
        self.inner.start(cfg, chunks)
    }

    fn push_frame(&mut self, frame: &FrameRGBA) -> PresenterResult<()> {
        self.inner.push_frame(frame)
    }

    fn stop(&mut self) -> PresenterResult<()> {
        let release = self
            .release
            .take()
            .ok_or_else(|| PresenterError::capture("stop called twice"))?;
        release
            .recv_timeout(Duration::from_secs(2))
            .map_err(|_| PresenterError::capture("finalization starved the scheduler"))?;
        self.inner.stop()
    }
}

#[tokio::test]
async fn blocking_finalization_does_not_stall_other_tasks() {
    let (release_tx, release_rx) = std::sync::mpsc::channel();
    let slot = Arc::new(std::sync::Mutex::new(Some(release_rx)));
    let recorders: RecorderFactory = Arc::new(move || {
        let release = slot.lock().ok().and_then(|mut r| r.take());
        Box::new(GatedStopRecorder {
            inner: InMemoryRecorder::new(),
            release,
        }) as Box<dyn MediaRecorder>
    });

    let (publisher, stream) = surface_feed();
    let devices = Arc::new(HeadlessDevices::new(None, false, stream.clone()));
    let mut capture = CaptureSession::new(devices, stream, recorders, settings(tiny()));
    publisher.publish(FrameRGBA::blank(tiny()));
    capture.start(CaptureTarget::Canvas, false).await.unwrap();
    tokio::time::sleep(Duration::from_millis(150)).await;

    // The release is sent by a task on this same single-threaded runtime, so it only arrives if
    // the recorder's stop runs elsewhere.
    let (stopped, ()) = tokio::join!(capture.stop(), async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        release_tx.send(()).unwrap();
    });
    let artifact = stopped.unwrap().unwrap();
    assert!(artifact.chunk_count() >= 1);
}
