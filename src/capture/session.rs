use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::capability::devices::{CaptureSource, MediaConstraints, MediaDevices};
use crate::capability::recorder::{MediaRecorder, RecorderConfig, RecorderFactory};
use crate::capture::artifact::CaptureArtifact;
use crate::foundation::core::{Canvas, Fps};
use crate::foundation::error::{PresenterError, PresenterResult};
use crate::render::surface::SurfaceStream;
use crate::session::handle::{CancelSource, CancelToken};
use crate::session::mode::CaptureTarget;

/// Static settings of a [`CaptureSession`].
#[derive(Clone, Debug)]
pub struct CaptureSettings {
    /// Recorded frame size.
    pub canvas: Canvas,
    /// Recording frame rate.
    pub fps: Fps,
    /// Container/codec hint handed to the recorder.
    pub mime_type: String,
}

/// Wraps the recording resource. At most one recording is active at a time.
///
/// Chunks are buffered in arrival order by the recording task alone; `stop` seals them into one
/// [`CaptureArtifact`].
pub struct CaptureSession {
    devices: Arc<dyn MediaDevices>,
    surface: SurfaceStream,
    recorders: RecorderFactory,
    settings: CaptureSettings,
    active: Option<ActiveCapture>,
}

struct ActiveCapture {
    target: CaptureTarget,
    stop: CancelSource,
    task: JoinHandle<PresenterResult<CaptureArtifact>>,
}

impl CaptureSession {
    /// Idle session; nothing is acquired until [`CaptureSession::start`].
    pub fn new(
        devices: Arc<dyn MediaDevices>,
        surface: SurfaceStream,
        recorders: RecorderFactory,
        settings: CaptureSettings,
    ) -> Self {
        Self {
            devices,
            surface,
            recorders,
            settings,
            active: None,
        }
    }

    /// `true` between `start` and `stop`.
    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    /// Target of the active recording.
    pub fn target(&self) -> Option<CaptureTarget> {
        self.active.as_ref().map(|a| a.target)
    }

    /// Start recording `target`.
    ///
    /// An active recording is finalized and discarded first. `Tab` needs display consent and
    /// fails with `PermissionDenied` without it.
    #[tracing::instrument(skip(self), fields(mime = %self.settings.mime_type))]
    pub async fn start(&mut self, target: CaptureTarget, include_audio: bool) -> PresenterResult<()> {
        if self.active.is_some() {
            tracing::debug!("finalizing previous capture before restart");
            if let Err(e) = self.stop().await {
                tracing::warn!(error = %e, "previous capture failed to finalize");
            }
        }

        let mut source: Box<dyn CaptureSource> = match target {
            CaptureTarget::Canvas => Box::new(self.surface.clone()),
            CaptureTarget::Tab => {
                self.devices
                    .acquire_display(MediaConstraints {
                        video: true,
                        audio: include_audio,
                    })
                    .await?
            }
        };

        let cfg = RecorderConfig {
            width: self.settings.canvas.width,
            height: self.settings.canvas.height,
            fps: self.settings.fps,
            mime_type: self.settings.mime_type.clone(),
            audio: source.audio(),
        };
        let (tx, rx) = mpsc::unbounded_channel();
        let mut recorder = (self.recorders)();
        if let Err(e) = recorder.start(cfg, tx) {
            source.stop_tracks();
            return Err(e);
        }

        let stop = CancelSource::new();
        let task = tokio::spawn(record(
            recorder,
            source,
            rx,
            self.settings.fps.frame_period(),
            self.settings.mime_type.clone(),
            stop.token(),
        ));
        self.active = Some(ActiveCapture { target, stop, task });
        tracing::info!(?target, "capture started");
        Ok(())
    }

    /// Finalize the active recording.
    ///
    /// Returns `Ok(None)` when nothing is recording, so each start yields at most one artifact.
    #[tracing::instrument(skip(self))]
    pub async fn stop(&mut self) -> PresenterResult<Option<CaptureArtifact>> {
        let Some(active) = self.active.take() else {
            return Ok(None);
        };
        active.stop.cancel();
        let artifact = active
            .task
            .await
            .map_err(|e| PresenterError::capture(format!("recording task failed: {e}")))??;
        tracing::info!(
            target = ?active.target,
            bytes = artifact.len(),
            chunks = artifact.chunk_count(),
            "capture stopped"
        );
        Ok(Some(artifact))
    }
}

/// Feed frames to the recorder at the frame rate and buffer its chunks until cancelled.
async fn record(
    mut recorder: Box<dyn MediaRecorder>,
    mut source: Box<dyn CaptureSource>,
    mut chunks_rx: mpsc::UnboundedReceiver<Vec<u8>>,
    period: Duration,
    mime_type: String,
    cancel: CancelToken,
) -> PresenterResult<CaptureArtifact> {
    let mut chunks: Vec<Vec<u8>> = Vec::new();
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    let mut failure = None;

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            Some(chunk) = chunks_rx.recv() => {
                if !chunk.is_empty() {
                    chunks.push(chunk);
                }
            }
            _ = ticker.tick() => {
                let Some(frame) = source.latest_frame() else {
                    continue;
                };
                if let Err(e) = recorder.push_frame(&frame) {
                    tracing::warn!(error = %e, "recorder rejected frame");
                    failure = Some(e);
                    break;
                }
            }
        }
    }

    // Finalizing can wait on an external encoder; keep it off the scheduler thread.
    let finalized = tokio::task::spawn_blocking(move || {
        let stopped = recorder.stop();
        drop(recorder);
        stopped
    })
    .await;
    source.stop_tracks();

    // The recorder drops its sender once finalized; drain whatever is still queued.
    while let Some(chunk) = chunks_rx.recv().await {
        if !chunk.is_empty() {
            chunks.push(chunk);
        }
    }

    if let Some(e) = failure {
        return Err(e);
    }
    finalized
        .map_err(|e| PresenterError::capture(format!("recorder finalization failed: {e}")))??;
    Ok(CaptureArtifact::seal(chunks, mime_type))
}

#[cfg(test)]
#[path = "../../tests/unit/capture/session.rs"]
mod tests;
