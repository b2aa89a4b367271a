//! Top-level orchestration of one presentation: render loop, recording and narration.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;

use crate::animation::clock::{AnimationClock, AnimationState, ClockEpoch, FrameLoop};
use crate::audio::envelope::{EnvelopeWriter, envelope_channel};
use crate::capability::devices::{HeadlessDevices, MediaDevices};
use crate::capability::recorder::{FfmpegRecorder, FfmpegRecorderOpts, RecorderFactory};
use crate::capability::speech::{NoSpeech, ProcessSpeech, SpeechSynth};
use crate::capture::artifact::{ArtifactStore, ArtifactUrl, CaptureArtifact};
use crate::capture::session::{CaptureSession, CaptureSettings};
use crate::foundation::config::PresenterConfig;
use crate::foundation::error::{PresenterError, PresenterResult};
use crate::narration::controller::{
    NarrationContext, NarrationController, NarrationOutcome, NarrationSettings,
};
use crate::render::scene::SceneRenderer;
use crate::render::surface::{FrameRGBA, SurfacePublisher, SurfaceStream};
use crate::session::handle::SessionHandle;
use crate::session::mode::CaptureTarget;
use crate::timing::estimator::Timeline;

/// User-visible status indicator.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum Status {
    /// Idle, nothing started yet.
    #[default]
    Ready,
    /// Recording has started on the given target.
    Recording(CaptureTarget),
    /// Narration is playing.
    Narrating,
    /// Narration completed; recording may still be running.
    Finished,
    /// Recording stopped and a download is available.
    CaptureFinished,
    /// The session failed to start or finalize.
    Failed(String),
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ready => f.write_str("Bereit"),
            Self::Recording(CaptureTarget::Canvas) => f.write_str("Aufnahme (Canvas) läuft…"),
            Self::Recording(CaptureTarget::Tab) => f.write_str("Aufnahme (Tab) läuft…"),
            Self::Narrating => f.write_str("Vortrag läuft…"),
            Self::Finished => f.write_str("Fertig"),
            Self::CaptureFinished => f.write_str("Aufnahme beendet – Download bereit"),
            Self::Failed(msg) => write!(f, "Fehler: {msg}"),
        }
    }
}

/// The injected platform capabilities.
#[derive(Clone)]
pub struct Capabilities {
    /// Speech synthesis engine.
    pub speech: Arc<dyn SpeechSynth>,
    /// Microphone and display acquisition.
    pub devices: Arc<dyn MediaDevices>,
    /// Creates one recorder per capture session.
    pub recorders: RecorderFactory,
}

impl Capabilities {
    /// Capabilities of a headless process: optional speech program, PCM microphone, consented
    /// display mirroring `surface`, and ffmpeg for recording.
    pub fn headless(cfg: &PresenterConfig, surface: SurfaceStream) -> Self {
        let speech: Arc<dyn SpeechSynth> = match &cfg.speech_command {
            Some(program) => Arc::new(ProcessSpeech::detect(program.clone())),
            None => Arc::new(NoSpeech),
        };
        Self {
            speech,
            devices: Arc::new(HeadlessDevices::new(
                cfg.mic_pcm.clone(),
                cfg.display_consent,
                surface,
            )),
            recorders: FfmpegRecorder::factory(FfmpegRecorderOpts::default()),
        }
    }
}

/// Result of [`Presenter::run_to_artifact`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionReport {
    /// How the narration ended.
    pub outcome: NarrationOutcome,
    /// Reference to the recording, if one was produced.
    pub url: Option<ArtifactUrl>,
}

/// Drives sessions: one render loop, one recording and one narration at a time.
pub struct Presenter {
    cfg: PresenterConfig,
    font: Option<Vec<u8>>,
    timeline: Arc<Timeline>,

    surface: SurfacePublisher,
    envelope: EnvelopeWriter,
    epoch: ClockEpoch,
    state: Arc<watch::Sender<AnimationState>>,
    status: watch::Sender<Status>,

    speech: Arc<dyn SpeechSynth>,
    narration: NarrationController,
    capture: CaptureSession,
    artifacts: ArtifactStore,
    session: Option<SessionHandle>,
}

impl Presenter {
    /// Build a presenter painting into `surface`.
    pub fn new(
        cfg: PresenterConfig,
        caps: Capabilities,
        surface: SurfacePublisher,
    ) -> PresenterResult<Self> {
        cfg.validate()?;
        let font = cfg.load_font()?;
        // Fail early on unusable fonts or canvas sizes.
        SceneRenderer::new(cfg.canvas, &cfg.title, &cfg.tagline, font.clone())?;

        let (envelope, _reader) = envelope_channel();
        let narration = NarrationController::new(
            caps.speech.clone(),
            caps.devices.clone(),
            NarrationSettings {
                lang: cfg.lang.clone(),
                rate: cfg.rate,
                pitch: cfg.pitch,
                cadence: cfg.fps.frame_period(),
            },
        );
        let capture = CaptureSession::new(
            caps.devices,
            surface.stream(),
            caps.recorders,
            CaptureSettings {
                canvas: cfg.canvas,
                fps: cfg.fps,
                mime_type: cfg.mime_type.clone(),
            },
        );

        Ok(Self {
            timeline: Arc::new(Timeline::estimate(&cfg.script)),
            artifacts: ArtifactStore::new(cfg.download_name.clone()),
            font,
            surface,
            envelope,
            epoch: ClockEpoch::new(),
            state: Arc::new(watch::channel(AnimationState::default()).0),
            status: watch::channel(Status::Ready).0,
            speech: caps.speech,
            narration,
            capture,
            session: None,
            cfg,
        })
    }

    /// Presenter with [`Capabilities::headless`] and its own surface.
    pub fn headless(cfg: PresenterConfig) -> PresenterResult<Self> {
        let (publisher, stream) = crate::render::surface::surface_feed();
        let caps = Capabilities::headless(&cfg, stream);
        Self::new(cfg, caps, publisher)
    }

    /// Active configuration.
    pub fn config(&self) -> &PresenterConfig {
        &self.cfg
    }

    /// Script narrated by the next session.
    pub fn script(&self) -> &str {
        &self.cfg.script
    }

    /// Replace the script and recompute the timeline.
    pub fn set_script(&mut self, script: impl Into<String>) {
        self.cfg.script = script.into();
        self.timeline = Arc::new(Timeline::estimate(&self.cfg.script));
    }

    /// Estimated word timeline of the current script.
    pub fn timeline(&self) -> &Arc<Timeline> {
        &self.timeline
    }

    /// Current status indicator.
    pub fn status(&self) -> Status {
        self.status.borrow().clone()
    }

    /// Watch status changes.
    pub fn subscribe_status(&self) -> watch::Receiver<Status> {
        self.status.subscribe()
    }

    /// Latest frame state published by the render loop.
    pub fn animation_state(&self) -> AnimationState {
        self.state.borrow().clone()
    }

    /// Watch the per-frame animation state.
    pub fn subscribe_animation(&self) -> watch::Receiver<AnimationState> {
        self.state.subscribe()
    }

    /// Live view of the drawable surface.
    pub fn surface(&self) -> SurfaceStream {
        self.surface.stream()
    }

    /// Fraction of the narration elapsed, based on the last rendered frame.
    pub fn progress(&self) -> f64 {
        self.timeline
            .progress(self.state.borrow().elapsed_ms as f64)
    }

    /// [`Presenter::progress`] as a whole percentage.
    pub fn progress_percent(&self) -> u8 {
        (self.progress() * 100.0).round().clamp(0.0, 100.0) as u8
    }

    /// `true` while a capture session is active.
    pub fn is_recording(&self) -> bool {
        self.capture.is_active()
    }

    /// Reference to the latest finished recording.
    pub fn download_url(&self) -> Option<&ArtifactUrl> {
        self.artifacts.current()
    }

    /// Resolve a published artifact.
    pub fn artifact(&self, url: &ArtifactUrl) -> Option<Arc<CaptureArtifact>> {
        self.artifacts.resolve(url)
    }

    /// Write the latest recording into the configured output directory.
    pub fn save_download(&self) -> PresenterResult<Option<PathBuf>> {
        match self.artifacts.current() {
            Some(url) => self.artifacts.download(url, &self.cfg.out_dir).map(Some),
            None => Ok(None),
        }
    }

    /// Paint a still of the estimated timeline at `elapsed_ms`, outside of any session.
    pub fn render_still(&self, elapsed_ms: u64) -> PresenterResult<FrameRGBA> {
        let mut renderer = SceneRenderer::new(
            self.cfg.canvas,
            &self.cfg.title,
            &self.cfg.tagline,
            self.font.clone(),
        )?;
        let mut clock = AnimationClock::new(self.timeline.clone());
        renderer.render(&clock.advance(elapsed_ms, None))
    }

    fn set_status(&self, status: Status) {
        tracing::debug!(status = %status, "status");
        self.status.send_replace(status);
    }

    /// Start recording, then narrate; resolves when narration completes.
    ///
    /// Any previous session is cancelled first and the previous download link is cleared.
    /// Recording keeps running afterwards until [`Presenter::stop_recording`].
    #[tracing::instrument(skip(self), fields(mode = ?self.cfg.session_mode()))]
    pub async fn start_presentation(&mut self) -> PresenterResult<NarrationOutcome> {
        if self.narration.is_running() {
            return Ok(NarrationOutcome::AlreadyRunning);
        }

        if let Some(url) = self.artifacts.current().cloned() {
            self.artifacts.revoke(&url);
        }
        self.timeline = Arc::new(Timeline::estimate(&self.cfg.script));
        if let Some(old) = self.session.take() {
            tracing::debug!(session = old.id(), "cancelling previous session");
            old.shutdown().await;
        }
        self.envelope.clear();

        let mut session = SessionHandle::new();
        let renderer = SceneRenderer::new(
            self.cfg.canvas,
            &self.cfg.title,
            &self.cfg.tagline,
            self.font.clone(),
        )?;
        let frame_loop = FrameLoop::new(
            AnimationClock::new(self.timeline.clone()),
            renderer,
            self.envelope.reader(),
            self.surface.clone(),
            self.state.clone(),
            self.cfg.fps,
        );
        self.epoch.restart();
        session.spawn("frame-loop", frame_loop.run(self.epoch.clone(), session.token()));
        tracing::info!(
            session = session.id(),
            words = self.timeline.len(),
            "presentation started"
        );

        let mode = self.cfg.session_mode();
        let target = match self.capture.start(mode.capture, mode.include_audio()).await {
            Ok(()) => mode.capture,
            Err(e) if e.is_degradable() && mode.capture == CaptureTarget::Tab => {
                tracing::warn!(error = %e, "tab capture refused, recording the canvas instead");
                if let Err(e) = self.capture.start(CaptureTarget::Canvas, false).await {
                    return Err(self.fail(session, e).await);
                }
                CaptureTarget::Canvas
            }
            Err(e) => return Err(self.fail(session, e).await),
        };
        self.set_status(Status::Recording(target));

        self.set_status(Status::Narrating);
        let token = session.token();
        let ctx = NarrationContext {
            envelope: &self.envelope,
            epoch: &self.epoch,
            cancel: &token,
        };
        let outcome = self
            .narration
            .run(&self.cfg.script, mode.narration, self.cfg.voice.as_deref(), ctx)
            .await;
        self.session = Some(session);

        match outcome {
            Ok(outcome) => {
                self.set_status(Status::Finished);
                Ok(outcome)
            }
            Err(e) => {
                self.set_status(Status::Failed(e.to_string()));
                Err(e)
            }
        }
    }

    async fn fail(&mut self, session: SessionHandle, e: PresenterError) -> PresenterError {
        tracing::warn!(error = %e, "presentation failed to start");
        session.shutdown().await;
        self.set_status(Status::Failed(e.to_string()));
        e
    }

    /// Finalize the recording and publish it. Also stops the render loop.
    ///
    /// Returns `Ok(None)` when nothing was recording.
    #[tracing::instrument(skip(self))]
    pub async fn stop_recording(&mut self) -> PresenterResult<Option<ArtifactUrl>> {
        let artifact = self.capture.stop().await;
        if let Some(session) = self.session.take() {
            session.shutdown().await;
        }
        match artifact {
            Ok(Some(artifact)) => {
                let url = self.artifacts.publish(artifact);
                self.set_status(Status::CaptureFinished);
                Ok(Some(url))
            }
            Ok(None) => Ok(None),
            Err(e) => {
                self.set_status(Status::Failed(e.to_string()));
                Err(e)
            }
        }
    }

    /// One full session: start, narrate, wait the configured tail, stop.
    pub async fn run_to_artifact(&mut self) -> PresenterResult<SessionReport> {
        let outcome = self.start_presentation().await?;
        tokio::time::sleep(Duration::from_millis(self.cfg.auto_stop_tail_ms)).await;
        let url = self.stop_recording().await?;
        Ok(SessionReport { outcome, url })
    }

    /// Release everything: render loop, recording, pending speech and published artifacts.
    pub async fn teardown(mut self) {
        if let Err(e) = self.capture.stop().await {
            tracing::debug!(error = %e, "discarding unfinished recording");
        }
        if let Some(session) = self.session.take() {
            session.shutdown().await;
        }
        self.speech.cancel_all().await;
        self.envelope.clear();
        self.artifacts.clear();
        self.set_status(Status::Ready);
    }
}

#[cfg(test)]
#[path = "../tests/unit/presenter.rs"]
mod tests;
