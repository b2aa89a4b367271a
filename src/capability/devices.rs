use std::sync::Arc;

use async_trait::async_trait;

use crate::audio::pcm::{AudioInputConfig, PcmFileInput};
use crate::foundation::error::{PresenterError, PresenterResult};
use crate::render::surface::{FrameRGBA, SurfaceStream};

/// What a capture request asks for.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MediaConstraints {
    /// Request a video track.
    pub video: bool,
    /// Request an audio track.
    pub audio: bool,
}

/// A live audio track exposing time-domain sample windows.
pub trait AudioInput: Send {
    /// Fill `window` with the most recent unsigned 8-bit samples (128 = silence).
    fn read_time_domain(&mut self, window: &mut [u8]) -> PresenterResult<()>;

    /// Stop the underlying tracks. Must be idempotent.
    fn stop(&mut self);

    /// `false` once stopped.
    fn is_live(&self) -> bool {
        true
    }
}

/// Stops the wrapped input when dropped, whichever way the owner exits.
pub struct TrackGuard(Box<dyn AudioInput>);

impl TrackGuard {
    /// Take ownership of `input`.
    pub fn new(input: Box<dyn AudioInput>) -> Self {
        Self(input)
    }

    /// Borrow the guarded input.
    pub fn input(&mut self) -> &mut dyn AudioInput {
        self.0.as_mut()
    }
}

impl Drop for TrackGuard {
    fn drop(&mut self) {
        self.0.stop();
    }
}

/// A video source (plus optional audio) that a recorder can sample.
pub trait CaptureSource: Send {
    /// Most recent frame, if anything has been produced yet.
    fn latest_frame(&mut self) -> Option<Arc<FrameRGBA>>;

    /// Audio that should be muxed alongside the video, if any.
    fn audio(&self) -> Option<AudioInputConfig> {
        None
    }

    /// Release every track held by this source. Must be idempotent.
    fn stop_tracks(&mut self) {}
}

impl CaptureSource for SurfaceStream {
    fn latest_frame(&mut self) -> Option<Arc<FrameRGBA>> {
        self.latest()
    }
}

/// Microphone/display acquisition. Either request may be refused.
#[async_trait]
pub trait MediaDevices: Send + Sync {
    /// Acquire a microphone track.
    async fn acquire_microphone(&self) -> PresenterResult<Box<dyn AudioInput>>;

    /// Acquire a display (tab) capture after user consent.
    async fn acquire_display(
        &self,
        constraints: MediaConstraints,
    ) -> PresenterResult<Box<dyn CaptureSource>>;
}

/// Devices available to a headless process.
///
/// The microphone is a PCM file played back in real time. The "display" is the presenter's own
/// surface, granted only with explicit consent, carrying the microphone file as its audio track.
#[derive(Debug, Clone)]
pub struct HeadlessDevices {
    mic: Option<AudioInputConfig>,
    display_consent: bool,
    surface: SurfaceStream,
}

impl HeadlessDevices {
    /// Create headless devices mirroring `surface`.
    pub fn new(mic: Option<AudioInputConfig>, display_consent: bool, surface: SurfaceStream) -> Self {
        Self {
            mic,
            display_consent,
            surface,
        }
    }
}

#[async_trait]
impl MediaDevices for HeadlessDevices {
    async fn acquire_microphone(&self) -> PresenterResult<Box<dyn AudioInput>> {
        let Some(cfg) = &self.mic else {
            return Err(PresenterError::permission_denied(
                "no microphone source configured",
            ));
        };
        let input = PcmFileInput::open(cfg)?;
        tracing::debug!(path = %cfg.path.display(), secs = input.duration_secs(), "microphone acquired");
        Ok(Box::new(input))
    }

    async fn acquire_display(
        &self,
        constraints: MediaConstraints,
    ) -> PresenterResult<Box<dyn CaptureSource>> {
        if !self.display_consent {
            return Err(PresenterError::permission_denied(
                "display capture was not granted",
            ));
        }
        if !constraints.video {
            return Err(PresenterError::validation(
                "display capture requires a video track",
            ));
        }
        let audio = if constraints.audio {
            self.mic.clone()
        } else {
            None
        };
        Ok(Box::new(MirroredDisplay {
            surface: self.surface.clone(),
            audio,
            stopped: false,
        }))
    }
}

/// Display capture that mirrors the rendered surface.
#[derive(Debug)]
struct MirroredDisplay {
    surface: SurfaceStream,
    audio: Option<AudioInputConfig>,
    stopped: bool,
}

impl CaptureSource for MirroredDisplay {
    fn latest_frame(&mut self) -> Option<Arc<FrameRGBA>> {
        if self.stopped {
            return None;
        }
        self.surface.latest()
    }

    fn audio(&self) -> Option<AudioInputConfig> {
        self.audio.clone()
    }

    fn stop_tracks(&mut self) {
        if !self.stopped {
            tracing::debug!("display capture tracks stopped");
        }
        self.stopped = true;
    }
}

#[cfg(test)]
#[path = "../../tests/unit/capability/devices.rs"]
mod tests;
