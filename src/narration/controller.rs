use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use crate::animation::clock::ClockEpoch;
use crate::audio::envelope::{EnvelopeWriter, run_tracker};
use crate::capability::devices::{MediaDevices, TrackGuard};
use crate::capability::speech::{SpeechSynth, Utterance};
use crate::foundation::core::Fps;
use crate::foundation::error::{PresenterError, PresenterResult};
use crate::narration::voices::select_voice;
use crate::session::handle::CancelToken;
use crate::session::mode::NarrationMode;
use crate::timing::estimator::Timeline;

/// Parameters shared by every utterance.
#[derive(Clone, Debug, PartialEq)]
pub struct NarrationSettings {
    /// Language tag passed to the speech engine.
    pub lang: String,
    /// Speaking rate, 1.0 is the engine default.
    pub rate: f32,
    /// Voice pitch, 1.0 is the engine default.
    pub pitch: f32,
    /// How often the microphone envelope is sampled.
    pub cadence: Duration,
}

impl Default for NarrationSettings {
    fn default() -> Self {
        Self {
            lang: "de-DE".to_string(),
            rate: 1.0,
            pitch: 1.05,
            cadence: Fps::default().frame_period(),
        }
    }
}

/// Shared session state a narration run writes to.
#[derive(Clone, Copy)]
pub struct NarrationContext<'a> {
    /// Live envelope slot, fed in microphone mode.
    pub envelope: &'a EnvelopeWriter,
    /// Restarted when narration begins.
    pub epoch: &'a ClockEpoch,
    /// Cuts the narration short.
    pub cancel: &'a CancelToken,
}

/// How a narration run ended.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NarrationOutcome {
    /// The speech engine read the script to the end.
    Spoken {
        /// Voice used, if the engine offered any choice.
        voice: Option<String>,
    },
    /// A fixed-duration wait stood in for speech.
    Timed {
        /// Why the timed path was taken.
        reason: String,
    },
    /// A live microphone drove the mouth for the estimated duration.
    LiveMicrophone,
    /// Another run was in flight; nothing was started.
    AlreadyRunning,
    /// The session was cancelled before narration completed.
    Cancelled,
}

/// Runs at most one narration at a time.
pub struct NarrationController {
    speech: Arc<dyn SpeechSynth>,
    devices: Arc<dyn MediaDevices>,
    busy: Arc<AtomicBool>,
    settings: NarrationSettings,
}

struct BusyGuard(Arc<AtomicBool>);

impl Drop for BusyGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl NarrationController {
    /// Controller over the injected speech engine and devices.
    pub fn new(
        speech: Arc<dyn SpeechSynth>,
        devices: Arc<dyn MediaDevices>,
        settings: NarrationSettings,
    ) -> Self {
        Self {
            speech,
            devices,
            busy: Arc::new(AtomicBool::new(false)),
            settings,
        }
    }

    /// Utterance parameters.
    pub fn settings(&self) -> &NarrationSettings {
        &self.settings
    }

    /// `true` while a run is in flight.
    pub fn is_running(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    /// Narrate `script` and resolve when playback completes.
    ///
    /// A call made while another run is pending returns [`NarrationOutcome::AlreadyRunning`]
    /// immediately. A denied microphone or failed speech engine degrades to a timed wait that ends
    /// at the estimated duration plus pad, measured from narration start. Audio tracks acquired here are released on every exit path.
    #[tracing::instrument(skip(self, script, ctx), fields(words = tracing::field::Empty))]
    pub async fn run(
        &self,
        script: &str,
        mode: NarrationMode,
        voice: Option<&str>,
        ctx: NarrationContext<'_>,
    ) -> PresenterResult<NarrationOutcome> {
        if self
            .busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            tracing::debug!(error = %PresenterError::ReentrantStart, "narration request ignored");
            return Ok(NarrationOutcome::AlreadyRunning);
        }
        let _busy = BusyGuard(self.busy.clone());

        let timeline = Timeline::estimate(script);
        tracing::Span::current().record("words", timeline.len());
        ctx.epoch.restart();

        let outcome = match mode {
            NarrationMode::Microphone => match self.run_microphone(&timeline, ctx).await {
                Ok(outcome) => outcome,
                Err(e) if e.is_degradable() => {
                    tracing::warn!(error = %e, "microphone unavailable, using estimated timing");
                    self.run_timed(&timeline, ctx, e.to_string()).await
                }
                Err(e) => return Err(e),
            },
            NarrationMode::DeviceSpeech => self.run_speech(script, &timeline, voice, ctx).await?,
        };

        tracing::info!(?outcome, "narration finished");
        Ok(outcome)
    }

    async fn run_microphone(
        &self,
        timeline: &Timeline,
        ctx: NarrationContext<'_>,
    ) -> PresenterResult<NarrationOutcome> {
        let input = self.devices.acquire_microphone().await?;
        let mut guard = TrackGuard::new(input);
        let wait = timed_wait(timeline);
        tracing::debug!(wait_ms = wait.as_millis() as u64, "live microphone narration");

        let stop = ctx.cancel.child();
        let token = stop.token();
        let tracker = run_tracker(guard.input(), ctx.envelope, self.settings.cadence, &token);
        let timer = async {
            let cancelled = tokio::select! {
                _ = tokio::time::sleep(wait) => false,
                _ = ctx.cancel.cancelled() => true,
            };
            stop.cancel();
            cancelled
        };
        let ((), cancelled) = tokio::join!(tracker, timer);
        drop(guard);

        Ok(if cancelled {
            NarrationOutcome::Cancelled
        } else {
            NarrationOutcome::LiveMicrophone
        })
    }

    async fn run_speech(
        &self,
        script: &str,
        timeline: &Timeline,
        voice: Option<&str>,
        ctx: NarrationContext<'_>,
    ) -> PresenterResult<NarrationOutcome> {
        if !self.speech.is_available() {
            tracing::warn!("speech synthesis unavailable, using estimated timing");
            return Ok(self
                .run_timed(timeline, ctx, "speech synthesis unavailable".to_string())
                .await);
        }

        let voices = match self.speech.list_voices().await {
            Ok(v) => v,
            Err(e) if e.is_degradable() => {
                tracing::warn!(error = %e, "speech voices unavailable, using estimated timing");
                return Ok(self.run_timed(timeline, ctx, e.to_string()).await);
            }
            Err(e) => return Err(e),
        };
        if voices.is_empty() {
            let e = PresenterError::unavailable("no speech voices installed");
            tracing::warn!(error = %e, "using estimated timing");
            return Ok(self.run_timed(timeline, ctx, e.to_string()).await);
        }

        let chosen = select_voice(&voices, voice).map(|v| v.name.clone());
        let utterance = Utterance {
            text: script.to_string(),
            lang: self.settings.lang.clone(),
            voice: chosen.clone(),
            rate: self.settings.rate,
            pitch: self.settings.pitch,
        };

        self.speech.cancel_all().await;
        tracing::debug!(voice = ?chosen, "speaking");
        tokio::select! {
            r = self.speech.speak(utterance) => match r {
                Ok(()) => Ok(NarrationOutcome::Spoken { voice: chosen }),
                Err(e) if e.is_degradable() => {
                    tracing::warn!(error = %e, "speech failed, using estimated timing");
                    Ok(self.run_timed(timeline, ctx, e.to_string()).await)
                }
                Err(e) => Err(e),
            },
            _ = ctx.cancel.cancelled() => {
                self.speech.cancel_all().await;
                Ok(NarrationOutcome::Cancelled)
            }
        }
    }

    async fn run_timed(
        &self,
        timeline: &Timeline,
        ctx: NarrationContext<'_>,
        reason: String,
    ) -> NarrationOutcome {
        // Time already spent since narration started (e.g. on a failed utterance) counts.
        let wait = timed_wait(timeline).saturating_sub(ctx.epoch.elapsed());
        tokio::select! {
            _ = tokio::time::sleep(wait) => NarrationOutcome::Timed { reason },
            _ = ctx.cancel.cancelled() => NarrationOutcome::Cancelled,
        }
    }
}

/// Fixed-duration narration length: estimated end of the last word (or the empty-script default)
/// plus the trailing pad.
pub fn timed_wait(timeline: &Timeline) -> Duration {
    Duration::from_millis(timeline.narration_duration_ms().max(0.0).round() as u64)
}

#[cfg(test)]
#[path = "../../tests/unit/narration/controller.rs"]
mod tests;
