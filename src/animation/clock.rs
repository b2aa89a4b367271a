use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::Instant;

use crate::audio::envelope::EnvelopeReader;
use crate::foundation::core::{Fps, FrameIndex};
use crate::foundation::error::PresenterResult;
use crate::foundation::math::clamp01;
use crate::render::scene::SceneRenderer;
use crate::render::surface::SurfacePublisher;
use crate::session::handle::CancelToken;
use crate::timing::estimator::Timeline;

/// Factor applied to the mouth value on every frame that falls between words.
pub const DECAY_PER_FRAME: f32 = 0.8;
/// Painted in the subtitle bar when no word is active, so the bar never collapses.
pub const SUBTITLE_PLACEHOLDER: &str = "\u{00A0}";

/// Snapshot of everything the scene needs for one frame.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AnimationState {
    /// Frame counter within the session.
    pub frame: FrameIndex,
    /// Milliseconds since narration start.
    pub elapsed_ms: u64,
    /// Mouth openness in `[0, 1]`.
    pub mouth_openness: f32,
    /// Word being spoken, if any.
    pub active_subtitle: Option<String>,
}

impl AnimationState {
    /// Text for the subtitle bar, falling back to [`SUBTITLE_PLACEHOLDER`].
    pub fn subtitle_text(&self) -> &str {
        self.active_subtitle
            .as_deref()
            .unwrap_or(SUBTITLE_PLACEHOLDER)
    }
}

/// Derives [`AnimationState`] from elapsed time and, when present, the live envelope.
#[derive(Clone, Debug)]
pub struct AnimationClock {
    timeline: Arc<Timeline>,
    frame: u64,
    mouth: f32,
}

impl AnimationClock {
    /// Clock at frame 0 with a closed mouth.
    pub fn new(timeline: Arc<Timeline>) -> Self {
        Self {
            timeline,
            frame: 0,
            mouth: 0.0,
        }
    }

    /// Timeline the clock reads words from.
    pub fn timeline(&self) -> &Arc<Timeline> {
        &self.timeline
    }

    /// Compute the state of the next frame.
    ///
    /// With `live` set, the mouth follows the live envelope. Otherwise it follows the triangular
    /// envelope of the active word, and decays by [`DECAY_PER_FRAME`] between words. The subtitle
    /// always comes from the timeline, so in live mode it is only as accurate as the estimate.
    pub fn advance(&mut self, elapsed_ms: u64, live: Option<f32>) -> AnimationState {
        let t = elapsed_ms as f64;
        let active = self.timeline.active_at(t);

        self.mouth = match (live, active) {
            (Some(v), _) => clamp01(v),
            (None, Some(w)) => w.envelope_at(t),
            (None, None) => self.mouth * DECAY_PER_FRAME,
        };

        let state = AnimationState {
            frame: FrameIndex(self.frame),
            elapsed_ms,
            mouth_openness: self.mouth,
            active_subtitle: active.map(|w| w.word.clone()),
        };
        self.frame += 1;
        state
    }
}

/// Shared narration start time.
///
/// Restarted when narration begins; the frame loop measures elapsed time against it.
#[derive(Clone, Debug)]
pub struct ClockEpoch {
    tx: Arc<watch::Sender<Instant>>,
}

impl Default for ClockEpoch {
    fn default() -> Self {
        Self::new()
    }
}

impl ClockEpoch {
    /// Epoch starting now.
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(Instant::now());
        Self { tx: Arc::new(tx) }
    }

    /// Reset the epoch to now.
    pub fn restart(&self) {
        self.tx.send_replace(Instant::now());
    }

    /// Time since the last restart.
    pub fn elapsed(&self) -> Duration {
        self.tx.borrow().elapsed()
    }

    /// [`ClockEpoch::elapsed`] in whole milliseconds.
    pub fn elapsed_ms(&self) -> u64 {
        u64::try_from(self.elapsed().as_millis()).unwrap_or(u64::MAX)
    }
}

/// The single render loop of a session: advance the clock, paint, publish.
pub struct FrameLoop {
    clock: AnimationClock,
    renderer: SceneRenderer,
    envelope: EnvelopeReader,
    surface: SurfacePublisher,
    state: Arc<watch::Sender<AnimationState>>,
    fps: Fps,
}

impl FrameLoop {
    /// Assemble the loop; it publishes frames to `surface` and states to `state`.
    pub fn new(
        clock: AnimationClock,
        renderer: SceneRenderer,
        envelope: EnvelopeReader,
        surface: SurfacePublisher,
        state: Arc<watch::Sender<AnimationState>>,
        fps: Fps,
    ) -> Self {
        Self {
            clock,
            renderer,
            envelope,
            surface,
            state,
            fps,
        }
    }

    /// Render and publish one frame for `elapsed_ms`.
    pub fn tick(&mut self, elapsed_ms: u64) -> PresenterResult<AnimationState> {
        let state = self.clock.advance(elapsed_ms, self.envelope.live());
        let frame = self.renderer.render(&state)?;
        self.surface.publish(frame);
        self.state.send_replace(state.clone());
        Ok(state)
    }

    /// Tick once per frame period until `cancel` fires.
    ///
    /// Late ticks are skipped rather than bunched, so frame N is always computed from the time at
    /// which it actually runs.
    #[tracing::instrument(skip_all, fields(fps = self.fps.as_f64()))]
    pub async fn run(mut self, epoch: ClockEpoch, cancel: CancelToken) {
        let mut ticker = tokio::time::interval(self.fps.frame_period());
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {
                    if let Err(e) = self.tick(epoch.elapsed_ms()) {
                        tracing::warn!(error = %e, "frame render failed, stopping animation");
                        break;
                    }
                }
            }
        }
        tracing::debug!(frames = self.clock.frame, "frame loop stopped");
    }
}

#[cfg(test)]
#[path = "../../tests/unit/animation/clock.rs"]
mod tests;
