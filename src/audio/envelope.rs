use std::time::Duration;

use tokio::sync::watch;

use crate::capability::devices::AudioInput;
use crate::foundation::error::PresenterResult;
use crate::foundation::math::clamp01;
use crate::session::handle::CancelToken;

/// Time-domain samples analysed per step (half of a 2048-point analysis frame).
pub const ANALYSIS_WINDOW: usize = 1024;
/// Gain applied to RMS before clamping.
pub const ENVELOPE_GAIN: f32 = 6.0;
/// Weight of the previous value in exponential smoothing.
pub const SMOOTHING_KEEP: f32 = 0.7;

/// RMS of unsigned 8-bit time-domain samples, normalized so that full scale is 1.0.
///
/// 128 is the zero line.
pub fn rms_u8(window: &[u8]) -> f32 {
    if window.is_empty() {
        return 0.0;
    }
    let sum: f32 = window
        .iter()
        .map(|&b| {
            let v = (f32::from(b) - 128.0) / 128.0;
            v * v
        })
        .sum();
    (sum / window.len() as f32).sqrt()
}

/// Exponentially smoothed openness tracker.
#[derive(Debug, Clone)]
pub struct EnvelopeTracker {
    value: f32,
    window: Vec<u8>,
}

impl Default for EnvelopeTracker {
    fn default() -> Self {
        Self::new(ANALYSIS_WINDOW)
    }
}

impl EnvelopeTracker {
    /// Create a tracker analysing `window_len` samples per step.
    pub fn new(window_len: usize) -> Self {
        Self {
            value: 0.0,
            window: vec![128; window_len.max(1)],
        }
    }

    /// Current smoothed value in `[0, 1]`.
    pub fn value(&self) -> f32 {
        self.value
    }

    /// Fold one RMS measurement into the smoothed value.
    pub fn step_rms(&mut self, rms: f32) -> f32 {
        let instant = clamp01(rms * ENVELOPE_GAIN);
        self.value = clamp01(self.value * SMOOTHING_KEEP + instant * (1.0 - SMOOTHING_KEEP));
        self.value
    }

    /// Fold one window of raw samples into the smoothed value.
    pub fn step_window(&mut self, window: &[u8]) -> f32 {
        self.step_rms(rms_u8(window))
    }

    /// Read one window from `input` and fold it in.
    pub fn sample(&mut self, input: &mut dyn AudioInput) -> PresenterResult<f32> {
        input.read_time_domain(&mut self.window)?;
        let rms = rms_u8(&self.window);
        Ok(self.step_rms(rms))
    }
}

/// Create the shared envelope slot.
///
/// `None` means no live input is driving the mouth; readers then fall back to estimated timing.
pub fn envelope_channel() -> (EnvelopeWriter, EnvelopeReader) {
    let (tx, rx) = watch::channel(None);
    (EnvelopeWriter { tx }, EnvelopeReader { rx })
}

/// Write side of the envelope slot, used only by the sampling loop.
#[derive(Debug)]
pub struct EnvelopeWriter {
    tx: watch::Sender<Option<f32>>,
}

impl EnvelopeWriter {
    /// Publish a new live value.
    pub fn publish(&self, value: f32) {
        self.tx.send_replace(Some(clamp01(value)));
    }

    /// Mark the live input as gone.
    pub fn clear(&self) {
        self.tx.send_replace(None);
    }

    /// Another reader for the same slot.
    pub fn reader(&self) -> EnvelopeReader {
        EnvelopeReader {
            rx: self.tx.subscribe(),
        }
    }
}

/// Read side of the envelope slot.
#[derive(Clone, Debug)]
pub struct EnvelopeReader {
    rx: watch::Receiver<Option<f32>>,
}

impl EnvelopeReader {
    /// Current live value, or `None` when no live input is active.
    pub fn live(&self) -> Option<f32> {
        *self.rx.borrow()
    }
}

/// Sample `input` once per `cadence` until `cancel` fires, publishing the smoothed value.
///
/// The slot is cleared on exit. Read errors end the loop early; the mouth then falls back to
/// estimated timing for the rest of the session.
pub async fn run_tracker(
    input: &mut dyn AudioInput,
    writer: &EnvelopeWriter,
    cadence: Duration,
    cancel: &CancelToken,
) {
    let mut tracker = EnvelopeTracker::default();
    let mut ticker = tokio::time::interval(cadence);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    writer.publish(0.0);

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {
                match tracker.sample(input) {
                    Ok(v) => writer.publish(v),
                    Err(e) => {
                        tracing::warn!(error = %e, "live audio input failed, falling back to estimated timing");
                        break;
                    }
                }
            }
        }
    }

    writer.clear();
}

#[cfg(test)]
#[path = "../../tests/unit/audio/envelope.rs"]
mod tests;
