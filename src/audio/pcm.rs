use std::path::PathBuf;

use tokio::time::Instant;

use crate::capability::devices::AudioInput;
use crate::foundation::error::{PresenterError, PresenterResult};

/// Raw PCM audio input: interleaved little-endian `f32` samples.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct AudioInputConfig {
    /// Path to interleaved `f32le` PCM data.
    pub path: PathBuf,
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// Channel count.
    pub channels: u16,
}

impl AudioInputConfig {
    /// Reject zero rates and channel counts.
    pub fn validate(&self) -> PresenterResult<()> {
        if self.sample_rate == 0 {
            return Err(PresenterError::validation("audio sample_rate must be non-zero"));
        }
        if self.channels == 0 {
            return Err(PresenterError::validation("audio channels must be non-zero"));
        }
        Ok(())
    }
}

/// Plays a PCM file back in real time, exposing it as a live time-domain audio input.
///
/// Reads return the window of samples that ends at the current playback position. Past the end of
/// the file, and after [`AudioInput::stop`], the input is silent.
#[derive(Debug)]
pub struct PcmFileInput {
    mono: Vec<f32>,
    sample_rate: u32,
    started: Instant,
    stopped: bool,
}

impl PcmFileInput {
    /// Load and downmix the file described by `cfg`. Playback starts now.
    pub fn open(cfg: &AudioInputConfig) -> PresenterResult<Self> {
        cfg.validate()?;
        let bytes = std::fs::read(&cfg.path).map_err(|e| {
            PresenterError::permission_denied(format!(
                "open microphone source '{}': {e}",
                cfg.path.display()
            ))
        })?;
        if !bytes.len().is_multiple_of(4) {
            return Err(PresenterError::validation(
                "f32le PCM byte length must be a multiple of 4",
            ));
        }
        let interleaved: Vec<f32> = bytes
            .chunks_exact(4)
            .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
            .collect();
        Ok(Self::from_interleaved(&interleaved, cfg.channels, cfg.sample_rate))
    }

    /// Build an input from in-memory interleaved samples. Playback starts now.
    pub fn from_interleaved(samples: &[f32], channels: u16, sample_rate: u32) -> Self {
        let ch = usize::from(channels.max(1));
        let mono = samples
            .chunks(ch)
            .map(|frame| frame.iter().sum::<f32>() / frame.len() as f32)
            .collect();
        Self {
            mono,
            sample_rate: sample_rate.max(1),
            started: Instant::now(),
            stopped: false,
        }
    }

    /// Total playback length in seconds.
    pub fn duration_secs(&self) -> f64 {
        self.mono.len() as f64 / f64::from(self.sample_rate)
    }

    fn position(&self) -> usize {
        (self.started.elapsed().as_secs_f64() * f64::from(self.sample_rate)) as usize
    }
}

impl AudioInput for PcmFileInput {
    fn read_time_domain(&mut self, window: &mut [u8]) -> PresenterResult<()> {
        window.fill(128);
        if self.stopped || window.is_empty() {
            return Ok(());
        }
        let end = self.position().min(self.mono.len());
        let start = end.saturating_sub(window.len());
        let src = &self.mono[start..end];
        let offset = window.len() - src.len();
        for (dst, &s) in window[offset..].iter_mut().zip(src) {
            *dst = (s.clamp(-1.0, 1.0) * 128.0 + 128.0).round().clamp(0.0, 255.0) as u8;
        }
        Ok(())
    }

    fn stop(&mut self) {
        self.stopped = true;
    }

    fn is_live(&self) -> bool {
        !self.stopped
    }
}

#[cfg(test)]
#[path = "../../tests/unit/audio/pcm.rs"]
mod tests;
