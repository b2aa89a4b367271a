//! Live audio: RMS envelope tracking and file-backed audio inputs.

/// Smoothed openness signal derived from live audio.
pub mod envelope;
/// Raw `f32le` PCM files used as live inputs.
pub mod pcm;
