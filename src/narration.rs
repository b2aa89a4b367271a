//! Narration playback: device speech, live microphone, or timed fallback.

/// One narration run per presenter, with fallback handling.
pub mod controller;
/// Voice preference.
pub mod voices;
