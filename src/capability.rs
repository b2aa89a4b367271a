//! Injected platform capabilities: devices, speech synthesis and recording.
//!
//! Every external resource the presenter touches goes through one of these traits, so tests can
//! substitute fakes that always grant, always deny, or record what they were asked to do.

/// Microphone and display acquisition.
pub mod devices;
/// Recording (container/codec) backends.
pub mod recorder;
/// Speech synthesis engines.
pub mod speech;
