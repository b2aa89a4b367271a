//! Session ownership: cancellation, scheduled work and the session mode.

/// Cancellation tokens and the task-owning session handle.
pub mod handle;
/// Capture target × narration source.
pub mod mode;
