//! Shared building blocks: core value types, errors, configuration and small math helpers.

/// Presenter configuration (JSON-loadable).
pub mod config;
/// Core value types (canvas, fps, frame indices, colors).
pub mod core;
/// Error type and result alias.
pub mod error;
pub(crate) mod math;
