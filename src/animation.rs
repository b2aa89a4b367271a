//! Per-frame animation state and the session's render loop.

/// Mouth/subtitle derivation and the frame loop that paints the surface.
pub mod clock;
