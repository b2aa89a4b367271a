//! Word-level narration timing estimated from script text.

/// Words-per-minute heuristic.
pub mod estimator;
