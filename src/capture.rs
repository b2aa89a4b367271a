//! Recording the presenter into a downloadable artifact.

/// Sealed recordings and their retrievable references.
pub mod artifact;
/// The single active recording session.
pub mod session;
