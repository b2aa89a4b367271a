//! CPU rasterization of the presenter scene.

/// Background, title, avatar figure and subtitle bar.
pub mod scene;
/// Rendered frames and the live surface stream.
pub mod surface;
pub(crate) mod text;
