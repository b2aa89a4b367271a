//! SmartWelcome renders an animated virtual presenter synchronized to narration and records it
//! into a downloadable WebM file.
//!
//! The API is session-oriented:
//!
//! - Build a [`PresenterConfig`] (JSON or code) and the [`Capabilities`] to run with
//! - Create a [`Presenter`]
//! - [`Presenter::start_presentation`] records and narrates; [`Presenter::stop_recording`]
//!   seals the recording into an artifact
//!
//! Everything runs cooperatively on one tokio thread. Speech, microphone/display access and
//! recording are injected trait objects, so a missing speech engine or a refused permission
//! degrades to estimated word timing instead of failing the session.
#![forbid(unsafe_code)]
#![deny(missing_docs)]

/// Per-frame animation state and the render loop.
pub mod animation;
/// Live audio envelope and PCM inputs.
pub mod audio;
/// Injected platform capabilities.
pub mod capability;
/// Recording sessions and artifacts.
pub mod capture;
mod foundation;
/// Narration playback.
pub mod narration;
/// Session orchestration.
pub mod presenter;
/// Scene rendering.
pub mod render;
/// Session ownership and cancellation.
pub mod session;
/// Word timing estimation.
pub mod timing;

pub use crate::foundation::config::{
    DEFAULT_DOWNLOAD_NAME, DEFAULT_MIME_TYPE, DEFAULT_SCRIPT, PresenterConfig,
};
pub use crate::foundation::core::{
    Affine, BezPath, Canvas, Fps, FrameIndex, Point, Rect, Rgba8Premul, Vec2,
};
pub use crate::foundation::error::{PresenterError, PresenterResult};

pub use crate::animation::clock::{AnimationClock, AnimationState};
pub use crate::audio::pcm::{AudioInputConfig, PcmFileInput};
pub use crate::capability::devices::{
    AudioInput, CaptureSource, HeadlessDevices, MediaConstraints, MediaDevices,
};
pub use crate::capability::recorder::{
    ChunkSender, FfmpegRecorder, FfmpegRecorderOpts, InMemoryRecorder, MediaRecorder,
    RecorderConfig, RecorderFactory,
};
pub use crate::capability::speech::{NoSpeech, ProcessSpeech, SpeechSynth, Utterance, Voice};
pub use crate::capture::artifact::{ArtifactStore, ArtifactUrl, CaptureArtifact};
pub use crate::narration::controller::{NarrationOutcome, NarrationSettings};
pub use crate::presenter::{Capabilities, Presenter, SessionReport, Status};
pub use crate::render::surface::{FrameRGBA, SurfacePublisher, SurfaceStream, surface_feed};
pub use crate::session::mode::{CaptureTarget, NarrationMode, SessionMode};
pub use crate::timing::estimator::{Timeline, WordTiming};
