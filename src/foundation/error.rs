/// Result alias used throughout the crate.
pub type PresenterResult<T> = Result<T, PresenterError>;

/// Errors produced while preparing or running a presentation session.
///
/// `PermissionDenied` and `CapabilityUnavailable` are recoverable: callers fall back to the
/// estimated-timing path instead of failing the session. `ReentrantStart` is absorbed as a no-op.
#[derive(thiserror::Error, Debug)]
pub enum PresenterError {
    /// Microphone or display capture was refused.
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    /// Speech synthesis (or any other optional capability) is not present.
    #[error("capability unavailable: {0}")]
    CapabilityUnavailable(String),

    /// A session is already running.
    #[error("session already running")]
    ReentrantStart,

    /// Invalid configuration or input.
    #[error("validation error: {0}")]
    Validation(String),

    /// Failure while painting a frame.
    #[error("render error: {0}")]
    Render(String),

    /// Failure in the recording pipeline.
    #[error("capture error: {0}")]
    Capture(String),

    /// Failure while (de)serializing configuration or timelines.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Anything else, with context attached.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl PresenterError {
    /// Build a [`PresenterError::PermissionDenied`].
    pub fn permission_denied(msg: impl Into<String>) -> Self {
        Self::PermissionDenied(msg.into())
    }

    /// Build a [`PresenterError::CapabilityUnavailable`].
    pub fn unavailable(msg: impl Into<String>) -> Self {
        Self::CapabilityUnavailable(msg.into())
    }

    /// Build a [`PresenterError::Validation`].
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`PresenterError::Render`].
    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render(msg.into())
    }

    /// Build a [`PresenterError::Capture`].
    pub fn capture(msg: impl Into<String>) -> Self {
        Self::Capture(msg.into())
    }

    /// Build a [`PresenterError::Serde`].
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }

    /// Return `true` for errors that are handled by falling back to estimated timing.
    pub fn is_degradable(&self) -> bool {
        matches!(
            self,
            Self::PermissionDenied(_) | Self::CapabilityUnavailable(_)
        )
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
