/// What the capture session records.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaptureTarget {
    /// Only the rendered surface, without audio.
    #[default]
    Canvas,
    /// The full display (tab) including its audio, after user consent.
    Tab,
}

/// Where narration audio comes from.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NarrationMode {
    /// A live speaker; the microphone envelope drives the mouth.
    Microphone,
    /// The device speech engine reads the script.
    #[default]
    DeviceSpeech,
}

/// Capture target × narration source, fixed for the duration of one session.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct SessionMode {
    /// Capture target.
    pub capture: CaptureTarget,
    /// Narration source.
    pub narration: NarrationMode,
}

impl SessionMode {
    /// Create a session mode.
    pub fn new(capture: CaptureTarget, narration: NarrationMode) -> Self {
        Self { capture, narration }
    }

    /// Tab capture records the display's audio track as well.
    pub fn include_audio(self) -> bool {
        matches!(self.capture, CaptureTarget::Tab)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/session/mode.rs"]
mod tests;
