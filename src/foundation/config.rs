use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use crate::audio::pcm::AudioInputConfig;
use crate::foundation::core::{Canvas, Fps};
use crate::foundation::error::{PresenterError, PresenterResult};
use crate::session::mode::{CaptureTarget, NarrationMode, SessionMode};

/// The welcome script used when none is provided.
pub const DEFAULT_SCRIPT: &str = "Willkommen bei SmartWelcome.de!\n\n\
Ich bin Ihre virtuelle Gastgeberin. SmartWelcome begrüßt Ihre Besucher mit persönlichen, \
kontextbezogenen Videos – direkt auf Ihrer Website, im perfekten Moment.\n\n\
Steigern Sie Conversion, schaffen Sie Vertrauen und erklären Sie komplexe Inhalte in wenigen \
Sekunden.\n\n\
Bereit? Starten Sie jetzt mit SmartWelcome.de!";

/// Container/codec hint handed to the recorder.
pub const DEFAULT_MIME_TYPE: &str = "video/webm;codecs=vp9";

/// Suggested filename of the finalized recording.
pub const DEFAULT_DOWNLOAD_NAME: &str = "smartwelcome.webm";

/// Everything a presentation session needs, loadable from JSON.
///
/// Every field has a default, so `{}` is a valid configuration.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PresenterConfig {
    /// Free-form, multi-line narration text.
    pub script: String,
    /// Language tag for the speech engine.
    pub lang: String,
    /// Preferred voice name; `None` picks one automatically.
    pub voice: Option<String>,
    /// Speech rate multiplier.
    pub rate: f32,
    /// Speech pitch multiplier.
    pub pitch: f32,

    /// Drawable surface size.
    pub canvas: Canvas,
    /// Render and capture frame rate.
    pub fps: Fps,

    /// What gets recorded.
    pub capture: CaptureTarget,
    /// Where narration comes from.
    pub narration: NarrationMode,

    /// Recorder container/codec hint.
    pub mime_type: String,
    /// Filename of the published artifact.
    pub download_name: String,
    /// Directory that receives published artifacts.
    pub out_dir: PathBuf,

    /// Headline painted in the top-left corner.
    pub title: String,
    /// Subheadline painted below the title.
    pub tagline: String,
    /// TTF/OTF used for all text. Without it, text is not painted.
    pub font_path: Option<PathBuf>,

    /// Pause between narration completion and the automatic recording stop.
    pub auto_stop_tail_ms: u64,

    /// Raw PCM file standing in for the microphone.
    pub mic_pcm: Option<AudioInputConfig>,
    /// Grant display capture requests.
    pub display_consent: bool,
    /// External text-to-speech program (for example `espeak-ng`).
    pub speech_command: Option<String>,
}

impl Default for PresenterConfig {
    fn default() -> Self {
        Self {
            script: DEFAULT_SCRIPT.to_string(),
            lang: "de-DE".to_string(),
            voice: None,
            rate: 1.0,
            pitch: 1.05,
            canvas: Canvas::default(),
            fps: Fps::default(),
            capture: CaptureTarget::Canvas,
            narration: NarrationMode::DeviceSpeech,
            mime_type: DEFAULT_MIME_TYPE.to_string(),
            download_name: DEFAULT_DOWNLOAD_NAME.to_string(),
            out_dir: PathBuf::from("out"),
            title: "SmartWelcome.de".to_string(),
            tagline: "Persönliche Video-Begrüßungen für Ihre Website".to_string(),
            font_path: None,
            auto_stop_tail_ms: 500,
            mic_pcm: None,
            display_consent: false,
            speech_command: None,
        }
    }
}

impl PresenterConfig {
    /// Parse a configuration from a JSON reader.
    pub fn from_reader<R: std::io::Read>(r: R) -> PresenterResult<Self> {
        let cfg: Self = serde_json::from_reader(r)
            .map_err(|e| PresenterError::serde(format!("parse presenter config JSON: {e}")))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Parse a configuration from a JSON file on disk.
    pub fn from_path(path: impl AsRef<Path>) -> PresenterResult<Self> {
        let path = path.as_ref();
        let f = File::open(path).map_err(|e| {
            PresenterError::validation(format!("open config JSON '{}': {e}", path.display()))
        })?;
        Self::from_reader(BufReader::new(f))
    }

    /// Reject values the pipeline cannot run with.
    pub fn validate(&self) -> PresenterResult<()> {
        self.canvas.validate()?;
        Fps::new(self.fps.num, self.fps.den)?;
        if !(self.rate.is_finite() && self.rate > 0.0) {
            return Err(PresenterError::validation("rate must be finite and > 0"));
        }
        if !(self.pitch.is_finite() && self.pitch > 0.0) {
            return Err(PresenterError::validation("pitch must be finite and > 0"));
        }
        if self.lang.trim().is_empty() {
            return Err(PresenterError::validation("lang must be non-empty"));
        }
        if self.download_name.is_empty()
            || self.download_name.contains('/')
            || self.download_name.contains('\\')
        {
            return Err(PresenterError::validation(
                "download_name must be a plain file name",
            ));
        }
        if let Some(pcm) = &self.mic_pcm {
            pcm.validate()?;
        }
        Ok(())
    }

    /// The session mode selected by this configuration.
    pub fn session_mode(&self) -> SessionMode {
        SessionMode::new(self.capture, self.narration)
    }

    /// Read the configured font file, if any.
    pub fn load_font(&self) -> PresenterResult<Option<Vec<u8>>> {
        let Some(path) = &self.font_path else {
            return Ok(None);
        };
        use anyhow::Context as _;
        let bytes =
            std::fs::read(path).with_context(|| format!("read font '{}'", path.display()))?;
        Ok(Some(bytes))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/config.rs"]
mod tests;
