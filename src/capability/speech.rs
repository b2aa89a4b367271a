use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;
use tokio::sync::Notify;

use crate::foundation::error::{PresenterError, PresenterResult};

/// A voice offered by a speech engine.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Voice {
    /// Engine-specific voice name.
    pub name: String,
    /// BCP-47-ish language tag (`de`, `de-DE`, ...).
    pub lang: String,
}

impl Voice {
    /// Create a voice entry.
    pub fn new(name: impl Into<String>, lang: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            lang: lang.into(),
        }
    }
}

/// One request to speak text.
#[derive(Clone, Debug, PartialEq)]
pub struct Utterance {
    /// Text to speak.
    pub text: String,
    /// Language tag.
    pub lang: String,
    /// Named voice, or the engine default for `lang`.
    pub voice: Option<String>,
    /// Rate multiplier (1.0 = normal).
    pub rate: f32,
    /// Pitch multiplier (1.0 = normal).
    pub pitch: f32,
}

/// Speech synthesis engine.
#[async_trait]
pub trait SpeechSynth: Send + Sync {
    /// `false` when no engine is present at all.
    fn is_available(&self) -> bool;

    /// Voices the engine can use.
    async fn list_voices(&self) -> PresenterResult<Vec<Voice>>;

    /// Speak `utterance`, resolving when playback completes.
    ///
    /// Dropping the returned future abandons the utterance.
    async fn speak(&self, utterance: Utterance) -> PresenterResult<()>;

    /// Cancel every pending or playing utterance.
    async fn cancel_all(&self);
}

/// Engine used when no speech synthesis exists.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoSpeech;

#[async_trait]
impl SpeechSynth for NoSpeech {
    fn is_available(&self) -> bool {
        false
    }

    async fn list_voices(&self) -> PresenterResult<Vec<Voice>> {
        Ok(Vec::new())
    }

    async fn speak(&self, _utterance: Utterance) -> PresenterResult<()> {
        Err(PresenterError::unavailable("speech synthesis is not available"))
    }

    async fn cancel_all(&self) {}
}

/// Speech engine backed by an external program with an `espeak-ng`-compatible command line.
///
/// Completion is the process exiting; cancellation kills it.
#[derive(Debug)]
pub struct ProcessSpeech {
    program: String,
    available: bool,
    cancel: Notify,
}

impl ProcessSpeech {
    /// Probe `program` and build an engine around it.
    pub fn detect(program: impl Into<String>) -> Self {
        let program = program.into();
        let available = std::process::Command::new(&program)
            .arg("--version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map(|s| s.success())
            .unwrap_or(false);
        if !available {
            tracing::warn!(program = %program, "speech program not found");
        }
        Self {
            program,
            available,
            cancel: Notify::new(),
        }
    }

    /// Program invoked for speech.
    pub fn program(&self) -> &str {
        &self.program
    }

    fn args_for(utterance: &Utterance) -> Vec<String> {
        // espeak-ng: -s words per minute (default 175), -p pitch 0..99 (default 50).
        let wpm = (175.0 * utterance.rate).round().clamp(80.0, 450.0) as u32;
        let pitch = (50.0 * utterance.pitch).round().clamp(0.0, 99.0) as u32;
        let voice = utterance
            .voice
            .clone()
            .unwrap_or_else(|| utterance.lang.to_ascii_lowercase());
        vec![
            "-v".to_string(),
            voice,
            "-s".to_string(),
            wpm.to_string(),
            "-p".to_string(),
            pitch.to_string(),
            "--".to_string(),
            utterance.text.clone(),
        ]
    }
}

#[async_trait]
impl SpeechSynth for ProcessSpeech {
    fn is_available(&self) -> bool {
        self.available
    }

    async fn list_voices(&self) -> PresenterResult<Vec<Voice>> {
        if !self.available {
            return Err(PresenterError::unavailable(format!(
                "speech program '{}' is not available",
                self.program
            )));
        }
        let out = Command::new(&self.program)
            .arg("--voices")
            .stderr(Stdio::null())
            .output()
            .await
            .map_err(|e| {
                PresenterError::unavailable(format!("list voices via '{}': {e}", self.program))
            })?;
        Ok(parse_voice_table(&String::from_utf8_lossy(&out.stdout)))
    }

    async fn speak(&self, utterance: Utterance) -> PresenterResult<()> {
        if !self.available {
            return Err(PresenterError::unavailable(format!(
                "speech program '{}' is not available",
                self.program
            )));
        }
        let mut child = Command::new(&self.program)
            .args(Self::args_for(&utterance))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                PresenterError::unavailable(format!("spawn speech program '{}': {e}", self.program))
            })?;

        tracing::debug!(program = %self.program, chars = utterance.text.len(), "speaking");
        tokio::select! {
            status = child.wait() => {
                let status = status.map_err(|e| {
                    PresenterError::capture(format!("wait for speech program: {e}"))
                })?;
                if !status.success() {
                    return Err(PresenterError::unavailable(format!(
                        "speech program exited with status {status}"
                    )));
                }
                Ok(())
            }
            _ = self.cancel.notified() => {
                let _ = child.kill().await;
                tracing::debug!("utterance cancelled");
                Ok(())
            }
        }
    }

    async fn cancel_all(&self) {
        self.cancel.notify_waiters();
    }
}

/// Parse `espeak-ng --voices` output: `Pty Language Age/Gender VoiceName File Other...`.
pub(crate) fn parse_voice_table(table: &str) -> Vec<Voice> {
    table
        .lines()
        .skip(1)
        .filter_map(|line| {
            let cols: Vec<&str> = line.split_whitespace().collect();
            match cols.as_slice() {
                [_pty, lang, _age_gender, name, ..] => Some(Voice::new(*name, *lang)),
                _ => None,
            }
        })
        .collect()
}

#[cfg(test)]
#[path = "../../tests/unit/capability/speech.rs"]
mod tests;
